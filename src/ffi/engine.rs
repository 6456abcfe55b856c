//! ### English
//! C ABI bindings for engine lifecycle (create/destroy/resume/pause/resize).
//!
//! ### 中文
//! 引擎生命周期相关的 C ABI 绑定（create/destroy/resume/pause/resize）。

use std::ffi::c_char;
use std::sync::Mutex;

use tracing::{error, warn};

use super::abi::{AR_PREVIEW_RESUME_INVALID, resume_code};
use super::host::{
    ArPreviewHostCallbacks, HostCallbacks, HostEnvironment, HostNotifier, HostRenderer,
    HostSessionFactory,
};
use super::{ArPreviewEngine, HostCoordinator};
use crate::engine::config::SurfaceConfig;
use crate::engine::dispatch::MainThreadQueue;
use crate::engine::error::SurfaceError;
use crate::engine::logging;
use crate::engine::rendering::{ContextFactory, SurfmanContextFactory};
use crate::engine::runtime::RenderSurface;
use crate::engine::session::SessionLifecycleCoordinator;

/// ### English
/// Locks the coordinator, treating a poisoned lock as unusable.
///
/// ### 中文
/// 锁定协调器；锁中毒时视为不可用。
fn with_coordinator<T>(
    engine: &ArPreviewEngine,
    f: impl FnOnce(&mut HostCoordinator) -> T,
) -> Option<T> {
    match engine.coordinator.lock() {
        Ok(mut coordinator) => Some(f(&mut coordinator)),
        Err(_) => {
            error!("engine state poisoned by an earlier panic");
            None
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Installs the process-wide log subscriber.
///
/// `level` is an optional NUL-terminated filter such as `"info"` or `"ar_preview_engine=debug"`;
/// NULL means `"info"`. `RUST_LOG` takes precedence when set.
///
/// Returns `false` if a subscriber was already installed.
///
/// ### 中文
/// 安装进程级日志 subscriber。
///
/// `level` 为可选的 NUL 结尾过滤串，例如 `"info"` 或 `"ar_preview_engine=debug"`；
/// NULL 表示 `"info"`。设置了 `RUST_LOG` 时以其为准。
///
/// 若已安装过 subscriber 则返回 `false`。
pub unsafe extern "C" fn ar_preview_engine_init_logging(level: *const c_char) -> bool {
    let level = unsafe { super::cstr_to_str(level) }.unwrap_or("info");
    logging::init(level)
}

#[unsafe(no_mangle)]
/// ### English
/// Creates an engine: spawns the render thread with a headless GL context and wires the host
/// callbacks into the session lifecycle.
///
/// The surface starts paused; call `ar_preview_engine_notify_resume` from the host's resume
/// callback. Returns NULL if `host` is NULL or the render thread fails to initialize.
///
/// #### Parameters
/// - `width`/`height`: Initial drawable size in pixels (0 is treated as 1).
/// - `flags`: `AR_PREVIEW_SURFACE_FLAG_*` bitmask.
/// - `target_fps`: Continuous-mode frame rate (0 means the default of 60).
/// - `host`: Callback table; copied, so it need not outlive this call.
///
/// ### 中文
/// 创建引擎：以无头 GL 上下文启动渲染线程，并把宿主回调接入会话生命周期。
///
/// 表面初始为暂停状态；请在宿主的 resume 回调中调用 `ar_preview_engine_notify_resume`。
/// 若 `host` 为 NULL 或渲染线程初始化失败则返回 NULL。
///
/// #### 参数
/// - `width`/`height`：初始可绘制尺寸（像素，0 按 1 处理）。
/// - `flags`：`AR_PREVIEW_SURFACE_FLAG_*` 位掩码。
/// - `target_fps`：持续渲染模式的帧率（0 表示默认值 60）。
/// - `host`：回调表；会被拷贝，因此无需在本次调用之后保持有效。
pub unsafe extern "C" fn ar_preview_engine_create(
    width: u32,
    height: u32,
    flags: u32,
    target_fps: u32,
    host: *const ArPreviewHostCallbacks,
) -> *mut ArPreviewEngine {
    if host.is_null() {
        return std::ptr::null_mut();
    }
    let host = HostCallbacks::new(unsafe { *host });

    let mut config = SurfaceConfig::default()
        .with_size(width, height)
        .with_flags(flags);
    if target_fps != 0 {
        config = config.with_target_fps(target_fps);
    }

    match build_engine(config, SurfmanContextFactory::default(), host) {
        Ok(engine) => Box::into_raw(Box::new(engine)),
        Err(err) => {
            warn!(%err, "failed to start render surface");
            std::ptr::null_mut()
        }
    }
}

/// ### English
/// Spawns the render surface on contexts from `factory` and wires `host` into the lifecycle.
///
/// ### 中文
/// 以 `factory` 提供的上下文启动渲染表面，并把 `host` 接入生命周期。
fn build_engine<F>(
    config: SurfaceConfig,
    factory: F,
    host: HostCallbacks,
) -> Result<ArPreviewEngine, SurfaceError>
where
    F: ContextFactory,
{
    let surface = RenderSurface::spawn(config, factory, HostRenderer::new(host))?;
    let coordinator = SessionLifecycleCoordinator::new(
        HostSessionFactory::new(host),
        surface,
        HostEnvironment::new(host),
        HostNotifier::new(host),
    );

    Ok(ArPreviewEngine {
        coordinator: Mutex::new(coordinator),
        mailbox: MainThreadQueue::new(),
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys an engine created by `ar_preview_engine_create`.
///
/// Stops the render thread, then releases the session through `session_destroy`. Pending
/// snapshot callbacks are not invoked.
///
/// ### 中文
/// 销毁由 `ar_preview_engine_create` 创建的引擎。
///
/// 先停止渲染线程，再通过 `session_destroy` 释放会话。尚未完成的截图回调不会被调用。
pub unsafe extern "C" fn ar_preview_engine_destroy(engine: *mut ArPreviewEngine) {
    if engine.is_null() {
        return;
    }
    let engine = unsafe { Box::from_raw(engine) };
    let _ = with_coordinator(&engine, |coordinator| coordinator.surface_mut().shutdown());
    drop(engine);
}

#[unsafe(no_mangle)]
/// ### English
/// Host resume: checks the environment, creates/resumes the session, then resumes rendering.
///
/// Returns an `AR_PREVIEW_RESUME_*` code.
///
/// ### 中文
/// 宿主 resume：检查环境，创建/恢复会话，然后恢复渲染。
///
/// 返回 `AR_PREVIEW_RESUME_*` 结果码。
pub unsafe extern "C" fn ar_preview_engine_notify_resume(engine: *mut ArPreviewEngine) -> i32 {
    if engine.is_null() {
        return AR_PREVIEW_RESUME_INVALID;
    }
    let engine = unsafe { &*engine };
    with_coordinator(engine, |coordinator| resume_code(coordinator.on_resume()))
        .unwrap_or(AR_PREVIEW_RESUME_INVALID)
}

#[unsafe(no_mangle)]
/// ### English
/// Host pause: blocks until the render thread is quiesced, then pauses the session.
///
/// Returns `true` if a transition happened.
///
/// ### 中文
/// 宿主 pause：阻塞直到渲染线程静止，然后暂停会话。
///
/// 发生了状态转换时返回 `true`。
pub unsafe extern "C" fn ar_preview_engine_notify_pause(engine: *mut ArPreviewEngine) -> bool {
    if engine.is_null() {
        return false;
    }
    let engine = unsafe { &*engine };
    with_coordinator(engine, |coordinator| coordinator.on_pause()).unwrap_or(false)
}

#[unsafe(no_mangle)]
/// ### English
/// Runs every result the render thread has handed back so far (snapshot callbacks) on the
/// calling thread, and returns how many ran.
///
/// Call it from the host UI loop, on the thread that created the engine.
///
/// ### 中文
/// 在调用线程上执行渲染线程目前交回的所有结果（截图回调），并返回执行数量。
///
/// 请在宿主 UI 循环中、于创建引擎的线程上调用。
pub unsafe extern "C" fn ar_preview_engine_run_pending(engine: *mut ArPreviewEngine) -> u32 {
    if engine.is_null() {
        return 0;
    }
    let engine = unsafe { &*engine };
    u32::try_from(engine.mailbox.run_pending()).unwrap_or(u32::MAX)
}

#[unsafe(no_mangle)]
/// ### English
/// Requests a resize (in pixels).
///
/// ### 中文
/// 请求 resize（单位：像素）。
pub unsafe extern "C" fn ar_preview_engine_resize(
    engine: *mut ArPreviewEngine,
    width: u32,
    height: u32,
) -> bool {
    if engine.is_null() {
        return false;
    }
    let engine = unsafe { &*engine };
    with_coordinator(engine, |coordinator| {
        coordinator.surface().resize(width, height).is_ok()
    })
    .unwrap_or(false)
}

#[unsafe(no_mangle)]
/// ### English
/// Requests one frame when the surface was created with `AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY`.
///
/// ### 中文
/// 表面以 `AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY` 创建时，请求绘制一帧。
pub unsafe extern "C" fn ar_preview_engine_request_render(engine: *mut ArPreviewEngine) -> bool {
    if engine.is_null() {
        return false;
    }
    let engine = unsafe { &*engine };
    with_coordinator(engine, |coordinator| {
        coordinator.surface().request_render().is_ok()
    })
    .unwrap_or(false)
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the number of frames drawn so far (0 for a NULL engine).
///
/// ### 中文
/// 返回迄今已绘制的帧数（引擎为 NULL 时返回 0）。
pub unsafe extern "C" fn ar_preview_engine_frame_count(engine: *mut ArPreviewEngine) -> u64 {
    if engine.is_null() {
        return 0;
    }
    let engine = unsafe { &*engine };
    with_coordinator(engine, |coordinator| coordinator.surface().frame_count()).unwrap_or(0)
}

#[cfg(test)]
pub(super) mod tests {
    use std::ffi::CString;

    use super::*;
    use crate::engine::session::CAMERA_UNAVAILABLE_MESSAGE;
    use crate::engine::snapshot::tests::MemoryFactory;
    use crate::ffi::abi::{
        AR_PREVIEW_RESUME_ALREADY_ACTIVE, AR_PREVIEW_RESUME_CAMERA_UNAVAILABLE,
        AR_PREVIEW_RESUME_ENVIRONMENT_UNAVAILABLE, AR_PREVIEW_RESUME_RESUMED,
    };
    use crate::ffi::host::AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE;
    use crate::ffi::host::tests::{Recorder, callbacks, events};

    /// ### English
    /// Boxes an engine drawing into a 2x2 in-memory framebuffer; `recorder` must outlive it.
    ///
    /// ### 中文
    /// 创建绘制到 2x2 内存帧缓冲的引擎；`recorder` 的生命周期必须长于该引擎。
    pub(in crate::ffi) fn memory_engine(recorder: &Recorder) -> *mut ArPreviewEngine {
        let host = HostCallbacks::new(callbacks(recorder));
        let config = SurfaceConfig::default().with_size(2, 2);
        let engine = build_engine(config, MemoryFactory::default(), host).unwrap();
        Box::into_raw(Box::new(engine))
    }

    fn count(recorder: &Recorder, event: &str) -> usize {
        events(recorder).iter().filter(|e| *e == event).count()
    }

    #[test]
    fn resume_and_pause_map_to_abi_codes() {
        let recorder = Recorder::default();
        let engine = memory_engine(&recorder);

        unsafe {
            assert_eq!(ar_preview_engine_notify_resume(engine), AR_PREVIEW_RESUME_RESUMED);
            assert_eq!(
                ar_preview_engine_notify_resume(engine),
                AR_PREVIEW_RESUME_ALREADY_ACTIVE
            );
            assert!(ar_preview_engine_notify_pause(engine));
            assert!(!ar_preview_engine_notify_pause(engine));
        }
        assert_eq!(events(&recorder), ["create", "resume", "pause"]);

        unsafe { ar_preview_engine_destroy(engine) };
        assert_eq!(events(&recorder), ["create", "resume", "pause", "destroy"]);
    }

    #[test]
    fn destroy_releases_the_session_once() {
        let recorder = Recorder::default();
        let engine = memory_engine(&recorder);

        unsafe {
            assert_eq!(ar_preview_engine_notify_resume(engine), AR_PREVIEW_RESUME_RESUMED);
            ar_preview_engine_destroy(engine);
        }

        assert_eq!(count(&recorder, "create"), 1);
        assert_eq!(count(&recorder, "destroy"), 1);
        assert_eq!(events(&recorder).last().map(String::as_str), Some("destroy"));
    }

    #[test]
    fn camera_unavailable_shows_one_message_and_retries() {
        let recorder = Recorder::default();
        *recorder.resume_code.lock().unwrap() = AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE;
        let engine = memory_engine(&recorder);

        unsafe {
            assert_eq!(
                ar_preview_engine_notify_resume(engine),
                AR_PREVIEW_RESUME_CAMERA_UNAVAILABLE
            );
            assert!(!ar_preview_engine_notify_pause(engine));
        }
        let message = format!("message:{CAMERA_UNAVAILABLE_MESSAGE}");
        assert_eq!(count(&recorder, &message), 1);

        *recorder.resume_code.lock().unwrap() = 0;
        unsafe {
            assert_eq!(ar_preview_engine_notify_resume(engine), AR_PREVIEW_RESUME_RESUMED);
            ar_preview_engine_destroy(engine);
        }
        assert_eq!(count(&recorder, "create"), 2);
        assert_eq!(count(&recorder, "destroy"), 2);
        assert_eq!(count(&recorder, &message), 1);
    }

    #[test]
    fn unavailable_runtime_creates_no_session() {
        let recorder = Recorder {
            unavailable: Some(CString::new("Install the AR runtime").unwrap()),
            ..Recorder::default()
        };
        let engine = memory_engine(&recorder);

        unsafe {
            assert_eq!(
                ar_preview_engine_notify_resume(engine),
                AR_PREVIEW_RESUME_ENVIRONMENT_UNAVAILABLE
            );
            ar_preview_engine_destroy(engine);
        }
        assert_eq!(events(&recorder), ["message:Install the AR runtime"]);
    }

    #[test]
    fn surface_calls_reach_the_render_thread() {
        let recorder = Recorder::default();
        let engine = memory_engine(&recorder);

        unsafe {
            assert!(ar_preview_engine_resize(engine, 4, 3));
            assert!(ar_preview_engine_request_render(engine));
            assert_eq!(ar_preview_engine_run_pending(engine), 0);
            ar_preview_engine_destroy(engine);
        }
    }

    #[test]
    fn null_handles_are_rejected() {
        let engine = std::ptr::null_mut();
        unsafe {
            assert!(ar_preview_engine_create(2, 2, 0, 0, std::ptr::null()).is_null());
            assert_eq!(ar_preview_engine_notify_resume(engine), AR_PREVIEW_RESUME_INVALID);
            assert!(!ar_preview_engine_notify_pause(engine));
            assert!(!ar_preview_engine_resize(engine, 1, 1));
            assert!(!ar_preview_engine_request_render(engine));
            assert_eq!(ar_preview_engine_run_pending(engine), 0);
            assert_eq!(ar_preview_engine_frame_count(engine), 0);
            ar_preview_engine_destroy(engine);
        }
    }

    #[test]
    fn failed_context_creation_builds_no_engine() {
        let recorder = Recorder::default();
        let host = HostCallbacks::new(callbacks(&recorder));
        let factory = MemoryFactory {
            fail: true,
            ..MemoryFactory::default()
        };

        let result = build_engine(SurfaceConfig::default(), factory, host);

        assert!(matches!(result, Err(SurfaceError::ContextCreation(_))));
        assert!(events(&recorder).is_empty());
    }
}
