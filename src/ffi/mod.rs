//! ### English
//! C ABI surface for `ar_preview_engine`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Lifecycle calls (`create`, `notify_resume`, `notify_pause`, `run_pending`, `destroy`) must come
//! from the host UI thread that created the engine. No engine function may be called from inside a
//! host callback.
//!
//! ### 中文
//! `ar_preview_engine` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 生命周期调用（`create`、`notify_resume`、`notify_pause`、`run_pending`、`destroy`）必须来自
//! 创建引擎的宿主 UI 线程。
//! 不得在宿主回调内部调用任何引擎函数。
mod abi;
mod engine;
mod host;
mod snapshot;

use std::ffi::{CStr, c_char};
use std::sync::Mutex;

use crate::engine::dispatch::MainThreadQueue;
use crate::engine::runtime::RenderSurface;
use crate::engine::session::SessionLifecycleCoordinator;
use crate::engine::snapshot::Image;

use host::{HostEnvironment, HostNotifier, HostSessionFactory};

type HostCoordinator =
    SessionLifecycleCoordinator<HostSessionFactory, RenderSurface, HostEnvironment, HostNotifier>;

#[repr(C)]
/// ### English
/// Opaque engine handle owning the render thread and the session lifecycle.
///
/// ### 中文
/// 不透明引擎句柄，持有渲染线程与会话生命周期。
pub struct ArPreviewEngine {
    /// ### English
    /// Coordinator owning the render surface and the host session.
    ///
    /// ### 中文
    /// 持有渲染表面与宿主会话的协调器。
    coordinator: Mutex<HostCoordinator>,
    /// ### English
    /// Results the render thread hands back to the UI thread, drained by
    /// `ar_preview_engine_run_pending`.
    ///
    /// ### 中文
    /// 渲染线程交回 UI 线程的结果，由 `ar_preview_engine_run_pending` drain。
    mailbox: MainThreadQueue,
}

#[repr(C)]
/// ### English
/// Borrowed view of one snapshot, handed to the snapshot callback.
///
/// `pixels` points at `width * height` `0xAARRGGBB` words, top row first. The memory is only valid
/// for the duration of the callback; copy it out if it must outlive the call.
///
/// ### 中文
/// 单张快照的借用视图，传给截图回调。
///
/// `pixels` 指向 `width * height` 个 `0xAARRGGBB` 字，顶部行在前。该内存仅在回调期间有效；
/// 若需在回调之后使用，请自行拷贝。
pub struct ArPreviewImage {
    pub width: u32,
    pub height: u32,
    pub pixels: *const u32,
    /// ### English
    /// Number of words behind `pixels` (`width * height`).
    ///
    /// ### 中文
    /// `pixels` 后的字数（`width * height`）。
    pub pixel_count: usize,
}

impl From<&Image> for ArPreviewImage {
    fn from(value: &Image) -> Self {
        Self {
            width: value.width(),
            height: value.height(),
            pixels: value.pixels().as_ptr(),
            pixel_count: value.pixels().len(),
        }
    }
}

/// ### English
/// C ABI version for `ar_preview_engine`.
///
/// ### 中文
/// `ar_preview_engine` 的 C ABI 版本号。
const AR_PREVIEW_ENGINE_ABI_VERSION: u32 = 1;

/// ### English
/// Converts an optional NUL-terminated UTF-8 C string into a `&str`.
///
/// Returns `None` for NULL pointers, invalid UTF-8, or empty strings.
///
/// # Safety
/// `ptr` must be valid and point to a NUL-terminated string for the returned lifetime.
///
/// ### 中文
/// 将可选的 NUL 结尾 UTF-8 C 字符串转换为 `&str`。
///
/// 对 NULL 指针、UTF-8 非法或空字符串返回 `None`。
///
/// # Safety
/// `ptr` 在返回值的生命周期内必须有效，并指向以 NUL 结尾的字符串。
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }

    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if value.is_empty() {
        return None;
    }

    Some(value)
}
