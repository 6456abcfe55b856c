//! ### English
//! Host callback table and the adapters that plug it into the engine's session, environment,
//! notifier and renderer seams.
//!
//! ### 中文
//! 宿主回调表，以及把它接入引擎会话、环境检查、通知与渲染器接口的适配器。

use std::ffi::{CStr, CString, c_char, c_void};
use std::sync::Arc;

use dpi::PhysicalSize;
use tracing::warn;

use crate::engine::error::SessionError;
use crate::engine::rendering::{FrameRenderer, GraphicsContext};
use crate::engine::session::{EnvironmentCheck, Notifier, SessionFactory, TrackingSession};

/// ### English
/// `session_resume` return value for success.
///
/// ### 中文
/// `session_resume` 成功时的返回值。
pub const AR_PREVIEW_SESSION_RESUME_OK: i32 = 0;
/// ### English
/// `session_resume` return value when another client holds the camera.
///
/// ### 中文
/// 相机被其它客户端占用时 `session_resume` 的返回值。
pub const AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE: i32 = 1;

#[repr(C)]
#[derive(Clone, Copy)]
/// ### English
/// Host-provided callbacks. Every entry may be NULL.
///
/// `user_data` is passed back as the first argument of every callback. The draw hooks run on the
/// render thread with the GL context current. `session_destroy` runs wherever the engine drops its
/// last reference to the session, which is the render thread when a newer session replaces it
/// there. The others run on the thread that called into the engine. The host must make `user_data`
/// safe to use from both threads.
///
/// ### 中文
/// 宿主提供的回调。每一项都可以为 NULL。
///
/// `user_data` 作为每个回调的第一个参数传回。绘制钩子在渲染线程上、GL 上下文为 current 时执行。
/// `session_destroy` 在引擎释放会话最后一个引用的线程上执行；当渲染线程上有新会话替换旧会话时，
/// 该线程即为渲染线程。其余回调在调用引擎的线程上执行。宿主必须保证 `user_data` 可在这两个线程上
/// 安全使用。
pub struct ArPreviewHostCallbacks {
    pub user_data: *mut c_void,
    /// ### English
    /// Allocates a tracking session. Returns an opaque session pointer, or NULL on failure.
    ///
    /// ### 中文
    /// 分配追踪会话。返回不透明会话指针，失败时返回 NULL。
    pub session_create: Option<unsafe extern "C" fn(user_data: *mut c_void) -> *mut c_void>,
    /// ### English
    /// Resumes the session; returns `AR_PREVIEW_SESSION_RESUME_*`. Any other value is a failure.
    ///
    /// ### 中文
    /// 恢复会话；返回 `AR_PREVIEW_SESSION_RESUME_*`。其它值视为失败。
    pub session_resume:
        Option<unsafe extern "C" fn(user_data: *mut c_void, session: *mut c_void) -> i32>,
    pub session_pause: Option<unsafe extern "C" fn(user_data: *mut c_void, session: *mut c_void)>,
    /// ### English
    /// Releases a session once the engine drops its last reference.
    ///
    /// May run on the render thread: a session released after a failed resume stays referenced
    /// by the renderer until the next session is attached there.
    ///
    /// ### 中文
    /// 引擎释放最后一个引用后销毁会话。
    ///
    /// 可能在渲染线程上执行：resume 失败后被释放的会话仍由渲染器引用，直到下一个会话在渲染线程上
    /// 挂接为止。
    pub session_destroy: Option<unsafe extern "C" fn(user_data: *mut c_void, session: *mut c_void)>,
    /// ### English
    /// Returns NULL when the AR runtime is usable, otherwise a NUL-terminated message that stays
    /// valid until the engine's next call into the host.
    ///
    /// ### 中文
    /// AR 运行时可用时返回 NULL，否则返回一条 NUL 结尾的消息，其在引擎下一次调用宿主前保持有效。
    pub ar_availability: Option<unsafe extern "C" fn(user_data: *mut c_void) -> *const c_char>,
    pub camera_permission_granted: Option<unsafe extern "C" fn(user_data: *mut c_void) -> bool>,
    pub show_message: Option<unsafe extern "C" fn(user_data: *mut c_void, message: *const c_char)>,
    pub surface_created: Option<unsafe extern "C" fn(user_data: *mut c_void)>,
    pub surface_changed: Option<unsafe extern "C" fn(user_data: *mut c_void, width: u32, height: u32)>,
    pub draw_frame: Option<unsafe extern "C" fn(user_data: *mut c_void, width: u32, height: u32)>,
}

/// ### English
/// Copy of the host table that may cross threads.
///
/// ### 中文
/// 可跨线程传递的宿主回调表副本。
#[derive(Clone, Copy)]
pub(super) struct HostCallbacks(ArPreviewHostCallbacks);

// The host owns `user_data` and promises it is usable from the UI and render threads.
unsafe impl Send for HostCallbacks {}
unsafe impl Sync for HostCallbacks {}

impl HostCallbacks {
    pub(super) fn new(callbacks: ArPreviewHostCallbacks) -> Self {
        Self(callbacks)
    }

    fn user_data(&self) -> *mut c_void {
        self.0.user_data
    }
}

/// ### English
/// Session allocated by the host.
///
/// ### 中文
/// 由宿主分配的会话。
pub(super) struct HostSession {
    host: HostCallbacks,
    handle: *mut c_void,
}

// `handle` is only passed back to the host, which owns its thread-safety.
unsafe impl Send for HostSession {}
unsafe impl Sync for HostSession {}

impl TrackingSession for HostSession {
    fn resume(&self) -> Result<(), SessionError> {
        let Some(resume) = self.host.0.session_resume else {
            return Ok(());
        };
        match unsafe { resume(self.host.user_data(), self.handle) } {
            AR_PREVIEW_SESSION_RESUME_OK => Ok(()),
            AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE => Err(SessionError::CameraUnavailable),
            code => Err(SessionError::Creation(format!(
                "host session resume failed with code {code}"
            ))),
        }
    }

    fn pause(&self) {
        if let Some(pause) = self.host.0.session_pause {
            unsafe { pause(self.host.user_data(), self.handle) };
        }
    }
}

impl Drop for HostSession {
    fn drop(&mut self) {
        if let Some(destroy) = self.host.0.session_destroy {
            unsafe { destroy(self.host.user_data(), self.handle) };
        }
    }
}

pub(super) struct HostSessionFactory {
    host: HostCallbacks,
}

impl HostSessionFactory {
    pub(super) fn new(host: HostCallbacks) -> Self {
        Self { host }
    }
}

impl SessionFactory for HostSessionFactory {
    type Session = HostSession;

    fn create(&mut self) -> Result<HostSession, SessionError> {
        let Some(create) = self.host.0.session_create else {
            return Err(SessionError::Creation(
                "host provides no session_create callback".to_string(),
            ));
        };
        let handle = unsafe { create(self.host.user_data()) };
        if handle.is_null() {
            return Err(SessionError::Creation(
                "host failed to create a tracking session".to_string(),
            ));
        }
        Ok(HostSession {
            host: self.host,
            handle,
        })
    }
}

pub(super) struct HostEnvironment {
    host: HostCallbacks,
}

impl HostEnvironment {
    pub(super) fn new(host: HostCallbacks) -> Self {
        Self { host }
    }
}

impl EnvironmentCheck for HostEnvironment {
    fn ar_availability(&self) -> Result<(), String> {
        let Some(check) = self.host.0.ar_availability else {
            return Ok(());
        };
        let message = unsafe { check(self.host.user_data()) };
        if message.is_null() {
            return Ok(());
        }
        Err(unsafe { CStr::from_ptr(message) }
            .to_string_lossy()
            .into_owned())
    }

    fn camera_permission_granted(&self) -> bool {
        match self.host.0.camera_permission_granted {
            Some(granted) => unsafe { granted(self.host.user_data()) },
            None => true,
        }
    }
}

pub(super) struct HostNotifier {
    host: HostCallbacks,
}

impl HostNotifier {
    pub(super) fn new(host: HostCallbacks) -> Self {
        Self { host }
    }
}

impl Notifier for HostNotifier {
    fn show_message(&self, message: &str) {
        let Some(show) = self.host.0.show_message else {
            return;
        };
        match CString::new(message) {
            Ok(message) => unsafe { show(self.host.user_data(), message.as_ptr()) },
            Err(err) => warn!(%err, "message with interior NUL not shown"),
        }
    }
}

/// ### English
/// Renderer that forwards the surface callbacks to the host draw hooks.
///
/// ### 中文
/// 将表面回调转发给宿主绘制钩子的渲染器。
pub(super) struct HostRenderer {
    host: HostCallbacks,
    /// ### English
    /// Keeps the attached session alive while frames may still query it. Replacing it drops the
    /// old reference on the render thread.
    ///
    /// ### 中文
    /// 在帧仍可能查询会话时保持其存活。替换时旧引用在渲染线程上释放。
    session: Option<Arc<dyn TrackingSession>>,
}

impl HostRenderer {
    pub(super) fn new(host: HostCallbacks) -> Self {
        Self {
            host,
            session: None,
        }
    }
}

impl FrameRenderer for HostRenderer {
    fn surface_created(&mut self, _context: &mut dyn GraphicsContext) {
        if let Some(created) = self.host.0.surface_created {
            unsafe { created(self.host.user_data()) };
        }
    }

    fn surface_changed(&mut self, _context: &mut dyn GraphicsContext, size: PhysicalSize<u32>) {
        if let Some(changed) = self.host.0.surface_changed {
            unsafe { changed(self.host.user_data(), size.width, size.height) };
        }
    }

    fn draw_frame(&mut self, context: &mut dyn GraphicsContext) {
        let Some(draw) = self.host.0.draw_frame else {
            return;
        };
        let size = context.size();
        unsafe { draw(self.host.user_data(), size.width, size.height) };
    }

    fn set_session(&mut self, session: Arc<dyn TrackingSession>) {
        self.session = Some(session);
    }
}

#[cfg(test)]
pub(super) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// ### English
    /// Host state recorded by the test callbacks.
    ///
    /// ### 中文
    /// 测试回调记录的宿主状态。
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) events: Mutex<Vec<String>>,
        pub(crate) resume_code: Mutex<i32>,
        pub(crate) unavailable: Option<CString>,
    }

    fn recorder<'a>(user_data: *mut c_void) -> &'a Recorder {
        unsafe { &*(user_data as *const Recorder) }
    }

    fn push(user_data: *mut c_void, event: impl Into<String>) {
        recorder(user_data).events.lock().unwrap().push(event.into());
    }

    unsafe extern "C" fn create(user_data: *mut c_void) -> *mut c_void {
        push(user_data, "create");
        Box::into_raw(Box::new(7u32)) as *mut c_void
    }

    unsafe extern "C" fn resume(user_data: *mut c_void, _session: *mut c_void) -> i32 {
        push(user_data, "resume");
        *recorder(user_data).resume_code.lock().unwrap()
    }

    unsafe extern "C" fn pause(user_data: *mut c_void, _session: *mut c_void) {
        push(user_data, "pause");
    }

    unsafe extern "C" fn destroy(user_data: *mut c_void, session: *mut c_void) {
        push(user_data, "destroy");
        drop(unsafe { Box::from_raw(session as *mut u32) });
    }

    unsafe extern "C" fn availability(user_data: *mut c_void) -> *const c_char {
        match recorder(user_data).unavailable.as_ref() {
            Some(message) => message.as_ptr(),
            None => std::ptr::null(),
        }
    }

    unsafe extern "C" fn show(user_data: *mut c_void, message: *const c_char) {
        let text = unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned();
        push(user_data, format!("message:{text}"));
    }

    pub(crate) fn callbacks(recorder: &Recorder) -> ArPreviewHostCallbacks {
        ArPreviewHostCallbacks {
            user_data: recorder as *const Recorder as *mut c_void,
            session_create: Some(create),
            session_resume: Some(resume),
            session_pause: Some(pause),
            session_destroy: Some(destroy),
            ar_availability: Some(availability),
            camera_permission_granted: None,
            show_message: Some(show),
            surface_created: None,
            surface_changed: None,
            draw_frame: None,
        }
    }

    pub(crate) fn events(recorder: &Recorder) -> Vec<String> {
        recorder.events.lock().unwrap().clone()
    }

    #[test]
    fn host_session_round_trips_through_callbacks() {
        let recorder = Recorder::default();
        let host = HostCallbacks::new(callbacks(&recorder));
        let mut factory = HostSessionFactory::new(host);

        let session = factory.create().unwrap();
        session.resume().unwrap();
        session.pause();
        drop(session);

        assert_eq!(events(&recorder), ["create", "resume", "pause", "destroy"]);
    }

    #[test]
    fn resume_codes_map_to_session_errors() {
        let recorder = Recorder::default();
        let host = HostCallbacks::new(callbacks(&recorder));
        let session = HostSessionFactory::new(host).create().unwrap();

        *recorder.resume_code.lock().unwrap() = AR_PREVIEW_SESSION_RESUME_CAMERA_UNAVAILABLE;
        assert_eq!(session.resume(), Err(SessionError::CameraUnavailable));

        *recorder.resume_code.lock().unwrap() = 42;
        assert!(matches!(session.resume(), Err(SessionError::Creation(_))));
    }

    #[test]
    fn missing_callbacks_fall_back_to_defaults() {
        let table = ArPreviewHostCallbacks {
            user_data: std::ptr::null_mut(),
            session_create: None,
            session_resume: None,
            session_pause: None,
            session_destroy: None,
            ar_availability: None,
            camera_permission_granted: None,
            show_message: None,
            surface_created: None,
            surface_changed: None,
            draw_frame: None,
        };
        let host = HostCallbacks::new(table);
        let environment = HostEnvironment::new(host);
        assert_eq!(environment.ar_availability(), Ok(()));
        assert!(environment.camera_permission_granted());
        assert!(HostSessionFactory::new(host).create().is_err());
        HostNotifier::new(host).show_message("ignored");
    }

    #[test]
    fn environment_and_notifier_forward_messages() {
        let recorder = Recorder {
            unavailable: Some(CString::new("Please install the AR runtime").unwrap()),
            ..Recorder::default()
        };
        let host = HostCallbacks::new(callbacks(&recorder));

        let message = HostEnvironment::new(host).ar_availability().unwrap_err();
        HostNotifier::new(host).show_message(&message);
        assert_eq!(events(&recorder), ["message:Please install the AR runtime"]);
    }

    #[test]
    fn replacing_the_session_destroys_the_old_one() {
        let recorder = Recorder::default();
        let host = HostCallbacks::new(callbacks(&recorder));
        let mut factory = HostSessionFactory::new(host);
        let first: Arc<dyn TrackingSession> = Arc::new(factory.create().unwrap());
        let second: Arc<dyn TrackingSession> = Arc::new(factory.create().unwrap());

        let mut renderer = HostRenderer::new(host);
        renderer.set_session(first);
        let renderer = std::thread::Builder::new()
            .name("renderer".to_string())
            .spawn(move || {
                renderer.set_session(second);
                renderer
            })
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(events(&recorder), ["create", "create", "destroy"]);
        drop(renderer);
        assert_eq!(events(&recorder), ["create", "create", "destroy", "destroy"]);
    }
}
