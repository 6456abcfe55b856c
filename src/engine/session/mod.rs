//! ### English
//! Tracking-session lifecycle: the external session seam and the coordinator that pauses and
//! resumes it in lockstep with the render surface.
//!
//! ### 中文
//! 追踪会话生命周期：外部会话接口，以及与渲染表面同步暂停/恢复会话的协调器。

mod coordinator;
mod handle;

use std::sync::Arc;

use crate::engine::error::SessionError;

pub use coordinator::{
    AlwaysReady, CAMERA_UNAVAILABLE_MESSAGE, LifecycleState, ResumeOutcome,
    SessionLifecycleCoordinator,
};
pub use handle::{SessionHandle, SessionState};

/// ### English
/// External camera-tracking session.
///
/// Shared between the coordinator (pause/resume) and the renderer (per-frame queries), so the
/// methods take `&self`.
///
/// ### 中文
/// 外部相机追踪会话。
///
/// 由协调器（暂停/恢复）与渲染器（逐帧查询）共享，因此方法均接收 `&self`。
pub trait TrackingSession: Send + Sync {
    fn resume(&self) -> Result<(), SessionError>;
    fn pause(&self);
}

/// ### English
/// Creates tracking sessions (allocates camera-tracking resources).
///
/// ### 中文
/// 创建追踪会话（分配相机追踪资源）。
pub trait SessionFactory {
    type Session: TrackingSession + 'static;

    fn create(&mut self) -> Result<Self::Session, SessionError>;
}

/// ### English
/// Host environment checks performed before a session is created or resumed.
///
/// ### 中文
/// 创建或恢复会话之前执行的宿主环境检查。
pub trait EnvironmentCheck {
    /// ### English
    /// `Err(message)` when the AR runtime is missing or outdated; the message is shown to the user.
    ///
    /// ### 中文
    /// AR 运行时缺失或版本过旧时返回 `Err(message)`；该消息会展示给用户。
    fn ar_availability(&self) -> Result<(), String>;

    /// ### English
    /// Whether camera permission is granted (prompting is the host's job).
    ///
    /// ### 中文
    /// 是否已授予相机权限（请求权限由宿主负责）。
    fn camera_permission_granted(&self) -> bool;
}

/// ### English
/// User-visible, non-fatal messages (toasts).
///
/// ### 中文
/// 用户可见的非致命消息（toast）。
pub trait Notifier {
    fn show_message(&self, message: &str);
}

/// ### English
/// The render-surface operations the coordinator drives.
///
/// ### 中文
/// 协调器驱动的渲染表面操作。
pub trait SurfaceControl {
    /// ### English
    /// Stops drawing; returns only after the render thread is quiesced.
    ///
    /// ### 中文
    /// 停止绘制；仅在渲染线程静止后返回。
    fn pause(&self);

    fn resume(&self);

    fn attach_session(&self, session: Arc<dyn TrackingSession>);
}
