//! ### English
//! Pause/resume coordinator for the render surface and the tracking session.
//!
//! Order matters. On pause the surface is paused first so the render thread cannot query a
//! session that is being paused mid-frame. On resume the reverse applies: the session must be
//! running before frames are drawn again.
//!
//! ### 中文
//! 渲染表面与追踪会话的暂停/恢复协调器。
//!
//! 顺序很重要。暂停时先暂停表面，使渲染线程不会在帧中途查询一个正在被暂停的会话。
//! 恢复时顺序相反：会话必须先运行，之后才能重新开始绘制。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::error::SessionError;

use super::handle::{SessionHandle, SessionState};
use super::{EnvironmentCheck, Notifier, SessionFactory, SurfaceControl, TrackingSession};

/// ### English
/// Message shown when another client holds the camera.
///
/// ### 中文
/// 相机被其它客户端占用时展示的消息。
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera not available. Please restart the app.";

/// ### English
/// Coordinator-level lifecycle state.
///
/// ### 中文
/// 协调器层面的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unallocated,
    CreatedPaused,
    Active,
    /// ### English
    /// The last resume failed; the next resume starts over from session creation.
    ///
    /// ### 中文
    /// 上一次 resume 失败；下一次 resume 将从创建会话重新开始。
    Error,
}

/// ### English
/// Result of one `on_resume` call.
///
/// ### 中文
/// 单次 `on_resume` 调用的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed,
    AlreadyActive,
    EnvironmentUnavailable,
    PermissionMissing,
    CreationFailed,
    CameraUnavailable,
}

/// ### English
/// Environment check that always passes (hosts without an AR runtime install step).
///
/// ### 中文
/// 始终通过的环境检查（适用于无需安装 AR 运行时的宿主）。
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

impl EnvironmentCheck for AlwaysReady {
    fn ar_availability(&self) -> Result<(), String> {
        Ok(())
    }

    fn camera_permission_granted(&self) -> bool {
        true
    }
}

/// ### English
/// Drives the render surface and the tracking session through host pause/resume events.
///
/// Not reentrant: transitions take `&mut self`, so the host serializes them the same way its
/// own lifecycle callbacks are serialized.
///
/// ### 中文
/// 根据宿主的暂停/恢复事件驱动渲染表面与追踪会话。
///
/// 不可重入：状态转换需要 `&mut self`，因此宿主会像串行化自身生命周期回调一样串行化这些调用。
pub struct SessionLifecycleCoordinator<F, S, E, N>
where
    F: SessionFactory,
{
    factory: F,
    surface: S,
    environment: E,
    notifier: N,
    session: SessionHandle<F::Session>,
    failed: bool,
}

impl<F, S, E, N> SessionLifecycleCoordinator<F, S, E, N>
where
    F: SessionFactory,
    S: SurfaceControl,
    E: EnvironmentCheck,
    N: Notifier,
{
    pub fn new(factory: F, surface: S, environment: E, notifier: N) -> Self {
        Self {
            factory,
            surface,
            environment,
            notifier,
            session: SessionHandle::new(),
            failed: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        if self.failed {
            return LifecycleState::Error;
        }
        match self.session.state() {
            SessionState::Unallocated => LifecycleState::Unallocated,
            SessionState::Created | SessionState::Paused => LifecycleState::CreatedPaused,
            SessionState::Active => LifecycleState::Active,
        }
    }

    pub fn session(&self) -> Option<&Arc<F::Session>> {
        self.session.session()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// ### English
    /// Host resume: check the environment, create the session if needed, resume it, and only
    /// then resume the render surface.
    ///
    /// ### 中文
    /// 宿主 resume：检查环境，必要时创建会话并恢复，之后才恢复渲染表面。
    pub fn on_resume(&mut self) -> ResumeOutcome {
        if self.state() == LifecycleState::Active {
            return ResumeOutcome::AlreadyActive;
        }

        if let Err(message) = self.environment.ar_availability() {
            warn!(%message, "AR runtime unavailable");
            self.notifier.show_message(&message);
            return ResumeOutcome::EnvironmentUnavailable;
        }
        if !self.environment.camera_permission_granted() {
            debug!("camera permission not granted; waiting for the host to request it");
            return ResumeOutcome::PermissionMissing;
        }

        match self.session.ensure_created(&mut self.factory) {
            Ok(Some(session)) => {
                let session: Arc<dyn TrackingSession> = session;
                self.surface.attach_session(session);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(%err, "failed to create tracking session");
                self.notifier.show_message(&err.to_string());
                return ResumeOutcome::CreationFailed;
            }
        }

        if let Err(err) = self.session.resume() {
            /*
            ### English
            The camera may have been handed to another app. Drop the session so the next resume
            recreates it, and leave the surface paused.

            ### 中文
            相机可能已被分配给其它应用。丢弃会话以便下一次 resume 重新创建，并保持表面暂停。
            */
            warn!(%err, "tracking session failed to resume");
            self.session.release();
            self.failed = true;
            return match err {
                SessionError::CameraUnavailable => {
                    self.notifier.show_message(CAMERA_UNAVAILABLE_MESSAGE);
                    ResumeOutcome::CameraUnavailable
                }
                other => {
                    self.notifier.show_message(&other.to_string());
                    ResumeOutcome::CreationFailed
                }
            };
        }

        self.failed = false;
        self.surface.resume();
        info!("session and render surface resumed");
        ResumeOutcome::Resumed
    }

    /// ### English
    /// Host pause: quiesce the render surface, then pause the session.
    ///
    /// Returns `false` (no-op) unless the pair was active.
    ///
    /// ### 中文
    /// 宿主 pause：先让渲染表面静止，再暂停会话。
    ///
    /// 仅当二者处于活动状态时才执行，否则返回 `false`（无操作）。
    pub fn on_pause(&mut self) -> bool {
        if self.state() != LifecycleState::Active {
            debug!(state = ?self.state(), "pause ignored");
            return false;
        }

        self.surface.pause();
        self.session.pause();
        info!("render surface and session paused");
        true
    }
}
