//! ### English
//! Owned handle over the lazily created tracking session.
//!
//! ### 中文
//! 对延迟创建的追踪会话的所有权句柄。

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::error::SessionError;

use super::{SessionFactory, TrackingSession};

/// ### English
/// Lifecycle state of the wrapped session.
///
/// ### 中文
/// 被封装会话的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unallocated,
    /// ### English
    /// Created but never resumed.
    ///
    /// ### 中文
    /// 已创建但从未 resume。
    Created,
    Paused,
    Active,
}

/// ### English
/// Sole owner of the tracking session and its camera resources.
///
/// ### 中文
/// 追踪会话及其相机资源的唯一所有者。
pub struct SessionHandle<S> {
    state: SessionState,
    session: Option<Arc<S>>,
}

impl<S: TrackingSession + 'static> SessionHandle<S> {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unallocated,
            session: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Arc<S>> {
        self.session.as_ref()
    }

    /// ### English
    /// Creates the session through `factory` if none exists yet.
    ///
    /// Returns the new session when one was created by this call.
    ///
    /// ### 中文
    /// 若尚无会话，则通过 `factory` 创建。
    ///
    /// 仅当本次调用创建了新会话时返回该会话。
    pub fn ensure_created<F>(&mut self, factory: &mut F) -> Result<Option<Arc<S>>, SessionError>
    where
        F: SessionFactory<Session = S>,
    {
        if self.session.is_some() {
            return Ok(None);
        }

        let session = Arc::new(factory.create()?);
        self.session = Some(session.clone());
        self.state = SessionState::Created;
        info!("tracking session created");
        Ok(Some(session))
    }

    /// ### English
    /// Resumes the session. On failure the state is left unchanged.
    ///
    /// ### 中文
    /// 恢复会话。失败时状态保持不变。
    pub fn resume(&mut self) -> Result<(), SessionError> {
        let Some(session) = self.session.as_ref() else {
            return Err(SessionError::Creation("session not created".to_string()));
        };
        session.resume()?;
        self.state = SessionState::Active;
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        if let Some(session) = self.session.as_ref() {
            session.pause();
            self.state = SessionState::Paused;
        }
    }

    /// ### English
    /// Drops the session so the next resume creates a fresh one.
    ///
    /// ### 中文
    /// 丢弃会话，使下一次 resume 重新创建。
    pub fn release(&mut self) {
        if self.session.take().is_some() {
            debug!("tracking session released");
        }
        self.state = SessionState::Unallocated;
    }
}

impl<S: TrackingSession + 'static> Default for SessionHandle<S> {
    fn default() -> Self {
        Self::new()
    }
}
