/// ### English
/// Engine internal modules (render thread, snapshots, session lifecycle and ambient plumbing).
///
/// ### 中文
/// 引擎内部模块（渲染线程、截图、会话生命周期以及基础设施）。
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod logging;
pub mod pixel;
pub mod rendering;
pub mod runtime;
pub mod session;
pub mod snapshot;

pub use config::{RenderMode, SurfaceConfig};
pub use dispatch::{MainThreadDispatcher, MainThreadQueue};
pub use error::{ReadbackError, SessionError, SnapshotError, SurfaceError};
pub use rendering::{ContextFactory, FrameRenderer, GraphicsContext};
pub use runtime::{RenderSurface, SnapshotTicket};
pub use session::{
    EnvironmentCheck, LifecycleState, Notifier, ResumeOutcome, SessionFactory,
    SessionLifecycleCoordinator, SurfaceControl, TrackingSession,
};
pub use snapshot::{Image, Region, snapshot};
