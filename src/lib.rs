/// ### English
/// `ar_preview_engine` crate root.
/// Core implementation lives under `engine`; the C ABI for native hosts lives in `ffi`.
///
/// ### 中文
/// `ar_preview_engine` 的 crate 根。
/// 核心实现位于 `engine` 模块；面向原生宿主的 C ABI 位于 `ffi`。
pub mod engine;
mod ffi;

pub use engine::{
    Image, MainThreadDispatcher, MainThreadQueue, Region, RenderSurface, SessionLifecycleCoordinator,
    SnapshotError, SnapshotTicket, SurfaceConfig,
};
