//! ### English
//! Rendering module entry point.
//! Splits the graphics-context seams, the glow-backed context and the surfman context factory
//! into submodules.
//!
//! ### 中文
//! 渲染模块入口。
//! 将图形上下文接口、基于 glow 的上下文以及 surfman 上下文工厂拆分到子模块。

mod context;
mod glow_context;
mod surfman_context;

pub use context::{ContextFactory, FrameRenderer, GraphicsContext};
pub use glow_context::GlowContext;
pub use surfman_context::{SurfmanContext, SurfmanContextFactory};
