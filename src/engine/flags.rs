//! ### English
//! Bitflags controlling optional render surface behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制渲染表面可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Drop the graphics context when the surface pauses and recreate it on resume.
///
/// By default the context survives pause so GL objects owned by the renderer stay valid.
///
/// ### 中文
/// 表面暂停时丢弃图形上下文，并在 resume 时重新创建。
///
/// 默认情况下上下文会跨越暂停保留，使渲染器持有的 GL 对象保持有效。
pub const AR_PREVIEW_SURFACE_FLAG_DISCARD_CONTEXT_ON_PAUSE: u32 = 1 << 0;

/// ### English
/// Draw only when `request_render` is called instead of continuously.
///
/// ### 中文
/// 仅在调用 `request_render` 时绘制，而不是持续绘制。
pub const AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY: u32 = 1 << 1;
