//! ### English
//! Seams between the render thread and the graphics stack / scene renderer.
//!
//! ### 中文
//! 渲染线程与图形栈 / 场景渲染器之间的接口。

use std::sync::Arc;

use dpi::PhysicalSize;

use crate::engine::config::SurfaceConfig;
use crate::engine::error::{ReadbackError, SurfaceError};
use crate::engine::session::TrackingSession;
use crate::engine::snapshot::Region;

/// ### English
/// A graphics context that is current on the render thread.
///
/// Implementations are created and used on the render thread only; they need not be `Send`.
///
/// ### 中文
/// 在渲染线程上处于 current 状态的图形上下文。
///
/// 实现仅在渲染线程上创建与使用，无需实现 `Send`。
pub trait GraphicsContext {
    /// ### English
    /// Current drawable size in physical pixels.
    ///
    /// ### 中文
    /// 当前可绘制区域尺寸（物理像素）。
    fn size(&self) -> PhysicalSize<u32>;

    /// ### English
    /// Reads `region` of the bound framebuffer as tightly packed RGBA8 rows, bottom row first.
    ///
    /// `dst` holds exactly `width * height * 4` bytes.
    ///
    /// ### 中文
    /// 以紧密排列的 RGBA8 行（底部行在前）读取已绑定帧缓冲中的 `region`。
    ///
    /// `dst` 恰好包含 `width * height * 4` 字节。
    fn read_pixels(&mut self, region: Region, dst: &mut [u8]) -> Result<(), ReadbackError>;

    /// ### English
    /// Resizes the drawable. The default only succeeds when the size is unchanged.
    ///
    /// ### 中文
    /// 调整可绘制区域尺寸。默认实现仅在尺寸未变化时成功。
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), SurfaceError> {
        if size == self.size() {
            Ok(())
        } else {
            Err(SurfaceError::ContextCreation(format!(
                "context cannot be resized to {}x{}",
                size.width, size.height
            )))
        }
    }

    /// ### English
    /// glow bindings for renderers that draw through glow.
    ///
    /// ### 中文
    /// 供通过 glow 绘制的渲染器使用的 glow 绑定。
    fn glow(&self) -> Option<&glow::Context> {
        None
    }
}

/// ### English
/// Creates graphics contexts on the render thread.
///
/// The factory is moved onto the render thread and may be asked again after the context was
/// discarded on pause.
///
/// ### 中文
/// 在渲染线程上创建图形上下文。
///
/// 工厂会被移动到渲染线程；若上下文在暂停时被丢弃，之后可能再次被调用。
pub trait ContextFactory: Send + 'static {
    type Context: GraphicsContext;

    fn create(
        &mut self,
        config: &SurfaceConfig,
        size: PhysicalSize<u32>,
    ) -> Result<Self::Context, SurfaceError>;
}

/// ### English
/// Scene renderer driven by the render thread (drawing itself is external).
///
/// ### 中文
/// 由渲染线程驱动的场景渲染器（绘制逻辑本身由外部提供）。
pub trait FrameRenderer: Send + 'static {
    /// ### English
    /// Called after a context was created (initially and after a discarded context returns).
    ///
    /// ### 中文
    /// 上下文创建后调用（首次创建以及被丢弃的上下文重新创建后）。
    fn surface_created(&mut self, _context: &mut dyn GraphicsContext) {}

    fn surface_changed(&mut self, _context: &mut dyn GraphicsContext, _size: PhysicalSize<u32>) {}

    fn draw_frame(&mut self, context: &mut dyn GraphicsContext);

    /// ### English
    /// Hands the tracking session to the renderer so frames can query pose/camera data.
    ///
    /// ### 中文
    /// 把追踪会话交给渲染器，使每帧可以查询位姿/相机数据。
    fn set_session(&mut self, _session: Arc<dyn TrackingSession>) {}
}
