//! ### English
//! `GraphicsContext` over glow bindings for a context that is already current.
//!
//! ### 中文
//! 基于 glow 绑定、面向已处于 current 状态的上下文的 `GraphicsContext` 实现。

use std::ffi::c_void;

use dpi::PhysicalSize;
use glow::HasContext as _;

use crate::engine::error::{ReadbackError, SurfaceError};
use crate::engine::snapshot::Region;

use super::context::GraphicsContext;

/// ### English
/// Upper bound on stale errors drained before a readback (a lost context can report forever).
///
/// ### 中文
/// 回读前最多清理的残留错误数量（丢失的上下文可能持续报告错误）。
const MAX_STALE_ERRORS: usize = 16;

/// ### English
/// glow-backed graphics context reading from an optional framebuffer object.
///
/// ### 中文
/// 基于 glow 的图形上下文，可从指定的帧缓冲对象读取。
pub struct GlowContext {
    /// ### English
    /// glow GL API loaded from the current context.
    ///
    /// ### 中文
    /// 从当前上下文加载的 glow GL API。
    gl: glow::Context,
    /// ### English
    /// Framebuffer the surface renders into (`None` = default framebuffer).
    ///
    /// ### 中文
    /// 表面渲染目标帧缓冲（`None` 表示默认帧缓冲）。
    framebuffer: Option<glow::NativeFramebuffer>,
    size: PhysicalSize<u32>,
}

impl GlowContext {
    /// ### English
    /// Loads glow through `loader` for the context current on the calling thread.
    ///
    /// # Safety
    /// A GL context must be current on the calling thread, and `loader` must return valid
    /// function pointers for it.
    ///
    /// ### 中文
    /// 通过 `loader` 为调用线程上的 current 上下文加载 glow。
    ///
    /// # Safety
    /// 调用线程上必须有一个 current 的 GL 上下文，且 `loader` 必须为其返回有效函数指针。
    pub unsafe fn from_loader_function<F>(loader: F, size: PhysicalSize<u32>) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let gl = unsafe { glow::Context::from_loader_function(loader) };
        Self {
            gl,
            framebuffer: None,
            size,
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// ### English
    /// Sets the framebuffer that readback binds before reading.
    ///
    /// ### 中文
    /// 设置回读前需要绑定的帧缓冲。
    pub fn set_framebuffer(&mut self, framebuffer: Option<glow::NativeFramebuffer>) {
        self.framebuffer = framebuffer;
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer);
        }
    }

    pub(super) fn set_size(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }
}

/// ### English
/// Converts the region size to the `GLsizei` pair `glReadPixels` takes.
///
/// ### 中文
/// 把区域尺寸转换为 `glReadPixels` 接受的 `GLsizei` 二元组。
fn gl_extent(region: Region) -> Result<(i32, i32), ReadbackError> {
    match (i32::try_from(region.width), i32::try_from(region.height)) {
        (Ok(width), Ok(height)) => Ok((width, height)),
        _ => Err(ReadbackError::RegionTooLarge {
            width: region.width,
            height: region.height,
        }),
    }
}

impl GraphicsContext for GlowContext {
    fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn read_pixels(&mut self, region: Region, dst: &mut [u8]) -> Result<(), ReadbackError> {
        let (width, height) = gl_extent(region)?;
        let expected = region.pixel_count().and_then(|count| count.checked_mul(4));
        if expected != Some(dst.len()) {
            return Err(ReadbackError::BufferSize {
                expected: expected.unwrap_or(usize::MAX),
                actual: dst.len(),
            });
        }

        unsafe {
            for _ in 0..MAX_STALE_ERRORS {
                if self.gl.get_error() == glow::NO_ERROR {
                    break;
                }
            }

            self.gl.bind_framebuffer(glow::FRAMEBUFFER, self.framebuffer);
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 4);
            self.gl.read_pixels(
                region.x,
                region.y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(dst)),
            );

            let code = self.gl.get_error();
            if code != glow::NO_ERROR {
                return Err(ReadbackError::Gl { code });
            }
        }
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), SurfaceError> {
        self.size = size;
        Ok(())
    }

    fn glow(&self) -> Option<&glow::Context> {
        Some(&self.gl)
    }
}
