//! ### English
//! Framebuffer snapshots: readback of a rendered region into a top-down ARGB image.
//!
//! Must run on the render thread while its graphics context is current.
//!
//! ### 中文
//! 帧缓冲快照：把已渲染区域回读为自上而下的 ARGB 图像。
//!
//! 必须在渲染线程上、其图形上下文为 current 时执行。

use dpi::PhysicalSize;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::engine::error::SnapshotError;
use crate::engine::pixel;
use crate::engine::rendering::GraphicsContext;

/// ### English
/// Pixel rectangle in framebuffer coordinates (origin at the bottom-left, as GL reports it).
///
/// ### 中文
/// 帧缓冲坐标系中的像素矩形（原点在左下角，与 GL 一致）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// ### English
    /// Region covering a whole surface of `size`.
    ///
    /// ### 中文
    /// 覆盖尺寸为 `size` 的整个表面的区域。
    pub const fn full(size: PhysicalSize<u32>) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// ### English
    /// Number of pixels, or `None` when `width * height` overflows `usize`.
    ///
    /// ### 中文
    /// 像素数量；当 `width * height` 溢出 `usize` 时返回 `None`。
    pub fn pixel_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }
}

/// ### English
/// Converted snapshot: row 0 is the top of the image, pixels are `0xAARRGGBB` words.
///
/// ### 中文
/// 转换后的快照：第 0 行为图像顶部，像素为 `0xAARRGGBB` 字。
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Image {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// ### English
    /// Row-major ARGB words, top row first.
    ///
    /// ### 中文
    /// 行优先的 ARGB 像素字，顶部行在前。
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    /// ### English
    /// Returns the ARGB word at (`x`, `y`) with `y = 0` at the top, or `None` when out of range.
    ///
    /// ### 中文
    /// 返回 (`x`, `y`) 处的 ARGB 像素字（`y = 0` 为顶部）；越界时返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// ### English
    /// Converts into an `image::RgbaImage` (byte order R, G, B, A) for downstream consumers.
    ///
    /// ### 中文
    /// 转换为 `image::RgbaImage`（字节顺序 R、G、B、A），供下游消费方使用。
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let argb = self.pixels[y as usize * self.width as usize + x as usize];
            let [a, r, g, b] = argb.to_be_bytes();
            image::Rgba([r, g, b, a])
        })
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels", &self.pixels.len())
            .finish()
    }
}

/// ### English
/// Allocates a zeroed pixel buffer, reporting allocation failure instead of aborting.
///
/// ### 中文
/// 分配清零的像素缓冲区；分配失败时返回错误而不是中止进程。
fn alloc_words(words: usize) -> Result<Vec<u32>, SnapshotError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(words)
        .map_err(|_| SnapshotError::Allocation { words })?;
    buffer.resize(words, 0);
    Ok(buffer)
}

/// ### English
/// Reads `region` back from the current framebuffer and converts it into an [`Image`].
///
/// The region must lie inside the bound framebuffer; that is not validated here. On a readback
/// error no partial image is returned.
///
/// ### 中文
/// 从当前帧缓冲回读 `region`，并转换为 [`Image`]。
///
/// 区域必须位于已绑定的帧缓冲之内（此处不做校验）。回读出错时不会返回部分图像。
pub fn snapshot(
    context: &mut dyn GraphicsContext,
    region: Region,
) -> Result<Image, SnapshotError> {
    if region.width == 0 || region.height == 0 {
        return Err(SnapshotError::EmptyRegion);
    }
    let words = region.pixel_count().ok_or(SnapshotError::Allocation {
        words: usize::MAX,
    })?;

    let mut scratch = alloc_words(words)?;
    let mut output = alloc_words(words)?;

    if let Err(err) = context.read_pixels(region, bytemuck::cast_slice_mut(&mut scratch)) {
        warn!(?region, %err, "framebuffer readback failed");
        return Err(err.into());
    }

    pixel::convert_bottom_up(
        &scratch,
        &mut output,
        region.width as usize,
        region.height as usize,
    );
    debug!(width = region.width, height = region.height, "framebuffer snapshot converted");

    Ok(Image {
        width: region.width,
        height: region.height,
        pixels: output,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engine::config::SurfaceConfig;
    use crate::engine::error::{ReadbackError, SurfaceError};
    use crate::engine::pixel::swap_lanes;
    use crate::engine::rendering::ContextFactory;

    /// ### English
    /// In-memory framebuffer standing in for a GL context (bottom row first, RGBA bytes).
    ///
    /// ### 中文
    /// 代替 GL 上下文的内存帧缓冲（底部行在前，RGBA 字节）。
    pub(crate) struct MemoryContext {
        pub(crate) size: PhysicalSize<u32>,
        pub(crate) words: Vec<u32>,
        pub(crate) fail_with: Option<u32>,
        pub(crate) reads: usize,
    }

    impl MemoryContext {
        pub(crate) fn new(width: u32, height: u32, words: Vec<u32>) -> Self {
            Self {
                size: PhysicalSize::new(width, height),
                words,
                fail_with: None,
                reads: 0,
            }
        }
    }

    impl GraphicsContext for MemoryContext {
        fn size(&self) -> PhysicalSize<u32> {
            self.size
        }

        fn read_pixels(&mut self, region: Region, dst: &mut [u8]) -> Result<(), ReadbackError> {
            self.reads += 1;
            if let Some(code) = self.fail_with {
                return Err(ReadbackError::Gl { code });
            }
            let stride = self.size.width as usize;
            let mut out = dst.chunks_exact_mut(4);
            for row in 0..region.height as usize {
                for col in 0..region.width as usize {
                    let src_row = region.y as usize + row;
                    let src_col = region.x as usize + col;
                    let word = self.words[src_row * stride + src_col];
                    if let Some(chunk) = out.next() {
                        chunk.copy_from_slice(&word.to_le_bytes());
                    }
                }
            }
            Ok(())
        }
    }

    /// ### English
    /// Factory for [`MemoryContext`]s filled with `0..width * height`.
    ///
    /// ### 中文
    /// 生成以 `0..width * height` 填充的 [`MemoryContext`] 的工厂。
    #[derive(Clone, Default)]
    pub(crate) struct MemoryFactory {
        pub(crate) created: Arc<AtomicUsize>,
        pub(crate) fail: bool,
    }

    impl ContextFactory for MemoryFactory {
        type Context = MemoryContext;

        fn create(
            &mut self,
            _config: &SurfaceConfig,
            size: PhysicalSize<u32>,
        ) -> Result<MemoryContext, SurfaceError> {
            if self.fail {
                return Err(SurfaceError::ContextCreation("no display".to_string()));
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            let words = (0..size.width * size.height).collect();
            Ok(MemoryContext::new(size.width, size.height, words))
        }
    }

    #[test]
    fn two_by_two_snapshot_puts_bottom_row_last() {
        let p0 = 0xFF11_2233;
        let p1 = 0x7F01_0203;
        let p2 = 0x00AA_BBCC;
        let p3 = 0x8000_00FF;
        let mut context = MemoryContext::new(2, 2, vec![p0, p1, p2, p3]);

        let image = snapshot(&mut context, Region::new(0, 0, 2, 2)).unwrap();

        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(&image.pixels()[2..], &[0xFF33_2211, swap_lanes(p1)]);
        assert_eq!(&image.pixels()[..2], &[swap_lanes(p2), swap_lanes(p3)]);
        assert_eq!(image.pixel(0, 1), Some(0xFF33_2211));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn sub_region_is_read_from_offset() {
        let words: Vec<u32> = (0..16).map(|i| 0xFF00_0000 | i).collect();
        let mut context = MemoryContext::new(4, 4, words);

        let image = snapshot(&mut context, Region::new(1, 2, 2, 1)).unwrap();

        assert_eq!(image.pixels(), &[swap_lanes(0xFF00_0009), swap_lanes(0xFF00_000A)]);
    }

    #[test]
    fn readback_error_returns_no_image() {
        let mut context = MemoryContext::new(2, 2, vec![0; 4]);
        context.fail_with = Some(0x0502);

        let result = snapshot(&mut context, Region::new(0, 0, 2, 2));

        assert_eq!(
            result,
            Err(SnapshotError::Readback(ReadbackError::Gl { code: 0x0502 }))
        );
    }

    #[test]
    fn empty_region_is_rejected_without_readback() {
        let mut context = MemoryContext::new(2, 2, vec![0; 4]);
        assert_eq!(
            snapshot(&mut context, Region::new(0, 0, 0, 2)),
            Err(SnapshotError::EmptyRegion)
        );
        assert_eq!(context.reads, 0);
    }

    #[test]
    fn oversized_region_reports_allocation_failure() {
        let mut context = MemoryContext::new(1, 1, vec![0]);
        let result = snapshot(&mut context, Region::new(0, 0, u32::MAX, u32::MAX));
        assert!(matches!(result, Err(SnapshotError::Allocation { .. })));
        assert_eq!(context.reads, 0);
    }

    #[test]
    fn rgba_image_restores_byte_order() {
        let mut context = MemoryContext::new(1, 1, vec![u32::from_le_bytes([10, 20, 30, 40])]);
        let region = Region::full(context.size);
        let image = snapshot(&mut context, region).unwrap();

        assert_eq!(image.pixels(), &[0x280A_141E]);
        let rgba = image.to_rgba_image();
        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 40]);
    }
}
