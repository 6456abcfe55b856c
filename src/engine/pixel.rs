//! ### English
//! Pixel word conversion helpers for framebuffer readback.
//!
//! A GL `RGBA`/`UNSIGNED_BYTE` readback stores bytes `R, G, B, A` in memory. Read as a
//! little-endian `u32`, red lands in bits `[0, 8)` and blue in bits `[16, 24)`. Swapping those two
//! lanes yields `0xAARRGGBB`, the ARGB word layout consumers expect.
//!
//! ### 中文
//! 帧缓冲回读使用的像素字转换工具。
//!
//! GL 的 `RGBA`/`UNSIGNED_BYTE` 回读在内存中按 `R, G, B, A` 排列字节。按小端 `u32` 读取时，
//! 红色位于 `[0, 8)` 位、蓝色位于 `[16, 24)` 位。交换这两个通道即得到消费方期望的
//! `0xAARRGGBB`（ARGB）布局。

const KEEP_LANES: u32 = 0xFF00_FF00;
const LANE2: u32 = 0x00FF_0000;
const LANE0: u32 = 0x0000_00FF;

/// ### English
/// Swaps lane 0 (bits `[0, 8)`) and lane 2 (bits `[16, 24)`) of a packed pixel word.
///
/// Lane 1 and lane 3 (alpha) are left untouched, so applying this twice restores the input.
///
/// ### 中文
/// 交换打包像素字的通道 0（`[0, 8)` 位）与通道 2（`[16, 24)` 位）。
///
/// 通道 1 与通道 3（alpha）保持不变，因此连续应用两次会还原输入。
#[inline]
pub const fn swap_lanes(word: u32) -> u32 {
    (word & KEEP_LANES) | ((word & LANE2) >> 16) | ((word & LANE0) << 16)
}

/// ### English
/// Copies `src` into `dst` with rows in reverse order and every word lane-swapped.
///
/// Both slices must hold exactly `width * height` words.
///
/// ### 中文
/// 以反向行序把 `src` 复制到 `dst`，并对每个像素字做通道交换。
///
/// 两个切片都必须恰好包含 `width * height` 个像素字。
pub fn convert_bottom_up(src: &[u32], dst: &mut [u32], width: usize, height: usize) {
    debug_assert_eq!(src.len(), width * height);
    debug_assert_eq!(dst.len(), width * height);
    if width == 0 {
        return;
    }

    for (i, row) in src.chunks_exact(width).enumerate() {
        let dest_start = (height - 1 - i) * width;
        let dest_row = &mut dst[dest_start..dest_start + width];
        for (out, &word) in dest_row.iter_mut().zip(row) {
            *out = swap_lanes(u32::from_le(word));
        }
    }
}
