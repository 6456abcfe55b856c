//! ### English
//! Render surface configuration (context attributes, cadence, pause behavior).
//!
//! ### 中文
//! 渲染表面配置（上下文属性、绘制节奏、暂停行为）。

use std::time::Duration;

use dpi::PhysicalSize;

use crate::engine::flags;

/// ### English
/// How the render thread decides when to draw.
///
/// ### 中文
/// 渲染线程决定何时绘制的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// ### English
    /// Draw back-to-back at the configured frame rate while resumed.
    ///
    /// ### 中文
    /// resume 期间按配置帧率连续绘制。
    #[default]
    Continuously,
    /// ### English
    /// Draw one frame per `request_render` call.
    ///
    /// ### 中文
    /// 每次调用 `request_render` 绘制一帧。
    WhenDirty,
}

/// ### English
/// Configuration for one render surface.
///
/// The defaults mirror the AR preview surface: RGBA8888 color (alpha is used for plane
/// blending), a 16-bit depth buffer, no stencil, GLES 2, context preserved across pause and
/// continuous rendering.
///
/// ### 中文
/// 单个渲染表面的配置。
///
/// 默认值与 AR 预览表面一致：RGBA8888 颜色（alpha 用于平面混合）、16 位深度缓冲、无模板缓冲、
/// GLES 2、暂停时保留上下文、持续渲染。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    /// ### English
    /// Requested GL(ES) major version.
    ///
    /// ### 中文
    /// 请求的 GL(ES) 主版本号。
    pub client_version: u8,
    /// ### English
    /// Keep the graphics context alive while paused.
    ///
    /// ### 中文
    /// 暂停期间保留图形上下文。
    pub preserve_context_on_pause: bool,
    pub render_mode: RenderMode,
    /// ### English
    /// Target frame rate for `RenderMode::Continuously` (`0` is treated as `1`).
    ///
    /// ### 中文
    /// `RenderMode::Continuously` 的目标帧率（`0` 按 `1` 处理）。
    pub target_fps: u32,
    pub initial_size: PhysicalSize<u32>,
    /// ### English
    /// Upper bound on how long spawning waits for the render thread to create its context.
    ///
    /// ### 中文
    /// 创建表面时等待渲染线程完成上下文创建的最长时间。
    pub init_timeout: Duration,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 16,
            stencil_bits: 0,
            client_version: 2,
            preserve_context_on_pause: true,
            render_mode: RenderMode::Continuously,
            target_fps: 60,
            initial_size: PhysicalSize::new(1, 1),
            init_timeout: Duration::from_secs(30),
        }
    }
}

impl SurfaceConfig {
    /// ### English
    /// Sets the initial surface size (each side clamped to at least 1).
    ///
    /// ### 中文
    /// 设置初始表面尺寸（每一边至少为 1）。
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.initial_size = PhysicalSize::new(width.max(1), height.max(1));
        self
    }

    pub fn with_target_fps(mut self, target_fps: u32) -> Self {
        self.target_fps = target_fps;
        self
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    pub fn with_preserve_context_on_pause(mut self, preserve: bool) -> Self {
        self.preserve_context_on_pause = preserve;
        self
    }

    /// ### English
    /// Folds C ABI surface flags (`AR_PREVIEW_SURFACE_FLAG_*`) into this config.
    ///
    /// ### 中文
    /// 将 C ABI 表面标志（`AR_PREVIEW_SURFACE_FLAG_*`）合并到该配置中。
    pub fn with_flags(mut self, surface_flags: u32) -> Self {
        if surface_flags & flags::AR_PREVIEW_SURFACE_FLAG_DISCARD_CONTEXT_ON_PAUSE != 0 {
            self.preserve_context_on_pause = false;
        }
        if surface_flags & flags::AR_PREVIEW_SURFACE_FLAG_RENDER_WHEN_DIRTY != 0 {
            self.render_mode = RenderMode::WhenDirty;
        }
        self
    }

    /// ### English
    /// Interval between continuous frames.
    ///
    /// ### 中文
    /// 连续绘制时两帧之间的间隔。
    pub fn frame_interval(&self) -> Duration {
        let fps = self.target_fps.max(1) as u64;
        Duration::from_nanos((1_000_000_000u64 / fps).max(1))
    }
}
