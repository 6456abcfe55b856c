//! ### English
//! Headless surfman GL context owned by the render thread.
//! Creates a device/context/surface matching the `SurfaceConfig`, makes it current and loads
//! glow so snapshots can read the surface framebuffer.
//!
//! ### 中文
//! 由渲染线程持有的无窗口 surfman GL 上下文。
//! 按 `SurfaceConfig` 创建 device/context/surface，使其成为 current，并加载 glow，
//! 以便快照读取表面的帧缓冲。

use dpi::PhysicalSize;
use euclid::default::Size2D;
use surfman::{
    Connection, Context, ContextAttributeFlags, ContextAttributes, Device, GLVersion,
    SurfaceAccess, SurfaceType,
};
use tracing::{debug, info};

use crate::engine::config::SurfaceConfig;
use crate::engine::error::{ReadbackError, SurfaceError};
use crate::engine::snapshot::Region;

use super::context::{ContextFactory, GraphicsContext};
use super::glow_context::GlowContext;

fn surfman_error(what: &str, err: surfman::Error) -> SurfaceError {
    SurfaceError::ContextCreation(format!("{what}: {err:?}"))
}

/// ### English
/// Bits per color channel of surfman surfaces.
///
/// ### 中文
/// surfman 表面每个颜色通道的位数。
const SURFMAN_CHANNEL_BITS: u8 = 8;

/// ### English
/// Rejects color depths surfman surfaces cannot provide: RGB must be 8 bits per channel and
/// alpha either absent or 8 bits.
///
/// ### 中文
/// 拒绝 surfman 表面无法提供的颜色位深：RGB 每通道必须为 8 位，alpha 要么没有要么为 8 位。
fn check_color_bits(config: &SurfaceConfig) -> Result<(), SurfaceError> {
    let rgb = [config.red_bits, config.green_bits, config.blue_bits];
    let alpha_ok = config.alpha_bits == 0 || config.alpha_bits == SURFMAN_CHANNEL_BITS;
    if rgb.iter().all(|&bits| bits == SURFMAN_CHANNEL_BITS) && alpha_ok {
        return Ok(());
    }
    Err(SurfaceError::ContextCreation(format!(
        "unsupported color bits R{}G{}B{}A{}; surfman surfaces are RGB888 with optional 8-bit alpha",
        config.red_bits, config.green_bits, config.blue_bits, config.alpha_bits
    )))
}

/// ### English
/// Maps the EGL-style bit depths of a `SurfaceConfig` onto surfman context attributes.
///
/// ### 中文
/// 把 `SurfaceConfig` 中 EGL 风格的位深映射为 surfman 上下文属性。
fn context_attributes(config: &SurfaceConfig) -> ContextAttributes {
    let mut flags = ContextAttributeFlags::empty();
    if config.alpha_bits > 0 {
        flags |= ContextAttributeFlags::ALPHA;
    }
    if config.depth_bits > 0 {
        flags |= ContextAttributeFlags::DEPTH;
    }
    if config.stencil_bits > 0 {
        flags |= ContextAttributeFlags::STENCIL;
    }
    ContextAttributes {
        version: GLVersion::new(config.client_version.max(2), 0),
        flags,
    }
}

/// ### English
/// Factory creating [`SurfmanContext`]s on the render thread.
///
/// ### 中文
/// 在渲染线程上创建 [`SurfmanContext`] 的工厂。
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfmanContextFactory {
    /// ### English
    /// Prefer the low-power adapter (integrated GPU) when several are present.
    ///
    /// ### 中文
    /// 存在多个适配器时优先使用低功耗适配器（集成显卡）。
    pub prefer_low_power: bool,
}

impl ContextFactory for SurfmanContextFactory {
    type Context = SurfmanContext;

    fn create(
        &mut self,
        config: &SurfaceConfig,
        size: PhysicalSize<u32>,
    ) -> Result<SurfmanContext, SurfaceError> {
        SurfmanContext::new(config, size, self.prefer_low_power)
    }
}

/// ### English
/// Owns the surfman device/context pair and the glow bindings loaded for it.
///
/// ### 中文
/// 持有 surfman device/context 以及为其加载的 glow 绑定。
pub struct SurfmanContext {
    /// ### English
    /// surfman device the context was created on.
    ///
    /// ### 中文
    /// 创建该上下文的 surfman device。
    device: Device,
    /// ### English
    /// GL context (current on the render thread); destroyed explicitly on drop.
    ///
    /// ### 中文
    /// GL 上下文（在渲染线程上 current）；drop 时显式销毁。
    context: Context,
    glow: GlowContext,
}

impl SurfmanContext {
    /// ### English
    /// Creates a headless context with a generic surface of `size` and makes it current.
    /// Must be called from the render thread.
    ///
    /// ### 中文
    /// 创建带有尺寸为 `size` 的通用表面的无窗口上下文，并使其成为 current。
    /// 必须在渲染线程调用。
    pub fn new(
        config: &SurfaceConfig,
        size: PhysicalSize<u32>,
        prefer_low_power: bool,
    ) -> Result<Self, SurfaceError> {
        check_color_bits(config)?;
        let connection = Connection::new()
            .map_err(|err| surfman_error("Failed to create surfman Connection", err))?;
        let adapter = if prefer_low_power {
            connection.create_low_power_adapter()
        } else {
            connection.create_adapter()
        }
        .map_err(|err| surfman_error("Failed to create surfman adapter", err))?;
        let mut device = connection
            .create_device(&adapter)
            .map_err(|err| surfman_error("Failed to create surfman device", err))?;

        let descriptor = device
            .create_context_descriptor(&context_attributes(config))
            .map_err(|err| surfman_error("No matching context descriptor", err))?;
        let mut context = device
            .create_context(&descriptor, None)
            .map_err(|err| surfman_error("Failed to create context", err))?;

        /*
        ### English
        From here on the context must be destroyed explicitly on every error path.

        ### 中文
        从这里开始，每条错误路径都必须显式销毁上下文。
        */
        if let Err(err) = Self::attach_surface(&mut device, &mut context, size) {
            let _ = device.destroy_context(&mut context);
            return Err(err);
        }
        if let Err(err) = device.make_context_current(&context) {
            let _ = device.destroy_context(&mut context);
            return Err(surfman_error("Failed to make context current", err));
        }

        let mut glow = unsafe {
            GlowContext::from_loader_function(
                |name| device.get_proc_address(&context, name),
                size,
            )
        };

        let framebuffer = match device.context_surface_info(&context) {
            Ok(info) => info.and_then(|info| info.framebuffer_object),
            Err(err) => {
                let _ = device.destroy_context(&mut context);
                return Err(surfman_error("Failed to query surface info", err));
            }
        };
        glow.set_framebuffer(framebuffer);

        info!(
            width = size.width,
            height = size.height,
            version = config.client_version,
            "surfman context created"
        );

        Ok(Self {
            device,
            context,
            glow,
        })
    }

    fn attach_surface(
        device: &mut Device,
        context: &mut Context,
        size: PhysicalSize<u32>,
    ) -> Result<(), SurfaceError> {
        let size = Size2D::new(size.width.max(1) as i32, size.height.max(1) as i32);
        let surface = device
            .create_surface(context, SurfaceAccess::GPUOnly, SurfaceType::Generic { size })
            .map_err(|err| surfman_error("Failed to create surface", err))?;
        if let Err((err, mut surface)) = device.bind_surface_to_context(context, surface) {
            let _ = device.destroy_surface(context, &mut surface);
            return Err(surfman_error("Failed to bind surface", err));
        }
        Ok(())
    }
}

impl GraphicsContext for SurfmanContext {
    fn size(&self) -> PhysicalSize<u32> {
        self.glow.size()
    }

    fn read_pixels(&mut self, region: Region, dst: &mut [u8]) -> Result<(), ReadbackError> {
        self.glow.read_pixels(region, dst)
    }

    /// ### English
    /// Replaces the bound surface with one of the new size.
    ///
    /// ### 中文
    /// 用新尺寸的表面替换当前绑定的表面。
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), SurfaceError> {
        if size == self.glow.size() {
            return Ok(());
        }

        match self.device.unbind_surface_from_context(&mut self.context) {
            Ok(Some(mut old)) => {
                let _ = self.device.destroy_surface(&mut self.context, &mut old);
            }
            Ok(None) => {}
            Err(err) => return Err(surfman_error("Failed to unbind surface", err)),
        }
        Self::attach_surface(&mut self.device, &mut self.context, size)?;

        let framebuffer = self
            .device
            .context_surface_info(&self.context)
            .map_err(|err| surfman_error("Failed to query surface info", err))?
            .and_then(|info| info.framebuffer_object);
        self.glow.set_framebuffer(framebuffer);
        self.glow.set_size(size);

        debug!(width = size.width, height = size.height, "surfman surface resized");
        Ok(())
    }

    fn glow(&self) -> Option<&glow::Context> {
        Some(self.glow.gl())
    }
}

impl Drop for SurfmanContext {
    /// ### English
    /// Destroys the context (and its bound surface) on drop.
    ///
    /// ### 中文
    /// Drop 时销毁上下文（以及其绑定的表面）。
    fn drop(&mut self) {
        let _ = self.device.make_no_context_current();
        let _ = self.device.destroy_context(&mut self.context);
    }
}
