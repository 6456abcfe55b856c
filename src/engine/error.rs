//! ### English
//! Error types shared by the snapshot path, the render surface and the session lifecycle.
//!
//! None of these are fatal to the process: each one is either returned to the caller as an
//! explicit value or surfaced as a user-visible, continuable condition.
//!
//! ### 中文
//! 快照路径、渲染表面与会话生命周期共用的错误类型。
//!
//! 这些错误都不会导致进程终止：要么作为显式返回值交给调用方，要么作为用户可见、可继续的状态呈现。

use thiserror::Error;

/// ### English
/// The graphics driver reported an error after a pixel readback.
///
/// ### 中文
/// 像素回读之后图形驱动报告了错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadbackError {
    /// ### English
    /// `glGetError` returned a non-zero code after `glReadPixels`.
    ///
    /// ### 中文
    /// `glReadPixels` 之后 `glGetError` 返回了非零错误码。
    #[error("GL error 0x{code:04X} during pixel readback")]
    Gl { code: u32 },
    /// ### English
    /// The destination buffer does not match the requested region.
    ///
    /// ### 中文
    /// 目标缓冲区大小与请求区域不匹配。
    #[error("readback buffer holds {actual} bytes, region needs {expected}")]
    BufferSize { expected: usize, actual: usize },
    /// ### English
    /// The region does not fit the signed sizes `glReadPixels` takes.
    ///
    /// ### 中文
    /// 区域超出 `glReadPixels` 可接受的有符号尺寸。
    #[error("region {width}x{height} exceeds the GL size range")]
    RegionTooLarge { width: u32, height: u32 },
}

/// ### English
/// Failure of one snapshot request.
///
/// `Readback` means "no image available" and is a normal outcome; `Allocation` means the
/// process could not provide the scratch/output buffers.
///
/// ### 中文
/// 单次快照请求的失败。
///
/// `Readback` 表示“没有可用图像”，属于正常结果；`Allocation` 表示进程无法提供暂存/输出缓冲区。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot region is empty")]
    EmptyRegion,
    #[error("pixel readback failed: {0}")]
    Readback(#[from] ReadbackError),
    #[error("failed to allocate {words} pixel words for the snapshot")]
    Allocation { words: usize },
    /// ### English
    /// The render surface shut down before the request ran.
    ///
    /// ### 中文
    /// 请求执行前渲染表面已关闭。
    #[error("render surface shut down before the snapshot ran")]
    Dropped,
}

/// ### English
/// Errors raised by the render surface and its dedicated thread.
///
/// ### 中文
/// 渲染表面及其独立线程产生的错误。
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to create graphics context: {0}")]
    ContextCreation(String),
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("timed out waiting for the render thread to initialize")]
    InitTimedOut,
    #[error("render surface is shut down")]
    ShutDown,
}

/// ### English
/// Errors reported by the external tracking session.
///
/// ### 中文
/// 外部追踪会话报告的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// ### English
    /// The camera device is held by another client; retry on the next resume.
    ///
    /// ### 中文
    /// 相机设备被其它客户端占用；在下一次 resume 时重试。
    #[error("camera not available")]
    CameraUnavailable,
    #[error("failed to create tracking session: {0}")]
    Creation(String),
}
