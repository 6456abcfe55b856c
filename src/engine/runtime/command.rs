//! ### English
//! Internal command protocol between the UI thread and the dedicated render thread.
//!
//! ### 中文
//! UI 线程与独立渲染线程之间的内部命令协议。

use std::sync::Arc;

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::rendering::GraphicsContext;
use crate::engine::session::TrackingSession;

/// ### English
/// Work executed on the render thread with the graphics context current.
///
/// ### 中文
/// 在渲染线程上、图形上下文为 current 时执行的工作。
pub(crate) type WorkItem = Box<dyn FnOnce(&mut dyn GraphicsContext) + Send + 'static>;

/// ### English
/// Commands sent to the render thread. The render thread handles them strictly in order.
///
/// ### 中文
/// 发送到渲染线程的命令。渲染线程严格按顺序处理。
pub(super) enum Command {
    /// ### English
    /// Runs one work item (deferred while paused).
    ///
    /// ### 中文
    /// 执行一个工作项（暂停期间延后）。
    Work(WorkItem),
    /// ### English
    /// Stops drawing; `ack` is signalled once the thread is quiesced.
    ///
    /// ### 中文
    /// 停止绘制；线程静止后通过 `ack` 通知。
    Pause {
        /// ### English
        /// One-shot acknowledgement back to the blocked caller.
        ///
        /// ### 中文
        /// 回传给阻塞调用方的一次性确认。
        ack: channel::Sender<()>,
    },
    Resume,
    Resize(PhysicalSize<u32>),
    /// ### English
    /// Draws one frame in `RenderMode::WhenDirty`.
    ///
    /// ### 中文
    /// 在 `RenderMode::WhenDirty` 下绘制一帧。
    RequestRender,
    AttachSession(Arc<dyn TrackingSession>),
    Shutdown,
}
