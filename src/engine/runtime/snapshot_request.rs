//! ### English
//! Snapshot requests queued to the render thread and the handles that receive their result.
//!
//! ### 中文
//! 投递到渲染线程的截图请求，以及接收结果的句柄。

use std::time::Duration;

use crossbeam_channel::{self as channel, RecvTimeoutError, TryRecvError};

use crate::engine::dispatch::MainThreadDispatcher;
use crate::engine::error::SnapshotError;
use crate::engine::rendering::GraphicsContext;
use crate::engine::snapshot::{self, Image, Region};

pub(crate) type SnapshotResult = Result<Image, SnapshotError>;

pub(crate) type SnapshotCallback = Box<dyn FnOnce(SnapshotResult) + Send + 'static>;

/// ### English
/// Which part of the framebuffer to read.
///
/// ### 中文
/// 要回读的帧缓冲区域。
pub(crate) enum SnapshotTarget {
    Fixed(Region),
    /// ### English
    /// Whatever the surface size is when the request runs.
    ///
    /// ### 中文
    /// 请求执行时的整个表面尺寸。
    FullSurface,
}

/// ### English
/// Where the result goes.
///
/// ### 中文
/// 结果的去向。
pub(crate) enum SnapshotReply {
    Ticket(channel::Sender<SnapshotResult>),
    /// ### English
    /// Callback posted back to the requesting thread through its dispatcher.
    ///
    /// ### 中文
    /// 通过调度器投递回请求线程的回调。
    Callback {
        dispatcher: MainThreadDispatcher,
        callback: SnapshotCallback,
    },
}

pub(crate) struct SnapshotRequest {
    pub(crate) target: SnapshotTarget,
    pub(crate) reply: SnapshotReply,
}

impl SnapshotRequest {
    /// ### English
    /// Reads the framebuffer and delivers the result. Runs on the render thread.
    ///
    /// ### 中文
    /// 回读帧缓冲并投递结果。在渲染线程上执行。
    pub(crate) fn execute(self, context: &mut dyn GraphicsContext) {
        let region = match self.target {
            SnapshotTarget::Fixed(region) => region,
            SnapshotTarget::FullSurface => Region::full(context.size()),
        };
        let result = snapshot::snapshot(context, region);

        match self.reply {
            SnapshotReply::Ticket(sender) => {
                let _ = sender.send(result);
            }
            SnapshotReply::Callback {
                dispatcher,
                callback,
            } => {
                if !dispatcher.post(move || callback(result)) {
                    tracing::debug!("snapshot callback dropped: requesting thread is gone");
                }
            }
        }
    }
}

/// ### English
/// Pending snapshot result.
///
/// Dropping the ticket discards the result; the readback still runs.
///
/// ### 中文
/// 尚未完成的截图结果。
///
/// 丢弃票据会丢弃结果，但回读仍会执行。
#[derive(Debug)]
pub struct SnapshotTicket {
    receiver: channel::Receiver<SnapshotResult>,
}

impl SnapshotTicket {
    pub(crate) fn new(receiver: channel::Receiver<SnapshotResult>) -> Self {
        Self { receiver }
    }

    /// ### English
    /// Non-blocking poll. `None` while the request is still queued.
    ///
    /// A request that can no longer complete (render thread gone) yields `Err(SnapshotError::Dropped)`.
    ///
    /// ### 中文
    /// 非阻塞轮询。请求仍在排队时返回 `None`。
    ///
    /// 无法再完成的请求（渲染线程已退出）返回 `Err(SnapshotError::Dropped)`。
    pub fn try_take(&self) -> Option<SnapshotResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SnapshotError::Dropped)),
        }
    }

    pub fn wait(self) -> SnapshotResult {
        self.receiver.recv().unwrap_or(Err(SnapshotError::Dropped))
    }

    /// ### English
    /// Blocks up to `timeout`. Gives the ticket back on timeout so the caller can keep waiting.
    ///
    /// ### 中文
    /// 最多阻塞 `timeout`。超时时归还票据，调用方可继续等待。
    pub fn wait_timeout(self, timeout: Duration) -> Result<SnapshotResult, Self> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(SnapshotError::Dropped)),
        }
    }
}
