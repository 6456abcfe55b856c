//! ### English
//! `RenderSurface`: the UI-thread handle over the dedicated render thread.
//!
//! ### 中文
//! `RenderSurface`：UI 线程持有的、指向独立渲染线程的句柄。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{self as channel, RecvTimeoutError};
use dpi::PhysicalSize;
use tracing::{debug, error, warn};

use crate::engine::config::SurfaceConfig;
use crate::engine::dispatch::MainThreadDispatcher;
use crate::engine::error::{SnapshotError, SurfaceError};
use crate::engine::rendering::{ContextFactory, FrameRenderer, GraphicsContext};
use crate::engine::session::{SurfaceControl, TrackingSession};
use crate::engine::snapshot::{Image, Region};

use super::command::Command;
use super::render_thread;
use super::snapshot_request::{SnapshotReply, SnapshotRequest, SnapshotTarget, SnapshotTicket};

const RENDER_THREAD_NAME: &str = "ar-preview-render";

/// ### English
/// Owns the render thread and its command channel.
///
/// Every method may be called from any thread except the render thread itself; `pause` blocks
/// until the render thread acknowledges and would deadlock there.
///
/// ### 中文
/// 持有渲染线程及其命令通道。
///
/// 除渲染线程自身外，所有方法可从任意线程调用；`pause` 会阻塞等待渲染线程确认，
/// 在渲染线程上调用会死锁。
pub struct RenderSurface {
    command_tx: channel::Sender<Command>,
    /// ### English
    /// `None` once shut down.
    ///
    /// ### 中文
    /// 关闭后为 `None`。
    thread: Option<thread::JoinHandle<()>>,
    frames: Arc<AtomicU64>,
}

impl RenderSurface {
    /// ### English
    /// Spawns the render thread and blocks until it has created its graphics context.
    ///
    /// The surface starts paused; call [`RenderSurface::resume`] to start drawing.
    ///
    /// #### Parameters
    /// - `config`: Surface attributes, pause policy and frame pacing.
    /// - `factory`: Creates the graphics context on the render thread.
    /// - `renderer`: Scene renderer driven once per frame.
    ///
    /// ### 中文
    /// 创建渲染线程，并阻塞等待其完成图形上下文的创建。
    ///
    /// 表面初始为暂停状态；调用 [`RenderSurface::resume`] 开始绘制。
    ///
    /// #### 参数
    /// - `config`：表面属性、暂停策略与帧节奏。
    /// - `factory`：在渲染线程上创建图形上下文。
    /// - `renderer`：每帧驱动一次的场景渲染器。
    pub fn spawn<F, R>(config: SurfaceConfig, factory: F, renderer: R) -> Result<Self, SurfaceError>
    where
        F: ContextFactory,
        R: FrameRenderer,
    {
        let init_timeout = config.init_timeout;
        let frames = Arc::new(AtomicU64::new(0));
        let frames_for_thread = frames.clone();

        let (command_tx, command_rx) = channel::unbounded();
        let (init_tx, init_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || {
                render_thread::run_render_thread(
                    config,
                    factory,
                    renderer,
                    frames_for_thread,
                    command_rx,
                    init_tx,
                );
            })?;

        match init_rx.recv_timeout(init_timeout) {
            Ok(Ok(())) => Ok(Self {
                command_tx,
                thread: Some(thread),
                frames,
            }),
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(RecvTimeoutError::Timeout) => {
                /*
                ### English
                The thread may be stuck inside the driver; ask it to stop and leave it detached.

                ### 中文
                线程可能卡在驱动内部；请求其退出并保持分离状态。
                */
                let _ = command_tx.send(Command::Shutdown);
                error!(?init_timeout, "render thread initialization timed out");
                Err(SurfaceError::InitTimedOut)
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                Err(SurfaceError::ContextCreation(
                    "render thread exited during initialization".to_string(),
                ))
            }
        }
    }

    fn send(&self, command: Command) -> Result<(), SurfaceError> {
        if self.thread.is_none() {
            return Err(SurfaceError::ShutDown);
        }
        self.command_tx
            .send(command)
            .map_err(|_| SurfaceError::ShutDown)
    }

    /// ### English
    /// Queues `work` to run on the render thread with the context current.
    ///
    /// Work queued while paused runs, in order, right after the next resume.
    ///
    /// ### 中文
    /// 将 `work` 排入渲染线程，在上下文为 current 时执行。
    ///
    /// 暂停期间排入的工作会在下一次 resume 后立即按顺序执行。
    pub fn enqueue<W>(&self, work: W) -> Result<(), SurfaceError>
    where
        W: FnOnce(&mut dyn GraphicsContext) + Send + 'static,
    {
        self.send(Command::Work(Box::new(work)))
    }

    fn enqueue_snapshot(&self, request: SnapshotRequest) -> Result<(), SurfaceError> {
        self.enqueue(move |context| request.execute(context))
    }

    /// ### English
    /// Requests a snapshot of `region`; the result arrives on the returned ticket.
    ///
    /// If the surface is shut down the ticket yields `SnapshotError::Dropped`.
    ///
    /// ### 中文
    /// 请求对 `region` 截图；结果通过返回的票据送达。
    ///
    /// 若表面已关闭，票据返回 `SnapshotError::Dropped`。
    pub fn request_snapshot(&self, region: Region) -> SnapshotTicket {
        self.ticket_for(SnapshotTarget::Fixed(region))
    }

    /// ### English
    /// Snapshot of the whole surface at the size it has when the request runs.
    ///
    /// ### 中文
    /// 对请求执行时的整个表面截图。
    pub fn capture_surface(&self) -> SnapshotTicket {
        self.ticket_for(SnapshotTarget::FullSurface)
    }

    fn ticket_for(&self, target: SnapshotTarget) -> SnapshotTicket {
        let (tx, rx) = channel::bounded(1);
        let request = SnapshotRequest {
            target,
            reply: SnapshotReply::Ticket(tx),
        };
        if let Err(err) = self.enqueue_snapshot(request) {
            debug!(%err, "snapshot request not queued");
        }
        SnapshotTicket::new(rx)
    }

    /// ### English
    /// Requests a snapshot and delivers it to `callback` on the thread that drains `dispatcher`.
    ///
    /// On a shut down surface `callback` is still posted, with `SnapshotError::Dropped`.
    ///
    /// ### 中文
    /// 请求截图，并在 drain `dispatcher` 的线程上把结果交给 `callback`。
    ///
    /// 若表面已关闭，仍会以 `SnapshotError::Dropped` 投递 `callback`。
    pub fn request_snapshot_with<C>(
        &self,
        region: Region,
        dispatcher: &MainThreadDispatcher,
        callback: C,
    ) where
        C: FnOnce(Result<Image, SnapshotError>) + Send + 'static,
    {
        if self.thread.is_none() {
            dispatcher.post(move || callback(Err(SnapshotError::Dropped)));
            return;
        }
        let request = SnapshotRequest {
            target: SnapshotTarget::Fixed(region),
            reply: SnapshotReply::Callback {
                dispatcher: dispatcher.clone(),
                callback: Box::new(callback),
            },
        };
        if let Err(err) = self.enqueue_snapshot(request) {
            debug!(%err, "snapshot request not queued");
        }
    }

    /// ### English
    /// Pauses drawing and blocks until the render thread has handled every earlier command.
    ///
    /// Pausing an already paused surface still waits for the acknowledgement.
    ///
    /// ### 中文
    /// 暂停绘制，并阻塞直到渲染线程处理完此前的所有命令。
    ///
    /// 对已暂停的表面再次暂停仍会等待确认。
    pub fn pause(&self) -> Result<(), SurfaceError> {
        let (ack_tx, ack_rx) = channel::bounded(1);
        self.send(Command::Pause { ack: ack_tx })?;
        ack_rx.recv().map_err(|_| SurfaceError::ShutDown)
    }

    pub fn resume(&self) -> Result<(), SurfaceError> {
        self.send(Command::Resume)
    }

    /// ### English
    /// Resizes the drawable. Zero dimensions are clamped to `1`.
    ///
    /// ### 中文
    /// 调整可绘制区域尺寸。为 0 的维度会被钳制为 `1`。
    pub fn resize(&self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.send(Command::Resize(PhysicalSize::new(width.max(1), height.max(1))))
    }

    pub fn request_render(&self) -> Result<(), SurfaceError> {
        self.send(Command::RequestRender)
    }

    pub fn attach_session(&self, session: Arc<dyn TrackingSession>) -> Result<(), SurfaceError> {
        self.send(Command::AttachSession(session))
    }

    /// ### English
    /// Number of frames drawn so far.
    ///
    /// ### 中文
    /// 迄今已绘制的帧数。
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn is_shut_down(&self) -> bool {
        self.thread.is_none()
    }

    /// ### English
    /// Stops the render thread and joins it. Idempotent.
    ///
    /// Deferred work that never ran is dropped; pending tickets then yield `SnapshotError::Dropped`.
    ///
    /// ### 中文
    /// 停止渲染线程并 join。可重复调用。
    ///
    /// 从未执行的延后工作会被丢弃；对应的票据随后返回 `SnapshotError::Dropped`。
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.command_tx.send(Command::Shutdown);
        if thread.join().is_err() {
            warn!("render thread panicked");
        }
    }
}

impl Drop for RenderSurface {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl SurfaceControl for RenderSurface {
    fn pause(&self) {
        if let Err(err) = RenderSurface::pause(self) {
            warn!(%err, "render surface pause failed");
        }
    }

    fn resume(&self) {
        if let Err(err) = RenderSurface::resume(self) {
            warn!(%err, "render surface resume failed");
        }
    }

    fn attach_session(&self, session: Arc<dyn TrackingSession>) {
        if let Err(err) = RenderSurface::attach_session(self, session) {
            warn!(%err, "attaching session to render surface failed");
        }
    }
}
