//! ### English
//! Dedicated render thread: owns the graphics context and drives frame drawing.
//!
//! ### 中文
//! 独立渲染线程：持有图形上下文并驱动帧绘制。

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{self as channel, RecvTimeoutError};
use dpi::PhysicalSize;
use tracing::{debug, info, warn};

use crate::engine::config::{RenderMode, SurfaceConfig};
use crate::engine::error::SurfaceError;
use crate::engine::rendering::{ContextFactory, FrameRenderer, GraphicsContext};

use super::command::{Command, WorkItem};

/// ### English
/// What the loop does after handling one command.
///
/// ### 中文
/// 处理完一条命令后循环要做的事。
enum Flow {
    Continue,
    Exit,
}

/// ### English
/// State owned exclusively by the render thread.
///
/// ### 中文
/// 仅由渲染线程持有的状态。
struct RenderLoop<F: ContextFactory, R> {
    config: SurfaceConfig,
    factory: F,
    renderer: R,
    /// ### English
    /// `None` while the context is discarded (pause without preservation, or lost on resume).
    ///
    /// ### 中文
    /// 上下文被丢弃时为 `None`（暂停且不保留，或 resume 时丢失）。
    context: Option<F::Context>,
    size: PhysicalSize<u32>,
    paused: bool,
    /// ### English
    /// Work received while paused, run in order right after the next resume.
    ///
    /// ### 中文
    /// 暂停期间收到的工作，在下一次 resume 后立即按顺序执行。
    deferred: VecDeque<WorkItem>,
    dirty: bool,
    next_frame: Instant,
    frames: Arc<AtomicU64>,
}

impl<F: ContextFactory, R: FrameRenderer> RenderLoop<F, R> {
    fn wants_frames(&self) -> bool {
        if self.paused || self.context.is_none() {
            return false;
        }
        match self.config.render_mode {
            RenderMode::Continuously => true,
            RenderMode::WhenDirty => self.dirty,
        }
    }

    fn draw_frame(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        self.renderer.draw_frame(context);
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.dirty = false;

        let now = Instant::now();
        self.next_frame += self.config.frame_interval();
        if self.next_frame < now {
            self.next_frame = now + self.config.frame_interval();
        }
    }

    fn create_context(&mut self) -> Result<(), SurfaceError> {
        let mut context = self.factory.create(&self.config, self.size)?;
        self.renderer.surface_created(&mut context);
        self.renderer.surface_changed(&mut context, self.size);
        self.context = Some(context);
        Ok(())
    }

    fn run_deferred(&mut self) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        if !self.deferred.is_empty() {
            debug!(count = self.deferred.len(), "running deferred work");
        }
        while let Some(work) = self.deferred.pop_front() {
            work(context as &mut dyn GraphicsContext);
        }
    }

    fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Work(work) => match self.context.as_mut() {
                Some(context) if !self.paused => work(context as &mut dyn GraphicsContext),
                _ => self.deferred.push_back(work),
            },
            Command::Pause { ack } => {
                if !self.paused {
                    self.paused = true;
                    if !self.config.preserve_context_on_pause && self.context.take().is_some() {
                        debug!("graphics context discarded on pause");
                    }
                    debug!("render thread paused");
                }
                let _ = ack.send(());
            }
            Command::Resume => {
                if !self.paused {
                    return Flow::Continue;
                }
                if self.context.is_none() {
                    if let Err(err) = self.create_context() {
                        warn!(%err, "failed to recreate graphics context; staying paused");
                        return Flow::Continue;
                    }
                }
                self.paused = false;
                self.dirty = true;
                self.next_frame = Instant::now();
                self.run_deferred();
                debug!("render thread resumed");
            }
            Command::Resize(size) => {
                self.size = size;
                if let Some(context) = self.context.as_mut() {
                    if let Err(err) = context.resize(size) {
                        warn!(%err, "failed to resize graphics context");
                    }
                    self.renderer.surface_changed(context, size);
                }
                self.dirty = true;
            }
            Command::RequestRender => {
                self.dirty = true;
                if self.config.render_mode == RenderMode::WhenDirty {
                    self.next_frame = Instant::now();
                }
            }
            Command::AttachSession(session) => {
                self.renderer.set_session(session);
            }
            Command::Shutdown => return Flow::Exit,
        }
        Flow::Continue
    }
}

/// ### English
/// Render thread entry function.
/// Returns on `Shutdown`, when every sender is gone, or when initialization fails.
///
/// ### 中文
/// 渲染线程入口函数。
/// 收到 `Shutdown`、所有发送端关闭或初始化失败时返回。
pub(super) fn run_render_thread<F, R>(
    config: SurfaceConfig,
    factory: F,
    renderer: R,
    frames: Arc<AtomicU64>,
    command_rx: channel::Receiver<Command>,
    init_tx: channel::Sender<Result<(), SurfaceError>>,
) where
    F: ContextFactory,
    R: FrameRenderer,
{
    let mut state = RenderLoop {
        size: config.initial_size,
        config,
        factory,
        renderer,
        context: None,
        paused: true,
        deferred: VecDeque::new(),
        dirty: false,
        next_frame: Instant::now(),
        frames,
    };

    if let Err(err) = state.create_context() {
        let _ = init_tx.send(Err(err));
        return;
    }
    let _ = init_tx.send(Ok(()));
    info!(
        width = state.size.width,
        height = state.size.height,
        "render thread started"
    );

    loop {
        /*
        ### English
        1) Drain everything already queued so frames never delay earlier commands.

        ### 中文
        1) 先 drain 已排队的所有命令，保证帧绘制不会推迟更早的命令。
        */
        while let Ok(command) = command_rx.try_recv() {
            if let Flow::Exit = state.handle(command) {
                return finish(state);
            }
        }

        /*
        ### English
        2) Draw if a frame is due.

        ### 中文
        2) 若到了绘制时间则绘制一帧。
        */
        if state.wants_frames() && Instant::now() >= state.next_frame {
            state.draw_frame();
        }

        /*
        ### English
        3) Wait for the next command, or until the next frame deadline while drawing.

        ### 中文
        3) 等待下一条命令；绘制期间最多等到下一帧的截止时间。
        */
        let command = if state.wants_frames() {
            match command_rx.recv_deadline(state.next_frame) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return finish(state),
            }
        } else {
            match command_rx.recv() {
                Ok(command) => Some(command),
                Err(_) => return finish(state),
            }
        };

        if let Some(command) = command {
            if let Flow::Exit = state.handle(command) {
                return finish(state);
            }
        }
    }
}

fn finish<F: ContextFactory, R>(state: RenderLoop<F, R>) {
    if !state.deferred.is_empty() {
        warn!(
            count = state.deferred.len(),
            "dropping deferred work on render thread exit"
        );
    }
    info!(
        frames = state.frames.load(Ordering::Relaxed),
        "render thread stopped"
    );
}
