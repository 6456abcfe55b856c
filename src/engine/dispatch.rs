//! ### English
//! Main-thread mailbox: lets the render thread hand results back to the thread that asked.
//!
//! The owning (UI) thread keeps the [`MainThreadQueue`] and drains it from its own loop; any
//! thread may post through a cloned [`MainThreadDispatcher`].
//!
//! ### 中文
//! 主线程信箱：让渲染线程把结果交回给发起请求的线程。
//!
//! 拥有者（UI）线程持有 [`MainThreadQueue`] 并在自己的循环中 drain；任何线程都可以通过克隆的
//! [`MainThreadDispatcher`] 投递任务。

use std::marker::PhantomData;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossbeam_channel as channel;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// ### English
/// Receiving side, pinned to the thread that created it.
///
/// ### 中文
/// 接收端，绑定在创建它的线程上。
pub struct MainThreadQueue {
    sender: channel::Sender<Task>,
    receiver: channel::Receiver<Task>,
    /// ### English
    /// Keeps the queue `!Send` so tasks always run on the owning thread.
    ///
    /// ### 中文
    /// 使队列为 `!Send`，保证任务总在拥有者线程上执行。
    _not_send: PhantomData<Rc<()>>,
}

/// ### English
/// Cloneable, thread-safe posting handle.
///
/// ### 中文
/// 可克隆、线程安全的投递句柄。
#[derive(Clone)]
pub struct MainThreadDispatcher {
    sender: channel::Sender<Task>,
}

impl MainThreadQueue {
    pub fn new() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            sender,
            receiver,
            _not_send: PhantomData,
        }
    }

    pub fn dispatcher(&self) -> MainThreadDispatcher {
        MainThreadDispatcher {
            sender: self.sender.clone(),
        }
    }

    /// ### English
    /// Runs every task posted so far and returns how many ran.
    ///
    /// ### 中文
    /// 执行目前已投递的所有任务，并返回执行数量。
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// ### English
    /// Blocks up to `timeout` for at least one task, then drains the queue.
    ///
    /// ### 中文
    /// 最多阻塞 `timeout` 等待至少一个任务，然后 drain 队列。
    pub fn run_for(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        match self.receiver.recv_deadline(deadline) {
            Ok(task) => {
                task();
                1 + self.run_pending()
            }
            Err(_) => 0,
        }
    }
}

impl Default for MainThreadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThreadDispatcher {
    /// ### English
    /// Posts `task` to the owning thread. Returns `false` if the queue is gone.
    ///
    /// ### 中文
    /// 向拥有者线程投递 `task`。若队列已不存在则返回 `false`。
    pub fn post<T>(&self, task: T) -> bool
    where
        T: FnOnce() + Send + 'static,
    {
        self.sender.send(Box::new(task)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn tasks_posted_from_other_threads_run_on_owner() {
        let queue = MainThreadQueue::new();
        let dispatcher = queue.dispatcher();
        let owner = thread::current().id();
        let ran_on_owner = Arc::new(AtomicUsize::new(0));

        let worker = {
            let ran_on_owner = ran_on_owner.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    let ran_on_owner = ran_on_owner.clone();
                    assert!(dispatcher.post(move || {
                        if thread::current().id() == owner {
                            ran_on_owner.fetch_add(1, Ordering::SeqCst);
                        }
                    }));
                }
            })
        };
        worker.join().unwrap();

        assert_eq!(ran_on_owner.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(ran_on_owner.load(Ordering::SeqCst), 3);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn run_for_times_out_when_idle() {
        let queue = MainThreadQueue::new();
        assert_eq!(queue.run_for(Duration::from_millis(10)), 0);
    }

    #[test]
    fn post_fails_once_queue_is_dropped() {
        let queue = MainThreadQueue::new();
        let dispatcher = queue.dispatcher();
        drop(queue);
        assert!(!dispatcher.post(|| {}));
    }
}
