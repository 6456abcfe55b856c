//! ### English
//! Process-wide `tracing` subscriber installation.
//!
//! ### 中文
//! 进程级 `tracing` subscriber 的安装。

use tracing_subscriber::EnvFilter;

/// ### English
/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to `level`.
///
/// Returns `false` if a global subscriber was already installed (the call is then a no-op).
///
/// ### 中文
/// 安装一个按 `RUST_LOG` 过滤的 `fmt` subscriber；未设置时回退到 `level`。
///
/// 若已存在全局 subscriber 则返回 `false`（此时调用不产生任何效果）。
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
