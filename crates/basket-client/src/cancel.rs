//! 取消令牌
//!
//! 控制循环在每个周期开始时检查令牌；令牌可以 Clone 到信号处理线程（Ctrl-C）。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 共享取消标志
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// 清除取消标志（新命令开始前调用）
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}
