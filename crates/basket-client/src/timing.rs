//! 控制周期计时
//!
//! 控制循环只通过 `Sleeper` 挂起，便于在仿真中使用虚拟时钟。

use std::time::Duration;

/// 周期等待
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Box<S> {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 自旋补偿的低抖动等待（tick 拆分需要较准的子周期）
impl Sleeper for spin_sleep::SpinSleeper {
    fn sleep(&self, duration: Duration) {
        spin_sleep::SpinSleeper::sleep(*self, duration);
    }
}
