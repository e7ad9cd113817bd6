//! 单槽观测单元
//!
//! 跟踪线程每帧覆盖写入，控制线程无锁读取最新值：
//! - 写入：`ArcSwapOption::store`（原子替换，last-write-wins）
//! - 读取：`ArcSwapOption::load_full`（Wait-Free，不阻塞写入方）
//!
//! 没有队列，没有背压；读取方永远只看到最新的一帧（或“无”）。

use crate::geometry::BoundingBox;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 最新边界框的共享单元
#[derive(Debug, Default)]
pub struct ObservationSlot {
    latest: ArcSwapOption<BoundingBox>,
    /// 写入次数（含清空），仅用于诊断
    generation: AtomicU64,
}

impl ObservationSlot {
    /// 创建空槽（跟踪器尚未启动）
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建共享槽
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// 写入新的边界框
    pub fn publish(&self, bbox: BoundingBox) {
        self.latest.store(Some(Arc::new(bbox)));
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// 清空（跟踪丢失）
    pub fn clear(&self) {
        self.latest.store(None);
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// 读取最新边界框（不修改槽）
    pub fn latest(&self) -> Option<BoundingBox> {
        self.latest.load_full().map(|bbox| *bbox)
    }

    /// 写入次数
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_slot_is_absent() {
        let slot = ObservationSlot::new();
        assert_eq!(slot.latest(), None);
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_last_write_wins() {
        let slot = ObservationSlot::new();
        slot.publish(BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        slot.publish(BoundingBox::new(5.0, 6.0, 7.0, 8.0));
        assert_eq!(slot.latest(), Some(BoundingBox::new(5.0, 6.0, 7.0, 8.0)));
        assert_eq!(slot.generation(), 2);

        slot.clear();
        assert_eq!(slot.latest(), None);
        assert_eq!(slot.generation(), 3);
    }

    #[test]
    fn test_concurrent_reads_never_block_writer() {
        let slot = ObservationSlot::shared();
        let writer = {
            let slot = slot.clone();
            thread::spawn(move || {
                for i in 0..1000 {
                    slot.publish(BoundingBox::new(i as f64, 0.0, 10.0, 10.0));
                }
            })
        };

        let mut last_x = -1.0;
        for _ in 0..1000 {
            if let Some(bbox) = slot.latest() {
                // 单写者：读到的值单调不减
                assert!(bbox.x >= last_x);
                last_x = bbox.x;
            }
        }
        writer.join().unwrap();
        assert_eq!(slot.latest().map(|b| b.x), Some(999.0));
    }
}
