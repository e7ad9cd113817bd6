//! 后台跟踪线程
//!
//! 持有一个 `BoundingBoxFeed`，逐帧写入 `ObservationSlot`：
//! - `Tracked` → 覆盖写入
//! - `Lost` / 格式错误的帧 → 清空槽，继续
//! - `End` / IO 错误 → 清空槽，线程退出
//!
//! 控制线程从不等待跟踪线程，只读取槽中的最新值。

use crate::VisionError;
use crate::feed::{BoundingBoxFeed, Frame};
use crate::slot::ObservationSlot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{Builder, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Drop 时等待线程退出的上限
const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// 帧计数
#[derive(Debug, Default)]
struct FrameCounters {
    tracked: AtomicU64,
    lost: AtomicU64,
    malformed: AtomicU64,
}

/// 帧统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerStats {
    pub tracked: u64,
    pub lost: u64,
    pub malformed: u64,
}

/// 后台跟踪线程句柄
///
/// Drop 时请求退出并在超时内 join。若 feed 阻塞在读取上，线程会在
/// 下一帧到达（或管道关闭）后退出。
pub struct TrackerThread {
    slot: Arc<ObservationSlot>,
    is_running: Arc<AtomicBool>,
    counters: Arc<FrameCounters>,
    handle: Option<JoinHandle<()>>,
}

impl TrackerThread {
    /// 启动跟踪线程
    pub fn spawn<F>(feed: F, slot: Arc<ObservationSlot>) -> Result<Self, VisionError>
    where
        F: BoundingBoxFeed + 'static,
    {
        let is_running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(FrameCounters::default());

        let handle = {
            let slot = slot.clone();
            let is_running = is_running.clone();
            let counters = counters.clone();
            Builder::new()
                .name("basket-tracker".into())
                .spawn(move || tracker_loop(feed, slot, is_running, counters))
                .map_err(|e| VisionError::Spawn(e.to_string()))?
        };

        info!("Tracker thread started");
        Ok(Self {
            slot,
            is_running,
            counters,
            handle: Some(handle),
        })
    }

    /// 共享观测槽
    pub fn slot(&self) -> &Arc<ObservationSlot> {
        &self.slot
    }

    /// 线程是否仍在运行
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 帧统计
    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            tracked: self.counters.tracked.load(Ordering::Relaxed),
            lost: self.counters.lost.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
        }
    }

    /// 请求退出并等待线程结束
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.is_running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if join_with_timeout(handle, JOIN_TIMEOUT) {
                debug!("Tracker thread joined");
            } else {
                warn!("Tracker thread did not exit within {:?}", JOIN_TIMEOUT);
            }
        }
        self.slot.clear();
    }
}

impl Drop for TrackerThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn tracker_loop<F: BoundingBoxFeed>(
    mut feed: F,
    slot: Arc<ObservationSlot>,
    is_running: Arc<AtomicBool>,
    counters: Arc<FrameCounters>,
) {
    let mut was_tracking = false;

    while is_running.load(Ordering::Acquire) {
        match feed.next_frame() {
            Ok(Frame::Tracked(bbox)) => {
                if !was_tracking {
                    info!("Tracking acquired at ({:.0}, {:.0})", bbox.x, bbox.y);
                }
                was_tracking = true;
                counters.tracked.fetch_add(1, Ordering::Relaxed);
                slot.publish(bbox);
            },
            Ok(Frame::Lost) => {
                if was_tracking {
                    warn!("Tracking lost");
                }
                was_tracking = false;
                counters.lost.fetch_add(1, Ordering::Relaxed);
                slot.clear();
            },
            Ok(Frame::End) => {
                info!("Tracker feed ended");
                break;
            },
            Err(VisionError::MalformedFrame { line }) => {
                warn!("Ignoring malformed tracker frame: {:?}", line);
                was_tracking = false;
                counters.malformed.fetch_add(1, Ordering::Relaxed);
                slot.clear();
            },
            Err(e) => {
                error!("Tracker feed failed: {}", e);
                break;
            },
        }
    }

    slot.clear();
}

/// 带超时的 join，线程结束返回 true
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> bool {
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();
    let watcher = Builder::new().name("basket-tracker-join".into()).spawn(move || {
        let result = handle.join();
        let _ = tx.send(result.is_ok());
    });
    if watcher.is_err() {
        return false;
    }
    matches!(rx.recv_timeout(timeout), Ok(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::LineFeed;
    use crate::geometry::BoundingBox;
    use std::io::Cursor;
    use std::thread;
    use std::time::Instant;

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_feed_end_clears_slot_and_exits() {
        let slot = ObservationSlot::shared();
        let feed = LineFeed::new(Cursor::new(&b"10 20 5 5\nbad line\n30 40 5 5\n"[..]));
        let tracker = TrackerThread::spawn(feed, slot.clone()).unwrap();

        assert!(wait_until(|| !tracker.is_alive()));
        assert_eq!(
            tracker.stats(),
            TrackerStats {
                tracked: 2,
                lost: 0,
                malformed: 1
            }
        );
        // EOF 之后槽被清空
        assert_eq!(slot.latest(), None);
        assert_eq!(slot.generation(), 4);
    }

    #[test]
    fn test_stop_running_tracker() {
        let slot = ObservationSlot::shared();
        let feed = move || -> Result<Frame, VisionError> {
            thread::sleep(Duration::from_millis(2));
            Ok(Frame::Tracked(BoundingBox::new(100.0, 60.0, 50.0, 50.0)))
        };
        let tracker = TrackerThread::spawn(feed, slot.clone()).unwrap();

        assert!(wait_until(|| slot.latest().is_some()));
        assert!(tracker.is_alive());
        tracker.stop();
        assert_eq!(slot.latest(), None);
    }

    #[test]
    fn test_io_error_stops_thread() {
        let slot = ObservationSlot::shared();
        let feed = move || -> Result<Frame, VisionError> {
            Err(VisionError::Io(std::io::Error::other("camera unplugged")))
        };
        let tracker = TrackerThread::spawn(feed, slot.clone()).unwrap();
        assert!(wait_until(|| !tracker.is_alive()));
        assert_eq!(slot.latest(), None);
    }
}
