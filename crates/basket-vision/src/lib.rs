//! 视觉定位层
//!
//! 本模块把后台视觉跟踪器不断覆盖写入的边界框，转换为相对检查点的位置信号：
//! - 单槽观测单元（ArcSwap 无锁读取，last-write-wins）
//! - 运动线几何（沿线比例、线下垂偏差）
//! - 检查点相对位置估计（LEFT-OF / AT / RIGHT-OF + 是否放下）
//! - 后台跟踪线程与文本帧协议
//!
//! 跟踪器内部的图像处理不在本模块范围内，这里只消费它输出的边界框。

pub mod estimator;
pub mod feed;
pub mod geometry;
pub mod slot;
pub mod tracker;

pub use estimator::{EstimatorSettings, PositionEstimator, PositionObservation, RelativeSide, TrackPosition};
pub use feed::{BoundingBoxFeed, Frame, LineFeed};
pub use geometry::{BoundingBox, MotionLine, Point};
pub use slot::ObservationSlot;
pub use tracker::{TrackerStats, TrackerThread};

use thiserror::Error;

/// 视觉层错误类型
#[derive(Error, Debug)]
pub enum VisionError {
    /// 运动线退化（两端 x 相同，无法计算沿线比例）
    #[error("Degenerate motion line: start and end share x = {x}")]
    DegenerateMotionLine { x: f64 },

    /// 文本帧格式错误
    #[error("Malformed tracker frame: {line:?}")]
    MalformedFrame { line: String },

    /// 读取跟踪器输出失败
    #[error("Tracker IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 跟踪线程创建失败
    #[error("Failed to spawn tracker thread: {0}")]
    Spawn(String),
}

#[cfg(test)]
mod tests {
    use super::VisionError;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::DegenerateMotionLine { x: 25.0 };
        assert_eq!(
            format!("{}", err),
            "Degenerate motion line: start and end share x = 25"
        );

        let err = VisionError::MalformedFrame {
            line: "12 abc".to_string(),
        };
        assert!(format!("{}", err).contains("\"12 abc\""));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: VisionError = io.into();
        match err {
            VisionError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            _ => panic!("Expected Io variant"),
        }
    }
}
