//! 检查点相对位置估计
//!
//! `query(checkpoint)` 读取槽中的最新边界框，给出：
//! - 相对检查点的方位：容差内为 `At`（优先于严格比较，避免边界振荡），
//!   否则比例较小为 `LeftOf`，较大为 `RightOf`
//! - 是否放下：纵向偏差绝对值 ≥ 阈值
//!
//! 槽为空时返回 `None`，调用方只能把它当作“稍后重试”。

use crate::geometry::{BoundingBox, MotionLine};
use crate::slot::ObservationSlot;
use basket_protocol::{Checkpoint, CheckpointMap, Location};
use std::fmt;
use std::sync::Arc;

/// 相对检查点的方位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeSide {
    LeftOf,
    At,
    RightOf,
}

impl fmt::Display for RelativeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelativeSide::LeftOf => "LEFT-OF",
            RelativeSide::At => "AT",
            RelativeSide::RightOf => "RIGHT-OF",
        })
    }
}

/// 单次观测（瞬时值，不缓存）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionObservation {
    pub side: RelativeSide,
    pub lowered: bool,
}

/// 原始沿线位置（诊断用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPosition {
    /// 沿运动线的比例
    pub fraction: f64,
    /// 相对运动线的纵向偏差（像素，正值在线下方）
    pub deviation: f64,
}

/// 估计参数
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorSettings {
    pub motion_line: MotionLine,
    /// 位置容差（比例）
    pub position_tolerance: f64,
    /// 放下判定阈值（像素）
    pub lowered_threshold: f64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            motion_line: MotionLine::default(),
            position_tolerance: 0.05,
            lowered_threshold: 75.0,
        }
    }
}

/// 位置估计器（只读视图）
///
/// 直接持有观测槽，每次查询都读取最新一帧。可以 Clone 到其他线程。
#[derive(Debug, Clone)]
pub struct PositionEstimator {
    slot: Arc<ObservationSlot>,
    checkpoints: CheckpointMap,
    settings: EstimatorSettings,
}

impl PositionEstimator {
    pub fn new(
        slot: Arc<ObservationSlot>,
        checkpoints: CheckpointMap,
        settings: EstimatorSettings,
    ) -> Self {
        Self {
            slot,
            checkpoints,
            settings,
        }
    }

    /// 相对检查点查询
    ///
    /// 没有有效边界框，或检查点下标不存在时返回 `None`。
    pub fn query(&self, checkpoint: Checkpoint) -> Option<PositionObservation> {
        let fraction = self.checkpoints.fraction(checkpoint)?;
        self.query_fraction(fraction)
    }

    /// 相对位置查询（按位置名）
    pub fn query_location(&self, location: Location) -> Option<PositionObservation> {
        self.query(self.checkpoints.checkpoint_of(location))
    }

    /// 相对任意比例查询
    pub fn query_fraction(&self, checkpoint_fraction: f64) -> Option<PositionObservation> {
        let bbox = self.slot.latest()?;
        Some(self.observe(&bbox, checkpoint_fraction))
    }

    /// 当前原始沿线位置
    pub fn locate(&self) -> Option<TrackPosition> {
        let bbox = self.slot.latest()?;
        let point = bbox.reference_point();
        Some(TrackPosition {
            fraction: self.settings.motion_line.fraction_of(point),
            deviation: self.settings.motion_line.deviation_of(point),
        })
    }

    /// 对给定边界框计算观测（纯函数）
    pub fn observe(&self, bbox: &BoundingBox, checkpoint_fraction: f64) -> PositionObservation {
        let point = bbox.reference_point();
        let line = &self.settings.motion_line;
        let fraction = line.fraction_of(point);

        let side = if (fraction - checkpoint_fraction).abs() <= self.settings.position_tolerance {
            RelativeSide::At
        } else if fraction < checkpoint_fraction {
            RelativeSide::LeftOf
        } else {
            RelativeSide::RightOf
        };
        let lowered = line.deviation_of(point).abs() >= self.settings.lowered_threshold;

        PositionObservation { side, lowered }
    }

    pub fn checkpoints(&self) -> &CheckpointMap {
        &self.checkpoints
    }

    pub fn settings(&self) -> &EstimatorSettings {
        &self.settings
    }

    pub fn slot(&self) -> &Arc<ObservationSlot> {
        &self.slot
    }
}
