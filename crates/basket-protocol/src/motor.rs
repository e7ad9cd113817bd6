//! 电机逻辑方向

use std::fmt;

/// 单轴电机的逻辑方向
///
/// - `Forward`：仅拉高 A 引脚
/// - `Reverse`：仅拉高 B 引脚
/// - `Still`：两个引脚都拉低（没有刹车/中间状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MotorDirection {
    Forward,
    Reverse,
    #[default]
    Still,
}

impl MotorDirection {
    /// 对应的 (A, B) 引脚电平
    pub fn pin_levels(self) -> (bool, bool) {
        match self {
            MotorDirection::Forward => (true, false),
            MotorDirection::Reverse => (false, true),
            MotorDirection::Still => (false, false),
        }
    }

    /// 是否在运动
    pub fn is_moving(self) -> bool {
        self != MotorDirection::Still
    }

    /// 反方向（Still 保持不变）
    pub fn reversed(self) -> Self {
        match self {
            MotorDirection::Forward => MotorDirection::Reverse,
            MotorDirection::Reverse => MotorDirection::Forward,
            MotorDirection::Still => MotorDirection::Still,
        }
    }
}

impl fmt::Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MotorDirection::Forward => "FORWARD",
            MotorDirection::Reverse => "REVERSE",
            MotorDirection::Still => "STILL",
        })
    }
}
