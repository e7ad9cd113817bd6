//! # Basket Protocol
//!
//! 吊篮机器人的领域类型定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `location`: 位置、检查点与位置→检查点映射
//! - `motor`: 电机逻辑方向
//! - `state`: 吊篮升降状态与机器人状态快照
//! - `command`: 规划器命令（请求形式与强类型形式）
//!
//! ## 坐标约定
//!
//! 轨道是一维的，检查点用沿运动线的比例表示：0.0 为一端（home），
//! 1.0 为另一端。

pub mod command;
pub mod location;
pub mod motor;
pub mod state;

// 重新导出常用类型
pub use command::*;
pub use location::*;
pub use motor::*;
pub use state::*;

use thiserror::Error;

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Unknown location: {0:?}")]
    UnknownLocation(String),

    #[error("Unknown action: {0:?}")]
    UnknownAction(String),

    #[error("Action {0} requires a target location")]
    MissingLocation(BasketAction),

    #[error("Checkpoint fraction {value} out of range [0.0, 1.0]")]
    FractionOutOfRange { value: f64 },

    #[error("Checkpoint index {index} out of range (have {count} checkpoints)")]
    CheckpointOutOfRange { index: usize, count: usize },

    #[error("Locations {first} and {second} share checkpoint {index}")]
    DuplicateCheckpoint {
        first: Location,
        second: Location,
        index: usize,
    },

    #[error("Locations {first} and {second} are both at fraction {value}")]
    DuplicateFraction {
        first: Location,
        second: Location,
        value: f64,
    },

    #[error("Checkpoint list is empty")]
    NoCheckpoints,
}
