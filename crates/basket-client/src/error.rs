//! 客户端错误类型定义

use crate::config::ConfigError;
use basket_driver::DriverError;
use basket_vision::VisionError;
use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum BasketError {
    /// 命令不合法（缺少目标位置、未知动作、格式错误），未执行任何动作
    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    /// 连续丢失跟踪超过上限（两个轴已停止）
    #[error("Tracking lost for {consecutive_absent} consecutive polls, motors stopped")]
    TrackingLost { consecutive_absent: u32 },

    /// 操作被取消（两个轴已停止）
    #[error("Operation cancelled")]
    Cancelled,

    /// 状态机前置条件不满足
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// 执行器链路错误
    #[error("Actuator error: {0}")]
    Driver(#[from] DriverError),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 视觉层错误
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

impl BasketError {
    pub(crate) fn invalid(reason: impl ToString) -> Self {
        BasketError::InvalidCommand {
            reason: reason.to_string(),
        }
    }

    /// 是否由执行过程中止（而非命令本身不合法）
    pub fn is_abort(&self) -> bool {
        matches!(self, BasketError::TrackingLost { .. } | BasketError::Cancelled)
    }
}
