//! # Basket Client
//!
//! 吊篮机器人的控制层：
//!
//! - `controller`：闭环运动控制器（Lower / Raise / MoveTo，采样 → 动作 → 等待）
//! - `machine`：吊篮状态机与操作计划（移动前自动升起）
//! - `dispatcher`：规划器请求的校验与分发
//! - `config`：TOML 启动配置
//! - `sim`：虚拟时钟仿真装置（测试与演示）
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use basket_client::sim::{SimRig, SimSettings};
//! use basket_client::{BasketConfig, BasketStateMachine, CommandDispatcher, parse_request};
//!
//! # fn main() -> Result<(), basket_client::BasketError> {
//! let config = BasketConfig::default();
//! let rig = SimRig::new(SimSettings::from_config(&config)?);
//! let controller = rig.controller_from_config(&config)?;
//! let mut dispatcher = CommandDispatcher::new(controller, BasketStateMachine::new());
//!
//! let state = dispatcher.dispatch(parse_request("move closet")?)?;
//! println!("{}", state);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod config;
pub mod controller;
pub mod dispatcher;
mod error;
pub mod machine;
pub mod sim;
pub mod timing;

pub use cancel::CancelToken;
pub use config::{BasketConfig, ConfigError};
pub use controller::{ControlSettings, MotionController, OperationReport};
pub use dispatcher::{CommandDispatcher, parse_request};
pub use error::BasketError;
pub use machine::{BasketStateMachine, Operation};
pub use timing::{Sleeper, ThreadSleeper};
