//! 电机驱动层
//!
//! 本模块把逻辑方向（FORWARD / REVERSE / STILL）翻译为两路数字输出：
//! - `DigitalOutput` trait：引脚写入的抽象（Firmata 板、录制器、仿真器）
//! - `Motor`：单轴 H 桥（A/B 两个引脚）
//! - `Actuators`：平移轴 + 升降轴
//! - `FirmataBoard`：StandardFirmata 数字输出编码（串口或任意 `io::Write`）
//!
//! 没有反馈通路；所有位置反馈都来自视觉层。

mod error;
pub mod firmata;
pub mod motor;
pub mod output;

pub use error::DriverError;
pub use firmata::FirmataBoard;
pub use motor::{Actuators, Axis, Motor, MotorPins};
pub use output::{DigitalOutput, PinWrite, RecordingOutput};
