//! H 桥电机与执行器组
//!
//! 每个轴一个 `Motor`（A/B 两个引脚）：
//! - FORWARD：A 高 B 低
//! - REVERSE：A 低 B 高
//! - STILL：A、B 都低
//!
//! 写入顺序：先拉低要释放的引脚，再拉高要使能的引脚，
//! 保证换向过程中两个引脚不会同时为高。

use crate::DriverError;
use crate::output::DigitalOutput;
use basket_protocol::MotorDirection;
use std::fmt;
use tracing::trace;

/// 单轴引脚分配
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorPins {
    pub a: u8,
    pub b: u8,
}

impl MotorPins {
    pub const fn new(a: u8, b: u8) -> Self {
        Self { a, b }
    }
}

/// 轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// 沿轨道平移
    Translation,
    /// 吊篮升降
    RaiseLower,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Translation => "translation",
            Axis::RaiseLower => "raise/lower",
        })
    }
}

/// 单轴电机驱动（无状态翻译，只记住最后一次命令的方向）
#[derive(Debug, Clone)]
pub struct Motor {
    pins: MotorPins,
    direction: MotorDirection,
}

impl Motor {
    pub fn new(pins: MotorPins) -> Self {
        Self {
            pins,
            direction: MotorDirection::Still,
        }
    }

    pub fn pins(&self) -> MotorPins {
        self.pins
    }

    /// 最后一次命令的方向
    pub fn direction(&self) -> MotorDirection {
        self.direction
    }

    /// 设置方向
    pub fn set_direction<O>(&mut self, output: &mut O, direction: MotorDirection) -> Result<(), DriverError>
    where
        O: DigitalOutput + ?Sized,
    {
        let (a, b) = direction.pin_levels();
        let writes = [(self.pins.a, a), (self.pins.b, b)];

        // 先写低电平
        for (pin, high) in writes.iter().filter(|(_, high)| !high) {
            output.write_pin(*pin, *high)?;
        }
        for (pin, high) in writes.iter().filter(|(_, high)| *high) {
            output.write_pin(*pin, *high)?;
        }

        self.direction = direction;
        Ok(())
    }
}

/// 执行器组：平移轴 + 升降轴
///
/// 两个轴不共享可变状态，可以在同一控制周期内分别写入。
pub struct Actuators<O> {
    output: O,
    translation: Motor,
    raise_lower: Motor,
}

impl<O: DigitalOutput> Actuators<O> {
    /// 创建执行器组
    ///
    /// 校验引脚范围与唯一性，配置为输出，并把两个轴置为 STILL。
    pub fn new(mut output: O, translation: MotorPins, raise_lower: MotorPins) -> Result<Self, DriverError> {
        let pins = [translation.a, translation.b, raise_lower.a, raise_lower.b];
        for (i, pin) in pins.iter().enumerate() {
            if *pin > 127 {
                return Err(DriverError::InvalidPin { pin: *pin });
            }
            if pins[..i].contains(pin) {
                return Err(DriverError::PinConflict { pin: *pin });
            }
        }

        for pin in pins {
            output.configure_output(pin)?;
        }

        let mut actuators = Self {
            output,
            translation: Motor::new(translation),
            raise_lower: Motor::new(raise_lower),
        };
        actuators.stop_all()?;
        Ok(actuators)
    }

    /// 设置某个轴的方向
    pub fn set(&mut self, axis: Axis, direction: MotorDirection) -> Result<(), DriverError> {
        trace!("{} -> {}", axis, direction);
        let motor = match axis {
            Axis::Translation => &mut self.translation,
            Axis::RaiseLower => &mut self.raise_lower,
        };
        motor.set_direction(&mut self.output, direction)
    }

    pub fn set_translation(&mut self, direction: MotorDirection) -> Result<(), DriverError> {
        self.set(Axis::Translation, direction)
    }

    pub fn set_raise_lower(&mut self, direction: MotorDirection) -> Result<(), DriverError> {
        self.set(Axis::RaiseLower, direction)
    }

    /// 两个轴都置为 STILL
    pub fn stop_all(&mut self) -> Result<(), DriverError> {
        self.set(Axis::Translation, MotorDirection::Still)?;
        self.set(Axis::RaiseLower, MotorDirection::Still)
    }

    /// 某个轴最后一次命令的方向
    pub fn direction(&self, axis: Axis) -> MotorDirection {
        match axis {
            Axis::Translation => self.translation.direction(),
            Axis::RaiseLower => self.raise_lower.direction(),
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }
}
