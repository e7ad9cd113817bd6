//! StandardFirmata 数字输出
//!
//! 只实现本项目需要的两条消息：
//! - SET_PIN_MODE：`[0xF4, pin, mode]`，mode = 0x01 (OUTPUT)
//! - DIGITAL_MESSAGE：`[0x90 | port, lsb, msb]`，每个 port 8 个引脚，
//!   一次写整个 port 的位图（低 7 位 + 高 1 位）
//!
//! 板子不回报数字输出状态，所以 port 位图在本地维护。

use crate::DriverError;
use crate::output::DigitalOutput;
use std::io::Write;

const SET_PIN_MODE: u8 = 0xF4;
const DIGITAL_MESSAGE: u8 = 0x90;
const PIN_MODE_OUTPUT: u8 = 0x01;
const MAX_PIN: u8 = 127;
const PORT_COUNT: usize = 16;

/// StandardFirmata 板（写端）
pub struct FirmataBoard<W> {
    writer: W,
    port_masks: [u8; PORT_COUNT],
}

impl<W: Write + Send> FirmataBoard<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            port_masks: [0; PORT_COUNT],
        }
    }

    /// 当前某个 port 的本地位图
    pub fn port_mask(&self, port: usize) -> u8 {
        self.port_masks.get(port).copied().unwrap_or(0)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn check_pin(pin: u8) -> Result<(), DriverError> {
        if pin > MAX_PIN {
            return Err(DriverError::InvalidPin { pin });
        }
        Ok(())
    }

    fn send(&mut self, message: &[u8]) -> Result<(), DriverError> {
        self.writer.write_all(message)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> DigitalOutput for FirmataBoard<W> {
    fn configure_output(&mut self, pin: u8) -> Result<(), DriverError> {
        Self::check_pin(pin)?;
        self.send(&[SET_PIN_MODE, pin, PIN_MODE_OUTPUT])
    }

    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        Self::check_pin(pin)?;
        let port = (pin / 8) as usize;
        let bit = 1u8 << (pin % 8);
        let mask = if high {
            self.port_masks[port] | bit
        } else {
            self.port_masks[port] & !bit
        };
        self.port_masks[port] = mask;
        self.send(&[DIGITAL_MESSAGE | port as u8, mask & 0x7F, (mask >> 7) & 0x7F])
    }
}

#[cfg(feature = "serial")]
impl FirmataBoard<serial2::SerialPort> {
    /// 打开串口上的 Firmata 板
    ///
    /// 打开串口会让 Arduino 复位，需要等待 `settle` 让固件启动后才能发送命令。
    pub fn open_serial(path: &str, baud_rate: u32, settle: std::time::Duration) -> Result<Self, DriverError> {
        let port = serial2::SerialPort::open(path, baud_rate).map_err(|source| DriverError::Open {
            path: path.to_string(),
            source,
        })?;
        tracing::debug!("Opened {} at {} baud, waiting {:?} for board reset", path, baud_rate, settle);
        std::thread::sleep(settle);
        Ok(Self::new(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_output_encoding() {
        let mut board = FirmataBoard::new(Vec::new());
        board.configure_output(7).unwrap();
        assert_eq!(board.into_inner(), vec![0xF4, 7, 0x01]);
    }

    #[test]
    fn test_digital_message_encoding() {
        let mut board = FirmataBoard::new(Vec::new());
        board.write_pin(7, true).unwrap();
        board.write_pin(8, true).unwrap();
        board.write_pin(12, true).unwrap();
        board.write_pin(7, false).unwrap();
        assert_eq!(board.port_mask(0), 0x00);
        assert_eq!(board.port_mask(1), 0b0001_0001);
        assert_eq!(
            board.into_inner(),
            vec![
                0x90, 0x00, 0x01, // pin 7 高：bit 7 进 msb
                0x91, 0x01, 0x00, // pin 8
                0x91, 0x11, 0x00, // pin 12，pin 8 保持
                0x90, 0x00, 0x00, // pin 7 低
            ]
        );
    }

    #[test]
    fn test_invalid_pin_rejected() {
        let mut board = FirmataBoard::new(Vec::new());
        assert!(matches!(
            board.write_pin(128, true),
            Err(DriverError::InvalidPin { pin: 128 })
        ));
        assert!(board.into_inner().is_empty());
    }

    #[test]
    fn test_drives_actuators() {
        use crate::motor::{Actuators, MotorPins};
        use basket_protocol::MotorDirection;

        let board = FirmataBoard::new(Vec::new());
        let mut act = Actuators::new(board, MotorPins::new(7, 8), MotorPins::new(12, 13)).unwrap();
        act.set_translation(MotorDirection::Forward).unwrap();
        let board = act.into_output();
        assert_eq!(board.port_mask(0), 0x80);
        assert_eq!(board.port_mask(1), 0x00);
    }
}
