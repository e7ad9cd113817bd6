//! 驱动层错误类型定义

use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 写入执行器链路失败（串口断开等）
    #[error("Actuator IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 打开串口失败
    #[error("Failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 引脚号超出 Firmata 范围（0-127）
    #[error("Invalid pin {pin} (Firmata supports 0-127)")]
    InvalidPin { pin: u8 },

    /// 两个电机共用同一引脚
    #[error("Pin {pin} is assigned to more than one motor line")]
    PinConflict { pin: u8 },
}

#[cfg(test)]
mod tests {
    use super::DriverError;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::InvalidPin { pin: 200 };
        assert_eq!(format!("{}", err), "Invalid pin 200 (Firmata supports 0-127)");

        let err = DriverError::PinConflict { pin: 7 };
        assert_eq!(format!("{}", err), "Pin 7 is assigned to more than one motor line");

        let err = DriverError::Open {
            path: "/dev/ttyACM0".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such device"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/dev/ttyACM0") && msg.contains("no such device"));
    }

    #[test]
    fn test_from_io_error() {
        let err: DriverError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, DriverError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }
}
