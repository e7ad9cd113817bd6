//! 数字输出抽象

use crate::DriverError;
use std::collections::BTreeMap;

/// 数字输出（同步写入，写入后立即生效）
pub trait DigitalOutput: Send {
    /// 把引脚配置为输出（默认无操作）
    fn configure_output(&mut self, _pin: u8) -> Result<(), DriverError> {
        Ok(())
    }

    /// 写引脚电平
    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), DriverError>;
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn configure_output(&mut self, pin: u8) -> Result<(), DriverError> {
        (**self).configure_output(pin)
    }

    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        (**self).write_pin(pin, high)
    }
}

/// 单次引脚写入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub pin: u8,
    pub high: bool,
}

/// 录制所有写入的输出（测试与 dry-run 用）
#[derive(Debug, Default, Clone)]
pub struct RecordingOutput {
    writes: Vec<PinWrite>,
    levels: BTreeMap<u8, bool>,
    configured: Vec<u8>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有写入（按时间顺序）
    pub fn writes(&self) -> &[PinWrite] {
        &self.writes
    }

    /// 引脚当前电平（未写入过为低）
    pub fn level(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }

    /// 已配置为输出的引脚
    pub fn configured(&self) -> &[u8] {
        &self.configured
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl DigitalOutput for RecordingOutput {
    fn configure_output(&mut self, pin: u8) -> Result<(), DriverError> {
        self.configured.push(pin);
        Ok(())
    }

    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        self.writes.push(PinWrite { pin, high });
        self.levels.insert(pin, high);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_output_tracks_levels() {
        let mut out = RecordingOutput::new();
        assert!(!out.level(7));
        out.write_pin(7, true).unwrap();
        out.write_pin(8, false).unwrap();
        assert!(out.level(7));
        assert!(!out.level(8));
        assert_eq!(
            out.writes(),
            &[PinWrite { pin: 7, high: true }, PinWrite { pin: 8, high: false }]
        );
        out.clear_writes();
        assert!(out.writes().is_empty());
        assert!(out.level(7));
    }

    #[test]
    fn test_boxed_output_forwards() {
        let mut out: Box<dyn DigitalOutput> = Box::new(RecordingOutput::new());
        out.configure_output(3).unwrap();
        out.write_pin(3, true).unwrap();
    }
}
