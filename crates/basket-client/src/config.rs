//! 启动配置（TOML）
//!
//! 所有字段都有默认值，空文件即默认配置：
//!
//! ```toml
//! [control]
//! period_ms = 100
//! calibration_ratio = 1.0
//! max_absent_polls = 300   # 0 = 关闭看门狗
//!
//! [vision]
//! motion_line = [[500.0, 50.0], [25.0, 100.0]]
//! position_tolerance = 0.05
//! lowered_threshold = 75.0
//!
//! [track]
//! checkpoints = [0.0, 0.5, 1.0]
//!
//! [track.locations]
//! DESK = 0
//! BED = 1
//! CLOSET = 2
//!
//! [actuators]
//! translation_pins = [7, 8]
//! raise_lower_pins = [12, 13]
//! port = "/dev/ttyACM0"
//! baud_rate = 57600
//! settle_ms = 5000
//! ```

use crate::controller::ControlSettings;
use basket_driver::MotorPins;
use basket_protocol::{Checkpoint, CheckpointMap, ProtocolError};
use basket_vision::{EstimatorSettings, MotionLine, Point, VisionError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Invalid track: {0}")]
    Track(#[from] ProtocolError),

    #[error("Invalid motion line: {0}")]
    MotionLine(#[from] VisionError),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// 控制循环参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// 控制周期（毫秒）
    pub period_ms: u64,
    /// 升降响应 / 平移响应
    pub calibration_ratio: f64,
    /// 连续丢失跟踪的最大轮询次数，0 表示无限重试
    pub max_absent_polls: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            period_ms: 100,
            calibration_ratio: 1.0,
            max_absent_polls: 300,
        }
    }
}

/// 视觉参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// 运动线两端（像素）
    pub motion_line: [[f64; 2]; 2],
    pub position_tolerance: f64,
    pub lowered_threshold: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            motion_line: [[500.0, 50.0], [25.0, 100.0]],
            position_tolerance: 0.05,
            lowered_threshold: 75.0,
        }
    }
}

/// 位置 → 检查点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationIndices {
    #[serde(rename = "DESK")]
    pub desk: usize,
    #[serde(rename = "BED")]
    pub bed: usize,
    #[serde(rename = "CLOSET")]
    pub closet: usize,
}

impl Default for LocationIndices {
    fn default() -> Self {
        Self {
            desk: 0,
            bed: 1,
            closet: 2,
        }
    }
}

/// 轨道参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// 检查点比例，下标 0 为 home
    pub checkpoints: Vec<f64>,
    pub locations: LocationIndices,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            checkpoints: vec![0.0, 0.5, 1.0],
            locations: LocationIndices::default(),
        }
    }
}

/// 执行器参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub translation_pins: [u8; 2],
    pub raise_lower_pins: [u8; 2],
    /// Firmata 板串口
    pub port: String,
    pub baud_rate: u32,
    /// 打开串口后等待板子复位（毫秒）
    pub settle_ms: u64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            translation_pins: [7, 8],
            raise_lower_pins: [12, 13],
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 57600,
            settle_ms: 5000,
        }
    }
}

impl ActuatorConfig {
    pub fn translation(&self) -> MotorPins {
        MotorPins::new(self.translation_pins[0], self.translation_pins[1])
    }

    pub fn raise_lower(&self) -> MotorPins {
        MotorPins::new(self.raise_lower_pins[0], self.raise_lower_pins[1])
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasketConfig {
    pub control: ControlConfig,
    pub vision: VisionConfig,
    pub track: TrackConfig,
    pub actuators: ActuatorConfig,
}

impl BasketConfig {
    /// 从文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 解析并校验
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 写入文件（自动创建父目录）
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = self.to_toml_string()?;
        std::fs::write(path, text).map_err(write_err)
    }

    /// 校验所有字段
    pub fn validate(&self) -> Result<(), ConfigError> {
        let control = &self.control;
        if control.period_ms == 0 {
            return Err(ConfigError::invalid("control.period_ms", "must be greater than 0"));
        }
        if !control.calibration_ratio.is_finite() || control.calibration_ratio <= 0.0 {
            return Err(ConfigError::invalid(
                "control.calibration_ratio",
                format!("must be a positive number, got {}", control.calibration_ratio),
            ));
        }

        let vision = &self.vision;
        if !(vision.position_tolerance > 0.0 && vision.position_tolerance <= 0.5) {
            return Err(ConfigError::invalid(
                "vision.position_tolerance",
                format!("must be in (0, 0.5], got {}", vision.position_tolerance),
            ));
        }
        if !vision.lowered_threshold.is_finite() || vision.lowered_threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "vision.lowered_threshold",
                format!("must be a positive number, got {}", vision.lowered_threshold),
            ));
        }
        self.motion_line()?;
        self.checkpoint_map()?;

        let act = &self.actuators;
        let pins = [
            act.translation_pins[0],
            act.translation_pins[1],
            act.raise_lower_pins[0],
            act.raise_lower_pins[1],
        ];
        for (i, pin) in pins.iter().enumerate() {
            if *pin > 127 {
                return Err(ConfigError::invalid("actuators", format!("pin {} is out of range 0-127", pin)));
            }
            if pins[..i].contains(pin) {
                return Err(ConfigError::invalid("actuators", format!("pin {} is used twice", pin)));
            }
        }
        if act.baud_rate == 0 {
            return Err(ConfigError::invalid("actuators.baud_rate", "must be greater than 0"));
        }

        Ok(())
    }

    pub fn motion_line(&self) -> Result<MotionLine, ConfigError> {
        let [[x0, y0], [x1, y1]] = self.vision.motion_line;
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(ConfigError::invalid("vision.motion_line", "coordinates must be finite"));
        }
        Ok(MotionLine::new(Point::new(x0, y0), Point::new(x1, y1))?)
    }

    pub fn checkpoint_map(&self) -> Result<CheckpointMap, ConfigError> {
        let loc = self.track.locations;
        Ok(CheckpointMap::new(
            self.track.checkpoints.clone(),
            [Checkpoint(loc.desk), Checkpoint(loc.bed), Checkpoint(loc.closet)],
        )?)
    }

    pub fn estimator_settings(&self) -> Result<EstimatorSettings, ConfigError> {
        Ok(EstimatorSettings {
            motion_line: self.motion_line()?,
            position_tolerance: self.vision.position_tolerance,
            lowered_threshold: self.vision.lowered_threshold,
        })
    }

    pub fn control_settings(&self) -> ControlSettings {
        ControlSettings {
            period: Duration::from_millis(self.control.period_ms),
            calibration_ratio: self.control.calibration_ratio,
            max_absent_polls: match self.control.max_absent_polls {
                0 => None,
                n => Some(n),
            },
        }
    }
}
