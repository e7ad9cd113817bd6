//! 仿真装置
//!
//! 用虚拟时钟代替真实硬件，供集成测试与 `basket-cli run --sim` 使用：
//!
//! - `SimOutput`：实现 `DigitalOutput`，记录带时间戳的引脚时间线
//! - `SimSleeper`：实现 `Sleeper`，推进虚拟时钟、积分被控对象，并向观测槽发布一帧
//! - 被控对象：沿线比例 `fraction` 与线下垂量 `droop`（像素，0 为贴线）
//!
//! 物理模型（每段时间内引脚电平恒定）：
//!
//! ```text
//! fraction += t * translation_speed * dt
//! droop    += t * sag_rate * dt - r * raise_speed * dt
//! sag_rate  = raise_speed / calibration_ratio
//! ```
//!
//! 其中 t、r ∈ {+1, 0, -1} 是平移轴与升降轴的方向。平移会带动吊篮下垂
//! （FORWARD 下垂、REVERSE 上提），按同一标定比例拆分周期的组合移动
//! 恰好抵消这部分变化。

use crate::config::BasketConfig;
use crate::controller::{ControlSettings, MotionController};
use crate::error::BasketError;
use crate::timing::Sleeper;
use basket_driver::{Actuators, DigitalOutput, DriverError, MotorPins};
use basket_protocol::{CheckpointMap, MotorDirection};
use basket_vision::{BoundingBox, EstimatorSettings, MotionLine, ObservationSlot, PositionEstimator};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// 仿真参数
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    /// 初始沿线比例
    pub start_fraction: f64,
    /// 初始下垂（像素），默认处于放下状态
    pub start_droop: f64,
    /// 平移速度（比例 / 秒）
    pub translation_speed: f64,
    /// 升降速度（像素 / 秒）
    pub raise_speed: f64,
    /// 被控对象真实的升降 / 平移响应比
    pub calibration_ratio: f64,
    pub max_droop: f64,
    /// 跟踪器抖动幅度（像素，均匀分布）
    pub jitter_px: f64,
    pub seed: u64,
    /// 同时按真实时间等待（交互演示用）
    pub realtime: bool,
    /// 记录引脚时间线（长时间运行的会话应关闭）
    pub record_timeline: bool,
    pub motion_line: MotionLine,
    pub translation_pins: MotorPins,
    pub raise_lower_pins: MotorPins,
    pub box_size: (f64, f64),
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            start_fraction: 0.0,
            start_droop: 120.0,
            translation_speed: 0.2,
            raise_speed: 200.0,
            calibration_ratio: 1.0,
            max_droop: 200.0,
            jitter_px: 0.0,
            seed: 7,
            realtime: false,
            record_timeline: true,
            motion_line: MotionLine::default(),
            translation_pins: MotorPins::new(7, 8),
            raise_lower_pins: MotorPins::new(12, 13),
            box_size: (40.0, 40.0),
        }
    }
}

impl SimSettings {
    /// 运动线、引脚与标定比例取自配置
    pub fn from_config(config: &BasketConfig) -> Result<Self, BasketError> {
        Ok(Self {
            motion_line: config.motion_line()?,
            translation_pins: config.actuators.translation(),
            raise_lower_pins: config.actuators.raise_lower(),
            calibration_ratio: config.control.calibration_ratio,
            ..Self::default()
        })
    }
}

/// 带虚拟时间戳的引脚写入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    pub at: Duration,
    pub pin: u8,
    pub high: bool,
}

#[derive(Debug)]
struct Plant {
    fraction: f64,
    droop: f64,
    now: Duration,
    levels: BTreeMap<u8, bool>,
    timeline: Vec<PinEvent>,
    record_timeline: bool,
    dropouts: u32,
    tracking_lost: bool,
    frames: u64,
    rng: StdRng,
}

impl Plant {
    fn level(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }

    /// 轴方向：+1 / 0 / -1（两个引脚同时为高视为不动）
    fn axis(&self, pins: MotorPins) -> f64 {
        match (self.level(pins.a), self.level(pins.b)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    fn advance(&mut self, settings: &SimSettings, dt: Duration) {
        let secs = dt.as_secs_f64();
        let t = self.axis(settings.translation_pins);
        let r = self.axis(settings.raise_lower_pins);
        let sag_rate = settings.raise_speed / settings.calibration_ratio;

        self.fraction = (self.fraction + t * settings.translation_speed * secs).clamp(0.0, 1.0);
        self.droop = (self.droop + t * sag_rate * secs - r * settings.raise_speed * secs)
            .clamp(0.0, settings.max_droop);
        self.now += dt;
    }

    fn frame(&mut self, settings: &SimSettings) -> Option<BoundingBox> {
        if self.dropouts > 0 {
            self.dropouts -= 1;
            return None;
        }
        if self.tracking_lost {
            return None;
        }
        let point = settings.motion_line.point_at(self.fraction);
        let (jx, jy) = if settings.jitter_px > 0.0 {
            let j = settings.jitter_px;
            (self.rng.gen_range(-j..=j), self.rng.gen_range(-j..=j))
        } else {
            (0.0, 0.0)
        };
        self.frames += 1;
        Some(BoundingBox::new(
            point.x + jx,
            point.y + self.droop + jy,
            settings.box_size.0,
            settings.box_size.1,
        ))
    }
}

/// 仿真装置
#[derive(Clone)]
pub struct SimRig {
    plant: Arc<Mutex<Plant>>,
    slot: Arc<ObservationSlot>,
    settings: Arc<SimSettings>,
}

impl SimRig {
    /// 创建仿真装置并发布初始帧
    pub fn new(settings: SimSettings) -> Self {
        let plant = Plant {
            fraction: settings.start_fraction.clamp(0.0, 1.0),
            droop: settings.start_droop.clamp(0.0, settings.max_droop),
            now: Duration::ZERO,
            levels: BTreeMap::new(),
            timeline: Vec::new(),
            record_timeline: settings.record_timeline,
            dropouts: 0,
            tracking_lost: false,
            frames: 0,
            rng: StdRng::seed_from_u64(settings.seed),
        };
        let rig = Self {
            plant: Arc::new(Mutex::new(plant)),
            slot: ObservationSlot::shared(),
            settings: Arc::new(settings),
        };
        rig.publish();
        rig
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn slot(&self) -> Arc<ObservationSlot> {
        self.slot.clone()
    }

    pub fn output(&self) -> SimOutput {
        SimOutput {
            plant: self.plant.clone(),
        }
    }

    pub fn sleeper(&self) -> SimSleeper {
        SimSleeper { rig: self.clone() }
    }

    /// 以给定参数组装控制器（执行器接在仿真输出上）
    pub fn controller(
        &self,
        checkpoints: CheckpointMap,
        estimator: EstimatorSettings,
        control: ControlSettings,
    ) -> Result<MotionController<SimOutput, SimSleeper>, BasketError> {
        let actuators = Actuators::new(
            self.output(),
            self.settings.translation_pins,
            self.settings.raise_lower_pins,
        )?;
        let estimator = PositionEstimator::new(self.slot(), checkpoints, estimator);
        Ok(MotionController::new(actuators, estimator, self.sleeper(), control))
    }

    /// 按配置组装控制器
    pub fn controller_from_config(
        &self,
        config: &BasketConfig,
    ) -> Result<MotionController<SimOutput, SimSleeper>, BasketError> {
        self.controller(
            config.checkpoint_map()?,
            config.estimator_settings()?,
            config.control_settings(),
        )
    }

    /// 把当前被控对象状态发布到观测槽
    pub fn publish(&self) {
        let frame = self.plant.lock().frame(&self.settings);
        match frame {
            Some(bbox) => self.slot.publish(bbox),
            None => self.slot.clear(),
        }
    }

    /// 直接放置吊篮并发布
    pub fn place(&self, fraction: f64, droop: f64) {
        {
            let mut plant = self.plant.lock();
            plant.fraction = fraction.clamp(0.0, 1.0);
            plant.droop = droop.clamp(0.0, self.settings.max_droop);
        }
        self.publish();
    }

    /// 接下来 `frames` 次发布都是“丢失跟踪”
    pub fn drop_frames(&self, frames: u32) {
        self.plant.lock().dropouts = frames;
    }

    /// 持续丢失跟踪，直到 `restore_tracking`
    pub fn lose_tracking(&self) {
        self.plant.lock().tracking_lost = true;
        self.slot.clear();
    }

    pub fn restore_tracking(&self) {
        self.plant.lock().tracking_lost = false;
        self.publish();
    }

    pub fn fraction(&self) -> f64 {
        self.plant.lock().fraction
    }

    pub fn droop(&self) -> f64 {
        self.plant.lock().droop
    }

    /// 虚拟时钟
    pub fn now(&self) -> Duration {
        self.plant.lock().now
    }

    /// 已发布的有效帧数
    pub fn frames_published(&self) -> u64 {
        self.plant.lock().frames
    }

    pub fn timeline(&self) -> Vec<PinEvent> {
        self.plant.lock().timeline.clone()
    }

    pub fn clear_timeline(&self) {
        self.plant.lock().timeline.clear();
    }

    /// 某个轴的方向变化序列 `(时间, 新方向)`，由引脚时间线回放得到
    pub fn axis_timeline(&self, pins: MotorPins) -> Vec<(Duration, MotorDirection)> {
        let plant = self.plant.lock();
        let mut levels = (false, false);
        let mut current = MotorDirection::Still;
        let mut changes = Vec::new();

        for event in &plant.timeline {
            if event.pin == pins.a {
                levels.0 = event.high;
            } else if event.pin == pins.b {
                levels.1 = event.high;
            } else {
                continue;
            }
            let direction = match levels {
                (true, false) => MotorDirection::Forward,
                (false, true) => MotorDirection::Reverse,
                _ => MotorDirection::Still,
            };
            if direction != current {
                current = direction;
                changes.push((event.at, direction));
            }
        }
        changes
    }
}

/// 仿真数字输出
pub struct SimOutput {
    plant: Arc<Mutex<Plant>>,
}

impl DigitalOutput for SimOutput {
    fn write_pin(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        let mut plant = self.plant.lock();
        let at = plant.now;
        plant.levels.insert(pin, high);
        if plant.record_timeline {
            plant.timeline.push(PinEvent { at, pin, high });
        }
        trace!("sim pin {} -> {} at {:?}", pin, high, at);
        Ok(())
    }
}

/// 虚拟时钟等待
pub struct SimSleeper {
    rig: SimRig,
}

impl Sleeper for SimSleeper {
    fn sleep(&self, duration: Duration) {
        self.rig.plant.lock().advance(&self.rig.settings, duration);
        self.rig.publish();
        if self.rig.settings.realtime {
            std::thread::sleep(duration);
        }
    }
}
