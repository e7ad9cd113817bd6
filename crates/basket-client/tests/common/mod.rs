//! 集成测试公共设施：仿真装置 + 分发器

#![allow(dead_code)]

use basket_client::sim::{SimOutput, SimRig, SimSettings, SimSleeper};
use basket_client::{
    BasketStateMachine, CancelToken, CommandDispatcher, ControlSettings, MotionController, Sleeper,
};
use basket_driver::Actuators;
use basket_protocol::{BasketPosition, CheckpointMap, Location, MotorDirection, RobotState};
use basket_vision::{EstimatorSettings, PositionEstimator};
use std::cell::Cell;
use std::time::Duration;

pub const PERIOD: Duration = Duration::from_millis(100);

/// 升起状态下的下垂量（低于 75 px 阈值）
pub const RAISED_DROOP: f64 = 20.0;
/// 放下状态下的下垂量
pub const LOWERED_DROOP: f64 = 120.0;

pub struct Harness {
    pub rig: SimRig,
    pub dispatcher: CommandDispatcher<SimOutput, SimSleeper>,
}

/// 仿真装置 + 分发器
pub fn harness(sim: SimSettings, control: ControlSettings, initial: RobotState) -> Harness {
    let rig = SimRig::new(sim);
    let controller = rig
        .controller(CheckpointMap::default(), EstimatorSettings::default(), control)
        .unwrap();
    let dispatcher = CommandDispatcher::new(controller, BasketStateMachine::with_state(initial));
    rig.clear_timeline();
    Harness { rig, dispatcher }
}

/// 吊篮位于某个位置的检查点，升起或放下
pub fn at(location: Location, position: BasketPosition) -> Harness {
    at_with(location, position, ControlSettings::default(), 1.0)
}

/// 同上，可指定控制参数与被控对象的真实标定比例
pub fn at_with(
    location: Location,
    position: BasketPosition,
    control: ControlSettings,
    plant_ratio: f64,
) -> Harness {
    let sim = SimSettings {
        start_fraction: CheckpointMap::default().fraction_of(location),
        start_droop: droop_for(position),
        calibration_ratio: plant_ratio,
        ..Default::default()
    };
    harness(sim, control, RobotState::new(location, position))
}

pub fn droop_for(position: BasketPosition) -> f64 {
    match position {
        BasketPosition::Raised => RAISED_DROOP,
        BasketPosition::Lowered => LOWERED_DROOP,
    }
}

pub fn control_with_ratio(ratio: f64) -> ControlSettings {
    ControlSettings {
        calibration_ratio: ratio,
        ..Default::default()
    }
}

/// 某个轴在时间线上处于 `direction` 的各段时长
pub fn run_lengths(changes: &[(Duration, MotorDirection)], direction: MotorDirection) -> Vec<Duration> {
    changes
        .windows(2)
        .filter(|w| w[0].1 == direction)
        .map(|w| w[1].0 - w[0].0)
        .collect()
}

/// 第 N 次 sleep 之后触发取消的等待器
pub struct CancelAfter<S> {
    pub inner: S,
    pub token: CancelToken,
    pub remaining: Cell<u32>,
}

impl<S: Sleeper> Sleeper for CancelAfter<S> {
    fn sleep(&self, duration: Duration) {
        self.inner.sleep(duration);
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 {
            self.token.cancel();
        }
    }
}

/// 在 `sleeps` 次等待之后取消的分发器
pub fn cancelling_dispatcher(
    rig: &SimRig,
    initial: RobotState,
    sleeps: u32,
) -> CommandDispatcher<SimOutput, CancelAfter<SimSleeper>> {
    let settings = rig.settings();
    let actuators = Actuators::new(rig.output(), settings.translation_pins, settings.raise_lower_pins).unwrap();
    let estimator = PositionEstimator::new(rig.slot(), CheckpointMap::default(), EstimatorSettings::default());
    let token = CancelToken::new();
    let sleeper = CancelAfter {
        inner: rig.sleeper(),
        token: token.clone(),
        remaining: Cell::new(sleeps),
    };
    let controller = MotionController::new(actuators, estimator, sleeper, ControlSettings::default());
    CommandDispatcher::with_cancel_token(controller, BasketStateMachine::with_state(initial), token)
}
