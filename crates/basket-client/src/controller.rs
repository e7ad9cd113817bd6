//! 闭环运动控制器
//!
//! 采样 → 动作 → 等待 的同步循环，三种模式：
//!
//! - **Lower**：相对 home 检查点轮询；已放下则停止，否则升降轴 REVERSE
//! - **Raise**：相对当前位置检查点轮询；已升起则停止，否则升降轴 FORWARD
//! - **MoveTo**：相对目标检查点轮询；AT 则停止，LEFT-OF 两轴 FORWARD，
//!   RIGHT-OF 两轴 REVERSE，并按标定比例拆分周期
//!
//! 观测缺失的周期不改变电机命令，只等待一个周期后重试。
//! 任何模式退出时（成功、取消、看门狗、I/O 错误）两个轴都置为 STILL。

use crate::cancel::CancelToken;
use crate::error::BasketError;
use crate::machine::Operation;
use crate::timing::Sleeper;
use basket_driver::{Actuators, Axis, DigitalOutput};
use basket_protocol::{Checkpoint, Location, MotorDirection};
use basket_vision::{PositionEstimator, PositionObservation, RelativeSide};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// 连续缺失多少次打一条 warn
const ABSENT_WARN_INTERVAL: u32 = 50;

/// 控制参数
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    /// 控制周期
    pub period: Duration,
    /// 标定比例 r：升降响应 / 平移响应
    ///
    /// - r > 1：升降更快，组合移动时升降轴在 `period / r` 后停止
    /// - r < 1：平移更快，平移轴在 `period * r` 后停止
    /// - r = 1：两轴都跑满周期
    pub calibration_ratio: f64,
    /// 看门狗：连续缺失观测的上限，`None` 表示无限重试
    pub max_absent_polls: Option<u32>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            calibration_ratio: 1.0,
            max_absent_polls: Some(300),
        }
    }
}

impl ControlSettings {
    /// 组合移动中较快轴的运行时长，以及需要提前停止的轴
    pub fn split(&self) -> Option<(Axis, Duration)> {
        let r = self.calibration_ratio;
        if r > 1.0 {
            Some((Axis::RaiseLower, self.period.mul_f64(1.0 / r)))
        } else if r < 1.0 {
            Some((Axis::Translation, self.period.mul_f64(r)))
        } else {
            None
        }
    }
}

/// 单次操作的执行报告
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    pub operation: Operation,
    /// 轮询次数（含最后一次满足条件的轮询）
    pub ticks: u32,
    /// 其中观测缺失的次数
    pub absent_polls: u32,
    /// 名义耗时（周期数 × 周期）
    pub elapsed: Duration,
}

impl OperationReport {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            ticks: 0,
            absent_polls: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// 记一次轮询（计数饱和，不会溢出）
    fn count_poll(&mut self, absent: bool) {
        self.ticks = self.ticks.saturating_add(1);
        if absent {
            self.absent_polls = self.absent_polls.saturating_add(1);
        }
    }
}

impl fmt::Display for OperationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} finished after {} polls ({} absent, {:?})",
            self.operation, self.ticks, self.absent_polls, self.elapsed
        )
    }
}

/// 单个周期的决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickAction {
    /// 条件满足，退出模式
    Finish,
    /// 只驱动升降轴
    RaiseLower(MotorDirection),
    /// 两轴同向驱动（组合移动）
    Combined(MotorDirection),
}

/// 闭环运动控制器
///
/// 独占执行器；估计器是观测槽的只读视图。
pub struct MotionController<O, S> {
    actuators: Actuators<O>,
    estimator: PositionEstimator,
    sleeper: S,
    settings: ControlSettings,
}

impl<O: DigitalOutput, S: Sleeper> MotionController<O, S> {
    pub fn new(
        actuators: Actuators<O>,
        estimator: PositionEstimator,
        sleeper: S,
        settings: ControlSettings,
    ) -> Self {
        Self {
            actuators,
            estimator,
            sleeper,
            settings,
        }
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ControlSettings {
        &mut self.settings
    }

    pub fn estimator(&self) -> &PositionEstimator {
        &self.estimator
    }

    pub fn actuators(&self) -> &Actuators<O> {
        &self.actuators
    }

    /// 执行一个原子操作
    ///
    /// `current` 是操作开始时的位置（Raise 相对它的检查点轮询）。
    pub fn execute(
        &mut self,
        operation: Operation,
        current: Location,
        cancel: &CancelToken,
    ) -> Result<OperationReport, BasketError> {
        match operation {
            Operation::Lower => self.lower(cancel),
            Operation::Raise => self.raise(current, cancel),
            Operation::MoveTo(target) => self.move_to(target, cancel),
        }
    }

    /// 放下吊篮（相对 home 检查点轮询）
    pub fn lower(&mut self, cancel: &CancelToken) -> Result<OperationReport, BasketError> {
        self.run(Operation::Lower, Checkpoint::HOME, cancel, |obs| {
            if obs.lowered {
                TickAction::Finish
            } else {
                TickAction::RaiseLower(MotorDirection::Reverse)
            }
        })
    }

    /// 升起吊篮（相对当前位置的检查点轮询）
    pub fn raise(&mut self, current: Location, cancel: &CancelToken) -> Result<OperationReport, BasketError> {
        let checkpoint = self.estimator.checkpoints().checkpoint_of(current);
        self.run(Operation::Raise, checkpoint, cancel, |obs| {
            if obs.lowered {
                TickAction::RaiseLower(MotorDirection::Forward)
            } else {
                TickAction::Finish
            }
        })
    }

    /// 移动到目标位置（调用方保证吊篮已升起）
    pub fn move_to(&mut self, target: Location, cancel: &CancelToken) -> Result<OperationReport, BasketError> {
        let checkpoint = self.estimator.checkpoints().checkpoint_of(target);
        self.run(Operation::MoveTo(target), checkpoint, cancel, |obs| match obs.side {
            RelativeSide::At => TickAction::Finish,
            RelativeSide::LeftOf => TickAction::Combined(MotorDirection::Forward),
            RelativeSide::RightOf => TickAction::Combined(MotorDirection::Reverse),
        })
    }

    /// 两个轴都置为 STILL
    pub fn stop(&mut self) -> Result<(), BasketError> {
        Ok(self.actuators.stop_all()?)
    }

    fn run<F>(
        &mut self,
        operation: Operation,
        checkpoint: Checkpoint,
        cancel: &CancelToken,
        decide: F,
    ) -> Result<OperationReport, BasketError>
    where
        F: Fn(&PositionObservation) -> TickAction,
    {
        info!("Starting {} (checkpoint {})", operation, checkpoint);
        let mut report = OperationReport::new(operation);
        let result = self.poll_loop(&mut report, checkpoint, cancel, decide);

        // 无论如何退出，都先停两个轴
        let stopped = self.actuators.stop_all();
        match result {
            Ok(()) => {
                stopped?;
                info!("{}", report);
                Ok(report)
            },
            Err(e) => {
                if let Err(stop_err) = stopped {
                    error!("Failed to stop motors after {}: {}", operation, stop_err);
                }
                warn!("{} aborted after {} polls: {}", operation, report.ticks, e);
                Err(e)
            },
        }
    }

    fn poll_loop<F>(
        &mut self,
        report: &mut OperationReport,
        checkpoint: Checkpoint,
        cancel: &CancelToken,
        decide: F,
    ) -> Result<(), BasketError>
    where
        F: Fn(&PositionObservation) -> TickAction,
    {
        let period = self.settings.period;
        let mut consecutive_absent = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(BasketError::Cancelled);
            }
            let observation = self.estimator.query(checkpoint);
            report.count_poll(observation.is_none());

            let Some(observation) = observation else {
                consecutive_absent = consecutive_absent.saturating_add(1);

                if self
                    .settings
                    .max_absent_polls
                    .is_some_and(|max| consecutive_absent >= max)
                {
                    error!(
                        "No tracker observation for {} consecutive polls, stopping {}",
                        consecutive_absent, report.operation
                    );
                    return Err(BasketError::TrackingLost { consecutive_absent });
                }
                if consecutive_absent % ABSENT_WARN_INTERVAL == 0 {
                    warn!("Tracker observation absent for {} consecutive polls", consecutive_absent);
                }

                // 不改变电机命令
                self.sleeper.sleep(period);
                report.elapsed += period;
                continue;
            };
            consecutive_absent = 0;

            let action = decide(&observation);
            debug!(
                "tick {}: {} lowered={} -> {:?}",
                report.ticks, observation.side, observation.lowered, action
            );

            match action {
                TickAction::Finish => return Ok(()),
                TickAction::RaiseLower(direction) => {
                    self.actuators.set(Axis::RaiseLower, direction)?;
                    self.sleeper.sleep(period);
                },
                TickAction::Combined(direction) => self.combined_tick(direction)?,
            }
            report.elapsed += period;
        }
    }

    /// 组合移动的一个周期：两轴同向启动，较快的轴提前停止
    fn combined_tick(&mut self, direction: MotorDirection) -> Result<(), BasketError> {
        self.actuators.set(Axis::Translation, direction)?;
        self.actuators.set(Axis::RaiseLower, direction)?;

        match self.settings.split() {
            Some((faster, run_for)) => {
                self.sleeper.sleep(run_for);
                self.actuators.set(faster, MotorDirection::Still)?;
                self.sleeper.sleep(self.settings.period.saturating_sub(run_for));
            },
            None => self.sleeper.sleep(self.settings.period),
        }
        Ok(())
    }
}
