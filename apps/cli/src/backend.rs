//! 硬件 / 仿真后端组装
//!
//! - 仿真：`SimRig`（虚拟时钟 + 实时等待），不需要跟踪进程
//! - 硬件：Firmata 串口板 + 外部跟踪进程（stdout 输出文本帧）

use anyhow::{Context, Result};
use basket_client::sim::{SimRig, SimSettings};
use basket_client::{
    BasketConfig, BasketStateMachine, CancelToken, CommandDispatcher, ControlSettings, MotionController,
    Sleeper, ThreadSleeper,
};
use basket_driver::{Actuators, DigitalOutput};
use basket_vision::{LineFeed, ObservationSlot, PositionEstimator, TrackerThread};
use std::io::BufReader;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use tracing::{info, warn};

pub type BoxedDispatcher = CommandDispatcher<Box<dyn DigitalOutput>, Box<dyn Sleeper>>;

/// 后端选择
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    pub sim: bool,
    pub tracker_cmd: Option<String>,
    pub spin: bool,
}

/// 外部跟踪进程 + 读取线程
pub struct TrackerProcess {
    child: Child,
    thread: Option<TrackerThread>,
}

impl TrackerProcess {
    /// 通过 `sh -c` 启动跟踪进程，读取其 stdout
    pub fn spawn(command: &str, slot: Arc<ObservationSlot>) -> Result<Self> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start tracker: {}", command))?;
        let stdout = child.stdout.take().context("Tracker stdout is not piped")?;

        let thread = TrackerThread::spawn(LineFeed::new(BufReader::new(stdout)), slot)?;
        info!("Tracker process {} started: {}", child.id(), command);
        Ok(Self {
            child,
            thread: Some(thread),
        })
    }

    pub fn thread(&self) -> Option<&TrackerThread> {
        self.thread.as_ref()
    }
}

impl Drop for TrackerProcess {
    fn drop(&mut self) {
        // 先结束进程，读取线程在管道关闭后退出
        if let Err(e) = self.child.kill() {
            warn!("Failed to kill tracker process: {}", e);
        }
        let _ = self.child.wait();
        if let Some(thread) = self.thread.take() {
            let stats = thread.stats();
            info!(
                "Tracker stopped: {} tracked, {} lost, {} malformed frames",
                stats.tracked, stats.lost, stats.malformed
            );
            thread.stop();
        }
    }
}

/// 观测来源（探测命令只需要这一部分）
pub struct Vision {
    pub slot: Arc<ObservationSlot>,
    pub sim: Option<SimRig>,
    pub tracker: Option<TrackerProcess>,
}

impl Vision {
    pub fn open(config: &BasketConfig, options: &BackendOptions) -> Result<Self> {
        if options.sim {
            let rig = SimRig::new(SimSettings {
                realtime: true,
                record_timeline: false,
                ..SimSettings::from_config(config)?
            });
            return Ok(Self {
                slot: rig.slot(),
                sim: Some(rig),
                tracker: None,
            });
        }

        let command = options
            .tracker_cmd
            .as_deref()
            .context("Hardware mode needs --tracker-cmd (or use --sim)")?;
        let slot = ObservationSlot::shared();
        let tracker = TrackerProcess::spawn(command, slot.clone())?;
        Ok(Self {
            slot,
            sim: None,
            tracker: Some(tracker),
        })
    }

    pub fn estimator(&self, config: &BasketConfig) -> Result<PositionEstimator> {
        Ok(PositionEstimator::new(
            self.slot.clone(),
            config.checkpoint_map()?,
            config.estimator_settings()?,
        ))
    }
}

/// 打开执行器输出
fn open_output(config: &BasketConfig, vision: &Vision) -> Result<Box<dyn DigitalOutput>> {
    if let Some(rig) = &vision.sim {
        return Ok(Box::new(rig.output()));
    }
    open_board(config)
}

#[cfg(feature = "serial")]
fn open_board(config: &BasketConfig) -> Result<Box<dyn DigitalOutput>> {
    let act = &config.actuators;
    info!("Opening Firmata board on {} ({} baud)", act.port, act.baud_rate);
    let board = basket_driver::FirmataBoard::open_serial(&act.port, act.baud_rate, act.settle())?;
    Ok(Box::new(board))
}

#[cfg(not(feature = "serial"))]
fn open_board(_config: &BasketConfig) -> Result<Box<dyn DigitalOutput>> {
    anyhow::bail!("Built without serial support; use --sim")
}

fn sleeper(vision: &Vision, options: &BackendOptions) -> Box<dyn Sleeper> {
    match (&vision.sim, options.spin) {
        (Some(rig), _) => Box::new(rig.sleeper()),
        (None, true) => Box::new(spin_sleep::SpinSleeper::default()),
        (None, false) => Box::new(ThreadSleeper),
    }
}

/// 组装分发器
pub fn dispatcher(
    config: &BasketConfig,
    control: ControlSettings,
    vision: &Vision,
    options: &BackendOptions,
    cancel: CancelToken,
) -> Result<BoxedDispatcher> {
    let output = open_output(config, vision)?;
    let actuators = Actuators::new(output, config.actuators.translation(), config.actuators.raise_lower())?;
    let controller = MotionController::new(actuators, vision.estimator(config)?, sleeper(vision, options), control);
    Ok(CommandDispatcher::with_cancel_token(
        controller,
        BasketStateMachine::new(),
        cancel,
    ))
}
