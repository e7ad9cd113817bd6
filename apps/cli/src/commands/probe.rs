//! probe 命令
//!
//! 周期性打印当前观测相对每个检查点的位置，用于标定运动线与阈值

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{BackendOptions, Vision};
use crate::commands::config::load_config;

/// 探测命令参数
#[derive(Args, Debug)]
pub struct ProbeCommand {
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 使用仿真装置
    #[arg(long)]
    pub sim: bool,

    /// 跟踪进程命令
    #[arg(short, long)]
    pub tracker_cmd: Option<String>,

    /// 采样次数
    #[arg(short = 'n', long, default_value_t = 10)]
    pub samples: u32,

    /// 采样间隔（毫秒）
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,
}

impl ProbeCommand {
    pub fn execute(&self) -> Result<()> {
        let (config, _) = load_config(self.config.as_deref())?;
        let options = BackendOptions {
            sim: self.sim,
            tracker_cmd: self.tracker_cmd.clone(),
            spin: false,
        };
        let vision = Vision::open(&config, &options)?;
        let estimator = vision.estimator(&config)?;
        let checkpoints = estimator.checkpoints().clone();

        for sample in 1..=self.samples {
            std::thread::sleep(Duration::from_millis(self.interval_ms));

            let Some(position) = estimator.locate() else {
                println!("[{}] 无观测", sample);
                continue;
            };
            println!(
                "[{}] 沿线 {:.3}，偏差 {:+.1} px",
                sample, position.fraction, position.deviation
            );
            for (checkpoint, fraction) in checkpoints.checkpoints() {
                let name = checkpoints
                    .location_at(checkpoint)
                    .map_or_else(|| "-".to_string(), |l| l.to_string());
                if let Some(obs) = estimator.query(checkpoint) {
                    println!(
                        "    {} {:<7} ({:.2}): {} {}",
                        checkpoint,
                        name,
                        fraction,
                        obs.side,
                        if obs.lowered { "LOWERED" } else { "RAISED" }
                    );
                }
            }
            if let Some(tracker) = vision.tracker.as_ref().and_then(|t| t.thread()) {
                let stats = tracker.stats();
                println!(
                    "    tracker: {} tracked / {} lost / {} malformed",
                    stats.tracked, stats.lost, stats.malformed
                );
            }
        }

        Ok(())
    }
}
