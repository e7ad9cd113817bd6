//! run 命令
//!
//! 启动后端并进入命令会话

use anyhow::Result;
use basket_client::CancelToken;
use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::info;

use crate::backend::{self, BackendOptions, Vision};
use crate::commands::config::load_config;
use crate::modes::session::{SessionInput, run_session};

/// 会话命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 配置文件（覆盖默认路径）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 使用仿真装置代替硬件
    #[arg(long)]
    pub sim: bool,

    /// 跟踪进程命令（stdout 每行一帧：`x y w h` 或 `lost`）
    #[arg(short, long)]
    pub tracker_cmd: Option<String>,

    /// 使用自旋补偿等待（更精确的周期拆分）
    #[arg(long)]
    pub spin: bool,

    /// 关闭看门狗（丢失跟踪时无限等待）
    #[arg(long)]
    pub no_watchdog: bool,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        let (config, source) = load_config(self.config.as_deref())?;
        match &source {
            Some(path) => info!("Using config {}", path.display()),
            None => info!("Using built-in default config"),
        }

        let mut control = config.control_settings();
        if self.no_watchdog {
            control.max_absent_polls = None;
        }

        let options = BackendOptions {
            sim: self.sim,
            tracker_cmd: self.tracker_cmd.clone(),
            spin: self.spin,
        };

        // Ctrl+C：第一次取消当前操作，空闲时再按一次退出
        let cancel = CancelToken::new();
        install_interrupt_handler(cancel.clone())?;

        let vision = Vision::open(&config, &options)?;
        let mut dispatcher = backend::dispatcher(&config, control, &vision, &options, cancel)?;

        let input = SessionInput::spawn(std::io::stdin().is_terminal())?;
        run_session(&mut dispatcher, &input)
    }
}

fn install_interrupt_handler(cancel: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            eprintln!("\n退出");
            std::process::exit(130);
        }
        eprintln!("\n🛑 取消当前操作（再按一次 Ctrl+C 退出）");
        cancel.cancel();
    })?;
    Ok(())
}
