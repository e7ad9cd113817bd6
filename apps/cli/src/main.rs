//! # Basket CLI
//!
//! Command-line interface for the basket track robot.
//!
//! ## 命令会话
//!
//! ```bash
//! # 仿真装置（无硬件）
//! basket-cli run --sim
//!
//! # 硬件：Firmata 板 + 外部跟踪进程
//! basket-cli run --tracker-cmd "python3 tracker.py"
//!
//! # 接入规划器：每行一个 JSON 请求
//! planner | basket-cli run --tracker-cmd "./tracker"
//! ```
//!
//! ## 标定
//!
//! ```bash
//! basket-cli probe --tracker-cmd "./tracker" -n 20
//! basket-cli config init
//! basket-cli config check
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod backend;
mod commands;
mod modes;

use commands::{ConfigCommand, ProbeCommand, RunCommand};

/// Basket CLI - 吊篮机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "basket-cli")]
#[command(about = "Command-line interface for the basket track robot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 启动命令会话（stdin 读取命令）
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 打印当前观测相对各检查点的位置
    Probe {
        #[command(flatten)]
        args: ProbeCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志（日志写 stderr，stdout 留给状态输出）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("basket_cli=info,basket_client=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Run { args } => args.execute(),
        Commands::Probe { args } => args.execute(),
    }
}
