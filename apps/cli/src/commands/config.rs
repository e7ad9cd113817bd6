//! 配置管理命令
//!
//! 查找顺序：`--config` → `<config_dir>/basket/config.toml` → 内置默认值

use anyhow::{Context, Result};
use basket_client::BasketConfig;
use clap::Subcommand;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("无法确定配置目录")?;
    path.push("basket");
    path.push("config.toml");
    Ok(path)
}

/// 加载配置，返回实际使用的文件（`None` 表示内置默认值）
pub fn load_config(explicit: Option<&Path>) -> Result<(BasketConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = BasketConfig::load(path).with_context(|| format!("加载配置失败: {}", path.display()))?;
        return Ok((config, Some(path.to_path_buf())));
    }

    match default_config_path() {
        Ok(path) if path.exists() => {
            let config =
                BasketConfig::load(&path).with_context(|| format!("加载配置失败: {}", path.display()))?;
            Ok((config, Some(path)))
        },
        _ => Ok((BasketConfig::default(), None)),
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置文件
    Init {
        /// 目标路径（默认为用户配置目录）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 打印生效的配置（TOML）
    Show {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 校验配置
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(path, force),
            ConfigCommand::Show { config } => Self::show_(config.as_deref()),
            ConfigCommand::Check { config } => Self::check_(config.as_deref()),
        }
    }

    fn init_(path: Option<PathBuf>, force: bool) -> Result<()> {
        let path = match path {
            Some(path) => path,
            None => default_config_path()?,
        };
        if path.exists() && !force {
            anyhow::bail!("{} 已存在（使用 --force 覆盖）", path.display());
        }

        BasketConfig::default().save(&path).context("写入配置文件失败")?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(config: Option<&Path>) -> Result<()> {
        let (config, source) = load_config(config)?;
        match source {
            Some(path) => println!("# {}", path.display()),
            None => println!("# 内置默认配置"),
        }
        print!("{}", config.to_toml_string()?);
        Ok(())
    }

    fn check_(config: Option<&Path>) -> Result<()> {
        let (config, source) = load_config(config)?;
        let source = source.map_or_else(|| "内置默认配置".to_string(), |p| p.display().to_string());
        println!("配置文件: {}", source);

        let control = config.control_settings();
        let checkpoints = config.checkpoint_map()?;
        println!("  控制周期: {:?}", control.period);
        println!("  标定比例: {}", control.calibration_ratio);
        match control.max_absent_polls {
            Some(n) => println!("  看门狗: {} 次连续缺失", n),
            None => println!("  看门狗: 关闭"),
        }
        for location in basket_protocol::Location::ALL {
            println!(
                "  {:<7} → 检查点 {} ({:.2})",
                location,
                checkpoints.checkpoint_of(location),
                checkpoints.fraction_of(location)
            );
        }
        println!(
            "  执行器: {} @ {} baud, 平移 {:?}, 升降 {:?}",
            config.actuators.port,
            config.actuators.baud_rate,
            config.actuators.translation_pins,
            config.actuators.raise_lower_pins
        );
        println!("✅ 配置有效");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[control]\nperiod_ms = 40\n").unwrap();

        let (config, source) = load_config(Some(&path)).unwrap();
        assert_eq!(config.control.period_ms, 40);
        assert_eq!(source, Some(path));
    }

    #[test]
    fn test_load_invalid_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[control]\nperiod_ms = 0\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        ConfigCommand::Init {
            path: Some(path.clone()),
            force: false,
        }
        .execute()
        .unwrap();
        assert!(BasketConfig::load(&path).is_ok());

        let again = ConfigCommand::Init {
            path: Some(path.clone()),
            force: false,
        }
        .execute();
        assert!(again.is_err());

        ConfigCommand::Init {
            path: Some(path),
            force: true,
        }
        .execute()
        .unwrap();
    }
}
