//! 命令定义和实现

pub mod config;
pub mod probe;
pub mod run;

pub use config::ConfigCommand;
pub use probe::ProbeCommand;
pub use run::RunCommand;
