//! 运行模式

pub mod session;
