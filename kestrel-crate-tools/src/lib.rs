//! Kestrel 工具集
//!
//! 提供日志初始化等跨 crate 的通用工具。
//!
//! # 日志
//! [`init_log::init_log`] 配置全局 logger：彩色等级、时间戳、来源位置。
//! 各 bin 与测试入口统一调用，保证输出格式一致。

pub mod init_log;
