//! 核心模块
//!
//! 包含：
//! - `error` - 错误类型定义
//! - `macros` - 通用宏
//! - 日志系统初始化

pub mod error;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{PhysicsError, PhysicsResult, SimError, SimResult};

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// 初始化日志系统
///
/// 配置tracing日志框架。`RUST_LOG`环境变量优先，未设置时使用配置中的日志级别。
/// 重复调用是安全的：已经安装过订阅者时直接返回。
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
    tracing::info!(target: "simulation", level = config.level.as_directive(), "Logging initialized");
}
