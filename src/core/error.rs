//! 统一错误处理模块
//!
//! ## 错误类型分层
//!
//! - **配置错误** (`config::ConfigError`): 文件读取、解析和校验失败
//! - **物理错误** (`PhysicsError`): 粒子云构造参数非法、线程池创建失败
//! - **模拟错误** (`SimError`): 顶层错误，同时包含线程启动/回收失败
//!
//! 所有构造期错误都是不可恢复的：构造函数直接返回错误，不会留下半初始化的对象。

use crate::config::ConfigError;
use thiserror::Error;

/// 模拟核心错误类型
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Failed to spawn simulation thread: {0}")]
    ThreadSpawn(String),

    #[error("Simulation thread panicked: {0}")]
    ThreadJoin(String),
}

/// 物理系统错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Particle cloud must contain at least one particle")]
    EmptyCloud,

    #[error("Grid size must be non-zero on every axis, got {0:?}")]
    ZeroGridSize([u32; 3]),

    #[error("Invalid physics parameter: {0}")]
    InvalidParameter(String),

    #[error("Particle {index} has non-positive mass {mass}")]
    InvalidMass { index: usize, mass: f32 },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// 模拟结果类型别名
pub type SimResult<T> = Result<T, SimError>;
pub type PhysicsResult<T> = Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let physics_err = PhysicsError::EmptyCloud;
        let sim_err: SimError = physics_err.into();
        assert!(matches!(sim_err, SimError::Physics(PhysicsError::EmptyCloud)));

        let config_err = ConfigError::ValidationError("grid_width must be > 0".to_string());
        let sim_err: SimError = config_err.into();
        assert!(matches!(sim_err, SimError::Config(_)));
    }

    #[test]
    fn test_file_errors_surface_as_config_errors() {
        let missing = std::env::temp_dir().join("particle_surface_missing").join("config.toml");
        let sim_err: SimError = crate::config::SimulationConfig::from_toml_file(missing)
            .unwrap_err()
            .into();
        assert!(matches!(sim_err, SimError::Config(ConfigError::FileError(_))));
    }

    #[test]
    fn test_error_display() {
        let err = PhysicsError::InvalidMass { index: 3, mass: 0.0 };
        assert_eq!(err.to_string(), "Particle 3 has non-positive mass 0");

        let err = PhysicsError::ZeroGridSize([0, 4, 4]);
        assert_eq!(
            err.to_string(),
            "Grid size must be non-zero on every axis, got [0, 4, 4]"
        );
    }
}
