/// 统一配置系统
///
/// 提供TOML/JSON配置文件和环境变量覆盖。配置在模拟启动时读取一次，之后不可变。
use glam::UVec3;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod physics;
pub mod surface;

pub use physics::PhysicsConfig;
pub use surface::SurfaceConfig;

use crate::impl_default;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 模拟主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 是否单线程求解
    pub single_thread: bool,

    /// 物理配置
    pub physics: PhysicsConfig,

    /// 等值面配置
    #[serde(default)]
    pub surface: SurfaceConfig,

    /// 视口尺寸（决定网格的 y 方向大小）
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl_default!(SimulationConfig {
    single_thread: true,
    physics: PhysicsConfig::default(),
    surface: SurfaceConfig::default(),
    viewport: ViewportConfig::default(),
    logging: LoggingConfig::default(),
});

impl SimulationConfig {
    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 按扩展名加载配置文件（`.json` 走 JSON，其余按 TOML 解析）
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("SIM_SINGLE_THREAD") {
            self.single_thread = val.parse().unwrap_or(self.single_thread);
        }
        if let Ok(val) = env::var("SIM_PARTICLES_COUNT") {
            if let Ok(count) = val.parse() {
                self.physics.particles_count = count;
            }
        }
        if let Ok(val) = env::var("SIM_GRID_WIDTH") {
            if let Ok(width) = val.parse() {
                self.physics.grid_width = width;
            }
        }
        if let Ok(val) = env::var("SIM_SEED") {
            if let Ok(seed) = val.parse() {
                self.physics.seed = Some(seed);
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.physics.validate()?;
        self.surface.validate()?;
        self.viewport.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// 物理网格尺寸
    ///
    /// x、z 等于 `grid_width`，y 按视口宽高比缩放（至少为 1）。
    pub fn grid_size(&self) -> UVec3 {
        // 超出 u32 的宽度在校验时被拒绝，这里饱和而不是截断
        let width = u32::try_from(self.physics.grid_width).unwrap_or(u32::MAX);
        let height = (width as f32 * self.viewport.height as f32 / self.viewport.width as f32)
            as u32;
        UVec3::new(width, height.max(1), width)
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./config.toml
    /// 2. ./configs/simulation.json
    /// 3. <用户配置目录>/particle_surface/config.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        for path in Self::search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!(target: "config", path = %path.display(), "Loaded configuration");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(target: "config", path = %path.display(), "Ignoring config file: {}", e);
                }
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("config.toml"),
            PathBuf::from("configs").join("simulation.json"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("particle_surface").join("config.toml"));
        }
        paths
    }
}

/// 视口配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl_default!(ViewportConfig {
    width: 1280,
    height: 720,
});

impl ViewportConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// 性能统计日志的最短输出间隔（毫秒）
pub const MIN_STATS_INTERVAL_MS: u64 = 1000;

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,

    /// 性能统计日志的输出间隔（毫秒）
    pub stats_interval_ms: u64,
}

impl_default!(LoggingConfig {
    level: LogLevel::Info,
    stats_interval_ms: 1000,
});

impl LoggingConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.stats_interval_ms < MIN_STATS_INTERVAL_MS {
            return Err(ConfigError::ValidationError(format!(
                "logging.stats_interval_ms must be at least {}, got {}",
                MIN_STATS_INTERVAL_MS, self.stats_interval_ms
            )));
        }
        Ok(())
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 转换为 `EnvFilter` 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
