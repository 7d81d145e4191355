use super::{ConfigError, ConfigResult};
use crate::impl_default;
use crate::physics::DEFAULT_CELL_CAPACITY;
use serde::{Deserialize, Serialize};

/// 物理配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// 网格宽度（x 和 z 方向的格子数，y 方向由视口宽高比推出）
    pub grid_width: usize,

    /// 粒子数量
    pub particles_count: usize,

    /// 每帧的物理子步数
    pub physics_iterations: u32,

    /// 每个子步的碰撞松弛迭代次数
    pub solver_iterations: u32,

    /// 每帧时间步长（秒）
    pub time_step: f32,

    /// 每个网格单元最多容纳的粒子数
    #[serde(default = "default_cell_capacity")]
    pub cell_capacity: usize,

    /// 多线程模式的工作线程数（0 表示按 CPU 核数）
    #[serde(default)]
    pub worker_threads: usize,

    /// 初始布局的随机种子（为空时使用当前时间）
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_cell_capacity() -> usize {
    DEFAULT_CELL_CAPACITY
}

impl_default!(PhysicsConfig {
    grid_width: 24,
    particles_count: 4000,
    physics_iterations: 3,
    solver_iterations: 2,
    time_step: 0.01,
    cell_capacity: DEFAULT_CELL_CAPACITY,
    worker_threads: 0,
    seed: None,
});

impl PhysicsConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.grid_width == 0 {
            return Err(ConfigError::ValidationError(
                "physics.grid_width must be greater than zero".to_string(),
            ));
        }
        if self.grid_width > u32::MAX as usize {
            return Err(ConfigError::ValidationError(format!(
                "physics.grid_width must not exceed {}",
                u32::MAX
            )));
        }
        if self.particles_count == 0 {
            return Err(ConfigError::ValidationError(
                "physics.particles_count must be greater than zero".to_string(),
            ));
        }
        if self.particles_count > u32::MAX as usize {
            return Err(ConfigError::ValidationError(format!(
                "physics.particles_count must not exceed {}",
                u32::MAX
            )));
        }
        if self.physics_iterations == 0 || self.solver_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "physics iteration counts must be greater than zero".to_string(),
            ));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "physics.time_step must be a positive number, got {}",
                self.time_step
            )));
        }
        if self.cell_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "physics.cell_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
