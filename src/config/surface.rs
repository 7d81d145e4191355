use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 填充格子数上限
pub const MAX_MARGIN: u32 = 64;

/// 等值面提取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// 体素网格在物理网格四周额外填充的格子数
    pub margin: u32,

    /// 密度采样半径（以网格单元为单位）
    pub radius: f32,

    /// 等值面阈值，密度 >= 阈值 视为内部
    pub iso_level: f32,
}

impl_default!(SurfaceConfig {
    margin: 2,
    radius: 1.5,
    iso_level: 0.5,
});

impl SurfaceConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "surface.radius must be a positive number, got {}",
                self.radius
            )));
        }
        if !(self.iso_level.is_finite() && self.iso_level > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "surface.iso_level must be a positive number, got {}",
                self.iso_level
            )));
        }
        // 边界格点的密度必须为零，网格外沿才能闭合
        if (self.margin as f32) < self.radius {
            return Err(ConfigError::ValidationError(format!(
                "surface.margin ({}) must be at least surface.radius ({})",
                self.margin, self.radius
            )));
        }
        if self.margin > MAX_MARGIN {
            return Err(ConfigError::ValidationError(format!(
                "surface.margin must not exceed {}, got {}",
                MAX_MARGIN, self.margin
            )));
        }
        Ok(())
    }
}
