use glam::Vec3;

/// 粒子半径（网格单元为 1，一个粒子正好占一个单元）
pub const PARTICLE_RADIUS: f32 = 0.5;

/// 两个粒子接触时的碰撞信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// 从对方指向自身的单位分离方向
    pub normal: Vec3,
    /// 两粒子中心距离
    pub distance: f32,
    /// 穿透深度（半径之和 - 距离）
    pub overlap: f32,
}

/// Verlet 积分的质点
///
/// 速度不单独保存，而是由 `position - previous` 隐式给出。
/// 直接修改位置（例如碰撞修正或瞬移）会改变下一步的隐式速度。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    position: Vec3,
    previous: Vec3,
    forces: Vec3,
    mass: f32,
}

impl Particle {
    /// 创建静止的单位质量粒子
    pub fn new(position: Vec3) -> Self {
        Self::with_mass(position, 1.0)
    }

    /// 创建指定质量的静止粒子
    pub fn with_mass(position: Vec3, mass: f32) -> Self {
        Self {
            position,
            previous: position,
            forces: Vec3::ZERO,
            mass,
        }
    }

    /// 创建带初速度的粒子，`velocity` 以每步位移计
    pub fn with_velocity(position: Vec3, velocity: Vec3) -> Self {
        Self {
            previous: position - velocity,
            ..Self::new(position)
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn previous_position(&self) -> Vec3 {
        self.previous
    }

    /// 瞬移到新位置，保留上一位置（会产生隐式速度）
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn forces(&self) -> Vec3 {
        self.forces
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    pub fn radius(&self) -> f32 {
        PARTICLE_RADIUS
    }

    /// 隐式速度（每步位移）
    pub fn velocity(&self) -> Vec3 {
        self.position - self.previous
    }

    /// 累加外力，不产生位移
    pub fn apply_force(&mut self, force: Vec3) {
        self.forces += force;
    }

    /// Verlet 积分一步并清空力累加器
    pub fn integrate(&mut self, dt: f32) {
        let acceleration = self.forces / self.mass;
        let velocity = self.position - self.previous;

        self.previous = self.position;
        self.position += velocity + acceleration * dt * dt;
        self.forces = Vec3::ZERO;
    }

    /// 相交检测：距离小于半径之和时返回接触信息
    pub fn intersect(&self, other: &Particle) -> Option<Contact> {
        let delta = self.position - other.position;
        let radius_sum = self.radius() + other.radius();
        let distance_sq = delta.length_squared();

        if distance_sq >= radius_sum * radius_sum {
            return None;
        }

        let distance = distance_sq.sqrt();
        // 重合的粒子沿固定轴分开，保证结果确定
        let normal = if distance > f32::EPSILON {
            delta / distance
        } else {
            Vec3::Y
        };

        Some(Contact {
            normal,
            distance,
            overlap: radius_sum - distance,
        })
    }

    /// 按轴钳制到 `[min, max]`，被钳制的轴隐式速度归零
    pub fn clamp_to(&mut self, min: Vec3, max: Vec3) {
        for axis in 0..3 {
            let value = self.position[axis];
            let clamped = value.clamp(min[axis], max[axis]);
            if clamped != value {
                self.position[axis] = clamped;
                self.previous[axis] = clamped;
            }
        }
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
