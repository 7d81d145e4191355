//! 粒子云：粒子存储 + 空间网格 + 每步编排
//!
//! 每个子步严格按顺序执行：
//! 1. 施加外部加速度（`acceleration * mass`）
//! 2. Verlet 积分
//! 3. 清空并重建网格（始终单线程）
//! 4. 碰撞求解 `solver_iterations` 轮
//! 5. 钳制到模拟盒
//!
//! 多线程模式下 1、2、4、5 在固定的工作线程池上按粒子区间并行，
//! 每个阶段完成后才进入下一阶段。

use super::grid::Grid;
use super::particle::Particle;
use super::solver::{correct_to_bounds, solve_parallel, solve_sequential};
use crate::config::PhysicsConfig;
use crate::core::{PhysicsError, PhysicsResult};
use crate::impl_default;
use glam::{UVec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;

/// 求解参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// 每次 `update` 的子步数
    pub physics_iterations: u32,
    /// 每个子步的碰撞松弛轮数
    pub solver_iterations: u32,
    /// 网格单元容量
    pub cell_capacity: usize,
    /// 工作线程数（0 表示按 CPU 核数）
    pub worker_threads: usize,
}

impl_default!(SolverParams {
    physics_iterations: 3,
    solver_iterations: 2,
    cell_capacity: super::DEFAULT_CELL_CAPACITY,
    worker_threads: 0,
});

impl From<&PhysicsConfig> for SolverParams {
    fn from(config: &PhysicsConfig) -> Self {
        Self {
            physics_iterations: config.physics_iterations,
            solver_iterations: config.solver_iterations,
            cell_capacity: config.cell_capacity,
            worker_threads: config.worker_threads,
        }
    }
}

/// 单次 `update` 的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// 所有子步、所有松弛轮中处理的接触数
    pub contacts: usize,
    /// 因单元已满未进入网格的粒子数（最后一个子步）
    pub dropped: usize,
}

/// 粒子云物理引擎
pub struct ParticleCloud {
    size: UVec3,
    bounds: Vec3,
    particles: Vec<Particle>,
    grid: Grid,
    params: SolverParams,
    pool: ThreadPool,
    snapshot: Vec<Particle>,
    last_step: StepReport,
}

impl ParticleCloud {
    /// 创建粒子云，`generator` 按序号生成每个粒子
    ///
    /// 网格任一维为零、粒子数为零、迭代次数为零或粒子质量非正时直接失败。
    pub fn new<F>(size: UVec3, count: usize, params: SolverParams, mut generator: F) -> PhysicsResult<Self>
    where
        F: FnMut(usize) -> Particle,
    {
        if size.cmpeq(UVec3::ZERO).any() {
            return Err(PhysicsError::ZeroGridSize(size.to_array()));
        }
        if count == 0 {
            return Err(PhysicsError::EmptyCloud);
        }
        if count > u32::MAX as usize {
            return Err(PhysicsError::InvalidParameter(format!(
                "particle count {} exceeds grid index range",
                count
            )));
        }
        if params.physics_iterations == 0 || params.solver_iterations == 0 {
            return Err(PhysicsError::InvalidParameter(
                "iteration counts must be greater than zero".to_string(),
            ));
        }
        if params.cell_capacity == 0 {
            return Err(PhysicsError::InvalidParameter(
                "cell capacity must be greater than zero".to_string(),
            ));
        }

        let mut particles = Vec::with_capacity(count);
        for index in 0..count {
            let particle = generator(index);
            if !(particle.mass() > 0.0 && particle.mass().is_finite()) {
                return Err(PhysicsError::InvalidMass {
                    index,
                    mass: particle.mass(),
                });
            }
            particles.push(particle);
        }

        let threads = if params.worker_threads == 0 {
            num_cpus::get()
        } else {
            params.worker_threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("physics-worker-{}", i))
            .build()
            .map_err(|e| PhysicsError::WorkerPool(e.to_string()))?;

        tracing::debug!(
            target: "physics",
            particles = count,
            size = ?size,
            workers = threads,
            "Particle cloud created"
        );

        Ok(Self {
            size,
            bounds: size.as_vec3(),
            particles,
            grid: Grid::with_capacity(size, params.cell_capacity),
            params,
            pool,
            snapshot: Vec::with_capacity(count),
            last_step: StepReport::default(),
        })
    }

    /// 在 `[0.5, size - 0.5]` 内均匀随机放置静止粒子
    pub fn scatter(size: UVec3, count: usize, params: SolverParams, seed: u64) -> PhysicsResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let max = (size.as_vec3() - Vec3::splat(0.5)).max(Vec3::splat(0.5));

        Self::new(size, count, params, |_| {
            Particle::new(Vec3::new(
                rng.gen_range(0.5..=max.x),
                rng.gen_range(0.5..=max.y),
                rng.gen_range(0.5..=max.z),
            ))
        })
    }

    /// 推进一帧
    ///
    /// 帧时长 `dt` 均分给 `physics_iterations` 个子步。
    pub fn update(&mut self, acceleration: Vec3, dt: f32, single_threaded: bool) {
        let substeps = self.params.physics_iterations.max(1);
        let h = dt / substeps as f32;
        let mut report = StepReport::default();

        let Self {
            bounds,
            particles,
            grid,
            params,
            pool,
            snapshot,
            ..
        } = self;

        for _ in 0..substeps {
            if single_threaded {
                report.contacts +=
                    Self::substep_sequential(particles, grid, *params, *bounds, acceleration, h);
            } else {
                report.contacts += pool.install(|| {
                    Self::substep_parallel(particles, grid, snapshot, *params, *bounds, acceleration, h)
                });
            }
            report.dropped = grid.dropped();
        }

        if report.dropped > 0 {
            tracing::trace!(target: "physics", dropped = report.dropped, "Grid overflow this step");
        }
        self.last_step = report;
    }

    fn substep_sequential(
        particles: &mut [Particle],
        grid: &mut Grid,
        params: SolverParams,
        bounds: Vec3,
        acceleration: Vec3,
        h: f32,
    ) -> usize {
        // 施力与积分对每个粒子独立，合并为一次遍历
        for particle in particles.iter_mut() {
            particle.apply_force(acceleration * particle.mass());
            particle.integrate(h);
        }

        grid.rebuild(particles.iter().map(Particle::position));

        let mut contacts = 0;
        for _ in 0..params.solver_iterations {
            contacts += solve_sequential(particles, grid);
        }

        for particle in particles.iter_mut() {
            correct_to_bounds(particle, bounds);
        }
        contacts
    }

    fn substep_parallel(
        particles: &mut [Particle],
        grid: &mut Grid,
        snapshot: &mut Vec<Particle>,
        params: SolverParams,
        bounds: Vec3,
        acceleration: Vec3,
        h: f32,
    ) -> usize {
        particles.par_iter_mut().for_each(|particle| {
            particle.apply_force(acceleration * particle.mass());
            particle.integrate(h);
        });

        // 多个线程同时写同一单元会产生竞争，重建保持单线程
        grid.rebuild(particles.iter().map(Particle::position));

        let mut contacts = 0;
        for _ in 0..params.solver_iterations {
            contacts += solve_parallel(particles, grid, snapshot);
        }

        particles
            .par_iter_mut()
            .for_each(|particle| correct_to_bounds(particle, bounds));
        contacts
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// 可变访问粒子（仅限拥有者线程，例如测试中摆放粒子）
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// 网格尺寸
    pub fn size(&self) -> UVec3 {
        self.size
    }

    /// 模拟盒尺寸（浮点）
    pub fn bounds(&self) -> Vec3 {
        self.bounds
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> SolverParams {
        self.params
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// 在物理工作线程池上执行 `op`，其中的并行迭代共用同一线程池
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    pub fn last_step(&self) -> StepReport {
        self.last_step
    }
}
