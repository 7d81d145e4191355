//! Particle physics: Verlet particles, the uniform bucket grid, the relaxation
//! collision solver and the cloud that orchestrates them.

pub mod cloud;
pub mod grid;
pub mod particle;
pub mod solver;

#[cfg(test)]
mod tests;

pub use cloud::{ParticleCloud, SolverParams, StepReport};
pub use grid::{Grid, GridCell, DEFAULT_CELL_CAPACITY, NEIGHBOR_OFFSETS};
pub use particle::{Contact, Particle, PARTICLE_RADIUS};
pub use solver::{correct_to_bounds, separate, solve_parallel, solve_sequential};

/// Default external acceleration (gravity along -Y).
pub const DEFAULT_GRAVITY: glam::Vec3 = glam::Vec3::new(0.0, -9.8, 0.0);
