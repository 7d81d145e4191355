//! # Particle Surface
//!
//! A threaded particle cloud simulation that extracts a renderable isosurface
//! from the particle density every step.
//!
//! ## Features
//!
//! - **Verlet Physics**: position-based particles with a uniform bucket grid and
//!   relaxation collision solver, single- or multi-threaded
//! - **Isosurface Extraction**: density lattice over a padded voxel box, marching
//!   tetrahedra with gradient normals
//! - **Lock-free Hand-off**: double-buffered mesh publication and a sequence-locked
//!   acceleration input
//! - **Configuration**: TOML/JSON files with environment overrides
//!
//! ## Architecture Design
//!
//! The simulation runs on its own thread and owns every particle. The presentation
//! thread only reads the most recently published mesh and pushes sensor input:
//!
//! ```text
//! sensor → AccelerationInput → simulation thread
//!            ParticleCloud::update → Isosurface::generate → DoubleBuffer::swap
//!        → presentation thread: Simulation::update() → FrameView
//! ```
//!
//! ### Example
//!
//! ```no_run
//! use particle_surface::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::load_or_default();
//! let simulation = Simulation::new(config)?;
//! let frame = simulation.update();
//! println!("{} triangles", frame.triangle_count());
//! # Ok::<(), particle_surface::SimError>(())
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Error types, logging setup and shared macros
//! - [`config`]: Configuration loading and validation
//! - [`physics`]: Particles, grid, solver and particle cloud
//! - [`surface`]: Isosurface extraction and mesh layout
//! - [`sync`]: Lock-briefly double buffer and lock-free primitives
//! - [`input`]: External acceleration input
//! - [`simulation`]: Simulation thread and presentation interface

/// Error types, logging setup and shared macros
#[macro_use]
pub mod core;
/// Configuration system
pub mod config;
/// Particle physics
pub mod physics;
/// Isosurface extraction
pub mod surface;
/// Cross-thread synchronization primitives
pub mod sync;
/// External acceleration input
pub mod input;
/// Simulation loop and presentation interface
pub mod simulation;

pub use config::SimulationConfig;
pub use crate::core::{PhysicsError, SimError, SimResult};
pub use input::AccelerationInput;
pub use physics::{Particle, ParticleCloud};
pub use simulation::{FrameView, Simulation};
pub use surface::{Isosurface, MeshVertex};
