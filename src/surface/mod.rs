//! Isosurface extraction: samples the particle density over a padded voxel
//! lattice and emits a flat triangle list for the renderer.

pub mod isosurface;
pub mod mesh;
pub mod tetra;

pub use isosurface::{Isosurface, SurfaceReport};
pub use mesh::{as_bytes, AttributeFormat, MeshVertex, SurfaceMesh, VertexAttribute, VertexLayout};
