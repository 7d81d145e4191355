//! 粒子密度场的等值面提取
//!
//! 体素域是物理网格四周各填充 `margin` 个格子后的盒子，粒子坐标整体平移
//! `margin`。每次 `generate` 完整重建：
//! 1. 用填充后的网格对粒子分桶
//! 2. 在每个格点上累加核函数 `(1 - d²/r²)²` 得到密度
//! 3. 由中心差分得到格点梯度
//! 4. 逐立方体做四面体剖分并输出三角形

use super::mesh::{MeshVertex, SurfaceMesh};
use super::tetra::{CORNER_OFFSETS, TETRAHEDRA};
use crate::config::SurfaceConfig;
use crate::core::{PhysicsError, PhysicsResult};
use crate::physics::{Grid, Particle};
use glam::{IVec3, UVec3, Vec3};
use rayon::prelude::*;
use std::array;

/// 单次提取的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceReport {
    /// 输出的三角形数
    pub triangles: usize,
    /// 因单元已满未参与密度采样的粒子数
    pub dropped: usize,
}

/// 等值面提取器
pub struct Isosurface {
    grid_size: UVec3,
    margin: u32,
    radius: f32,
    iso_level: f32,
    grid: Grid,
    points: UVec3,
    density: Vec<f32>,
    gradients: Vec<Vec3>,
    last_report: SurfaceReport,
}

impl Isosurface {
    /// 为 `grid_size` 大小的物理网格创建提取器
    pub fn new(grid_size: UVec3, config: &SurfaceConfig, cell_capacity: usize) -> PhysicsResult<Self> {
        if grid_size.cmpeq(UVec3::ZERO).any() {
            return Err(PhysicsError::ZeroGridSize(grid_size.to_array()));
        }
        if !(config.radius.is_finite() && config.radius > 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "density radius must be positive, got {}",
                config.radius
            )));
        }
        if !(config.iso_level.is_finite() && config.iso_level > 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "iso level must be positive, got {}",
                config.iso_level
            )));
        }
        if cell_capacity == 0 {
            return Err(PhysicsError::InvalidParameter(
                "cell capacity must be greater than zero".to_string(),
            ));
        }

        let (padded, points, lattice_len) =
            lattice_extent(grid_size, config.margin).ok_or_else(|| {
                PhysicsError::InvalidParameter(format!(
                    "grid {:?} padded by margin {} exceeds the addressable lattice",
                    grid_size.to_array(),
                    config.margin
                ))
            })?;

        tracing::debug!(
            target: "surface",
            padded = ?padded,
            lattice_points = lattice_len,
            "Isosurface extractor created"
        );

        Ok(Self {
            grid_size,
            margin: config.margin,
            radius: config.radius,
            iso_level: config.iso_level,
            grid: Grid::with_capacity(padded, cell_capacity),
            points,
            density: vec![0.0; lattice_len],
            gradients: vec![Vec3::ZERO; lattice_len],
            last_report: SurfaceReport::default(),
        })
    }

    /// 从当前粒子重建三角形网格
    ///
    /// `single_threaded` 为假时密度采样和剖分在当前 rayon 线程池上并行，
    /// 两种模式输出完全相同的网格。
    pub fn generate(&mut self, particles: &[Particle], single_threaded: bool) -> SurfaceMesh {
        let offset = Vec3::splat(self.margin as f32);
        self.grid
            .rebuild(particles.iter().map(|p| p.position() + offset));

        let kernel = DensityKernel {
            grid: &self.grid,
            particles,
            offset,
            radius: self.radius,
        };
        let points = self.points;

        if single_threaded {
            for (index, density) in self.density.iter_mut().enumerate() {
                *density = kernel.sample(lattice_point(points, index));
            }
        } else {
            self.density
                .par_iter_mut()
                .enumerate()
                .for_each(|(index, density)| *density = kernel.sample(lattice_point(points, index)));
        }

        let density = &self.density;
        if single_threaded {
            for (index, gradient) in self.gradients.iter_mut().enumerate() {
                *gradient = central_difference(density, points, lattice_point(points, index));
            }
        } else {
            self.gradients
                .par_iter_mut()
                .enumerate()
                .for_each(|(index, gradient)| {
                    *gradient = central_difference(density, points, lattice_point(points, index))
                });
        }

        let lattice = self.lattice();
        let slabs = points.z - 1;

        let mesh = if single_threaded {
            let mut mesh = SurfaceMesh::new();
            for z in 0..slabs {
                lattice.polygonize_slab(z, &mut mesh);
            }
            mesh
        } else {
            // 按 z 切片并行，切片按序拼接，结果与单线程一致
            let slabs: Vec<SurfaceMesh> = (0..slabs)
                .into_par_iter()
                .map(|z| {
                    let mut slab = SurfaceMesh::new();
                    lattice.polygonize_slab(z, &mut slab);
                    slab
                })
                .collect();
            let total = slabs.iter().map(Vec::len).sum();
            let mut mesh = SurfaceMesh::with_capacity(total);
            for slab in slabs {
                mesh.extend(slab);
            }
            mesh
        };

        self.last_report = SurfaceReport {
            triangles: mesh.len() / 3,
            dropped: self.grid.dropped(),
        };
        if self.last_report.dropped > 0 {
            tracing::trace!(
                target: "surface",
                dropped = self.last_report.dropped,
                "Density grid overflow"
            );
        }
        mesh
    }

    /// 物理网格尺寸
    pub fn grid_size(&self) -> UVec3 {
        self.grid_size
    }

    /// 填充后的体素盒尺寸，渲染端据此居中网格
    pub fn box_size(&self) -> Vec3 {
        (self.points - UVec3::ONE).as_vec3()
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn iso_level(&self) -> f32 {
        self.iso_level
    }

    /// 上一次 `generate` 采样得到的密度
    pub fn density_at(&self, point: UVec3) -> Option<f32> {
        if point.cmplt(self.points).all() {
            Some(self.density[lattice_index(self.points, point)])
        } else {
            None
        }
    }

    pub fn last_report(&self) -> SurfaceReport {
        self.last_report
    }

    fn lattice(&self) -> Lattice<'_> {
        Lattice {
            density: &self.density,
            gradients: &self.gradients,
            points: self.points,
            iso_level: self.iso_level,
        }
    }
}

/// 填充后的单元数、格点数和格点总数；格点下标须能用 `u32` 表示
fn lattice_extent(grid_size: UVec3, margin: u32) -> Option<(UVec3, UVec3, usize)> {
    let border = margin.checked_mul(2)?;
    let pad = |n: u32| n.checked_add(border);
    let padded = UVec3::new(pad(grid_size.x)?, pad(grid_size.y)?, pad(grid_size.z)?);
    let points = UVec3::new(
        padded.x.checked_add(1)?,
        padded.y.checked_add(1)?,
        padded.z.checked_add(1)?,
    );
    let len = points.x.checked_mul(points.y)?.checked_mul(points.z)?;
    Some((padded, points, len as usize))
}

fn lattice_index(points: UVec3, point: UVec3) -> usize {
    (point.x + points.x * (point.y + points.y * point.z)) as usize
}

fn lattice_point(points: UVec3, index: usize) -> UVec3 {
    let index = index as u32;
    UVec3::new(
        index % points.x,
        (index / points.x) % points.y,
        index / (points.x * points.y),
    )
}

/// 边界格点退化为单侧差分
fn central_difference(density: &[f32], points: UVec3, point: UVec3) -> Vec3 {
    let axis = |a: usize| {
        let mut lo = point;
        let mut hi = point;
        if point[a] > 0 {
            lo[a] -= 1;
        }
        if point[a] + 1 < points[a] {
            hi[a] += 1;
        }
        let span = (hi[a] - lo[a]) as f32;
        if span == 0.0 {
            0.0
        } else {
            (density[lattice_index(points, hi)] - density[lattice_index(points, lo)]) / span
        }
    };
    Vec3::new(axis(0), axis(1), axis(2))
}

struct DensityKernel<'a> {
    grid: &'a Grid,
    particles: &'a [Particle],
    offset: Vec3,
    radius: f32,
}

impl DensityKernel<'_> {
    fn sample(&self, point: UVec3) -> f32 {
        let point = point.as_vec3();
        let r2 = self.radius * self.radius;
        let lo = (point - Vec3::splat(self.radius)).floor().as_ivec3();
        let hi = (point + Vec3::splat(self.radius)).floor().as_ivec3();

        let mut density = 0.0;
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    for &index in self.grid.cell_items(IVec3::new(x, y, z)) {
                        let position = self.particles[index as usize].position() + self.offset;
                        let d2 = position.distance_squared(point);
                        if d2 < r2 {
                            let falloff = 1.0 - d2 / r2;
                            density += falloff * falloff;
                        }
                    }
                }
            }
        }
        density
    }
}

struct Lattice<'a> {
    density: &'a [f32],
    gradients: &'a [Vec3],
    points: UVec3,
    iso_level: f32,
}

impl Lattice<'_> {
    fn is_inside(&self, index: usize) -> bool {
        self.density[index] >= self.iso_level
    }

    fn polygonize_slab(&self, z: u32, out: &mut SurfaceMesh) {
        let cells = self.points - UVec3::ONE;
        for y in 0..cells.y {
            for x in 0..cells.x {
                let base = UVec3::new(x, y, z);
                let corners: [usize; 8] =
                    array::from_fn(|k| lattice_index(self.points, base + CORNER_OFFSETS[k]));
                let inside = corners.map(|index| self.is_inside(index));
                if inside.iter().all(|&v| v) || inside.iter().all(|&v| !v) {
                    continue;
                }

                for tetra in &TETRAHEDRA {
                    self.polygonize_tetra(tetra.map(|k| corners[k]), out);
                }
            }
        }
    }

    fn polygonize_tetra(&self, vertices: [usize; 4], out: &mut SurfaceMesh) {
        let mut inner = [0usize; 4];
        let mut outer = [0usize; 4];
        let (mut ni, mut no) = (0, 0);
        for index in vertices {
            if self.is_inside(index) {
                inner[ni] = index;
                ni += 1;
            } else {
                outer[no] = index;
                no += 1;
            }
        }

        match ni {
            1 => emit_triangle(
                [
                    self.edge_vertex(inner[0], outer[0]),
                    self.edge_vertex(inner[0], outer[1]),
                    self.edge_vertex(inner[0], outer[2]),
                ],
                out,
            ),
            3 => emit_triangle(
                [
                    self.edge_vertex(outer[0], inner[0]),
                    self.edge_vertex(outer[0], inner[1]),
                    self.edge_vertex(outer[0], inner[2]),
                ],
                out,
            ),
            2 => {
                // 四个交点按环序排列
                let quad = [
                    self.edge_vertex(inner[0], outer[0]),
                    self.edge_vertex(inner[0], outer[1]),
                    self.edge_vertex(inner[1], outer[1]),
                    self.edge_vertex(inner[1], outer[0]),
                ];
                emit_triangle([quad[0], quad[1], quad[2]], out);
                emit_triangle([quad[0], quad[2], quad[3]], out);
            }
            _ => {}
        }
    }

    /// 总是从线性下标较小的端点插值，公共边得到逐位相同的顶点
    fn edge_vertex(&self, a: usize, b: usize) -> MeshVertex {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (d_lo, d_hi) = (self.density[lo], self.density[hi]);
        let delta = d_hi - d_lo;
        let t = if delta.abs() > f32::EPSILON {
            ((self.iso_level - d_lo) / delta).clamp(0.0, 1.0)
        } else {
            0.5
        };

        let p_lo = lattice_point(self.points, lo).as_vec3();
        let p_hi = lattice_point(self.points, hi).as_vec3();
        let gradient = self.gradients[lo].lerp(self.gradients[hi], t);
        // 法线从密处指向疏处
        let normal = (-gradient).try_normalize().unwrap_or(Vec3::Y);

        MeshVertex::new(p_lo.lerp(p_hi, t), normal)
    }
}

fn emit_triangle(mut triangle: [MeshVertex; 3], out: &mut SurfaceMesh) {
    let [a, b, c] = triangle.map(|v| v.position());
    let face = (b - a).cross(c - a);
    if face == Vec3::ZERO {
        return;
    }

    let normals = triangle
        .iter()
        .fold(Vec3::ZERO, |sum, vertex| sum + vertex.normal());
    if face.dot(normals) < 0.0 {
        triangle.swap(1, 2);
    }
    out.extend_from_slice(&triangle);
}
