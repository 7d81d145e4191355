//! 碰撞求解
//!
//! 每个粒子与其所在单元及 26 个相邻单元中的粒子做相交检测，
//! 沿分离方向按质量倒数比例推开。这是松弛法，不保证一次收敛。
//!
//! - 单线程：Gauss-Seidel，每个无序粒子对只访问一次，修正立即生效
//! - 多线程：Jacobi，每个粒子基于位置快照计算自己的修正量，只写自身

use super::grid::{Grid, NEIGHBOR_OFFSETS};
use super::particle::{Contact, Particle};
use glam::Vec3;
use rayon::prelude::*;

/// 单线程求解一轮，返回处理的接触数
pub fn solve_sequential(particles: &mut [Particle], grid: &Grid) -> usize {
    let mut contacts = 0;

    for i in 0..particles.len() {
        let coord = grid.cell_coord(particles[i].position());

        for offset in NEIGHBOR_OFFSETS {
            for &j in grid.cell_items(coord + offset) {
                let j = j as usize;
                // 每对只处理一次
                if j <= i || j >= particles.len() {
                    continue;
                }

                let (head, tail) = particles.split_at_mut(j);
                let (a, b) = (&mut head[i], &mut tail[0]);
                if let Some(contact) = a.intersect(b) {
                    separate(a, b, &contact);
                    contacts += 1;
                }
            }
        }
    }

    contacts
}

/// 多线程求解一轮，返回处理的接触数（近似值：每对在两端各计一次后折半）
///
/// `snapshot` 是复用的暂存缓冲，避免每轮分配。
pub fn solve_parallel(particles: &mut [Particle], grid: &Grid, snapshot: &mut Vec<Particle>) -> usize {
    snapshot.clear();
    snapshot.extend_from_slice(particles);
    let snapshot = snapshot.as_slice();

    let contacts: usize = particles
        .par_iter_mut()
        .enumerate()
        .map(|(i, particle)| {
            let current = snapshot[i];
            let coord = grid.cell_coord(current.position());
            let inverse_mass = current.inverse_mass();

            let mut correction = Vec3::ZERO;
            let mut contacts = 0usize;

            for offset in NEIGHBOR_OFFSETS {
                for &j in grid.cell_items(coord + offset) {
                    let j = j as usize;
                    if j == i {
                        continue;
                    }
                    let Some(other) = snapshot.get(j) else {
                        continue;
                    };
                    if let Some(contact) = current.intersect(other) {
                        let share = inverse_mass / (inverse_mass + other.inverse_mass());
                        correction += contact.normal * contact.overlap * share;
                        contacts += 1;
                    }
                }
            }

            // 多个接触取平均，防止过冲
            if contacts > 0 {
                particle.set_position(current.position() + correction / contacts as f32);
            }
            contacts
        })
        .sum();

    contacts / 2
}

/// 沿接触法线按质量倒数比例分开两个粒子
pub fn separate(a: &mut Particle, b: &mut Particle, contact: &Contact) {
    let inverse_a = a.inverse_mass();
    let inverse_b = b.inverse_mass();
    let correction = contact.normal * (contact.overlap / (inverse_a + inverse_b));

    a.set_position(a.position() + correction * inverse_a);
    b.set_position(b.position() - correction * inverse_b);
}

/// 把粒子钳制进模拟盒 `[radius, size - radius]`
pub fn correct_to_bounds(particle: &mut Particle, size: Vec3) {
    let min = Vec3::splat(particle.radius());
    let max = (size - min).max(min);
    particle.clamp_to(min, max);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;

    fn grid_for(particles: &[Particle], size: UVec3) -> Grid {
        let mut grid = Grid::new(size);
        grid.rebuild(particles.iter().map(Particle::position));
        grid
    }

    #[test]
    fn test_separate_equal_masses() {
        let mut a = Particle::new(Vec3::new(2.0, 2.0, 2.0));
        let mut b = Particle::new(Vec3::new(2.6, 2.0, 2.0));
        let contact = a.intersect(&b).unwrap();
        separate(&mut a, &mut b, &contact);

        assert!((a.position().x - 1.8).abs() < 1e-5);
        assert!((b.position().x - 2.8).abs() < 1e-5);
        assert!(a.intersect(&b).is_none() || a.intersect(&b).unwrap().overlap < 1e-5);
    }

    #[test]
    fn test_separate_inverse_mass_ratio() {
        let mut light = Particle::with_mass(Vec3::ZERO, 1.0);
        let mut heavy = Particle::with_mass(Vec3::new(0.0, 0.5, 0.0), 3.0);
        let contact = light.intersect(&heavy).unwrap();
        separate(&mut light, &mut heavy, &contact);

        // 穿透 0.5，轻粒子移动 3/4，重粒子移动 1/4
        assert!((light.position().y + 0.375).abs() < 1e-5);
        assert!((heavy.position().y - 0.625).abs() < 1e-5);
    }

    #[test]
    fn test_sequential_resolves_pair_in_one_iteration() {
        let mut particles = vec![
            Particle::new(Vec3::new(3.0, 3.0, 3.0)),
            Particle::new(Vec3::new(3.4, 3.0, 3.0)),
        ];
        let grid = grid_for(&particles, UVec3::splat(6));

        assert_eq!(solve_sequential(&mut particles, &grid), 1);
        let distance = particles[0].position().distance(particles[1].position());
        assert!((distance - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_parallel_converges() {
        let mut particles = vec![
            Particle::new(Vec3::new(3.0, 3.0, 3.0)),
            Particle::new(Vec3::new(3.0, 3.3, 3.0)),
            Particle::new(Vec3::new(3.3, 3.0, 3.0)),
        ];
        let grid = grid_for(&particles, UVec3::splat(6));
        let mut snapshot = Vec::new();

        let initial = worst_overlap(&particles);
        solve_parallel(&mut particles, &grid, &mut snapshot);
        assert!(worst_overlap(&particles) < initial);

        for _ in 0..50 {
            solve_parallel(&mut particles, &grid, &mut snapshot);
        }
        assert!(worst_overlap(&particles) < 1e-3);
    }

    #[test]
    fn test_far_particles_untouched() {
        let mut particles = vec![
            Particle::new(Vec3::new(1.0, 1.0, 1.0)),
            Particle::new(Vec3::new(4.0, 4.0, 4.0)),
        ];
        let before = particles.clone();
        let grid = grid_for(&particles, UVec3::splat(6));

        assert_eq!(solve_sequential(&mut particles, &grid), 0);
        assert_eq!(particles, before);
    }

    #[test]
    fn test_correct_to_bounds() {
        let mut particle = Particle::new(Vec3::new(-1.0, 5.0, 12.0));
        correct_to_bounds(&mut particle, Vec3::splat(10.0));
        assert_eq!(particle.position(), Vec3::new(0.5, 5.0, 9.5));
    }

    fn worst_overlap(particles: &[Particle]) -> f32 {
        let mut worst = 0.0f32;
        for (i, a) in particles.iter().enumerate() {
            for b in &particles[i + 1..] {
                if let Some(contact) = a.intersect(b) {
                    worst = worst.max(contact.overlap);
                }
            }
        }
        worst
    }
}
