#[cfg(test)]
mod property_tests {
    use crate::physics::*;
    use glam::{IVec3, UVec3, Vec3};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn params(physics_iterations: u32, solver_iterations: u32) -> SolverParams {
        SolverParams {
            physics_iterations,
            solver_iterations,
            worker_threads: 2,
            ..SolverParams::default()
        }
    }

    fn acceleration() -> impl Strategy<Value = Vec3> {
        (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    fn position_in(size: f32) -> impl Strategy<Value = Vec3> {
        (0.0f32..size, 0.0f32..size, 0.0f32..size).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn particles_stay_in_bounds(
            seed in any::<u64>(),
            count in 1usize..120,
            gravity in acceleration(),
            single_threaded in any::<bool>()
        ) {
            let size = UVec3::new(6, 8, 5);
            let mut cloud = ParticleCloud::scatter(size, count, params(2, 2), seed).unwrap();
            for _ in 0..10 {
                cloud.update(gravity, 0.01, single_threaded);
            }

            let bounds = size.as_vec3();
            for particle in cloud.particles() {
                let p = particle.position();
                prop_assert!(p.is_finite());
                prop_assert!(p.cmpge(Vec3::ZERO).all(), "below bounds: {:?}", p);
                prop_assert!(p.cmple(bounds).all(), "above bounds: {:?}", p);
            }
        }

        #[test]
        fn grid_count_matches_capacity_limited_total(
            positions in prop::collection::vec(position_in(4.0), 0..200),
            capacity in 1usize..8
        ) {
            let mut grid = Grid::with_capacity(UVec3::splat(4), capacity);
            grid.rebuild(positions.iter().copied());

            let mut per_cell: HashMap<IVec3, usize> = HashMap::new();
            for position in &positions {
                *per_cell.entry(grid.cell_coord(*position)).or_default() += 1;
            }
            let expected: usize = per_cell.values().map(|&n| n.min(capacity)).sum();

            prop_assert_eq!(grid.count(), expected);
            prop_assert_eq!(grid.count() + grid.dropped(), positions.len());
        }
    }

    #[test]
    fn two_particles_separate_toward_radius_sum() {
        let start = [Vec3::new(3.0, 3.0, 3.0), Vec3::new(3.0, 3.0, 3.7)];
        let mut particles: Vec<Particle> = start.iter().copied().map(Particle::new).collect();
        let mut grid = Grid::new(UVec3::splat(6));
        grid.rebuild(particles.iter().map(Particle::position));

        let radius_sum = 2.0 * PARTICLE_RADIUS;
        let mut distance = start[0].distance(start[1]);
        for _ in 0..3 {
            solve_sequential(&mut particles, &grid);
            let next = particles[0].position().distance(particles[1].position());
            assert!(next >= distance - 1e-6);
            assert!(next <= radius_sum + 1e-5);
            distance = next;
        }
        assert!((radius_sum - distance).abs() < 1e-4);
    }

    #[test]
    fn two_particles_separate_in_force_free_step() {
        let mut cloud = ParticleCloud::new(UVec3::splat(6), 2, params(1, 1), |i| {
            Particle::new(Vec3::new(3.0 + 0.3 * i as f32, 3.0, 3.0))
        })
        .unwrap();
        cloud.update(Vec3::ZERO, 0.01, true);

        let particles = cloud.particles();
        let distance = particles[0].position().distance(particles[1].position());
        assert!((distance - 2.0 * PARTICLE_RADIUS).abs() < 1e-4);
        assert_eq!(cloud.last_step().contacts, 1);
    }

    #[test]
    fn free_fall_matches_analytic_solution() {
        let p0 = Vec3::new(5.0, 90.0, 5.0);
        let gravity = DEFAULT_GRAVITY;
        let dt = 0.01;
        let steps = 100;

        for physics_iterations in [1, 3] {
            let mut cloud = ParticleCloud::new(
                UVec3::new(10, 100, 10),
                1,
                params(physics_iterations, 2),
                |_| Particle::new(p0),
            )
            .unwrap();
            for _ in 0..steps {
                cloud.update(gravity, dt, true);
            }

            let t = steps as f32 * dt;
            let expected = p0 + 0.5 * gravity * t * t;
            let actual = cloud.particles()[0].position();
            // Verlet 从静止起步的误差是 O(dt)
            let tolerance = gravity.length() * dt * t;
            assert!(
                (actual - expected).length() < tolerance,
                "iterations {}: expected {:?}, got {:?}",
                physics_iterations,
                expected,
                actual
            );
        }
    }

    #[test]
    fn same_seed_is_bit_identical() {
        for single_threaded in [true, false] {
            let run = || {
                let mut cloud =
                    ParticleCloud::scatter(UVec3::new(8, 6, 8), 300, params(3, 2), 1234).unwrap();
                for step in 0..30 {
                    let tilt = Vec3::new((step as f32 * 0.1).sin() * 5.0, -9.8, 0.0);
                    cloud.update(tilt, 0.01, single_threaded);
                }
                cloud
                    .particles()
                    .iter()
                    .map(|p| p.position().to_array().map(f32::to_bits))
                    .collect::<Vec<_>>()
            };
            assert_eq!(run(), run(), "single_threaded = {}", single_threaded);
        }
    }

    #[test]
    fn dense_cell_degrades_without_failing() {
        let params = SolverParams {
            cell_capacity: 4,
            ..params(1, 2)
        };
        let mut cloud = ParticleCloud::new(UVec3::splat(3), 10, params, |_| {
            Particle::new(Vec3::splat(1.5))
        })
        .unwrap();
        cloud.update(Vec3::ZERO, 0.01, true);

        assert_eq!(cloud.grid().count() + cloud.last_step().dropped, 10);
        assert!(cloud.last_step().dropped > 0);
        for particle in cloud.particles() {
            assert!(particle.position().is_finite());
        }
    }
}
