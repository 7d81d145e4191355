use glam::Vec3;
use particle_surface::core::init_logging;
use particle_surface::{SimResult, Simulation, SimulationConfig};
use std::thread;
use std::time::{Duration, Instant};

/// 无窗口的展示端：轮询网格并模拟一个缓慢旋转的重力传感器
fn run(seconds: f32) -> SimResult<()> {
    let mut config = SimulationConfig::load_or_default();
    config.apply_env_overrides();
    init_logging(&config.logging);

    let mut simulation = Simulation::new(config)?;
    let start = Instant::now();
    let duration = Duration::from_secs_f32(seconds);
    let mut last_step = 0;
    let mut last_log = start;

    while start.elapsed() < duration {
        let angle = start.elapsed().as_secs_f32() * 0.5;
        simulation.on_sensors_event(Vec3::new(angle.sin(), -angle.cos(), 0.0) * 9.8);

        let frame = simulation.update();
        if frame.step() != last_step && last_log.elapsed() >= Duration::from_secs(1) {
            tracing::info!(
                target: "simulation",
                step = frame.step(),
                triangles = frame.triangle_count(),
                bytes = frame.as_bytes().len(),
                "Presented frame"
            );
            last_log = Instant::now();
        }
        last_step = frame.step();

        thread::sleep(Duration::from_millis(16));
    }

    simulation.shutdown()
}

fn main() {
    let seconds = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(5.0);

    if let Err(e) = run(seconds) {
        eprintln!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}
