//! 模拟循环与展示端接口
//!
//! ```text
//! ┌──────────────────────┐  on_sensors_event  ┌───────────────────────┐
//! │  Presentation Thread │───────────────────►│   AccelerationInput   │
//! │                      │                    └──────────┬────────────┘
//! │   update()           │                               ▼
//! │     │                │                    ┌───────────────────────┐
//! │     ▼                │   get (Acquire)    │   Simulation Thread   │
//! │   FrameView ◄────────┼────────────────────│ cloud → isosurface →  │
//! │                      │                    │ swap (Release)        │
//! └──────────────────────┘                    └───────────────────────┘
//! ```
//!
//! 构造即启动模拟线程，`Drop` 时协作式关闭并回收线程。

mod runner;
pub mod stats;

pub use stats::{PhaseStats, StatsReport, StepStats};

use crate::config::SimulationConfig;
use crate::core::{SimError, SimResult};
use crate::input::AccelerationInput;
use crate::physics::{ParticleCloud, SolverParams};
use crate::surface::{as_bytes, Isosurface, MeshVertex, SurfaceMesh, VertexAttribute, VertexLayout};
use crate::sync::{DoubleBuffer, LockFreeFlag};
use crossbeam_channel::{unbounded, Sender};
use glam::{UVec3, Vec3};
use runner::SimulationRunner;
use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 发送给模拟线程的命令
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulationCommand {
    /// 切换单线程/多线程求解
    SetSingleThread(bool),
    /// 关闭模拟线程
    Shutdown,
}

/// 已发布的网格及其步号
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedMesh {
    /// 产生该网格的模拟步（0 表示尚未发布）
    pub step: u64,
    pub vertices: SurfaceMesh,
}

/// 模拟线程与展示线程共享的状态
#[derive(Debug)]
pub(crate) struct SharedState {
    pub(crate) running: LockFreeFlag,
    pub(crate) acceleration: AccelerationInput,
    pub(crate) mesh: DoubleBuffer<PublishedMesh>,
}

/// 展示端一帧可见的数据
#[derive(Debug, Clone)]
pub struct FrameView {
    mesh: Arc<PublishedMesh>,
    box_size: Vec3,
}

impl FrameView {
    /// 三角形列表
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.mesh.vertices
    }

    /// 顶点缓冲原始字节
    pub fn as_bytes(&self) -> &[u8] {
        as_bytes(&self.mesh.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.vertices.len() / 3
    }

    /// 空网格不需要绘制
    pub fn is_empty(&self) -> bool {
        self.mesh.vertices.is_empty()
    }

    /// 产生该网格的模拟步
    pub fn step(&self) -> u64 {
        self.mesh.step
    }

    /// 顶点步长（字节）
    pub fn stride(&self) -> usize {
        MeshVertex::desc().stride
    }

    pub fn attributes(&self) -> &'static [VertexAttribute] {
        MeshVertex::desc().attributes
    }

    pub fn layout(&self) -> VertexLayout {
        MeshVertex::desc()
    }

    /// 体素盒尺寸，渲染端用 `-box_size / 2` 平移居中
    pub fn box_size(&self) -> Vec3 {
        self.box_size
    }
}

/// 粒子表面模拟
///
/// # 示例
///
/// ```no_run
/// use particle_surface::{Simulation, SimulationConfig};
/// use glam::Vec3;
///
/// let simulation = Simulation::new(SimulationConfig::default())?;
/// simulation.on_sensors_event(Vec3::new(0.0, -9.8, 0.0));
/// let frame = simulation.update();
/// if !frame.is_empty() {
///     // 上传 frame.as_bytes() 并绘制 frame.vertex_count() 个顶点
/// }
/// # Ok::<(), particle_surface::SimError>(())
/// ```
pub struct Simulation {
    shared: Arc<SharedState>,
    commands: Sender<SimulationCommand>,
    thread_handle: Option<JoinHandle<()>>,
    grid_size: UVec3,
    box_size: Vec3,
}

impl Simulation {
    /// 校验配置、初始化粒子云并启动模拟线程
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;

        let grid_size = config.grid_size();
        let seed = config.physics.seed.unwrap_or_else(clock_seed);
        let params = SolverParams::from(&config.physics);

        let cloud = ParticleCloud::scatter(grid_size, config.physics.particles_count, params, seed)?;
        let surface = Isosurface::new(grid_size, &config.surface, config.physics.cell_capacity)?;
        let box_size = surface.box_size();

        let shared = Arc::new(SharedState {
            running: LockFreeFlag::new(true),
            acceleration: AccelerationInput::default(),
            mesh: DoubleBuffer::default(),
        });
        let (command_tx, command_rx) = unbounded::<SimulationCommand>();

        let runner = SimulationRunner {
            cloud,
            surface,
            shared: Arc::clone(&shared),
            commands: command_rx,
            time_step: config.physics.time_step,
            single_threaded: config.single_thread,
            stats: StepStats::new(Duration::from_millis(config.logging.stats_interval_ms)),
        };

        let thread_handle = thread::Builder::new()
            .name("simulation".to_string())
            .spawn(move || runner.run())
            .map_err(|e| SimError::ThreadSpawn(e.to_string()))?;

        tracing::info!(
            target: "simulation",
            grid = ?grid_size,
            particles = config.physics.particles_count,
            seed,
            "Simulation started"
        );

        Ok(Self {
            shared,
            commands: command_tx,
            thread_handle: Some(thread_handle),
            grid_size,
            box_size,
        })
    }

    /// 展示线程入口：取最近发布的完整网格
    pub fn update(&self) -> FrameView {
        FrameView {
            mesh: self.shared.mesh.get(),
            box_size: self.box_size,
        }
    }

    /// 传感器事件，覆盖当前外部加速度
    pub fn on_sensors_event(&self, acceleration: Vec3) {
        self.shared.acceleration.push(acceleration);
    }

    /// 当前外部加速度
    pub fn acceleration(&self) -> Vec3 {
        self.shared.acceleration.get()
    }

    /// 切换单线程/多线程求解，下一次迭代生效
    pub fn set_single_thread(&self, single_thread: bool) {
        self.send_command(SimulationCommand::SetSingleThread(single_thread));
    }

    /// 已发布的网格数
    pub fn published(&self) -> u64 {
        self.shared.mesh.published()
    }

    pub fn grid_size(&self) -> UVec3 {
        self.grid_size
    }

    pub fn box_size(&self) -> Vec3 {
        self.box_size
    }

    /// 模拟线程是否仍在运行
    pub fn is_running(&self) -> bool {
        self.shared.running.get()
            && self
                .thread_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// 关闭模拟线程并等待当前迭代结束
    ///
    /// 重复调用是安全的；线程 panic 时返回 [`SimError::ThreadJoin`]。
    pub fn shutdown(&mut self) -> SimResult<()> {
        self.shared.running.set(false);
        self.send_command(SimulationCommand::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            handle
                .join()
                .map_err(|payload| SimError::ThreadJoin(panic_message(payload.as_ref())))?;
        }
        Ok(())
    }

    fn send_command(&self, command: SimulationCommand) {
        // 线程已退出时接收端已关闭，命令无意义
        let _ = self.commands.send(command);
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            tracing::error!(target: "simulation", %error, "Simulation thread did not stop cleanly");
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use std::time::Instant;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            single_thread: true,
            physics: PhysicsConfig {
                grid_width: 6,
                particles_count: 60,
                worker_threads: 2,
                seed: Some(7),
                ..PhysicsConfig::default()
            },
            ..SimulationConfig::default()
        }
    }

    fn wait_for_publications(simulation: &Simulation, count: u64) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while simulation.published() < count {
            assert!(Instant::now() < deadline, "simulation did not publish in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = small_config();
        config.physics.particles_count = 0;
        assert!(matches!(Simulation::new(config), Err(SimError::Config(_))));
    }

    #[test]
    fn test_publishes_frames_and_shuts_down() {
        let mut simulation = Simulation::new(small_config()).unwrap();
        assert!(simulation.update().step() <= simulation.published());

        wait_for_publications(&simulation, 5);
        let frame = simulation.update();
        assert!(frame.step() >= 1);
        assert_eq!(frame.vertex_count() % 3, 0);
        assert_eq!(frame.stride(), 24);
        assert_eq!(frame.as_bytes().len(), frame.vertex_count() * 24);
        assert_eq!(frame.box_size(), simulation.box_size());

        simulation.shutdown().unwrap();
        assert!(!simulation.is_running());

        // 关闭后不再发布
        let published = simulation.published();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(simulation.published(), published);
        simulation.shutdown().unwrap();
    }

    #[test]
    fn test_sensor_events_and_mode_toggle() {
        let simulation = Simulation::new(small_config()).unwrap();
        simulation.on_sensors_event(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(simulation.acceleration(), Vec3::new(4.0, 0.0, 0.0));

        simulation.set_single_thread(false);
        let published = simulation.published();
        wait_for_publications(&simulation, published + 3);
        assert!(simulation.is_running());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
