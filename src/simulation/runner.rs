use super::stats::StepStats;
use super::{PublishedMesh, SharedState, SimulationCommand};
use crate::physics::ParticleCloud;
use crate::surface::Isosurface;
use crossbeam_channel::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

/// 模拟线程运行器，线程内独占粒子云和等值面提取器
pub(crate) struct SimulationRunner {
    pub(crate) cloud: ParticleCloud,
    pub(crate) surface: Isosurface,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) commands: Receiver<SimulationCommand>,
    pub(crate) time_step: f32,
    pub(crate) single_threaded: bool,
    pub(crate) stats: StepStats,
}

impl SimulationRunner {
    /// 运行模拟循环，直到收到关闭信号
    ///
    /// 取消是协作式的：只在每次迭代开头和发布网格前检查，已开始的步进总会完整执行。
    pub(crate) fn run(mut self) {
        tracing::info!(
            target: "simulation",
            particles = self.cloud.len(),
            workers = self.cloud.worker_threads(),
            single_threaded = self.single_threaded,
            "Simulation thread started"
        );

        let mut step: u64 = 0;
        while self.shared.running.get() {
            if !self.drain_commands() {
                break;
            }

            let acceleration = self.shared.acceleration.get();
            let single_threaded = self.single_threaded;

            let physics_start = Instant::now();
            self.cloud.update(acceleration, self.time_step, single_threaded);

            let surface_start = Instant::now();
            let vertices = if single_threaded {
                self.surface.generate(self.cloud.particles(), true)
            } else {
                let Self { cloud, surface, .. } = &mut self;
                let particles = cloud.particles();
                cloud.install(|| surface.generate(particles, false))
            };
            let surface_end = Instant::now();

            if !self.shared.running.get() {
                break;
            }

            step += 1;
            self.shared.mesh.swap(PublishedMesh { step, vertices });

            self.stats
                .record(surface_start - physics_start, surface_end - surface_start);
            if let Some(report) = self.stats.poll(surface_end) {
                report.log(self.surface.last_report().triangles, single_threaded);
            }
        }

        tracing::info!(target: "simulation", steps = step, "Simulation thread stopped");
    }

    /// 处理所有待处理命令，返回是否继续运行
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(SimulationCommand::SetSingleThread(single_threaded)) => {
                    if self.single_threaded != single_threaded {
                        tracing::info!(target: "simulation", single_threaded, "Solver mode changed");
                    }
                    self.single_threaded = single_threaded;
                }
                Ok(SimulationCommand::Shutdown) => return false,
                Err(TryRecvError::Empty) => return true,
                // 拥有者已经不存在
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}
