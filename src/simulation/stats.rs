use std::time::{Duration, Instant};

/// 单个阶段的耗时统计
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub name: &'static str,
    pub total_time: Duration,
    pub call_count: u64,
    pub min_time: Duration,
    pub max_time: Duration,
}

impl PhaseStats {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            total_time: Duration::ZERO,
            call_count: 0,
            min_time: Duration::MAX,
            max_time: Duration::ZERO,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.total_time += duration;
        self.call_count += 1;
        self.min_time = self.min_time.min(duration);
        self.max_time = self.max_time.max(duration);
    }

    pub fn average_time(&self) -> Duration {
        if self.call_count > 0 {
            self.total_time / self.call_count as u32
        } else {
            Duration::ZERO
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.name);
    }
}

/// 一个统计窗口的汇总
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsReport {
    pub frames: u64,
    pub window: Duration,
    pub physics_avg_ms: f64,
    pub physics_max_ms: f64,
    pub surface_avg_ms: f64,
    pub surface_max_ms: f64,
}

impl StatsReport {
    /// 窗口内的帧率
    pub fn frames_per_second(&self) -> f64 {
        let seconds = self.window.as_secs_f64();
        if seconds > 0.0 {
            self.frames as f64 / seconds
        } else {
            0.0
        }
    }

    pub fn log(&self, triangles: usize, single_threaded: bool) {
        tracing::info!(
            target: "simulation",
            frames = self.frames,
            fps = self.frames_per_second(),
            physics_ms = self.physics_avg_ms,
            physics_max_ms = self.physics_max_ms,
            surface_ms = self.surface_avg_ms,
            surface_max_ms = self.surface_max_ms,
            triangles,
            single_threaded,
            "Simulation timings"
        );
    }
}

/// 每帧的阶段耗时累加器，按固定窗口产出汇总
#[derive(Debug, Clone)]
pub struct StepStats {
    physics: PhaseStats,
    surface: PhaseStats,
    interval: Duration,
    window_start: Instant,
}

impl StepStats {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            physics: PhaseStats::new("physics"),
            surface: PhaseStats::new("surface"),
            interval,
            window_start: start,
        }
    }

    pub fn record(&mut self, physics: Duration, surface: Duration) {
        self.physics.record(physics);
        self.surface.record(surface);
    }

    pub fn physics(&self) -> &PhaseStats {
        &self.physics
    }

    pub fn surface(&self) -> &PhaseStats {
        &self.surface
    }

    /// 窗口到期时返回汇总并开始新窗口
    pub fn poll(&mut self, now: Instant) -> Option<StatsReport> {
        let window = now.saturating_duration_since(self.window_start);
        if window < self.interval || self.physics.call_count == 0 {
            return None;
        }

        let report = StatsReport {
            frames: self.physics.call_count,
            window,
            physics_avg_ms: millis(self.physics.average_time()),
            physics_max_ms: millis(self.physics.max_time),
            surface_avg_ms: millis(self.surface.average_time()),
            surface_max_ms: millis(self.surface.max_time),
        };

        self.physics.reset();
        self.surface.reset();
        self.window_start = now;
        Some(report)
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}
