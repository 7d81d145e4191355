//! 外部加速度输入
//!
//! 传感器或输入线程随时调用 [`AccelerationInput::push`]，模拟线程每帧调用
//! [`AccelerationInput::get`] 取最新值。只保留最后一次写入，中间值允许丢失。

use crate::physics::DEFAULT_GRAVITY;
use crate::sync::AtomicVec3;
use glam::Vec3;

/// 最新值加速度槽
#[derive(Debug)]
pub struct AccelerationInput {
    slot: AtomicVec3,
}

impl AccelerationInput {
    pub fn new(initial: Vec3) -> Self {
        Self {
            slot: AtomicVec3::new(initial),
        }
    }

    /// 覆盖当前加速度
    ///
    /// 非有限值会被忽略，避免把 NaN 带进积分。
    pub fn push(&self, acceleration: Vec3) {
        if !acceleration.is_finite() {
            tracing::warn!(target: "simulation", ?acceleration, "Ignoring non-finite acceleration");
            return;
        }
        self.slot.store(acceleration);
    }

    /// 读取当前加速度
    pub fn get(&self) -> Vec3 {
        self.slot.load()
    }
}

impl Default for AccelerationInput {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_default_is_gravity() {
        let input = AccelerationInput::default();
        assert_eq!(input.get(), Vec3::new(0.0, -9.8, 0.0));
    }

    #[test]
    fn test_last_write_wins() {
        let input = AccelerationInput::default();
        input.push(Vec3::X);
        input.push(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(input.get(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_non_finite_is_ignored() {
        let input = AccelerationInput::default();
        input.push(Vec3::new(f32::NAN, 0.0, 0.0));
        input.push(Vec3::new(0.0, f32::INFINITY, 0.0));
        assert_eq!(input.get(), DEFAULT_GRAVITY);
    }

    #[test]
    fn test_push_from_many_threads() {
        let input = Arc::new(AccelerationInput::default());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let input = Arc::clone(&input);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        input.push(Vec3::splat((t * 1_000 + i) as f32));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = input.get();
        assert!(value.x == value.y && value.y == value.z);
    }
}
