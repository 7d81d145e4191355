use glam::Vec3;
use std::hint;
use std::sync::atomic::{fence, AtomicBool, AtomicU32, AtomicU64, Ordering};

/// 无锁标志
#[derive(Debug)]
pub struct LockFreeFlag {
    value: AtomicBool,
}

impl LockFreeFlag {
    pub fn new(initial: bool) -> Self {
        Self {
            value: AtomicBool::new(initial),
        }
    }

    /// 设置标志
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// 获取标志
    pub fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }
}

/// 无锁三维向量槽（序列锁）
///
/// 读者从不阻塞写者；读到写入中途的数据时重试，因此不会观察到撕裂的向量。
/// 多个写者之间通过序号的 CAS 串行化，后写者覆盖先写者。
#[derive(Debug)]
pub struct AtomicVec3 {
    sequence: AtomicU64,
    components: [AtomicU32; 3],
}

impl AtomicVec3 {
    pub fn new(value: Vec3) -> Self {
        Self {
            sequence: AtomicU64::new(0),
            components: [
                AtomicU32::new(value.x.to_bits()),
                AtomicU32::new(value.y.to_bits()),
                AtomicU32::new(value.z.to_bits()),
            ],
        }
    }

    /// 覆盖当前值
    pub fn store(&self, value: Vec3) {
        // 奇数序号表示写入进行中
        let mut sequence = self.sequence.load(Ordering::Relaxed);
        loop {
            if sequence & 1 == 1 {
                hint::spin_loop();
                sequence = self.sequence.load(Ordering::Relaxed);
                continue;
            }
            match self.sequence.compare_exchange_weak(
                sequence,
                sequence.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => sequence = current,
            }
        }
        fence(Ordering::Release);

        for (slot, component) in self.components.iter().zip(value.to_array()) {
            slot.store(component.to_bits(), Ordering::Relaxed);
        }

        self.sequence
            .store(sequence.wrapping_add(2), Ordering::Release);
    }

    /// 读取当前值
    pub fn load(&self) -> Vec3 {
        loop {
            let before = self.sequence.load(Ordering::Acquire);
            if before & 1 == 1 {
                hint::spin_loop();
                continue;
            }

            let value = Vec3::new(
                f32::from_bits(self.components[0].load(Ordering::Relaxed)),
                f32::from_bits(self.components[1].load(Ordering::Relaxed)),
                f32::from_bits(self.components[2].load(Ordering::Relaxed)),
            );

            fence(Ordering::Acquire);
            if self.sequence.load(Ordering::Relaxed) == before {
                return value;
            }
        }
    }
}

impl Default for AtomicVec3 {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
