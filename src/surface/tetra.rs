//! 立方体 → 四面体剖分表
//!
//! 角点编号：bit0 = x，bit1 = y，bit2 = z。六个四面体共用主对角线 0-7，
//! 相邻立方体在公共面上的剖分一致，因此不会出现裂缝。

use glam::UVec3;

/// 立方体 8 个角点相对最小角的偏移
pub const CORNER_OFFSETS: [UVec3; 8] = [
    UVec3::new(0, 0, 0),
    UVec3::new(1, 0, 0),
    UVec3::new(0, 1, 0),
    UVec3::new(1, 1, 0),
    UVec3::new(0, 0, 1),
    UVec3::new(1, 0, 1),
    UVec3::new(0, 1, 1),
    UVec3::new(1, 1, 1),
];

/// 沿主对角线的六个四面体（角点编号）
pub const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 3, 2, 7],
    [0, 2, 6, 7],
    [0, 6, 4, 7],
    [0, 4, 5, 7],
    [0, 5, 1, 7],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tetrahedra_cover_cube_volume() {
        let volume: f32 = TETRAHEDRA
            .iter()
            .map(|t| {
                let [a, b, c, d] = t.map(|k| CORNER_OFFSETS[k].as_vec3());
                (b - a).dot((c - a).cross(d - a)).abs() / 6.0
            })
            .sum();
        assert!((volume - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_corner_bits() {
        for (k, offset) in CORNER_OFFSETS.iter().enumerate() {
            let k = k as u32;
            assert_eq!(*offset, UVec3::new(k & 1, (k >> 1) & 1, (k >> 2) & 1));
        }
    }
}
