//! 均匀空间网格
//!
//! 每个单元保存落在其中的粒子下标（而不是引用），容量固定。
//! 网格每步清空并重建；清空只重置计数，不释放内存。

use glam::{IVec3, UVec3, Vec3};

/// 网格单元默认容量
pub const DEFAULT_CELL_CAPACITY: usize = 32;

/// 一个网格单元：有界的粒子下标序列
#[derive(Debug, Clone)]
pub struct GridCell {
    items: Vec<u32>,
    capacity: usize,
}

impl GridCell {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn items(&self) -> &[u32] {
        &self.items
    }

    /// 追加下标；单元已满时丢弃并返回 `false`
    pub fn push(&mut self, index: u32) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(index);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// 三维桶网格
///
/// 坐标越界的查询一律视为“没有粒子”，求解器和等值面提取可以放心探测边缘。
#[derive(Debug, Clone)]
pub struct Grid {
    size: UVec3,
    cells: Vec<GridCell>,
    dropped: usize,
}

impl Grid {
    /// 以默认单元容量创建网格
    pub fn new(size: UVec3) -> Self {
        Self::with_capacity(size, DEFAULT_CELL_CAPACITY)
    }

    /// 创建网格并一次性分配所有单元
    pub fn with_capacity(size: UVec3, cell_capacity: usize) -> Self {
        let cell_count = (size.x as usize) * (size.y as usize) * (size.z as usize);
        Self {
            size,
            cells: (0..cell_count)
                .map(|_| GridCell::with_capacity(cell_capacity))
                .collect(),
            dropped: 0,
        }
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 网格中保存的下标总数
    pub fn count(&self) -> usize {
        self.cells.iter().map(GridCell::count).sum()
    }

    /// 自上次 `clear()` 以来因单元已满被丢弃的次数
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 连续坐标所在的单元坐标（钳制到网格内）
    pub fn cell_coord(&self, position: Vec3) -> IVec3 {
        let max = self.size.as_ivec3() - IVec3::ONE;
        position.floor().as_ivec3().clamp(IVec3::ZERO, max.max(IVec3::ZERO))
    }

    fn linear_index(&self, coord: IVec3) -> Option<usize> {
        if coord.cmplt(IVec3::ZERO).any() || coord.cmpge(self.size.as_ivec3()).any() {
            return None;
        }
        let (x, y, z) = (coord.x as usize, coord.y as usize, coord.z as usize);
        Some(x + self.size.x as usize * (y + self.size.y as usize * z))
    }

    /// 按坐标访问单元，越界返回 `None`
    pub fn cell(&self, coord: IVec3) -> Option<&GridCell> {
        self.linear_index(coord).map(|index| &self.cells[index])
    }

    /// 单元中的粒子下标，越界返回空切片
    pub fn cell_items(&self, coord: IVec3) -> &[u32] {
        self.cell(coord).map(GridCell::items).unwrap_or(&[])
    }

    /// 把粒子下标放入其位置对应的单元
    ///
    /// 单元已满时丢弃（返回 `false`），以牺牲该单元的求解精度换取有界内存。
    pub fn push(&mut self, index: u32, position: Vec3) -> bool {
        if self.cells.is_empty() {
            return false;
        }
        let coord = self.cell_coord(position);
        let stored = match self.linear_index(coord) {
            Some(cell) => self.cells[cell].push(index),
            None => false,
        };
        if !stored {
            self.dropped += 1;
            tracing::trace!(target: "physics", index, ?coord, "Grid cell full, particle dropped");
        }
        stored
    }

    /// 重置所有单元计数，保留已分配内存
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.dropped = 0;
    }

    /// 以 `positions` 重建网格，下标即切片中的序号
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Vec3>,
    {
        self.clear();
        for (index, position) in positions.into_iter().enumerate() {
            self.push(index as u32, position);
        }
    }
}

/// 3×3×3 邻域偏移（包括自身）
pub const NEIGHBOR_OFFSETS: [IVec3; 27] = {
    let mut offsets = [IVec3::ZERO; 27];
    let mut i = 0;
    while i < 27 {
        offsets[i] = IVec3::new(i as i32 % 3 - 1, (i as i32 / 3) % 3 - 1, i as i32 / 9 - 1);
        i += 1;
    }
    offsets
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_lookup() {
        let mut grid = Grid::new(UVec3::new(4, 4, 4));
        assert!(grid.push(0, Vec3::new(0.5, 0.5, 0.5)));
        assert!(grid.push(1, Vec3::new(3.2, 1.9, 0.1)));

        assert_eq!(grid.cell_items(IVec3::new(0, 0, 0)), &[0]);
        assert_eq!(grid.cell_items(IVec3::new(3, 1, 0)), &[1]);
        assert_eq!(grid.count(), 2);
    }

    #[test]
    fn test_positions_on_upper_bound_land_in_last_cell() {
        let mut grid = Grid::new(UVec3::new(4, 4, 4));
        assert!(grid.push(7, Vec3::splat(4.0)));
        assert_eq!(grid.cell_items(IVec3::splat(3)), &[7]);
    }

    #[test]
    fn test_out_of_range_is_empty() {
        let grid = Grid::new(UVec3::new(2, 2, 2));
        assert!(grid.cell(IVec3::new(-1, 0, 0)).is_none());
        assert!(grid.cell(IVec3::new(0, 2, 0)).is_none());
        assert!(grid.cell_items(IVec3::new(5, 5, 5)).is_empty());
    }

    #[test]
    fn test_overflow_is_dropped() {
        let mut grid = Grid::with_capacity(UVec3::new(2, 2, 2), 3);
        for i in 0..5 {
            grid.push(i, Vec3::splat(0.5));
        }
        let cell = grid.cell(IVec3::ZERO).unwrap();
        assert_eq!(cell.count(), 3);
        assert_eq!(cell.items(), &[0, 1, 2]);
        assert_eq!(grid.dropped(), 2);
        assert_eq!(grid.count(), 3);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut grid = Grid::new(UVec3::new(3, 3, 3));
        grid.rebuild((0..10).map(|i| Vec3::splat(i as f32 * 0.3)));
        assert_eq!(grid.count(), 10);

        grid.clear();
        assert_eq!(grid.count(), 0);
        grid.clear();
        assert_eq!(grid.count(), 0);
        assert_eq!(grid.dropped(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut grid = Grid::new(UVec3::new(2, 2, 2));
        grid.push(0, Vec3::ZERO);
        let copy = grid.clone();
        grid.clear();

        assert_eq!(copy.count(), 1);
        assert_eq!(grid.count(), 0);
    }

    #[test]
    fn test_neighbor_offsets_cover_cube() {
        assert_eq!(NEIGHBOR_OFFSETS[0], IVec3::splat(-1));
        assert_eq!(NEIGHBOR_OFFSETS[13], IVec3::ZERO);
        assert_eq!(NEIGHBOR_OFFSETS[26], IVec3::ONE);
        for offset in NEIGHBOR_OFFSETS {
            assert!(offset.abs().max_element() <= 1);
        }
    }
}
