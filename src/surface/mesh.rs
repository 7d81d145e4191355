use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::mem;

/// 网格顶点：位置 + 法线，6 个连续 `f32`
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// 顶点属性的分量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFormat {
    Float32x3,
}

impl AttributeFormat {
    /// 分量数
    pub fn components(self) -> usize {
        match self {
            Self::Float32x3 => 3,
        }
    }

    /// 字节数
    pub fn size(self) -> usize {
        match self {
            Self::Float32x3 => 3 * mem::size_of::<f32>(),
        }
    }
}

/// 单个顶点属性描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub offset: usize,
    pub location: u32,
    pub format: AttributeFormat,
}

/// 顶点缓冲布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: &'static [VertexAttribute],
}

const MESH_VERTEX_ATTRIBUTES: [VertexAttribute; 2] = [
    VertexAttribute {
        name: "position",
        offset: 0,
        location: 0,
        format: AttributeFormat::Float32x3,
    },
    VertexAttribute {
        name: "normal",
        offset: 12,
        location: 1,
        format: AttributeFormat::Float32x3,
    },
];

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    /// 渲染端使用的顶点布局
    pub fn desc() -> VertexLayout {
        VertexLayout {
            stride: mem::size_of::<MeshVertex>(),
            attributes: &MESH_VERTEX_ATTRIBUTES,
        }
    }
}

/// 三角形列表（顶点数恒为 3 的倍数）
pub type SurfaceMesh = Vec<MeshVertex>;

/// 把网格视为原始字节，便于直接上传顶点缓冲
pub fn as_bytes(mesh: &[MeshVertex]) -> &[u8] {
    bytemuck::cast_slice(mesh)
}
