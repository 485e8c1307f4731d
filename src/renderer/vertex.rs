//! 顶点数据定义
//!
//! 本模块定义了渲染管线使用的顶点结构体。
//!
//! # 设计说明
//!
//! - 使用 `#[repr(C)]` 确保内存布局与着色器输入兼容
//! - 实现 `Pod` 和 `Zeroable` trait 以支持零拷贝写入顶点缓冲区
//! - 使用数学库的 Vector 类型提供类型安全的构造方法

use bytemuck::{Pod, Zeroable};

use crate::math::{Vector2, Vector3};

/// 标准顶点结构体
///
/// 位置 + 法线 + 纹理坐标，静态网格与动态水面共用这一布局。
///
/// # 内存布局
///
/// - `position`：前 12 字节（3 个 f32）
/// - `normal`：中间 12 字节
/// - `tex_coord`：后 8 字节
///
/// 总大小：32 字节
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置
    pub position: [f32; 3],
    /// 顶点法线
    pub normal: [f32; 3],
    /// 纹理坐标
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// 创建一个新顶点（使用原始值）
    pub fn new(px: f32, py: f32, pz: f32, nx: f32, ny: f32, nz: f32, u: f32, v: f32) -> Self {
        Self {
            position: [px, py, pz],
            normal: [nx, ny, nz],
            tex_coord: [u, v],
        }
    }

    /// 从数学库的 Vector 类型创建顶点
    pub fn from_vectors(position: Vector3, normal: Vector3, tex_coord: Vector2) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            normal: [normal.x, normal.y, normal.z],
            tex_coord: [tex_coord.x, tex_coord.y],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_from_vectors() {
        let v = Vertex::from_vectors(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector2::new(0.5, 0.5),
        );
        assert_eq!(v.position, [1.0, 2.0, 3.0]);
        assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        assert_eq!(v.tex_coord, [0.5, 0.5]);
    }
}
