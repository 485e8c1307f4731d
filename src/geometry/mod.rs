//! 几何体模块
//!
//! 网格数据的容器与少量程序化形状构建器（场景内容用）。
//! 静态网格的顶点/索引在场景构建时一次性写入各自的缓冲区；
//! 动态水面网格只使用这里的索引数据，顶点每帧由帧资源的
//! 动态顶点通道提供。

use std::collections::HashMap;

use crate::core::error::Result;
use crate::math::constants::TAU;
use crate::renderer::upload::{BufferHandle, BufferUsageType, UploadBuffer};
use crate::renderer::vertex::Vertex;

/// 子网格
///
/// 共享顶点/索引缓冲区内的一段绘制范围。
#[derive(Debug, Clone, Copy)]
pub struct SubmeshGeometry {
    /// 索引数量
    pub index_count: u32,
    /// 起始索引位置
    pub start_index_location: u32,
    /// 基准顶点位置
    pub base_vertex_location: i32,
}

/// 网格几何体
///
/// 一个命名的顶点/索引缓冲区对，外加按名称索引的子网格表。
/// 注册进几何体注册表后在帧循环中只读。
pub struct MeshGeometry {
    /// 几何体名称
    pub name: String,
    /// 顶点缓冲区
    vertex_buffer: UploadBuffer<Vertex>,
    /// 索引缓冲区
    index_buffer: UploadBuffer<u32>,
    /// 子网格表
    pub draw_args: HashMap<String, SubmeshGeometry>,
}

impl MeshGeometry {
    /// 用顶点/索引数据构建几何体
    pub fn new(
        name: impl Into<String>,
        vertices: &[Vertex],
        indices: &[u32],
        draw_args: HashMap<String, SubmeshGeometry>,
    ) -> Result<Self> {
        let mut vertex_buffer = UploadBuffer::new(vertices.len(), BufferUsageType::Vertex)?;
        for (i, v) in vertices.iter().enumerate() {
            vertex_buffer.copy_record(i, v);
        }

        let mut index_buffer = UploadBuffer::new(indices.len(), BufferUsageType::Index)?;
        for (i, idx) in indices.iter().enumerate() {
            index_buffer.copy_record(i, idx);
        }

        Ok(Self {
            name: name.into(),
            vertex_buffer,
            index_buffer,
            draw_args,
        })
    }

    /// 顶点缓冲区绑定句柄
    pub fn vertex_handle(&self) -> BufferHandle {
        self.vertex_buffer.handle()
    }

    /// 索引缓冲区绑定句柄
    pub fn index_handle(&self) -> BufferHandle {
        self.index_buffer.handle()
    }

    /// 查找子网格
    pub fn submesh(&self, name: &str) -> Option<&SubmeshGeometry> {
        self.draw_args.get(name)
    }

    /// 顶点数量
    pub fn vertex_count(&self) -> usize {
        self.vertex_buffer.element_count()
    }

    /// 索引数量
    pub fn index_count(&self) -> usize {
        self.index_buffer.element_count()
    }
}

/// 程序化网格数据（构建器输出）
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// 生成 XZ 平面网格
///
/// `m` x `n` 个顶点覆盖 `width` x `depth` 的范围，法线朝上，
/// 纹理坐标铺满 [0,1]。
pub fn make_grid(width: f32, depth: f32, m: usize, n: usize) -> MeshData {
    assert!(m >= 2 && n >= 2, "Grid needs at least 2x2 vertices");

    let half_width = 0.5 * width;
    let half_depth = 0.5 * depth;
    let dx = width / (n - 1) as f32;
    let dz = depth / (m - 1) as f32;
    let du = 1.0 / (n - 1) as f32;
    let dv = 1.0 / (m - 1) as f32;

    let mut vertices = Vec::with_capacity(m * n);
    for i in 0..m {
        let z = half_depth - i as f32 * dz;
        for j in 0..n {
            let x = -half_width + j as f32 * dx;
            vertices.push(Vertex::new(
                x, 0.0, z,
                0.0, 1.0, 0.0,
                j as f32 * du, i as f32 * dv,
            ));
        }
    }

    let mut indices = Vec::with_capacity((m - 1) * (n - 1) * 6);
    for i in 0..m - 1 {
        for j in 0..n - 1 {
            let a = (i * n + j) as u32;
            let b = (i * n + j + 1) as u32;
            let c = ((i + 1) * n + j) as u32;
            let d = ((i + 1) * n + j + 1) as u32;
            indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }

    MeshData { vertices, indices }
}

/// 生成轴对齐盒子
pub fn make_box(width: f32, height: f32, depth: f32) -> MeshData {
    let w = 0.5 * width;
    let h = 0.5 * height;
    let d = 0.5 * depth;

    // 六个面各四个顶点，法线朝外
    let vertices = vec![
        // 前面 (-z)
        Vertex::new(-w, -h, -d, 0.0, 0.0, -1.0, 0.0, 1.0),
        Vertex::new(-w, h, -d, 0.0, 0.0, -1.0, 0.0, 0.0),
        Vertex::new(w, h, -d, 0.0, 0.0, -1.0, 1.0, 0.0),
        Vertex::new(w, -h, -d, 0.0, 0.0, -1.0, 1.0, 1.0),
        // 后面 (+z)
        Vertex::new(-w, -h, d, 0.0, 0.0, 1.0, 1.0, 1.0),
        Vertex::new(w, -h, d, 0.0, 0.0, 1.0, 0.0, 1.0),
        Vertex::new(w, h, d, 0.0, 0.0, 1.0, 0.0, 0.0),
        Vertex::new(-w, h, d, 0.0, 0.0, 1.0, 1.0, 0.0),
        // 顶面 (+y)
        Vertex::new(-w, h, -d, 0.0, 1.0, 0.0, 0.0, 1.0),
        Vertex::new(-w, h, d, 0.0, 1.0, 0.0, 0.0, 0.0),
        Vertex::new(w, h, d, 0.0, 1.0, 0.0, 1.0, 0.0),
        Vertex::new(w, h, -d, 0.0, 1.0, 0.0, 1.0, 1.0),
        // 底面 (-y)
        Vertex::new(-w, -h, -d, 0.0, -1.0, 0.0, 1.0, 1.0),
        Vertex::new(w, -h, -d, 0.0, -1.0, 0.0, 0.0, 1.0),
        Vertex::new(w, -h, d, 0.0, -1.0, 0.0, 0.0, 0.0),
        Vertex::new(-w, -h, d, 0.0, -1.0, 0.0, 1.0, 0.0),
        // 左面 (-x)
        Vertex::new(-w, -h, d, -1.0, 0.0, 0.0, 0.0, 1.0),
        Vertex::new(-w, h, d, -1.0, 0.0, 0.0, 0.0, 0.0),
        Vertex::new(-w, h, -d, -1.0, 0.0, 0.0, 1.0, 0.0),
        Vertex::new(-w, -h, -d, -1.0, 0.0, 0.0, 1.0, 1.0),
        // 右面 (+x)
        Vertex::new(w, -h, -d, 1.0, 0.0, 0.0, 0.0, 1.0),
        Vertex::new(w, h, -d, 1.0, 0.0, 0.0, 0.0, 0.0),
        Vertex::new(w, h, d, 1.0, 0.0, 0.0, 1.0, 0.0),
        Vertex::new(w, -h, d, 1.0, 0.0, 0.0, 1.0, 1.0),
    ];

    let mut indices = Vec::with_capacity(36);
    for face in 0..6u32 {
        let base = face * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData { vertices, indices }
}

/// 生成圆柱体（柱廊场景的柱子）
pub fn make_cylinder(
    bottom_radius: f32,
    top_radius: f32,
    height: f32,
    slice_count: usize,
    stack_count: usize,
) -> MeshData {
    let mut mesh = MeshData::default();

    let stack_height = height / stack_count as f32;
    let radius_step = (top_radius - bottom_radius) / stack_count as f32;

    for i in 0..=stack_count {
        let y = -0.5 * height + i as f32 * stack_height;
        let r = bottom_radius + i as f32 * radius_step;
        for j in 0..=slice_count {
            let theta = j as f32 * TAU / slice_count as f32;
            let (sin, cos) = theta.sin_cos();
            mesh.vertices.push(Vertex::new(
                r * cos, y, r * sin,
                cos, 0.0, sin,
                j as f32 / slice_count as f32,
                1.0 - i as f32 / stack_count as f32,
            ));
        }
    }

    let ring = slice_count + 1;
    for i in 0..stack_count {
        for j in 0..slice_count {
            let a = (i * ring + j) as u32;
            let b = ((i + 1) * ring + j) as u32;
            let c = ((i + 1) * ring + j + 1) as u32;
            let d = (i * ring + j + 1) as u32;
            mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    mesh
}

/// 生成 UV 球体（柱顶装饰球）
pub fn make_sphere(radius: f32, slice_count: usize, stack_count: usize) -> MeshData {
    let mut mesh = MeshData::default();

    // 北极点
    mesh.vertices.push(Vertex::new(
        0.0, radius, 0.0,
        0.0, 1.0, 0.0,
        0.0, 0.0,
    ));

    let phi_step = std::f32::consts::PI / stack_count as f32;
    let theta_step = TAU / slice_count as f32;

    for i in 1..stack_count {
        let phi = i as f32 * phi_step;
        for j in 0..=slice_count {
            let theta = j as f32 * theta_step;
            let x = phi.sin() * theta.cos();
            let y = phi.cos();
            let z = phi.sin() * theta.sin();
            mesh.vertices.push(Vertex::new(
                radius * x, radius * y, radius * z,
                x, y, z,
                theta / TAU,
                phi / std::f32::consts::PI,
            ));
        }
    }

    // 南极点
    mesh.vertices.push(Vertex::new(
        0.0, -radius, 0.0,
        0.0, -1.0, 0.0,
        0.0, 1.0,
    ));

    // 顶部扇区
    for j in 1..=slice_count as u32 {
        mesh.indices.extend_from_slice(&[0, j + 1, j]);
    }

    // 中间环带
    let ring = slice_count as u32 + 1;
    let mut base = 1u32;
    for _ in 0..stack_count.saturating_sub(2) {
        for j in 0..slice_count as u32 {
            mesh.indices.extend_from_slice(&[
                base + j,
                base + j + 1,
                base + ring + j,
                base + ring + j,
                base + j + 1,
                base + ring + j + 1,
            ]);
        }
        base += ring;
    }

    // 底部扇区
    let south = mesh.vertices.len() as u32 - 1;
    let last_ring = south - ring;
    for j in 0..slice_count as u32 {
        mesh.indices.extend_from_slice(&[south, last_ring + j, last_ring + j + 1]);
    }

    mesh
}
