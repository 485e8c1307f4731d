//! 场景模块
//!
//! 渲染项、材质与只读注册表。场景在启动时由 `SceneBuilder`
//! 一次性构建，帧循环中除了两个脏计数器之外完全只读。
//!
//! # 设计原则
//!
//! - **注册表所有权**：几何体/材质数据由场景独占，渲染项只持有
//!   注册表索引，不存在裸指针式的共享所有权
//! - **脏计数器纪律**：渲染项/材质被修改时计数器重置为 N（帧资源
//!   数量），更新通道每写入一个帧资源的副本递减一次；计数器归零
//!   意味着所有 N 份副本都已刷新
//! - **单写者**：只有更新通道递减计数器，只有动画逻辑重置它

pub mod builder;
pub mod camera;
pub mod content;

use std::collections::HashMap;

use crate::geometry::MeshGeometry;
use crate::math::Matrix4;
use crate::renderer::command::PrimitiveTopology;
use crate::renderer::constants::{Light, MAX_LIGHTS};
use crate::renderer::upload::BufferHandle;

pub use builder::{RenderItemDesc, SceneBuilder};
pub use camera::OrbitCamera;

/// 渲染项
///
/// 一个可绘制对象：变换、几何体/材质引用和绘制参数。
/// 变换的修改必须通过 `set_world`/`set_tex_transform`，以保证
/// 脏计数器同步重置。
pub struct RenderItem {
    /// 调试名称
    pub name: String,
    /// 局部到世界变换
    world: Matrix4,
    /// 纹理坐标变换
    tex_transform: Matrix4,
    /// 对象常量缓冲区中的稳定索引
    pub obj_cb_index: usize,
    /// 几何体注册表索引
    pub geometry: usize,
    /// 材质注册表索引
    pub material: usize,
    /// 图元拓扑
    pub topology: PrimitiveTopology,
    /// 索引数量
    pub index_count: u32,
    /// 起始索引位置
    pub start_index_location: u32,
    /// 基准顶点位置
    pub base_vertex_location: i32,
    /// 顶点缓冲区绑定
    ///
    /// 静态网格指向几何体自己的缓冲区；动态水面每帧被重指向
    /// 当前帧资源的动态顶点缓冲区。
    pub vertex_binding: BufferHandle,
    /// 还有多少个帧资源需要刷新此项的常量副本
    num_frames_dirty: u32,
}

impl RenderItem {
    /// 当前世界变换
    pub fn world(&self) -> &Matrix4 {
        &self.world
    }

    /// 当前纹理变换
    pub fn tex_transform(&self) -> &Matrix4 {
        &self.tex_transform
    }

    /// 修改世界变换并重置脏计数器
    ///
    /// 传播中途再次修改会把计数器重新拉满到 N（而不是加一），
    /// 让最新值重新完整传播。
    pub fn set_world(&mut self, world: Matrix4, frame_count: usize) {
        self.world = world;
        self.num_frames_dirty = frame_count as u32;
    }

    /// 修改纹理变换并重置脏计数器
    pub fn set_tex_transform(&mut self, tex_transform: Matrix4, frame_count: usize) {
        self.tex_transform = tex_transform;
        self.num_frames_dirty = frame_count as u32;
    }

    /// 剩余需要刷新的帧资源数量
    pub fn num_frames_dirty(&self) -> u32 {
        self.num_frames_dirty
    }

    /// 写入一个帧资源的副本后递减计数器
    pub fn decrement_dirty(&mut self) {
        debug_assert!(self.num_frames_dirty > 0, "Dirty counter underflow");
        self.num_frames_dirty -= 1;
    }
}

/// 材质
///
/// 与渲染项相同的脏计数器纪律，独立计数、独立的材质常量索引。
pub struct Material {
    /// 材质名称
    pub name: String,
    /// 材质常量缓冲区中的稳定索引
    pub mat_cb_index: usize,
    /// 漫反射反照率
    pub diffuse_albedo: [f32; 4],
    /// 菲涅尔基准反射率
    pub fresnel_r0: [f32; 3],
    /// 粗糙度
    pub roughness: f32,
    /// 材质纹理变换
    mat_transform: Matrix4,
    /// 还有多少个帧资源需要刷新此材质的常量副本
    num_frames_dirty: u32,
}

impl Material {
    /// 当前材质变换
    pub fn mat_transform(&self) -> &Matrix4 {
        &self.mat_transform
    }

    /// 修改材质变换并重置脏计数器
    pub fn set_mat_transform(&mut self, mat_transform: Matrix4, frame_count: usize) {
        self.mat_transform = mat_transform;
        self.num_frames_dirty = frame_count as u32;
    }

    /// 剩余需要刷新的帧资源数量
    pub fn num_frames_dirty(&self) -> u32 {
        self.num_frames_dirty
    }

    /// 写入一个帧资源的副本后递减计数器
    pub fn decrement_dirty(&mut self) {
        debug_assert!(self.num_frames_dirty > 0, "Dirty counter underflow");
        self.num_frames_dirty -= 1;
    }
}

/// 场景
///
/// 构建完成后在帧循环中只读（脏计数器除外）。
pub struct Scene {
    /// 场景名称
    pub name: String,
    /// 几何体注册表
    geometries: Vec<MeshGeometry>,
    geometry_names: HashMap<String, usize>,
    /// 材质注册表
    pub materials: Vec<Material>,
    material_names: HashMap<String, usize>,
    /// 全部渲染项
    pub render_items: Vec<RenderItem>,
    /// 动态水面渲染项的索引（无水面场景为 None）
    pub waves_item: Option<usize>,
    /// 环境光
    pub ambient_light: [f32; 4],
    /// 光源配置
    pub lights: [Light; MAX_LIGHTS],
}

impl Scene {
    /// 按索引访问几何体
    pub fn geometry(&self, index: usize) -> &MeshGeometry {
        &self.geometries[index]
    }

    /// 按名称查找几何体索引
    pub fn geometry_index(&self, name: &str) -> Option<usize> {
        self.geometry_names.get(name).copied()
    }

    /// 按名称查找材质索引
    pub fn material_index(&self, name: &str) -> Option<usize> {
        self.material_names.get(name).copied()
    }

    /// 按名称获取材质的可变引用（动画逻辑用）
    pub fn material_mut(&mut self, name: &str) -> Option<&mut Material> {
        let index = self.material_names.get(name).copied()?;
        self.materials.get_mut(index)
    }

    /// 渲染项数量（决定对象常量缓冲区容量）
    pub fn object_count(&self) -> usize {
        self.render_items.len()
    }

    /// 材质数量（决定材质常量缓冲区容量）
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
