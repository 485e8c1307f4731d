//! 场景构建器
//!
//! 启动时一次性组装场景：注册几何体与材质、用名称引用创建渲染项、
//! 配置光源。常量缓冲区索引由构建器按注册顺序连续分配，
//! 保证确定性且与缓冲区容量一一对应。

use std::collections::HashMap;

use crate::core::error::{CastleRenderError, Result, SceneError};
use crate::geometry::MeshGeometry;
use crate::math::Matrix4;
use crate::renderer::command::PrimitiveTopology;
use crate::renderer::constants::{Light, MAX_LIGHTS};

use super::{Material, RenderItem, Scene};

/// 渲染项描述
///
/// 几何体/子网格/材质均以名称引用，构建器负责解析并验证。
pub struct RenderItemDesc<'a> {
    /// 调试名称
    pub name: &'a str,
    /// 世界变换
    pub world: Matrix4,
    /// 纹理变换
    pub tex_transform: Matrix4,
    /// 几何体名称
    pub geometry: &'a str,
    /// 子网格名称
    pub submesh: &'a str,
    /// 材质名称
    pub material: &'a str,
    /// 图元拓扑
    pub topology: PrimitiveTopology,
}

/// 场景构建器
pub struct SceneBuilder {
    name: String,
    frame_count: usize,
    geometries: Vec<MeshGeometry>,
    geometry_names: HashMap<String, usize>,
    materials: Vec<Material>,
    material_names: HashMap<String, usize>,
    render_items: Vec<RenderItem>,
    waves_item: Option<usize>,
    ambient_light: [f32; 4],
    lights: [Light; MAX_LIGHTS],
}

impl SceneBuilder {
    /// 创建构建器
    ///
    /// `frame_count` 是帧资源数量，新注册的材质和渲染项的脏计数器
    /// 初始即为该值，第一轮更新会把初始数据写满所有帧资源。
    pub fn new(name: &str, frame_count: usize) -> Self {
        Self {
            name: name.to_string(),
            frame_count,
            geometries: Vec::new(),
            geometry_names: HashMap::new(),
            materials: Vec::new(),
            material_names: HashMap::new(),
            render_items: Vec::new(),
            waves_item: None,
            ambient_light: [0.25, 0.25, 0.35, 1.0],
            lights: [Light::default(); MAX_LIGHTS],
        }
    }

    /// 注册几何体
    pub fn add_geometry(&mut self, geometry: MeshGeometry) -> Result<usize> {
        if self.geometry_names.contains_key(&geometry.name) {
            return Err(CastleRenderError::Scene(SceneError::DuplicateGeometry(
                geometry.name.clone(),
            )));
        }
        let index = self.geometries.len();
        self.geometry_names.insert(geometry.name.clone(), index);
        self.geometries.push(geometry);
        Ok(index)
    }

    /// 注册材质
    ///
    /// 材质常量索引按注册顺序分配。
    pub fn add_material(
        &mut self,
        name: &str,
        diffuse_albedo: [f32; 4],
        fresnel_r0: [f32; 3],
        roughness: f32,
    ) -> Result<usize> {
        if self.material_names.contains_key(name) {
            return Err(CastleRenderError::Scene(SceneError::DuplicateMaterial(
                name.to_string(),
            )));
        }
        let index = self.materials.len();
        self.material_names.insert(name.to_string(), index);
        self.materials.push(Material {
            name: name.to_string(),
            mat_cb_index: index,
            diffuse_albedo,
            fresnel_r0,
            roughness,
            mat_transform: Matrix4::identity(),
            num_frames_dirty: self.frame_count as u32,
        });
        Ok(index)
    }

    /// 创建渲染项
    ///
    /// 对象常量索引按创建顺序分配；顶点绑定初始指向几何体
    /// 自己的顶点缓冲区，绘制参数从子网格复制。
    pub fn add_render_item(&mut self, desc: RenderItemDesc<'_>) -> Result<usize> {
        let geo_index = self.geometry_names.get(desc.geometry).copied().ok_or_else(|| {
            CastleRenderError::Scene(SceneError::UnknownGeometry(desc.geometry.to_string()))
        })?;
        let geometry = &self.geometries[geo_index];
        let submesh = geometry.submesh(desc.submesh).ok_or_else(|| {
            CastleRenderError::Scene(SceneError::UnknownSubmesh(format!(
                "{}/{}",
                desc.geometry, desc.submesh
            )))
        })?;
        let mat_index = self.material_names.get(desc.material).copied().ok_or_else(|| {
            CastleRenderError::Scene(SceneError::UnknownMaterial(desc.material.to_string()))
        })?;

        let index = self.render_items.len();
        self.render_items.push(RenderItem {
            name: desc.name.to_string(),
            world: desc.world,
            tex_transform: desc.tex_transform,
            obj_cb_index: index,
            geometry: geo_index,
            material: mat_index,
            topology: desc.topology,
            index_count: submesh.index_count,
            start_index_location: submesh.start_index_location,
            base_vertex_location: submesh.base_vertex_location,
            vertex_binding: geometry.vertex_handle(),
            num_frames_dirty: self.frame_count as u32,
        });
        Ok(index)
    }

    /// 标记动态水面渲染项
    pub fn mark_waves_item(&mut self, item_index: usize) {
        self.waves_item = Some(item_index);
    }

    /// 配置环境光与光源
    ///
    /// 超出 `MAX_LIGHTS` 的光源被忽略。
    pub fn set_lighting(&mut self, ambient_light: [f32; 4], lights: &[Light]) {
        self.ambient_light = ambient_light;
        for (slot, light) in self.lights.iter_mut().zip(lights.iter()) {
            *slot = *light;
        }
    }

    /// 完成构建
    ///
    /// 再次校验常量索引的唯一性，防止后续手工修改破坏不变量。
    pub fn build(self) -> Result<Scene> {
        let mut seen = vec![false; self.render_items.len()];
        for item in &self.render_items {
            if item.obj_cb_index >= seen.len() || seen[item.obj_cb_index] {
                return Err(CastleRenderError::Scene(SceneError::DuplicateObjectIndex(
                    item.obj_cb_index,
                )));
            }
            seen[item.obj_cb_index] = true;
        }

        Ok(Scene {
            name: self.name,
            geometries: self.geometries,
            geometry_names: self.geometry_names,
            materials: self.materials,
            material_names: self.material_names,
            render_items: self.render_items,
            waves_item: self.waves_item,
            ambient_light: self.ambient_light,
            lights: self.lights,
        })
    }
}
