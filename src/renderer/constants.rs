//! 常量缓冲区记录布局
//!
//! 定义写入各环形缓冲区的记录类型：对象常量、材质常量和 pass
//! 常量。布局与 HLSL 常量缓冲区一一对应。
//!
//! # 设计说明
//!
//! - 使用 `#[repr(C)]` + `Pod` 保证可以按字节整体拷贝
//! - 所有矩阵在写入前已经转置为着色器布局（见 `math::matrix::to_shader_layout`）
//! - `PassConstants` 每帧整体重写，对象/材质常量按脏计数器增量刷新

use bytemuck::{Pod, Zeroable};

use crate::math::matrix;

/// 光源数量上限（与着色器中的数组大小一致）
pub const MAX_LIGHTS: usize = 16;

/// 光源数据
///
/// 方向光/点光/聚光共用一个布局，按字段取舍解释。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Light {
    /// 光源强度（RGB）
    pub strength: [f32; 3],
    /// 点光/聚光的衰减起点
    pub falloff_start: f32,
    /// 方向光/聚光的方向
    pub direction: [f32; 3],
    /// 点光/聚光的衰减终点
    pub falloff_end: f32,
    /// 点光/聚光的位置
    pub position: [f32; 3],
    /// 聚光的锐度指数
    pub spot_power: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            strength: [0.5, 0.5, 0.5],
            falloff_start: 1.0,
            direction: [0.0, -1.0, 0.0],
            falloff_end: 10.0,
            position: [0.0, 0.0, 0.0],
            spot_power: 64.0,
        }
    }
}

/// 每对象常量
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    /// 局部到世界变换（已转置）
    pub world: [[f32; 4]; 4],
    /// 纹理坐标变换（已转置）
    pub tex_transform: [[f32; 4]; 4],
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self {
            world: matrix::identity_shader_layout(),
            tex_transform: matrix::identity_shader_layout(),
        }
    }
}

/// 每材质常量
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    /// 漫反射反照率
    pub diffuse_albedo: [f32; 4],
    /// 菲涅尔基准反射率
    pub fresnel_r0: [f32; 3],
    /// 粗糙度
    pub roughness: f32,
    /// 材质纹理变换（已转置）
    pub mat_transform: [[f32; 4]; 4],
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            diffuse_albedo: [1.0, 1.0, 1.0, 1.0],
            fresnel_r0: [0.01, 0.01, 0.01],
            roughness: 0.25,
            mat_transform: matrix::identity_shader_layout(),
        }
    }
}

/// 每帧全局常量（pass 常量）
///
/// 相机矩阵及其逆、渲染目标尺寸、计时与光照环境。
/// 相机状态连续变化，这条记录每帧无条件整体重写。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    /// 视图矩阵（已转置）
    pub view: [[f32; 4]; 4],
    /// 视图矩阵的逆（已转置）
    pub inv_view: [[f32; 4]; 4],
    /// 投影矩阵（已转置）
    pub proj: [[f32; 4]; 4],
    /// 投影矩阵的逆（已转置）
    pub inv_proj: [[f32; 4]; 4],
    /// 视图投影矩阵（已转置）
    pub view_proj: [[f32; 4]; 4],
    /// 视图投影矩阵的逆（已转置）
    pub inv_view_proj: [[f32; 4]; 4],
    /// 相机世界空间位置
    pub eye_pos_w: [f32; 3],
    /// 对齐填充
    pub _pad0: f32,
    /// 渲染目标尺寸
    pub render_target_size: [f32; 2],
    /// 渲染目标尺寸的倒数
    pub inv_render_target_size: [f32; 2],
    /// 近裁剪面
    pub near_z: f32,
    /// 远裁剪面
    pub far_z: f32,
    /// 累计运行时间（秒）
    pub total_time: f32,
    /// 帧间隔（秒）
    pub delta_time: f32,
    /// 环境光
    pub ambient_light: [f32; 4],
    /// 光源数组
    pub lights: [Light; MAX_LIGHTS],
}

impl Default for PassConstants {
    fn default() -> Self {
        Self {
            view: matrix::identity_shader_layout(),
            inv_view: matrix::identity_shader_layout(),
            proj: matrix::identity_shader_layout(),
            inv_proj: matrix::identity_shader_layout(),
            view_proj: matrix::identity_shader_layout(),
            inv_view_proj: matrix::identity_shader_layout(),
            eye_pos_w: [0.0; 3],
            _pad0: 0.0,
            render_target_size: [0.0; 2],
            inv_render_target_size: [0.0; 2],
            near_z: 0.0,
            far_z: 0.0,
            total_time: 0.0,
            delta_time: 0.0,
            ambient_light: [0.0, 0.0, 0.0, 1.0],
            lights: [Light::default(); MAX_LIGHTS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<Light>(), 48);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 128);
        assert_eq!(std::mem::size_of::<MaterialConstants>(), 96);
        // 6 个矩阵 + 标量块 + 环境光 + 光源数组
        assert_eq!(
            std::mem::size_of::<PassConstants>(),
            6 * 64 + 12 * 4 + 16 + MAX_LIGHTS * 48
        );
    }

    #[test]
    fn test_default_object_constants_identity() {
        let oc = ObjectConstants::default();
        assert_eq!(oc.world[0][0], 1.0);
        assert_eq!(oc.world[3][3], 1.0);
        assert_eq!(oc.world[3][0], 0.0);
    }
}
