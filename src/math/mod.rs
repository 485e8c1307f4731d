//! 统一的数学库模块
//!
//! 提供帧管线与场景更新所需的数学类型和函数。
//! 基于 `nalgebra` 但提供了更友好的 API。
//!
//! # 模块组织
//!
//! - **基础类型**：Vector2/3/4, Matrix4, Color
//! - **常量**：PI, TAU 等
//! - **工具函数**：clamp, lerp 等
//! - **矩阵辅助函数**：translation, rotation, perspective_fov_lh, look_at_lh 等
//! - **着色器布局转换**：转置 4x4 矩阵到 `[[f32; 4]; 4]`
//!
//! # 设计理念
//!
//! 与 DirectXMath 类似的 API 风格：左手坐标系投影/视图矩阵，
//! 矩阵写入常量缓冲区之前统一转置以匹配 HLSL 的存储约定。

// 工具库，不是所有函数都会立即使用
#![allow(dead_code)]

pub use nalgebra::{
    Matrix4 as Mat4, Point3,
    Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;

/// 数学常量
pub mod constants {
    /// π
    pub const PI: f32 = std::f32::consts::PI;

    /// 2π
    pub const TAU: f32 = std::f32::consts::TAU;

    /// π/2
    pub const HALF_PI: f32 = std::f32::consts::FRAC_PI_2;

    /// π/4
    pub const QUARTER_PI: f32 = std::f32::consts::FRAC_PI_4;

    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 数学工具函数
pub mod utils {
    use super::*;

    /// 限制值在范围内
    pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }

    /// 线性插值
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// 检查两个浮点数是否近似相等
    pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() < epsilon
    }

    /// 球面坐标转笛卡尔坐标
    ///
    /// 环绕相机使用：`radius` 为距离，`theta` 为水平角，`phi` 为俯仰角。
    pub fn spherical_to_cartesian(radius: f32, theta: f32, phi: f32) -> Vector3 {
        Vector3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        )
    }
}

/// 矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 创建平移矩阵
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// 创建缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 创建绕 Y 轴旋转的矩阵
    pub fn rotation_y(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::y_axis(), angle)
    }

    /// 创建左手坐标系透视投影矩阵
    ///
    /// 与 `XMMatrixPerspectiveFovLH` 等价（此处为列向量约定）。
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near_z: f32, far_z: f32) -> Matrix4 {
        let y_scale = 1.0 / (fov_y * 0.5).tan();
        let x_scale = y_scale / aspect;
        let range = far_z / (far_z - near_z);

        Matrix4::new(
            x_scale, 0.0, 0.0, 0.0,
            0.0, y_scale, 0.0, 0.0,
            0.0, 0.0, range, -range * near_z,
            0.0, 0.0, 1.0, 0.0,
        )
    }

    /// 创建左手坐标系 Look-At 视图矩阵
    ///
    /// 与 `XMMatrixLookAtLH` 等价（此处为列向量约定）。
    pub fn look_at_lh(eye: &Vector3, target: &Vector3, up: &Vector3) -> Matrix4 {
        let z_axis = (target - eye).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, -x_axis.dot(eye),
            y_axis.x, y_axis.y, y_axis.z, -y_axis.dot(eye),
            z_axis.x, z_axis.y, z_axis.z, -z_axis.dot(eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// 通用 4x4 矩阵求逆
    ///
    /// 奇异矩阵没有逆，此时返回零矩阵；下游数据因此不可用，
    /// 与参考实现的行为一致（不作为错误处理）。
    pub fn inverse(m: &Matrix4) -> Matrix4 {
        m.try_inverse().unwrap_or_else(Matrix4::zeros)
    }

    /// 将矩阵转置后存储为着色器布局的二维数组
    ///
    /// 常量缓冲区中的所有矩阵都经过这一步，匹配 HLSL 的存储约定。
    pub fn to_shader_layout(m: &Matrix4) -> [[f32; 4]; 4] {
        let t = m.transpose();
        let mut out = [[0.0f32; 4]; 4];
        for row in 0..4 {
            for col in 0..4 {
                out[row][col] = t[(row, col)];
            }
        }
        out
    }

    /// 着色器布局的单位矩阵
    pub fn identity_shader_layout() -> [[f32; 4]; 4] {
        to_shader_layout(&Matrix4::identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spherical_to_cartesian() {
        // phi = π/2, theta = 0 时落在 +X 轴上
        let v = utils::spherical_to_cartesian(5.0, 0.0, constants::HALF_PI);
        assert!(utils::approx_eq(v.x, 5.0, 1e-5));
        assert!(utils::approx_eq(v.y, 0.0, 1e-5));
        assert!(utils::approx_eq(v.z, 0.0, 1e-5));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = matrix::translation(1.0, 2.0, 3.0) * matrix::rotation_y(0.7);
        let inv = matrix::inverse(&m);
        let product = m * inv;
        let identity = Matrix4::identity();
        for row in 0..4 {
            for col in 0..4 {
                assert!(utils::approx_eq(product[(row, col)], identity[(row, col)], 1e-5));
            }
        }
    }

    #[test]
    fn test_singular_inverse_is_zero() {
        let singular = Matrix4::zeros();
        let inv = matrix::inverse(&singular);
        assert_eq!(inv, Matrix4::zeros());
    }

    #[test]
    fn test_shader_layout_is_transposed() {
        let m = matrix::translation(1.0, 2.0, 3.0);
        let layout = matrix::to_shader_layout(&m);
        // 平移分量在列向量约定里位于第四列，转置后落到第四行
        assert_eq!(layout[3][0], 1.0);
        assert_eq!(layout[3][1], 2.0);
        assert_eq!(layout[3][2], 3.0);
    }

    #[test]
    fn test_look_at_maps_eye_to_origin() {
        let eye = Vector3::new(1.0, 2.0, 3.0);
        let view = matrix::look_at_lh(&eye, &Vector3::zeros(), &Vector3::y());
        let mapped = view * Vector4::new(eye.x, eye.y, eye.z, 1.0);
        assert!(utils::approx_eq(mapped.x, 0.0, 1e-5));
        assert!(utils::approx_eq(mapped.y, 0.0, 1e-5));
        assert!(utils::approx_eq(mapped.z, 0.0, 1e-5));
    }
}
