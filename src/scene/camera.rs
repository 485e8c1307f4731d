//! 轨道相机
//!
//! 围绕目标点旋转的球坐标相机，每帧根据球坐标计算视点位置
//! 与视图矩阵。

use crate::math::{matrix, utils, Matrix4, Vector3};

/// 轨道相机
pub struct OrbitCamera {
    /// 水平角（绕 Y 轴，弧度）
    pub theta: f32,
    /// 俯仰角（与 Y 轴的夹角，弧度）
    phi: f32,
    /// 到目标点的距离
    radius: f32,
    /// 目标点
    pub target: Vector3,
}

impl OrbitCamera {
    /// 允许的俯仰角范围，避免在极点处视图矩阵退化
    const PHI_MIN: f32 = 0.1;
    const PHI_MAX: f32 = std::f32::consts::PI - 0.1;

    pub fn new(theta: f32, phi: f32, radius: f32) -> Self {
        Self {
            theta,
            phi: phi.clamp(Self::PHI_MIN, Self::PHI_MAX),
            radius: radius.max(1.0),
            target: Vector3::zeros(),
        }
    }

    /// 当前俯仰角
    pub fn phi(&self) -> f32 {
        self.phi
    }

    /// 当前轨道半径
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// 设置俯仰角（自动约束到合法范围）
    pub fn set_phi(&mut self, phi: f32) {
        self.phi = phi.clamp(Self::PHI_MIN, Self::PHI_MAX);
    }

    /// 设置轨道半径
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(1.0);
    }

    /// 视点的世界坐标
    pub fn eye_position(&self) -> Vector3 {
        let offset = utils::spherical_to_cartesian(self.radius, self.theta, self.phi);
        self.target + offset
    }

    /// 视图矩阵（左手系 look-at）
    pub fn view_matrix(&self) -> Matrix4 {
        matrix::look_at_lh(&self.eye_position(), &self.target, &Vector3::y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::utils::approx_eq;

    #[test]
    fn test_phi_clamped() {
        let camera = OrbitCamera::new(0.0, 10.0, 15.0);
        assert!(camera.phi() <= OrbitCamera::PHI_MAX);

        let mut camera = OrbitCamera::new(0.0, 1.0, 15.0);
        camera.set_phi(-5.0);
        assert!(camera.phi() >= OrbitCamera::PHI_MIN);
    }

    #[test]
    fn test_eye_at_configured_radius() {
        let camera = OrbitCamera::new(1.5, 0.4, 15.0);
        let eye = camera.eye_position();
        let distance = (eye - camera.target).norm();
        assert!(approx_eq(distance, 15.0, 1e-4));
    }

    #[test]
    fn test_view_matrix_invertible() {
        let camera = OrbitCamera::new(1.5 * std::f32::consts::PI, 0.2 * std::f32::consts::PI, 15.0);
        let view = camera.view_matrix();
        assert!(view.try_inverse().is_some());
    }
}
