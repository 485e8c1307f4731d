//! 水面波动模拟
//!
//! 网格上的二维波动方程求解器：固定时间步长推进，双缓冲
//! 前/当前解，边界顶点固定为零，法线与切线用中心差分重建。
//!
//! 求解器每帧产出全量的新顶点位置——动态顶点通道因此没有
//! 脏跟踪，整个缓冲区无条件重写。

use crate::math::Vector3;

/// 水面波动求解器
///
/// # 示例
///
/// ```rust,ignore
/// let mut waves = Waves::new(128, 128, 1.0, 0.03, 4.0, 0.2);
/// waves.disturb(50, 50, 0.2);
/// waves.update(dt);
/// let p = waves.position(0);
/// ```
pub struct Waves {
    num_rows: usize,
    num_cols: usize,
    vertex_count: usize,
    triangle_count: usize,

    /// 差分格式系数（由速度/阻尼/步长预计算）
    k1: f32,
    k2: f32,
    k3: f32,

    /// 固定模拟步长的累加器
    accumulated: f32,
    time_step: f32,
    spatial_step: f32,

    prev_solution: Vec<Vector3>,
    curr_solution: Vec<Vector3>,
    normals: Vec<Vector3>,
    tangent_x: Vec<Vector3>,
}

impl Waves {
    /// 创建求解器
    ///
    /// # 参数
    ///
    /// * `m`/`n` - 网格行/列数
    /// * `dx` - 空间步长
    /// * `dt` - 模拟时间步长
    /// * `speed` - 波速（受稳定性约束）
    /// * `damping` - 阻尼系数
    pub fn new(m: usize, n: usize, dx: f32, dt: f32, speed: f32, damping: f32) -> Self {
        assert!(m >= 9 && n >= 9, "Wave grid must be at least 9x9");

        let d = damping * dt + 2.0;
        let e = (speed * speed) * (dt * dt) / (dx * dx);
        let k1 = (damping * dt - 2.0) / d;
        let k2 = (4.0 - 8.0 * e) / d;
        let k3 = (2.0 * e) / d;

        let half_width = (n - 1) as f32 * dx * 0.5;
        let half_depth = (m - 1) as f32 * dx * 0.5;

        let mut grid = Vec::with_capacity(m * n);
        for i in 0..m {
            let z = half_depth - i as f32 * dx;
            for j in 0..n {
                let x = -half_width + j as f32 * dx;
                grid.push(Vector3::new(x, 0.0, z));
            }
        }

        Self {
            num_rows: m,
            num_cols: n,
            vertex_count: m * n,
            triangle_count: (m - 1) * (n - 1) * 2,
            k1,
            k2,
            k3,
            accumulated: 0.0,
            time_step: dt,
            spatial_step: dx,
            prev_solution: grid.clone(),
            curr_solution: grid,
            normals: vec![Vector3::new(0.0, 1.0, 0.0); m * n],
            tangent_x: vec![Vector3::new(1.0, 0.0, 0.0); m * n],
        }
    }

    pub fn row_count(&self) -> usize {
        self.num_rows
    }

    pub fn column_count(&self) -> usize {
        self.num_cols
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// 水面总宽度（X 方向）
    pub fn width(&self) -> f32 {
        (self.num_cols - 1) as f32 * self.spatial_step
    }

    /// 水面总深度（Z 方向）
    pub fn depth(&self) -> f32 {
        (self.num_rows - 1) as f32 * self.spatial_step
    }

    /// 第 i 个顶点的位置
    pub fn position(&self, i: usize) -> Vector3 {
        self.curr_solution[i]
    }

    /// 第 i 个顶点的法线
    pub fn normal(&self, i: usize) -> Vector3 {
        self.normals[i]
    }

    /// 第 i 个顶点的 X 切线
    pub fn tangent_x(&self, i: usize) -> Vector3 {
        self.tangent_x[i]
    }

    /// 推进模拟
    ///
    /// 只有累计时间达到固定步长才推进一步，帧率与模拟步长解耦。
    pub fn update(&mut self, dt: f32) {
        self.accumulated += dt;

        if self.accumulated < self.time_step {
            return;
        }
        self.accumulated = 0.0;

        let n = self.num_cols;

        // 只更新内部顶点，边界固定为零位移
        for i in 1..self.num_rows - 1 {
            for j in 1..self.num_cols - 1 {
                // 更新后 prev 变为最新解，随后与 curr 交换。
                // 按行写 prev 不影响本步读取的 curr 邻域。
                let idx = i * n + j;
                self.prev_solution[idx].y = self.k1 * self.prev_solution[idx].y
                    + self.k2 * self.curr_solution[idx].y
                    + self.k3
                        * (self.curr_solution[(i + 1) * n + j].y
                            + self.curr_solution[(i - 1) * n + j].y
                            + self.curr_solution[idx + 1].y
                            + self.curr_solution[idx - 1].y);
            }
        }

        std::mem::swap(&mut self.prev_solution, &mut self.curr_solution);

        // 中心差分重建法线与切线
        for i in 1..self.num_rows - 1 {
            for j in 1..self.num_cols - 1 {
                let idx = i * n + j;
                let l = self.curr_solution[idx - 1].y;
                let r = self.curr_solution[idx + 1].y;
                let t = self.curr_solution[(i - 1) * n + j].y;
                let b = self.curr_solution[(i + 1) * n + j].y;

                self.normals[idx] =
                    Vector3::new(l - r, 2.0 * self.spatial_step, b - t).normalize();
                self.tangent_x[idx] =
                    Vector3::new(2.0 * self.spatial_step, r - l, 0.0).normalize();
            }
        }
    }

    /// 在 (i, j) 处激起一个波峰
    ///
    /// 扰动量的一半扩散到四个相邻顶点。只允许扰动远离边界的
    /// 内部顶点，保证波及范围不会触碰固定边界。
    pub fn disturb(&mut self, i: usize, j: usize, magnitude: f32) {
        assert!(i > 1 && i < self.num_rows - 2, "Disturb row out of interior range");
        assert!(j > 1 && j < self.num_cols - 2, "Disturb column out of interior range");

        let n = self.num_cols;
        let half = 0.5 * magnitude;

        self.curr_solution[i * n + j].y += magnitude;
        self.curr_solution[i * n + j + 1].y += half;
        self.curr_solution[i * n + j - 1].y += half;
        self.curr_solution[(i + 1) * n + j].y += half;
        self.curr_solution[(i - 1) * n + j].y += half;
    }
}
