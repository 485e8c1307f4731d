//! CastleRender - 帧资源管线演示渲染器
//!
//! CastleRender 围绕"帧资源"组织 CPU 与 GPU 的并行：N 份独立的
//! 常量/顶点缓冲区组成一个环，CPU 写当前槽位时 GPU 最多还在消费
//! 其余 N-1 个槽位，两条时间线通过单调 Fence 对齐。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（配置、日志、错误处理、计时器）
//! - `math`: 数学库（左手系矩阵、着色器布局转换）
//! - `renderer`: 帧资源环、上传缓冲区、Fence、命令队列
//! - `geometry`: 网格容器与程序化形状构建器
//! - `scene`: 渲染项/材质注册表、场景构建器、相机
//! - `sim`: 波动方程求解器（动态水面）
//!
//! # 使用示例
//!
//! ```no_run
//! use castle_render::core::config::Config;
//! use castle_render::renderer::Renderer;
//!
//! let config = Config::default();
//! let mut renderer = Renderer::new(&config).unwrap();
//!
//! // 每帧：推进帧资源环、增量写入常量、录制并提交
//! renderer.update(0.016, 0.016).unwrap();
//! renderer.draw().unwrap();
//! ```

pub mod core;
pub mod geometry;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod sim;
