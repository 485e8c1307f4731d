//! CastleRender - 帧资源管线演示
//!
//! 驱动一个内置场景跑完固定时长的帧循环：每帧推进帧资源环、
//! 增量刷新常量数据、录制并提交命令，GPU 时间线由命令队列模拟。
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件（config.toml）
//! cargo run
//!
//! # 命令行覆盖
//! cargo run -- --scene land_and_waves --frames 3
//! ```
//!
//! # 架构概览
//!
//! ```text
//! ┌─────────────┐
//! │   main.rs   │  帧循环驱动
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Renderer   │  update / draw
//! └──────┬──────┘
//!        │
//!   ┌────┴─────────┐
//!   │              │
//! ┌─▼─────────┐  ┌─▼──────────┐
//! │ FrameRing │  │ CommandQueue│  帧资源环与 GPU 时间线
//! └───────────┘  └────────────┘
//! ```

use anyhow::Context;
use tracing::{debug, info};

use castle_render::core::config::Config;
use castle_render::core::log;
use castle_render::core::timer::GameTimer;
use castle_render::render_error;
use castle_render::renderer::Renderer;

/// 演示运行时长（秒）
const DEMO_DURATION_SECS: f32 = 10.0;

/// 相机环绕角速度（弧度/秒）
const CAMERA_ORBIT_SPEED: f32 = 0.2;

fn main() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config = Config::from_file_or_default("config.toml");

    // 2. 应用命令行参数
    config.apply_args(std::env::args().skip(1));

    // 3. 验证配置
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // 4. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);

    info!("CastleRender starting...");
    info!(version = env!("CARGO_PKG_VERSION"), "Application initialized");
    info!(
        scene = config.scene.name.name(),
        frame_resources = config.graphics.frame_resources,
        gpu_latency_ms = config.graphics.gpu_latency_ms,
        width = config.window.width,
        height = config.window.height,
        "Pipeline configuration"
    );

    // 5. 创建渲染器
    let mut renderer = match Renderer::new(&config) {
        Ok(renderer) => renderer,
        Err(e) => {
            render_error!("Renderer initialization failed: {}", e);
            return Err(e).context("Failed to initialize renderer");
        }
    };

    // 6. 帧循环
    let mut timer = GameTimer::new();
    timer.reset();

    info!("Entering frame loop...");
    let mut frames_this_second = 0u32;
    let mut second_mark = 0.0f32;

    while timer.total_time() < DEMO_DURATION_SECS {
        timer.tick();
        let total_time = timer.total_time();
        let dt = timer.delta_time();

        // 相机缓慢环绕，持续产生 pass 常量变化
        renderer.camera.theta += CAMERA_ORBIT_SPEED * dt;

        renderer
            .update(total_time, dt)
            .context("Frame update failed")?;
        renderer.draw().context("Frame submission failed")?;

        frames_this_second += 1;
        if total_time - second_mark >= 1.0 {
            debug!(
                fps = frames_this_second,
                total_time = total_time,
                submitted = renderer.frame_number(),
                "Frame statistics"
            );
            frames_this_second = 0;
            second_mark = total_time;
        }
    }

    // 7. 退出前排空 GPU 时间线
    renderer.flush().context("Failed to drain GPU timeline")?;
    info!(frames = renderer.frame_number(), "Demo finished");
    Ok(())
}
