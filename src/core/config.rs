//! 配置管理模块
//!
//! 提供渲染器配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 800
//! height = 600
//! title = "CastleRender"
//!
//! [graphics]
//! frame_resources = 3   # 飞行中帧数 N
//! gpu_latency_ms = 4    # 模拟 GPU 执行一帧的耗时（0 = 立即完成）
//!
//! [scene]
//! name = "castle"       # castle / columns / land_and_waves
//! wave_rows = 128
//! wave_cols = 128
//!
//! [logging]
//! level = "info"        # trace, debug, info, warn, error
//! file_output = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 渲染器配置
///
/// 包含了渲染器运行所需的所有配置项。
/// 可以从配置文件加载，也可以通过代码构建。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置（渲染目标尺寸）
    pub window: WindowConfig,

    /// 图形配置
    pub graphics: GraphicsConfig,

    /// 场景配置
    pub scene: SceneSelection,

    /// 日志配置
    pub logging: LoggingConfig,
}

/// 窗口配置
///
/// 窗口/消息循环本身由外部代码负责，这里只保留渲染目标尺寸，
/// 用于计算 pass 常量中的 RenderTargetSize 与投影矩阵纵横比。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 渲染目标宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 渲染目标高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 帧资源数量（飞行中帧数 N）
    #[serde(default = "default_frame_resources")]
    pub frame_resources: usize,

    /// 模拟 GPU 执行一帧的耗时（毫秒，0 表示提交即完成）
    #[serde(default = "default_gpu_latency")]
    pub gpu_latency_ms: u64,
}

/// 场景选择
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSelection {
    /// 场景名称
    #[serde(default = "default_scene")]
    pub name: SceneKind,

    /// 波浪网格行数（仅含水面的场景使用）
    #[serde(default = "default_wave_rows")]
    pub wave_rows: usize,

    /// 波浪网格列数
    #[serde(default = "default_wave_cols")]
    pub wave_cols: usize,
}

/// 内置场景类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    /// 城堡场景（含水面动画）
    Castle,
    /// 柱廊场景（静态几何）
    Columns,
    /// 陆地与波浪场景
    LandAndWaves,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_title() -> String { "CastleRender".to_string() }
fn default_frame_resources() -> usize { 3 }
fn default_gpu_latency() -> u64 { 0 }
fn default_scene() -> SceneKind { SceneKind::Castle }
fn default_wave_rows() -> usize { 128 }
fn default_wave_cols() -> usize { 128 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "castle_render.log".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            graphics: GraphicsConfig::default(),
            scene: SceneSelection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            frame_resources: default_frame_resources(),
            gpu_latency_ms: default_gpu_latency(),
        }
    }
}

impl Default for SceneSelection {
    fn default() -> Self {
        Self {
            name: default_scene(),
            wave_rows: default_wave_rows(),
            wave_cols: default_wave_cols(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 从命令行参数覆盖配置
    ///
    /// # 说明
    ///
    /// 支持的参数：
    /// - `--scene <name>`: 选择场景（castle / columns / land_and_waves）
    /// - `--frames <n>`: 设置帧资源数量
    /// - `--width <value>` / `--height <value>`: 设置渲染目标尺寸
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if let Some(idx) = args.iter().position(|a| a == "--scene") {
            if let Some(name) = args.get(idx + 1) {
                match name.as_str() {
                    "castle" => self.scene.name = SceneKind::Castle,
                    "columns" => self.scene.name = SceneKind::Columns,
                    "land_and_waves" => self.scene.name = SceneKind::LandAndWaves,
                    _ => {}
                }
            }
        }

        if let Some(idx) = args.iter().position(|a| a == "--frames") {
            if let Some(n_str) = args.get(idx + 1) {
                if let Ok(n) = n_str.parse() {
                    self.graphics.frame_resources = n;
                }
            }
        }

        if let Some(idx) = args.iter().position(|a| a == "--width") {
            if let Some(width_str) = args.get(idx + 1) {
                if let Ok(width) = width_str.parse() {
                    self.window.width = width;
                }
            }
        }

        if let Some(idx) = args.iter().position(|a| a == "--height") {
            if let Some(height_str) = args.get(idx + 1) {
                if let Ok(height) = height_str.parse() {
                    self.window.height = height;
                }
            }
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        // 验证渲染目标尺寸
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Render target dimensions must be greater than 0".to_string(),
            }.into());
        }

        // 帧资源环至少要有两帧才能让 CPU 和 GPU 并行
        if self.graphics.frame_resources < 2 {
            return Err(ConfigError::InvalidValue {
                field: "graphics.frame_resources".to_string(),
                reason: "At least 2 frame resources are required".to_string(),
            }.into());
        }

        // 波浪求解器的扰动范围要求网格不小于 9x9
        if self.scene.wave_rows < 9 || self.scene.wave_cols < 9 {
            return Err(ConfigError::InvalidValue {
                field: "scene.wave_rows/wave_cols".to_string(),
                reason: "Wave grid must be at least 9x9".to_string(),
            }.into());
        }

        Ok(())
    }
}

impl SceneKind {
    /// 获取场景名称
    pub fn name(&self) -> &'static str {
        match self {
            SceneKind::Castle => "castle",
            SceneKind::Columns => "columns",
            SceneKind::LandAndWaves => "land_and_waves",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.graphics.frame_resources, 3);
        assert_eq!(config.scene.name, SceneKind::Castle);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        config.window.width = 800;
        config.graphics.frame_resources = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(["--scene", "columns", "--frames", "4"]);
        assert_eq!(config.scene.name, SceneKind::Columns);
        assert_eq!(config.graphics.frame_resources, 4);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [window]
            width = 1280
            height = 720

            [graphics]
            frame_resources = 2

            [scene]
            name = "land_and_waves"

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.graphics.frame_resources, 2);
        assert_eq!(config.scene.name, SceneKind::LandAndWaves);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
