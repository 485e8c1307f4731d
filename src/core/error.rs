//! 错误处理模块
//!
//! 定义了渲染器中使用的统一错误类型。
//!
//! # 设计原则
//!
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）
//! - 易于模式匹配和错误处理
//! - 致命错误（初始化/同步失败）通过 `?` 一路上抛到 main，不做重试

use std::fmt;

/// 渲染器统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, CastleRenderError>;

/// CastleRender 的错误类型
///
/// 包含了渲染器运行过程中可能遇到的各种错误情况。
#[derive(Debug)]
pub enum CastleRenderError {
    /// 配置错误
    Config(ConfigError),

    /// 图形资源/命令错误
    Graphics(GraphicsError),

    /// CPU-GPU 同步错误
    Sync(SyncError),

    /// 场景构建错误
    Scene(SceneError),

    /// IO 错误
    Io(std::io::Error),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形资源相关的错误
///
/// 这些错误都是致命的：没有资源和命令通路就没有任何一帧可以渲染。
#[derive(Debug)]
pub enum GraphicsError {
    /// 资源创建失败（缓冲区分配等）
    ResourceCreation(String),

    /// 渲染命令记录/执行失败
    CommandExecution(String),

    /// 命令队列提交失败
    QueueSubmission(String),
}

/// 同步原语相关的错误
///
/// Fence 的等待/signal 失败意味着驱动或系统层面出了问题，同样致命。
#[derive(Debug)]
pub enum SyncError {
    /// 等待原语失败
    WaitFailed(String),

    /// signal 失败
    SignalFailed(String),
}

/// 场景构建相关的错误
#[derive(Debug)]
pub enum SceneError {
    /// 对象常量缓冲区索引重复
    DuplicateObjectIndex(usize),

    /// 材质名称或索引重复
    DuplicateMaterial(String),

    /// 几何体名称重复
    DuplicateGeometry(String),

    /// 引用了未注册的几何体
    UnknownGeometry(String),

    /// 引用了未注册的子网格
    UnknownSubmesh(String),

    /// 引用了未注册的材质
    UnknownMaterial(String),
}

impl fmt::Display for CastleRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastleRenderError::Config(e) => write!(f, "Configuration error: {}", e),
            CastleRenderError::Graphics(e) => write!(f, "Graphics error: {}", e),
            CastleRenderError::Sync(e) => write!(f, "Synchronization error: {}", e),
            CastleRenderError::Scene(e) => write!(f, "Scene error: {}", e),
            CastleRenderError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::QueueSubmission(msg) => write!(f, "Queue submission failed: {}", msg),
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::WaitFailed(msg) => write!(f, "Fence wait failed: {}", msg),
            SyncError::SignalFailed(msg) => write!(f, "Fence signal failed: {}", msg),
        }
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::DuplicateObjectIndex(idx) => {
                write!(f, "Duplicate object constant buffer index: {}", idx)
            }
            SceneError::DuplicateMaterial(name) => {
                write!(f, "Duplicate material: {}", name)
            }
            SceneError::DuplicateGeometry(name) => {
                write!(f, "Duplicate geometry: {}", name)
            }
            SceneError::UnknownGeometry(name) => {
                write!(f, "Unknown geometry: {}", name)
            }
            SceneError::UnknownSubmesh(name) => {
                write!(f, "Unknown submesh: {}", name)
            }
            SceneError::UnknownMaterial(name) => {
                write!(f, "Unknown material: {}", name)
            }
        }
    }
}

impl std::error::Error for CastleRenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CastleRenderError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for SyncError {}
impl std::error::Error for SceneError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for CastleRenderError {
    fn from(err: std::io::Error) -> Self {
        CastleRenderError::Io(err)
    }
}

impl From<ConfigError> for CastleRenderError {
    fn from(err: ConfigError) -> Self {
        CastleRenderError::Config(err)
    }
}

impl From<GraphicsError> for CastleRenderError {
    fn from(err: GraphicsError) -> Self {
        CastleRenderError::Graphics(err)
    }
}

impl From<SyncError> for CastleRenderError {
    fn from(err: SyncError) -> Self {
        CastleRenderError::Sync(err)
    }
}

impl From<SceneError> for CastleRenderError {
    fn from(err: SceneError) -> Self {
        CastleRenderError::Scene(err)
    }
}
