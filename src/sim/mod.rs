//! 模拟模块
//!
//! 场景中每帧变化的动态内容：目前只有水面的波动方程求解器。

pub mod waves;

pub use waves::Waves;
