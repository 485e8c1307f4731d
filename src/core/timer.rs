//! 帧计时器模块
//!
//! 提供帧循环所需的时间测量：帧间隔（delta time）和累计运行时间，
//! 并支持暂停/恢复（暂停期间不计入累计时间）。
//!
//! # 使用示例
//!
//! ```no_run
//! use castle_render::core::timer::GameTimer;
//!
//! let mut timer = GameTimer::new();
//! timer.reset();
//! loop {
//!     timer.tick();
//!     let dt = timer.delta_time();
//!     let t = timer.total_time();
//!     // 更新与渲染……
//!     # break;
//! }
//! ```

use std::time::{Duration, Instant};

/// 帧计时器
///
/// 累计时间不包含暂停时段：
///
/// ```text
/// |<-- paused -->|
/// base   stop    start        now
/// total_time = (now - base) - paused
/// ```
#[derive(Debug, Clone)]
pub struct GameTimer {
    /// 计时起点
    base_time: Instant,
    /// 暂停时段的累计时长
    paused_duration: Duration,
    /// 暂停时刻（None 表示正在运行）
    stop_time: Option<Instant>,
    /// 上一次 tick 的时刻
    prev_time: Instant,
    /// 当前帧间隔（秒）
    delta_time: f32,
}

impl GameTimer {
    /// 创建新的计时器（已处于运行状态）
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            base_time: now,
            paused_duration: Duration::ZERO,
            stop_time: None,
            prev_time: now,
            delta_time: 0.0,
        }
    }

    /// 重置计时起点（在进入主循环前调用）
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.base_time = now;
        self.prev_time = now;
        self.paused_duration = Duration::ZERO;
        self.stop_time = None;
        self.delta_time = 0.0;
    }

    /// 暂停计时
    pub fn stop(&mut self) {
        if self.stop_time.is_none() {
            self.stop_time = Some(Instant::now());
        }
    }

    /// 恢复计时
    pub fn start(&mut self) {
        if let Some(stop) = self.stop_time.take() {
            let now = Instant::now();
            self.paused_duration += now - stop;
            self.prev_time = now;
        }
    }

    /// 每帧调用一次，推进帧间隔
    pub fn tick(&mut self) {
        if self.stop_time.is_some() {
            self.delta_time = 0.0;
            return;
        }

        let now = Instant::now();
        self.delta_time = (now - self.prev_time).as_secs_f32();
        self.prev_time = now;
    }

    /// 当前帧间隔（秒）
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// 自 reset 以来的累计运行时间（秒，不含暂停时段）
    pub fn total_time(&self) -> f32 {
        match self.stop_time {
            Some(stop) => ((stop - self.base_time) - self.paused_duration).as_secs_f32(),
            None => ((Instant::now() - self.base_time) - self.paused_duration).as_secs_f32(),
        }
    }

    /// 是否处于暂停状态
    pub fn is_stopped(&self) -> bool {
        self.stop_time.is_some()
    }
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tick_advances_delta() {
        let mut timer = GameTimer::new();
        timer.reset();
        thread::sleep(Duration::from_millis(2));
        timer.tick();
        assert!(timer.delta_time() > 0.0);
    }

    #[test]
    fn test_stopped_timer_has_zero_delta() {
        let mut timer = GameTimer::new();
        timer.reset();
        timer.stop();
        thread::sleep(Duration::from_millis(2));
        timer.tick();
        assert_eq!(timer.delta_time(), 0.0);
    }

    #[test]
    fn test_total_time_frozen_while_stopped() {
        let mut timer = GameTimer::new();
        timer.reset();
        timer.stop();
        let t0 = timer.total_time();
        thread::sleep(Duration::from_millis(5));
        let t1 = timer.total_time();
        assert_eq!(t0, t1);
    }

    #[test]
    fn test_pause_excluded_from_total() {
        let mut timer = GameTimer::new();
        timer.reset();
        thread::sleep(Duration::from_millis(2));
        timer.stop();
        thread::sleep(Duration::from_millis(10));
        timer.start();
        // 暂停的 10ms 不应计入累计时间
        assert!(timer.total_time() < 0.010);
    }
}
