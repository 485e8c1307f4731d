//! GPU 同步机制模块
//!
//! 提供 CPU-GPU 同步的 Fence 原语：一个单调递增的 64 位时间线，
//! GPU 队列推进到某个提交点后 signal 对应的值，CPU 据此判断
//! 某个帧资源是否可以安全复用。
//!
//! # 设计原则
//!
//! - **单调性**：CPU 观察到的已完成值永不回退
//! - **一次性等待**：`wait_until` 把调用线程挂起在完成原语上，
//!   直到时间线到达目标值；这是每帧路径上唯一的阻塞点
//! - **致命错误**：等待/signal 原语失败没有恢复路径，直接上抛

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};

use crate::core::error::{Result, SyncError};

/// 完成 Fence
///
/// CPU 侧通过 `next_value` 分配提交标记，GPU 时间线通过 `signal`
/// 推进已完成值，`wait_until` 在两者之间建立同步。
///
/// # 示例
///
/// ```rust,ignore
/// let fence = Arc::new(Fence::new());
///
/// // 提交工作并记录标记
/// let marker = fence.next_value();
/// queue.signal(marker);
///
/// // 复用资源前等待
/// fence.wait_until(marker)?;
/// ```
pub struct Fence {
    /// 当前已分配的最大标记（CPU 侧）
    current_value: AtomicU64,
    /// 已完成值（GPU 侧推进）
    completed: AtomicU64,
    /// 等待线程挂起用的锁与条件变量
    wait_lock: Mutex<()>,
    wait_cv: Condvar,
}

impl Fence {
    /// 创建新的 Fence，时间线从 0 开始
    ///
    /// 标记 0 被保留为"从未提交"，`next_value` 从 1 开始分配。
    pub fn new() -> Self {
        Self {
            current_value: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            wait_lock: Mutex::new(()),
            wait_cv: Condvar::new(),
        }
    }

    /// 分配下一个提交标记并递增计数器
    pub fn next_value(&self) -> u64 {
        self.current_value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// 获取当前已分配的最大标记
    pub fn current_value(&self) -> u64 {
        self.current_value.load(Ordering::Acquire)
    }

    /// 获取已完成值
    ///
    /// 连续两次调用之间观察到的值保证非递减。
    pub fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// 检查某个标记是否已完成
    pub fn is_completed(&self, value: u64) -> bool {
        self.completed_value() >= value
    }

    /// 推进已完成值（GPU 时间线调用）
    ///
    /// 使用 fetch_max 保证时间线只向前推进；乱序的 signal 不会让
    /// 已完成值回退。
    pub fn signal(&self, value: u64) -> Result<()> {
        self.completed.fetch_max(value, Ordering::AcqRel);

        // 唤醒所有等待线程；锁只用于和 wait_until 的检查建立先后关系
        let _guard = self
            .wait_lock
            .lock()
            .map_err(|e| SyncError::SignalFailed(e.to_string()))?;
        self.wait_cv.notify_all();
        Ok(())
    }

    /// 阻塞等待时间线到达目标值
    ///
    /// 已完成值 >= value 时立即返回（不阻塞）；否则挂起调用线程，
    /// 直到 GPU 时间线 signal 推进到位。等待没有超时：参考实现
    /// 在 GPU 挂起时同样会无限等待。
    pub fn wait_until(&self, value: u64) -> Result<()> {
        if self.is_completed(value) {
            return Ok(());
        }

        let mut guard = self
            .wait_lock
            .lock()
            .map_err(|e| SyncError::WaitFailed(e.to_string()))?;
        while !self.is_completed(value) {
            guard = self
                .wait_cv
                .wait(guard)
                .map_err(|e| SyncError::WaitFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// 等待所有已分配标记完成（清空队列）
    pub fn flush(&self) -> Result<()> {
        self.wait_until(self.current_value())
    }
}

impl Default for Fence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_next_value_sequence() {
        let fence = Fence::new();
        assert_eq!(fence.current_value(), 0);
        assert_eq!(fence.next_value(), 1);
        assert_eq!(fence.next_value(), 2);
        assert_eq!(fence.current_value(), 2);
    }

    #[test]
    fn test_signal_and_completion() {
        let fence = Fence::new();
        let v1 = fence.next_value();
        let v2 = fence.next_value();

        fence.signal(v1).unwrap();
        assert!(fence.is_completed(v1));
        assert!(!fence.is_completed(v2));

        fence.signal(v2).unwrap();
        assert!(fence.is_completed(v2));
    }

    #[test]
    fn test_completed_value_monotonic() {
        let fence = Fence::new();
        fence.signal(5).unwrap();
        assert_eq!(fence.completed_value(), 5);

        // 乱序的低值 signal 不能让时间线回退
        fence.signal(3).unwrap();
        assert_eq!(fence.completed_value(), 5);
    }

    #[test]
    fn test_wait_at_boundary_does_not_block() {
        let fence = Fence::new();
        fence.signal(7).unwrap();
        // completed == value 正好在边界上，必须立即返回
        fence.wait_until(7).unwrap();
    }

    #[test]
    fn test_wait_blocks_until_signaled() {
        let fence = Arc::new(Fence::new());
        let marker = fence.next_value();

        let gpu = Arc::clone(&fence);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gpu.signal(marker).unwrap();
        });

        fence.wait_until(marker).unwrap();
        assert!(fence.is_completed(marker));
        handle.join().unwrap();
    }

    #[test]
    fn test_flush_waits_for_all_markers() {
        let fence = Arc::new(Fence::new());
        let m1 = fence.next_value();
        let m2 = fence.next_value();

        let gpu = Arc::clone(&fence);
        let handle = thread::spawn(move || {
            gpu.signal(m1).unwrap();
            thread::sleep(Duration::from_millis(10));
            gpu.signal(m2).unwrap();
        });

        fence.flush().unwrap();
        assert_eq!(fence.completed_value(), 2);
        handle.join().unwrap();
    }
}
