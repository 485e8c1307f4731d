//! 命令队列模块
//!
//! 模拟 GPU 队列这一外部协作者：按提交顺序接收可执行的命令列表，
//! 并在队列推进到 signal 点时推进共享 Fence 的已完成值。
//!
//! # 设计说明
//!
//! - **程序序**：单生产者单队列，提交顺序就是 GPU 的执行顺序
//! - **两种时间线**：`Immediate` 模式下提交即完成（GPU 永远追上
//!   CPU，用于测试与无延迟运行）；`Deferred` 模式由独立的工作线程
//!   模拟 GPU 执行耗时，CPU 帧循环本身保持单线程
//! - **致命错误**：向已经关闭的队列提交属于设备级失败，不重试

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::error;

use crate::core::error::{GraphicsError, Result};
use crate::renderer::command::{CommandList, CommandListState};
use crate::renderer::sync::Fence;

/// GPU 时间线包
enum GpuPacket {
    /// 执行一个命令列表（只携带命令数，用于模拟耗时）
    Execute(usize),
    /// 队列推进到此处时 signal Fence
    Signal(u64),
}

/// 命令队列
///
/// 接收命令列表与 signal 请求的顺序流。真实后端在这里换成
/// `ID3D12CommandQueue`/`vkQueue`，帧管线的其余部分不变。
pub struct CommandQueue {
    fence: Arc<Fence>,
    sender: Option<Sender<GpuPacket>>,
    worker: Option<JoinHandle<()>>,
    submission_count: u64,
}

impl CommandQueue {
    /// 创建提交即完成的命令队列
    pub fn new(fence: Arc<Fence>) -> Self {
        Self {
            fence,
            sender: None,
            worker: None,
            submission_count: 0,
        }
    }

    /// 创建带模拟执行耗时的命令队列
    ///
    /// 工作线程按提交顺序消费队列包：每个命令列表耗时 `latency`，
    /// 随后的 signal 推进 Fence。这条线程只模拟 GPU 时间线，
    /// CPU 侧的更新与提交仍然是单线程。
    pub fn with_latency(fence: Arc<Fence>, latency: Duration) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<GpuPacket>();
        let worker_fence = Arc::clone(&fence);

        let worker = std::thread::Builder::new()
            .name("gpu-timeline".to_string())
            .spawn(move || {
                while let Ok(packet) = receiver.recv() {
                    match packet {
                        GpuPacket::Execute(_) => {
                            if !latency.is_zero() {
                                std::thread::sleep(latency);
                            }
                        }
                        GpuPacket::Signal(value) => {
                            if let Err(e) = worker_fence.signal(value) {
                                error!("GPU timeline failed to signal fence: {}", e);
                                return;
                            }
                        }
                    }
                }
            })
            .map_err(|e| {
                GraphicsError::ResourceCreation(format!(
                    "Failed to spawn GPU timeline thread: {}",
                    e
                ))
            })?;

        Ok(Self {
            fence,
            sender: Some(sender),
            worker: Some(worker),
            submission_count: 0,
        })
    }

    /// 提交一个可执行的命令列表
    pub fn execute(&mut self, list: &CommandList) -> Result<()> {
        if list.state() != CommandListState::Executable {
            return Err(GraphicsError::QueueSubmission(
                "Command list must be closed before submission".to_string(),
            )
            .into());
        }

        self.submission_count += 1;

        if let Some(sender) = &self.sender {
            sender
                .send(GpuPacket::Execute(list.commands().len()))
                .map_err(|_| GraphicsError::QueueSubmission(
                    "GPU timeline is gone".to_string(),
                ))?;
        }
        Ok(())
    }

    /// 请求队列在当前位置 signal Fence
    ///
    /// `Immediate` 模式下立即推进；`Deferred` 模式下排在已提交
    /// 工作之后，保证 signal 的值按提交顺序被观察到。
    pub fn signal(&mut self, value: u64) -> Result<()> {
        match &self.sender {
            Some(sender) => sender
                .send(GpuPacket::Signal(value))
                .map_err(|_| GraphicsError::QueueSubmission(
                    "GPU timeline is gone".to_string(),
                ).into()),
            None => self.fence.signal(value),
        }
    }

    /// 共享的完成 Fence
    pub fn fence(&self) -> &Arc<Fence> {
        &self.fence
    }

    /// 已提交的命令列表数量
    pub fn submission_count(&self) -> u64 {
        self.submission_count
    }

    /// 等待队列中所有已 signal 的工作完成
    pub fn flush(&self) -> Result<()> {
        self.fence.flush()
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        // 关闭通道让工作线程退出，然后等它结束
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
