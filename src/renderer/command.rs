//! 命令记录模块
//!
//! 提供命令分配器与命令列表的抽象：命令列表把一帧的绘制命令
//! 记录为有序的命令流，命令分配器持有录制存储，只有在 GPU
//! 确认其上一次记录的工作完成后才允许重置复用。
//!
//! # 设计原则
//!
//! - **状态机校验**：Initial → Recording → Executable，非法转换是错误
//! - **分配器归属**：每个帧资源独占一个命令分配器；帧环在等待
//!   Fence 之后才重置它，保证不会覆盖 GPU 仍在消费的命令
//! - **抽象命令流**：记录的命令只描述绑定与绘制，具体的图形 API
//!   提交由命令队列（外部协作者）解释

use crate::core::error::{GraphicsError, Result};

use super::upload::BufferHandle;

/// 图元拓扑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// 三角形列表
    TriangleList,
    /// 线列表
    LineList,
    /// 点列表
    PointList,
}

/// 命令列表状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandListState {
    /// 初始状态
    Initial,
    /// 正在记录
    Recording,
    /// 已完成记录，可提交
    Executable,
}

/// 抽象绘制命令
///
/// 足以让命令队列（或测试）观察到每次绘制绑定了哪个缓冲区的
/// 哪条记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    /// 绑定 pass 常量缓冲区（单条记录）
    SetPassBuffer(BufferHandle),
    /// 绑定对象常量记录
    SetObjectRecord { buffer: BufferHandle, index: usize },
    /// 绑定材质常量记录
    SetMaterialRecord { buffer: BufferHandle, index: usize },
    /// 绑定顶点缓冲区
    SetVertexBuffer(BufferHandle),
    /// 绑定索引缓冲区
    SetIndexBuffer(BufferHandle),
    /// 设置图元拓扑
    SetTopology(PrimitiveTopology),
    /// 索引绘制
    DrawIndexed {
        index_count: u32,
        start_index: u32,
        base_vertex: i32,
    },
}

/// 命令分配器
///
/// 命令列表录制时使用的存储。重置只能发生在 GPU 确认完成其
/// 上一次记录的全部工作之后——这一点由帧资源环在 `advance` 的
/// 等待之后调用 `reset` 来保证。
#[derive(Debug, Default)]
pub struct CommandAllocator {
    /// 可复用的录制存储
    storage: Vec<RenderCommand>,
}

impl CommandAllocator {
    /// 创建新的命令分配器
    pub fn new() -> Self {
        Self { storage: Vec::new() }
    }

    /// 重置分配器，回收录制存储
    ///
    /// 调用前提：GPU 已完成上一次从这里记录的所有命令。
    pub fn reset(&mut self) {
        self.storage.clear();
    }

    /// 当前存储的命令数量
    pub fn recorded_len(&self) -> usize {
        self.storage.len()
    }

    fn take_storage(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.storage)
    }

    fn return_storage(&mut self, storage: Vec<RenderCommand>) {
        self.storage = storage;
    }
}

/// 命令列表
///
/// 单帧绘制命令的有序记录。与 D3D12 的命令列表一样，`reset`
/// 绑定一个分配器并进入录制状态，`close` 之后才能提交。
#[derive(Debug)]
pub struct CommandList {
    /// 当前状态
    state: CommandListState,
    /// 正在记录的命令流
    commands: Vec<RenderCommand>,
}

impl CommandList {
    /// 创建新的命令列表
    pub fn new() -> Self {
        Self {
            state: CommandListState::Initial,
            commands: Vec::new(),
        }
    }

    /// 获取当前状态
    pub fn state(&self) -> CommandListState {
        self.state
    }

    /// 绑定分配器并开始录制
    ///
    /// 分配器必须已经退役（由帧环保证），否则这里会覆盖 GPU
    /// 仍在消费的命令存储。
    pub fn reset(&mut self, allocator: &mut CommandAllocator) -> Result<()> {
        match self.state {
            CommandListState::Initial | CommandListState::Executable => {
                allocator.reset();
                self.commands = allocator.take_storage();
                self.state = CommandListState::Recording;
                Ok(())
            }
            CommandListState::Recording => Err(GraphicsError::CommandExecution(
                "Cannot reset a command list while recording".to_string(),
            )
            .into()),
        }
    }

    /// 记录一条命令
    pub fn record(&mut self, command: RenderCommand) -> Result<()> {
        if self.state != CommandListState::Recording {
            return Err(GraphicsError::CommandExecution(
                "Command list is not in recording state".to_string(),
            )
            .into());
        }
        self.commands.push(command);
        Ok(())
    }

    /// 结束录制，进入可提交状态
    pub fn close(&mut self) -> Result<()> {
        if self.state != CommandListState::Recording {
            return Err(GraphicsError::CommandExecution(
                "Command list is not in recording state".to_string(),
            )
            .into());
        }
        self.state = CommandListState::Executable;
        Ok(())
    }

    /// 获取已录制的命令流（提交侧读取）
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// 提交后把命令存储归还给分配器
    ///
    /// 命令流的所有权回到分配器，GPU 消费期间由帧环的 Fence
    /// 标记保护。
    pub fn release_to(&mut self, allocator: &mut CommandAllocator) {
        allocator.return_storage(std::mem::take(&mut self.commands));
    }
}

impl Default for CommandList {
    fn default() -> Self {
        Self::new()
    }
}
