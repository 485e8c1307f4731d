//! 帧资源环模块
//!
//! 每个帧资源是一组独立的 GPU 可见缓冲区加一个命令分配器；
//! N 个帧资源组成一个环，CPU 写当前槽位的同时 GPU 最多还在
//! 消费其余 N-1 个槽位的数据。
//!
//! # 设计原则
//!
//! - **独占所有权**：每个环形缓冲区只属于一个帧资源，槽位之间
//!   永不共享内存
//! - **唯一阻塞点**：`advance` 是每帧路径上唯一可能阻塞的地方；
//!   把飞行中的帧数限制在 N，既限制了 GPU 领先的延迟，也限制了
//!   常量数据占用的 CPU 内存
//! - **启动时定容**：帧资源在启动时按当前对象/材质数量创建，
//!   运行期不再扩容（扩容需要排空所有飞行帧后重建整个环）

use crate::core::error::Result;
use crate::renderer::command::CommandAllocator;
use crate::renderer::constants::{MaterialConstants, ObjectConstants, PassConstants};
use crate::renderer::sync::Fence;
use crate::renderer::upload::{BufferUsageType, UploadBuffer};
use crate::renderer::vertex::Vertex;

/// 槽位状态
///
/// ```text
/// Idle（marker=0，从未提交）
///   └─> InFlight（marker=F，GPU 可能仍在处理）
///         └─> Retired（fence 已完成值 >= F）
///               └─> 复用时回到 InFlight
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// 从未提交过工作
    Idle,
    /// 已提交且 GPU 可能尚未完成
    InFlight,
    /// GPU 已确认完成，可以安全复用
    Retired,
}

/// 帧资源
///
/// 一帧的命令录制上下文加全部动态缓冲区：pass 常量（单条记录）、
/// 每对象常量、每材质常量，以及可选的动态顶点通道（水面模拟）。
pub struct FrameResource {
    /// 槽位索引
    pub index: usize,
    /// 命令分配器（GPU 确认完成前不可重置）
    pub cmd_alloc: CommandAllocator,
    /// pass 常量环形缓冲区（单条记录）
    pub pass_cb: UploadBuffer<PassConstants>,
    /// 每对象常量环形缓冲区
    pub object_cb: UploadBuffer<ObjectConstants>,
    /// 每材质常量环形缓冲区
    pub material_cb: UploadBuffer<MaterialConstants>,
    /// 动态顶点环形缓冲区（按模拟顶点数定容）
    pub waves_vb: Option<UploadBuffer<Vertex>>,
    /// 完成标记（0 = 从未提交）
    pub fence: u64,
}

impl FrameResource {
    /// 创建一个帧资源
    ///
    /// 所有缓冲区在这里一次性分配；分配失败是致命的构造错误。
    pub fn new(
        index: usize,
        object_count: usize,
        material_count: usize,
        wave_vertex_count: Option<usize>,
    ) -> Result<Self> {
        let waves_vb = match wave_vertex_count {
            Some(count) => Some(UploadBuffer::new(count, BufferUsageType::Vertex)?),
            None => None,
        };

        Ok(Self {
            index,
            cmd_alloc: CommandAllocator::new(),
            pass_cb: UploadBuffer::new(1, BufferUsageType::Constant)?,
            object_cb: UploadBuffer::new(object_count, BufferUsageType::Constant)?,
            material_cb: UploadBuffer::new(material_count, BufferUsageType::Constant)?,
            waves_vb,
            fence: 0,
        })
    }

    /// 查询槽位相对某个 Fence 的状态
    pub fn state(&self, fence: &Fence) -> SlotState {
        if self.fence == 0 {
            SlotState::Idle
        } else if fence.completed_value() >= self.fence {
            SlotState::Retired
        } else {
            SlotState::InFlight
        }
    }
}

/// 帧资源环
///
/// 固定大小的轮转集合。`advance` 选择下一个槽位并在必要时等待
/// GPU 退役；`retire` 在提交后记录槽位的完成标记。
pub struct FrameResourceRing {
    frames: Vec<FrameResource>,
    current: usize,
}

impl FrameResourceRing {
    /// 创建帧资源环
    ///
    /// # 参数
    ///
    /// * `count` - 帧资源数量 N（至少 2）
    /// * `object_count` - 渲染项数量（决定对象常量缓冲区容量）
    /// * `material_count` - 材质数量
    /// * `wave_vertex_count` - 动态顶点通道的顶点数（无水面场景为 None）
    pub fn new(
        count: usize,
        object_count: usize,
        material_count: usize,
        wave_vertex_count: Option<usize>,
    ) -> Result<Self> {
        assert!(count >= 2, "At least 2 frame resources required");

        let frames = (0..count)
            .map(|i| FrameResource::new(i, object_count, material_count, wave_vertex_count))
            .collect::<Result<Vec<_>>>()?;

        // 初始指向最后一个槽位，第一次 advance 落在槽位 0
        Ok(Self {
            current: count - 1,
            frames,
        })
    }

    /// 帧资源数量 N
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 当前槽位索引
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// 轮转到下一个槽位，必要时等待 GPU 退役
    ///
    /// 只有当槽位的标记非零且 Fence 的已完成值**小于**该标记时才
    /// 等待；`completed == marker` 恰好在边界上，不阻塞。
    pub fn advance(&mut self, fence: &Fence) -> Result<()> {
        self.current = (self.current + 1) % self.frames.len();

        let marker = self.frames[self.current].fence;
        if marker != 0 && fence.completed_value() < marker {
            fence.wait_until(marker)?;
        }
        Ok(())
    }

    /// 获取当前槽位
    pub fn current(&self) -> &FrameResource {
        &self.frames[self.current]
    }

    /// 获取当前槽位的可变引用
    pub fn current_mut(&mut self) -> &mut FrameResource {
        &mut self.frames[self.current]
    }

    /// 按索引访问槽位（测试/诊断用）
    pub fn get(&self, index: usize) -> Option<&FrameResource> {
        self.frames.get(index)
    }

    /// 提交后记录当前槽位的完成标记
    ///
    /// 调用方随后要在命令队列上 signal 同一个值。
    pub fn retire(&mut self, fence_value: u64) {
        self.frames[self.current].fence = fence_value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn ring(count: usize) -> FrameResourceRing {
        FrameResourceRing::new(count, 4, 2, None).unwrap()
    }

    #[test]
    fn test_first_advance_selects_slot_zero() {
        let fence = Fence::new();
        let mut ring = ring(3);
        ring.advance(&fence).unwrap();
        assert_eq!(ring.current_index(), 0);
    }

    #[test]
    fn test_advance_cycles_round_robin() {
        let fence = Fence::new();
        let mut ring = ring(3);
        let mut seen = Vec::new();
        for _ in 0..6 {
            ring.advance(&fence).unwrap();
            seen.push(ring.current_index());
        }
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_idle_slot_never_blocks() {
        let fence = Fence::new();
        let mut ring = ring(2);
        // 所有槽位 marker=0，advance 必须立即返回
        for _ in 0..10 {
            ring.advance(&fence).unwrap();
        }
    }

    #[test]
    fn test_slot_states() {
        let fence = Fence::new();
        let mut ring = ring(2);

        ring.advance(&fence).unwrap();
        assert_eq!(ring.current().state(&fence), SlotState::Idle);

        ring.retire(1);
        assert_eq!(ring.current().state(&fence), SlotState::InFlight);

        fence.signal(1).unwrap();
        assert_eq!(ring.current().state(&fence), SlotState::Retired);
    }

    #[test]
    fn test_advance_at_fence_boundary_does_not_block() {
        let fence = Fence::new();
        let mut ring = ring(2);

        ring.advance(&fence).unwrap(); // 槽位 0
        ring.retire(1);
        fence.signal(1).unwrap();

        ring.advance(&fence).unwrap(); // 槽位 1
        // completed(1) == 槽位 0 的 marker(1)，回到槽位 0 不允许阻塞
        ring.advance(&fence).unwrap();
        assert_eq!(ring.current_index(), 0);
    }

    #[test]
    fn test_advance_blocks_until_slot_retired() {
        let fence = Arc::new(Fence::new());
        let mut ring = ring(2);

        ring.advance(&fence).unwrap(); // 槽位 0
        ring.retire(1);
        ring.advance(&fence).unwrap(); // 槽位 1
        ring.retire(2);

        // 槽位 0 的 marker=1 尚未完成，advance 必须等待 GPU signal
        let gpu = Arc::clone(&fence);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gpu.signal(1).unwrap();
        });

        ring.advance(&fence).unwrap();
        assert_eq!(ring.current_index(), 0);
        // 等待结束后槽位必定满足复用条件
        assert!(fence.completed_value() >= ring.current().fence || ring.current().fence == 0);
        handle.join().unwrap();
    }

    #[test]
    fn test_buffers_sized_from_scene_counts() {
        let ring = FrameResourceRing::new(3, 7, 5, Some(64)).unwrap();
        for i in 0..3 {
            let frame = ring.get(i).unwrap();
            assert_eq!(frame.pass_cb.element_count(), 1);
            assert_eq!(frame.object_cb.element_count(), 7);
            assert_eq!(frame.material_cb.element_count(), 5);
            assert_eq!(frame.waves_vb.as_ref().unwrap().element_count(), 64);
        }
    }

    #[test]
    fn test_slots_never_alias() {
        let ring = FrameResourceRing::new(3, 2, 2, None).unwrap();
        let ids: Vec<u64> = (0..3)
            .map(|i| ring.get(i).unwrap().object_cb.handle().id)
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }
}
