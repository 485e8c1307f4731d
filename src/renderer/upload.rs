//! 上传缓冲区模块
//!
//! 提供 CPU 可写、GPU 可读的按记录索引的固定步长缓冲区，
//! 也就是每个帧资源持有的"环形记录数组"。
//!
//! # 设计原则
//!
//! - **持久映射**：缓冲区在创建时一次性分配并映射，生命周期内保持可写
//! - **自动对齐**：常量缓冲区的记录步长对齐到 256 字节边界
//! - **单写者**：缓冲区由其所属帧资源独占，帧管线保证 GPU 读与 CPU 写
//!   不会落在同一飞行帧的同一条记录上
//! - **类型安全**：通过 `bytemuck::Pod` 约束保证按字节写入是合法的

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;

use crate::core::error::{GraphicsError, Result};

/// DirectX 12 常量缓冲区的最小对齐要求（字节）
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsageType {
    /// 顶点缓冲区（记录步长不填充）
    Vertex,
    /// 索引缓冲区
    Index,
    /// 常量缓冲区（记录步长对齐到 256 字节）
    Constant,
}

/// 缓冲区绑定句柄
///
/// 提交绘制命令时对底层资源的不透明引用：`id` 标识资源，
/// `stride` 用于根据记录索引计算绑定偏移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHandle {
    /// 资源标识
    pub id: u64,
    /// 每条记录的步长（对齐后，字节）
    pub stride: u64,
}

impl BufferHandle {
    /// 计算指定记录的绑定偏移
    pub fn offset_of(&self, index: usize) -> u64 {
        self.stride * index as u64
    }
}

// 句柄 id 全局递增，保证不同缓冲区的句柄不相等
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// 上传缓冲区
///
/// 固定数量、固定步长的记录数组，持久映射在 CPU 可见内存中。
/// 写入第 i 条记录落在 `i * stride` 偏移处，不影响其它记录。
///
/// # 类型参数
///
/// * `T` - 记录类型，必须是 `Pod`
///
/// # 示例
///
/// ```rust,ignore
/// let mut buffer = UploadBuffer::<ObjectConstants>::new(16, BufferUsageType::Constant)?;
/// buffer.copy_record(0, &constants);
/// let handle = buffer.handle();
/// ```
pub struct UploadBuffer<T: Pod> {
    /// 记录数量
    element_count: usize,
    /// 每条记录的步长（对齐后）
    element_size: u64,
    /// 使用类型
    usage: BufferUsageType,
    /// 持久映射的 CPU 可见内存区域
    mapped: Vec<u8>,
    /// 资源标识
    id: u64,
    /// 累计写入次数（诊断/测试用）
    write_count: u64,
    /// 幻影数据，用于类型参数
    _phantom: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    /// 创建新的上传缓冲区
    ///
    /// 分配 `element_count * aligned_stride` 字节并保持映射。
    /// 分配失败是致命错误：没有这块缓冲区就没有任何一帧可以渲染。
    pub fn new(element_count: usize, usage: BufferUsageType) -> Result<Self> {
        if element_count == 0 {
            return Err(GraphicsError::ResourceCreation(
                "Upload buffer element count must be greater than 0".to_string(),
            )
            .into());
        }

        let element_size = Self::aligned_stride(usage);
        let total_size = element_size * element_count as u64;

        Ok(Self {
            element_count,
            element_size,
            usage,
            mapped: vec![0u8; total_size as usize],
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            write_count: 0,
            _phantom: PhantomData,
        })
    }

    /// 计算记录步长
    ///
    /// 常量缓冲区对齐到 256 字节边界，顶点/索引缓冲区按原始大小排列。
    fn aligned_stride(usage: BufferUsageType) -> u64 {
        let element_size = std::mem::size_of::<T>() as u64;
        if usage == BufferUsageType::Constant {
            (element_size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
        } else {
            element_size
        }
    }

    /// 将一条记录写入指定索引处
    ///
    /// # Panics
    ///
    /// `index >= element_count` 属于契约违反，直接 panic。
    pub fn copy_record(&mut self, index: usize, data: &T) {
        assert!(
            index < self.element_count,
            "Upload buffer index {} out of bounds (count {})",
            index,
            self.element_count
        );

        let offset = (self.element_size * index as u64) as usize;
        let bytes = bytemuck::bytes_of(data);
        self.mapped[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.write_count += 1;
    }

    /// 获取绑定句柄
    pub fn handle(&self) -> BufferHandle {
        BufferHandle {
            id: self.id,
            stride: self.element_size,
        }
    }

    /// 读取指定索引处的记录字节（GPU 读取侧/测试用）
    pub fn record_bytes(&self, index: usize) -> &[u8] {
        assert!(index < self.element_count, "Upload buffer index out of bounds");
        let offset = (self.element_size * index as u64) as usize;
        &self.mapped[offset..offset + std::mem::size_of::<T>()]
    }

    /// 读取指定索引处的记录
    pub fn read_record(&self, index: usize) -> T {
        bytemuck::pod_read_unaligned(self.record_bytes(index))
    }

    /// 获取记录数量
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// 获取每条记录的步长（对齐后）
    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    /// 获取总大小（字节）
    pub fn total_size(&self) -> u64 {
        self.element_size * self.element_count as u64
    }

    /// 获取使用类型
    pub fn usage(&self) -> BufferUsageType {
        self.usage
    }

    /// 累计写入次数
    ///
    /// 脏标记传播的验证手段：计数在写入路径被最小化时不会增长。
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    struct TestRecord {
        values: [f32; 5],
    }

    #[test]
    fn test_constant_buffer_stride_alignment() {
        let buffer = UploadBuffer::<TestRecord>::new(4, BufferUsageType::Constant).unwrap();
        assert_eq!(buffer.element_size(), 256);
        assert_eq!(buffer.total_size(), 1024);
    }

    #[test]
    fn test_vertex_buffer_stride_unpadded() {
        let buffer = UploadBuffer::<TestRecord>::new(4, BufferUsageType::Vertex).unwrap();
        assert_eq!(buffer.element_size(), 20);
        assert_eq!(buffer.total_size(), 80);
    }

    #[test]
    fn test_zero_element_count_fails() {
        assert!(UploadBuffer::<TestRecord>::new(0, BufferUsageType::Constant).is_err());
    }

    #[test]
    fn test_copy_record_roundtrip() {
        let mut buffer = UploadBuffer::<TestRecord>::new(3, BufferUsageType::Constant).unwrap();
        let record = TestRecord { values: [1.0, 2.0, 3.0, 4.0, 5.0] };

        buffer.copy_record(1, &record);
        assert_eq!(buffer.read_record(1), record);
        assert_eq!(buffer.record_bytes(1), bytemuck::bytes_of(&record));
    }

    #[test]
    fn test_copy_record_does_not_perturb_neighbors() {
        let mut buffer = UploadBuffer::<TestRecord>::new(3, BufferUsageType::Constant).unwrap();
        let a = TestRecord { values: [1.0; 5] };
        let b = TestRecord { values: [2.0; 5] };

        buffer.copy_record(0, &a);
        buffer.copy_record(2, &a);
        buffer.copy_record(1, &b);

        assert_eq!(buffer.read_record(0), a);
        assert_eq!(buffer.read_record(1), b);
        assert_eq!(buffer.read_record(2), a);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_copy_record_out_of_bounds_panics() {
        let mut buffer = UploadBuffer::<TestRecord>::new(2, BufferUsageType::Constant).unwrap();
        buffer.copy_record(2, &TestRecord { values: [0.0; 5] });
    }

    #[test]
    fn test_handles_are_distinct() {
        let a = UploadBuffer::<TestRecord>::new(1, BufferUsageType::Vertex).unwrap();
        let b = UploadBuffer::<TestRecord>::new(1, BufferUsageType::Vertex).unwrap();
        assert_ne!(a.handle().id, b.handle().id);
        assert_eq!(a.handle().offset_of(0), 0);
    }
}
