//! 渲染器模块
//!
//! 帧资源管线的组装处：每帧先推进帧资源环（必要时等待 GPU 退役
//! 目标槽位），再把脏数据增量写入当前槽位的环形缓冲区，最后录制
//! 并提交命令、在队列上标记完成点。
//!
//! # 模块组织
//!
//! - **upload**: 持久映射的固定步长上传缓冲区
//! - **sync**: 单调完成 Fence
//! - **command**: 命令分配器与命令列表状态机
//! - **frame**: 帧资源与帧资源环
//! - **queue**: 模拟 GPU 时间线的命令队列
//! - **constants**: 常量缓冲区记录布局
//! - **vertex**: 顶点格式
//!
//! # 帧顺序
//!
//! ```text
//! animate → advance(等待) → 写对象常量 → 写材质常量 → 写 pass 常量
//!         → 水面仿真/写动态顶点 → 录制 → 提交 → retire → signal
//! ```
//!
//! 写入只落在当前槽位，GPU 仍在消费的其余槽位不被触碰。

pub mod command;
pub mod constants;
pub mod frame;
pub mod queue;
pub mod sync;
pub mod upload;
pub mod vertex;

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::config::Config;
use crate::core::error::Result;
use crate::math::{constants as math_constants, matrix, Matrix4};
use crate::scene::{content, OrbitCamera, Scene};
use crate::sim::Waves;
use crate::{frame_debug, render_info};

use command::{CommandList, RenderCommand};
use constants::{MaterialConstants, ObjectConstants, PassConstants};
use frame::FrameResourceRing;
use queue::CommandQueue;
use sync::Fence;

/// 水面扰动的时间间隔（秒）
const WAVE_DISTURB_INTERVAL: f32 = 0.25;

/// 近/远裁剪面
const NEAR_Z: f32 = 1.0;
const FAR_Z: f32 = 1000.0;

/// 渲染器
///
/// 持有帧资源环、命令队列和场景，按固定的帧顺序驱动它们。
/// CPU 侧的更新与提交全部发生在调用线程上。
pub struct Renderer {
    ring: FrameResourceRing,
    fence: Arc<Fence>,
    queue: CommandQueue,
    cmd_list: CommandList,
    scene: Scene,
    waves: Option<Waves>,
    /// 轨道相机，外层驱动可直接调整角度
    pub camera: OrbitCamera,
    proj: Matrix4,
    render_target_size: [f32; 2],
    rng: StdRng,
    last_disturb: f32,
    frame_number: u64,
}

impl Renderer {
    /// 根据配置创建渲染器
    pub fn new(config: &Config) -> Result<Self> {
        let (scene, waves) = content::build_scene(config)?;
        Self::with_scene(config, scene, waves)
    }

    /// 用外部构建的场景创建渲染器
    ///
    /// 帧资源环按场景的对象/材质数量定容；水面场景额外带出
    /// 每槽位的动态顶点缓冲区。
    pub fn with_scene(config: &Config, scene: Scene, waves: Option<Waves>) -> Result<Self> {
        let fence = Arc::new(Fence::new());
        let queue = if config.graphics.gpu_latency_ms > 0 {
            CommandQueue::with_latency(
                Arc::clone(&fence),
                Duration::from_millis(config.graphics.gpu_latency_ms),
            )?
        } else {
            CommandQueue::new(Arc::clone(&fence))
        };

        let ring = FrameResourceRing::new(
            config.graphics.frame_resources,
            scene.object_count(),
            scene.material_count(),
            waves.as_ref().map(|w| w.vertex_count()),
        )?;

        let width = config.window.width as f32;
        let height = config.window.height as f32;
        let proj = matrix::perspective_fov_lh(
            math_constants::QUARTER_PI,
            width / height,
            NEAR_Z,
            FAR_Z,
        );

        render_info!(
            "Renderer ready: scene '{}', {} objects, {} materials, {} frame resources",
            scene.name,
            scene.object_count(),
            scene.material_count(),
            ring.len()
        );

        Ok(Self {
            ring,
            fence,
            queue,
            cmd_list: CommandList::new(),
            scene,
            waves,
            camera: OrbitCamera::new(
                1.5 * math_constants::PI,
                0.2 * math_constants::PI,
                50.0,
            ),
            proj,
            render_target_size: [width, height],
            rng: StdRng::from_entropy(),
            last_disturb: 0.0,
            frame_number: 0,
        })
    }

    /// 帧资源数量 N
    pub fn frame_count(&self) -> usize {
        self.ring.len()
    }

    /// 帧资源环（测试/诊断用）
    pub fn ring(&self) -> &FrameResourceRing {
        &self.ring
    }

    /// 当前场景
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// 当前场景的可变引用（外层动画逻辑用）
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// 命令队列
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// 已提交的帧数
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// 更新一帧的 CPU 侧数据
    ///
    /// `advance` 是这条路径上唯一可能阻塞的调用；其后的所有写入
    /// 都落在 GPU 已确认不再读取的槽位上。
    pub fn update(&mut self, total_time: f32, dt: f32) -> Result<()> {
        self.animate_materials(dt);
        self.ring.advance(&self.fence)?;
        self.update_object_cbs();
        self.update_material_cbs();
        self.update_main_pass_cb(total_time, dt);
        self.update_waves(total_time, dt);
        Ok(())
    }

    /// 录制并提交一帧
    ///
    /// 提交后为当前槽位记录完成标记，并让队列在同一位置 signal。
    pub fn draw(&mut self) -> Result<()> {
        {
            let frame = self.ring.current_mut();
            self.cmd_list.reset(&mut frame.cmd_alloc)?;
            self.cmd_list
                .record(RenderCommand::SetPassBuffer(frame.pass_cb.handle()))?;

            for item in &self.scene.render_items {
                let geometry = self.scene.geometry(item.geometry);
                let material = &self.scene.materials[item.material];

                self.cmd_list
                    .record(RenderCommand::SetTopology(item.topology))?;
                self.cmd_list
                    .record(RenderCommand::SetVertexBuffer(item.vertex_binding))?;
                self.cmd_list
                    .record(RenderCommand::SetIndexBuffer(geometry.index_handle()))?;
                self.cmd_list.record(RenderCommand::SetObjectRecord {
                    buffer: frame.object_cb.handle(),
                    index: item.obj_cb_index,
                })?;
                self.cmd_list.record(RenderCommand::SetMaterialRecord {
                    buffer: frame.material_cb.handle(),
                    index: material.mat_cb_index,
                })?;
                self.cmd_list.record(RenderCommand::DrawIndexed {
                    index_count: item.index_count,
                    start_index: item.start_index_location,
                    base_vertex: item.base_vertex_location,
                })?;
            }
        }

        self.cmd_list.close()?;
        self.queue.execute(&self.cmd_list)?;

        let marker = self.fence.next_value();
        self.ring.retire(marker);
        self.queue.signal(marker)?;

        self.cmd_list.release_to(&mut self.ring.current_mut().cmd_alloc);
        self.frame_number += 1;

        frame_debug!(
            "frame {} submitted on slot {} (fence marker {})",
            self.frame_number,
            self.ring.current_index(),
            marker
        );
        Ok(())
    }

    /// 等待 GPU 追上所有已提交的工作
    pub fn flush(&self) -> Result<()> {
        self.queue.flush()
    }

    /// 材质动画
    ///
    /// 水面材质的纹理坐标匀速滚动，回绕保持数值有界。
    /// 每帧的修改把材质的脏计数器重新拉满。
    fn animate_materials(&mut self, dt: f32) {
        let frame_count = self.ring.len();
        if let Some(water) = self.scene.material_mut("water") {
            let mut transform = *water.mat_transform();
            let mut tu = transform[(0, 3)] + 0.1 * dt;
            let mut tv = transform[(1, 3)] + 0.02 * dt;
            if tu >= 1.0 {
                tu -= 1.0;
            }
            if tv >= 1.0 {
                tv -= 1.0;
            }
            transform[(0, 3)] = tu;
            transform[(1, 3)] = tv;
            water.set_mat_transform(transform, frame_count);
        }
    }

    /// 增量刷新当前槽位的对象常量
    ///
    /// 只有脏计数器非零的渲染项才写入；写入后递减计数器。
    fn update_object_cbs(&mut self) {
        let frame = self.ring.current_mut();
        for item in self.scene.render_items.iter_mut() {
            if item.num_frames_dirty() == 0 {
                continue;
            }
            let record = ObjectConstants {
                world: matrix::to_shader_layout(item.world()),
                tex_transform: matrix::to_shader_layout(item.tex_transform()),
            };
            frame.object_cb.copy_record(item.obj_cb_index, &record);
            item.decrement_dirty();
        }
    }

    /// 增量刷新当前槽位的材质常量
    fn update_material_cbs(&mut self) {
        let frame = self.ring.current_mut();
        for material in self.scene.materials.iter_mut() {
            if material.num_frames_dirty() == 0 {
                continue;
            }
            let record = MaterialConstants {
                diffuse_albedo: material.diffuse_albedo,
                fresnel_r0: material.fresnel_r0,
                roughness: material.roughness,
                mat_transform: matrix::to_shader_layout(material.mat_transform()),
            };
            frame.material_cb.copy_record(material.mat_cb_index, &record);
            material.decrement_dirty();
        }
    }

    /// 无条件重写当前槽位的 pass 常量
    ///
    /// 相机与计时每帧都在变化，这条记录不做脏跟踪。
    fn update_main_pass_cb(&mut self, total_time: f32, dt: f32) {
        let view = self.camera.view_matrix();
        let view_proj = self.proj * view;
        let eye = self.camera.eye_position();

        let record = PassConstants {
            view: matrix::to_shader_layout(&view),
            inv_view: matrix::to_shader_layout(&matrix::inverse(&view)),
            proj: matrix::to_shader_layout(&self.proj),
            inv_proj: matrix::to_shader_layout(&matrix::inverse(&self.proj)),
            view_proj: matrix::to_shader_layout(&view_proj),
            inv_view_proj: matrix::to_shader_layout(&matrix::inverse(&view_proj)),
            eye_pos_w: [eye.x, eye.y, eye.z],
            _pad0: 0.0,
            render_target_size: self.render_target_size,
            inv_render_target_size: [
                1.0 / self.render_target_size[0],
                1.0 / self.render_target_size[1],
            ],
            near_z: NEAR_Z,
            far_z: FAR_Z,
            total_time,
            delta_time: dt,
            ambient_light: self.scene.ambient_light,
            lights: self.scene.lights,
        };

        self.ring.current_mut().pass_cb.copy_record(0, &record);
    }

    /// 水面仿真与动态顶点通道
    ///
    /// 每隔固定间隔扰动一个内部顶点，推进一次仿真，把全部顶点
    /// 写入当前槽位的动态顶点缓冲区，再把水面渲染项的顶点绑定
    /// 重指向这块缓冲区。前一槽位的缓冲区留给 GPU 继续消费。
    fn update_waves(&mut self, total_time: f32, dt: f32) {
        let Some(waves) = self.waves.as_mut() else {
            return;
        };
        let Some(item_index) = self.scene.waves_item else {
            return;
        };

        if total_time - self.last_disturb >= WAVE_DISTURB_INTERVAL {
            self.last_disturb = total_time;
            // 闭区间：最小合法网格（9x9）下恰好只剩一个可扰动点
            let i = self.rng.gen_range(4..=waves.row_count() - 5);
            let j = self.rng.gen_range(4..=waves.column_count() - 5);
            let magnitude = self.rng.gen_range(0.2..=0.5);
            waves.disturb(i, j, magnitude);
        }

        waves.update(dt);

        let frame = self.ring.current_mut();
        if let Some(vb) = frame.waves_vb.as_mut() {
            let width = waves.width();
            let depth = waves.depth();
            for v in 0..waves.vertex_count() {
                let p = waves.position(v);
                let n = waves.normal(v);
                vb.copy_record(
                    v,
                    &vertex::Vertex::new(
                        p.x,
                        p.y,
                        p.z,
                        n.x,
                        n.y,
                        n.z,
                        0.5 + p.x / width,
                        0.5 - p.z / depth,
                    ),
                );
            }
            self.scene.render_items[item_index].vertex_binding = vb.handle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SceneKind;
    use crate::geometry::{self, MeshGeometry, SubmeshGeometry};
    use crate::scene::{RenderItemDesc, SceneBuilder};
    use command::PrimitiveTopology;
    use std::collections::HashMap;

    fn test_config(frame_resources: usize) -> Config {
        let mut config = Config::default();
        config.graphics.frame_resources = frame_resources;
        config.graphics.gpu_latency_ms = 0;
        config
    }

    /// 单几何体、单材质的最小静态场景
    fn static_scene(frame_count: usize, item_count: usize) -> Scene {
        let mut builder = SceneBuilder::new("test", frame_count);
        let mesh = geometry::make_box(1.0, 1.0, 1.0);
        let mut draw_args = HashMap::new();
        draw_args.insert(
            "box".to_string(),
            SubmeshGeometry {
                index_count: mesh.indices.len() as u32,
                start_index_location: 0,
                base_vertex_location: 0,
            },
        );
        builder
            .add_geometry(
                MeshGeometry::new("shapes", &mesh.vertices, &mesh.indices, draw_args).unwrap(),
            )
            .unwrap();
        builder
            .add_material("stone", [1.0; 4], [0.05; 3], 0.5)
            .unwrap();
        for i in 0..item_count {
            let name = format!("item{}", i);
            builder
                .add_render_item(RenderItemDesc {
                    name: &name,
                    world: matrix::translation(i as f32, 0.0, 0.0),
                    tex_transform: Matrix4::identity(),
                    geometry: "shapes",
                    submesh: "box",
                    material: "stone",
                    topology: PrimitiveTopology::TriangleList,
                })
                .unwrap();
        }
        builder.build().unwrap()
    }

    fn static_renderer(frame_count: usize, item_count: usize) -> Renderer {
        let config = test_config(frame_count);
        let scene = static_scene(frame_count, item_count);
        Renderer::with_scene(&config, scene, None).unwrap()
    }

    fn run_frame(renderer: &mut Renderer, frame: u64) {
        let t = frame as f32 * 0.016;
        renderer.update(t, 0.016).unwrap();
        renderer.draw().unwrap();
    }

    #[test]
    fn test_initial_data_propagates_to_all_slots() {
        let mut renderer = static_renderer(3, 2);

        // 前 N 帧每帧向一个槽位写满全部对象/材质常量
        for frame in 0..3 {
            run_frame(&mut renderer, frame);
            let slot = renderer.ring().current();
            assert_eq!(slot.object_cb.write_count(), 2);
            assert_eq!(slot.material_cb.write_count(), 1);
        }

        for item in &renderer.scene().render_items {
            assert_eq!(item.num_frames_dirty(), 0);
        }
    }

    #[test]
    fn test_clean_frames_do_no_redundant_writes() {
        let mut renderer = static_renderer(3, 2);

        for frame in 0..3 {
            run_frame(&mut renderer, frame);
        }
        // 计数器已归零；第二轮不允许有任何对象/材质写入
        for frame in 3..6 {
            run_frame(&mut renderer, frame);
            let slot = renderer.ring().current();
            assert_eq!(slot.object_cb.write_count(), 2);
            assert_eq!(slot.material_cb.write_count(), 1);
        }
    }

    #[test]
    fn test_pass_constants_written_every_frame() {
        let mut renderer = static_renderer(3, 1);

        for frame in 0..6 {
            run_frame(&mut renderer, frame);
            // 每个槽位在第二轮时已经被写过两次
            let expected = if frame < 3 { 1 } else { 2 };
            assert_eq!(renderer.ring().current().pass_cb.write_count(), expected);
        }
    }

    #[test]
    fn test_mutation_restarts_propagation() {
        let mut renderer = static_renderer(3, 1);
        for frame in 0..4 {
            run_frame(&mut renderer, frame);
        }

        let frame_count = renderer.frame_count();
        renderer.scene_mut().render_items[0]
            .set_world(matrix::translation(0.0, 5.0, 0.0), frame_count);
        assert_eq!(renderer.scene().render_items[0].num_frames_dirty(), 3);

        // 接下来的 N 帧每帧写入一次新值，之后恢复安静
        for frame in 4..7 {
            run_frame(&mut renderer, frame);
            assert_eq!(renderer.ring().current().object_cb.write_count(), 2);
        }
        run_frame(&mut renderer, 7);
        assert_eq!(renderer.ring().current().object_cb.write_count(), 2);
        assert_eq!(renderer.scene().render_items[0].num_frames_dirty(), 0);
    }

    #[test]
    fn test_propagation_reaches_all_slots_after_n_frames() {
        let mut renderer = static_renderer(3, 2);
        for frame in 0..3 {
            run_frame(&mut renderer, frame);
        }

        let frame_count = renderer.frame_count();
        renderer.scene_mut().render_items[1]
            .set_world(matrix::translation(7.0, 0.0, 0.0), frame_count);

        for frame in 3..6 {
            run_frame(&mut renderer, frame);
        }

        // 变更之后恰好 N 帧：每个槽位都持有新的世界矩阵
        let expected = matrix::to_shader_layout(&matrix::translation(7.0, 0.0, 0.0));
        for slot in 0..renderer.frame_count() {
            let record: ObjectConstants = renderer
                .ring()
                .get(slot)
                .unwrap()
                .object_cb
                .read_record(1);
            assert_eq!(record.world, expected);
        }
    }

    #[test]
    fn test_updated_slot_holds_new_value_while_others_keep_old() {
        let mut renderer = static_renderer(3, 1);
        for frame in 0..3 {
            run_frame(&mut renderer, frame);
        }

        let frame_count = renderer.frame_count();
        renderer.scene_mut().render_items[0]
            .set_world(matrix::translation(0.0, 9.0, 0.0), frame_count);
        run_frame(&mut renderer, 3);

        let updated_slot = renderer.ring().current_index();
        let updated: ObjectConstants = renderer
            .ring()
            .get(updated_slot)
            .unwrap()
            .object_cb
            .read_record(0);
        // 转置后平移分量在第四行
        assert_eq!(updated.world[3][1], 9.0);

        let stale_slot = (updated_slot + 1) % 3;
        let stale: ObjectConstants = renderer
            .ring()
            .get(stale_slot)
            .unwrap()
            .object_cb
            .read_record(0);
        assert_eq!(stale.world[3][1], 0.0);
    }

    #[test]
    fn test_draw_records_expected_command_stream() {
        let mut renderer = static_renderer(3, 2);
        run_frame(&mut renderer, 0);

        // pass 绑定 + 每个渲染项 6 条命令
        let slot = renderer.ring().current();
        assert_eq!(slot.cmd_alloc.recorded_len(), 1 + 2 * 6);
        assert_eq!(renderer.queue().submission_count(), 1);
    }

    #[test]
    fn test_fence_markers_monotonic_per_frame() {
        let mut renderer = static_renderer(2, 1);

        run_frame(&mut renderer, 0);
        let first = renderer.ring().current().fence;
        run_frame(&mut renderer, 1);
        let second = renderer.ring().current().fence;

        assert!(first > 0);
        assert!(second > first);
    }

    #[test]
    fn test_waves_binding_repoints_per_frame() {
        let mut config = test_config(3);
        config.scene.name = SceneKind::LandAndWaves;
        config.scene.wave_rows = 32;
        config.scene.wave_cols = 32;
        let mut renderer = Renderer::new(&config).unwrap();
        let item_index = renderer.scene().waves_item.unwrap();

        run_frame(&mut renderer, 0);
        let binding_a = renderer.scene().render_items[item_index].vertex_binding;
        let expected_a = renderer
            .ring()
            .current()
            .waves_vb
            .as_ref()
            .unwrap()
            .handle();
        assert_eq!(binding_a, expected_a);

        run_frame(&mut renderer, 1);
        let binding_b = renderer.scene().render_items[item_index].vertex_binding;
        assert_ne!(binding_a, binding_b);
    }

    #[test]
    fn test_min_wave_grid_disturb_stays_in_bounds() {
        let mut config = test_config(2);
        config.scene.name = SceneKind::LandAndWaves;
        config.scene.wave_rows = 9;
        config.scene.wave_cols = 9;
        config.validate().unwrap();
        let mut renderer = Renderer::new(&config).unwrap();

        // 一帧跨过扰动间隔即触发扰动；最小合法网格下不得越界
        renderer
            .update(WAVE_DISTURB_INTERVAL + 0.05, 0.016)
            .unwrap();
        renderer.draw().unwrap();
    }

    #[test]
    fn test_waves_vertices_written_every_frame() {
        let mut config = test_config(2);
        config.scene.name = SceneKind::LandAndWaves;
        config.scene.wave_rows = 16;
        config.scene.wave_cols = 16;
        let mut renderer = Renderer::new(&config).unwrap();

        run_frame(&mut renderer, 0);
        let vb = renderer.ring().current().waves_vb.as_ref().unwrap();
        assert_eq!(vb.write_count(), 16 * 16);
    }

    #[test]
    fn test_water_material_stays_dirty_under_animation() {
        let mut config = test_config(3);
        config.scene.name = SceneKind::LandAndWaves;
        config.scene.wave_rows = 16;
        config.scene.wave_cols = 16;
        let mut renderer = Renderer::new(&config).unwrap();

        // 水面材质每帧都被动画标脏，每帧都要重写
        for frame in 0..6 {
            run_frame(&mut renderer, frame);
            let water_index = renderer.scene().material_index("water").unwrap();
            assert!(
                renderer.scene().materials[water_index].num_frames_dirty() > 0
                    || renderer.ring().current().material_cb.write_count() >= 1
            );
        }
        let expected_min = 2; // 每个槽位至少写过两轮
        assert!(renderer.ring().current().material_cb.write_count() >= expected_min);
    }

    #[test]
    fn test_flush_drains_deferred_queue() {
        let mut config = test_config(2);
        config.graphics.gpu_latency_ms = 1;
        let scene = static_scene(2, 1);
        let mut renderer = Renderer::with_scene(&config, scene, None).unwrap();

        for frame in 0..4 {
            run_frame(&mut renderer, frame);
        }
        renderer.flush().unwrap();
        assert_eq!(renderer.queue().fence().completed_value(), 4);
    }
}
