//! 预置场景内容
//!
//! 按配置组装三个演示场景：石柱广场、城堡（含动态水面）、
//! 起伏地形与水面。场景只描述内容，不关心帧管线。

use std::collections::HashMap;

use crate::core::config::{Config, SceneKind};
use crate::core::error::Result;
use crate::geometry::{self, MeshData, MeshGeometry, SubmeshGeometry};
use crate::math::{constants, matrix, Matrix4};
use crate::renderer::command::PrimitiveTopology;
use crate::renderer::constants::Light;
use crate::renderer::vertex::Vertex;
use crate::sim::Waves;

use super::{RenderItemDesc, Scene, SceneBuilder};

/// 水面仿真参数，三个场景共用
const WAVE_SPATIAL_STEP: f32 = 1.0;
const WAVE_TIME_STEP: f32 = 0.03;
const WAVE_SPEED: f32 = 4.0;
const WAVE_DAMPING: f32 = 0.2;

/// 根据配置构建场景
///
/// 返回场景与可选的水面仿真器；二者的水面网格尺寸一致。
pub fn build_scene(config: &Config) -> Result<(Scene, Option<Waves>)> {
    let frame_count = config.graphics.frame_resources;
    match config.scene.name {
        SceneKind::Columns => {
            let scene = build_columns_scene(frame_count)?;
            Ok((scene, None))
        }
        SceneKind::Castle => {
            let waves = Waves::new(
                config.scene.wave_rows,
                config.scene.wave_cols,
                WAVE_SPATIAL_STEP,
                WAVE_TIME_STEP,
                WAVE_SPEED,
                WAVE_DAMPING,
            );
            let scene = build_castle_scene(frame_count, &waves)?;
            Ok((scene, Some(waves)))
        }
        SceneKind::LandAndWaves => {
            let waves = Waves::new(
                config.scene.wave_rows,
                config.scene.wave_cols,
                WAVE_SPATIAL_STEP,
                WAVE_TIME_STEP,
                WAVE_SPEED,
                WAVE_DAMPING,
            );
            let scene = build_land_and_waves_scene(frame_count, &waves)?;
            Ok((scene, Some(waves)))
        }
    }
}

/// 石柱广场
///
/// 地面网格、中央基座和八根圆柱，三盏方向光。
fn build_columns_scene(frame_count: usize) -> Result<Scene> {
    let mut builder = SceneBuilder::new("columns", frame_count);

    builder.add_geometry(build_shape_geometry()?)?;

    builder.add_material("bricks", [0.7, 0.5, 0.3, 1.0], [0.02, 0.02, 0.02], 0.1)?;
    builder.add_material("stone", [0.8, 0.8, 0.8, 1.0], [0.05, 0.05, 0.05], 0.3)?;
    builder.add_material("tile", [0.9, 0.9, 0.9, 1.0], [0.02, 0.02, 0.02], 0.2)?;

    builder.add_render_item(RenderItemDesc {
        name: "floor",
        world: Matrix4::identity(),
        tex_transform: matrix::scaling(8.0, 8.0, 1.0),
        geometry: "shapes",
        submesh: "grid",
        material: "tile",
        topology: PrimitiveTopology::TriangleList,
    })?;

    builder.add_render_item(RenderItemDesc {
        name: "pedestal",
        world: matrix::scaling(2.0, 2.0, 2.0) * matrix::translation(0.0, 0.5, 0.0),
        tex_transform: Matrix4::identity(),
        geometry: "shapes",
        submesh: "box",
        material: "stone",
        topology: PrimitiveTopology::TriangleList,
    })?;

    // 沿 Z 轴对称排列的柱廊，每根柱顶一个球
    for i in 0..4 {
        let z = -10.0 + i as f32 * 5.0;
        for (side, x) in [("left", -5.0f32), ("right", 5.0f32)] {
            let column = format!("column_{}_{}", side, i);
            let sphere = format!("sphere_{}_{}", side, i);

            builder.add_render_item(RenderItemDesc {
                name: &column,
                world: matrix::translation(x, 1.5, z),
                tex_transform: Matrix4::identity(),
                geometry: "shapes",
                submesh: "cylinder",
                material: "bricks",
                topology: PrimitiveTopology::TriangleList,
            })?;
            builder.add_render_item(RenderItemDesc {
                name: &sphere,
                world: matrix::translation(x, 3.5, z),
                tex_transform: Matrix4::identity(),
                geometry: "shapes",
                submesh: "sphere",
                material: "stone",
                topology: PrimitiveTopology::TriangleList,
            })?;
        }
    }

    builder.set_lighting(
        [0.25, 0.25, 0.35, 1.0],
        &[
            directional([0.57735, -0.57735, 0.57735], [0.6, 0.6, 0.6]),
            directional([-0.57735, -0.57735, 0.57735], [0.3, 0.3, 0.3]),
            directional([0.0, -0.707, -0.707], [0.15, 0.15, 0.15]),
        ],
    );

    builder.build()
}

/// 城堡
///
/// 城墙、角楼、城门与护城河水面；方向光加上城门口的点光和聚光。
fn build_castle_scene(frame_count: usize, waves: &Waves) -> Result<Scene> {
    let mut builder = SceneBuilder::new("castle", frame_count);

    builder.add_geometry(build_castle_geometry()?)?;
    builder.add_geometry(build_water_geometry(waves)?)?;

    builder.add_material("stone", [0.6, 0.6, 0.6, 1.0], [0.05, 0.05, 0.05], 0.4)?;
    builder.add_material("wood", [0.5, 0.35, 0.2, 1.0], [0.02, 0.02, 0.02], 0.6)?;
    builder.add_material("grass", [0.2, 0.6, 0.2, 1.0], [0.01, 0.01, 0.01], 0.9)?;
    builder.add_material("water", [0.0, 0.2, 0.6, 0.7], [0.1, 0.1, 0.1], 0.0)?;

    builder.add_render_item(RenderItemDesc {
        name: "ground",
        world: Matrix4::identity(),
        tex_transform: matrix::scaling(5.0, 5.0, 1.0),
        geometry: "castle",
        submesh: "ground",
        material: "grass",
        topology: PrimitiveTopology::TriangleList,
    })?;

    // 四面城墙，南墙留出城门缺口
    let wall_defs: [(&str, f32, f32, f32, f32); 5] = [
        ("wall_north", 0.0, -20.0, 40.0, 0.0),
        ("wall_east", 20.0, 0.0, 40.0, constants::HALF_PI),
        ("wall_west", -20.0, 0.0, 40.0, constants::HALF_PI),
        ("wall_south_left", -12.5, 20.0, 15.0, 0.0),
        ("wall_south_right", 12.5, 20.0, 15.0, 0.0),
    ];
    for (name, x, z, length, rotation) in wall_defs {
        builder.add_render_item(RenderItemDesc {
            name,
            world: matrix::translation(x, 4.0, z)
                * matrix::rotation_y(rotation)
                * matrix::scaling(length, 8.0, 2.0),
            tex_transform: Matrix4::identity(),
            geometry: "castle",
            submesh: "wall",
            material: "stone",
            topology: PrimitiveTopology::TriangleList,
        })?;
    }

    // 四角的角楼
    let tower_positions: [(&str, f32, f32); 4] = [
        ("tower_ne", 20.0, -20.0),
        ("tower_nw", -20.0, -20.0),
        ("tower_se", 20.0, 20.0),
        ("tower_sw", -20.0, 20.0),
    ];
    for (name, x, z) in tower_positions {
        builder.add_render_item(RenderItemDesc {
            name,
            world: matrix::translation(x, 6.0, z),
            tex_transform: Matrix4::identity(),
            geometry: "castle",
            submesh: "tower",
            material: "stone",
            topology: PrimitiveTopology::TriangleList,
        })?;
    }

    builder.add_render_item(RenderItemDesc {
        name: "gate",
        world: matrix::translation(0.0, 3.0, 20.0) * matrix::scaling(10.0, 6.0, 1.0),
        tex_transform: Matrix4::identity(),
        geometry: "castle",
        submesh: "wall",
        material: "wood",
        topology: PrimitiveTopology::TriangleList,
    })?;

    let water = builder.add_render_item(RenderItemDesc {
        name: "moat",
        world: matrix::translation(0.0, -1.5, 0.0),
        tex_transform: matrix::scaling(5.0, 5.0, 1.0),
        geometry: "water",
        submesh: "grid",
        material: "water",
        topology: PrimitiveTopology::TriangleList,
    })?;
    builder.mark_waves_item(water);

    // 方向光 + 四座角楼的火把点光 + 城门口的点光和聚光
    builder.set_lighting(
        [0.25, 0.25, 0.35, 1.0],
        &[
            directional([0.57735, -0.57735, 0.57735], [0.9, 0.8, 0.7]),
            point([20.0, 13.0, -20.0], [0.9, 0.5, 0.1], 1.0, 14.0),
            point([-20.0, 13.0, -20.0], [0.9, 0.5, 0.1], 1.0, 14.0),
            point([20.0, 13.0, 20.0], [0.9, 0.5, 0.1], 1.0, 14.0),
            point([-20.0, 13.0, 20.0], [0.9, 0.5, 0.1], 1.0, 14.0),
            point([0.0, 5.0, 22.0], [0.8, 0.6, 0.2], 1.0, 18.0),
            spot(
                [0.0, 10.0, 20.0],
                [0.0, -0.8, -0.6],
                [0.6, 0.6, 0.5],
                2.0,
                30.0,
                16.0,
            ),
        ],
    );

    builder.build()
}

/// 起伏地形与水面
fn build_land_and_waves_scene(frame_count: usize, waves: &Waves) -> Result<Scene> {
    let mut builder = SceneBuilder::new("land_and_waves", frame_count);

    builder.add_geometry(build_land_geometry()?)?;
    builder.add_geometry(build_water_geometry(waves)?)?;

    builder.add_material("grass", [0.2, 0.6, 0.2, 1.0], [0.01, 0.01, 0.01], 0.125)?;
    builder.add_material("water", [0.0, 0.2, 0.6, 1.0], [0.1, 0.1, 0.1], 0.0)?;

    builder.add_render_item(RenderItemDesc {
        name: "land",
        world: Matrix4::identity(),
        tex_transform: matrix::scaling(5.0, 5.0, 1.0),
        geometry: "land",
        submesh: "grid",
        material: "grass",
        topology: PrimitiveTopology::TriangleList,
    })?;

    let water = builder.add_render_item(RenderItemDesc {
        name: "waves",
        world: Matrix4::identity(),
        tex_transform: matrix::scaling(5.0, 5.0, 1.0),
        geometry: "water",
        submesh: "grid",
        material: "water",
        topology: PrimitiveTopology::TriangleList,
    })?;
    builder.mark_waves_item(water);

    builder.set_lighting(
        [0.25, 0.25, 0.35, 1.0],
        &[directional([0.57735, -0.57735, 0.57735], [1.0, 1.0, 0.9])],
    );

    builder.build()
}

/// 石柱广场的合并几何体
///
/// 盒子/网格/圆柱拼进同一对顶点/索引缓冲区，子网格记录各自的
/// 绘制偏移。
fn build_shape_geometry() -> Result<MeshGeometry> {
    let box_mesh = geometry::make_box(1.5, 1.0, 1.5);
    let grid_mesh = geometry::make_grid(20.0, 30.0, 40, 60);
    let cylinder_mesh = geometry::make_cylinder(0.5, 0.3, 3.0, 20, 20);
    let sphere_mesh = geometry::make_sphere(0.5, 20, 20);

    concat_geometry(
        "shapes",
        &[
            ("box", &box_mesh),
            ("grid", &grid_mesh),
            ("cylinder", &cylinder_mesh),
            ("sphere", &sphere_mesh),
        ],
    )
}

/// 城堡的合并几何体
fn build_castle_geometry() -> Result<MeshGeometry> {
    let ground_mesh = geometry::make_grid(90.0, 90.0, 50, 50);
    let wall_mesh = geometry::make_box(1.0, 1.0, 1.0);
    let tower_mesh = geometry::make_cylinder(3.0, 2.5, 12.0, 16, 4);

    concat_geometry(
        "castle",
        &[
            ("ground", &ground_mesh),
            ("wall", &wall_mesh),
            ("tower", &tower_mesh),
        ],
    )
}

/// 起伏地形几何体
///
/// 平面网格按高度函数抬升，法线随之重算。
fn build_land_geometry() -> Result<MeshGeometry> {
    let mut mesh = geometry::make_grid(160.0, 160.0, 50, 50);
    for v in &mut mesh.vertices {
        let x = v.position[0];
        let z = v.position[2];
        v.position[1] = hills_height(x, z);
        v.normal = hills_normal(x, z);
    }

    concat_geometry("land", &[("grid", &mesh)])
}

/// 水面几何体
///
/// 顶点布局与仿真器的初始解一致；静态索引缓冲区在整个生命周期内
/// 复用，顶点数据每帧由动态通道提供。
fn build_water_geometry(waves: &Waves) -> Result<MeshGeometry> {
    let rows = waves.row_count();
    let cols = waves.column_count();

    let mut vertices = Vec::with_capacity(waves.vertex_count());
    for i in 0..rows {
        for j in 0..cols {
            let p = waves.position(i * cols + j);
            let n = waves.normal(i * cols + j);
            vertices.push(Vertex::new(
                p.x,
                p.y,
                p.z,
                n.x,
                n.y,
                n.z,
                j as f32 / (cols - 1) as f32,
                i as f32 / (rows - 1) as f32,
            ));
        }
    }

    let mut indices = Vec::with_capacity(waves.triangle_count() * 3);
    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            let a = (i * cols + j) as u32;
            let b = (i * cols + j + 1) as u32;
            let c = ((i + 1) * cols + j) as u32;
            let d = ((i + 1) * cols + j + 1) as u32;
            indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }

    let mut draw_args = HashMap::new();
    draw_args.insert(
        "grid".to_string(),
        SubmeshGeometry {
            index_count: indices.len() as u32,
            start_index_location: 0,
            base_vertex_location: 0,
        },
    );

    MeshGeometry::new("water", &vertices, &indices, draw_args)
}

/// 把多个网格拼进一个几何体
fn concat_geometry(name: &str, parts: &[(&str, &MeshData)]) -> Result<MeshGeometry> {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut draw_args = HashMap::new();

    for (submesh_name, mesh) in parts {
        draw_args.insert(
            submesh_name.to_string(),
            SubmeshGeometry {
                index_count: mesh.indices.len() as u32,
                start_index_location: indices.len() as u32,
                base_vertex_location: vertices.len() as i32,
            },
        );
        vertices.extend_from_slice(&mesh.vertices);
        indices.extend_from_slice(&mesh.indices);
    }

    MeshGeometry::new(name, &vertices, &indices, draw_args)
}

fn hills_height(x: f32, z: f32) -> f32 {
    0.3 * (z * (0.1 * x).sin() + x * (0.1 * z).cos())
}

fn hills_normal(x: f32, z: f32) -> [f32; 3] {
    // 高度函数的解析梯度
    let nx = -0.03 * z * (0.1 * x).cos() - 0.3 * (0.1 * z).cos();
    let ny = 1.0;
    let nz = -0.3 * (0.1 * x).sin() + 0.03 * x * (0.1 * z).sin();
    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    [nx / len, ny / len, nz / len]
}

fn directional(direction: [f32; 3], strength: [f32; 3]) -> Light {
    Light {
        strength,
        direction,
        ..Light::default()
    }
}

fn point(position: [f32; 3], strength: [f32; 3], falloff_start: f32, falloff_end: f32) -> Light {
    Light {
        strength,
        position,
        falloff_start,
        falloff_end,
        ..Light::default()
    }
}

fn spot(
    position: [f32; 3],
    direction: [f32; 3],
    strength: [f32; 3],
    falloff_start: f32,
    falloff_end: f32,
    spot_power: f32,
) -> Light {
    Light {
        strength,
        position,
        direction,
        falloff_start,
        falloff_end,
        spot_power,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn config_for(kind: SceneKind) -> Config {
        let mut config = Config::default();
        config.scene.name = kind;
        config.scene.wave_rows = 32;
        config.scene.wave_cols = 32;
        config
    }

    #[test]
    fn test_columns_scene_builds() {
        let (scene, waves) = build_scene(&config_for(SceneKind::Columns)).unwrap();
        assert!(waves.is_none());
        assert!(scene.waves_item.is_none());
        // 地面 + 基座 + 8 根柱子 + 8 个球
        assert_eq!(scene.object_count(), 18);
        assert_eq!(scene.material_count(), 3);
    }

    #[test]
    fn test_castle_scene_has_waves_item() {
        let (scene, waves) = build_scene(&config_for(SceneKind::Castle)).unwrap();
        let waves = waves.unwrap();
        let item_index = scene.waves_item.unwrap();
        let item = &scene.render_items[item_index];
        assert_eq!(item.name, "moat");

        // 水面几何体的顶点数必须与仿真网格一致
        let geo = scene.geometry(item.geometry);
        assert_eq!(geo.vertex_count(), waves.vertex_count());
        assert_eq!(geo.index_count(), waves.triangle_count() * 3);
    }

    #[test]
    fn test_land_and_waves_scene_builds() {
        let (scene, waves) = build_scene(&config_for(SceneKind::LandAndWaves)).unwrap();
        assert!(waves.is_some());
        assert_eq!(scene.object_count(), 2);
        assert_eq!(scene.waves_item, Some(1));
    }

    #[test]
    fn test_concat_offsets_disjoint() {
        let geo = build_shape_geometry().unwrap();
        let box_args = *geo.submesh("box").unwrap();
        let grid_args = *geo.submesh("grid").unwrap();
        let cyl_args = *geo.submesh("cylinder").unwrap();

        assert_eq!(box_args.start_index_location, 0);
        assert_eq!(
            grid_args.start_index_location,
            box_args.index_count
        );
        assert_eq!(
            cyl_args.start_index_location,
            box_args.index_count + grid_args.index_count
        );
        assert!(grid_args.base_vertex_location > 0);
        assert!(cyl_args.base_vertex_location > grid_args.base_vertex_location);
    }

    #[test]
    fn test_land_normals_unit_length() {
        let geo = build_land_geometry().unwrap();
        assert!(geo.vertex_count() > 0);
        let n = hills_normal(12.0, -7.0);
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-5);
    }
}
