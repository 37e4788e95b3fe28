use tracing::info;
use vmap_config::AppConfig;
use vmap_core::chart::slice_angles_from_values;
use vmap_core::color::Color;
use vmap_core::geometry::{Point2, Vector2};
use vmap_core::store::Component;
use vmap_engine::scene::{DemoEntities, MapScene, populate_demo};
use vmap_engine::surface::RecordingSurface;

use crate::errors::FrontendError;

/// 简易 CLI 演示：装配内置示例场景，渲染一帧到录制表面，
/// 打印绘制统计并演示几个命中查询。
pub fn run_demo(config: &AppConfig) -> Result<(), FrontendError> {
    let (scene, entities) = build_demo_scene(config)?;

    let mut surface = RecordingSurface::new();
    scene.render_frame(&mut surface)?;
    let stats = surface.stats();
    info!(
        path_segments = stats.path_segments,
        fills = stats.fills,
        strokes = stats.strokes,
        "CLI 演示渲染统计"
    );

    println!("交互地图渲染核心 CLI 演示");
    println!("已构建内置示例实体：");
    println!("  - 带孔区域 ID = {}", entities.region.get());
    println!("  - 箭头路径 ID = {}", entities.route.get());
    println!("  - 点标记 ID = {}", entities.marker.get());
    println!("  - 文本标签 ID = {}", entities.label.get());
    println!("  - 环形图 ID = {}", entities.pie.get());

    let state = scene.viewport().state();
    println!(
        "视口中心=({:.2}, {:.2}), 缩放={:.3}",
        state.center.x(),
        state.center.y(),
        state.zoom
    );
    println!(
        "一帧绘制指令统计：路径段={}, 填充={}, 描边={}, 文本={}",
        stats.path_segments, stats.fills, stats.strokes, stats.texts
    );

    probe_targets(&scene, &entities)?;
    Ok(())
}

/// 根据配置装配演示场景。
fn build_demo_scene(config: &AppConfig) -> Result<(MapScene, DemoEntities), FrontendError> {
    let client_size = Vector2::new(config.viewport.client_width, config.viewport.client_height);
    let mut scene = MapScene::new(client_size);
    let entities = populate_demo(scene.store_mut())?;

    // 配置可覆盖环形图的原始值与路径箭头开关。
    if !config.demo.pie_values.is_empty() {
        let mut pie = scene.store().pie_spec(entities.pie)?.clone();
        pie.slice_angles = slice_angles_from_values(&config.demo.pie_values);
        pie.indices = (0..config.demo.pie_values.len()).collect();
        pie.colors = demo_palette(config.demo.pie_values.len());
        scene.store_mut().attach(entities.pie, Component::PieSpec(pie))?;
    }
    if !config.demo.with_arrows {
        let mut element = scene.store().chart_element(entities.route)?.clone();
        element.arrow_spec = None;
        scene
            .store_mut()
            .attach(entities.route, Component::ChartElement(element))?;
    }

    scene.set_zoom(config.viewport.default_zoom);
    info!(
        entity_count = scene.store().len(),
        zoom = scene.viewport().state().zoom,
        "演示场景装配完成"
    );
    Ok((scene, entities))
}

/// 在环形图中心附近与空白处各做一次命中查询并打印结果。
fn probe_targets(scene: &MapScene, entities: &DemoEntities) -> Result<(), FrontendError> {
    let pie_origin = scene.store().origin(entities.pie)?.origin;
    let helper = scene.viewport().render_helper();
    let center = helper.to_screen(pie_origin);

    let probes = [
        ("环形图左上象限", Point2::new(center.x() - 4.0, center.y() - 4.0)),
        ("环形图右下象限", Point2::new(center.x() + 2.0, center.y() + 7.0)),
        ("空白区域", Point2::new(center.x() + 200.0, center.y() + 200.0)),
    ];
    for (label, coord) in probes {
        match scene.find_target(coord)? {
            Some(hit) => {
                let name = scene.store().name(hit.entity).unwrap_or("<未命名>");
                match hit.sector {
                    Some(sector) => {
                        println!("{label}: 命中 {name} (ID={}) 扇区 {sector}", hit.entity.get());
                    }
                    None => println!("{label}: 命中 {name} (ID={})", hit.entity.get()),
                }
            }
            None => println!("{label}: 未命中任何实体"),
        }
    }
    Ok(())
}

/// 为任意扇区数量生成循环配色。
fn demo_palette(count: usize) -> Vec<Color> {
    let base = [
        Color::new(200, 60, 60),
        Color::new(60, 160, 60),
        Color::new(60, 60, 200),
        Color::new(200, 160, 40),
        Color::new(140, 80, 180),
    ];
    (0..count).map(|slot| base[slot % base.len()]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmap_core::store::ComponentKind;

    #[test]
    fn demo_scene_honors_config() {
        let mut config = AppConfig::default();
        config.demo.pie_values = vec![3.0, -3.0, 6.0];
        config.demo.with_arrows = false;
        config.viewport.default_zoom = 2.0;

        let (scene, entities) = build_demo_scene(&config).expect("build scene");
        let pie = scene.store().pie_spec(entities.pie).expect("pie spec");
        assert_eq!(pie.slice_angles.len(), 3);
        assert_eq!(pie.indices, vec![0, 1, 2]);
        assert_eq!(pie.colors.len(), 3);

        let route = scene
            .store()
            .chart_element(entities.route)
            .expect("route element");
        assert!(route.arrow_spec.is_none());
        assert!((scene.viewport().state().zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn demo_runs_end_to_end_with_defaults() {
        let config = AppConfig::default();
        run_demo(&config).expect("demo succeeds");
    }

    #[test]
    fn demo_entities_carry_expected_components() {
        let (scene, entities) = build_demo_scene(&AppConfig::default()).expect("build scene");
        let store = scene.store();
        assert!(store.has(entities.region, ComponentKind::Geometry));
        assert!(store.has(entities.marker, ComponentKind::PointShape));
        assert!(store.has(entities.label, ComponentKind::TextSpec));
        assert!(store.has(entities.pie, ComponentKind::PieSpec));
    }
}
