use std::f64::consts::PI;

use tracing::info;
use vmap_core::chart::{
    ArrowEnd, ArrowKind, ArrowSpec, ChartElementComponent, Font, Geometry, IndexComponent,
    OriginComponent, PieSpecComponent, PointShapeComponent, TextAlign, TextSpecComponent,
    slice_angles_from_values,
};
use vmap_core::color::Color;
use vmap_core::geometry::{Point2, Rect, Vector2};
use vmap_core::store::{Component, EntityId, EntityStore, StoreError};

use crate::errors::EngineError;
use crate::render;
use crate::searching::{self, SearchResult};
use crate::surface::DrawingSurface;
use crate::viewport::Viewport;

/// 地图场景：实体存储加视口，提供渲染一帧与命中查询两个入口。
#[derive(Debug)]
pub struct MapScene {
    store: EntityStore,
    viewport: Viewport,
}

impl MapScene {
    pub fn new(client_size: Vector2) -> Self {
        Self {
            store: EntityStore::new(),
            viewport: Viewport::new(client_size),
        }
    }

    /// 整体替换实体存储并复位视口。场景重建的唯一入口。
    pub fn load_store(&mut self, store: EntityStore) {
        info!(entity_count = store.len(), "加载实体存储");
        self.store = store;
        self.viewport.reset();
    }

    #[inline]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn set_center(&mut self, center: Point2) {
        self.viewport.set_center(center);
    }

    #[inline]
    pub fn pan(&mut self, delta: Vector2) {
        self.viewport.pan(delta);
    }

    #[inline]
    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.set_zoom(zoom);
    }

    #[inline]
    pub fn scale_zoom(&mut self, factor: f64) {
        self.viewport.scale_zoom(factor);
    }

    /// 按当前视口把全部实体绘制到表面上。
    pub fn render_frame(&self, surface: &mut dyn DrawingSurface) -> Result<(), EngineError> {
        let helper = self.viewport.render_helper();
        render::render_frame(&self.store, &helper, surface)
    }

    /// 在屏幕坐标 `coord` 处查询最上层的命中实体。
    pub fn find_target(&self, coord: Point2) -> Result<Option<SearchResult>, EngineError> {
        let helper = self.viewport.render_helper();
        searching::find_target(&self.store, coord, &helper)
    }
}

/// 演示场景包含的实体，按形状各取一个代表。
#[derive(Debug, Clone, Copy)]
pub struct DemoEntities {
    pub region: EntityId,
    pub route: EntityId,
    pub marker: EntityId,
    pub label: EntityId,
    pub pie: EntityId,
}

/// 向存储填充一套覆盖全部形状的演示实体：
/// 带孔多边形、虚线箭头路径、圆形点标记、带边框标签与环形图。
pub fn populate_demo(store: &mut EntityStore) -> Result<DemoEntities, StoreError> {
    let region = store.create_entity("region");
    let outer = vec![
        Point2::new(0.0, 0.0),
        Point2::new(120.0, 0.0),
        Point2::new(120.0, 80.0),
        Point2::new(0.0, 80.0),
    ];
    let hole = vec![
        Point2::new(40.0, 30.0),
        Point2::new(70.0, 30.0),
        Point2::new(70.0, 50.0),
        Point2::new(40.0, 50.0),
    ];
    store.attach(
        region,
        Component::Geometry(Geometry::MultiPolygon(vec![vec![outer, hole]])),
    )?;
    store.attach(
        region,
        Component::ChartElement(ChartElementComponent {
            fill_color: Some(Color::new(120, 180, 120).with_alpha(160)),
            stroke_color: Some(Color::new(40, 90, 40)),
            stroke_width: 1.0,
            ..ChartElementComponent::default()
        }),
    )?;
    store.attach(
        region,
        Component::Index(IndexComponent {
            layer_index: 0,
            index: 0,
        }),
    )?;

    let route = store.create_entity("route");
    store.attach(
        route,
        Component::Geometry(Geometry::MultiLineString(vec![vec![
            Point2::new(10.0, 70.0),
            Point2::new(50.0, 20.0),
            Point2::new(110.0, 60.0),
        ]])),
    )?;
    store.attach(
        route,
        Component::ChartElement(ChartElementComponent {
            stroke_color: Some(Color::new(30, 60, 160)),
            stroke_width: 2.0,
            line_dash: Some(vec![8.0, 4.0]),
            arrow_spec: Some(ArrowSpec {
                angle: PI / 6.0,
                length: 12.0,
                end: ArrowEnd::Both,
                kind: ArrowKind::Open,
            }),
            ..ChartElementComponent::default()
        }),
    )?;
    store.attach(
        route,
        Component::Index(IndexComponent {
            layer_index: 1,
            index: 0,
        }),
    )?;

    let marker = store.create_entity("marker");
    store.attach(
        marker,
        Component::Origin(OriginComponent {
            origin: Point2::new(50.0, 20.0),
        }),
    )?;
    store.attach(
        marker,
        Component::PointShape(PointShapeComponent {
            shape: 21,
            size: 10.0,
        }),
    )?;
    store.attach(
        marker,
        Component::ChartElement(ChartElementComponent {
            fill_color: Some(Color::new(220, 80, 60)),
            stroke_color: Some(Color::BLACK),
            stroke_width: 1.0,
            ..ChartElementComponent::default()
        }),
    )?;
    store.attach(
        marker,
        Component::Index(IndexComponent {
            layer_index: 2,
            index: 0,
        }),
    )?;

    let label = store.create_entity("label");
    store.attach(
        label,
        Component::Origin(OriginComponent {
            origin: Point2::new(60.0, 8.0),
        }),
    )?;
    store.attach(
        label,
        Component::TextSpec(TextSpecComponent {
            lines: vec!["示范区域".to_string()],
            font: Font::new(12.0, "sans-serif"),
            text_align: TextAlign::Center,
            angle: 0.0,
            hjust: 0.5,
            vjust: 0.5,
            text_size: Vector2::new(48.0, 14.0),
            line_height: 14.0,
            draw_border: true,
            frame: Rect::new(Point2::new(-28.0, -9.0), Vector2::new(56.0, 18.0)),
            label_radius: 0.2,
            label_size: 1.0,
            padding: 4.0,
        }),
    )?;
    store.attach(
        label,
        Component::ChartElement(ChartElementComponent {
            fill_color: Some(Color::WHITE.with_alpha(230)),
            stroke_color: Some(Color::BLACK),
            stroke_width: 1.0,
            ..ChartElementComponent::default()
        }),
    )?;
    store.attach(
        label,
        Component::Index(IndexComponent {
            layer_index: 3,
            index: 0,
        }),
    )?;

    let pie_values = [2.0, 2.0, 2.0, 2.0];
    let pie = store.create_entity("pie");
    store.attach(
        pie,
        Component::Origin(OriginComponent {
            origin: Point2::new(80.0, 30.0),
        }),
    )?;
    store.attach(
        pie,
        Component::PieSpec(PieSpecComponent {
            radius: 10.0,
            indices: (0..pie_values.len()).collect(),
            slice_angles: slice_angles_from_values(&pie_values),
            colors: vec![
                Color::new(200, 60, 60),
                Color::new(60, 160, 60),
                Color::new(60, 60, 200),
                Color::new(200, 160, 40),
            ],
        }),
    )?;
    store.attach(
        pie,
        Component::ChartElement(ChartElementComponent::default()),
    )?;
    store.attach(
        pie,
        Component::Index(IndexComponent {
            layer_index: 4,
            index: 0,
        }),
    )?;

    info!(entity_count = store.len(), "演示实体装配完成");
    Ok(DemoEntities {
        region,
        route,
        marker,
        label,
        pie,
    })
}
