use tracing::debug;
use vmap_core::chart::{ArrowKind, ArrowSpec, ChartElementComponent, Geometry, LineString};
use vmap_core::color::Color;
use vmap_core::geometry::{Point2, Rect};
use vmap_core::store::{ComponentKind, EntityId, EntityStore};

use crate::errors::EngineError;
use crate::surface::{DrawingSurface, LineJoin};
use crate::viewport::RenderHelper;

/// 三次贝塞尔近似四分之一圆弧的控制点系数。
const KAPPA: f64 = 0.552_284_749_830_793_6;
const SQRT3_HALF: f64 = 0.866_025_403_784_438_6;

/// 按实体形状封闭枚举的渲染器。每种渲染器读取所需组件并向
/// 绘制表面输出指令，绝不修改实体。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    Point,
    Polygon,
    Path,
    Text,
}

/// 根据实体携带的组件选择渲染器。饼图实体在本核心中只参与
/// 命中判定，不在此绘制。
pub fn renderer_for(store: &EntityStore, id: EntityId) -> Option<Renderer> {
    if store.try_point_shape(id).is_some() && store.try_origin(id).is_some() {
        return Some(Renderer::Point);
    }
    if store.try_text_spec(id).is_some() && store.try_origin(id).is_some() {
        return Some(Renderer::Text);
    }
    match store.try_geometry(id) {
        Some(Geometry::MultiPolygon(_)) => Some(Renderer::Polygon),
        Some(Geometry::MultiLineString(_)) => Some(Renderer::Path),
        None => None,
    }
}

impl Renderer {
    /// 渲染单个实体。所需组件缺失视为上游配置缺陷，直接报错。
    pub fn render(
        &self,
        store: &EntityStore,
        id: EntityId,
        surface: &mut dyn DrawingSurface,
        helper: &RenderHelper,
    ) -> Result<(), EngineError> {
        match self {
            Renderer::Point => render_point(store, id, surface, helper),
            Renderer::Polygon => render_polygon(store, id, surface, helper),
            Renderer::Path => render_path(store, id, surface, helper),
            Renderer::Text => render_text(store, id, surface, helper),
        }
    }
}

/// 渲染一帧：拥有样式组件且可选出渲染器的实体，按
/// （层号、层内序号、创建顺序）升序绘制，层号高者最后落笔。
pub fn render_frame(
    store: &EntityStore,
    helper: &RenderHelper,
    surface: &mut dyn DrawingSurface,
) -> Result<(), EngineError> {
    let mut queue: Vec<(usize, usize, EntityId, Renderer)> = Vec::new();
    for id in store.query(&[ComponentKind::ChartElement]) {
        let Some(renderer) = renderer_for(store, id) else {
            continue;
        };
        let (layer_index, index) = store
            .try_index(id)
            .map(|component| (component.layer_index, component.index))
            .unwrap_or((0, 0));
        queue.push((layer_index, index, id, renderer));
    }
    queue.sort_by_key(|(layer_index, index, id, _)| (*layer_index, *index, *id));
    debug!(entity_count = queue.len(), "开始渲染一帧");

    for (_, _, id, renderer) in queue {
        surface.save();
        let result = renderer.render(store, id, surface, helper);
        surface.restore();
        result?;
    }
    Ok(())
}

fn render_point(
    store: &EntityStore,
    id: EntityId,
    surface: &mut dyn DrawingSurface,
    helper: &RenderHelper,
) -> Result<(), EngineError> {
    let element = store.chart_element(id)?;
    let point = store.point_shape(id)?;
    let origin = store.origin(id)?.origin;

    let radius = point.size * element.scaling_size_factor / 2.0;
    let stroke = if element.stroke_width.is_nan() {
        0.0
    } else {
        element.stroke_width * element.scaling_size_factor
    };

    surface.translate(helper.to_screen(origin));
    surface.begin_path();
    trace_point_shape(surface, radius, point.shape)?;

    if let Some(fill) = element.fill_color {
        surface.set_fill_color(Some(fill.scaled_with_min(element.scaling_alpha_value)));
        surface.fill();
    }
    if let Some(stroke_color) = element.stroke_color {
        if stroke > 0.0 {
            surface.set_stroke_color(Some(
                stroke_color.scaled_with_min(element.scaling_alpha_value),
            ));
            surface.set_line_width(stroke);
            surface.stroke();
        }
    }
    Ok(())
}

fn render_polygon(
    store: &EntityStore,
    id: EntityId,
    surface: &mut dyn DrawingSurface,
    helper: &RenderHelper,
) -> Result<(), EngineError> {
    let element = store.chart_element(id)?;
    let polygons = store
        .geometry(id)?
        .multi_polygon()
        .ok_or(EngineError::GeometryMismatch(id.get()))?;

    surface.set_line_join(LineJoin::Round);
    surface.begin_path();

    // 几何保持世界坐标，绘制时才施加缩放，线宽因此不随缩放变化。
    surface.save();
    surface.scale(helper.zoom_factor());
    for polygon in polygons {
        for ring in polygon {
            let Some(first) = ring.first() else {
                continue;
            };
            surface.move_to(*first);
            for point in &ring[1..] {
                surface.line_to(*point);
            }
            // 外环与孔洞各自闭合，填充时按奇偶规则相减。
            surface.close_path();
        }
    }
    surface.restore();

    if let Some(fill) = element.fill_color {
        surface.set_fill_color(Some(fill.scaled_with_min(element.scaling_alpha_value)));
        surface.fill();
    }
    if let Some(stroke_color) = element.stroke_color {
        if element.stroke_width != 0.0 {
            surface.set_stroke_color(Some(
                stroke_color.scaled_with_min(element.scaling_alpha_value),
            ));
            surface.set_line_width(element.stroke_width * element.scaling_size_factor);
            surface.stroke();
        }
    }
    Ok(())
}

fn render_path(
    store: &EntityStore,
    id: EntityId,
    surface: &mut dyn DrawingSurface,
    helper: &RenderHelper,
) -> Result<(), EngineError> {
    let element = store.chart_element(id)?;
    let lines = store
        .geometry(id)?
        .multi_line_string()
        .ok_or(EngineError::GeometryMismatch(id.get()))?;
    let stroke_color = element
        .stroke_color
        .ok_or(EngineError::MissingStrokeColor(id.get()))?;
    let color = stroke_color.scaled_with_min(element.scaling_alpha_value);

    surface.save();
    surface.scale(helper.zoom_factor());
    surface.begin_path();
    for line in lines {
        let Some(first) = line.first() else {
            continue;
        };
        surface.move_to(*first);
        for point in &line[1..] {
            surface.line_to(*point);
        }
    }
    surface.restore();

    surface.set_stroke_color(Some(color));
    let dash: Vec<f64> = element
        .line_dash
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|value| value * element.scaling_size_factor)
        .collect();
    surface.set_line_dash(&dash);
    surface.set_line_width(element.stroke_width * element.scaling_size_factor);
    surface.stroke();

    if let Some(arrow_spec) = element.arrow_spec {
        draw_arrows(&arrow_spec, lines, color, element, surface, helper);
    }
    Ok(())
}

fn draw_arrows(
    arrow_spec: &ArrowSpec,
    lines: &[LineString],
    color: Color,
    element: &ChartElementComponent,
    surface: &mut dyn DrawingSurface,
    helper: &RenderHelper,
) {
    for line in lines {
        if line.len() < 2 {
            continue;
        }
        if arrow_spec.on_first_end() {
            // 起点端的方向取前两个点反向：由第二点指向首点。
            draw_arrow_at_end(line[1], line[0], arrow_spec, color, element, surface, helper);
        }
        if arrow_spec.on_last_end() {
            let tail = line.len() - 2;
            draw_arrow_at_end(
                line[tail],
                line[tail + 1],
                arrow_spec,
                color,
                element,
                surface,
                helper,
            );
        }
    }
}

fn draw_arrow_at_end(
    start: Point2,
    end: Point2,
    arrow_spec: &ArrowSpec,
    color: Color,
    element: &ChartElementComponent,
    surface: &mut dyn DrawingSurface,
    helper: &RenderHelper,
) {
    let direction = start.vector_to(end);
    // 退化线段没有方向，不绘制箭头。
    if direction.x() == 0.0 && direction.y() == 0.0 {
        return;
    }
    let polar_angle = direction.y().atan2(direction.x());
    let length_world = helper.to_world(arrow_spec.length);
    let [wing_a, tip, wing_b] =
        arrow_spec.wing_path(polar_angle, end, length_world, element.scaling_size_factor);

    surface.save();
    surface.scale(helper.zoom_factor());
    surface.begin_path();
    surface.move_to(wing_a);
    surface.line_to(tip);
    surface.line_to(wing_b);
    surface.restore();

    // 箭头不使用虚线。
    surface.set_line_dash(&[]);
    if arrow_spec.kind == ArrowKind::Closed {
        surface.close_path();
        surface.set_fill_color(Some(color));
        surface.fill();
    }
    surface.stroke();
}

fn render_text(
    store: &EntityStore,
    id: EntityId,
    surface: &mut dyn DrawingSurface,
    helper: &RenderHelper,
) -> Result<(), EngineError> {
    let element = store.chart_element(id)?;
    let text = store.text_spec(id)?;
    let origin = store.origin(id)?.origin;

    surface.translate(helper.to_screen(origin));
    surface.rotate(text.angle);

    let position = if text.draw_border {
        trace_rounded_rectangle(surface, &text.frame, text.label_radius * text.frame.height());

        if let Some(fill) = element.fill_color {
            surface.set_fill_color(Some(fill.scaled_with_min(element.scaling_alpha_value)));
            surface.fill();
        }
        if element.stroke_color.is_some() && text.label_size != 0.0 {
            surface.set_stroke_color(element.stroke_color);
            surface.set_line_width(text.label_size);
            surface.stroke();
        }

        let x_position = if text.hjust == 0.0 {
            text.padding
        } else if text.hjust == 1.0 {
            -text.padding
        } else {
            0.0
        };
        // 首行基线从边框顶部下移 padding 加 0.8 倍字号。
        Point2::new(
            x_position,
            text.frame.top() + text.padding + text.font.size * 0.8,
        )
    } else {
        let y_position = if text.vjust == 1.0 {
            text.font.size * 0.7
        } else if text.vjust == 0.0 {
            -text.text_size.y() + text.font.size
        } else {
            -text.text_size.y() / 2.0 + text.font.size * 0.8
        };
        Point2::new(0.0, y_position)
    };

    surface.set_font(&text.font);
    surface.set_fill_color(element.stroke_color);
    surface.set_text_align(text.text_align);
    for (index, line) in text.lines.iter().enumerate() {
        surface.fill_text(
            line,
            position.x(),
            position.y() + text.line_height * index as f64,
        );
    }
    Ok(())
}

/// 圆角矩形路径：四角各用一段贝塞尔曲线，半径不超过宽高的一半。
fn trace_rounded_rectangle(surface: &mut dyn DrawingSurface, rect: &Rect, radius: f64) {
    let r = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    let (left, right, top, bottom) = (rect.left(), rect.right(), rect.top(), rect.bottom());

    surface.begin_path();
    surface.move_to(Point2::new(right - r, bottom));
    surface.bezier_curve_to(
        Point2::new(right - r, bottom),
        Point2::new(right, bottom),
        Point2::new(right, bottom - r),
    );
    surface.line_to(Point2::new(right, top + r));
    surface.bezier_curve_to(
        Point2::new(right, top + r),
        Point2::new(right, top),
        Point2::new(right - r, top),
    );
    surface.line_to(Point2::new(left + r, top));
    surface.bezier_curve_to(
        Point2::new(left + r, top),
        Point2::new(left, top),
        Point2::new(left, top + r),
    );
    surface.line_to(Point2::new(left, bottom - r));
    surface.bezier_curve_to(
        Point2::new(left, bottom - r),
        Point2::new(left, bottom),
        Point2::new(left + r, bottom),
    );
    surface.close_path();
}

/// 按 R pch 风格的形状代码构建点标记子路径，原点为标记中心。
/// 仅构建路径；填充与描边由调用方按样式决定。
fn trace_point_shape(
    surface: &mut dyn DrawingSurface,
    radius: f64,
    shape: i32,
) -> Result<(), EngineError> {
    match shape {
        0 | 15 | 22 => trace_square(surface, radius),
        1 | 16 | 19 | 21 => trace_circle(surface, radius),
        2 | 17 | 24 => trace_triangle(surface, radius, true),
        3 => trace_plus(surface, radius),
        4 => trace_cross(surface, radius),
        5 | 18 | 23 => trace_diamond(surface, radius),
        6 | 25 => trace_triangle(surface, radius, false),
        7 => {
            trace_square(surface, radius);
            trace_cross(surface, radius);
        }
        8 => {
            trace_plus(surface, radius);
            trace_cross(surface, radius);
        }
        9 => {
            trace_diamond(surface, radius);
            trace_plus(surface, radius);
        }
        10 => {
            trace_circle(surface, radius);
            trace_plus(surface, radius);
        }
        11 => {
            trace_triangle(surface, radius, true);
            trace_triangle(surface, radius, false);
        }
        12 => {
            trace_square(surface, radius);
            trace_plus(surface, radius);
        }
        13 => {
            trace_circle(surface, radius);
            trace_cross(surface, radius);
        }
        14 => {
            trace_square(surface, radius);
            trace_triangle(surface, radius, true);
        }
        // pch 20：缩小为三分之二的实心圆点。
        20 => trace_circle(surface, radius * 2.0 / 3.0),
        other => return Err(EngineError::UnknownPointShape(other)),
    }
    Ok(())
}

/// 四段三次贝塞尔近似整圆，避免要求绘制表面提供圆弧指令。
fn trace_circle(surface: &mut dyn DrawingSurface, r: f64) {
    let k = r * KAPPA;
    surface.move_to(Point2::new(r, 0.0));
    surface.bezier_curve_to(
        Point2::new(r, k),
        Point2::new(k, r),
        Point2::new(0.0, r),
    );
    surface.bezier_curve_to(
        Point2::new(-k, r),
        Point2::new(-r, k),
        Point2::new(-r, 0.0),
    );
    surface.bezier_curve_to(
        Point2::new(-r, -k),
        Point2::new(-k, -r),
        Point2::new(0.0, -r),
    );
    surface.bezier_curve_to(
        Point2::new(k, -r),
        Point2::new(r, -k),
        Point2::new(r, 0.0),
    );
    surface.close_path();
}

fn trace_square(surface: &mut dyn DrawingSurface, r: f64) {
    surface.move_to(Point2::new(-r, -r));
    surface.line_to(Point2::new(r, -r));
    surface.line_to(Point2::new(r, r));
    surface.line_to(Point2::new(-r, r));
    surface.close_path();
}

fn trace_triangle(surface: &mut dyn DrawingSurface, r: f64, apex_up: bool) {
    // 屏幕 y 轴向下，apex_up 表示视觉上顶点朝上。
    let sign = if apex_up { -1.0 } else { 1.0 };
    surface.move_to(Point2::new(0.0, sign * r));
    surface.line_to(Point2::new(SQRT3_HALF * r, -sign * r / 2.0));
    surface.line_to(Point2::new(-SQRT3_HALF * r, -sign * r / 2.0));
    surface.close_path();
}

fn trace_diamond(surface: &mut dyn DrawingSurface, r: f64) {
    surface.move_to(Point2::new(0.0, -r));
    surface.line_to(Point2::new(r, 0.0));
    surface.line_to(Point2::new(0.0, r));
    surface.line_to(Point2::new(-r, 0.0));
    surface.close_path();
}

fn trace_plus(surface: &mut dyn DrawingSurface, r: f64) {
    surface.move_to(Point2::new(-r, 0.0));
    surface.line_to(Point2::new(r, 0.0));
    surface.move_to(Point2::new(0.0, -r));
    surface.line_to(Point2::new(0.0, r));
}

fn trace_cross(surface: &mut dyn DrawingSurface, r: f64) {
    let half = r * std::f64::consts::FRAC_1_SQRT_2;
    surface.move_to(Point2::new(-half, -half));
    surface.line_to(Point2::new(half, half));
    surface.move_to(Point2::new(half, -half));
    surface.line_to(Point2::new(-half, half));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceOp};
    use std::f64::consts::PI;
    use vmap_core::chart::{
        ArrowEnd, Font, Geometry, OriginComponent, PointShapeComponent, TextAlign,
        TextSpecComponent,
    };
    use vmap_core::geometry::Vector2;
    use vmap_core::store::{Component, StoreError};

    fn identity_helper() -> RenderHelper {
        RenderHelper::new(Point2::new(0.0, 0.0), 1.0)
    }

    fn element_with_stroke() -> ChartElementComponent {
        ChartElementComponent {
            stroke_color: Some(Color::BLACK),
            stroke_width: 2.0,
            ..ChartElementComponent::default()
        }
    }

    fn text_spec(draw_border: bool, hjust: f64, vjust: f64) -> TextSpecComponent {
        TextSpecComponent {
            lines: vec!["第一行".to_string(), "第二行".to_string()],
            font: Font::new(10.0, "sans"),
            text_align: TextAlign::Center,
            angle: PI / 4.0,
            hjust,
            vjust,
            text_size: Vector2::new(40.0, 24.0),
            line_height: 12.0,
            draw_border,
            frame: Rect::new(Point2::new(-20.0, -8.0), Vector2::new(40.0, 16.0)),
            label_radius: 0.25,
            label_size: 1.5,
            padding: 2.0,
        }
    }

    #[test]
    fn point_renderer_translates_and_fills_with_alpha_floor() {
        let mut store = EntityStore::new();
        let id = store.create_entity("marker");
        store
            .attach(
                id,
                Component::ChartElement(ChartElementComponent {
                    fill_color: Some(Color::BLACK),
                    scaling_alpha_value: 0.5,
                    ..ChartElementComponent::default()
                }),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::PointShape(PointShapeComponent {
                    shape: 16,
                    size: 8.0,
                }),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::Origin(OriginComponent {
                    origin: Point2::new(30.0, 20.0),
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        Renderer::Point
            .render(&store, id, &mut surface, &identity_helper())
            .expect("render point");

        assert_eq!(
            surface.ops()[0],
            SurfaceOp::Translate(Point2::new(30.0, 20.0))
        );
        let fill_color = surface.ops().iter().find_map(|op| match op {
            SurfaceOp::SetFillColor(Some(color)) => Some(*color),
            _ => None,
        });
        assert_eq!(fill_color, Some(Color::BLACK.with_alpha(128)));
        // 线宽为 NaN 表示无描边。
        assert!(
            !surface
                .ops()
                .iter()
                .any(|op| matches!(op, SurfaceOp::SetLineWidth(_) | SurfaceOp::Stroke))
        );
    }

    #[test]
    fn point_renderer_rejects_unknown_shape_code() {
        let mut store = EntityStore::new();
        let id = store.create_entity("marker");
        store
            .attach(id, Component::ChartElement(ChartElementComponent::default()))
            .unwrap();
        store
            .attach(
                id,
                Component::PointShape(PointShapeComponent {
                    shape: 26,
                    size: 4.0,
                }),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::Origin(OriginComponent {
                    origin: Point2::new(0.0, 0.0),
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        let err = Renderer::Point
            .render(&store, id, &mut surface, &identity_helper())
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownPointShape(26)));
    }

    #[test]
    fn missing_required_component_is_fatal_for_entity() {
        let mut store = EntityStore::new();
        let id = store.create_entity("broken");
        store
            .attach(id, Component::ChartElement(ChartElementComponent::default()))
            .unwrap();
        store
            .attach(
                id,
                Component::PointShape(PointShapeComponent {
                    shape: 1,
                    size: 4.0,
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        let err = Renderer::Point
            .render(&store, id, &mut surface, &identity_helper())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Store(StoreError::MissingComponent { .. })
        ));
    }

    #[test]
    fn polygon_hole_is_second_closed_subpath_before_single_fill() {
        let mut store = EntityStore::new();
        let id = store.create_entity("region");
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(60.0, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(0.0, 40.0),
        ];
        let hole = vec![
            Point2::new(20.0, 10.0),
            Point2::new(40.0, 10.0),
            Point2::new(40.0, 30.0),
            Point2::new(20.0, 30.0),
        ];
        store
            .attach(
                id,
                Component::Geometry(Geometry::MultiPolygon(vec![vec![outer, hole]])),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::ChartElement(ChartElementComponent {
                    fill_color: Some(Color::new(0, 128, 0)),
                    stroke_width: 0.0,
                    ..ChartElementComponent::default()
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        Renderer::Polygon
            .render(&store, id, &mut surface, &identity_helper())
            .expect("render polygon");

        let ops = surface.ops();
        let close_positions: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter_map(|(i, op)| matches!(op, SurfaceOp::ClosePath).then_some(i))
            .collect();
        let fill_positions: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter_map(|(i, op)| matches!(op, SurfaceOp::Fill).then_some(i))
            .collect();
        assert_eq!(close_positions.len(), 2);
        assert_eq!(fill_positions.len(), 1);
        assert!(close_positions.iter().all(|i| *i < fill_positions[0]));
        // 描边宽度为 0 时不描边。
        assert!(!ops.iter().any(|op| matches!(op, SurfaceOp::Stroke)));
        assert!(
            ops.iter()
                .any(|op| matches!(op, SurfaceOp::SetLineJoin(LineJoin::Round)))
        );
    }

    #[test]
    fn path_renderer_scales_dash_and_draws_under_zoom() {
        let mut store = EntityStore::new();
        let id = store.create_entity("route");
        store
            .attach(
                id,
                Component::Geometry(Geometry::MultiLineString(vec![vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(10.0, 0.0),
                ]])),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::ChartElement(ChartElementComponent {
                    stroke_color: Some(Color::BLACK),
                    stroke_width: 2.0,
                    line_dash: Some(vec![6.0, 3.0]),
                    scaling_size_factor: 2.0,
                    ..ChartElementComponent::default()
                }),
            )
            .unwrap();

        let helper = RenderHelper::new(Point2::new(0.0, 0.0), 4.0);
        let mut surface = RecordingSurface::new();
        Renderer::Path
            .render(&store, id, &mut surface, &helper)
            .expect("render path");

        let ops = surface.ops();
        assert!(ops.iter().any(|op| matches!(op, SurfaceOp::Scale(f) if (*f - 4.0).abs() < 1e-12)));
        assert!(
            ops.iter()
                .any(|op| *op == SurfaceOp::SetLineDash(vec![12.0, 6.0]))
        );
        assert!(
            ops.iter()
                .any(|op| matches!(op, SurfaceOp::SetLineWidth(w) if (*w - 4.0).abs() < 1e-12))
        );
    }

    #[test]
    fn arrowhead_wings_are_symmetric_for_horizontal_segment() {
        let mut store = EntityStore::new();
        let id = store.create_entity("route");
        store
            .attach(
                id,
                Component::Geometry(Geometry::MultiLineString(vec![vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(10.0, 0.0),
                ]])),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::ChartElement(ChartElementComponent {
                    stroke_color: Some(Color::BLACK),
                    stroke_width: 1.0,
                    arrow_spec: Some(ArrowSpec {
                        angle: PI / 6.0,
                        length: 4.0,
                        end: ArrowEnd::Last,
                        kind: ArrowKind::Open,
                    }),
                    ..ChartElementComponent::default()
                }),
            )
            .unwrap();

        let helper = RenderHelper::new(Point2::new(0.0, 0.0), 2.0);
        let mut surface = RecordingSurface::new();
        Renderer::Path
            .render(&store, id, &mut surface, &helper)
            .expect("render path with arrow");

        let ops = surface.ops();
        let last_begin = ops
            .iter()
            .rposition(|op| matches!(op, SurfaceOp::BeginPath))
            .expect("arrow path present");
        let SurfaceOp::MoveTo(wing_a) = ops[last_begin + 1] else {
            panic!("expected wing move");
        };
        let SurfaceOp::LineTo(tip) = ops[last_begin + 2] else {
            panic!("expected tip segment");
        };
        let SurfaceOp::LineTo(wing_b) = ops[last_begin + 3] else {
            panic!("expected wing segment");
        };

        assert_eq!(tip, Point2::new(10.0, 0.0));
        // 箭头长度换算到世界单位：4 / 2 = 2。
        let expected_x = 10.0 - 2.0 * (PI / 6.0).cos();
        assert!((wing_a.x() - expected_x).abs() < 1e-12);
        assert!((wing_a.x() - wing_b.x()).abs() < 1e-12);
        assert!((wing_a.y() + wing_b.y()).abs() < 1e-12);
        // 箭头绘制前关闭虚线。
        assert!(
            ops[last_begin..]
                .iter()
                .any(|op| *op == SurfaceOp::SetLineDash(vec![]))
        );
        // 开放式箭头只描边不填充。
        assert!(
            !ops[last_begin..]
                .iter()
                .any(|op| matches!(op, SurfaceOp::Fill))
        );
    }

    #[test]
    fn closed_arrowhead_fills_before_stroking() {
        let mut store = EntityStore::new();
        let id = store.create_entity("route");
        store
            .attach(
                id,
                Component::Geometry(Geometry::MultiLineString(vec![vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(0.0, 8.0),
                ]])),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::ChartElement(ChartElementComponent {
                    stroke_color: Some(Color::BLACK),
                    stroke_width: 1.0,
                    arrow_spec: Some(ArrowSpec {
                        angle: PI / 6.0,
                        length: 4.0,
                        end: ArrowEnd::Both,
                        kind: ArrowKind::Closed,
                    }),
                    ..ChartElementComponent::default()
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        Renderer::Path
            .render(&store, id, &mut surface, &identity_helper())
            .expect("render path");

        // 两端各一个闭合填充箭头。
        let stats = surface.stats();
        assert_eq!(stats.fills, 2);
        let close_count = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, SurfaceOp::ClosePath))
            .count();
        assert_eq!(close_count, 2);
    }

    #[test]
    fn degenerate_segment_draws_no_arrowhead() {
        let mut store = EntityStore::new();
        let id = store.create_entity("route");
        store
            .attach(
                id,
                Component::Geometry(Geometry::MultiLineString(vec![vec![
                    Point2::new(3.0, 3.0),
                    Point2::new(3.0, 3.0),
                ]])),
            )
            .unwrap();
        store
            .attach(
                id,
                Component::ChartElement(ChartElementComponent {
                    stroke_color: Some(Color::BLACK),
                    stroke_width: 1.0,
                    arrow_spec: Some(ArrowSpec {
                        angle: PI / 6.0,
                        length: 4.0,
                        end: ArrowEnd::Both,
                        kind: ArrowKind::Closed,
                    }),
                    ..ChartElementComponent::default()
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        Renderer::Path
            .render(&store, id, &mut surface, &identity_helper())
            .expect("render degenerate path");

        // 只有主路径，没有箭头子路径。
        let begin_count = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, SurfaceOp::BeginPath))
            .count();
        assert_eq!(begin_count, 1);
        assert_eq!(surface.stats().fills, 0);
    }

    #[test]
    fn path_without_stroke_color_is_configuration_error() {
        let mut store = EntityStore::new();
        let id = store.create_entity("route");
        store
            .attach(
                id,
                Component::Geometry(Geometry::MultiLineString(vec![vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(1.0, 1.0),
                ]])),
            )
            .unwrap();
        store
            .attach(id, Component::ChartElement(ChartElementComponent::default()))
            .unwrap();

        let mut surface = RecordingSurface::new();
        let err = Renderer::Path
            .render(&store, id, &mut surface, &identity_helper())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingStrokeColor(_)));
    }

    #[test]
    fn bordered_text_positions_first_baseline_inside_frame() {
        let mut store = EntityStore::new();
        let id = store.create_entity("label");
        store
            .attach(id, Component::ChartElement(element_with_stroke()))
            .unwrap();
        store
            .attach(id, Component::TextSpec(text_spec(true, 0.0, 0.5)))
            .unwrap();
        store
            .attach(
                id,
                Component::Origin(OriginComponent {
                    origin: Point2::new(5.0, 5.0),
                }),
            )
            .unwrap();

        let mut surface = RecordingSurface::new();
        Renderer::Text
            .render(&store, id, &mut surface, &identity_helper())
            .expect("render text");

        let ops = surface.ops();
        assert_eq!(ops[0], SurfaceOp::Translate(Point2::new(5.0, 5.0)));
        assert_eq!(ops[1], SurfaceOp::Rotate(PI / 4.0));
        // 圆角矩形包含四段贝塞尔。
        let bezier_count = ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::BezierCurveTo { .. }))
            .count();
        assert_eq!(bezier_count, 4);

        let texts: Vec<(f64, f64)> = ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::FillText { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        // hjust = 0 时向内缩进 padding；基线 = top + padding + 0.8 字号。
        assert_eq!(texts.len(), 2);
        assert!((texts[0].0 - 2.0).abs() < 1e-12);
        assert!((texts[0].1 - (-8.0 + 2.0 + 8.0)).abs() < 1e-12);
        // 第二行按固定行高下移。
        assert!((texts[1].1 - (texts[0].1 + 12.0)).abs() < 1e-12);
    }

    #[test]
    fn plain_text_vertical_justification() {
        for (vjust, expected_y) in [
            (1.0, 7.0),
            (0.0, -24.0 + 10.0),
            (0.5, -12.0 + 8.0),
        ] {
            let mut store = EntityStore::new();
            let id = store.create_entity("label");
            store
                .attach(id, Component::ChartElement(element_with_stroke()))
                .unwrap();
            store
                .attach(id, Component::TextSpec(text_spec(false, 0.5, vjust)))
                .unwrap();
            store
                .attach(
                    id,
                    Component::Origin(OriginComponent {
                        origin: Point2::new(0.0, 0.0),
                    }),
                )
                .unwrap();

            let mut surface = RecordingSurface::new();
            Renderer::Text
                .render(&store, id, &mut surface, &identity_helper())
                .expect("render text");

            let first = surface
                .ops()
                .iter()
                .find_map(|op| match op {
                    SurfaceOp::FillText { x, y, .. } => Some((*x, *y)),
                    _ => None,
                })
                .expect("text present");
            assert!((first.0).abs() < 1e-12);
            assert!(
                (first.1 - expected_y).abs() < 1e-12,
                "vjust={vjust} 期望 y={expected_y}，实际 {}",
                first.1
            );
        }
    }

    #[test]
    fn render_frame_paints_low_layers_first() {
        let mut store = EntityStore::new();
        let top = store.create_entity("top");
        let bottom = store.create_entity("bottom");
        for (id, layer, x) in [(top, 1, 10.0), (bottom, 0, 20.0)] {
            store
                .attach(
                    id,
                    Component::ChartElement(ChartElementComponent {
                        fill_color: Some(Color::BLACK),
                        ..ChartElementComponent::default()
                    }),
                )
                .unwrap();
            store
                .attach(
                    id,
                    Component::PointShape(PointShapeComponent {
                        shape: 16,
                        size: 4.0,
                    }),
                )
                .unwrap();
            store
                .attach(
                    id,
                    Component::Origin(OriginComponent {
                        origin: Point2::new(x, 0.0),
                    }),
                )
                .unwrap();
            store
                .attach(
                    id,
                    Component::Index(vmap_core::chart::IndexComponent {
                        layer_index: layer,
                        index: 0,
                    }),
                )
                .unwrap();
        }

        let mut surface = RecordingSurface::new();
        render_frame(&store, &identity_helper(), &mut surface).expect("render frame");

        let translates: Vec<Point2> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Translate(p) => Some(*p),
                _ => None,
            })
            .collect();
        // 低层先画，高层后画（覆盖在上）。
        assert_eq!(translates, vec![Point2::new(20.0, 0.0), Point2::new(10.0, 0.0)]);
    }

    #[test]
    fn entities_without_renderer_are_skipped() {
        let mut store = EntityStore::new();
        let id = store.create_entity("pie");
        store
            .attach(id, Component::ChartElement(ChartElementComponent::default()))
            .unwrap();
        // 只有样式组件、没有几何或锚点的实体没有对应渲染器。
        assert_eq!(renderer_for(&store, id), None);

        let mut surface = RecordingSurface::new();
        render_frame(&store, &identity_helper(), &mut surface).expect("render frame");
        assert!(surface.is_empty());
    }
}
