use std::f64::consts::PI;

use tracing::debug;
use vmap_core::chart::{Geometry, Ring};
use vmap_core::geometry::{Point2, normalize_angle};
use vmap_core::store::{ComponentKind, EntityId, EntityStore};

use crate::errors::EngineError;
use crate::viewport::RenderHelper;

/// 命中结果：命中实体及其层序号，饼图实体额外带扇区标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub entity: EntityId,
    pub layer_index: usize,
    pub index: usize,
    pub sector: Option<usize>,
}

/// 按实体形状封闭枚举的定位器，与渲染器一一对应。
/// 定位在屏幕坐标中进行，几何经 [`RenderHelper`] 变换后比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Donut,
    Point,
    Path,
    Polygon,
}

/// 根据实体组件选择定位器。饼图实体优先于普通点标记。
pub fn locator_for(store: &EntityStore, id: EntityId) -> Option<Locator> {
    if store.try_pie_spec(id).is_some() && store.try_origin(id).is_some() {
        return Some(Locator::Donut);
    }
    if store.try_point_shape(id).is_some() && store.try_origin(id).is_some() {
        return Some(Locator::Point);
    }
    match store.try_geometry(id) {
        Some(Geometry::MultiLineString(_)) => Some(Locator::Path),
        Some(Geometry::MultiPolygon(_)) => Some(Locator::Polygon),
        None => None,
    }
}

impl Locator {
    /// 判定屏幕坐标 `coord` 是否命中实体。未命中返回 `Ok(None)`。
    pub fn search(
        &self,
        store: &EntityStore,
        id: EntityId,
        coord: Point2,
        helper: &RenderHelper,
    ) -> Result<Option<SearchResult>, EngineError> {
        let sector = match self {
            Locator::Donut => match search_donut(store, id, coord, helper)? {
                Some(sector) => Some(Some(sector)),
                None => None,
            },
            Locator::Point => search_point(store, id, coord, helper)?.then_some(None),
            Locator::Path => search_path(store, id, coord, helper)?.then_some(None),
            Locator::Polygon => search_polygon(store, id, coord, helper)?.then_some(None),
        };
        let Some(sector) = sector else {
            return Ok(None);
        };
        let (layer_index, index) = store
            .try_index(id)
            .map(|component| (component.layer_index, component.index))
            .unwrap_or((0, 0));
        Ok(Some(SearchResult {
            entity: id,
            layer_index,
            index,
            sector,
        }))
    }
}

/// 在全部可定位实体中查找命中目标。
/// 按（层号、层内序号、创建顺序）降序逐一判定，
/// 与绘制顺序相反，最上层的实体优先；未命中不会中断遍历。
pub fn find_target(
    store: &EntityStore,
    coord: Point2,
    helper: &RenderHelper,
) -> Result<Option<SearchResult>, EngineError> {
    let mut candidates: Vec<(usize, usize, EntityId, Locator)> = Vec::new();
    for id in store.query(&[ComponentKind::ChartElement]) {
        let Some(locator) = locator_for(store, id) else {
            continue;
        };
        let (layer_index, index) = store
            .try_index(id)
            .map(|component| (component.layer_index, component.index))
            .unwrap_or((0, 0));
        candidates.push((layer_index, index, id, locator));
    }
    candidates.sort_by_key(|(layer_index, index, id, _)| {
        (std::cmp::Reverse(*layer_index), std::cmp::Reverse(*index), std::cmp::Reverse(*id))
    });

    for (_, _, id, locator) in candidates {
        if let Some(result) = locator.search(store, id, coord, helper)? {
            debug!(entity = result.entity.get(), sector = ?result.sector, "命中目标");
            return Ok(Some(result));
        }
    }
    Ok(None)
}

/// 环形图扇区判定。扇区 0 从九点钟方向起逆时针（屏幕坐标系下
/// 视觉顺时针）排布：命中角 = `normalize(atan2(dy, dx) + π)`，
/// 再沿各扇区角宽累计行走。
fn search_donut(
    store: &EntityStore,
    id: EntityId,
    coord: Point2,
    helper: &RenderHelper,
) -> Result<Option<usize>, EngineError> {
    let pie = store.pie_spec(id)?;
    let element = store.chart_element(id)?;
    let center = helper.to_screen(store.origin(id)?.origin);
    let offset = center.vector_to(coord);

    let radius = pie.radius * element.scaling_size_factor;
    if offset.length() > radius {
        return Ok(None);
    }

    let angle = normalize_angle(offset.y().atan2(offset.x()) + PI);
    let mut cumulative = 0.0;
    for (slot, slice_angle) in pie.slice_angles.iter().enumerate() {
        cumulative += slice_angle;
        if angle < cumulative {
            return Ok(pie.indices.get(slot).copied());
        }
    }
    // 浮点累计误差可能让边界角落在总和之外，归入最后一个扇区。
    Ok(pie.indices.last().copied())
}

fn search_point(
    store: &EntityStore,
    id: EntityId,
    coord: Point2,
    helper: &RenderHelper,
) -> Result<bool, EngineError> {
    let point = store.point_shape(id)?;
    let element = store.chart_element(id)?;
    let center = helper.to_screen(store.origin(id)?.origin);

    let radius = point.size * element.scaling_size_factor / 2.0;
    Ok(center.vector_to(coord).length() <= radius)
}

fn search_path(
    store: &EntityStore,
    id: EntityId,
    coord: Point2,
    helper: &RenderHelper,
) -> Result<bool, EngineError> {
    let element = store.chart_element(id)?;
    let lines = store
        .geometry(id)?
        .multi_line_string()
        .ok_or(EngineError::GeometryMismatch(id.get()))?;

    let stroke = if element.stroke_width.is_nan() {
        0.0
    } else {
        element.stroke_width * element.scaling_size_factor
    };
    let threshold = stroke / 2.0;

    for line in lines {
        for pair in line.windows(2) {
            let start = helper.to_screen(pair[0]);
            let end = helper.to_screen(pair[1]);
            if distance_to_segment(coord, start, end) <= threshold {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn search_polygon(
    store: &EntityStore,
    id: EntityId,
    coord: Point2,
    helper: &RenderHelper,
) -> Result<bool, EngineError> {
    let polygons = store
        .geometry(id)?
        .multi_polygon()
        .ok_or(EngineError::GeometryMismatch(id.get()))?;

    // 外环与孔洞统一参与奇偶计数：落在孔洞内视为未命中。
    let mut crossings = 0usize;
    for polygon in polygons {
        for ring in polygon {
            crossings += ray_crossings(coord, ring, helper);
        }
    }
    Ok(crossings % 2 == 1)
}

/// 点到线段的最短距离（屏幕坐标）。
fn distance_to_segment(point: Point2, start: Point2, end: Point2) -> f64 {
    let segment = start.vector_to(end);
    let to_point = start.vector_to(point);
    let length_squared = segment.length_squared();
    if length_squared == 0.0 {
        return to_point.length();
    }
    let t = (to_point.dot(segment) / length_squared).clamp(0.0, 1.0);
    let nearest = start.translate(segment.scale(t));
    nearest.vector_to(point).length()
}

/// 向 +x 方向射线与环边的交点数（环隐式闭合）。
fn ray_crossings(point: Point2, ring: &Ring, helper: &RenderHelper) -> usize {
    let mut count = 0;
    for slot in 0..ring.len() {
        let a = helper.to_screen(ring[slot]);
        let b = helper.to_screen(ring[(slot + 1) % ring.len()]);
        let spans = (a.y() > point.y()) != (b.y() > point.y());
        if !spans {
            continue;
        }
        let cross_x = a.x() + (point.y() - a.y()) / (b.y() - a.y()) * (b.x() - a.x());
        if cross_x > point.x() {
            count += 1;
        }
    }
    count
}
