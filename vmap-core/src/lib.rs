pub mod geometry {
    use std::f64::consts::TAU;

    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。世界坐标与屏幕坐标共用该类型，
    /// 具体坐标系由 API 文档约定。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，提供定位与投影所需的基础运算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn dot(self, other: Vector2) -> f64 {
            self.0.dot(other.0)
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐矩形，由原点（左上角）与尺寸描述，用于文本标签边框。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Rect {
        pub origin: Point2,
        pub dimension: Vector2,
    }

    impl Rect {
        #[inline]
        pub fn new(origin: Point2, dimension: Vector2) -> Self {
            Self { origin, dimension }
        }

        #[inline]
        pub fn left(&self) -> f64 {
            self.origin.x()
        }

        #[inline]
        pub fn right(&self) -> f64 {
            self.origin.x() + self.dimension.x()
        }

        #[inline]
        pub fn top(&self) -> f64 {
            self.origin.y()
        }

        #[inline]
        pub fn bottom(&self) -> f64 {
            self.origin.y() + self.dimension.y()
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.dimension.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.dimension.y()
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            Point2::from_vec(self.origin.as_vec2() + self.dimension.as_vec2() * 0.5)
        }
    }

    /// 将角度规范化到 `[0, 2π)`。
    pub fn normalize_angle(angle: f64) -> f64 {
        let mut result = angle % TAU;
        if result < 0.0 {
            result += TAU;
        }
        result
    }

}

pub mod color {
    use serde::{Deserialize, Serialize};

    /// 缩放后透明度的下限，防止元素在极端缩放下完全消失。
    pub const MIN_SCALED_ALPHA: f64 = 0.1;

    /// RGBA 颜色，分量取值 0..=255。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Color {
        pub r: u8,
        pub g: u8,
        pub b: u8,
        pub a: u8,
    }

    impl Color {
        pub const BLACK: Color = Color::new(0, 0, 0);
        pub const WHITE: Color = Color::new(255, 255, 255);

        #[inline]
        pub const fn new(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b, a: 255 }
        }

        #[inline]
        pub const fn with_alpha(self, a: u8) -> Self {
            Self { a, ..self }
        }

        /// 透明度的 0..=1 浮点表示。
        #[inline]
        pub fn alpha_fraction(self) -> f64 {
            f64::from(self.a) / 255.0
        }

        #[inline]
        fn from_alpha_fraction(self, fraction: f64) -> Self {
            let clamped = fraction.clamp(0.0, 1.0);
            self.with_alpha((clamped * 255.0).round() as u8)
        }

        /// 按缩放系数降低透明度，但不会低于 [`MIN_SCALED_ALPHA`]。
        /// 即有效透明度为 `max(alpha * factor, MIN_SCALED_ALPHA)`。
        pub fn scaled_with_min(self, factor: f64) -> Self {
            let effective = (self.alpha_fraction() * factor).max(MIN_SCALED_ALPHA);
            self.from_alpha_fraction(effective)
        }
    }

}

pub mod chart {
    use std::f64::consts::TAU;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::color::Color;
    use crate::geometry::{Point2, Rect, Vector2};

    /// 单条环/折线：有序的世界坐标点列。
    pub type Ring = Vec<Point2>;
    /// 多边形由若干环组成，第一个环为外环，其余为孔洞。
    pub type Polygon = Vec<Ring>;
    /// 折线串。
    pub type LineString = Vec<Point2>;

    /// 世界坐标几何体。绘制时按当前缩放系数变换，而非预先投影。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Geometry {
        MultiPolygon(Vec<Polygon>),
        MultiLineString(Vec<LineString>),
    }

    impl Geometry {
        #[inline]
        pub fn multi_polygon(&self) -> Option<&[Polygon]> {
            match self {
                Geometry::MultiPolygon(polygons) => Some(polygons),
                Geometry::MultiLineString(_) => None,
            }
        }

        #[inline]
        pub fn multi_line_string(&self) -> Option<&[LineString]> {
            match self {
                Geometry::MultiLineString(lines) => Some(lines),
                Geometry::MultiPolygon(_) => None,
            }
        }
    }

    /// 点状/文字实体的世界坐标锚点。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct OriginComponent {
        pub origin: Point2,
    }

    /// 箭头挂载端。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ArrowEnd {
        First,
        Last,
        Both,
    }

    /// 箭头头部样式。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ArrowKind {
        Open,
        Closed,
    }

    #[derive(Debug, Error)]
    pub enum ArrowSpecError {
        #[error("无效的箭头端点选择 {0:?}，期望 first|last|both")]
        InvalidEnd(String),
        #[error("无效的箭头样式 {0:?}，期望 open|closed")]
        InvalidKind(String),
    }

    /// 箭头规格：半角（弧度）、长度（屏幕单位）、挂载端与头部样式。
    /// 构造后不可变。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct ArrowSpec {
        pub angle: f64,
        pub length: f64,
        pub end: ArrowEnd,
        pub kind: ArrowKind,
    }

    impl ArrowSpec {
        /// 由配置值构造。角度与长度任一缺失时返回 `Ok(None)`；
        /// 端点/样式字符串不合法则立即报错，绝不静默回退。
        pub fn build(
            angle: Option<f64>,
            length: Option<f64>,
            ends: &str,
            kind: &str,
        ) -> Result<Option<Self>, ArrowSpecError> {
            let (Some(angle), Some(length)) = (angle, length) else {
                return Ok(None);
            };
            let end = match ends {
                "first" => ArrowEnd::First,
                "last" => ArrowEnd::Last,
                "both" => ArrowEnd::Both,
                other => return Err(ArrowSpecError::InvalidEnd(other.to_string())),
            };
            let kind = match kind {
                "open" => ArrowKind::Open,
                "closed" => ArrowKind::Closed,
                other => return Err(ArrowSpecError::InvalidKind(other.to_string())),
            };
            Ok(Some(Self {
                angle,
                length,
                end,
                kind,
            }))
        }

        #[inline]
        pub fn on_first_end(&self) -> bool {
            matches!(self.end, ArrowEnd::First | ArrowEnd::Both)
        }

        #[inline]
        pub fn on_last_end(&self) -> bool {
            matches!(self.end, ArrowEnd::Last | ArrowEnd::Both)
        }

        /// 生成箭头三点路径：翼点、尖端、翼点（世界坐标）。
        /// `length_world` 为已换算到世界单位的箭头长度。
        pub fn wing_path(
            &self,
            polar_angle: f64,
            tip: Point2,
            length_world: f64,
            scaling_factor: f64,
        ) -> [Point2; 3] {
            let reach = length_world * scaling_factor;
            let wing = |offset: f64| {
                Point2::new(
                    tip.x() - reach * (polar_angle + offset).cos(),
                    tip.y() - reach * (polar_angle + offset).sin(),
                )
            };
            [wing(-self.angle), tip, wing(self.angle)]
        }
    }

    /// 图表元素的样式组件：填充/描边颜色、线宽、虚线模式以及
    /// 随缩放变化的尺寸与透明度系数。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ChartElementComponent {
        pub fill_color: Option<Color>,
        pub stroke_color: Option<Color>,
        /// 屏幕像素线宽；点实体允许为 NaN，表示无描边。
        pub stroke_width: f64,
        pub line_dash: Option<Vec<f64>>,
        pub scaling_size_factor: f64,
        pub scaling_alpha_value: f64,
        pub arrow_spec: Option<ArrowSpec>,
    }

    impl Default for ChartElementComponent {
        fn default() -> Self {
            Self {
                fill_color: None,
                stroke_color: None,
                stroke_width: f64::NAN,
                line_dash: None,
                scaling_size_factor: 1.0,
                scaling_alpha_value: 1.0,
                arrow_spec: None,
            }
        }
    }

    /// 点标记组件：整数形状代码（R pch 风格，0..=25）与直径。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct PointShapeComponent {
        pub shape: i32,
        pub size: f64,
    }

    /// 字体描述。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Font {
        pub size: f64,
        pub family: String,
    }

    impl Font {
        pub fn new(size: f64, family: impl Into<String>) -> Self {
            Self {
                size,
                family: family.into(),
            }
        }
    }

    /// 文本水平对齐方式。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TextAlign {
        Start,
        Center,
        End,
    }

    /// 多行文本组件，含旋转角与可选标签边框。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TextSpecComponent {
        pub lines: Vec<String>,
        pub font: Font,
        pub text_align: TextAlign,
        /// 旋转角（弧度）。
        pub angle: f64,
        /// 水平对齐比例：0 左对齐，1 右对齐，其余居中。
        pub hjust: f64,
        /// 垂直对齐比例：1 顶端对齐，0 底端对齐，其余居中。
        pub vjust: f64,
        /// 整段文字的测量尺寸（屏幕单位）。
        pub text_size: Vector2,
        pub line_height: f64,
        pub draw_border: bool,
        /// 标签边框矩形，相对锚点的屏幕坐标。
        pub frame: Rect,
        /// 圆角半径与边框高度的比例。
        pub label_radius: f64,
        /// 边框线宽，0 表示不描边。
        pub label_size: f64,
        pub padding: f64,
    }

    /// 饼图/环形图组件。三个列表逐槽位对应，长度一致。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PieSpecComponent {
        /// 扇区半径（屏幕单位）。
        pub radius: f64,
        /// 每个扇区的稳定标识。
        pub indices: Vec<usize>,
        /// 每个扇区的角宽（弧度），总和为 2π。
        pub slice_angles: Vec<f64>,
        pub colors: Vec<Color>,
    }

    /// 分层序号组件：粗粒度层号与层内序号，决定绘制与命中顺序。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IndexComponent {
        pub layer_index: usize,
        pub index: usize,
    }

    /// 由带符号原始值推导扇区角宽：每片 `2π·|v|/Σ|v|`，保持输入顺序。
    /// 绝对值之和为零时按扇区数量均分，避免除零。
    pub fn slice_angles_from_values(values: &[f64]) -> Vec<f64> {
        let sum: f64 = values.iter().map(|value| value.abs()).sum();
        if sum == 0.0 {
            vec![TAU / values.len() as f64; values.len()]
        } else {
            values
                .iter()
                .map(|value| TAU * value.abs() / sum)
                .collect()
        }
    }

}

pub mod store {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::chart::{
        ChartElementComponent, Geometry, IndexComponent, OriginComponent, PieSpecComponent,
        PointShapeComponent, TextSpecComponent,
    };

    /// 实体标识，同时编码创建顺序：编号越小创建越早。
    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }

        #[inline]
        fn slot(self) -> usize {
            self.0 as usize
        }
    }

    /// 组件种类，封闭集合。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ComponentKind {
        Geometry,
        Origin,
        ChartElement,
        PointShape,
        TextSpec,
        PieSpec,
        Index,
    }

    /// 可附加到实体上的组件值。每个实体每种组件至多一个实例。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum Component {
        Geometry(Geometry),
        Origin(OriginComponent),
        ChartElement(ChartElementComponent),
        PointShape(PointShapeComponent),
        TextSpec(TextSpecComponent),
        PieSpec(PieSpecComponent),
        Index(IndexComponent),
    }

    impl Component {
        #[inline]
        pub fn kind(&self) -> ComponentKind {
            match self {
                Component::Geometry(_) => ComponentKind::Geometry,
                Component::Origin(_) => ComponentKind::Origin,
                Component::ChartElement(_) => ComponentKind::ChartElement,
                Component::PointShape(_) => ComponentKind::PointShape,
                Component::TextSpec(_) => ComponentKind::TextSpec,
                Component::PieSpec(_) => ComponentKind::PieSpec,
                Component::Index(_) => ComponentKind::Index,
            }
        }
    }

    #[derive(Debug, Error)]
    pub enum StoreError {
        #[error("实体 {entity} 缺少组件 {kind:?}")]
        MissingComponent { entity: u64, kind: ComponentKind },
        #[error("实体 {0} 不存在")]
        UnknownEntity(u64),
    }

    /// 实体存储：按组件种类分列的类型化表，实体号即表下标。
    /// 单线程使用；重新配置时整体 [`EntityStore::clear`] 后重建。
    #[derive(Debug, Default, Clone)]
    pub struct EntityStore {
        names: Vec<String>,
        geometry: Vec<Option<Geometry>>,
        origin: Vec<Option<OriginComponent>>,
        chart_element: Vec<Option<ChartElementComponent>>,
        point_shape: Vec<Option<PointShapeComponent>>,
        text_spec: Vec<Option<TextSpecComponent>>,
        pie_spec: Vec<Option<PieSpecComponent>>,
        index: Vec<Option<IndexComponent>>,
    }

    impl EntityStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// 创建新实体，返回按创建顺序递增的标识。
        pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
            let id = EntityId::new(self.names.len() as u64);
            self.names.push(name.into());
            self.geometry.push(None);
            self.origin.push(None);
            self.chart_element.push(None);
            self.point_shape.push(None);
            self.text_spec.push(None);
            self.pie_spec.push(None);
            self.index.push(None);
            id
        }

        /// 附加组件；同种组件已存在时整体替换（幂等）。
        pub fn attach(&mut self, id: EntityId, component: Component) -> Result<(), StoreError> {
            let slot = id.slot();
            if slot >= self.names.len() {
                return Err(StoreError::UnknownEntity(id.get()));
            }
            match component {
                Component::Geometry(value) => self.geometry[slot] = Some(value),
                Component::Origin(value) => self.origin[slot] = Some(value),
                Component::ChartElement(value) => self.chart_element[slot] = Some(value),
                Component::PointShape(value) => self.point_shape[slot] = Some(value),
                Component::TextSpec(value) => self.text_spec[slot] = Some(value),
                Component::PieSpec(value) => self.pie_spec[slot] = Some(value),
                Component::Index(value) => self.index[slot] = Some(value),
            }
            Ok(())
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.names.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.names.is_empty()
        }

        #[inline]
        pub fn name(&self, id: EntityId) -> Option<&str> {
            self.names.get(id.slot()).map(String::as_str)
        }

        /// 清空全部实体与组件。会话重建的唯一入口，不支持增量修补。
        pub fn clear(&mut self) {
            self.names.clear();
            self.geometry.clear();
            self.origin.clear();
            self.chart_element.clear();
            self.point_shape.clear();
            self.text_spec.clear();
            self.pie_spec.clear();
            self.index.clear();
        }

        #[inline]
        pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
            let slot = id.slot();
            match kind {
                ComponentKind::Geometry => self.geometry.get(slot).is_some_and(Option::is_some),
                ComponentKind::Origin => self.origin.get(slot).is_some_and(Option::is_some),
                ComponentKind::ChartElement => {
                    self.chart_element.get(slot).is_some_and(Option::is_some)
                }
                ComponentKind::PointShape => {
                    self.point_shape.get(slot).is_some_and(Option::is_some)
                }
                ComponentKind::TextSpec => self.text_spec.get(slot).is_some_and(Option::is_some),
                ComponentKind::PieSpec => self.pie_spec.get(slot).is_some_and(Option::is_some),
                ComponentKind::Index => self.index.get(slot).is_some_and(Option::is_some),
            }
        }

        /// 以创建顺序遍历全部实体。
        pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
            (0..self.names.len() as u64).map(EntityId::new)
        }

        /// 查询同时携带所有给定组件的实体，顺序即创建顺序。
        /// 该顺序在层号相同的绘制/命中判定中作为兜底排序。
        pub fn query<'a>(
            &'a self,
            kinds: &'a [ComponentKind],
        ) -> impl Iterator<Item = EntityId> + 'a {
            self.entities()
                .filter(move |id| kinds.iter().all(|kind| self.has(*id, *kind)))
        }

        pub fn geometry(&self, id: EntityId) -> Result<&Geometry, StoreError> {
            self.try_geometry(id).ok_or(StoreError::MissingComponent {
                entity: id.get(),
                kind: ComponentKind::Geometry,
            })
        }

        #[inline]
        pub fn try_geometry(&self, id: EntityId) -> Option<&Geometry> {
            self.geometry.get(id.slot()).and_then(Option::as_ref)
        }

        pub fn origin(&self, id: EntityId) -> Result<&OriginComponent, StoreError> {
            self.try_origin(id).ok_or(StoreError::MissingComponent {
                entity: id.get(),
                kind: ComponentKind::Origin,
            })
        }

        #[inline]
        pub fn try_origin(&self, id: EntityId) -> Option<&OriginComponent> {
            self.origin.get(id.slot()).and_then(Option::as_ref)
        }

        pub fn chart_element(&self, id: EntityId) -> Result<&ChartElementComponent, StoreError> {
            self.try_chart_element(id)
                .ok_or(StoreError::MissingComponent {
                    entity: id.get(),
                    kind: ComponentKind::ChartElement,
                })
        }

        #[inline]
        pub fn try_chart_element(&self, id: EntityId) -> Option<&ChartElementComponent> {
            self.chart_element.get(id.slot()).and_then(Option::as_ref)
        }

        pub fn point_shape(&self, id: EntityId) -> Result<&PointShapeComponent, StoreError> {
            self.try_point_shape(id)
                .ok_or(StoreError::MissingComponent {
                    entity: id.get(),
                    kind: ComponentKind::PointShape,
                })
        }

        #[inline]
        pub fn try_point_shape(&self, id: EntityId) -> Option<&PointShapeComponent> {
            self.point_shape.get(id.slot()).and_then(Option::as_ref)
        }

        pub fn text_spec(&self, id: EntityId) -> Result<&TextSpecComponent, StoreError> {
            self.try_text_spec(id).ok_or(StoreError::MissingComponent {
                entity: id.get(),
                kind: ComponentKind::TextSpec,
            })
        }

        #[inline]
        pub fn try_text_spec(&self, id: EntityId) -> Option<&TextSpecComponent> {
            self.text_spec.get(id.slot()).and_then(Option::as_ref)
        }

        pub fn pie_spec(&self, id: EntityId) -> Result<&PieSpecComponent, StoreError> {
            self.try_pie_spec(id).ok_or(StoreError::MissingComponent {
                entity: id.get(),
                kind: ComponentKind::PieSpec,
            })
        }

        #[inline]
        pub fn try_pie_spec(&self, id: EntityId) -> Option<&PieSpecComponent> {
            self.pie_spec.get(id.slot()).and_then(Option::as_ref)
        }

        pub fn index(&self, id: EntityId) -> Result<&IndexComponent, StoreError> {
            self.try_index(id).ok_or(StoreError::MissingComponent {
                entity: id.get(),
                kind: ComponentKind::Index,
            })
        }

        #[inline]
        pub fn try_index(&self, id: EntityId) -> Option<&IndexComponent> {
            self.index.get(id.slot()).and_then(Option::as_ref)
        }
    }

}
