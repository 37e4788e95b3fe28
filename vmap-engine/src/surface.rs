use vmap_core::chart::{Font, TextAlign};
use vmap_core::color::Color;
use vmap_core::geometry::Point2;

/// 线段连接样式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    Bevel,
    Miter,
    Round,
}

/// 2D 绘制表面抽象。渲染器只通过该接口输出绘制指令，
/// 具体画布（浏览器 Canvas、AWT 等）由宿主提供。
/// 路径坐标均为渲染器施加变换后的屏幕坐标。
pub trait DrawingSurface {
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point2);
    fn line_to(&mut self, point: Point2);
    fn bezier_curve_to(&mut self, control1: Point2, control2: Point2, to: Point2);
    fn close_path(&mut self);

    fn set_fill_color(&mut self, color: Option<Color>);
    fn set_stroke_color(&mut self, color: Option<Color>);
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, pattern: &[f64]);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_font(&mut self, font: &Font);
    fn set_text_align(&mut self, align: TextAlign);

    fn fill(&mut self);
    fn stroke(&mut self);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: Point2);
    fn scale(&mut self, factor: f64);
    fn rotate(&mut self, angle: f64);
}

/// 录制下来的单条绘制指令。
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    BeginPath,
    MoveTo(Point2),
    LineTo(Point2),
    BezierCurveTo {
        control1: Point2,
        control2: Point2,
        to: Point2,
    },
    ClosePath,
    SetFillColor(Option<Color>),
    SetStrokeColor(Option<Color>),
    SetLineWidth(f64),
    SetLineDash(Vec<f64>),
    SetLineJoin(LineJoin),
    SetFont(Font),
    SetTextAlign(TextAlign),
    Fill,
    Stroke,
    FillText {
        text: String,
        x: f64,
        y: f64,
    },
    Save,
    Restore,
    Translate(Point2),
    Scale(f64),
    Rotate(f64),
}

/// 录制型绘制表面：把全部指令按顺序存入向量，
/// 供测试断言与 CLI 演示统计使用。
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<SurfaceOp>,
}

/// 一帧指令的粗粒度统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub path_segments: usize,
    pub fills: usize,
    pub strokes: usize,
    pub texts: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn stats(&self) -> SurfaceStats {
        let mut stats = SurfaceStats::default();
        for op in &self.ops {
            match op {
                SurfaceOp::MoveTo(_) | SurfaceOp::LineTo(_) | SurfaceOp::BezierCurveTo { .. } => {
                    stats.path_segments += 1;
                }
                SurfaceOp::Fill => stats.fills += 1,
                SurfaceOp::Stroke => stats.strokes += 1,
                SurfaceOp::FillText { .. } => stats.texts += 1,
                _ => {}
            }
        }
        stats
    }
}

impl DrawingSurface for RecordingSurface {
    fn begin_path(&mut self) {
        self.ops.push(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, point: Point2) {
        self.ops.push(SurfaceOp::MoveTo(point));
    }

    fn line_to(&mut self, point: Point2) {
        self.ops.push(SurfaceOp::LineTo(point));
    }

    fn bezier_curve_to(&mut self, control1: Point2, control2: Point2, to: Point2) {
        self.ops.push(SurfaceOp::BezierCurveTo {
            control1,
            control2,
            to,
        });
    }

    fn close_path(&mut self) {
        self.ops.push(SurfaceOp::ClosePath);
    }

    fn set_fill_color(&mut self, color: Option<Color>) {
        self.ops.push(SurfaceOp::SetFillColor(color));
    }

    fn set_stroke_color(&mut self, color: Option<Color>) {
        self.ops.push(SurfaceOp::SetStrokeColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(SurfaceOp::SetLineWidth(width));
    }

    fn set_line_dash(&mut self, pattern: &[f64]) {
        self.ops.push(SurfaceOp::SetLineDash(pattern.to_vec()));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ops.push(SurfaceOp::SetLineJoin(join));
    }

    fn set_font(&mut self, font: &Font) {
        self.ops.push(SurfaceOp::SetFont(font.clone()));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ops.push(SurfaceOp::SetTextAlign(align));
    }

    fn fill(&mut self) {
        self.ops.push(SurfaceOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(SurfaceOp::Stroke);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(SurfaceOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn save(&mut self) {
        self.ops.push(SurfaceOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(SurfaceOp::Restore);
    }

    fn translate(&mut self, offset: Point2) {
        self.ops.push(SurfaceOp::Translate(offset));
    }

    fn scale(&mut self, factor: f64) {
        self.ops.push(SurfaceOp::Scale(factor));
    }

    fn rotate(&mut self, angle: f64) {
        self.ops.push(SurfaceOp::Rotate(angle));
    }
}
