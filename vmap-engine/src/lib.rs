pub mod render;
pub mod scene;
pub mod searching;
pub mod surface;

pub mod errors {
    use thiserror::Error;
    use vmap_core::store::StoreError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error(transparent)]
        Store(#[from] StoreError),
        #[error("未知的点形状代码 {0}")]
        UnknownPointShape(i32),
        #[error("实体 {0} 的几何类型与渲染器不匹配")]
        GeometryMismatch(u64),
        #[error("实体 {0} 缺少描边颜色，无法绘制路径")]
        MissingStrokeColor(u64),
    }
}

pub mod viewport {
    use vmap_core::geometry::{Point2, Vector2};

    const DEFAULT_ZOOM: f64 = 1.0;
    const MIN_ZOOM: f64 = 0.01;
    const MAX_ZOOM: f64 = 1_000.0;

    /// 视口状态（世界坐标中心点与线性缩放系数）。
    #[derive(Debug, Clone, Copy)]
    pub struct ViewportState {
        pub center: Point2,
        pub zoom: f64,
    }

    impl ViewportState {
        #[inline]
        fn clamp_zoom(value: f64) -> f64 {
            value.clamp(MIN_ZOOM, MAX_ZOOM)
        }
    }

    impl Default for ViewportState {
        fn default() -> Self {
            Self {
                center: Point2::new(0.0, 0.0),
                zoom: DEFAULT_ZOOM,
            }
        }
    }

    /// 视口：状态加客户端（屏幕）尺寸，负责派生每帧的渲染辅助器。
    #[derive(Debug, Clone, Copy)]
    pub struct Viewport {
        state: ViewportState,
        client_size: Vector2,
    }

    impl Viewport {
        pub fn new(client_size: Vector2) -> Self {
            Self {
                state: ViewportState::default(),
                client_size,
            }
        }

        #[inline]
        pub fn state(&self) -> ViewportState {
            self.state
        }

        #[inline]
        pub fn client_size(&self) -> Vector2 {
            self.client_size
        }

        #[inline]
        pub fn reset(&mut self) {
            self.state = ViewportState::default();
        }

        #[inline]
        pub fn set_center(&mut self, center: Point2) {
            self.state.center = center;
        }

        /// 平移视口中心（世界坐标位移）。
        pub fn pan(&mut self, delta: Vector2) {
            self.state.center = self.state.center.translate(delta);
        }

        /// 设置缩放系数（自动限制在合法范围内）。
        pub fn set_zoom(&mut self, zoom: f64) {
            self.state.zoom = ViewportState::clamp_zoom(zoom);
        }

        /// 按乘法因子调整缩放。
        pub fn scale_zoom(&mut self, factor: f64) {
            let current = self.state.zoom;
            let target = if factor.is_finite() {
                current * factor
            } else {
                current
            };
            self.set_zoom(target);
        }

        /// 派生当前帧的渲染辅助器。一帧之内不可变；
        /// 缩放或平移变化会在下一帧得到新的实例。
        pub fn render_helper(&self) -> RenderHelper {
            let zoom = self.state.zoom;
            let half = self.client_size.scale(0.5 / zoom);
            let world_origin = Point2::new(
                self.state.center.x() - half.x(),
                self.state.center.y() - half.y(),
            );
            RenderHelper::new(world_origin, zoom)
        }
    }

    /// 单次渲染/定位过程的坐标变换上下文。值对象，可在整个过程内只读共享。
    #[derive(Debug, Clone, Copy)]
    pub struct RenderHelper {
        world_origin: Point2,
        zoom_factor: f64,
    }

    impl RenderHelper {
        pub fn new(world_origin: Point2, zoom_factor: f64) -> Self {
            Self {
                world_origin,
                zoom_factor,
            }
        }

        /// 世界单位到设备像素的线性比例。
        #[inline]
        pub fn zoom_factor(&self) -> f64 {
            self.zoom_factor
        }

        /// 世界坐标到屏幕坐标：先平移再缩放。
        #[inline]
        pub fn to_screen(&self, world: Point2) -> Point2 {
            Point2::from_vec((world.as_vec2() - self.world_origin.as_vec2()) * self.zoom_factor)
        }

        /// 屏幕标量换算回世界标量，用于箭头等与缩放无关的尺寸。
        #[inline]
        pub fn to_world(&self, screen_scalar: f64) -> f64 {
            screen_scalar / self.zoom_factor
        }
    }

}
