pub mod collision;
pub mod opening;
pub mod plan;
pub mod room;

pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 几何判定使用的容差，主要用于点是否落在多边形边上。
    pub const GEOMETRY_EPSILON: f64 = 1e-9;

    /// 二维点，内部以 `glam::DVec2` 表示。坐标系为房间局部坐标，Y 轴向下。
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
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
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

    /// 二维向量。用于拖拽偏移、分离轴与门的开启方向。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
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
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn dot(self, other: Vector2) -> f64 {
            self.0.dot(other.0)
        }

        /// 逆时针垂直向量 `(-y, x)`。
        #[inline]
        pub fn perp(self) -> Vector2 {
            Self(self.0.perp())
        }

        /// 单位化；零长度（退化边）返回 `None`。
        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON || !len.is_finite() {
                None
            } else {
                Some(Self(self.0 / len))
            }
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

    /// 轴对齐包围盒。旋转矩形先用它做粗筛，再走分离轴判定。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn at(point: Point2) -> Self {
            Self {
                min: point,
                max: point,
            }
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            self.min = Point2::from_vec(self.min.as_vec2().min(point.as_vec2()));
            self.max = Point2::from_vec(self.max.as_vec2().max(point.as_vec2()));
        }

        /// 在某一坐标轴上严格分开。仅接触不算分开。
        pub fn is_disjoint(&self, other: &Bounds2D) -> bool {
            self.max.x() < other.min.x()
                || other.max.x() < self.min.x()
                || self.max.y() < other.min.y()
                || other.max.y() < self.min.y()
        }

        /// 是否落在 `[0, width] × [0, height]` 内，边界闭合。
        pub fn within(&self, width: f64, height: f64) -> bool {
            self.min.x() >= 0.0 && self.min.y() >= 0.0 && self.max.x() <= width && self.max.y() <= height
        }
    }

    /// 轴对齐矩形（左上角 + 尺寸），门窗的占位总是这种形式。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Rect {
        pub x: f64,
        pub y: f64,
        pub width: f64,
        pub height: f64,
    }

    impl Rect {
        #[inline]
        pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
            Self {
                x,
                y,
                width,
                height,
            }
        }

        #[inline]
        pub fn right(&self) -> f64 {
            self.x + self.width
        }

        #[inline]
        pub fn bottom(&self) -> f64 {
            self.y + self.height
        }

        /// 闭区间包含判定，四条边上的点都算在内。
        #[inline]
        pub fn contains(&self, point: Point2) -> bool {
            point.x() >= self.x
                && point.x() <= self.right()
                && point.y() >= self.y
                && point.y() <= self.bottom()
        }
    }

    /// 把任意角度归一化到 `[0, 360)`。
    pub fn normalize_degrees(degrees: f64) -> f64 {
        let mut wrapped = degrees % 360.0;
        if wrapped < 0.0 {
            wrapped += 360.0;
        }
        if wrapped >= 360.0 || wrapped == 0.0 {
            // 吸收 -0.0 以及 -1e-14 + 360 这类回绕
            0.0
        } else {
            wrapped
        }
    }

    /// 返回旋转角对应的 `(cos, sin)`。
    ///
    /// 四分之一圈的整数倍直接使用精确值：贴墙的家具旋转 90° 后角点若带上
    /// `1e-15` 级别的误差，会被边界检查误判为出界。
    pub fn rotation_basis(degrees: f64) -> (f64, f64) {
        let normalized = normalize_degrees(degrees);
        if normalized == 0.0 {
            (1.0, 0.0)
        } else if normalized == 90.0 {
            (0.0, 1.0)
        } else if normalized == 180.0 {
            (-1.0, 0.0)
        } else if normalized == 270.0 {
            (0.0, -1.0)
        } else {
            let radians = normalized.to_radians();
            (radians.cos(), radians.sin())
        }
    }

    /// 已放置的矩形：`(x, y)` 为未旋转时的左上角，旋转绕自身中心进行。
    ///
    /// 角度为正时在屏幕上（Y 轴向下）表现为顺时针旋转。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct PlacedRect {
        pub x: f64,
        pub y: f64,
        pub width: f64,
        pub height: f64,
        #[serde(default)]
        pub rotation: f64,
    }

    impl PlacedRect {
        #[inline]
        pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
            Self {
                x,
                y,
                width,
                height,
                rotation: 0.0,
            }
        }

        #[inline]
        pub fn with_rotation(mut self, degrees: f64) -> Self {
            self.rotation = degrees;
            self
        }

        #[inline]
        pub fn origin(&self) -> Point2 {
            Point2::new(self.x, self.y)
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
        }

        /// 宽或高非正、或任意分量不是有限数时视为退化矩形。
        pub fn is_degenerate(&self) -> bool {
            let finite = self.x.is_finite()
                && self.y.is_finite()
                && self.width.is_finite()
                && self.height.is_finite()
                && self.rotation.is_finite();
            !(finite && self.width > 0.0 && self.height > 0.0)
        }

        /// 旋转角模 360 为 0 时可以走轴对齐快速路径。
        #[inline]
        pub fn is_unrotated(&self) -> bool {
            normalize_degrees(self.rotation) == 0.0
        }

        /// 返回旋转后的四个角点，顺序固定为左上、右上、右下、左下（未旋转时的命名）。
        /// 分离轴测试依赖这个环形顺序构造边。
        pub fn corners(&self) -> [Point2; 4] {
            let center = self.center();
            let (cos, sin) = rotation_basis(self.rotation);
            let half_w = self.width / 2.0;
            let half_h = self.height / 2.0;
            const SIGNS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

            SIGNS.map(|(sx, sy)| {
                let lx = sx * half_w;
                let ly = sy * half_h;
                Point2::new(
                    center.x() + lx * cos - ly * sin,
                    center.y() + lx * sin + ly * cos,
                )
            })
        }

        /// 点包含判定，边界闭合。未旋转时直接比较坐标，否则对旋转后的角点做射线法。
        pub fn contains(&self, point: Point2) -> bool {
            if self.is_unrotated() {
                return point.x() >= self.x
                    && point.x() <= self.x + self.width
                    && point.y() >= self.y
                    && point.y() <= self.y + self.height;
            }
            point_in_polygon(point, &self.corners())
        }

        /// 平移到新的左上角，尺寸与角度不变。
        #[inline]
        pub fn moved_to(&self, origin: Point2) -> Self {
            Self {
                x: origin.x(),
                y: origin.y(),
                ..*self
            }
        }

        /// 在当前角度基础上旋转 `delta` 度，并归一化到 `[0, 360)`。
        #[inline]
        pub fn rotated_by(&self, delta: f64) -> Self {
            Self {
                rotation: normalize_degrees(self.rotation + delta),
                ..*self
            }
        }

        pub fn aabb(&self) -> Bounds2D {
            let [first, rest @ ..] = self.corners();
            let mut bounds = Bounds2D::at(first);
            for corner in rest {
                bounds.include_point(corner);
            }
            bounds
        }
    }

    /// 偶奇规则的射线法点在多边形内判定。落在边上（容差内）的点视为在内，
    /// 与轴对齐快速路径的闭区间语义保持一致。
    pub fn point_in_polygon(point: Point2, polygon: &[Point2]) -> bool {
        if polygon.len() < 3 {
            return false;
        }
        if on_boundary(point, polygon) {
            return true;
        }

        let (px, py) = (point.x(), point.y());
        let mut inside = false;
        let mut j = polygon.len() - 1;
        for i in 0..polygon.len() {
            let (xi, yi) = (polygon[i].x(), polygon[i].y());
            let (xj, yj) = (polygon[j].x(), polygon[j].y());
            if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn on_boundary(point: Point2, polygon: &[Point2]) -> bool {
        let mut j = polygon.len() - 1;
        for i in 0..polygon.len() {
            if distance_to_segment(point, polygon[j], polygon[i]) <= GEOMETRY_EPSILON {
                return true;
            }
            j = i;
        }
        false
    }

    fn distance_to_segment(point: Point2, start: Point2, end: Point2) -> f64 {
        let edge = start.vector_to(end);
        let len_sq = edge.length_squared();
        if len_sq <= f64::EPSILON {
            return point.distance(start);
        }
        let t = (start.vector_to(point).dot(edge) / len_sq).clamp(0.0, 1.0);
        let closest = Point2::from_vec(start.as_vec2() + edge.as_vec2() * t);
        point.distance(closest)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn assert_point_eq(actual: Point2, expected: (f64, f64)) {
            assert!(
                (actual.x() - expected.0).abs() < 1e-9 && (actual.y() - expected.1).abs() < 1e-9,
                "expected {expected:?}, got ({}, {})",
                actual.x(),
                actual.y()
            );
        }

        #[test]
        fn unrotated_corners_follow_cyclic_order() {
            let rect = PlacedRect::new(10.0, 20.0, 100.0, 50.0);
            let corners = rect.corners();
            assert_point_eq(corners[0], (10.0, 20.0));
            assert_point_eq(corners[1], (110.0, 20.0));
            assert_point_eq(corners[2], (110.0, 70.0));
            assert_point_eq(corners[3], (10.0, 70.0));
        }

        #[test]
        fn positive_rotation_turns_clockwise_on_screen() {
            // 100x50 的矩形中心在 (50, 25)，顺时针 90° 后左上角转到右上方。
            let rect = PlacedRect::new(0.0, 0.0, 100.0, 50.0).with_rotation(90.0);
            let corners = rect.corners();
            assert_point_eq(corners[0], (75.0, -25.0));
            assert_point_eq(corners[1], (75.0, 75.0));
            assert_point_eq(corners[2], (25.0, 75.0));
            assert_point_eq(corners[3], (25.0, -25.0));
        }

        #[test]
        fn quarter_turn_basis_is_exact() {
            assert_eq!(rotation_basis(90.0), (0.0, 1.0));
            assert_eq!(rotation_basis(-90.0), (0.0, -1.0));
            assert_eq!(rotation_basis(540.0), (-1.0, 0.0));
            let (cos, sin) = rotation_basis(45.0);
            assert!((cos - sin).abs() < 1e-12);
        }

        #[test]
        fn normalize_degrees_wraps_into_range() {
            assert_eq!(normalize_degrees(0.0), 0.0);
            assert_eq!(normalize_degrees(360.0), 0.0);
            assert_eq!(normalize_degrees(-90.0), 270.0);
            assert_eq!(normalize_degrees(450.0), 90.0);
            assert_eq!(normalize_degrees(-360.0), 0.0);
            assert!(normalize_degrees(-360.0).is_sign_positive());
            assert_eq!(normalize_degrees(-1e-14), 0.0);
        }

        #[test]
        fn four_quarter_turns_restore_square() {
            let start = PlacedRect::new(40.0, 60.0, 80.0, 80.0);
            let mut rect = start;
            for _ in 0..4 {
                rect = rect.rotated_by(90.0);
            }
            assert_eq!(rect.rotation, 0.0);
            for (a, b) in rect.corners().iter().zip(start.corners().iter()) {
                assert_point_eq(*a, (b.x(), b.y()));
            }
        }

        #[test]
        fn fast_path_agrees_with_polygon_path_when_unrotated() {
            let rects = [
                PlacedRect::new(10.0, 20.0, 100.0, 50.0),
                PlacedRect::new(0.0, 0.0, 30.0, 30.0),
                PlacedRect::new(12.5, 7.5, 40.0, 15.0).with_rotation(360.0),
            ];
            for rect in rects {
                let mut y = rect.y - 10.0;
                while y <= rect.y + rect.height + 10.0 {
                    let mut x = rect.x - 10.0;
                    while x <= rect.x + rect.width + 10.0 {
                        let point = Point2::new(x, y);
                        assert_eq!(
                            rect.contains(point),
                            point_in_polygon(point, &rect.corners()),
                            "paths disagree at ({x}, {y}) for {rect:?}"
                        );
                        x += 2.5;
                    }
                    y += 2.5;
                }
            }
        }

        #[test]
        fn rotated_contains_uses_rotated_footprint() {
            let rect = PlacedRect::new(0.0, 0.0, 100.0, 20.0).with_rotation(90.0);
            // 旋转后占据 x ∈ [40, 60], y ∈ [-40, 60]
            assert!(rect.contains(Point2::new(50.0, -30.0)));
            assert!(rect.contains(Point2::new(60.0, 0.0)));
            assert!(!rect.contains(Point2::new(90.0, 10.0)));
            assert!(!rect.contains(Point2::new(5.0, 5.0)));

            let diamond = PlacedRect::new(0.0, 0.0, 20.0, 20.0).with_rotation(45.0);
            assert!(diamond.contains(Point2::new(10.0, 10.0)));
            assert!(!diamond.contains(Point2::new(0.5, 0.5)));
        }

        #[test]
        fn degenerate_detection_covers_zero_and_nan() {
            assert!(PlacedRect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
            assert!(PlacedRect::new(0.0, 0.0, 10.0, -1.0).is_degenerate());
            assert!(PlacedRect::new(f64::NAN, 0.0, 10.0, 10.0).is_degenerate());
            assert!(!PlacedRect::new(0.0, 0.0, 10.0, 10.0).is_degenerate());
        }

        #[test]
        fn aabb_of_rotated_rect_spans_corners() {
            let rect = PlacedRect::new(0.0, 0.0, 100.0, 50.0).with_rotation(90.0);
            let bounds = rect.aabb();
            assert_point_eq(bounds.min(), (25.0, -25.0));
            assert_point_eq(bounds.max(), (75.0, 75.0));
            assert!(!bounds.within(400.0, 300.0));
            assert!(rect.moved_to(Point2::new(0.0, 25.0)).aabb().within(100.0, 100.0));

            let far = PlacedRect::new(200.0, 0.0, 10.0, 10.0).aabb();
            assert!(bounds.is_disjoint(&far));
            assert!(!bounds.is_disjoint(&Bounds2D::at(Point2::new(75.0, 75.0))));
        }
    }
}
