//! 运动线几何
//!
//! 相机画面中吊篮沿一条近似直线运动。沿线比例只由 x 坐标决定，
//! 纵向偏差是边界框 y 与该 x 处直线 y 的差值。

use crate::VisionError;

/// 像素坐标点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 跟踪器输出的边界框（像素，左上角 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 参考点（左上角）
    pub fn reference_point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// 吊篮的运动线
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionLine {
    start: Point,
    end: Point,
    slope: f64,
    x_range: f64,
}

impl MotionLine {
    /// 创建运动线
    ///
    /// `start` 对应比例 0.0，`end` 对应比例 1.0。两端 x 相同时返回错误。
    pub fn new(start: Point, end: Point) -> Result<Self, VisionError> {
        let x_range = end.x - start.x;
        if x_range == 0.0 || !x_range.is_finite() {
            return Err(VisionError::DegenerateMotionLine { x: start.x });
        }
        Ok(Self {
            start,
            end,
            slope: (end.y - start.y) / x_range,
            x_range,
        })
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// 点在运动线上的比例（可能超出 [0, 1]）
    pub fn fraction_of(&self, point: Point) -> f64 {
        (point.x - self.start.x) / self.x_range
    }

    /// x 处直线上的 y
    pub fn y_at(&self, x: f64) -> f64 {
        self.start.y + self.slope * (x - self.start.x)
    }

    /// 点相对直线的纵向偏差（正值表示在线下方，像素坐标 y 向下）
    pub fn deviation_of(&self, point: Point) -> f64 {
        point.y - self.y_at(point.x)
    }

    /// 比例对应的线上点
    pub fn point_at(&self, fraction: f64) -> Point {
        let x = self.start.x + fraction * self.x_range;
        Point::new(x, self.y_at(x))
    }
}

impl Default for MotionLine {
    /// 默认相机标定：(500, 50) → (25, 100)
    fn default() -> Self {
        let start = Point::new(500.0, 50.0);
        let end = Point::new(25.0, 100.0);
        Self {
            start,
            end,
            slope: (end.y - start.y) / (end.x - start.x),
            x_range: end.x - start.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_line_endpoints() {
        let line = MotionLine::default();
        assert_eq!(line.fraction_of(Point::new(500.0, 50.0)), 0.0);
        assert_eq!(line.fraction_of(Point::new(25.0, 100.0)), 1.0);
        assert!((line.fraction_of(Point::new(262.5, 75.0)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_default_matches_new() {
        let built = MotionLine::new(Point::new(500.0, 50.0), Point::new(25.0, 100.0)).unwrap();
        assert_eq!(built, MotionLine::default());
    }

    #[test]
    fn test_y_at_and_deviation() {
        let line = MotionLine::default();
        assert!((line.y_at(262.5) - 75.0).abs() < 1e-12);
        assert!((line.deviation_of(Point::new(262.5, 155.0)) - 80.0).abs() < 1e-12);
        assert!((line.deviation_of(Point::new(262.5, 70.0)) + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_at_roundtrip() {
        let line = MotionLine::default();
        let p = line.point_at(0.3);
        assert!((line.fraction_of(p) - 0.3).abs() < 1e-12);
        assert!(line.deviation_of(p).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_line_rejected() {
        let err = MotionLine::new(Point::new(10.0, 0.0), Point::new(10.0, 100.0)).unwrap_err();
        assert!(matches!(err, VisionError::DegenerateMotionLine { x } if x == 10.0));
    }
}
