use serde::{Deserialize, Serialize};

use crate::geometry::{Point2, Rect, Vector2};
use crate::room::ObjectId;

/// 门窗垂直于墙面的固定厚度。
pub const OPENING_THICKNESS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    Top,
    Bottom,
    Left,
    Right,
}

impl Wall {
    pub const ALL: [Wall; 4] = [Wall::Top, Wall::Bottom, Wall::Left, Wall::Right];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "top" => Some(Wall::Top),
            "bottom" => Some(Wall::Bottom),
            "left" => Some(Wall::Left),
            "right" => Some(Wall::Right),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Wall::Top => "top",
            Wall::Bottom => "bottom",
            Wall::Left => "left",
            Wall::Right => "right",
        }
    }

    /// 上下墙长度为房间宽度，左右墙长度为房间高度。
    #[inline]
    pub fn length(self, room_width: f64, room_height: f64) -> f64 {
        match self {
            Wall::Top | Wall::Bottom => room_width,
            Wall::Left | Wall::Right => room_height,
        }
    }

    /// 点在沿墙方向上的坐标，用于门窗拖拽。
    #[inline]
    pub fn along(self, point: Point2) -> f64 {
        match self {
            Wall::Top | Wall::Bottom => point.x(),
            Wall::Left | Wall::Right => point.y(),
        }
    }

    /// 指向房间内部的单位向量。
    pub fn inward(self) -> Vector2 {
        match self {
            Wall::Top => Vector2::new(0.0, 1.0),
            Wall::Bottom => Vector2::new(0.0, -1.0),
            Wall::Left => Vector2::new(1.0, 0.0),
            Wall::Right => Vector2::new(-1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningKind {
    Window,
    Door,
}

impl OpeningKind {
    pub fn label(self) -> &'static str {
        match self {
            OpeningKind::Window => "window",
            OpeningKind::Door => "door",
        }
    }
}

/// 门窗共用的一维模型：所在墙、距墙起点的偏移、沿墙宽度。占位矩形由此推导，不做存储。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: ObjectId,
    pub wall: Wall,
    pub position: f64,
    pub width: f64,
}

/// 门的开启示意，仅供渲染使用。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorSwing {
    pub hinge: Point2,
    pub direction: Vector2,
    pub radius: f64,
}

impl Opening {
    pub fn new(id: ObjectId, wall: Wall, position: f64, width: f64) -> Self {
        Self {
            id,
            wall,
            position,
            width,
        }
    }

    /// 映射到房间绝对坐标下的轴对齐矩形。
    pub fn bounds(&self, room_width: f64, room_height: f64) -> Rect {
        match self.wall {
            Wall::Top => Rect::new(self.position, 0.0, self.width, OPENING_THICKNESS),
            Wall::Bottom => Rect::new(
                self.position,
                room_height - OPENING_THICKNESS,
                self.width,
                OPENING_THICKNESS,
            ),
            Wall::Left => Rect::new(0.0, self.position, OPENING_THICKNESS, self.width),
            Wall::Right => Rect::new(
                room_width - OPENING_THICKNESS,
                self.position,
                OPENING_THICKNESS,
                self.width,
            ),
        }
    }

    #[inline]
    pub fn contains(&self, point: Point2, room_width: f64, room_height: f64) -> bool {
        self.bounds(room_width, room_height).contains(point)
    }

    #[inline]
    pub fn wall_length(&self, room_width: f64, room_height: f64) -> f64 {
        self.wall.length(room_width, room_height)
    }

    /// 判断本门窗移动到 `position` 后是否仍完整落在墙上。
    #[inline]
    pub fn accepts_position(&self, position: f64, room_width: f64, room_height: f64) -> bool {
        position_is_legal(position, self.width, self.wall_length(room_width, room_height))
    }

    pub fn swing(&self, room_width: f64, room_height: f64) -> DoorSwing {
        let hinge = match self.wall {
            Wall::Top => Point2::new(self.position, OPENING_THICKNESS),
            Wall::Bottom => Point2::new(self.position, room_height - OPENING_THICKNESS),
            Wall::Left => Point2::new(OPENING_THICKNESS, self.position),
            Wall::Right => Point2::new(room_width - OPENING_THICKNESS, self.position),
        };
        DoorSwing {
            hinge,
            direction: self.wall.inward(),
            radius: self.width,
        }
    }
}

/// `0 ≤ position ≤ wall_length − width`。非有限值一律不合法。
#[inline]
pub fn position_is_legal(position: f64, width: f64, wall_length: f64) -> bool {
    position >= 0.0 && position <= wall_length - width
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening(wall: Wall, position: f64, width: f64) -> Opening {
        Opening::new(ObjectId::new(1), wall, position, width)
    }

    #[test]
    fn bounds_follow_wall_table() {
        let (w, h) = (400.0, 300.0);
        assert_eq!(opening(Wall::Top, 50.0, 100.0).bounds(w, h), Rect::new(50.0, 0.0, 100.0, 8.0));
        assert_eq!(
            opening(Wall::Bottom, 50.0, 100.0).bounds(w, h),
            Rect::new(50.0, 292.0, 100.0, 8.0)
        );
        assert_eq!(opening(Wall::Left, 30.0, 60.0).bounds(w, h), Rect::new(0.0, 30.0, 8.0, 60.0));
        assert_eq!(
            opening(Wall::Right, 30.0, 60.0).bounds(w, h),
            Rect::new(392.0, 30.0, 8.0, 60.0)
        );
    }

    #[test]
    fn contains_is_inclusive() {
        let window = opening(Wall::Right, 30.0, 60.0);
        assert!(window.contains(Point2::new(392.0, 30.0), 400.0, 300.0));
        assert!(window.contains(Point2::new(400.0, 90.0), 400.0, 300.0));
        assert!(!window.contains(Point2::new(391.9, 50.0), 400.0, 300.0));
        assert!(!window.contains(Point2::new(395.0, 90.1), 400.0, 300.0));
    }

    #[test]
    fn position_legality_uses_wall_length() {
        let top = opening(Wall::Top, 0.0, 100.0);
        assert!(top.accepts_position(0.0, 400.0, 300.0));
        assert!(top.accepts_position(300.0, 400.0, 300.0));
        assert!(!top.accepts_position(350.0, 400.0, 300.0));
        assert!(!top.accepts_position(-1.0, 400.0, 300.0));
        assert!(!top.accepts_position(f64::NAN, 400.0, 300.0));

        let left = opening(Wall::Left, 0.0, 100.0);
        assert!(left.accepts_position(200.0, 400.0, 300.0));
        assert!(!left.accepts_position(250.0, 400.0, 300.0));
    }

    #[test]
    fn door_swing_points_into_room() {
        let door = opening(Wall::Bottom, 40.0, 70.0);
        let swing = door.swing(400.0, 300.0);
        assert_eq!(swing.hinge, Point2::new(40.0, 292.0));
        assert_eq!(swing.direction, Vector2::new(0.0, -1.0));
        assert_eq!(swing.radius, 70.0);
        assert_eq!(Wall::Left.inward(), Vector2::new(1.0, 0.0));
    }

    #[test]
    fn wall_names_round_trip() {
        for wall in Wall::ALL {
            assert_eq!(Wall::from_name(wall.name()), Some(wall));
        }
        assert_eq!(Wall::from_name("TOP"), Some(Wall::Top));
        assert_eq!(Wall::from_name("ceiling"), None);
    }
}
