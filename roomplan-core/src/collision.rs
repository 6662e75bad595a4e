use crate::geometry::{PlacedRect, Point2, Vector2};
use crate::opening::Opening;
use crate::room::{Furniture, ObjectId, Room};

/// 校验结果，附带失败原因以便日志与提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementCheck {
    Legal,
    Degenerate,
    OutOfBounds,
    Collides(ObjectId),
}

impl PlacementCheck {
    #[inline]
    pub fn is_legal(self) -> bool {
        matches!(self, PlacementCheck::Legal)
    }
}

fn project(corners: &[Point2; 4], axis: Vector2) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for corner in corners {
        let dot = corner.x() * axis.x() + corner.y() * axis.y();
        lo = lo.min(dot);
        hi = hi.max(dot);
    }
    (lo, hi)
}

/// 每条边的单位法向量。四条都计算，零长度边返回 `None`。
fn edge_normals(corners: &[Point2; 4]) -> [Option<Vector2>; 4] {
    std::array::from_fn(|i| {
        let edge = corners[i].vector_to(corners[(i + 1) % 4]);
        edge.perp().normalize()
    })
}

/// 两个已放置矩形的内部是否重叠，满足对称性。
///
/// 两者都未旋转时直接比较坐标，仅共享一条边不算重叠；否则先用包围盒粗筛，
/// 再做分离轴判定。任一矩形退化（零面积或非有限值）时直接判为不碰撞。
pub fn overlap(a: &PlacedRect, b: &PlacedRect) -> bool {
    if a.is_degenerate() || b.is_degenerate() {
        return false;
    }

    if a.is_unrotated() && b.is_unrotated() {
        return !(a.x + a.width <= b.x
            || b.x + b.width <= a.x
            || a.y + a.height <= b.y
            || b.y + b.height <= a.y);
    }

    if a.aabb().is_disjoint(&b.aabb()) {
        return false;
    }

    let corners_a = a.corners();
    let corners_b = b.corners();
    let normals_a = edge_normals(&corners_a);
    let normals_b = edge_normals(&corners_b);

    for axis in normals_a.into_iter().chain(normals_b).flatten() {
        let (min_a, max_a) = project(&corners_a, axis);
        let (min_b, max_b) = project(&corners_b, axis);
        if max_a < min_b || max_b < min_a {
            return false;
        }
    }
    true
}

/// 矩形（含旋转）是否完整落在 `[0, width] × [0, height]` 内，边界闭合。
pub fn in_bounds(rect: &PlacedRect, width: f64, height: f64) -> bool {
    if rect.is_degenerate() {
        return false;
    }

    if rect.is_unrotated() {
        return rect.x >= 0.0
            && rect.y >= 0.0
            && rect.x + rect.width <= width
            && rect.y + rect.height <= height;
    }

    rect.aabb().within(width, height)
}

#[inline]
pub fn in_room_bounds(rect: &PlacedRect, room: &Room) -> bool {
    in_bounds(rect, room.width(), room.height())
}

/// 与房间内第一件重叠的家具（跳过 `exclude`）。
pub fn first_collision(rect: &PlacedRect, room: &Room, exclude: Option<ObjectId>) -> Option<ObjectId> {
    room.furniture()
        .iter()
        .filter(|f| Some(f.id) != exclude)
        .find(|f| overlap(rect, &f.rect))
        .map(|f| f.id)
}

#[inline]
pub fn has_collision(rect: &PlacedRect, room: &Room, exclude: Option<ObjectId>) -> bool {
    first_collision(rect, room, exclude).is_some()
}

pub fn check_rect(rect: &PlacedRect, room: &Room, exclude: Option<ObjectId>) -> PlacementCheck {
    if rect.is_degenerate() {
        return PlacementCheck::Degenerate;
    }
    if !in_room_bounds(rect, room) {
        return PlacementCheck::OutOfBounds;
    }
    match first_collision(rect, room, exclude) {
        Some(other) => PlacementCheck::Collides(other),
        None => PlacementCheck::Legal,
    }
}

/// 家具放置的唯一合法性判定：在房间内且不与其他家具重叠。
#[inline]
pub fn is_valid_placement(furniture: &Furniture, room: &Room) -> bool {
    check_rect(&furniture.rect, room, Some(furniture.id)).is_legal()
}

/// 门窗只校验沿墙的一维范围，不与家具或其他门窗做碰撞检测。
#[inline]
pub fn opening_is_legal(opening: &Opening, room: &Room) -> bool {
    opening.accepts_position(opening.position, room.width(), room.height())
}
