use roomplan_core::collision::{self, PlacementCheck};
use roomplan_core::geometry::{Point2, Vector2};
use roomplan_core::opening::OpeningKind;
use roomplan_core::room::{ObjectId, Room};
use tracing::{debug, warn};

use crate::errors::EngineError;

/// 每次键盘旋转的角度。
pub const ROTATION_STEP_DEGREES: f64 = 90.0;

/// 当前选中的对象。控制器按变体分派，而不是比较类型字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionTarget {
    Furniture(ObjectId),
    Window(ObjectId),
    Door(ObjectId),
}

impl SelectionTarget {
    #[inline]
    pub fn id(self) -> ObjectId {
        match self {
            SelectionTarget::Furniture(id)
            | SelectionTarget::Window(id)
            | SelectionTarget::Door(id) => id,
        }
    }

    pub fn opening_kind(self) -> Option<OpeningKind> {
        match self {
            SelectionTarget::Furniture(_) => None,
            SelectionTarget::Window(_) => Some(OpeningKind::Window),
            SelectionTarget::Door(_) => Some(OpeningKind::Door),
        }
    }

    fn opening(kind: OpeningKind, id: ObjectId) -> Self {
        match kind {
            OpeningKind::Window => SelectionTarget::Window(id),
            OpeningKind::Door => SelectionTarget::Door(id),
        }
    }

    /// 只有家具可以旋转。
    #[inline]
    pub fn is_rotatable(self) -> bool {
        matches!(self, SelectionTarget::Furniture(_))
    }

    pub fn label(self) -> &'static str {
        match self {
            SelectionTarget::Furniture(_) => "furniture",
            SelectionTarget::Window(_) => "window",
            SelectionTarget::Door(_) => "door",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    #[inline]
    pub fn degrees(self) -> f64 {
        match self {
            RotationDirection::Clockwise => ROTATION_STEP_DEGREES,
            RotationDirection::CounterClockwise => -ROTATION_STEP_DEGREES,
        }
    }
}

/// 拖拽开始时记录的指针偏移，以及最近一次通过校验的位置。
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Furniture {
        id: ObjectId,
        offset: Vector2,
        last_valid: Point2,
    },
    Opening {
        kind: OpeningKind,
        id: ObjectId,
        offset: f64,
        last_valid: f64,
    },
}

impl DragState {
    fn target(self) -> SelectionTarget {
        match self {
            DragState::Furniture { id, .. } => SelectionTarget::Furniture(id),
            DragState::Opening { kind, id, .. } => SelectionTarget::opening(kind, id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum InteractionState {
    #[default]
    Idle,
    Selected(SelectionTarget),
    Dragging(DragState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Selected,
    Dragging,
}

/// 一次输入事件的处理结果，供渲染层决定是否重绘。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// 事件与当前状态无关，无需重绘。
    Ignored,
    Selected(SelectionTarget),
    Cleared,
    /// 候选位置通过校验并已提交。
    Moved(SelectionTarget),
    /// 候选位置非法，对象保持在最近一次合法状态。
    Reverted(SelectionTarget),
    Released(SelectionTarget),
    Rotated {
        target: SelectionTarget,
        rotation: f64,
    },
    Deleted(SelectionTarget),
}

impl Interaction {
    #[inline]
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Interaction::Ignored)
    }
}

/// 指针拖拽 / 键盘旋转的交互状态机：Idle → Selected → Dragging → Selected → Idle。
///
/// 所有修改都遵循两阶段协议：先由当前状态和输入计算候选值，校验通过后才写回房间。
/// 因此房间中存储的对象在任意两次事件之间都处于合法状态，非法的中间候选只会被丢弃。
#[derive(Debug, Default)]
pub struct PlacementController {
    state: InteractionState,
}

impl PlacementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ControllerPhase {
        match self.state {
            InteractionState::Idle => ControllerPhase::Idle,
            InteractionState::Selected(_) => ControllerPhase::Selected,
            InteractionState::Dragging(_) => ControllerPhase::Dragging,
        }
    }

    pub fn selection(&self) -> Option<SelectionTarget> {
        match self.state {
            InteractionState::Idle => None,
            InteractionState::Selected(target) => Some(target),
            InteractionState::Dragging(drag) => Some(drag.target()),
        }
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging(_))
    }

    /// 回到 Idle，丢弃选中与拖拽快照。
    #[inline]
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// 按绘制顺序的逆序命中测试：先窗，再门，最后家具。
    pub fn hit_test(room: &Room, at: Point2) -> Option<SelectionTarget> {
        let (width, height) = (room.width(), room.height());
        for kind in [OpeningKind::Window, OpeningKind::Door] {
            if let Some(opening) = room
                .openings(kind)
                .iter()
                .rev()
                .find(|o| o.contains(at, width, height))
            {
                return Some(SelectionTarget::opening(kind, opening.id));
            }
        }
        room.furniture()
            .iter()
            .rev()
            .find(|f| f.rect.contains(at))
            .map(|f| SelectionTarget::Furniture(f.id))
    }

    /// 不经指针直接选中对象。
    pub fn select(&mut self, room: &Room, target: SelectionTarget) -> Result<Interaction, EngineError> {
        let exists = match target.opening_kind() {
            Some(kind) => room.opening(kind, target.id()).is_some(),
            None => room.furniture_by_id(target.id()).is_some(),
        };
        if !exists {
            return Err(EngineError::ObjectNotFound(target.id().get()));
        }
        self.state = InteractionState::Selected(target);
        Ok(Interaction::Selected(target))
    }

    pub fn pointer_down(&mut self, room: &Room, at: Point2) -> Interaction {
        let Some(target) = Self::hit_test(room, at) else {
            self.state = InteractionState::Idle;
            return Interaction::Cleared;
        };
        let drag = match target {
            SelectionTarget::Furniture(id) => {
                let Some(furniture) = room.furniture_by_id(id) else {
                    return Interaction::Ignored;
                };
                let origin = furniture.rect.origin();
                DragState::Furniture {
                    id,
                    offset: origin.vector_to(at),
                    last_valid: origin,
                }
            }
            SelectionTarget::Window(id) => match opening_drag(room, OpeningKind::Window, id, at) {
                Some(drag) => drag,
                None => return Interaction::Ignored,
            },
            SelectionTarget::Door(id) => match opening_drag(room, OpeningKind::Door, id, at) {
                Some(drag) => drag,
                None => return Interaction::Ignored,
            },
        };

        debug!(
            room = room.id().get(),
            object = target.id().get(),
            kind = target.label(),
            "开始拖拽"
        );
        self.state = InteractionState::Dragging(drag);
        Interaction::Selected(target)
    }

    pub fn pointer_move(&mut self, room: &mut Room, at: Point2) -> Interaction {
        let InteractionState::Dragging(drag) = self.state else {
            return Interaction::Ignored;
        };
        let target = drag.target();

        match drag {
            DragState::Furniture { id, offset, .. } => {
                let Some(current) = room.furniture_by_id(id) else {
                    self.state = InteractionState::Idle;
                    return Interaction::Cleared;
                };
                let origin = Point2::from_vec(at.as_vec2() - offset.as_vec2());
                let candidate = current.rect.moved_to(origin);
                let check = collision::check_rect(&candidate, room, Some(id));
                if !check.is_legal() {
                    log_rejection(room, id, origin, check);
                    return Interaction::Reverted(target);
                }
                room.commit_furniture_rect(id, candidate);
                self.state = InteractionState::Dragging(DragState::Furniture {
                    id,
                    offset,
                    last_valid: origin,
                });
            }
            DragState::Opening {
                kind, id, offset, ..
            } => {
                let Some(opening) = room.opening(kind, id) else {
                    self.state = InteractionState::Idle;
                    return Interaction::Cleared;
                };
                let candidate = opening.wall.along(at) - offset;
                if !opening.accepts_position(candidate, room.width(), room.height()) {
                    debug!(
                        room = room.id().get(),
                        object = id.get(),
                        position = candidate,
                        "门窗越出墙体，保留上一合法位置"
                    );
                    return Interaction::Reverted(target);
                }
                room.commit_opening_position(kind, id, candidate);
                self.state = InteractionState::Dragging(DragState::Opening {
                    kind,
                    id,
                    offset,
                    last_valid: candidate,
                });
            }
        }
        Interaction::Moved(target)
    }

    /// 结束拖拽：再校验一次存储状态，不合法则恢复到快照。对象保持选中。
    pub fn pointer_up(&mut self, room: &mut Room) -> Interaction {
        let InteractionState::Dragging(drag) = self.state else {
            return Interaction::Ignored;
        };
        let target = drag.target();

        let restored = match drag {
            DragState::Furniture { id, last_valid, .. } => {
                let restore = match room.furniture_by_id(id) {
                    Some(f) if !collision::is_valid_placement(f, room) => Some(f.rect.moved_to(last_valid)),
                    Some(_) => None,
                    None => {
                        self.state = InteractionState::Idle;
                        return Interaction::Cleared;
                    }
                };
                restore.is_some_and(|rect| room.commit_furniture_rect(id, rect))
            }
            DragState::Opening {
                kind,
                id,
                last_valid,
                ..
            } => {
                let legal = match room.opening(kind, id) {
                    Some(opening) => collision::opening_is_legal(opening, room),
                    None => {
                        self.state = InteractionState::Idle;
                        return Interaction::Cleared;
                    }
                };
                !legal && room.commit_opening_position(kind, id, last_valid)
            }
        };

        self.state = InteractionState::Selected(target);
        if restored {
            warn!(object = target.id().get(), "松开时位置非法，已恢复到上一合法位置");
            Interaction::Reverted(target)
        } else {
            Interaction::Released(target)
        }
    }

    /// 旋转选中的家具。非法时角度保持原值并返回可恢复的 `RotationBlocked`。
    /// 未选中或选中门窗时不做任何事。
    pub fn rotate(&mut self, room: &mut Room, direction: RotationDirection) -> Result<Interaction, EngineError> {
        let Some(target) = self.selection().filter(|t| t.is_rotatable()) else {
            return Ok(Interaction::Ignored);
        };
        let SelectionTarget::Furniture(id) = target else {
            return Ok(Interaction::Ignored);
        };
        let Some(furniture) = room.furniture_by_id(id) else {
            self.state = InteractionState::Idle;
            return Ok(Interaction::Cleared);
        };

        let candidate = furniture.rect.rotated_by(direction.degrees());
        let check = collision::check_rect(&candidate, room, Some(id));
        if !check.is_legal() {
            warn!(
                room = room.id().get(),
                object = id.get(),
                rotation = furniture.rect.rotation,
                attempted = candidate.rotation,
                reason = ?check,
                "旋转被拒绝"
            );
            return Err(EngineError::RotationBlocked {
                object: id.get(),
                attempted: candidate.rotation,
            });
        }

        room.commit_furniture_rect(id, candidate);
        debug!(object = id.get(), rotation = candidate.rotation, "旋转完成");
        Ok(Interaction::Rotated {
            target,
            rotation: candidate.rotation,
        })
    }

    /// 删除选中对象，删除与清空选中在同一步完成。确认对话由外部负责。
    pub fn delete_selected(&mut self, room: &mut Room) -> Interaction {
        let Some(target) = self.selection() else {
            return Interaction::Ignored;
        };
        let removed = match target {
            SelectionTarget::Furniture(id) => room.remove_furniture(id).is_some(),
            SelectionTarget::Window(id) => room.remove_opening(OpeningKind::Window, id).is_some(),
            SelectionTarget::Door(id) => room.remove_opening(OpeningKind::Door, id).is_some(),
        };
        self.state = InteractionState::Idle;
        if removed {
            Interaction::Deleted(target)
        } else {
            Interaction::Cleared
        }
    }

    pub fn deselect(&mut self) -> Interaction {
        let had_selection = self.selection().is_some();
        self.state = InteractionState::Idle;
        if had_selection {
            Interaction::Cleared
        } else {
            Interaction::Ignored
        }
    }
}

fn opening_drag(room: &Room, kind: OpeningKind, id: ObjectId, at: Point2) -> Option<DragState> {
    let opening = room.opening(kind, id)?;
    Some(DragState::Opening {
        kind,
        id,
        offset: opening.wall.along(at) - opening.position,
        last_valid: opening.position,
    })
}

fn log_rejection(room: &Room, id: ObjectId, origin: Point2, check: PlacementCheck) {
    match check {
        PlacementCheck::Collides(other) => debug!(
            room = room.id().get(),
            object = id.get(),
            blocker = other.get(),
            x = origin.x(),
            y = origin.y(),
            "候选位置与其他家具重叠"
        ),
        other => debug!(
            room = room.id().get(),
            object = id.get(),
            x = origin.x(),
            y = origin.y(),
            reason = ?other,
            "候选位置非法"
        ),
    }
}
