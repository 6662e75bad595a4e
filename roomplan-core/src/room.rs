use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{PlacedRect, normalize_degrees};
use crate::opening::{Opening, OpeningKind, Wall};

/// 房间内对象（家具、窗、门）的标识，由房间自己的序列分配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 提供原始数值，便于序列化或日志输出。
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(u64);

impl RoomId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const DEFAULT_FURNITURE_COLOR: &str = "#95a5a6";

fn default_color() -> String {
    DEFAULT_FURNITURE_COLOR.to_string()
}

/// 家具：一个可旋转的已放置矩形，外加名称与颜色（几何判定不关心后两者）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Furniture {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub rect: PlacedRect,
    #[serde(default = "default_color")]
    pub color: String,
}

fn first_object_id() -> u64 {
    1
}

/// 矩形房间，独占其中的家具与门窗。集合顺序即绘制顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    id: RoomId,
    name: String,
    width: f64,
    height: f64,
    #[serde(default)]
    furniture: Vec<Furniture>,
    #[serde(default)]
    windows: Vec<Opening>,
    #[serde(default)]
    doors: Vec<Opening>,
    #[serde(default = "first_object_id")]
    next_object_id: u64,
}

impl Room {
    pub fn new(id: RoomId, name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id,
            name: name.into(),
            width,
            height,
            furniture: Vec::new(),
            windows: Vec::new(),
            doors: Vec::new(),
            next_object_id: first_object_id(),
        }
    }

    #[inline]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// 下一个待分配的对象 ID。
    #[inline]
    pub fn next_object_id(&self) -> u64 {
        self.next_object_id
    }

    #[inline]
    pub fn furniture(&self) -> &[Furniture] {
        &self.furniture
    }

    #[inline]
    pub fn windows(&self) -> &[Opening] {
        &self.windows
    }

    #[inline]
    pub fn doors(&self) -> &[Opening] {
        &self.doors
    }

    pub fn openings(&self, kind: OpeningKind) -> &[Opening] {
        match kind {
            OpeningKind::Window => &self.windows,
            OpeningKind::Door => &self.doors,
        }
    }

    fn openings_mut(&mut self, kind: OpeningKind) -> &mut Vec<Opening> {
        match kind {
            OpeningKind::Window => &mut self.windows,
            OpeningKind::Door => &mut self.doors,
        }
    }

    pub fn furniture_by_id(&self, id: ObjectId) -> Option<&Furniture> {
        self.furniture.iter().find(|f| f.id == id)
    }

    pub fn opening(&self, kind: OpeningKind, id: ObjectId) -> Option<&Opening> {
        self.openings(kind).iter().find(|o| o.id == id)
    }

    /// 插入家具并分配新 ID。合法性由调用方（引擎）事先校验。
    pub fn add_furniture(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
        rect: PlacedRect,
    ) -> ObjectId {
        let id = self.next_id();
        self.furniture.push(Furniture {
            id,
            name: name.into(),
            rect: rect.rotated_by(0.0),
            color: color.into(),
        });
        id
    }

    pub fn add_opening(
        &mut self,
        kind: OpeningKind,
        wall: Wall,
        position: f64,
        width: f64,
    ) -> ObjectId {
        let id = self.next_id();
        self.openings_mut(kind)
            .push(Opening::new(id, wall, position, width));
        id
    }

    pub fn remove_furniture(&mut self, id: ObjectId) -> Option<Furniture> {
        let index = self.furniture.iter().position(|f| f.id == id)?;
        Some(self.furniture.remove(index))
    }

    pub fn remove_opening(&mut self, kind: OpeningKind, id: ObjectId) -> Option<Opening> {
        let openings = self.openings_mut(kind);
        let index = openings.iter().position(|o| o.id == id)?;
        Some(openings.remove(index))
    }

    /// 用已通过校验的候选矩形替换家具的存储状态，返回家具是否存在。
    pub fn commit_furniture_rect(&mut self, id: ObjectId, rect: PlacedRect) -> bool {
        match self.furniture.iter_mut().find(|f| f.id == id) {
            Some(furniture) => {
                furniture.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn commit_opening_position(&mut self, kind: OpeningKind, id: ObjectId, position: f64) -> bool {
        match self.openings_mut(kind).iter_mut().find(|o| o.id == id) {
            Some(opening) => {
                opening.position = position;
                true
            }
            None => false,
        }
    }

    /// 载入旧文件后修复：ID 序列推进到现有最大 ID 之后，角度归一化。
    pub fn repair(&mut self) {
        let max_id = self
            .furniture
            .iter()
            .map(|f| f.id.get())
            .chain(self.windows.iter().map(|o| o.id.get()))
            .chain(self.doors.iter().map(|o| o.id.get()))
            .max()
            .unwrap_or(0);
        self.next_object_id = self
            .next_object_id
            .max(max_id.saturating_add(1))
            .max(first_object_id());
        for furniture in &mut self.furniture {
            furniture.rect.rotation = normalize_degrees(furniture.rect.rotation);
        }
    }

    fn next_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id = self.next_object_id.saturating_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_allocates_ids_across_object_kinds() {
        let mut room = Room::new(RoomId::new(1), "Bedroom", 400.0, 300.0);
        let bed = room.add_furniture("Bed", "#FF6B6B", PlacedRect::new(10.0, 10.0, 100.0, 50.0));
        let window = room.add_opening(OpeningKind::Window, Wall::Top, 50.0, 80.0);
        let door = room.add_opening(OpeningKind::Door, Wall::Left, 20.0, 60.0);

        assert_eq!(bed.get(), 1);
        assert_eq!(window.get(), 2);
        assert_eq!(door.get(), 3);
        assert!(room.furniture_by_id(bed).is_some());
        assert!(room.opening(OpeningKind::Window, window).is_some());
        assert!(room.opening(OpeningKind::Window, door).is_none());
        assert!(room.opening(OpeningKind::Door, door).is_some());
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut room = Room::new(RoomId::new(1), "Office", 400.0, 300.0);
        let first = room.add_furniture("Desk", DEFAULT_FURNITURE_COLOR, PlacedRect::new(0.0, 0.0, 10.0, 10.0));
        let removed = room.remove_furniture(first).expect("desk should exist");
        assert_eq!(removed.name, "Desk");
        assert!(room.remove_furniture(first).is_none());

        let second = room.add_furniture("Chair", DEFAULT_FURNITURE_COLOR, PlacedRect::new(0.0, 0.0, 10.0, 10.0));
        assert_ne!(first, second);
    }

    #[test]
    fn commit_replaces_stored_state() {
        let mut room = Room::new(RoomId::new(1), "Office", 400.0, 300.0);
        let desk = room.add_furniture("Desk", DEFAULT_FURNITURE_COLOR, PlacedRect::new(0.0, 0.0, 10.0, 10.0));
        assert!(room.commit_furniture_rect(desk, PlacedRect::new(5.0, 6.0, 10.0, 10.0).with_rotation(90.0)));
        let stored = room.furniture_by_id(desk).unwrap();
        assert_eq!(stored.rect.x, 5.0);
        assert_eq!(stored.rect.rotation, 90.0);
        assert!(!room.commit_furniture_rect(ObjectId::new(99), PlacedRect::new(0.0, 0.0, 1.0, 1.0)));

        let window = room.add_opening(OpeningKind::Window, Wall::Bottom, 10.0, 50.0);
        assert!(room.commit_opening_position(OpeningKind::Window, window, 120.0));
        assert_eq!(room.opening(OpeningKind::Window, window).unwrap().position, 120.0);
        assert!(!room.commit_opening_position(OpeningKind::Door, window, 0.0));
    }

    #[test]
    fn furniture_serializes_flat() {
        let furniture = Furniture {
            id: ObjectId::new(7),
            name: "Sofa".to_string(),
            rect: PlacedRect::new(1.0, 2.0, 3.0, 4.0).with_rotation(90.0),
            color: "#4ECDC4".to_string(),
        };
        let value = serde_json::to_value(&furniture).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["x"], 1.0);
        assert_eq!(value["rotation"], 90.0);
        assert_eq!(value["color"], "#4ECDC4");

        let legacy: Furniture =
            serde_json::from_str(r#"{"id":3,"name":"Bed","x":0,"y":0,"width":10,"height":20}"#).unwrap();
        assert_eq!(legacy.rect.rotation, 0.0);
        assert_eq!(legacy.color, DEFAULT_FURNITURE_COLOR);
    }

    #[test]
    fn repair_advances_sequence_and_normalizes_rotation() {
        let mut room: Room = serde_json::from_str(
            r#"{
                "id": 1, "name": "Legacy", "width": 400, "height": 300,
                "furniture": [{"id": 5, "name": "Bed", "x": 0, "y": 0, "width": 10, "height": 10, "rotation": -90}],
                "doors": [{"id": 9, "wall": "left", "position": 10, "width": 30}]
            }"#,
        )
        .unwrap();
        room.repair();
        assert_eq!(room.furniture()[0].rect.rotation, 270.0);
        assert!(room.windows().is_empty());
        let next = room.add_furniture("Lamp", DEFAULT_FURNITURE_COLOR, PlacedRect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(next.get(), 10);
    }

    #[test]
    fn repair_saturates_at_largest_id() {
        let mut room: Room = serde_json::from_str(
            r#"{
                "id": 1, "name": "Edge", "width": 400, "height": 300,
                "furniture": [{"id": 18446744073709551615, "name": "Bed", "x": 0, "y": 0, "width": 10, "height": 10}]
            }"#,
        )
        .unwrap();
        room.repair();
        assert_eq!(room.next_object_id(), u64::MAX);
    }
}
