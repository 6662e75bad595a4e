use serde::{Deserialize, Serialize};

use crate::room::{Room, RoomId};

/// 新家具依次取用的配色。
pub const FURNITURE_PALETTE: [&str; 20] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#F8B739",
    "#85C1E2", "#F39C12", "#1ABC9C", "#E74C3C", "#3498DB", "#9B59B6", "#2ECC71", "#E67E22",
    "#16A085", "#C0392B", "#8E44AD", "#27AE60",
];

fn first_room_id() -> u64 {
    1
}

/// 多房间平面图：房间列表、当前活动房间以及房间 ID 序列。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    rooms: Vec<Room>,
    #[serde(default)]
    active_room_id: Option<RoomId>,
    #[serde(default = "first_room_id")]
    next_room_id: u64,
    #[serde(default)]
    color_index: usize,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            rooms: Vec::new(),
            active_room_id: None,
            next_room_id: first_room_id(),
            color_index: 0,
        }
    }
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id() == id)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| room.id() == id)
    }

    #[inline]
    pub fn next_room_id(&self) -> u64 {
        self.next_room_id
    }

    #[inline]
    pub fn active_room_id(&self) -> Option<RoomId> {
        self.active_room_id
    }

    pub fn active_room(&self) -> Option<&Room> {
        self.active_room_id.and_then(|id| self.room(id))
    }

    pub fn active_room_mut(&mut self) -> Option<&mut Room> {
        let id = self.active_room_id?;
        self.room_mut(id)
    }

    /// 创建房间；第一个房间自动成为活动房间。尺寸校验由引擎负责。
    pub fn create_room(&mut self, name: impl Into<String>, width: f64, height: f64) -> RoomId {
        let id = RoomId::new(self.next_room_id);
        self.next_room_id = self.next_room_id.saturating_add(1);
        self.rooms.push(Room::new(id, name, width, height));
        if self.rooms.len() == 1 {
            self.active_room_id = Some(id);
        }
        id
    }

    /// 切换活动房间，房间不存在时返回 `false`。
    pub fn set_active_room(&mut self, id: RoomId) -> bool {
        if self.room(id).is_none() {
            return false;
        }
        self.active_room_id = Some(id);
        true
    }

    /// 删除房间及其全部对象。若删除的是活动房间，则第一个剩余房间成为活动房间。
    pub fn delete_room(&mut self, id: RoomId) -> Option<Room> {
        let index = self.rooms.iter().position(|room| room.id() == id)?;
        let removed = self.rooms.remove(index);
        if self.active_room_id == Some(id) {
            self.active_room_id = self.rooms.first().map(Room::id);
        }
        Some(removed)
    }

    /// 取下一个配色并推进游标。
    pub fn next_color(&mut self) -> String {
        let color = FURNITURE_PALETTE[self.color_index % FURNITURE_PALETTE.len()];
        self.color_index = (self.color_index + 1) % FURNITURE_PALETTE.len();
        color.to_string()
    }

    /// 反序列化后调用：修复各房间 ID 序列与角度，推进房间序列，缺失活动房间时取第一个。
    pub fn repair(&mut self) {
        let max_room = self.rooms.iter().map(|room| room.id().get()).max().unwrap_or(0);
        self.next_room_id = self
            .next_room_id
            .max(max_room.saturating_add(1))
            .max(first_room_id());
        self.color_index %= FURNITURE_PALETTE.len();
        if self.active_room_id.is_none() {
            self.active_room_id = self.rooms.first().map(Room::id);
        }
        for room in &mut self.rooms {
            room.repair();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_room_becomes_active() {
        let mut plan = Plan::new();
        assert!(plan.active_room().is_none());
        let kitchen = plan.create_room("Kitchen", 400.0, 300.0);
        let hall = plan.create_room("Hall", 200.0, 100.0);
        assert_eq!(plan.active_room_id(), Some(kitchen));
        assert!(plan.set_active_room(hall));
        assert_eq!(plan.active_room().map(Room::name), Some("Hall"));
        assert!(!plan.set_active_room(RoomId::new(42)));
        assert_eq!(plan.active_room_id(), Some(hall));
    }

    #[test]
    fn deleting_active_room_falls_back_to_first() {
        let mut plan = Plan::new();
        let a = plan.create_room("A", 100.0, 100.0);
        let b = plan.create_room("B", 100.0, 100.0);
        plan.set_active_room(b);
        assert!(plan.delete_room(b).is_some());
        assert_eq!(plan.active_room_id(), Some(a));
        assert!(plan.delete_room(a).is_some());
        assert_eq!(plan.active_room_id(), None);
        assert!(plan.delete_room(a).is_none());
    }

    #[test]
    fn palette_cycles() {
        let mut plan = Plan::new();
        let first = plan.next_color();
        for _ in 1..FURNITURE_PALETTE.len() {
            plan.next_color();
        }
        assert_eq!(plan.next_color(), first);
    }

    #[test]
    fn repair_advances_room_sequence() {
        let mut plan: Plan = serde_json::from_str(
            r#"{"rooms": [{"id": 4, "name": "Den", "width": 300, "height": 200}], "activeRoomId": 4}"#,
        )
        .unwrap();
        plan.repair();
        let next = plan.create_room("Study", 100.0, 100.0);
        assert_eq!(next.get(), 5);
        assert_eq!(plan.active_room_id(), Some(RoomId::new(4)));
    }
}
