use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use roomplan_core::plan::Plan;
use roomplan_core::room::Room;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse plan: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid plan structure: {0}")]
    InvalidDocument(String),
}

pub trait PlanLoader {
    fn load(&self, path: &Path) -> Result<Plan, IoError>;
}

pub trait PlanSaver {
    fn save(&self, plan: &Plan, path: &Path) -> Result<(), IoError>;
}

/// 以 JSON 读写平面图。字段采用 camelCase，缺失的可选字段按旧版本文件处理。
#[derive(Debug, Clone, Copy)]
pub struct JsonFacade {
    pretty: bool,
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFacade {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// 解析并校验，随后修复 ID 序列与角度。
    pub fn parse(&self, data: &str) -> Result<Plan, IoError> {
        let mut plan: Plan =
            serde_json::from_str(data).map_err(|source| IoError::Parse { source })?;
        validate_plan(&plan)?;
        plan.repair();
        Ok(plan)
    }

    pub fn encode(&self, plan: &Plan) -> Result<String, IoError> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(plan)
        } else {
            serde_json::to_string(plan)
        };
        encoded.map_err(|source| IoError::Parse { source })
    }
}

impl PlanLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<Plan, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&data)
    }
}

impl PlanSaver for JsonFacade {
    fn save(&self, plan: &Plan, path: &Path) -> Result<(), IoError> {
        let data = self.encode(plan)?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 结构校验：房间尺寸为正、ID 不重复且序列还能推进、活动房间存在。
/// 几何合法性不在此检查。
pub fn validate_plan(plan: &Plan) -> Result<(), IoError> {
    if plan.next_room_id() == u64::MAX {
        return Err(IoError::InvalidDocument("room id sequence is exhausted".into()));
    }
    let mut room_ids = HashSet::new();
    for room in plan.rooms() {
        if room.id().get() == u64::MAX {
            return Err(IoError::InvalidDocument(format!(
                "room id {} leaves no room for new ids",
                room.id()
            )));
        }
        if !room_ids.insert(room.id()) {
            return Err(IoError::InvalidDocument(format!(
                "duplicate room id {}",
                room.id()
            )));
        }
        validate_room(room)?;
    }

    if let Some(active) = plan.active_room_id() {
        if plan.room(active).is_none() {
            return Err(IoError::InvalidDocument(format!(
                "active room {active} does not exist"
            )));
        }
    }
    Ok(())
}

fn validate_room(room: &Room) -> Result<(), IoError> {
    let (width, height) = (room.width(), room.height());
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(IoError::InvalidDocument(format!(
            "room {} has invalid size {width}x{height}",
            room.id()
        )));
    }

    // 旧文件按种类分别计数，ID 只需在同一种类内唯一
    let kinds = [
        ("furniture", room.furniture().iter().map(|f| f.id).collect::<Vec<_>>()),
        ("window", room.windows().iter().map(|o| o.id).collect()),
        ("door", room.doors().iter().map(|o| o.id).collect()),
    ];
    if room.next_object_id() == u64::MAX {
        return Err(IoError::InvalidDocument(format!(
            "object id sequence of room {} is exhausted",
            room.id()
        )));
    }
    for (kind, ids) in kinds {
        let mut seen = HashSet::new();
        for id in ids {
            if id.get() == u64::MAX {
                return Err(IoError::InvalidDocument(format!(
                    "{kind} id {id} in room {} leaves no room for new ids",
                    room.id()
                )));
            }
            if !seen.insert(id) {
                return Err(IoError::InvalidDocument(format!(
                    "duplicate {kind} id {id} in room {}",
                    room.id()
                )));
            }
        }
    }

    for furniture in room.furniture() {
        let rect = &furniture.rect;
        let values = [rect.x, rect.y, rect.width, rect.height, rect.rotation];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(IoError::InvalidDocument(format!(
                "furniture {} in room {} has non-finite geometry",
                furniture.id,
                room.id()
            )));
        }
    }
    for opening in room.windows().iter().chain(room.doors()) {
        if !(opening.position.is_finite() && opening.width.is_finite()) {
            return Err(IoError::InvalidDocument(format!(
                "opening {} in room {} has non-finite geometry",
                opening.id,
                room.id()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomplan_core::opening::{OpeningKind, Wall};

    #[test]
    fn rejects_duplicate_object_ids() {
        let data = r#"{
            "rooms": [{
                "id": 1, "name": "Dup", "width": 400, "height": 300,
                "furniture": [
                    {"id": 2, "name": "Bed", "x": 0, "y": 0, "width": 10, "height": 10},
                    {"id": 2, "name": "Desk", "x": 50, "y": 0, "width": 10, "height": 10}
                ]
            }],
            "activeRoomId": 1
        }"#;
        let err = JsonFacade::new().parse(data).unwrap_err();
        assert!(matches!(err, IoError::InvalidDocument(_)));
    }

    #[test]
    fn ids_may_repeat_across_kinds() {
        let data = r#"{
            "rooms": [{
                "id": 1, "name": "Legacy", "width": 400, "height": 300,
                "furniture": [{"id": 1, "name": "Bed", "x": 0, "y": 0, "width": 10, "height": 10}],
                "windows": [{"id": 1, "wall": "top", "position": 0, "width": 50}],
                "doors": [{"id": 1, "wall": "left", "position": 0, "width": 50}]
            }],
            "nextFurnitureId": 2,
            "nextWindowId": 2,
            "nextDoorId": 2
        }"#;
        let mut plan = JsonFacade::new().parse(data).expect("legacy counters are accepted");
        assert_eq!(plan.active_room().map(|room| room.name()), Some("Legacy"));
        let room = plan.active_room_mut().unwrap();
        let id = room.add_opening(OpeningKind::Door, Wall::Right, 0.0, 50.0);
        assert_eq!(id.get(), 2);
    }

    #[test]
    fn rejects_missing_active_room_and_bad_size() {
        let missing = r#"{"rooms": [{"id": 1, "name": "A", "width": 10, "height": 10}], "activeRoomId": 3}"#;
        assert!(matches!(
            JsonFacade::new().parse(missing),
            Err(IoError::InvalidDocument(_))
        ));

        let flat = r#"{"rooms": [{"id": 1, "name": "A", "width": 0, "height": 10}]}"#;
        assert!(matches!(
            JsonFacade::new().parse(flat),
            Err(IoError::InvalidDocument(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            JsonFacade::compact().parse("{ rooms: "),
            Err(IoError::Parse { .. })
        ));
    }
}
