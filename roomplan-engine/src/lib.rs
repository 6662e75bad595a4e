pub mod command;
pub mod controller;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    pub enum EngineError {
        #[error("no active room")]
        NoActiveRoom,
        #[error("room with id {0} not found")]
        RoomNotFound(u64),
        #[error("object with id {0} not found")]
        ObjectNotFound(u64),
        #[error("invalid dimensions {width}x{height}: both must be positive and finite")]
        InvalidDimensions { width: f64, height: f64 },
        #[error("room {width}x{height} exceeds the canvas limit of {max_width}x{max_height}")]
        RoomTooLarge {
            width: f64,
            height: f64,
            max_width: f64,
            max_height: f64,
        },
        #[error("furniture {width}x{height} is too large for room {room_width}x{room_height}")]
        FurnitureTooLarge {
            width: f64,
            height: f64,
            room_width: f64,
            room_height: f64,
        },
        #[error("no free space left for furniture {width}x{height}")]
        NoFreeSpace { width: f64, height: f64 },
        #[error("placement at ({x}, {y}) is out of bounds or overlaps other furniture")]
        PlacementRejected { x: f64, y: f64 },
        #[error("opening width {width} does not fit a wall of length {wall_length}")]
        OpeningTooWide { width: f64, wall_length: f64 },
        #[error("cannot rotate furniture {object} to {attempted}°: it would go out of bounds or overlap")]
        RotationBlocked { object: u64, attempted: f64 },
    }
}

pub mod scene {
    use roomplan_core::collision::{self, PlacementCheck};
    use roomplan_core::geometry::{PlacedRect, Point2};
    use roomplan_core::opening::{OpeningKind, Wall};
    use roomplan_core::plan::Plan;
    use roomplan_core::room::{ObjectId, Room, RoomId};
    use tracing::{debug, info};

    use crate::controller::{
        ControllerPhase, Interaction, PlacementController, RotationDirection, SelectionTarget,
    };
    use crate::errors::EngineError;

    const DEFAULT_MAX_ROOM_WIDTH: f64 = 800.0;
    const DEFAULT_MAX_ROOM_HEIGHT: f64 = 600.0;
    const DEFAULT_SPAWN: (f64, f64) = (10.0, 10.0);
    const DEFAULT_OPENING_OFFSET: f64 = 50.0;
    const DEFAULT_SCAN_STEP: f64 = 10.0;
    const MAX_SCAN_CELLS: u64 = 1_000_000;

    /// 房间尺寸上限与新对象的默认落点。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PlacementSettings {
        pub max_room_width: f64,
        pub max_room_height: f64,
        pub spawn: Point2,
        pub opening_offset: f64,
        pub scan_step: f64,
    }

    impl Default for PlacementSettings {
        fn default() -> Self {
            Self {
                max_room_width: DEFAULT_MAX_ROOM_WIDTH,
                max_room_height: DEFAULT_MAX_ROOM_HEIGHT,
                spawn: Point2::new(DEFAULT_SPAWN.0, DEFAULT_SPAWN.1),
                opening_offset: DEFAULT_OPENING_OFFSET,
                scan_step: DEFAULT_SCAN_STEP,
            }
        }
    }

    /// 引擎层负责维护 `Plan` 和交互状态。所有对房间对象的修改都经过这里。
    #[derive(Debug)]
    pub struct Scene {
        plan: Plan,
        controller: PlacementController,
        settings: PlacementSettings,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct DemoObjects {
        pub room: RoomId,
        pub sofa: ObjectId,
        pub table: ObjectId,
        pub bookshelf: ObjectId,
        pub window: ObjectId,
        pub door: ObjectId,
    }

    fn dimensions_are_valid(width: f64, height: f64) -> bool {
        width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
    }

    impl Scene {
        pub fn new() -> Self {
            Self::with_settings(PlacementSettings::default())
        }

        pub fn with_settings(settings: PlacementSettings) -> Self {
            Self {
                plan: Plan::new(),
                controller: PlacementController::new(),
                settings,
            }
        }

        /// 使用现有平面图初始化场景。
        pub fn with_plan(plan: Plan) -> Self {
            let mut scene = Self::new();
            scene.load_plan(plan);
            scene
        }

        /// 清空平面图和交互状态。
        pub fn reset(&mut self) {
            self.plan = Plan::new();
            self.controller.reset();
        }

        /// 替换当前平面图，修复 ID 序列并重置交互状态。
        pub fn load_plan(&mut self, mut plan: Plan) {
            plan.repair();
            self.plan = plan;
            self.controller.reset();
        }

        #[inline]
        pub fn plan(&self) -> &Plan {
            &self.plan
        }

        #[inline]
        pub fn settings(&self) -> PlacementSettings {
            self.settings
        }

        #[inline]
        pub fn selection(&self) -> Option<SelectionTarget> {
            self.controller.selection()
        }

        #[inline]
        pub fn phase(&self) -> ControllerPhase {
            self.controller.phase()
        }

        #[inline]
        pub fn active_room(&self) -> Option<&Room> {
            self.plan.active_room()
        }

        fn active_room_mut(&mut self) -> Result<&mut Room, EngineError> {
            self.plan.active_room_mut().ok_or(EngineError::NoActiveRoom)
        }

        pub fn create_room(
            &mut self,
            name: impl Into<String>,
            width: f64,
            height: f64,
        ) -> Result<RoomId, EngineError> {
            if !dimensions_are_valid(width, height) {
                return Err(EngineError::InvalidDimensions { width, height });
            }
            if width > self.settings.max_room_width || height > self.settings.max_room_height {
                return Err(EngineError::RoomTooLarge {
                    width,
                    height,
                    max_width: self.settings.max_room_width,
                    max_height: self.settings.max_room_height,
                });
            }
            let name = name.into();
            let id = self.plan.create_room(name.as_str(), width, height);
            info!(room = id.get(), name = %name, width, height, "已创建房间");
            Ok(id)
        }

        /// 切换活动房间；选中与拖拽状态随之清空，避免引用另一房间的对象。
        pub fn set_active_room(&mut self, id: RoomId) -> Result<(), EngineError> {
            if !self.plan.set_active_room(id) {
                return Err(EngineError::RoomNotFound(id.get()));
            }
            self.controller.reset();
            debug!(room = id.get(), "切换活动房间");
            Ok(())
        }

        pub fn delete_room(&mut self, id: RoomId) -> Result<Room, EngineError> {
            let removed = self
                .plan
                .delete_room(id)
                .ok_or(EngineError::RoomNotFound(id.get()))?;
            self.controller.reset();
            info!(room = id.get(), "已删除房间");
            Ok(removed)
        }

        /// 供创建表单等外部调用方预先校验候选矩形。
        pub fn check_placement(&self, rect: &PlacedRect) -> Result<PlacementCheck, EngineError> {
            let room = self.active_room().ok_or(EngineError::NoActiveRoom)?;
            Ok(collision::check_rect(rect, room, None))
        }

        /// 在活动房间中新增家具。先尝试默认落点，被占用时按网格逐行寻找第一个合法位置。
        pub fn add_furniture(
            &mut self,
            name: impl Into<String>,
            width: f64,
            height: f64,
        ) -> Result<ObjectId, EngineError> {
            if !dimensions_are_valid(width, height) {
                return Err(EngineError::InvalidDimensions { width, height });
            }
            let settings = self.settings;
            let room = self.plan.active_room().ok_or(EngineError::NoActiveRoom)?;
            if width > room.width() || height > room.height() {
                return Err(EngineError::FurnitureTooLarge {
                    width,
                    height,
                    room_width: room.width(),
                    room_height: room.height(),
                });
            }
            let origin = find_free_spot(room, width, height, &settings)
                .ok_or(EngineError::NoFreeSpace { width, height })?;

            let color = self.plan.next_color();
            let rect = PlacedRect::new(origin.x(), origin.y(), width, height);
            self.insert_furniture(name.into(), color, rect)
        }

        /// 以指定矩形新增家具，非法时整体拒绝。
        pub fn place_furniture(
            &mut self,
            name: impl Into<String>,
            rect: PlacedRect,
        ) -> Result<ObjectId, EngineError> {
            if !dimensions_are_valid(rect.width, rect.height) {
                return Err(EngineError::InvalidDimensions {
                    width: rect.width,
                    height: rect.height,
                });
            }
            let room = self.plan.active_room().ok_or(EngineError::NoActiveRoom)?;
            if !collision::check_rect(&rect, room, None).is_legal() {
                return Err(EngineError::PlacementRejected {
                    x: rect.x,
                    y: rect.y,
                });
            }
            let color = self.plan.next_color();
            self.insert_furniture(name.into(), color, rect)
        }

        fn insert_furniture(
            &mut self,
            name: String,
            color: String,
            rect: PlacedRect,
        ) -> Result<ObjectId, EngineError> {
            let room = self.active_room_mut()?;
            let id = room.add_furniture(name.as_str(), color, rect);
            info!(
                room = room.id().get(),
                object = id.get(),
                name = %name,
                x = rect.x,
                y = rect.y,
                "已添加家具"
            );
            Ok(id)
        }

        /// 新增门窗，默认落在距墙起点 `opening_offset` 处，放不下时向墙起点收缩。
        pub fn add_opening(
            &mut self,
            kind: OpeningKind,
            wall: Wall,
            width: f64,
        ) -> Result<ObjectId, EngineError> {
            let offset = self.settings.opening_offset;
            let room = self.active_room_mut()?;
            let wall_length = wall.length(room.width(), room.height());
            if !(width.is_finite() && width > 0.0 && width <= wall_length) {
                return Err(EngineError::OpeningTooWide { width, wall_length });
            }
            let position = offset.min(wall_length - width).max(0.0);
            let id = room.add_opening(kind, wall, position, width);
            info!(
                room = room.id().get(),
                object = id.get(),
                kind = kind.label(),
                wall = wall.name(),
                position,
                "已添加门窗"
            );
            Ok(id)
        }

        #[inline]
        pub fn add_window(&mut self, wall: Wall, width: f64) -> Result<ObjectId, EngineError> {
            self.add_opening(OpeningKind::Window, wall, width)
        }

        #[inline]
        pub fn add_door(&mut self, wall: Wall, width: f64) -> Result<ObjectId, EngineError> {
            self.add_opening(OpeningKind::Door, wall, width)
        }

        pub fn select(&mut self, target: SelectionTarget) -> Result<Interaction, EngineError> {
            let room = self.plan.active_room().ok_or(EngineError::NoActiveRoom)?;
            self.controller.select(room, target)
        }

        /// 没有活动房间时，指针事件一律忽略。
        pub fn pointer_down(&mut self, at: Point2) -> Interaction {
            match self.plan.active_room() {
                Some(room) => self.controller.pointer_down(room, at),
                None => Interaction::Ignored,
            }
        }

        pub fn pointer_move(&mut self, at: Point2) -> Interaction {
            match self.plan.active_room_mut() {
                Some(room) => self.controller.pointer_move(room, at),
                None => Interaction::Ignored,
            }
        }

        pub fn pointer_up(&mut self) -> Interaction {
            match self.plan.active_room_mut() {
                Some(room) => self.controller.pointer_up(room),
                None => Interaction::Ignored,
            }
        }

        pub fn rotate(&mut self, direction: RotationDirection) -> Result<Interaction, EngineError> {
            match self.plan.active_room_mut() {
                Some(room) => self.controller.rotate(room, direction),
                None => Ok(Interaction::Ignored),
            }
        }

        #[inline]
        pub fn rotate_clockwise(&mut self) -> Result<Interaction, EngineError> {
            self.rotate(RotationDirection::Clockwise)
        }

        #[inline]
        pub fn rotate_counter_clockwise(&mut self) -> Result<Interaction, EngineError> {
            self.rotate(RotationDirection::CounterClockwise)
        }

        pub fn delete_selected(&mut self) -> Interaction {
            let interaction = match self.plan.active_room_mut() {
                Some(room) => self.controller.delete_selected(room),
                None => Interaction::Ignored,
            };
            if let Interaction::Deleted(target) = interaction {
                info!(object = target.id().get(), kind = target.label(), "已删除对象");
            }
            interaction
        }

        #[inline]
        pub fn deselect(&mut self) -> Interaction {
            self.controller.deselect()
        }

        /// 为 CLI 演示填充一个客厅，返回关键对象 ID。
        pub fn populate_demo(&mut self) -> Result<DemoObjects, EngineError> {
            self.reset();
            let room = self.create_room("Living Room", 400.0, 300.0)?;
            let sofa = self.place_furniture("Sofa", PlacedRect::new(0.0, 0.0, 100.0, 50.0))?;
            let table = self.place_furniture("Table", PlacedRect::new(200.0, 120.0, 80.0, 60.0))?;
            let bookshelf =
                self.place_furniture("Bookshelf", PlacedRect::new(340.0, 100.0, 60.0, 180.0))?;
            let window = self.add_window(Wall::Top, 100.0)?;
            let door = self.add_door(Wall::Left, 70.0)?;

            let ids = DemoObjects {
                room,
                sofa,
                table,
                bookshelf,
                window,
                door,
            };
            debug!(
                room = ids.room.get(),
                sofa = ids.sofa.get(),
                table = ids.table.get(),
                bookshelf = ids.bookshelf.get(),
                window = ids.window.get(),
                door = ids.door.get(),
                "已创建演示对象"
            );
            Ok(ids)
        }
    }

    impl Default for Scene {
        fn default() -> Self {
            Self::new()
        }
    }

    /// 先试默认落点，再按 `scan_step` 网格逐行扫描。格点总数超过
    /// `MAX_SCAN_CELLS` 时步长逐次加倍。
    fn find_free_spot(
        room: &Room,
        width: f64,
        height: f64,
        settings: &PlacementSettings,
    ) -> Option<Point2> {
        let fits = |x: f64, y: f64| {
            collision::check_rect(&PlacedRect::new(x, y, width, height), room, None).is_legal()
        };
        if fits(settings.spawn.x(), settings.spawn.y()) {
            return Some(settings.spawn);
        }
        if !(settings.scan_step.is_finite() && settings.scan_step > 0.0) {
            return None;
        }

        let (free_x, free_y) = (room.width() - width, room.height() - height);
        if free_x < 0.0 || free_y < 0.0 {
            return None;
        }
        let mut step = settings.scan_step;
        let (columns, rows) = loop {
            // 浮点到整数的 `as` 转换会饱和，不会溢出
            let columns = (free_x / step).floor() as u64 + 1;
            let rows = (free_y / step).floor() as u64 + 1;
            if columns.saturating_mul(rows) <= MAX_SCAN_CELLS {
                break (columns, rows);
            }
            step *= 2.0;
        };
        if step != settings.scan_step {
            debug!(configured = settings.scan_step, step, "扫描步长过小，已放大");
        }

        (0..rows)
            .flat_map(|row| (0..columns).map(move |column| (column, row)))
            .map(|(column, row)| (column as f64 * step, row as f64 * step))
            .find(|&(x, y)| fits(x, y))
            .map(|(x, y)| Point2::new(x, y))
    }

}
