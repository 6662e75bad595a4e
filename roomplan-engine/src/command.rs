use std::collections::HashMap;
use std::str::FromStr;

use roomplan_core::geometry::Point2;
use roomplan_core::opening::{OpeningKind, Wall};
use roomplan_core::room::RoomId;

use crate::controller::{Interaction, RotationDirection};
use crate::errors::EngineError;
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    /// 按空白切分一行输入，空行返回 `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?.to_string();
        Some(Self {
            name,
            args: parts.map(str::to_string).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
    /// 命令是否改变了需要重新绘制的状态。
    pub redraw: bool,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            redraw: false,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            redraw: false,
        }
    }

    pub fn with_redraw(mut self, redraw: bool) -> Self {
        self.redraw = redraw;
        self
    }

    fn from_interaction(interaction: Interaction) -> Self {
        let message = match interaction {
            Interaction::Ignored => "无操作".to_string(),
            Interaction::Selected(target) => format!("已选中 {} #{}", target.label(), target.id()),
            Interaction::Cleared => "已取消选中".to_string(),
            Interaction::Moved(target) => format!("{} #{} 已移动", target.label(), target.id()),
            Interaction::Reverted(target) => {
                format!("{} #{} 位置非法，保持上一合法位置", target.label(), target.id())
            }
            Interaction::Released(target) => format!("{} #{} 已放下", target.label(), target.id()),
            Interaction::Rotated { target, rotation } => {
                format!("{} #{} 已旋转至 {rotation}°", target.label(), target.id())
            }
            Interaction::Deleted(target) => format!("{} #{} 已删除", target.label(), target.id()),
        };
        Self::ok(message).with_redraw(interaction.needs_redraw())
    }

    fn from_error(error: EngineError) -> Self {
        Self::err(error.to_string())
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn usage(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse;
}

pub struct CommandContext<'a> {
    pub scene: &'a mut Scene,
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(PointerDownCommand);
        bus.register(PointerMoveCommand);
        bus.register(PointerUpCommand);
        bus.register(RotateCommand);
        bus.register(DeleteCommand);
        bus.register(DeselectCommand);
        bus.register(CreateRoomCommand);
        bus.register(UseRoomCommand);
        bus.register(DropRoomCommand);
        bus.register(AddFurnitureCommand);
        bus.register(AddOpeningCommand {
            kind: OpeningKind::Window,
        });
        bus.register(AddOpeningCommand {
            kind: OpeningKind::Door,
        });
        bus.register(ShowCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        if let Some(handler) = self.handlers.get(request.name.as_str()) {
            handler.execute(request, context)
        } else {
            CommandResponse::err(format!("未知命令: {}", request.name))
        }
    }

    pub fn available_commands(&self) -> impl Iterator<Item = &&'static str> {
        self.handlers.keys()
    }

    /// 所有命令的用法，按名称排序。
    pub fn usage_lines(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
            .into_iter()
            .filter_map(|name| self.handlers.get(name).map(|handler| handler.usage()))
            .collect()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

fn arg<T: FromStr>(request: &CommandRequest, index: usize, what: &str) -> Result<T, CommandResponse> {
    let raw = request
        .args
        .get(index)
        .ok_or_else(|| CommandResponse::err(format!("缺少参数: {what}")))?;
    raw.parse()
        .map_err(|_| CommandResponse::err(format!("参数 {what} 无法解析: {raw}")))
}

fn point_arg(request: &CommandRequest) -> Result<Point2, CommandResponse> {
    Ok(Point2::new(arg(request, 0, "x")?, arg(request, 1, "y")?))
}

struct PointerDownCommand;

impl CommandHandler for PointerDownCommand {
    fn name(&self) -> &'static str {
        "down"
    }

    fn usage(&self) -> &'static str {
        "down X Y            按下指针并开始拖拽"
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        match point_arg(request) {
            Ok(at) => CommandResponse::from_interaction(context.scene.pointer_down(at)),
            Err(response) => response,
        }
    }
}

struct PointerMoveCommand;

impl CommandHandler for PointerMoveCommand {
    fn name(&self) -> &'static str {
        "move"
    }

    fn usage(&self) -> &'static str {
        "move X Y            拖拽到新位置"
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        match point_arg(request) {
            Ok(at) => CommandResponse::from_interaction(context.scene.pointer_move(at)),
            Err(response) => response,
        }
    }
}

struct PointerUpCommand;

impl CommandHandler for PointerUpCommand {
    fn name(&self) -> &'static str {
        "up"
    }

    fn usage(&self) -> &'static str {
        "up                  松开指针"
    }

    fn execute(&self, _request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        CommandResponse::from_interaction(context.scene.pointer_up())
    }
}

struct RotateCommand;

impl CommandHandler for RotateCommand {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn usage(&self) -> &'static str {
        "rotate cw|ccw       旋转选中的家具 90°"
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        let direction = match request.args.first().map(String::as_str) {
            None | Some("cw") => RotationDirection::Clockwise,
            Some("ccw") => RotationDirection::CounterClockwise,
            Some(other) => return CommandResponse::err(format!("未知旋转方向: {other}")),
        };
        match context.scene.rotate(direction) {
            Ok(interaction) => CommandResponse::from_interaction(interaction),
            // 被拒绝的旋转同样重绘，画面回到原角度
            Err(error @ EngineError::RotationBlocked { .. }) => {
                CommandResponse::from_error(error).with_redraw(true)
            }
            Err(error) => CommandResponse::from_error(error),
        }
    }
}

struct DeleteCommand;

impl CommandHandler for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn usage(&self) -> &'static str {
        "delete              删除选中对象"
    }

    fn execute(&self, _request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        CommandResponse::from_interaction(context.scene.delete_selected())
    }
}

struct DeselectCommand;

impl CommandHandler for DeselectCommand {
    fn name(&self) -> &'static str {
        "deselect"
    }

    fn usage(&self) -> &'static str {
        "deselect            取消选中"
    }

    fn execute(&self, _request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        CommandResponse::from_interaction(context.scene.deselect())
    }
}

struct CreateRoomCommand;

impl CommandHandler for CreateRoomCommand {
    fn name(&self) -> &'static str {
        "room"
    }

    fn usage(&self) -> &'static str {
        "room NAME W H       新建房间"
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        let parsed = (|| {
            let name: String = arg(request, 0, "name")?;
            Ok::<_, CommandResponse>((
                name,
                arg::<f64>(request, 1, "width")?,
                arg::<f64>(request, 2, "height")?,
            ))
        })();
        let (name, width, height) = match parsed {
            Ok(values) => values,
            Err(response) => return response,
        };
        match context.scene.create_room(name.as_str(), width, height) {
            Ok(id) => CommandResponse::ok(format!("已创建房间 #{id} {name}")).with_redraw(true),
            Err(error) => CommandResponse::from_error(error),
        }
    }
}

struct UseRoomCommand;

impl CommandHandler for UseRoomCommand {
    fn name(&self) -> &'static str {
        "use"
    }

    fn usage(&self) -> &'static str {
        "use ROOM_ID         切换活动房间"
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        let id = match arg::<u64>(request, 0, "room_id") {
            Ok(raw) => RoomId::new(raw),
            Err(response) => return response,
        };
        match context.scene.set_active_room(id) {
            Ok(()) => CommandResponse::ok(format!("活动房间: #{id}")).with_redraw(true),
            Err(error) => CommandResponse::from_error(error),
        }
    }
}

struct DropRoomCommand;

impl CommandHandler for DropRoomCommand {
    fn name(&self) -> &'static str {
        "drop-room"
    }

    fn usage(&self) -> &'static str {
        "drop-room           删除活动房间"
    }

    fn execute(&self, _request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        let Some(id) = context.scene.plan().active_room_id() else {
            return CommandResponse::from_error(EngineError::NoActiveRoom);
        };
        match context.scene.delete_room(id) {
            Ok(room) => CommandResponse::ok(format!("已删除房间 #{id} {}", room.name())).with_redraw(true),
            Err(error) => CommandResponse::from_error(error),
        }
    }
}

struct AddFurnitureCommand;

impl CommandHandler for AddFurnitureCommand {
    fn name(&self) -> &'static str {
        "furniture"
    }

    fn usage(&self) -> &'static str {
        "furniture NAME W H  在活动房间中添加家具"
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        let parsed = (|| {
            let name: String = arg(request, 0, "name")?;
            Ok::<_, CommandResponse>((
                name,
                arg::<f64>(request, 1, "width")?,
                arg::<f64>(request, 2, "height")?,
            ))
        })();
        let (name, width, height) = match parsed {
            Ok(values) => values,
            Err(response) => return response,
        };
        match context.scene.add_furniture(name.as_str(), width, height) {
            Ok(id) => CommandResponse::ok(format!("已添加家具 #{id} {name}")).with_redraw(true),
            Err(error) => CommandResponse::from_error(error),
        }
    }
}

struct AddOpeningCommand {
    kind: OpeningKind,
}

impl CommandHandler for AddOpeningCommand {
    fn name(&self) -> &'static str {
        self.kind.label()
    }

    fn usage(&self) -> &'static str {
        match self.kind {
            OpeningKind::Window => "window WALL W       在指定墙上添加窗",
            OpeningKind::Door => "door WALL W         在指定墙上添加门",
        }
    }

    fn execute(&self, request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        let wall = match request.args.first().map(|raw| (raw, Wall::from_name(raw))) {
            Some((_, Some(wall))) => wall,
            Some((raw, None)) => return CommandResponse::err(format!("未知墙体: {raw}")),
            None => return CommandResponse::err("缺少参数: wall"),
        };
        let width = match arg::<f64>(request, 1, "width") {
            Ok(width) => width,
            Err(response) => return response,
        };
        match context.scene.add_opening(self.kind, wall, width) {
            Ok(id) => CommandResponse::ok(format!(
                "已添加 {} #{id}（{} 墙）",
                self.kind.label(),
                wall.name()
            ))
            .with_redraw(true),
            Err(error) => CommandResponse::from_error(error),
        }
    }
}

struct ShowCommand;

impl CommandHandler for ShowCommand {
    fn name(&self) -> &'static str {
        "show"
    }

    fn usage(&self) -> &'static str {
        "show                重新绘制活动房间"
    }

    fn execute(&self, _request: &CommandRequest, context: &mut CommandContext<'_>) -> CommandResponse {
        match context.scene.active_room() {
            Some(room) => CommandResponse::ok(format!("房间 #{} {}", room.id(), room.name())).with_redraw(true),
            None => CommandResponse::from_error(EngineError::NoActiveRoom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(bus: &CommandBus, scene: &mut Scene, line: &str) -> CommandResponse {
        let request = CommandRequest::parse(line).expect("non-empty command");
        let mut context = CommandContext { scene };
        bus.dispatch(&request, &mut context)
    }

    #[test]
    fn parse_splits_whitespace() {
        assert_eq!(
            CommandRequest::parse("  move 10  20 "),
            Some(CommandRequest::new("move", &["10", "20"]))
        );
        assert_eq!(CommandRequest::parse("   "), None);
    }

    #[test]
    fn drag_commands_drive_the_scene() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo().unwrap();
        let bus = CommandBus::new();

        let down = run(&bus, &mut scene, "down 220 140");
        assert!(down.success);
        assert!(down.redraw);
        assert!(run(&bus, &mut scene, "move 120 240").success);
        assert!(run(&bus, &mut scene, "up").success);

        let room = scene.active_room().unwrap();
        let table = room.furniture_by_id(ids.table).unwrap();
        assert_eq!((table.rect.x, table.rect.y), (100.0, 220.0));
    }

    #[test]
    fn blocked_rotation_fails_but_redraws() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo().unwrap();
        let bus = CommandBus::new();

        // 沙发贴着左上角，旋转后会越出房间
        assert!(run(&bus, &mut scene, "down 60 25").success);
        run(&bus, &mut scene, "up");
        let response = run(&bus, &mut scene, "rotate cw");
        assert!(!response.success);
        assert!(response.redraw);
        let sofa = scene.active_room().unwrap().furniture_by_id(ids.sofa).unwrap();
        assert_eq!(sofa.rect.rotation, 0.0);
    }

    #[test]
    fn room_and_object_creation_commands() {
        let mut scene = Scene::new();
        let bus = CommandBus::new();

        assert!(!run(&bus, &mut scene, "furniture Bed 100 50").success);
        assert!(run(&bus, &mut scene, "room Bedroom 400 300").success);
        assert!(!run(&bus, &mut scene, "room Hall 1200 300").success);
        assert!(run(&bus, &mut scene, "furniture Bed 100 50").success);
        assert!(run(&bus, &mut scene, "window top 80").success);
        assert!(run(&bus, &mut scene, "door LEFT 60").success);
        assert!(!run(&bus, &mut scene, "door ceiling 60").success);
        assert!(!run(&bus, &mut scene, "window top").success);

        let room = scene.active_room().unwrap();
        assert_eq!(room.furniture().len(), 1);
        assert_eq!(room.windows().len(), 1);
        assert_eq!(room.doors().len(), 1);

        assert!(run(&bus, &mut scene, "room Office 200 200").success);
        assert!(run(&bus, &mut scene, "use 2").success);
        assert!(!run(&bus, &mut scene, "use 9").success);
        assert!(run(&bus, &mut scene, "drop-room").success);
        assert_eq!(scene.plan().rooms().len(), 1);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut scene = Scene::new();
        let bus = CommandBus::new();
        let response = run(&bus, &mut scene, "teleport 1 2");
        assert!(!response.success);
        assert_eq!(bus.usage_lines().len(), bus.available_commands().count());
    }
}
