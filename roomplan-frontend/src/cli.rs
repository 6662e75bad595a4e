use std::io::{BufRead, Write};
use std::path::Path;

use roomplan_engine::command::{CommandBus, CommandContext, CommandRequest, CommandResponse};
use roomplan_engine::scene::Scene;
use tracing::{debug, info, warn};

use crate::errors::FrontendError;
use crate::loader::{LoadedScene, PlanSource, read_plan, write_plan};
use crate::render::render_scene;

/// 演示脚本：每一步是说明文字加若干条会话命令，坐标对应内置演示房间。
const DEMO_SCRIPT: &[(&str, &[&str])] = &[
    (
        "合法拖拽：把桌子移到空地",
        &["down 220 140", "move 170 160", "up"],
    ),
    (
        "拖入碰撞：桌子撞上沙发后松开，停在最后一个合法位置",
        &["down 170 160", "move 140 150", "move 60 30", "up"],
    ),
    (
        "贴墙旋转：书架旋转后会越出房间，保持原角度",
        &["down 360 200", "up", "rotate cw"],
    ),
    (
        "窗拖过墙端：超出部分被拒绝，窗停在墙内",
        &["down 100 4", "move 300 4", "move 380 4", "up", "deselect"],
    ),
];

/// 会话读取一行后的去向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Quit,
}

/// 行式交互会话：引擎命令交给命令总线，存取与帮助等前端命令在这里处理。
pub struct CliSession {
    scene: Scene,
    bus: CommandBus,
}

impl CliSession {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            bus: CommandBus::new(),
        }
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    pub fn execute_line<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<SessionControl, FrontendError> {
        let line = line.trim();
        if line.starts_with('#') {
            return Ok(SessionControl::Continue);
        }
        let Some(request) = CommandRequest::parse(line) else {
            return Ok(SessionControl::Continue);
        };
        debug!(command = %request.name, args = ?request.args, "执行会话命令");

        let response = match request.name.as_str() {
            "quit" | "exit" => return Ok(SessionControl::Quit),
            "help" => {
                writeln!(out, "支持的命令：")?;
                for usage in self.bus.usage_lines() {
                    writeln!(out, "  {usage}")?;
                }
                writeln!(out, "  save PATH           保存平面图")?;
                writeln!(out, "  load PATH           加载平面图")?;
                writeln!(out, "  quit                退出")?;
                return Ok(SessionControl::Continue);
            }
            "save" => self.save(&request),
            "load" => self.load(&request),
            _ => {
                let mut context = CommandContext {
                    scene: &mut self.scene,
                };
                self.bus.dispatch(&request, &mut context)
            }
        };

        write_response(out, &response)?;
        if response.redraw {
            write!(out, "{}", render_scene(&self.scene))?;
        }
        Ok(SessionControl::Continue)
    }

    fn save(&self, request: &CommandRequest) -> CommandResponse {
        let Some(path) = request.args.first() else {
            return CommandResponse::err("缺少参数: path");
        };
        match write_plan(self.scene.plan(), Path::new(path)) {
            Ok(()) => {
                info!(path = %path, "平面图已保存");
                CommandResponse::ok(format!("已保存到 {path}"))
            }
            Err(err) => {
                warn!(path = %path, error = %err, "保存平面图失败");
                CommandResponse::err(err.to_string())
            }
        }
    }

    fn load(&mut self, request: &CommandRequest) -> CommandResponse {
        let Some(path) = request.args.first() else {
            return CommandResponse::err("缺少参数: path");
        };
        match read_plan(Path::new(path)) {
            Ok(plan) => {
                info!(path = %path, rooms = plan.rooms().len(), "平面图已加载");
                self.scene.load_plan(plan);
                CommandResponse::ok(format!("已从 {path} 加载")).with_redraw(true)
            }
            Err(err) => {
                warn!(path = %path, error = %err, "加载平面图失败");
                CommandResponse::err(err.to_string())
            }
        }
    }
}

fn write_response<W: Write>(out: &mut W, response: &CommandResponse) -> std::io::Result<()> {
    let message = response.message.as_deref().unwrap_or("");
    if response.success {
        writeln!(out, "[命令] {message}")
    } else {
        writeln!(out, "[失败] {message}")
    }
}

/// 逐行读取命令直到输入结束或 `quit`，返回会话结束时的场景。
pub fn run_session<R: BufRead, W: Write>(
    scene: Scene,
    input: R,
    out: &mut W,
) -> Result<Scene, FrontendError> {
    let mut session = CliSession::new(scene);
    write!(out, "{}", render_scene(session.scene()))?;
    writeln!(out, "输入 help 查看命令。")?;

    for line in input.lines() {
        let line = line?;
        if session.execute_line(&line, out)? == SessionControl::Quit {
            break;
        }
    }
    info!("会话结束");
    Ok(session.into_scene())
}

/// 简易 CLI 演示：打印加载结果，若为内置房间则逐步执行演示脚本。
pub fn run_demo<W: Write>(loaded: LoadedScene, out: &mut W) -> Result<Scene, FrontendError> {
    writeln!(out, "房间布局校验 CLI 演示")?;
    match &loaded.source {
        PlanSource::Json(path) => writeln!(out, "已从 JSON 加载平面图：{}", path.display())?,
        PlanSource::Demo => writeln!(out, "使用内置演示房间")?,
    }

    let mut session = CliSession::new(loaded.scene);
    write!(out, "{}", render_scene(session.scene()))?;

    let Some(ids) = loaded.demo_objects else {
        writeln!(out, "演示脚本仅适用于内置房间，已跳过。")?;
        return Ok(session.into_scene());
    };
    writeln!(out, "演示对象：")?;
    writeln!(out, "  - 沙发 ID = {}", ids.sofa)?;
    writeln!(out, "  - 桌子 ID = {}", ids.table)?;
    writeln!(out, "  - 书架 ID = {}", ids.bookshelf)?;
    writeln!(out, "  - 窗 ID = {}", ids.window)?;
    writeln!(out, "  - 门 ID = {}", ids.door)?;

    for (index, (title, commands)) in DEMO_SCRIPT.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "== 步骤 {}: {title} ==", index + 1)?;
        for command in commands.iter() {
            writeln!(out, "> {command}")?;
            session.execute_line(command, out)?;
        }
    }
    info!(steps = DEMO_SCRIPT.len(), "演示脚本执行完毕");
    Ok(session.into_scene())
}
