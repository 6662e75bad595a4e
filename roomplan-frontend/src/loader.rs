use std::env;
use std::path::{Path, PathBuf};

use roomplan_config::AppConfig;
use roomplan_core::collision;
use roomplan_core::geometry::Point2;
use roomplan_core::plan::Plan;
use roomplan_engine::scene::{DemoObjects, PlacementSettings, Scene};
use roomplan_io::{JsonFacade, PlanLoader, PlanSaver};
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 覆盖平面图路径的环境变量。
pub const PLAN_ENV_VAR: &str = "ROOMPLAN_CLI_PLAN";

/// 平面图来源，便于前端呈现加载信息。
#[derive(Debug, Clone)]
pub enum PlanSource {
    Json(PathBuf),
    Demo,
}

/// 统一封装加载后的场景与元信息。
#[derive(Debug)]
pub struct LoadedScene {
    pub scene: Scene,
    pub source: PlanSource,
    pub demo_objects: Option<DemoObjects>,
}

pub fn placement_settings(config: &AppConfig) -> PlacementSettings {
    PlacementSettings {
        max_room_width: config.canvas.max_width,
        max_room_height: config.canvas.max_height,
        spawn: Point2::new(config.placement.spawn_x, config.placement.spawn_y),
        opening_offset: config.placement.opening_offset,
        scan_step: config.placement.scan_step,
    }
}

pub fn read_plan(path: &Path) -> Result<Plan, FrontendError> {
    Ok(JsonFacade::new().load(path)?)
}

pub fn write_plan(plan: &Plan, path: &Path) -> Result<(), FrontendError> {
    Ok(JsonFacade::new().save(plan, path)?)
}

/// 平面图路径优先级：显式参数，环境变量 `ROOMPLAN_CLI_PLAN`，配置中的 `storage.plan_path`。
fn resolve_plan_path(config: &AppConfig, explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(PLAN_ENV_VAR).map(PathBuf::from))
        .or_else(|| config.storage.plan_path.clone())
}

/// 加载平面图，若未指定或加载失败则回退到内置演示房间。
pub fn load_scene(config: &AppConfig, explicit: Option<&Path>) -> LoadedScene {
    let mut scene = Scene::with_settings(placement_settings(config));

    if let Some(path) = resolve_plan_path(config, explicit) {
        match read_plan(&path) {
            Ok(plan) => {
                info!(path = %path.display(), rooms = plan.rooms().len(), "从 JSON 加载平面图成功");
                scene.load_plan(plan);
                report_illegal_placements(&scene);
                return LoadedScene {
                    scene,
                    source: PlanSource::Json(path),
                    demo_objects: None,
                };
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载平面图失败，回退到内置示例");
            }
        }
    }

    let demo_objects = match scene.populate_demo() {
        Ok(ids) => Some(ids),
        Err(err) => {
            warn!(error = %err, "构建演示房间失败");
            None
        }
    };
    LoadedScene {
        scene,
        source: PlanSource::Demo,
        demo_objects,
    }
}

/// 旧文件可能包含重叠或越界的家具，仅提示，不做修正。
fn report_illegal_placements(scene: &Scene) {
    for room in scene.plan().rooms() {
        let illegal = room
            .furniture()
            .iter()
            .filter(|f| !collision::is_valid_placement(f, room))
            .count();
        if illegal > 0 {
            warn!(room = room.id().get(), illegal, "平面图中存在非法放置的家具");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomplan_config::PlacementConfig;

    #[test]
    fn settings_follow_config() {
        let mut config = AppConfig::default();
        config.canvas.max_width = 1000.0;
        config.placement = PlacementConfig {
            spawn_x: 0.0,
            spawn_y: 5.0,
            opening_offset: 20.0,
            scan_step: 2.0,
        };
        let settings = placement_settings(&config);
        assert_eq!(settings.max_room_width, 1000.0);
        assert_eq!(settings.max_room_height, 600.0);
        assert_eq!(settings.spawn, Point2::new(0.0, 5.0));
        assert_eq!(settings.opening_offset, 20.0);
    }

    #[test]
    fn missing_plan_falls_back_to_demo() {
        let config = AppConfig::default();
        let loaded = load_scene(&config, Some(Path::new("/nonexistent/plan.json")));
        assert!(matches!(loaded.source, PlanSource::Demo));
        assert!(loaded.demo_objects.is_some());
        assert!(loaded.scene.active_room().is_some());
    }
}
