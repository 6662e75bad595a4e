use std::fmt::Write;

use roomplan_core::opening::{Opening, OpeningKind};
use roomplan_core::room::Room;
use roomplan_engine::controller::SelectionTarget;
use roomplan_engine::scene::Scene;

fn marker(selected: bool) -> &'static str {
    if selected { "*" } else { " " }
}

/// 渲染场景中的活动房间。
pub fn render_scene(scene: &Scene) -> String {
    match scene.active_room() {
        Some(room) => render_room(room, scene.selection()),
        None => "没有活动房间。\n".to_string(),
    }
}

/// 以文本描述房间内容，选中对象以 `*` 标记。
pub fn render_room(room: &Room, selection: Option<SelectionTarget>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "房间 #{} {} ({:.0} x {:.0})",
        room.id(),
        room.name(),
        room.width(),
        room.height()
    );

    let _ = writeln!(out, "家具:");
    if room.furniture().is_empty() {
        let _ = writeln!(out, "    (无)");
    }
    for furniture in room.furniture() {
        let rect = &furniture.rect;
        let selected = selection == Some(SelectionTarget::Furniture(furniture.id));
        let _ = writeln!(
            out,
            "  {} #{} {} 位置=({:.2}, {:.2}) 尺寸={:.2}x{:.2} 旋转={}° 颜色={}",
            marker(selected),
            furniture.id,
            furniture.name,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            rect.rotation,
            furniture.color
        );
        if !rect.is_unrotated() {
            let corners: Vec<String> = rect
                .corners()
                .iter()
                .map(|c| format!("({:.2}, {:.2})", c.x(), c.y()))
                .collect();
            let _ = writeln!(out, "      角点: {}", corners.join(", "));
        }
    }

    for kind in [OpeningKind::Window, OpeningKind::Door] {
        let _ = writeln!(out, "{}:", heading(kind));
        let openings = room.openings(kind);
        if openings.is_empty() {
            let _ = writeln!(out, "    (无)");
        }
        for opening in openings {
            let target = match kind {
                OpeningKind::Window => SelectionTarget::Window(opening.id),
                OpeningKind::Door => SelectionTarget::Door(opening.id),
            };
            write_opening(&mut out, room, opening, kind, selection == Some(target));
        }
    }
    out
}

fn heading(kind: OpeningKind) -> &'static str {
    match kind {
        OpeningKind::Window => "窗",
        OpeningKind::Door => "门",
    }
}

fn write_opening(out: &mut String, room: &Room, opening: &Opening, kind: OpeningKind, selected: bool) {
    let _ = write!(
        out,
        "  {} #{} {} 墙 位置={:.2} 宽度={:.2}",
        marker(selected),
        opening.id,
        opening.wall.name(),
        opening.position,
        opening.width
    );
    if kind == OpeningKind::Door {
        let swing = opening.swing(room.width(), room.height());
        let _ = write!(
            out,
            " 铰链=({:.2}, {:.2}) 开向=({}, {}) 半径={:.2}",
            swing.hinge.x(),
            swing.hinge.y(),
            swing.direction.x(),
            swing.direction.y(),
            swing.radius
        );
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomplan_core::geometry::{PlacedRect, Point2};
    use roomplan_core::opening::Wall;

    #[test]
    fn render_marks_selection_and_lists_openings() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo().unwrap();
        scene.pointer_down(Point2::new(20.0, 20.0));

        let text = render_scene(&scene);
        assert!(text.starts_with("房间 #1 Living Room (400 x 300)"));
        assert!(text.contains(&format!("* #{} Sofa", ids.sofa)));
        assert!(text.contains(&format!("  #{} Table", ids.table)));
        assert!(text.contains("top 墙 位置=50.00 宽度=100.00"));
        assert!(text.contains("铰链=(8.00, 50.00) 开向=(1, 0)"));
    }

    #[test]
    fn rotated_furniture_lists_corners() {
        let mut scene = Scene::new();
        scene.create_room("Den", 400.0, 300.0).unwrap();
        scene
            .place_furniture("Bed", PlacedRect::new(100.0, 100.0, 100.0, 50.0).with_rotation(90.0))
            .unwrap();
        scene.add_door(Wall::Right, 60.0).unwrap();
        let text = render_scene(&scene);
        assert!(text.contains("旋转=90°"));
        assert!(text.contains("角点: (175.00, 75.00)"));
        assert!(text.contains("窗:\n    (无)"));
    }

    #[test]
    fn empty_scene_has_no_room() {
        assert_eq!(render_scene(&Scene::new()), "没有活动房间。\n");
    }
}
