use crate::model::{self, CurveOp, GRIPS_PER_SIDE, GripRef, Side, Theme};
use crate::routing::arrow;
use eframe::egui;

use super::{Tool, View};

pub(super) fn tool_button(ui: &mut egui::Ui, label: &str, tool: Tool, selected: &mut Tool) {
    let active = *selected == tool;
    if ui.selectable_label(active, label).clicked() {
        *selected = tool;
    }
}

pub(super) fn canvas_fill(theme: Theme) -> egui::Color32 {
    match theme {
        Theme::Light => egui::Color32::from_gray(250),
        Theme::Dark => egui::Color32::from_rgb(18, 20, 26),
    }
}

fn grid_dot_color(theme: Theme) -> egui::Color32 {
    match theme {
        Theme::Light => egui::Color32::from_gray(200),
        Theme::Dark => egui::Color32::from_gray(55),
    }
}

fn component_fill(theme: Theme) -> egui::Color32 {
    match theme {
        Theme::Light => egui::Color32::WHITE,
        Theme::Dark => egui::Color32::from_rgb(32, 36, 46),
    }
}

fn component_stroke_color(theme: Theme, selected: bool) -> egui::Color32 {
    if selected {
        return selection_color(theme);
    }
    match theme {
        Theme::Light => egui::Color32::from_gray(60),
        Theme::Dark => egui::Color32::from_gray(140),
    }
}

fn label_color(theme: Theme) -> egui::Color32 {
    match theme {
        Theme::Light => egui::Color32::from_gray(30),
        Theme::Dark => egui::Color32::from_gray(220),
    }
}

fn line_color(theme: Theme, selected: bool) -> egui::Color32 {
    if selected {
        return selection_color(theme);
    }
    match theme {
        Theme::Light => egui::Color32::from_rgb(40, 40, 40),
        Theme::Dark => egui::Color32::from_gray(210),
    }
}

fn selection_color(theme: Theme) -> egui::Color32 {
    match theme {
        Theme::Light => egui::Color32::from_rgb(37, 99, 235),
        Theme::Dark => egui::Color32::from_rgb(96, 165, 250),
    }
}

/// Drafting-style dot grid: one dot per grid intersection,
/// hidden when zoomed out far enough that the dots would smear together.
pub(super) fn draw_background(
    painter: &egui::Painter,
    rect: egui::Rect,
    view: &View,
    theme: Theme,
    show_grid: bool,
    grid_spacing: f32,
) {
    painter.rect_filled(rect, 0.0, canvas_fill(theme));
    if !show_grid {
        return;
    }
    let spacing_screen = grid_spacing * view.zoom;
    if spacing_screen < 8.0 {
        return;
    }
    let color = grid_dot_color(theme);
    let start = rect.min + view.pan_screen;
    let x0 = ((rect.min.x - start.x) / spacing_screen).floor() * spacing_screen + start.x;
    let y0 = ((rect.min.y - start.y) / spacing_screen).floor() * spacing_screen + start.y;
    let mut y = y0;
    while y < rect.max.y {
        let mut x = x0;
        while x < rect.max.x {
            painter.circle_filled(egui::pos2(x, y), 1.0, color);
            x += spacing_screen;
        }
        y += spacing_screen;
    }
}

pub(super) fn draw_components(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    doc: &model::Document,
    theme: Theme,
    selected: Option<u64>,
) {
    for component in &doc.components {
        let is_selected = selected == Some(component.id);
        let world = component.rect.to_rect();
        let rect = egui::Rect::from_min_max(
            view.world_to_screen(origin, world.min),
            view.world_to_screen(origin, world.max),
        );
        painter.rect_filled(rect, 3.0, component_fill(theme));
        painter.rect_stroke(
            rect,
            3.0,
            egui::Stroke::new(
                if is_selected { 2.5 } else { 1.5 },
                component_stroke_color(theme, is_selected),
            ),
            egui::StrokeKind::Middle,
        );
        if !component.label.is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                &component.label,
                egui::FontId::proportional(14.0 * view.zoom),
                label_color(theme),
            );
        }
    }
}

/// Grip dots on every component edge, with the snap candidate emphasized.
pub(super) fn draw_grips(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    doc: &model::Document,
    theme: Theme,
    snap: Option<GripRef>,
) {
    const SIDES: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];
    for component in &doc.components {
        for side in SIDES {
            for index in 0..GRIPS_PER_SIDE {
                let Ok(world) = component.grip_point(side, index) else {
                    continue;
                };
                let screen = view.world_to_screen(origin, world);
                let is_snap = snap.is_some_and(|g| {
                    g.component == component.id && g.side == side && g.grip == index
                });
                if is_snap {
                    painter.circle_filled(screen, 6.0, selection_color(theme));
                } else {
                    painter.circle_filled(screen, 3.0, component_stroke_color(theme, false));
                }
            }
        }
    }
}

/// Flattens a compiled curve to screen-space points. Jump arcs are sampled
/// as short polylines; `dir` and the left-hand normal span the half-circle.
fn flatten_curve(
    curve: &model::RenderCurve,
    origin: egui::Pos2,
    view: &View,
) -> Vec<egui::Pos2> {
    const ARC_STEPS: usize = 12;
    let mut points = Vec::new();
    for op in &curve.ops {
        match op {
            CurveOp::MoveTo(p) | CurveOp::LineTo(p) => {
                points.push(view.world_to_screen(origin, *p));
            }
            CurveOp::Jump {
                center,
                dir,
                radius,
            } => {
                let n = egui::vec2(dir.y, -dir.x);
                for step in 0..=ARC_STEPS {
                    let theta = std::f32::consts::PI * step as f32 / ARC_STEPS as f32;
                    let world = *center - *dir * (*radius * theta.cos())
                        + n * (*radius * theta.sin());
                    points.push(view.world_to_screen(origin, world));
                }
            }
        }
    }
    points
}

pub(super) fn draw_connections(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    doc: &model::Document,
    theme: Theme,
) {
    for conn in &doc.connections {
        if conn.curve.is_empty() {
            continue;
        }
        let points = flatten_curve(&conn.curve, origin, view);
        if points.len() < 2 {
            continue;
        }
        let color = line_color(theme, conn.selected);
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(arrow::stroke_width(conn.selected), color),
        ));
        draw_arrowhead(painter, origin, view, conn, theme, color);
    }
}

/// Arrowhead over the final segment: an eraser stroke blanks the line nose,
/// then the filled triangle with a thin outline goes on top. All geometry
/// comes back in world coordinates and is converted per point so the arrow
/// keeps constant apparent size.
fn draw_arrowhead(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    conn: &model::Connection,
    theme: Theme,
    color: egui::Color32,
) {
    let n = conn.waypoints.len();
    if n < 2 {
        return;
    }
    let prev = conn
        .waypoints
        .iter()
        .rev()
        .skip(1)
        .find(|p| **p != conn.waypoints[n - 1]);
    let Some(prev) = prev else {
        return;
    };
    let Some(geom) = arrow::arrowhead(
        *prev,
        conn.waypoints[n - 1],
        view.zoom,
        theme,
        conn.selected,
    ) else {
        return;
    };

    let eraser = [
        view.world_to_screen(origin, geom.eraser[0]),
        view.world_to_screen(origin, geom.eraser[1]),
    ];
    painter.line_segment(
        eraser,
        egui::Stroke::new(geom.eraser_width * view.zoom, canvas_fill(theme)),
    );

    let triangle = vec![
        view.world_to_screen(origin, geom.tip),
        view.world_to_screen(origin, geom.left),
        view.world_to_screen(origin, geom.right),
    ];
    let outline = match theme {
        Theme::Light => egui::Color32::from_gray(20),
        Theme::Dark => egui::Color32::from_gray(240),
    };
    painter.add(egui::Shape::convex_polygon(
        triangle,
        color,
        egui::Stroke::new(geom.outline_width * view.zoom, outline),
    ));
}

/// Rubber-band outline while dragging out a new component.
pub(super) fn draw_component_preview(
    painter: &egui::Painter,
    origin: egui::Pos2,
    view: &View,
    theme: Theme,
    start: egui::Pos2,
    current: egui::Pos2,
) {
    let rect = egui::Rect::from_min_max(
        view.world_to_screen(origin, egui::pos2(start.x.min(current.x), start.y.min(current.y))),
        view.world_to_screen(origin, egui::pos2(start.x.max(current.x), start.y.max(current.y))),
    );
    painter.rect_stroke(
        rect,
        3.0,
        egui::Stroke::new(1.5, selection_color(theme)),
        egui::StrokeKind::Middle,
    );
}
