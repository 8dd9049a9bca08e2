use crate::model::Theme;
use eframe::egui;

const VISUAL_LINE_WIDTH: f32 = 2.5;
const VISUAL_LINE_WIDTH_SELECTED: f32 = 4.0;
const VISUAL_ARROW_SIZE: f32 = 15.0;
const VISUAL_OUTLINE_WIDTH: f32 = 1.5;
/// Visual gap between arrow tip and the literal endpoint. The dark theme
/// needs more room to clear the rendered component plate.
const VISUAL_RETRACT_DARK: f32 = 10.0;
const VISUAL_RETRACT_LIGHT: f32 = 4.0;

/// Apparent (screen-space) stroke width of a connection line. Callers divide
/// by zoom to get the logical width, keeping the line the same on screen at
/// every zoom level.
pub fn stroke_width(selected: bool) -> f32 {
    if selected {
        VISUAL_LINE_WIDTH_SELECTED
    } else {
        VISUAL_LINE_WIDTH
    }
}

/// Arrowhead geometry in logical (document-space) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowGeometry {
    pub tip: egui::Pos2,
    pub left: egui::Pos2,
    pub right: egui::Pos2,
    /// Background-colored stroke drawn under the arrow to blank the line nose.
    pub eraser: [egui::Pos2; 2],
    pub eraser_width: f32,
    pub outline_width: f32,
}

/// Builds the arrowhead for the final path segment. All visual sizes are
/// divided by zoom so the arrow keeps constant apparent size; retraction is
/// skipped when the final segment is shorter than the retract distance.
/// Returns `None` for a zero-length final segment.
pub fn arrowhead(
    prev: egui::Pos2,
    end: egui::Pos2,
    zoom: f32,
    theme: Theme,
    selected: bool,
) -> Option<ArrowGeometry> {
    let v = end - prev;
    let len = v.length();
    if len <= 0.0 {
        return None;
    }
    let u = v / len;
    let zoom = zoom.max(0.1);

    let visual_retract = match theme {
        Theme::Dark => VISUAL_RETRACT_DARK,
        Theme::Light => VISUAL_RETRACT_LIGHT,
    };
    let mut retract = visual_retract / zoom;
    if len < retract {
        retract = 0.0;
    }
    let tip = end - u * retract;

    let size = VISUAL_ARROW_SIZE / zoom;
    let perp = egui::vec2(-u.y, u.x);
    let base = tip - u * size;
    Some(ArrowGeometry {
        tip,
        left: base + perp * (size / 2.5),
        right: base - perp * (size / 2.5),
        eraser: [tip, end],
        eraser_width: (stroke_width(selected) + 1.0) / zoom,
        outline_width: VISUAL_OUTLINE_WIDTH / zoom,
    })
}
