use crate::model::Side;
use eframe::egui;

/// Base stub length leaving the start grip before user adjustment.
pub const BASE_START_STUB: f32 = 30.0;
/// Base stub length entering the end grip before user adjustment.
pub const BASE_END_STUB: f32 = 20.0;
/// Stubs never shrink below this, so they cannot invert into the component.
pub const MIN_STUB: f32 = 10.0;
/// Margin added to the union bounding box for detours and U-turns.
const DETOUR_MARGIN: f32 = 20.0;

/// Resolved endpoint state for one planning pass. Pure input; the planner
/// never touches components directly.
#[derive(Clone, Copy, Debug)]
pub struct PlanRequest {
    pub start_point: egui::Pos2,
    pub start_side: Side,
    pub start_rect: egui::Rect,
    pub end_point: egui::Pos2,
    /// Bound or snap side; `None` while dragging over empty space.
    pub end_side: Option<Side>,
    /// Target bounding box; [`PlanRequest::free_end_rect`] while unbound.
    pub end_rect: egui::Rect,
    pub start_adjust: f32,
    pub end_adjust: f32,
    pub path_offset: f32,
}

impl PlanRequest {
    /// Fake bounding box used while the end is a free cursor position.
    pub fn free_end_rect(end_point: egui::Pos2) -> egui::Rect {
        egui::Rect::from_center_size(end_point, egui::vec2(20.0, 20.0))
    }
}

/// Computes the orthogonal waypoint route for one connection.
///
/// The result always starts at the start anchor and ends at the end anchor
/// and has length >= 2. Degenerate zero-length segments are permitted; the
/// jump compositor skips them.
pub fn plan(req: &PlanRequest) -> Vec<egui::Pos2> {
    let start = req.start_point;
    let end = req.end_point;
    let srect = req.start_rect;
    let erect = req.end_rect;

    let off_start = MIN_STUB.max(BASE_START_STUB + req.start_adjust);
    let off_end = MIN_STUB.max(BASE_END_STUB + req.end_adjust);
    let off_mid = DETOUR_MARGIN + req.path_offset;

    let target = req.end_side.unwrap_or_else(|| guess_approach_side(start, end));

    let ns = start + req.start_side.outward() * off_start;
    let pe = end + target.outward() * off_end;

    let mut points = vec![start];
    match (req.start_side, target) {
        (Side::Right, Side::Left) => {
            if start.x + off_start < end.x - off_end {
                let mid_x = (start.x + end.x) / 2.0 + req.path_offset;
                points.push(egui::pos2(mid_x, start.y));
                points.push(egui::pos2(mid_x, end.y));
            } else {
                // overlapping or too close: route below the lowest component
                let y = srect.max.y.max(erect.max.y) + off_mid;
                points.push(ns);
                points.push(egui::pos2(ns.x, y));
                points.push(egui::pos2(pe.x, y));
                points.push(pe);
            }
        }
        (Side::Left, Side::Right) => {
            if start.x - off_start > end.x + off_end {
                let mid_x = (start.x + end.x) / 2.0 + req.path_offset;
                points.push(egui::pos2(mid_x, start.y));
                points.push(egui::pos2(mid_x, end.y));
            } else {
                let y = srect.max.y.max(erect.max.y) + off_mid;
                points.push(ns);
                points.push(egui::pos2(ns.x, y));
                points.push(egui::pos2(pe.x, y));
                points.push(pe);
            }
        }
        (Side::Top, Side::Bottom) => {
            if start.y - off_start > end.y + off_end {
                let mid_y = (start.y + end.y) / 2.0 + req.path_offset;
                points.push(egui::pos2(start.x, mid_y));
                points.push(egui::pos2(end.x, mid_y));
            } else {
                // route around the right of both components
                let x = srect.max.x.max(erect.max.x) + off_mid;
                points.push(ns);
                points.push(egui::pos2(x, ns.y));
                points.push(egui::pos2(x, pe.y));
                points.push(pe);
            }
        }
        (Side::Bottom, Side::Top) => {
            if start.y + off_start < end.y - off_end {
                let mid_y = (start.y + end.y) / 2.0 + req.path_offset;
                points.push(egui::pos2(start.x, mid_y));
                points.push(egui::pos2(end.x, mid_y));
            } else {
                let x = srect.max.x.max(erect.max.x) + off_mid;
                points.push(ns);
                points.push(egui::pos2(x, ns.y));
                points.push(egui::pos2(x, pe.y));
                points.push(pe);
            }
        }
        // perpendicular sides: single L bend between the two stubs
        (Side::Left | Side::Right, Side::Top | Side::Bottom) => {
            points.push(ns);
            points.push(egui::pos2(ns.x, pe.y));
            points.push(pe);
        }
        (Side::Top | Side::Bottom, Side::Left | Side::Right) => {
            points.push(ns);
            points.push(egui::pos2(pe.x, ns.y));
            points.push(pe);
        }
        // same-side U-turns: detour around the union bounding box
        (Side::Right, Side::Right) => {
            let x = srect.max.x.max(erect.max.x) + off_mid;
            points.push(ns);
            points.push(egui::pos2(x, ns.y));
            points.push(egui::pos2(x, pe.y));
            points.push(pe);
        }
        (Side::Left, Side::Left) => {
            let x = srect.min.x.min(erect.min.x) - off_mid;
            points.push(ns);
            points.push(egui::pos2(x, ns.y));
            points.push(egui::pos2(x, pe.y));
            points.push(pe);
        }
        (Side::Top, Side::Top) => {
            let y = srect.min.y.min(erect.min.y) - off_mid;
            points.push(ns);
            points.push(egui::pos2(ns.x, y));
            points.push(egui::pos2(pe.x, y));
            points.push(pe);
        }
        (Side::Bottom, Side::Bottom) => {
            let y = srect.max.y.max(erect.max.y) + off_mid;
            points.push(ns);
            points.push(egui::pos2(ns.x, y));
            points.push(egui::pos2(pe.x, y));
            points.push(pe);
        }
    }
    points.push(end);
    points
}

/// Guesses the entry side of a free end from the dominant travel axis.
/// Returns the side of the target facing the start.
fn guess_approach_side(start: egui::Pos2, end: egui::Pos2) -> Side {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Side::Left } else { Side::Right }
    } else if dy > 0.0 {
        Side::Top
    } else {
        Side::Bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> egui::Rect {
        egui::Rect::from_min_size(egui::pos2(x, y), egui::vec2(w, h))
    }

    fn side_midpoint(r: egui::Rect, side: Side) -> egui::Pos2 {
        match side {
            Side::Top => egui::pos2(r.center().x, r.min.y),
            Side::Bottom => egui::pos2(r.center().x, r.max.y),
            Side::Left => egui::pos2(r.min.x, r.center().y),
            Side::Right => egui::pos2(r.max.x, r.center().y),
        }
    }

    fn request(
        start_rect: egui::Rect,
        start_side: Side,
        end_rect: egui::Rect,
        end_side: Side,
    ) -> PlanRequest {
        PlanRequest {
            start_point: side_midpoint(start_rect, start_side),
            start_side,
            start_rect,
            end_point: side_midpoint(end_rect, end_side),
            end_side: Some(end_side),
            end_rect,
            start_adjust: 0.0,
            end_adjust: 0.0,
            path_offset: 0.0,
        }
    }

    #[rstest]
    #[case(Side::Top, Side::Top)]
    #[case(Side::Top, Side::Bottom)]
    #[case(Side::Top, Side::Left)]
    #[case(Side::Top, Side::Right)]
    #[case(Side::Bottom, Side::Top)]
    #[case(Side::Bottom, Side::Bottom)]
    #[case(Side::Bottom, Side::Left)]
    #[case(Side::Bottom, Side::Right)]
    #[case(Side::Left, Side::Top)]
    #[case(Side::Left, Side::Bottom)]
    #[case(Side::Left, Side::Left)]
    #[case(Side::Left, Side::Right)]
    #[case(Side::Right, Side::Top)]
    #[case(Side::Right, Side::Bottom)]
    #[case(Side::Right, Side::Left)]
    #[case(Side::Right, Side::Right)]
    fn route_spans_resolved_anchors(#[case] start_side: Side, #[case] end_side: Side) {
        let req = request(
            rect(0.0, 0.0, 40.0, 40.0),
            start_side,
            rect(200.0, 160.0, 40.0, 40.0),
            end_side,
        );
        let points = plan(&req);
        assert!(points.len() >= 2);
        assert_eq!(points[0], req.start_point);
        assert_eq!(*points.last().unwrap(), req.end_point);
    }

    #[test]
    fn direct_path_through_shared_midline() {
        // clearance 40 + 30 < 200 - 20 holds, so the planner takes the
        // two-bend midline route at mid_x = 120
        let req = request(
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
            rect(200.0, 0.0, 40.0, 40.0),
            Side::Left,
        );
        let points = plan(&req);
        assert_eq!(
            points,
            vec![
                egui::pos2(40.0, 20.0),
                egui::pos2(120.0, 20.0),
                egui::pos2(120.0, 20.0),
                egui::pos2(200.0, 20.0),
            ]
        );
    }

    #[test]
    fn clearance_test_is_mirror_symmetric() {
        let forward = request(
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
            rect(200.0, 0.0, 40.0, 40.0),
            Side::Left,
        );
        let backward = request(
            rect(200.0, 0.0, 40.0, 40.0),
            Side::Left,
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
        );
        let mut reversed = plan(&backward);
        reversed.reverse();
        assert_eq!(plan(&forward), reversed);
    }

    #[test]
    fn u_turn_detours_around_union_bounding_box() {
        let req = request(
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
            rect(200.0, 0.0, 40.0, 40.0),
            Side::Right,
        );
        let points = plan(&req);
        // detour x is exactly max(right edges) + 20
        assert_eq!(points[2].x, 260.0);
        assert_eq!(points[3].x, 260.0);
        assert_eq!(points[0], egui::pos2(40.0, 20.0));
        assert_eq!(*points.last().unwrap(), egui::pos2(240.0, 20.0));
    }

    #[rstest]
    #[case(-21.0)]
    #[case(-50.0)]
    #[case(-1000.0)]
    fn stub_clamp_keeps_first_segment_usable(#[case] start_adjust: f32) {
        let mut req = request(
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
            rect(200.0, 0.0, 40.0, 40.0),
            Side::Right,
        );
        req.start_adjust = start_adjust;
        let points = plan(&req);
        let first_len = (points[1] - points[0]).length();
        assert_eq!(first_len, 10.0);
    }

    #[test]
    fn overlapping_opposite_sides_route_below_union() {
        // end component sits on top of the start component's stub zone
        let req = request(
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
            rect(30.0, 10.0, 40.0, 40.0),
            Side::Left,
        );
        let points = plan(&req);
        assert_eq!(points.len(), 6);
        // detour runs at max(bottom edges) + 20
        assert_eq!(points[2].y, 70.0);
        assert_eq!(points[3].y, 70.0);
    }

    #[test]
    fn mid_offset_shifts_the_midline() {
        let mut req = request(
            rect(0.0, 0.0, 40.0, 40.0),
            Side::Right,
            rect(200.0, 0.0, 40.0, 40.0),
            Side::Left,
        );
        req.path_offset = 15.0;
        let points = plan(&req);
        assert_eq!(points[1].x, 135.0);
        assert_eq!(points[2].x, 135.0);
    }

    #[test]
    fn free_end_guesses_facing_side() {
        // horizontal travel dominates, cursor is to the right: enter from the left
        let start_rect = rect(0.0, 0.0, 40.0, 40.0);
        let cursor = egui::pos2(300.0, 30.0);
        let req = PlanRequest {
            start_point: side_midpoint(start_rect, Side::Right),
            start_side: Side::Right,
            start_rect,
            end_point: cursor,
            end_side: None,
            end_rect: PlanRequest::free_end_rect(cursor),
            start_adjust: 0.0,
            end_adjust: 0.0,
            path_offset: 0.0,
        };
        let points = plan(&req);
        assert_eq!(points[0], egui::pos2(40.0, 20.0));
        assert_eq!(*points.last().unwrap(), cursor);
        // direct midline route, so the guess resolved to Side::Left
        assert_eq!(points.len(), 4);
        assert_eq!(points[1].x, 170.0);
    }

    #[test]
    fn free_end_guesses_vertical_side() {
        let start_rect = rect(0.0, 0.0, 40.0, 40.0);
        let cursor = egui::pos2(30.0, 300.0);
        let req = PlanRequest {
            start_point: side_midpoint(start_rect, Side::Bottom),
            start_side: Side::Bottom,
            start_rect,
            end_point: cursor,
            end_side: None,
            end_rect: PlanRequest::free_end_rect(cursor),
            start_adjust: 0.0,
            end_adjust: 0.0,
            path_offset: 0.0,
        };
        let points = plan(&req);
        // downward travel dominates: target guessed as Side::Top, direct route
        assert_eq!(points.len(), 4);
        assert_eq!(points[1].y, 170.0);
        assert_eq!(*points.last().unwrap(), cursor);
    }
}
