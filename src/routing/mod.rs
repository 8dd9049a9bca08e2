use crate::model::{Connection, Document, RenderCurve};
use eframe::egui;

pub mod arrow;
pub mod jump;
pub mod plan;

/// Builds the planner input for one connection by resolving grips against the
/// component arena. Returns `None` when the start grip cannot be resolved;
/// an unresolvable bound end degrades to the free cursor position.
fn plan_request(doc: &Document, conn: &Connection) -> Option<plan::PlanRequest> {
    let start_point = match doc.grip_point(&conn.start) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("connection {}: start grip unresolvable: {e}", conn.seq);
            return None;
        }
    };
    let start_rect = doc.component(conn.start.component)?.rect.to_rect();

    let (end_point, end_side, end_rect) = match conn.target_grip() {
        Some(grip) => {
            let resolved = doc
                .grip_point(grip)
                .ok()
                .zip(doc.component(grip.component));
            match resolved {
                Some((p, c)) => (p, Some(grip.side), c.rect.to_rect()),
                None => {
                    log::warn!(
                        "connection {}: end grip unresolvable, routing to cursor",
                        conn.seq
                    );
                    let cursor = conn.cursor.to_pos2();
                    (cursor, None, plan::PlanRequest::free_end_rect(cursor))
                }
            }
        }
        None => {
            let cursor = conn.cursor.to_pos2();
            (cursor, None, plan::PlanRequest::free_end_rect(cursor))
        }
    };

    Some(plan::PlanRequest {
        start_point,
        start_side: conn.start.side,
        start_rect,
        end_point,
        end_side,
        end_rect,
        start_adjust: conn.start_adjust,
        end_adjust: conn.end_adjust,
        path_offset: conn.path_offset,
    })
}

/// Recomputes all derived connection geometry for the current frame.
///
/// Strict two-pass update: every connection is planned before any connection
/// composes its jump curve, so crossing detection never reads a stale sibling
/// route regardless of traversal order. Safe to call repeatedly per frame.
pub fn refresh(doc: &mut Document) {
    let planned: Vec<Vec<egui::Pos2>> = doc
        .connections
        .iter()
        .map(|conn| {
            plan_request(doc, conn)
                .map(|req| plan::plan(&req))
                .unwrap_or_default()
        })
        .collect();
    for (conn, waypoints) in doc.connections.iter_mut().zip(planned) {
        conn.waypoints = waypoints;
    }

    let curves: Vec<RenderCurve> = doc
        .connections
        .iter()
        .map(|conn| {
            let siblings: Vec<jump::SiblingPath<'_>> = doc
                .connections
                .iter()
                .filter(|other| other.seq != conn.seq)
                .map(|other| jump::SiblingPath {
                    seq: other.seq,
                    waypoints: &other.waypoints,
                })
                .collect();
            jump::compose(&conn.waypoints, conn.seq, &siblings)
        })
        .collect();
    for (conn, curve) in doc.connections.iter_mut().zip(curves) {
        conn.curve = curve;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, CurveOp, GripRef, Point, RectF, Side};

    fn component(id: u64, x: f32, y: f32) -> Component {
        Component {
            id,
            rect: RectF::from_min_max(egui::pos2(x, y), egui::pos2(x + 40.0, y + 40.0)),
            label: String::new(),
        }
    }

    fn bound(seq: u64, from: (u64, Side), to: (u64, Side)) -> Connection {
        let mut conn = Connection::new(
            seq,
            GripRef {
                component: from.0,
                grip: 1,
                side: from.1,
            },
        );
        conn.end = Some(GripRef {
            component: to.0,
            grip: 1,
            side: to.1,
        });
        conn
    }

    fn jump_count(conn: &Connection) -> usize {
        conn.curve
            .ops
            .iter()
            .filter(|op| matches!(op, CurveOp::Jump { .. }))
            .count()
    }

    /// Two bound connections crossing once: a horizontal run at y = 60 and a
    /// vertical run at x = 100.
    fn crossing_doc() -> Document {
        Document {
            components: vec![
                component(1, 0.0, 40.0),
                component(2, 200.0, 40.0),
                component(3, 80.0, -80.0),
                component(4, 80.0, 120.0),
            ],
            connections: vec![
                bound(1, (1, Side::Right), (2, Side::Left)),
                bound(2, (3, Side::Bottom), (4, Side::Top)),
            ],
        }
    }

    #[test]
    fn later_connection_hops_over_earlier() {
        let mut doc = crossing_doc();
        refresh(&mut doc);

        let earlier = doc.connection(1).unwrap();
        let later = doc.connection(2).unwrap();
        assert_eq!(jump_count(earlier), 0);
        assert_eq!(jump_count(later), 1);
        let center = later
            .curve
            .ops
            .iter()
            .find_map(|op| match op {
                CurveOp::Jump { center, .. } => Some(*center),
                _ => None,
            })
            .unwrap();
        assert_eq!(center, egui::pos2(100.0, 60.0));
    }

    #[test]
    fn jump_ownership_ignores_container_order() {
        let mut doc = crossing_doc();
        doc.connections.reverse();
        refresh(&mut doc);

        assert_eq!(jump_count(doc.connection(1).unwrap()), 0);
        assert_eq!(jump_count(doc.connection(2).unwrap()), 1);
    }

    #[test]
    fn refresh_is_idempotent() {
        let mut doc = crossing_doc();
        refresh(&mut doc);
        let once = doc.clone();
        refresh(&mut doc);
        assert_eq!(doc, once);
    }

    #[test]
    fn waypoints_span_resolved_anchors() {
        let mut doc = crossing_doc();
        refresh(&mut doc);
        let conn = doc.connection(1).unwrap();
        assert_eq!(conn.waypoints.first(), Some(&egui::pos2(40.0, 60.0)));
        assert_eq!(conn.waypoints.last(), Some(&egui::pos2(200.0, 60.0)));
    }

    #[test]
    fn unresolvable_start_degrades_to_empty() {
        let mut doc = crossing_doc();
        doc.connections.push(bound(3, (99, Side::Right), (2, Side::Left)));
        refresh(&mut doc);

        let broken = doc.connection(3).unwrap();
        assert!(broken.waypoints.is_empty());
        assert!(broken.curve.is_empty());
        // the rest of the frame is unaffected
        assert_eq!(jump_count(doc.connection(2).unwrap()), 1);
    }

    #[test]
    fn unresolvable_end_routes_to_cursor() {
        let mut doc = crossing_doc();
        let mut conn = bound(3, (1, Side::Bottom), (99, Side::Top));
        conn.cursor = Point { x: 20.0, y: 200.0 };
        doc.connections.push(conn);
        refresh(&mut doc);

        let conn = doc.connection(3).unwrap();
        assert_eq!(conn.waypoints.last(), Some(&egui::pos2(20.0, 200.0)));
    }

    #[test]
    fn snap_target_outranks_cursor() {
        let mut doc = crossing_doc();
        let mut conn = Connection::new(
            3,
            GripRef {
                component: 1,
                grip: 1,
                side: Side::Right,
            },
        );
        conn.snap = Some(GripRef {
            component: 2,
            grip: 1,
            side: Side::Left,
        });
        conn.cursor = Point { x: 500.0, y: 500.0 };
        doc.connections.push(conn);
        refresh(&mut doc);

        let conn = doc.connection(3).unwrap();
        assert_eq!(conn.waypoints.last(), Some(&egui::pos2(200.0, 60.0)));
    }
}
