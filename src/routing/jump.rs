use crate::model::{CurveOp, RenderCurve};
use eframe::egui;

/// Radius of the semicircular hop drawn over a crossing.
pub const JUMP_RADIUS: f32 = 6.0;
/// Segments shorter than this are skipped for crossing detection.
const MIN_SEGMENT: f32 = 0.1;
/// Crossings closer together than this many radii merge into one hop.
const MERGE_FACTOR: f32 = 2.2;

/// A sibling connection's planned route plus its stable creation order.
#[derive(Clone, Copy, Debug)]
pub struct SiblingPath<'a> {
    pub seq: u64,
    pub waypoints: &'a [egui::Pos2],
}

/// Compiles a waypoint polyline into a drawable curve with jump arcs over
/// every crossing this connection owns.
///
/// Ownership is strictly by creation order: a connection only yields (jumps)
/// over siblings with a smaller seq; earlier connections draw straight
/// through. With no siblings or no crossings the result is the raw polyline.
pub fn compose(waypoints: &[egui::Pos2], seq: u64, siblings: &[SiblingPath<'_>]) -> RenderCurve {
    let Some(first) = waypoints.first() else {
        return RenderCurve::default();
    };
    let r = JUMP_RADIUS;
    let mut ops = vec![CurveOp::MoveTo(*first)];

    for seg in waypoints.windows(2) {
        let (p1, p2) = (seg[0], seg[1]);
        let v = p2 - p1;
        let length = v.length();
        if length < MIN_SEGMENT {
            continue;
        }
        let u = v / length;

        let mut hits: Vec<f32> = Vec::new();
        for other in siblings {
            // earlier connections are authoritative and drawn straight through
            if other.seq >= seq {
                continue;
            }
            for oseg in other.waypoints.windows(2) {
                if let Some(p) = segment_intersection(p1, p2, oseg[0], oseg[1]) {
                    let dist = (p - p1).length();
                    // drop crossings too close to corners for a clean arc
                    if dist > r && dist < length - r {
                        hits.push(dist);
                    }
                }
            }
        }
        hits.sort_by(f32::total_cmp);

        // merge crossings too close together to fit separate arcs
        let mut crossings: Vec<f32> = Vec::new();
        for d in hits {
            match crossings.last() {
                Some(last) if d - last <= MERGE_FACTOR * r => {}
                _ => crossings.push(d),
            }
        }

        let mut current = 0.0;
        for dist in crossings {
            if dist - r > current {
                ops.push(CurveOp::LineTo(p1 + u * (dist - r)));
            }
            ops.push(CurveOp::Jump {
                center: p1 + u * dist,
                dir: u,
                radius: r,
            });
            current = dist + r;
        }
        if current < length {
            ops.push(CurveOp::LineTo(p2));
        }
    }
    RenderCurve { ops }
}

/// Bounded intersection of two segments, strictly inside both (endpoint
/// touches and collinear overlaps do not count as crossings).
fn segment_intersection(
    a1: egui::Pos2,
    a2: egui::Pos2,
    b1: egui::Pos2,
    b2: egui::Pos2,
) -> Option<egui::Pos2> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let diff = b1 - a1;
    let t = (diff.x * d2.y - diff.y * d2.x) / denom;
    let s = (diff.x * d1.y - diff.y * d1.x) / denom;
    const EPS: f32 = 1e-4;
    if t <= EPS || t >= 1.0 - EPS || s <= EPS || s >= 1.0 - EPS {
        return None;
    }
    Some(a1 + d1 * t)
}
