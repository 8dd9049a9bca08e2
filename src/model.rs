use eframe::egui;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RectF {
    pub min: Point,
    pub max: Point,
}

impl RectF {
    pub fn from_min_max(a: egui::Pos2, b: egui::Pos2) -> Self {
        let min = egui::pos2(a.x.min(b.x), a.y.min(b.y));
        let max = egui::pos2(a.x.max(b.x), a.y.max(b.y));
        Self {
            min: Point::from_pos2(min),
            max: Point::from_pos2(max),
        }
    }

    pub fn to_rect(self) -> egui::Rect {
        egui::Rect::from_min_max(self.min.to_pos2(), self.max.to_pos2())
    }

    pub fn is_valid(self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }
}

/// Which component edge a grip sits on. Screen coordinates, +y down.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn outward(self) -> egui::Vec2 {
        match self {
            Side::Top => egui::vec2(0.0, -1.0),
            Side::Bottom => egui::vec2(0.0, 1.0),
            Side::Left => egui::vec2(-1.0, 0.0),
            Side::Right => egui::vec2(1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Evenly spaced attachment points per component edge.
pub const GRIPS_PER_SIDE: u8 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum GripError {
    #[error("grip index {index} out of range for side {side:?} ({count} grips per side)")]
    GripOutOfRange { side: Side, index: u8, count: u8 },
    #[error("unknown component id {0}")]
    UnknownComponent(u64),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Component {
    pub id: u64,
    pub rect: RectF,
    #[serde(default)]
    pub label: String,
}

impl Component {
    /// Resolves a grip index on the given side to an absolute point.
    /// Grips sit at fractions 1/4, 2/4, 3/4 of the edge; index 1 is the midpoint.
    pub fn grip_point(&self, side: Side, index: u8) -> Result<egui::Pos2, GripError> {
        if index >= GRIPS_PER_SIDE {
            return Err(GripError::GripOutOfRange {
                side,
                index,
                count: GRIPS_PER_SIDE,
            });
        }
        let rect = self.rect.to_rect();
        let t = (index as f32 + 1.0) / (GRIPS_PER_SIDE as f32 + 1.0);
        let p = match side {
            Side::Top => egui::pos2(rect.min.x + rect.width() * t, rect.min.y),
            Side::Bottom => egui::pos2(rect.min.x + rect.width() * t, rect.max.y),
            Side::Left => egui::pos2(rect.min.x, rect.min.y + rect.height() * t),
            Side::Right => egui::pos2(rect.max.x, rect.min.y + rect.height() * t),
        };
        Ok(p)
    }
}

/// A grip on a component, addressed by stable component id rather than a live
/// reference, so deletion can never leave a dangling pointer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GripRef {
    pub component: u64,
    pub grip: u8,
    pub side: Side,
}

/// One drawable operation of a compiled connection curve.
///
/// `Jump` is a half-circle from `center - dir * radius` to
/// `center + dir * radius`, bulging toward the left-hand normal
/// `(dir.y, -dir.x)` of the travel direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CurveOp {
    MoveTo(egui::Pos2),
    LineTo(egui::Pos2),
    Jump {
        center: egui::Pos2,
        dir: egui::Vec2,
        radius: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderCurve {
    pub ops: Vec<CurveOp>,
}

impl RenderCurve {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    /// Creation sequence number, also the connection's identity. Jump priority
    /// is ordered by seq: a connection only jumps over smaller seqs.
    pub seq: u64,
    pub start: GripRef,
    pub end: Option<GripRef>,
    /// Hovered candidate target while dragging. Never persisted.
    pub snap: Option<GripRef>,
    /// Free end position while dragging. Never persisted.
    pub cursor: Point,
    pub path_offset: f32,
    pub start_adjust: f32,
    pub end_adjust: f32,
    pub selected: bool,
    /// Recomputed every frame by the planner. Never persisted.
    pub waypoints: Vec<egui::Pos2>,
    /// Recomputed every frame by the jump compositor. Never persisted.
    pub curve: RenderCurve,
}

impl Connection {
    pub fn new(seq: u64, start: GripRef) -> Self {
        Self {
            seq,
            start,
            end: None,
            snap: None,
            cursor: Point::default(),
            path_offset: 0.0,
            start_adjust: 0.0,
            end_adjust: 0.0,
            selected: false,
            waypoints: Vec::new(),
            curve: RenderCurve::default(),
        }
    }

    /// End-anchor precedence: bound end, then snap candidate.
    pub fn target_grip(&self) -> Option<&GripRef> {
        self.end.as_ref().or(self.snap.as_ref())
    }

    pub fn to_record(&self) -> ConnectionRecord {
        let (end_id, end_grip, end_side) = match &self.end {
            Some(g) => (g.component as i64, Some(g.grip), Some(g.side)),
            None => (-1, None, None),
        };
        ConnectionRecord {
            start_id: self.start.component as i64,
            start_grip: self.start.grip,
            start_side: self.start.side,
            end_id,
            end_grip,
            end_side,
            path_offset: self.path_offset,
            start_adjust: self.start_adjust,
            end_adjust: self.end_adjust,
        }
    }

    pub fn from_record(seq: u64, record: &ConnectionRecord) -> Option<Self> {
        if record.start_id < 0 {
            return None;
        }
        let mut conn = Self::new(
            seq,
            GripRef {
                component: record.start_id as u64,
                grip: record.start_grip,
                side: record.start_side,
            },
        );
        if record.end_id >= 0 {
            if let (Some(grip), Some(side)) = (record.end_grip, record.end_side) {
                conn.end = Some(GripRef {
                    component: record.end_id as u64,
                    grip,
                    side,
                });
            }
        }
        conn.path_offset = record.path_offset;
        conn.start_adjust = record.start_adjust;
        conn.end_adjust = record.end_adjust;
        Some(conn)
    }
}

/// Persisted form of a connection. Component references are integer ids;
/// an unbound end serializes as -1. Waypoints and curves are never saved.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConnectionRecord {
    pub start_id: i64,
    pub start_grip: u8,
    pub start_side: Side,
    pub end_id: i64,
    #[serde(default)]
    pub end_grip: Option<u8>,
    #[serde(default)]
    pub end_side: Option<Side>,
    pub path_offset: f32,
    pub start_adjust: f32,
    pub end_adjust: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub components: Vec<Component>,
    pub connections: Vec<Connection>,
}

impl Document {
    pub fn component(&self, id: u64) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: u64) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn connection(&self, seq: u64) -> Option<&Connection> {
        self.connections.iter().find(|c| c.seq == seq)
    }

    pub fn connection_mut(&mut self, seq: u64) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|c| c.seq == seq)
    }

    pub fn grip_point(&self, grip: &GripRef) -> Result<egui::Pos2, GripError> {
        let component = self
            .component(grip.component)
            .ok_or(GripError::UnknownComponent(grip.component))?;
        component.grip_point(grip.side, grip.grip)
    }

    /// Removes a component and every connection referencing it.
    pub fn remove_component(&mut self, id: u64) {
        self.components.retain(|c| c.id != id);
        self.connections.retain(|conn| {
            conn.start.component != id && conn.end.map_or(true, |e| e.component != id)
        });
    }

    pub fn remove_connection(&mut self, seq: u64) {
        self.connections.retain(|c| c.seq != seq);
    }
}

/// On-disk document. Only committed state is written; snap targets, free
/// cursor ends and all derived geometry are dropped.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SaveFile {
    pub components: Vec<Component>,
    pub connections: Vec<ConnectionRecord>,
}

impl SaveFile {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            components: doc.components.clone(),
            connections: doc.connections.iter().map(|c| c.to_record()).collect(),
        }
    }

    /// Seq numbers are re-derived from record order; records with an invalid
    /// start reference are dropped.
    pub fn into_document(self) -> Document {
        let connections = self
            .connections
            .iter()
            .enumerate()
            .filter_map(|(i, r)| Connection::from_record(i as u64 + 1, r))
            .collect();
        Document {
            components: self.components,
            connections,
        }
    }
}

pub fn distance_to_segment(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let ap = p - a;
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return (p - a).length();
    }
    let t = (ap.x * ab.x + ap.y * ab.y) / ab_len2;
    let t = t.clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: u64, x: f32, y: f32, w: f32, h: f32) -> Component {
        Component {
            id,
            rect: RectF::from_min_max(egui::pos2(x, y), egui::pos2(x + w, y + h)),
            label: String::new(),
        }
    }

    #[test]
    fn midpoint_grips() {
        let c = component(1, 0.0, 0.0, 40.0, 40.0);
        assert_eq!(c.grip_point(Side::Right, 1).unwrap(), egui::pos2(40.0, 20.0));
        assert_eq!(c.grip_point(Side::Left, 1).unwrap(), egui::pos2(0.0, 20.0));
        assert_eq!(c.grip_point(Side::Top, 1).unwrap(), egui::pos2(20.0, 0.0));
        assert_eq!(c.grip_point(Side::Bottom, 1).unwrap(), egui::pos2(20.0, 40.0));
    }

    #[test]
    fn grip_index_out_of_range_fails_fast() {
        let c = component(1, 0.0, 0.0, 40.0, 40.0);
        assert_eq!(
            c.grip_point(Side::Top, GRIPS_PER_SIDE),
            Err(GripError::GripOutOfRange {
                side: Side::Top,
                index: GRIPS_PER_SIDE,
                count: GRIPS_PER_SIDE,
            })
        );
    }

    #[test]
    fn unknown_component_reference() {
        let doc = Document::default();
        let grip = GripRef {
            component: 7,
            grip: 0,
            side: Side::Left,
        };
        assert_eq!(doc.grip_point(&grip), Err(GripError::UnknownComponent(7)));
    }

    #[test]
    fn unbound_end_serializes_as_sentinel() {
        let conn = Connection::new(
            1,
            GripRef {
                component: 3,
                grip: 2,
                side: Side::Bottom,
            },
        );
        let record = conn.to_record();
        assert_eq!(record.end_id, -1);
        assert_eq!(record.end_grip, None);
        assert_eq!(record.end_side, None);
    }

    #[test]
    fn snap_target_is_not_persisted() {
        let mut conn = Connection::new(
            1,
            GripRef {
                component: 3,
                grip: 0,
                side: Side::Right,
            },
        );
        conn.snap = Some(GripRef {
            component: 5,
            grip: 1,
            side: Side::Left,
        });
        assert_eq!(conn.to_record().end_id, -1);
    }

    #[test]
    fn record_round_trip() {
        let mut conn = Connection::new(
            9,
            GripRef {
                component: 1,
                grip: 0,
                side: Side::Right,
            },
        );
        conn.end = Some(GripRef {
            component: 2,
            grip: 1,
            side: Side::Left,
        });
        conn.path_offset = -4.0;
        conn.start_adjust = 12.5;
        conn.end_adjust = -30.0;
        conn.waypoints = vec![egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)];

        let record = conn.to_record();
        let restored = Connection::from_record(9, &record).unwrap();
        assert_eq!(restored.start, conn.start);
        assert_eq!(restored.end, conn.end);
        assert_eq!(restored.path_offset, conn.path_offset);
        assert_eq!(restored.start_adjust, conn.start_adjust);
        assert_eq!(restored.end_adjust, conn.end_adjust);
        // derived state is recomputed, never restored
        assert!(restored.waypoints.is_empty());
        assert!(restored.curve.is_empty());
    }

    #[test]
    fn save_file_rederives_seq_from_order() {
        let mut doc = Document {
            components: vec![
                component(1, 0.0, 0.0, 40.0, 40.0),
                component(2, 100.0, 0.0, 40.0, 40.0),
            ],
            connections: Vec::new(),
        };
        for seq in [4, 9] {
            let mut conn = Connection::new(
                seq,
                GripRef {
                    component: 1,
                    grip: 1,
                    side: Side::Right,
                },
            );
            conn.end = Some(GripRef {
                component: 2,
                grip: 1,
                side: Side::Left,
            });
            doc.connections.push(conn);
        }

        let json = serde_json::to_string(&SaveFile::from_document(&doc)).unwrap();
        let restored: SaveFile = serde_json::from_str(&json).unwrap();
        let doc = restored.into_document();
        let seqs: Vec<u64> = doc.connections.iter().map(|c| c.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn component_delete_cascades_to_connections() {
        let mut doc = Document {
            components: vec![
                component(1, 0.0, 0.0, 40.0, 40.0),
                component(2, 100.0, 0.0, 40.0, 40.0),
                component(3, 200.0, 0.0, 40.0, 40.0),
            ],
            connections: Vec::new(),
        };
        let mut a = Connection::new(
            1,
            GripRef {
                component: 1,
                grip: 1,
                side: Side::Right,
            },
        );
        a.end = Some(GripRef {
            component: 2,
            grip: 1,
            side: Side::Left,
        });
        let mut b = Connection::new(
            2,
            GripRef {
                component: 2,
                grip: 1,
                side: Side::Right,
            },
        );
        b.end = Some(GripRef {
            component: 3,
            grip: 1,
            side: Side::Left,
        });
        let c = Connection::new(
            3,
            GripRef {
                component: 3,
                grip: 0,
                side: Side::Top,
            },
        );
        doc.connections.extend([a, b, c]);

        doc.remove_component(2);
        let seqs: Vec<u64> = doc.connections.iter().map(|c| c.seq).collect();
        assert_eq!(seqs, vec![3]);
        assert_eq!(doc.components.len(), 2);
    }
}
