use crate::model::{self, GRIPS_PER_SIDE, GripRef, Side};
use crate::routing::plan;
use eframe::egui;

use super::{ActiveDrag, FlowDeskApp, StubEnd, View};

const SIDES: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

impl FlowDeskApp {
    /// Topmost component under the pointer, if any.
    pub(super) fn component_at(&self, world: egui::Pos2) -> Option<u64> {
        self.doc
            .components
            .iter()
            .rev()
            .find(|c| c.rect.to_rect().contains(world))
            .map(|c| c.id)
    }

    /// Topmost connection whose routed polyline passes within `threshold`.
    pub(super) fn connection_at(&self, world: egui::Pos2, threshold: f32) -> Option<u64> {
        self.doc
            .connections
            .iter()
            .rev()
            .find(|conn| {
                conn.waypoints
                    .windows(2)
                    .any(|seg| model::distance_to_segment(world, seg[0], seg[1]) <= threshold)
            })
            .map(|conn| conn.seq)
    }

    /// Nearest grip within `threshold` of the pointer, topmost component first.
    pub(super) fn grip_at(&self, world: egui::Pos2, threshold: f32) -> Option<GripRef> {
        for component in self.doc.components.iter().rev() {
            for side in SIDES {
                for index in 0..GRIPS_PER_SIDE {
                    let Ok(p) = component.grip_point(side, index) else {
                        continue;
                    };
                    if (p - world).length() <= threshold {
                        return Some(GripRef {
                            component: component.id,
                            grip: index,
                            side,
                        });
                    }
                }
            }
        }
        None
    }

    /// World position and drag axis of a stub handle. The handle sits at the
    /// clamped stub distance outward from the grip; dragging along the axis
    /// grows the stub.
    fn stub_handle(&self, conn: &model::Connection, which: StubEnd) -> Option<(egui::Pos2, egui::Vec2)> {
        let (grip, base, adjust) = match which {
            StubEnd::Start => (&conn.start, plan::BASE_START_STUB, conn.start_adjust),
            StubEnd::End => (conn.end.as_ref()?, plan::BASE_END_STUB, conn.end_adjust),
        };
        let anchor = self.doc.grip_point(grip).ok()?;
        let off = plan::MIN_STUB.max(base + adjust);
        let axis = grip.side.outward();
        Some((anchor + axis * off, axis))
    }

    /// World position and drag axis of the middle-run handle. Only routes
    /// with a sliding middle segment expose one: the 4-point direct midline
    /// and the 6-point detour/U-turn shapes. The single L-bend has no free
    /// axis.
    fn mid_handle(&self, conn: &model::Connection) -> Option<(egui::Pos2, egui::Vec2)> {
        let end = conn.end.as_ref()?;
        let wps = &conn.waypoints;
        let (a, b, axis) = match wps.len() {
            4 => {
                let axis = if conn.start.side.is_horizontal() {
                    egui::vec2(1.0, 0.0)
                } else {
                    egui::vec2(0.0, 1.0)
                };
                (wps[1], wps[2], axis)
            }
            6 => {
                let axis = if conn.start.side == end.side {
                    conn.start.side.outward()
                } else if conn.start.side.is_horizontal() {
                    Side::Bottom.outward()
                } else {
                    Side::Right.outward()
                };
                (wps[2], wps[3], axis)
            }
            _ => return None,
        };
        Some((egui::pos2((a.x + b.x) / 2.0, (a.y + b.y) / 2.0), axis))
    }

    /// Draws and drives the three adjustment handles of the selected
    /// connection: start stub, end stub, middle run. Pointer deltas are
    /// projected onto each handle's axis.
    pub(super) fn interact_connection_handles(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        origin: egui::Pos2,
        view: &View,
        pointer_world: Option<egui::Pos2>,
        ctx: &egui::Context,
    ) {
        let Some(seq) = self.selected_connection else {
            return;
        };

        if let Some(drag) = &self.active_drag {
            match drag {
                ActiveDrag::StubAdjust {
                    seq,
                    which,
                    axis,
                    start_value,
                    start_pointer_world,
                } => {
                    if let Some(p) = pointer_world {
                        let value = *start_value + (p - *start_pointer_world).dot(*axis);
                        let which = *which;
                        let seq = *seq;
                        if let Some(conn) = self.doc.connection_mut(seq) {
                            match which {
                                StubEnd::Start => conn.start_adjust = value,
                                StubEnd::End => conn.end_adjust = value,
                            }
                        }
                    }
                }
                ActiveDrag::MidAdjust {
                    seq,
                    axis,
                    start_value,
                    start_pointer_world,
                } => {
                    if let Some(p) = pointer_world {
                        let value = *start_value + (p - *start_pointer_world).dot(*axis);
                        let seq = *seq;
                        if let Some(conn) = self.doc.connection_mut(seq) {
                            conn.path_offset = value;
                        }
                    }
                }
                _ => {}
            }
        }

        let Some(conn) = self.doc.connection(seq).cloned() else {
            return;
        };

        let handle_size_screen = 10.0;
        let handle_fill = egui::Color32::from_rgb(250, 250, 250);
        let handle_stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 160, 255));

        let stubs = [
            (StubEnd::Start, self.stub_handle(&conn, StubEnd::Start)),
            (StubEnd::End, self.stub_handle(&conn, StubEnd::End)),
        ];
        for (which, handle) in stubs {
            let Some((world, axis)) = handle else {
                continue;
            };
            let screen = view.world_to_screen(origin, world);
            let r = egui::Rect::from_center_size(
                screen,
                egui::vec2(handle_size_screen, handle_size_screen),
            );
            let id = ui.id().with(("stub", seq, which as u8));
            let resp = ui.interact(r, id, egui::Sense::drag());
            painter.rect_filled(r, 1.0, handle_fill);
            painter.rect_stroke(r, 1.0, handle_stroke, egui::StrokeKind::Middle);
            if resp.drag_started() {
                if let Some(p) = pointer_world {
                    self.push_undo();
                    let start_value = match which {
                        StubEnd::Start => conn.start_adjust,
                        StubEnd::End => conn.end_adjust,
                    };
                    self.active_drag = Some(ActiveDrag::StubAdjust {
                        seq,
                        which,
                        axis,
                        start_value,
                        start_pointer_world: p,
                    });
                }
            }
            if resp.drag_stopped() {
                self.active_drag = None;
            }
            if resp.hovered() || resp.dragged() {
                let icon = if axis.x.abs() > axis.y.abs() {
                    egui::CursorIcon::ResizeHorizontal
                } else {
                    egui::CursorIcon::ResizeVertical
                };
                ctx.set_cursor_icon(icon);
            }
        }

        if let Some((world, axis)) = self.mid_handle(&conn) {
            let screen = view.world_to_screen(origin, world);
            let id = ui.id().with(("mid", seq));
            let r = egui::Rect::from_center_size(
                screen,
                egui::vec2(handle_size_screen, handle_size_screen),
            );
            let resp = ui.interact(r, id, egui::Sense::drag());
            painter.add(egui::Shape::circle_filled(
                screen,
                handle_size_screen * 0.5,
                handle_fill,
            ));
            painter.add(egui::Shape::circle_stroke(
                screen,
                handle_size_screen * 0.5,
                handle_stroke,
            ));
            if resp.drag_started() {
                if let Some(p) = pointer_world {
                    self.push_undo();
                    self.active_drag = Some(ActiveDrag::MidAdjust {
                        seq,
                        axis,
                        start_value: conn.path_offset,
                        start_pointer_world: p,
                    });
                }
            }
            if resp.drag_stopped() {
                self.active_drag = None;
            }
            if resp.hovered() || resp.dragged() {
                let icon = if axis.x.abs() > axis.y.abs() {
                    egui::CursorIcon::ResizeHorizontal
                } else {
                    egui::CursorIcon::ResizeVertical
                };
                ctx.set_cursor_icon(icon);
            }
        }
    }
}
