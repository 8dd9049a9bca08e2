use crate::model;
use crate::routing;
use eframe::egui;

use super::render::{
    draw_background, draw_component_preview, draw_components, draw_connections, draw_grips,
    tool_button,
};
use super::{ActiveDrag, FlowDeskApp, Tool};

impl eframe::App for FlowDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.theme {
            model::Theme::Light => ctx.set_visuals(egui::Visuals::light()),
            model::Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        }

        let wants_keyboard = ctx.wants_keyboard_input();
        ctx.input_mut(|i| {
            if i.consume_key(
                egui::Modifiers::COMMAND | egui::Modifiers::SHIFT,
                egui::Key::S,
            ) {
                self.save_dialog();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::S) {
                self.save_to_path();
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                self.open_dialog();
            }
            if !wants_keyboard {
                if i.consume_key(
                    egui::Modifiers::COMMAND | egui::Modifiers::SHIFT,
                    egui::Key::Z,
                ) || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y)
                {
                    self.redo();
                } else if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z) {
                    self.undo();
                }
                if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                    self.cancel_active_drag();
                    self.tool = Tool::Select;
                    self.tool_before_pan = None;
                }
                if i.consume_key(egui::Modifiers::NONE, egui::Key::Delete)
                    || i.consume_key(egui::Modifiers::NONE, egui::Key::Backspace)
                {
                    self.delete_selected();
                }
                if i.consume_key(egui::Modifiers::NONE, egui::Key::V) {
                    self.tool = Tool::Select;
                }
                if i.consume_key(egui::Modifiers::NONE, egui::Key::B) {
                    self.tool = Tool::Component;
                }
                if i.consume_key(egui::Modifiers::NONE, egui::Key::C) {
                    self.tool = Tool::Connect;
                }
                if i.consume_key(egui::Modifiers::NONE, egui::Key::G) {
                    self.show_grid = !self.show_grid;
                    self.persist_settings();
                }
            }
        });

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.new_document();
                        ui.close_menu();
                    }
                    if ui.button("Open… (⌘O)").clicked() {
                        self.open_dialog();
                        ui.close_menu();
                    }
                    if ui.button("Save (⌘S)").clicked() {
                        self.save_to_path();
                        ui.close_menu();
                    }
                    if ui.button("Save As… (⌘⇧S)").clicked() {
                        self.save_dialog();
                        ui.close_menu();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui.button("Undo (⌘Z)").clicked() {
                        self.undo();
                        ui.close_menu();
                    }
                    if ui.button("Redo (⌘⇧Z)").clicked() {
                        self.redo();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Delete Selected").clicked() {
                        self.delete_selected();
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.view.zoom = (self.view.zoom * 1.25).min(8.0);
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.view.zoom = (self.view.zoom / 1.25).max(0.1);
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom (100%)").clicked() {
                        self.view.zoom = 1.0;
                        ui.close_menu();
                    }
                    if ui.button("Reset Pan").clicked() {
                        self.view.pan_screen = egui::Vec2::ZERO;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.checkbox(&mut self.show_grid, "Show Grid (G)").changed() {
                        self.persist_settings();
                    }
                    ui.horizontal(|ui| {
                        ui.label("Spacing:");
                        if ui
                            .add(
                                egui::DragValue::new(&mut self.grid_spacing)
                                    .range(10.0..=120.0)
                                    .speed(1.0),
                            )
                            .changed()
                        {
                            self.persist_settings();
                        }
                    });
                    ui.separator();
                    let mut dark = self.theme == model::Theme::Dark;
                    if ui.checkbox(&mut dark, "Dark Theme").changed() {
                        self.theme = if dark {
                            model::Theme::Dark
                        } else {
                            model::Theme::Light
                        };
                        self.persist_settings();
                    }
                });
                ui.separator();
                tool_button(ui, "V", Tool::Select, &mut self.tool);
                tool_button(ui, "▭", Tool::Component, &mut self.tool);
                tool_button(ui, "⌁", Tool::Connect, &mut self.tool);
                tool_button(ui, "✋", Tool::Pan, &mut self.tool);
            });
        });

        egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Properties");
                ui.separator();
                if let Some(id) = self.selected_component {
                    if let Some(component) = self.doc.component_mut(id) {
                        ui.label(format!("Component {id}"));
                        ui.horizontal(|ui| {
                            ui.label("Label:");
                            ui.text_edit_singleline(&mut component.label);
                        });
                    }
                } else if let Some(seq) = self.selected_connection {
                    if let Some(conn) = self.doc.connection_mut(seq) {
                        ui.label(format!("Connection {seq}"));
                        ui.label(format!(
                            "{} → {}",
                            conn.start.component,
                            conn.end
                                .map(|g| g.component.to_string())
                                .unwrap_or_else(|| "(free)".to_string()),
                        ));
                        ui.add(
                            egui::DragValue::new(&mut conn.path_offset)
                                .speed(1.0)
                                .prefix("Path offset: "),
                        );
                        ui.add(
                            egui::DragValue::new(&mut conn.start_adjust)
                                .speed(1.0)
                                .prefix("Start stub: "),
                        );
                        ui.add(
                            egui::DragValue::new(&mut conn.end_adjust)
                                .speed(1.0)
                                .prefix("End stub: "),
                        );
                    }
                } else {
                    ui.label("Nothing selected");
                }
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom: {:.0}%", self.view.zoom * 100.0));
                    ui.separator();
                    ui.label(format!("Components: {}", self.doc.components.len()));
                    ui.separator();
                    ui.label(format!("Connections: {}", self.doc.connections.len()));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (rect, response) =
                ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let origin = rect.min;
            let painter = ui.painter_at(rect);

            let space_down =
                ctx.input(|i| i.key_down(egui::Key::Space)) && !ctx.wants_keyboard_input();
            if space_down {
                if self.tool_before_pan.is_none() {
                    self.tool_before_pan = Some(self.tool);
                    self.tool = Tool::Pan;
                }
            } else if let Some(prev) = self.tool_before_pan.take() {
                if self.tool == Tool::Pan {
                    self.tool = prev;
                }
            }

            let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll_delta.abs() > 0.0 {
                if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                    if rect.contains(hover_pos) {
                        let zoom_delta = (1.0 + scroll_delta * 0.001).clamp(0.8, 1.25);
                        self.view
                            .zoom_about_screen_point(origin, hover_pos, zoom_delta);
                    }
                }
            }

            if self.tool == Tool::Pan && response.dragged() {
                self.view.pan_screen += response.drag_delta();
            }

            let pointer_pos = ctx.input(|i| i.pointer.interact_pos());
            let pointer_world = pointer_pos.map(|p| self.view.screen_to_world(origin, p));
            let threshold_world = 6.0 / self.view.zoom;
            let grip_threshold_world = 10.0 / self.view.zoom;

            let pressed = response.drag_started() || response.clicked();
            // a plain click presses and releases in the same frame
            let released = response.drag_stopped() || response.clicked();

            if pressed {
                self.drag_move_recorded = false;
                if let Some(world_pos) = pointer_world {
                    match self.tool {
                        Tool::Select => {
                            if let Some(id) = self.component_at(world_pos) {
                                self.select_component(id);
                            } else if let Some(seq) =
                                self.connection_at(world_pos, threshold_world)
                            {
                                self.select_connection(seq);
                            } else {
                                self.clear_selection();
                            }
                        }
                        Tool::Component => {
                            self.active_drag = Some(ActiveDrag::NewComponent {
                                start: world_pos,
                                current: world_pos,
                            });
                        }
                        Tool::Connect => {
                            if let Some(grip) = self.grip_at(world_pos, grip_threshold_world) {
                                self.begin_connection(grip);
                            }
                        }
                        Tool::Pan => {}
                    }
                }
            }

            if response.dragged() {
                if let Some(world_pos) = pointer_world {
                    if let Some(ActiveDrag::NewComponent { current, .. }) = &mut self.active_drag {
                        *current = world_pos;
                    } else if let Some(ActiveDrag::NewConnection { seq, .. }) = &self.active_drag {
                        let seq = *seq;
                        let start = self.doc.connection(seq).map(|conn| conn.start);
                        let snap = self
                            .grip_at(world_pos, grip_threshold_world)
                            .filter(|g| start != Some(*g));
                        if let Some(conn) = self.doc.connection_mut(seq) {
                            conn.cursor = model::Point::from_pos2(world_pos);
                            conn.snap = snap;
                        }
                    } else if self.active_drag.is_none() && self.tool == Tool::Select {
                        if let Some(id) = self.selected_component {
                            if !self.drag_move_recorded {
                                self.push_undo();
                                self.drag_move_recorded = true;
                            }
                            let delta_world = response.drag_delta() / self.view.zoom;
                            if let Some(component) = self.doc.component_mut(id) {
                                component.rect.min.x += delta_world.x;
                                component.rect.min.y += delta_world.y;
                                component.rect.max.x += delta_world.x;
                                component.rect.max.y += delta_world.y;
                            }
                        }
                    }
                }
            }

            if released {
                self.drag_move_recorded = false;
                let is_canvas_drag = matches!(
                    self.active_drag,
                    Some(ActiveDrag::NewComponent { .. }) | Some(ActiveDrag::NewConnection { .. })
                );
                if is_canvas_drag {
                    match self.active_drag.take() {
                        Some(ActiveDrag::NewComponent { start, current }) => {
                            self.push_undo();
                            let id = self.allocate_component_id();
                            let rect = model::RectF::from_min_max(start, current);
                            // a plain click drops a default-sized component
                            let rect = if rect.is_valid()
                                && rect.max.x - rect.min.x >= 10.0
                                && rect.max.y - rect.min.y >= 10.0
                            {
                                rect
                            } else {
                                model::RectF::from_min_max(
                                    start,
                                    start + egui::vec2(120.0, 60.0),
                                )
                            };
                            self.doc.components.push(model::Component {
                                id,
                                rect,
                                label: format!("C{id}"),
                            });
                            self.select_component(id);
                        }
                        Some(ActiveDrag::NewConnection { seq, before }) => {
                            self.finish_connection(seq, before);
                        }
                        _ => {}
                    }
                }
            }

            routing::refresh(&mut self.doc);

            draw_background(
                &painter,
                rect,
                &self.view,
                self.theme,
                self.show_grid,
                self.grid_spacing,
            );
            draw_components(
                &painter,
                origin,
                &self.view,
                &self.doc,
                self.theme,
                self.selected_component,
            );
            draw_connections(&painter, origin, &self.view, &self.doc, self.theme);

            if self.tool == Tool::Connect {
                let snap = match &self.active_drag {
                    Some(ActiveDrag::NewConnection { seq, .. }) => {
                        self.doc.connection(*seq).and_then(|conn| conn.snap)
                    }
                    _ => None,
                };
                draw_grips(&painter, origin, &self.view, &self.doc, self.theme, snap);
            }
            if let Some(ActiveDrag::NewComponent { start, current }) = &self.active_drag {
                draw_component_preview(
                    &painter, origin, &self.view, self.theme, *start, *current,
                );
            }

            let view = self.view;
            self.interact_connection_handles(ui, &painter, origin, &view, pointer_world, ctx);
        });
    }
}
