use crate::model;

use super::{ActiveDrag, FlowDeskApp, Snapshot, settings};

impl FlowDeskApp {
    pub(super) fn allocate_component_id(&mut self) -> u64 {
        let id = self.next_component_id;
        self.next_component_id += 1;
        id
    }

    pub(super) fn allocate_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            next_component_id: self.next_component_id,
            next_seq: self.next_seq,
            selected_component: self.selected_component,
            selected_connection: self.selected_connection,
        }
    }

    pub(super) fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.next_component_id = snapshot.next_component_id;
        self.next_seq = snapshot.next_seq;
        self.selected_component = snapshot.selected_component;
        self.selected_connection = snapshot.selected_connection;
        self.active_drag = None;
        self.status = None;
        self.sync_selected_flags();
    }

    pub(super) fn push_undo(&mut self) {
        const LIMIT: usize = 200;
        self.history.push(self.snapshot());
        if self.history.len() > LIMIT {
            let overflow = self.history.len() - LIMIT;
            self.history.drain(0..overflow);
        }
        self.future.clear();
    }

    pub(super) fn undo(&mut self) {
        let Some(prev) = self.history.pop() else {
            return;
        };
        let current = self.snapshot();
        self.future.push(current);
        self.restore(prev);
    }

    pub(super) fn redo(&mut self) {
        let Some(next) = self.future.pop() else {
            return;
        };
        let current = self.snapshot();
        self.history.push(current);
        self.restore(next);
    }

    /// Mirrors the selection fields into each connection's `selected` flag,
    /// which drives stroke width.
    pub(super) fn sync_selected_flags(&mut self) {
        let selected = self.selected_connection;
        for conn in &mut self.doc.connections {
            conn.selected = selected == Some(conn.seq);
        }
    }

    pub(super) fn select_component(&mut self, id: u64) {
        self.selected_component = Some(id);
        self.selected_connection = None;
        self.sync_selected_flags();
    }

    pub(super) fn select_connection(&mut self, seq: u64) {
        self.selected_connection = Some(seq);
        self.selected_component = None;
        self.sync_selected_flags();
    }

    pub(super) fn clear_selection(&mut self) {
        self.selected_component = None;
        self.selected_connection = None;
        self.sync_selected_flags();
    }

    /// Deletes the current selection. Removing a component also removes every
    /// connection referencing it.
    pub(super) fn delete_selected(&mut self) {
        if let Some(id) = self.selected_component {
            self.push_undo();
            self.doc.remove_component(id);
            self.selected_component = None;
            self.status = Some(format!("Deleted component {id}"));
        } else if let Some(seq) = self.selected_connection {
            self.push_undo();
            self.doc.remove_connection(seq);
            self.selected_connection = None;
            self.status = Some(format!("Deleted connection {seq}"));
        }
    }

    /// Starts dragging a new connection out of a grip. The connection joins
    /// the document immediately so the router draws it live; the pre-drag
    /// snapshot travels with the drag and only reaches history on a bind.
    pub(super) fn begin_connection(&mut self, start: model::GripRef) {
        let Ok(anchor) = self.doc.grip_point(&start) else {
            return;
        };
        let before = Box::new(self.snapshot());
        let seq = self.allocate_seq();
        let mut conn = model::Connection::new(seq, start);
        conn.cursor = model::Point::from_pos2(anchor);
        self.doc.connections.push(conn);
        self.active_drag = Some(ActiveDrag::NewConnection { seq, before });
    }

    /// Finalizes a connection drop: binds to the snap candidate if there is
    /// one, otherwise discards the connection entirely.
    pub(super) fn finish_connection(&mut self, seq: u64, before: Box<Snapshot>) {
        let bound = match self.doc.connection_mut(seq) {
            Some(conn) => {
                if let Some(snap) = conn.snap.take() {
                    conn.end = Some(snap);
                    true
                } else {
                    false
                }
            }
            None => false,
        };
        if bound {
            const LIMIT: usize = 200;
            self.history.push(*before);
            if self.history.len() > LIMIT {
                let overflow = self.history.len() - LIMIT;
                self.history.drain(0..overflow);
            }
            self.future.clear();
            self.select_connection(seq);
        } else {
            self.doc.remove_connection(seq);
            self.next_seq = before.next_seq;
        }
    }

    /// Aborts an in-flight canvas drag. A half-made connection is removed and
    /// its seq returned to the allocator.
    pub(super) fn cancel_active_drag(&mut self) {
        if let Some(ActiveDrag::NewConnection { seq, before }) = self.active_drag.take() {
            self.doc.remove_connection(seq);
            self.next_seq = before.next_seq;
        }
    }

    pub(super) fn new_document(&mut self) {
        self.push_undo();
        self.doc = model::Document::default();
        self.next_component_id = 1;
        self.next_seq = 1;
        self.clear_selection();
        self.status = Some("New diagram".to_string());
    }

    pub(super) fn save_to_path(&mut self) {
        let save = model::SaveFile::from_document(&self.doc);
        match serde_json::to_string_pretty(&save) {
            Ok(json) => match std::fs::write(&self.file_path, json) {
                Ok(()) => {
                    log::info!("saved {}", self.file_path);
                    self.status = Some(format!("Saved {}", self.file_path));
                }
                Err(e) => self.status = Some(format!("Save failed: {e}")),
            },
            Err(e) => self.status = Some(format!("Serialize failed: {e}")),
        }
    }

    pub(super) fn save_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("flow.json")
            .add_filter("JSON", &["json"])
            .save_file()
        {
            self.file_path = path.display().to_string();
            self.save_to_path();
            self.persist_settings();
        }
    }

    pub(super) fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            let path_str = path.display().to_string();
            match std::fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<model::SaveFile>(&json) {
                    Ok(save) => {
                        self.push_undo();
                        self.doc = save.into_document();
                        self.next_component_id =
                            self.doc.components.iter().map(|c| c.id).max().unwrap_or(0) + 1;
                        self.next_seq =
                            self.doc.connections.iter().map(|c| c.seq).max().unwrap_or(0) + 1;
                        self.clear_selection();
                        self.file_path = path_str.clone();
                        log::info!("loaded {}", path_str);
                        self.status = Some(format!("Loaded {}", path_str));
                        self.persist_settings();
                    }
                    Err(e) => self.status = Some(format!("Parse failed: {e}")),
                },
                Err(e) => self.status = Some(format!("Read failed: {e}")),
            }
        }
    }

    pub(super) fn settings_snapshot(&self) -> settings::AppSettings {
        settings::AppSettings {
            file_path: self.file_path.clone(),
            theme: self.theme,
            show_grid: self.show_grid,
            grid_spacing: self.grid_spacing,
        }
    }

    pub(super) fn persist_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        if let Err(e) = settings::save_settings(&self.settings_path, &snapshot) {
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }
}
