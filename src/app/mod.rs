use crate::model;
use eframe::egui;

mod actions;
mod interaction;
mod render;
mod settings;
mod update;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tool {
    Select,
    Component,
    Connect,
    Pan,
}

/// Which end of a connection a stub handle belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StubEnd {
    Start,
    End,
}

#[derive(Clone, Debug)]
enum ActiveDrag {
    /// Dragging out a new component rect.
    NewComponent {
        start: egui::Pos2,
        current: egui::Pos2,
    },
    /// Dragging a new connection out of a grip. The pre-drag snapshot is
    /// committed to history only if the drop binds to a grip.
    NewConnection { seq: u64, before: Box<Snapshot> },
    /// Adjusting one of the stub lengths of a selected connection.
    StubAdjust {
        seq: u64,
        which: StubEnd,
        axis: egui::Vec2,
        start_value: f32,
        start_pointer_world: egui::Pos2,
    },
    /// Sliding the middle run of a selected connection along its free axis.
    MidAdjust {
        seq: u64,
        axis: egui::Vec2,
        start_value: f32,
        start_pointer_world: egui::Pos2,
    },
}

#[derive(Clone, Copy, Debug)]
struct View {
    pan_screen: egui::Vec2,
    zoom: f32,
}

impl Default for View {
    fn default() -> Self {
        Self {
            pan_screen: egui::Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl View {
    fn world_to_screen(&self, origin: egui::Pos2, world: egui::Pos2) -> egui::Pos2 {
        origin + self.pan_screen + world.to_vec2() * self.zoom
    }

    fn screen_to_world(&self, origin: egui::Pos2, screen: egui::Pos2) -> egui::Pos2 {
        ((screen - origin - self.pan_screen) / self.zoom).to_pos2()
    }

    fn zoom_about_screen_point(
        &mut self,
        origin: egui::Pos2,
        screen_point: egui::Pos2,
        zoom_delta: f32,
    ) {
        let before = self.screen_to_world(origin, screen_point);
        self.zoom = (self.zoom * zoom_delta).clamp(0.1, 8.0);
        let after_screen = self.world_to_screen(origin, before);
        self.pan_screen += screen_point - after_screen;
    }
}

#[derive(Clone, Debug)]
struct Snapshot {
    doc: model::Document,
    next_component_id: u64,
    next_seq: u64,
    selected_component: Option<u64>,
    selected_connection: Option<u64>,
}

pub struct FlowDeskApp {
    doc: model::Document,
    tool: Tool,
    tool_before_pan: Option<Tool>,
    view: View,
    next_component_id: u64,
    next_seq: u64,
    selected_component: Option<u64>,
    selected_connection: Option<u64>,
    active_drag: Option<ActiveDrag>,
    drag_move_recorded: bool,
    history: Vec<Snapshot>,
    future: Vec<Snapshot>,
    file_path: String,
    settings_path: String,
    status: Option<String>,
    theme: model::Theme,
    show_grid: bool,
    grid_spacing: f32,
}

impl FlowDeskApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = std::path::PathBuf::from(home)
                .join(".config")
                .join("flowdesk.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();

        Self {
            doc: model::Document::default(),
            tool: Tool::Select,
            tool_before_pan: None,
            view: View::default(),
            next_component_id: 1,
            next_seq: 1,
            selected_component: None,
            selected_connection: None,
            active_drag: None,
            drag_move_recorded: false,
            history: Vec::new(),
            future: Vec::new(),
            file_path: settings.file_path,
            settings_path,
            status: None,
            theme: settings.theme,
            show_grid: settings.show_grid,
            grid_spacing: settings.grid_spacing,
        }
    }
}
