mod app;
mod model;
mod routing;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Flowdesk",
        native_options,
        Box::new(|cc| Ok(Box::new(app::FlowDeskApp::new(cc)))),
    )
}
