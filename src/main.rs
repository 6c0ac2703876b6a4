mod app;
mod compositor;
mod config;
mod cover_form;
mod export;
mod gemini_client;
mod generation;
mod overlay;
mod prompt;
mod ui_theme;
mod upload;

use eframe::egui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Owned by the app so background work lives as long as the window.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("cover-studio-worker")
        .build()?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([960.0, 640.0])
            .with_title("Oase Cover Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Oase Cover Studio",
        options,
        Box::new(|_cc| Ok(Box::new(app::CoverStudioApp::new(runtime)))),
    )?;
    Ok(())
}
