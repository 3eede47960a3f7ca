use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod session;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        device = %config.camera_device,
        model_dir = %config.model_dir.display(),
        "nametag starting"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_title("Nametag"),
        ..Default::default()
    };

    eframe::run_native(
        "nametag",
        options,
        Box::new(move |cc| Ok(Box::new(app::NametagApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))
}
