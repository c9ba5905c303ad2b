//! Event Timeline Viewer - A timeline viewer that collapses long empty stretches.

mod core;
mod gui;

use crate::core::config::AppSettings;
use gui::TimelineViewerApp;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Window size used when no size was saved.
const DEFAULT_WINDOW_SIZE: (f32, f32) = (1280.0, 720.0);

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("event_timeline_viewer=info,warn")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = AppSettings::load();
    let (width, height) = settings.window_size.unwrap_or(DEFAULT_WINDOW_SIZE);
    tracing::info!(width, height, "Starting viewer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Event Timeline Viewer",
        options,
        Box::new(|cc| Ok(Box::new(TimelineViewerApp::new(cc, settings)))),
    )
}
