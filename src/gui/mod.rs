//! GUI module for the event timeline viewer.
//!
//! This module contains the egui-based user interface components
//! including the main application window, toolbar, timeline canvas, and controls.

mod app;
mod controls;
mod dialogs;
mod timeline;

pub use app::TimelineViewerApp;
