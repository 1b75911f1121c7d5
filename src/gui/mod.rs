// Desktop view: collection controls, health report and live sensors

// Application state and UI rendering
mod app;
// Reusable UI components (stat cards, sections, colors)
mod components;

// Export AppState for use in main.rs
pub use app::AppState;
// Export component helpers for the app
pub use components::*;
