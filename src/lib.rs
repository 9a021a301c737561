pub mod app_state;
pub mod document;
pub mod editor;
pub mod hotkeys;
pub mod render;
pub mod session;
pub mod toolbar;
