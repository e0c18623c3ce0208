pub mod api;
pub mod bus;
pub mod config;
pub mod editor;
pub mod fetch;
pub mod practice;
pub mod prefs;
pub mod sidebar;
pub mod topics;
