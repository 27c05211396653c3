pub mod config;
pub mod display;
pub mod error;
pub mod fetcher;
pub mod screener;
pub mod state;
pub mod tui_app;
pub mod types;
