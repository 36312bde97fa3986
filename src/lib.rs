// Public API for integration tests and potential library usage

pub mod actor;
pub mod api;
pub mod config;
pub mod manager;
pub mod names;
pub mod protocol;
pub mod state;
pub mod types;
pub mod words;
pub mod ws;
