pub mod commands;
pub mod compress;
pub mod config;
pub mod download;
pub mod error;
pub mod handler;
pub mod media;
pub mod reply;
pub mod telemetry;
pub mod utils;
pub mod validate;
