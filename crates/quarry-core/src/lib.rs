//! Configuration loading and retrieval service bootstrap.

pub mod bootstrap;
pub mod config;

pub use config::Config;
