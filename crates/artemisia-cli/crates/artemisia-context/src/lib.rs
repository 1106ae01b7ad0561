pub mod config;
pub mod manifest;
pub mod project;
pub mod settings;
