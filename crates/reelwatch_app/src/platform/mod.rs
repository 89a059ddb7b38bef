mod app;
mod commands;
mod effects;
pub mod logging;
mod render;
pub mod settings;

pub use commands::run;
