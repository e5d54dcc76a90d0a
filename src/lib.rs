pub mod cli;
pub mod commands;
pub mod load_config;
pub mod options;

pub use cli::{run, Cli, Commands};
