//! CLI command handlers.

mod fetch;
mod tiles;

pub use fetch::run_fetch_command;
pub use tiles::run_tiles_command;
