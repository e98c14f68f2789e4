//! CLI command handlers, one per file.

mod config;
mod fetch;

pub use config::run_config;
pub use fetch::{run_fetch, FetchArgs};

#[cfg(test)]
pub use fetch::format_event;
