// Discord layer - commands, interaction handlers and the status message publisher.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "monitoring/mod.rs"]
pub mod monitoring;

#[path = "setup/mod.rs"]
pub mod setup;

pub mod channel_access;

// Re-export command types for convenience
pub use commands::{Context, Data, Error};
