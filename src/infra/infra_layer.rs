// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "json_files.rs"]
pub mod json_files;

#[path = "config/mod.rs"]
pub mod config;

#[path = "state/mod.rs"]
pub mod state;

#[path = "texts/mod.rs"]
pub mod texts;

#[path = "status/mod.rs"]
pub mod status;
