// The core module contains all business logic.
// Each feature gets its own submodule. Nothing in here knows about Discord.

#[path = "config/mod.rs"]
pub mod config;

#[path = "state/mod.rs"]
pub mod state;

#[path = "status/mod.rs"]
pub mod status;

#[path = "texts/mod.rs"]
pub mod texts;

#[path = "monitoring/mod.rs"]
pub mod monitoring;

#[path = "permissions/mod.rs"]
pub mod permissions;

#[path = "diagnostics/mod.rs"]
pub mod diagnostics;
