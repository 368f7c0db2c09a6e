pub mod status_models;
pub mod status_source;

pub use status_models::{PlayerCounts, ServerStatus};
pub use status_source::{IconError, IconStore, StatusSource};
