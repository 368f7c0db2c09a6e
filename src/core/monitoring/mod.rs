pub mod monitoring_models;
pub mod monitoring_service;

pub use monitoring_models::{
    PublishError, RefreshReport, SkipReason, StatusPublisher, StatusSnapshot, UpdateOutcome,
};
pub use monitoring_service::{MonitoringError, MonitoringService};
