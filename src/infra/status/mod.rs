pub mod icon_store;
pub mod slp_client;

pub use icon_store::FileIconStore;
pub use slp_client::{SlpClient, StatusError, DEFAULT_TIMEOUT};
