pub mod state_models;
pub mod state_store;

pub use state_models::{ChannelState, GuildState};
pub use state_store::{StateError, StateStore};
