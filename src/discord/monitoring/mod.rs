pub mod channel_publisher;
pub mod status_embed;

pub use channel_publisher::DiscordPublisher;
