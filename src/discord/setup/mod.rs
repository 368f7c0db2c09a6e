pub mod custom_ids;
pub mod handlers;
pub mod menus;
pub mod server_flow;
pub mod status_buttons;

pub use handlers::handle_interaction;
