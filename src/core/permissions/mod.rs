pub mod permission_rules;

pub use permission_rules::{
    has_setup_permission, missing_permissions, toggle_allowed_role, ChannelPermission,
};
