use crate::core::config::SetupPermissions;

/// Channel permissions the bot needs to post and maintain status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPermission {
    ViewChannel,
    SendMessages,
    EmbedLinks,
    AttachFiles,
    ReadMessageHistory,
}

impl ChannelPermission {
    pub const REQUIRED: [ChannelPermission; 5] = [
        ChannelPermission::ViewChannel,
        ChannelPermission::SendMessages,
        ChannelPermission::EmbedLinks,
        ChannelPermission::AttachFiles,
        ChannelPermission::ReadMessageHistory,
    ];

    pub fn text_key(self) -> &'static str {
        match self {
            ChannelPermission::ViewChannel => "permissions.list.viewChannel",
            ChannelPermission::SendMessages => "permissions.list.sendMessages",
            ChannelPermission::EmbedLinks => "permissions.list.embedLinks",
            ChannelPermission::AttachFiles => "permissions.list.attachFiles",
            ChannelPermission::ReadMessageHistory => "permissions.list.readMessageHistory",
        }
    }
}

/// Required permissions for which `granted` returns false.
pub fn missing_permissions(granted: impl Fn(ChannelPermission) -> bool) -> Vec<ChannelPermission> {
    ChannelPermission::REQUIRED
        .into_iter()
        .filter(|p| !granted(*p))
        .collect()
}

/// Whether a member may use the setup commands.
pub fn has_setup_permission(
    settings: &SetupPermissions,
    is_administrator: bool,
    member_roles: &[u64],
) -> bool {
    if settings.allow_administrator && is_administrator {
        return true;
    }

    settings
        .allowed_roles
        .iter()
        .filter_map(|role| role.parse::<u64>().ok())
        .any(|role| member_roles.contains(&role))
}

/// Adds the role when absent, removes it otherwise. Returns true when added.
pub fn toggle_allowed_role(settings: &mut SetupPermissions, role_id: u64) -> bool {
    let role = role_id.to_string();
    if let Some(pos) = settings.allowed_roles.iter().position(|r| *r == role) {
        settings.allowed_roles.remove(pos);
        false
    } else {
        settings.allowed_roles.push(role);
        true
    }
}
