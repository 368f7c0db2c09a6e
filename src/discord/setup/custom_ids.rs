// Custom ids of the setup components, modals and status buttons.

pub const MAIN_MENU: &str = "setup_main_menu";
pub const SERVERS_ACTION: &str = "setup_servers_action";
pub const EDIT_SERVER_SELECT: &str = "select_server_edit";
pub const DELETE_SERVER_SELECT: &str = "select_server_delete";
pub const INTERVALS_SELECT: &str = "setup_intervals_select";
pub const INTERVAL_SET: &str = "setup_interval_set_";
pub const EMBED_SELECT: &str = "setup_embed_select";
pub const EMBED_OPTION: &str = "setup_embed_option_";
pub const EMBED_FIELDS: &str = "setup_embed_fields_";
pub const BUTTONS_SELECT: &str = "setup_buttons_select";
pub const BUTTON_TOGGLE: &str = "setup_button_toggle_";
pub const PERMISSIONS_ACTION: &str = "setup_permissions_action";
pub const ROLE_TOGGLE: &str = "setup_permissions_role_toggle";
pub const GLOBAL_ACTION: &str = "setup_global_action";
pub const TEXTS_ACTION: &str = "setup_texts_action";
pub const GLOBAL_LANGUAGE: &str = "setup_global_language_select";
pub const SERVER_LANGUAGE_SELECT: &str = "setup_server_language_select";
pub const SERVER_LANGUAGE_CHANGE: &str = "setup_server_language_change_";

pub const MODAL_ADD_SERVER: &str = "modal_add_server";
pub const MODAL_EDIT_SERVER: &str = "modal_edit_server_";
pub const MODAL_COLORS: &str = "modal_colors_";
pub const MODAL_GLOBAL_FOOTER: &str = "modal_global_footer";
pub const MODAL_GLOBAL_COLORS: &str = "modal_global_colors";

/// Prefix of the one-off channel select of the add-server flow. Those are
/// consumed by a collector, never by the dispatcher.
pub const CHANNEL_SELECT: &str = "select_channel_";

pub fn back(menu: &str) -> String {
    format!("setup_{menu}_back")
}

pub fn indexed(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}")
}

fn index_after(id: &str, prefix: &str) -> Option<usize> {
    id.strip_prefix(prefix)?.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAction {
    MainMenu,
    Back,
    ServersAction,
    EditServerSelect,
    DeleteServerSelect,
    IntervalsSelect,
    IntervalSet(usize),
    EmbedSelect,
    EmbedOption(usize),
    EmbedFields(usize),
    ButtonsSelect,
    ButtonToggle(usize),
    PermissionsAction,
    RoleToggle,
    GlobalAction,
    TextsAction,
    GlobalLanguage,
    ServerLanguageSelect,
    ServerLanguageChange(usize),
}

impl SetupAction {
    pub fn parse(id: &str) -> Option<Self> {
        let action = match id {
            MAIN_MENU => Self::MainMenu,
            SERVERS_ACTION => Self::ServersAction,
            EDIT_SERVER_SELECT => Self::EditServerSelect,
            DELETE_SERVER_SELECT => Self::DeleteServerSelect,
            INTERVALS_SELECT => Self::IntervalsSelect,
            EMBED_SELECT => Self::EmbedSelect,
            BUTTONS_SELECT => Self::ButtonsSelect,
            PERMISSIONS_ACTION => Self::PermissionsAction,
            ROLE_TOGGLE => Self::RoleToggle,
            GLOBAL_ACTION => Self::GlobalAction,
            TEXTS_ACTION => Self::TextsAction,
            GLOBAL_LANGUAGE => Self::GlobalLanguage,
            SERVER_LANGUAGE_SELECT => Self::ServerLanguageSelect,
            _ if id.starts_with("setup_") && id.ends_with("_back") => Self::Back,
            _ => {
                return index_after(id, INTERVAL_SET)
                    .map(Self::IntervalSet)
                    .or_else(|| index_after(id, EMBED_OPTION).map(Self::EmbedOption))
                    .or_else(|| index_after(id, EMBED_FIELDS).map(Self::EmbedFields))
                    .or_else(|| index_after(id, BUTTON_TOGGLE).map(Self::ButtonToggle))
                    .or_else(|| {
                        index_after(id, SERVER_LANGUAGE_CHANGE).map(Self::ServerLanguageChange)
                    })
            }
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    AddServer,
    EditServer(usize),
    Colors(usize),
    GlobalFooter,
    GlobalColors,
}

impl ModalAction {
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            MODAL_ADD_SERVER => Some(Self::AddServer),
            MODAL_GLOBAL_FOOTER => Some(Self::GlobalFooter),
            MODAL_GLOBAL_COLORS => Some(Self::GlobalColors),
            _ => index_after(id, MODAL_EDIT_SERVER)
                .map(Self::EditServer)
                .or_else(|| index_after(id, MODAL_COLORS).map(Self::Colors)),
        }
    }
}

/// Buttons under a status message, keyed by the message's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusButton {
    Ip(u64),
    Port(u64),
    Players(u64),
}

impl StatusButton {
    pub fn parse(id: &str) -> Option<Self> {
        let (kind, channel) = id.split_once('_')?;
        let channel: u64 = channel.parse().ok()?;
        match kind {
            "ip" => Some(Self::Ip(channel)),
            "port" => Some(Self::Port(channel)),
            "players" => Some(Self::Players(channel)),
            _ => None,
        }
    }
}
