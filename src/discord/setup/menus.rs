// Embeds, select menus and modals of the `/setup` flow.
//
// Builders only: nothing here touches the config or Discord.

use super::custom_ids as ids;
use crate::core::config::{GuildConfig, MonitoredServer, DEFAULT_PORT, GLOBAL_LANGUAGE};
use crate::core::texts::{language_emoji, TextCatalog, TextStore};
use crate::discord::monitoring::status_embed::truncate;
use poise::serenity_prelude as serenity;

pub const MENU_COLOR: u32 = 0x5865F2;
pub const SUCCESS_COLOR: u32 = 0x57F287;
pub const ERROR_COLOR: u32 = 0xED4245;

/// Discord's limit for select menu options.
pub const MAX_OPTIONS: usize = 25;
const LABEL_LIMIT: usize = 100;
const FIELD_LIMIT: usize = 1024;
pub const FOOTER_LIMIT: u16 = 100;

pub const INTERVAL_CHOICES: [(u64, &str); 5] = [
    (5_000, "5s"),
    (10_000, "10s"),
    (30_000, "30s"),
    (60_000, "1m"),
    (300_000, "5m"),
];

/// Form fields of the server modals.
pub const INPUT_NAME: &str = "server_name";
pub const INPUT_ADDRESS: &str = "server_ip";
pub const INPUT_PORT: &str = "server_port";
pub const INPUT_COLOR_ONLINE: &str = "color_online";
pub const INPUT_COLOR_OFFLINE: &str = "color_offline";
pub const INPUT_FOOTER: &str = "footer_text";

pub fn format_interval(ms: u64) -> String {
    if ms >= 60_000 && ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms % 1_000 == 0 {
        format!("{}s", ms / 1_000)
    } else {
        format!("{ms}ms")
    }
}

pub fn channel_mention(channel_id: u64) -> String {
    format!("<#{channel_id}>")
}

/// Text lookup bound to one language.
pub struct Tr<'a, S: TextStore> {
    pub texts: &'a TextCatalog<S>,
    pub language: String,
}

impl<'a, S: TextStore> Tr<'a, S> {
    /// Setup menus follow the guild's default language.
    pub fn new(texts: &'a TextCatalog<S>, guild: &GuildConfig) -> Self {
        Self {
            texts,
            language: guild.effective_language(None).to_string(),
        }
    }

    pub fn get(&self, key: &str) -> String {
        self.texts.get(&self.language, key, &[])
    }

    pub fn with(&self, key: &str, vars: &[(&str, String)]) -> String {
        self.texts.get(&self.language, key, vars)
    }
}

/// An embed plus its components, sendable as reply, new response or update.
pub struct MenuView {
    pub embed: serenity::CreateEmbed,
    pub components: Vec<serenity::CreateActionRow>,
}

impl MenuView {
    fn new(embed: serenity::CreateEmbed) -> Self {
        Self {
            embed,
            components: Vec::new(),
        }
    }

    fn row(mut self, row: serenity::CreateActionRow) -> Self {
        self.components.push(row);
        self
    }

    pub fn reply(self) -> poise::CreateReply {
        poise::CreateReply::default()
            .embed(self.embed)
            .components(self.components)
            .ephemeral(true)
    }

    pub fn message(self) -> serenity::CreateInteractionResponseMessage {
        serenity::CreateInteractionResponseMessage::new()
            .embed(self.embed)
            .components(self.components)
            .ephemeral(true)
    }

    pub fn update(self) -> serenity::CreateInteractionResponse {
        serenity::CreateInteractionResponse::UpdateMessage(
            serenity::CreateInteractionResponseMessage::new()
                .embed(self.embed)
                .components(self.components),
        )
    }

    pub fn edit(self) -> serenity::EditInteractionResponse {
        serenity::EditInteractionResponse::new()
            .embed(self.embed)
            .components(self.components)
    }
}

fn menu_embed(title: String, description: String) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(MENU_COLOR)
}

fn option(label: impl AsRef<str>, value: impl Into<String>) -> serenity::CreateSelectMenuOption {
    serenity::CreateSelectMenuOption::new(truncate(label.as_ref(), LABEL_LIMIT), value)
}

fn string_select(
    custom_id: impl Into<String>,
    placeholder: String,
    options: Vec<serenity::CreateSelectMenuOption>,
) -> serenity::CreateActionRow {
    let options = options.into_iter().take(MAX_OPTIONS).collect();
    serenity::CreateActionRow::SelectMenu(
        serenity::CreateSelectMenu::new(custom_id, serenity::CreateSelectMenuKind::String { options })
            .placeholder(truncate(&placeholder, LABEL_LIMIT)),
    )
}

fn back_row<S: TextStore>(tr: &Tr<'_, S>, menu: &str) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(ids::back(menu))
        .label(tr.get("setup.common.back"))
        .emoji('◀')
        .style(serenity::ButtonStyle::Secondary)])
}

fn on_off<S: TextStore>(tr: &Tr<'_, S>, enabled: bool) -> String {
    tr.get(if enabled { "setup.buttons.on" } else { "setup.buttons.off" })
}

fn visible_hidden<S: TextStore>(tr: &Tr<'_, S>, visible: bool) -> String {
    tr.get(if visible {
        "setup.embed.fields.visible"
    } else {
        "setup.embed.fields.hidden"
    })
}

pub fn main_menu<S: TextStore>(tr: &Tr<'_, S>) -> MenuView {
    const CATEGORIES: [(&str, char); 7] = [
        ("servers", '🎮'),
        ("intervals", '⏱'),
        ("embed", '🎨'),
        ("buttons", '🔘'),
        ("permissions", '🔐'),
        ("global", '🌍'),
        ("texts", '🌐'),
    ];
    let options = CATEGORIES
        .iter()
        .map(|(value, emoji)| {
            let base = format!("setup.mainMenu.categories.{value}");
            option(tr.get(&format!("{base}.label")), *value)
                .description(truncate(&tr.get(&format!("{base}.description")), LABEL_LIMIT))
                .emoji(*emoji)
        })
        .collect();

    let embed = menu_embed(tr.get("setup.mainMenu.title"), tr.get("setup.mainMenu.description"))
        .footer(serenity::CreateEmbedFooter::new(tr.get("setup.mainMenu.footer")));
    MenuView::new(embed).row(string_select(
        ids::MAIN_MENU,
        tr.get("setup.mainMenu.placeholder"),
        options,
    ))
}

pub fn servers_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    let mut embed = menu_embed(
        tr.get("setup.servers.title"),
        tr.with(
            "setup.servers.description",
            &[("count", config.servers.len().to_string())],
        ),
    );
    if !config.servers.is_empty() {
        let entries = config
            .servers
            .iter()
            .map(|s| {
                tr.with(
                    "setup.servers.entry",
                    &[
                        ("serverName", s.server_name.clone()),
                        ("address", s.display_address()),
                        ("channel", channel_mention(s.channel().unwrap_or_default())),
                    ],
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field(tr.get("setup.servers.list"), truncate(&entries, FIELD_LIMIT), false);
    }

    let mut actions = vec![("add", '➕')];
    if !config.servers.is_empty() {
        actions.push(("edit", '✏'));
        actions.push(("delete", '🗑'));
    }
    let options = actions
        .into_iter()
        .map(|(value, emoji)| {
            let base = format!("setup.servers.actions.{value}");
            option(tr.get(&format!("{base}.label")), value)
                .description(truncate(&tr.get(&format!("{base}.description")), LABEL_LIMIT))
                .emoji(emoji)
        })
        .collect();

    MenuView::new(embed)
        .row(string_select(
            ids::SERVERS_ACTION,
            tr.get("setup.servers.placeholder"),
            options,
        ))
        .row(back_row(tr, "servers"))
}

/// Select menu with one option per server; the value is the server index.
fn server_select(
    config: &GuildConfig,
    custom_id: &str,
    placeholder: String,
    describe: impl Fn(&MonitoredServer) -> String,
) -> serenity::CreateActionRow {
    let options = config
        .servers
        .iter()
        .enumerate()
        .map(|(idx, server)| {
            option(&server.server_name, idx.to_string())
                .description(truncate(&describe(server), LABEL_LIMIT))
        })
        .collect();
    string_select(custom_id, placeholder, options)
}

/// A menu that starts by picking a server. Shows a notice instead when none exist.
fn server_picker<S: TextStore>(
    tr: &Tr<'_, S>,
    config: &GuildConfig,
    menu: &str,
    custom_id: &str,
    describe: impl Fn(&MonitoredServer) -> String,
) -> MenuView {
    let mut description = tr.get(&format!("setup.{menu}.description"));
    if config.servers.is_empty() {
        description = format!("{description}\n\n{}", tr.get("setup.common.noServers"));
        let embed = menu_embed(tr.get(&format!("setup.{menu}.title")), description);
        return MenuView::new(embed).row(back_row(tr, menu));
    }

    let embed = menu_embed(tr.get(&format!("setup.{menu}.title")), description);
    MenuView::new(embed)
        .row(server_select(
            config,
            custom_id,
            tr.get("setup.common.serverPlaceholder"),
            describe,
        ))
        .row(back_row(tr, menu))
}

pub fn edit_server_picker<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    let embed = menu_embed(tr.get("setup.servers.title"), tr.get("setup.servers.actions.edit.description"));
    MenuView::new(embed)
        .row(server_select(
            config,
            ids::EDIT_SERVER_SELECT,
            tr.get("setup.servers.editPlaceholder"),
            MonitoredServer::display_address,
        ))
        .row(back_row(tr, "servers"))
}

pub fn delete_server_picker<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    let embed = menu_embed(tr.get("setup.servers.title"), tr.get("setup.servers.actions.delete.description"));
    MenuView::new(embed)
        .row(server_select(
            config,
            ids::DELETE_SERVER_SELECT,
            tr.get("setup.servers.deletePlaceholder"),
            MonitoredServer::display_address,
        ))
        .row(back_row(tr, "servers"))
}

fn server_interval(server: &MonitoredServer, default_ms: u64) -> u64 {
    server.update_interval.unwrap_or(default_ms)
}

pub fn intervals_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig, default_ms: u64) -> MenuView {
    server_picker(tr, config, "intervals", ids::INTERVALS_SELECT, |server| {
        tr.with(
            "setup.intervals.serverDescription",
            &[("interval", format_interval(server_interval(server, default_ms)))],
        )
    })
}

pub fn interval_options<S: TextStore>(
    tr: &Tr<'_, S>,
    idx: usize,
    server: &MonitoredServer,
    default_ms: u64,
) -> MenuView {
    let current = server_interval(server, default_ms);
    let embed = menu_embed(
        tr.with(
            "setup.intervals.optionsTitle",
            &[("serverName", server.server_name.clone())],
        ),
        tr.with(
            "setup.intervals.optionsDescription",
            &[("interval", format_interval(current))],
        ),
    );
    let options = INTERVAL_CHOICES
        .iter()
        .map(|(ms, key)| {
            option(tr.get(&format!("setup.intervals.options.{key}")), ms.to_string())
                .default_selection(*ms == current)
        })
        .collect();

    MenuView::new(embed)
        .row(string_select(
            ids::indexed(ids::INTERVAL_SET, idx),
            tr.get("setup.intervals.optionsPlaceholder"),
            options,
        ))
        .row(back_row(tr, "intervals"))
}

pub fn embed_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    server_picker(tr, config, "embed", ids::EMBED_SELECT, MonitoredServer::display_address)
}

pub fn embed_options<S: TextStore>(tr: &Tr<'_, S>, idx: usize, server: &MonitoredServer) -> MenuView {
    let embed = menu_embed(
        tr.with("setup.embed.optionsTitle", &[("serverName", server.server_name.clone())]),
        tr.get("setup.embed.optionsDescription"),
    );
    let options = [("colors", '🎨'), ("fields", '📋'), ("icon", '🖼')]
        .into_iter()
        .map(|(value, emoji)| {
            let base = format!("setup.embed.options.{value}");
            option(tr.get(&format!("{base}.label")), value)
                .description(truncate(&tr.get(&format!("{base}.description")), LABEL_LIMIT))
                .emoji(emoji)
        })
        .collect();

    MenuView::new(embed)
        .row(string_select(
            ids::indexed(ids::EMBED_OPTION, idx),
            tr.get("setup.embed.optionsPlaceholder"),
            options,
        ))
        .row(back_row(tr, "embed"))
}

pub fn embed_fields<S: TextStore>(
    tr: &Tr<'_, S>,
    idx: usize,
    server: &MonitoredServer,
    note: Option<String>,
) -> MenuView {
    let settings = &server.embed_settings;
    let fields = [
        ("ip", settings.shows_ip()),
        ("port", settings.shows_port()),
        ("players", settings.shows_players()),
        ("motd", settings.shows_motd()),
    ];
    let overview = fields
        .iter()
        .map(|(key, visible)| {
            format!(
                "{} {}: {}",
                if *visible { "✅" } else { "❌" },
                tr.get(&format!("setup.embed.fields.{key}")),
                visible_hidden(tr, *visible)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let description = match note {
        Some(note) => format!("{note}\n\n{overview}"),
        None => overview,
    };
    let embed = menu_embed(
        tr.with("setup.embed.fields.title", &[("serverName", server.server_name.clone())]),
        description,
    );

    let options = fields
        .iter()
        .map(|(key, visible)| {
            option(tr.get(&format!("setup.embed.fields.{key}")), *key)
                .description(visible_hidden(tr, *visible))
        })
        .collect();

    MenuView::new(embed)
        .row(string_select(
            ids::indexed(ids::EMBED_FIELDS, idx),
            tr.get("setup.embed.fields.placeholder"),
            options,
        ))
        .row(back_row(tr, "embed"))
}

pub fn buttons_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    server_picker(tr, config, "buttons", ids::BUTTONS_SELECT, |server| {
        format!(
            "{}: {}",
            tr.get("setup.buttons.row"),
            on_off(tr, server.button_settings.row_enabled())
        )
    })
}

pub fn button_options<S: TextStore>(
    tr: &Tr<'_, S>,
    idx: usize,
    server: &MonitoredServer,
    note: Option<String>,
) -> MenuView {
    let settings = &server.button_settings;
    let toggles = [
        ("row", settings.row_enabled()),
        ("ip", settings.shows_ip()),
        ("port", settings.shows_port()),
        ("players", settings.shows_players()),
    ];
    let overview = toggles
        .iter()
        .map(|(key, on)| {
            format!(
                "{} {}: {}",
                if *on { "✅" } else { "❌" },
                tr.get(&format!("setup.buttons.{key}")),
                on_off(tr, *on)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let description = match note {
        Some(note) => format!("{note}\n\n{overview}"),
        None => overview,
    };
    let embed = menu_embed(
        tr.with("setup.buttons.optionsTitle", &[("serverName", server.server_name.clone())]),
        description,
    );

    let options = toggles
        .iter()
        .map(|(key, on)| option(tr.get(&format!("setup.buttons.{key}")), *key).description(on_off(tr, *on)))
        .collect();

    MenuView::new(embed)
        .row(string_select(
            ids::indexed(ids::BUTTON_TOGGLE, idx),
            tr.get("setup.buttons.optionsPlaceholder"),
            options,
        ))
        .row(back_row(tr, "buttons"))
}

pub fn permissions_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig, note: Option<String>) -> MenuView {
    let settings = &config.setup_permissions;
    let admins = tr.get(if settings.allow_administrator {
        "setup.permissions.admins"
    } else {
        "setup.permissions.adminsDisabled"
    });
    let roles = if settings.allowed_roles.is_empty() {
        tr.get("setup.permissions.noRoles")
    } else {
        settings
            .allowed_roles
            .iter()
            .map(|role| format!("<@&{role}>"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut description = tr.get("setup.permissions.description");
    if let Some(note) = note {
        description = format!("{note}\n\n{description}");
    }
    let embed = menu_embed(tr.get("setup.permissions.title"), format!("{description}\n\n{admins}"))
        .field(tr.get("setup.permissions.allowedRoles"), truncate(&roles, FIELD_LIMIT), false);

    let options = vec![option(tr.get("setup.permissions.actions.roles.label"), "roles")
        .description(tr.get("setup.permissions.actions.roles.description"))
        .emoji('🎭')];

    MenuView::new(embed)
        .row(string_select(
            ids::PERMISSIONS_ACTION,
            tr.get("setup.permissions.placeholder"),
            options,
        ))
        .row(back_row(tr, "permissions"))
}

pub fn role_picker<S: TextStore>(tr: &Tr<'_, S>) -> MenuView {
    let embed = menu_embed(
        tr.get("setup.permissions.title"),
        tr.get("setup.permissions.actions.roles.description"),
    );
    let select = serenity::CreateSelectMenu::new(
        ids::ROLE_TOGGLE,
        serenity::CreateSelectMenuKind::Role { default_roles: None },
    )
    .placeholder(tr.get("setup.permissions.rolePlaceholder"));

    MenuView::new(embed)
        .row(serenity::CreateActionRow::SelectMenu(select))
        .row(back_row(tr, "permissions"))
}

pub fn global_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig, note: Option<String>) -> MenuView {
    let mut description = tr.get("setup.global.description");
    if let Some(note) = note {
        description = format!("{note}\n\n{description}");
    }
    let embed = menu_embed(tr.get("setup.global.title"), description)
        .field(tr.get("setup.global.currentFooter"), format!("`{}`", config.footer_text), false)
        .field(
            tr.get("setup.global.currentColors"),
            format!("🟢 `{}`\n🔴 `{}`", config.embed_colors.online, config.embed_colors.offline),
            false,
        );

    let options = [("footer", '📝'), ("colors", '🎨')]
        .into_iter()
        .map(|(value, emoji)| {
            let base = format!("setup.global.actions.{value}");
            option(tr.get(&format!("{base}.label")), value)
                .description(truncate(&tr.get(&format!("{base}.description")), LABEL_LIMIT))
                .emoji(emoji)
        })
        .collect();

    MenuView::new(embed)
        .row(string_select(ids::GLOBAL_ACTION, tr.get("setup.global.placeholder"), options))
        .row(back_row(tr, "global"))
}

pub fn texts_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    let current = config.effective_language(None);
    let embed = menu_embed(
        tr.get("setup.texts.title"),
        tr.with(
            "setup.texts.description",
            &[("language", tr.texts.language_label(current, config))],
        ),
    );
    let options = [("global_language", "globalLanguage", '🌍'), ("server_language", "serverLanguage", '🎮')]
        .into_iter()
        .map(|(value, key, emoji)| {
            let base = format!("setup.texts.actions.{key}");
            option(tr.get(&format!("{base}.label")), value)
                .description(truncate(&tr.get(&format!("{base}.description")), LABEL_LIMIT))
                .emoji(emoji)
        })
        .collect();

    MenuView::new(embed)
        .row(string_select(ids::TEXTS_ACTION, tr.get("setup.texts.placeholder"), options))
        .row(back_row(tr, "texts"))
}

fn language_options<S: TextStore>(
    tr: &Tr<'_, S>,
    config: &GuildConfig,
    current: &str,
    include_global: bool,
) -> Vec<serenity::CreateSelectMenuOption> {
    let mut options = Vec::new();
    if include_global {
        options.push(
            option(tr.texts.language_label(GLOBAL_LANGUAGE, config), GLOBAL_LANGUAGE)
                .default_selection(current == GLOBAL_LANGUAGE),
        );
    }
    for language in tr.texts.available_languages() {
        options.push(
            option(format!("{} {}", language.emoji, language.name), language.code.clone())
                .default_selection(language.code == current),
        );
    }
    options
}

pub fn global_language_picker<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    let current = config.effective_language(None);
    let embed = menu_embed(
        tr.get("setup.texts.title"),
        tr.with(
            "setup.texts.description",
            &[("language", tr.texts.language_label(current, config))],
        ),
    );
    MenuView::new(embed)
        .row(string_select(
            ids::GLOBAL_LANGUAGE,
            tr.get("setup.texts.languagePlaceholder"),
            language_options(tr, config, current, false),
        ))
        .row(back_row(tr, "texts"))
}

pub fn server_language_menu<S: TextStore>(tr: &Tr<'_, S>, config: &GuildConfig) -> MenuView {
    let embed = menu_embed(
        tr.get("setup.texts.title"),
        tr.get("setup.texts.actions.serverLanguage.description"),
    );
    if config.servers.is_empty() {
        let embed = embed.description(tr.get("setup.common.noServers"));
        return MenuView::new(embed).row(back_row(tr, "texts"));
    }
    MenuView::new(embed)
        .row(server_select(
            config,
            ids::SERVER_LANGUAGE_SELECT,
            tr.get("setup.common.serverPlaceholder"),
            |server| {
                tr.with(
                    "setup.texts.serverDescription",
                    &[(
                        "language",
                        tr.texts.language_label(&server.text_settings.language, config),
                    )],
                )
            },
        ))
        .row(back_row(tr, "texts"))
}

pub fn server_language_picker<S: TextStore>(
    tr: &Tr<'_, S>,
    config: &GuildConfig,
    idx: usize,
    server: &MonitoredServer,
) -> MenuView {
    let current = server.text_settings.language.as_str();
    let embed = menu_embed(
        tr.with("setup.texts.serverTitle", &[("serverName", server.server_name.clone())]),
        tr.with(
            "setup.texts.serverDescription",
            &[("language", tr.texts.language_label(current, config))],
        ),
    );
    MenuView::new(embed)
        .row(string_select(
            ids::indexed(ids::SERVER_LANGUAGE_CHANGE, idx),
            tr.get("setup.texts.languagePlaceholder"),
            language_options(tr, config, current, true),
        ))
        .row(back_row(tr, "texts"))
}

/// Result screen with a way back to the main menu.
pub fn success<S: TextStore>(tr: &Tr<'_, S>, title: String, description: String, menu: &str) -> MenuView {
    let embed = serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(SUCCESS_COLOR);
    MenuView::new(embed).row(back_row(tr, menu))
}

pub fn notice(text: String) -> MenuView {
    MenuView::new(serenity::CreateEmbed::new().description(text).color(ERROR_COLOR))
}

pub fn session_expired<S: TextStore>(tr: &Tr<'_, S>) -> MenuView {
    let embed = serenity::CreateEmbed::new()
        .title(tr.get("errors.sessionExpired.title"))
        .description(tr.get("errors.sessionExpired.description"))
        .field(
            tr.get("errors.sessionExpired.tip"),
            tr.get("errors.sessionExpired.tipText"),
            false,
        )
        .color(ERROR_COLOR);
    MenuView::new(embed)
}

pub fn missing_permissions<S: TextStore>(tr: &Tr<'_, S>, channel_id: u64, list: String) -> MenuView {
    let embed = serenity::CreateEmbed::new()
        .title(tr.get("errors.missingPermissions.title"))
        .description(format!(
            "{}\n\n{list}",
            tr.with(
                "errors.missingPermissions.description",
                &[("channel", channel_mention(channel_id))]
            )
        ))
        .footer(serenity::CreateEmbedFooter::new(tr.get("errors.missingPermissions.footer")))
        .color(ERROR_COLOR);
    MenuView::new(embed)
}

/// A server typed into the add modal, waiting for its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingServer {
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl PendingServer {
    pub fn display_address(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.address.clone()
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

/// A text channel offered in the add flow and whether the bot can post there.
pub struct ChannelChoice {
    pub id: u64,
    pub name: String,
    pub ready: bool,
}

pub fn channel_picker<S: TextStore>(
    tr: &Tr<'_, S>,
    pending: &PendingServer,
    channels: &[ChannelChoice],
    custom_id: &str,
) -> MenuView {
    let mut description = tr.with(
        "setup.servers.channelSelect.description",
        &[
            ("serverName", pending.name.clone()),
            ("address", pending.display_address()),
        ],
    );
    let not_ready = channels.iter().take(MAX_OPTIONS).filter(|c| !c.ready).count();
    if not_ready > 0 {
        description = format!(
            "{description}\n\n{}",
            tr.with(
                "setup.servers.channelSelect.warning",
                &[("count", not_ready.to_string())]
            )
        );
    }
    let embed = menu_embed(tr.get("setup.servers.channelSelect.title"), description);

    let options = channels
        .iter()
        .map(|channel| {
            let (emoji, status) = if channel.ready {
                ('✅', tr.get("setup.servers.channelSelect.ready"))
            } else {
                ('⚠', tr.get("setup.servers.channelSelect.missing"))
            };
            option(format!("#{}", channel.name), channel.id.to_string())
                .description(status)
                .emoji(emoji)
        })
        .collect();

    MenuView::new(embed).row(string_select(
        custom_id,
        tr.get("setup.servers.channelSelect.placeholder"),
        options,
    ))
}

/// Ready channels first, then Discord's order; at most one select menu's worth.
pub fn order_channel_choices(mut channels: Vec<ChannelChoice>) -> Vec<ChannelChoice> {
    // Stable sort keeps the incoming position order within each group.
    channels.sort_by_key(|c| !c.ready);
    channels.truncate(MAX_OPTIONS);
    channels
}

fn short_input(label: String, custom_id: &str) -> serenity::CreateInputText {
    serenity::CreateInputText::new(serenity::InputTextStyle::Short, label, custom_id)
}

pub fn server_modal<S: TextStore>(tr: &Tr<'_, S>, existing: Option<(usize, &MonitoredServer)>) -> serenity::CreateModal {
    let (custom_id, title) = match existing {
        Some((idx, _)) => (
            ids::indexed(ids::MODAL_EDIT_SERVER, idx),
            tr.get("setup.servers.modal.editTitle"),
        ),
        None => (
            ids::MODAL_ADD_SERVER.to_string(),
            tr.get("setup.servers.modal.addTitle"),
        ),
    };
    let server = existing.map(|(_, s)| s);

    let mut name = short_input(tr.get("setup.servers.modal.name"), INPUT_NAME)
        .required(true)
        .max_length(100);
    let mut address = short_input(tr.get("setup.servers.modal.address"), INPUT_ADDRESS)
        .required(true)
        .max_length(255);
    let port_value = server.map_or(DEFAULT_PORT, |s| s.server_port);
    let port = short_input(tr.get("setup.servers.modal.port"), INPUT_PORT)
        .required(false)
        .max_length(5)
        .value(port_value.to_string());
    if let Some(server) = server {
        name = name.value(server.server_name.clone());
        address = address.value(server.server_ip.clone());
    }

    serenity::CreateModal::new(custom_id, truncate(&title, 45)).components(vec![
        serenity::CreateActionRow::InputText(name),
        serenity::CreateActionRow::InputText(address),
        serenity::CreateActionRow::InputText(port),
    ])
}

pub fn colors_modal<S: TextStore>(
    tr: &Tr<'_, S>,
    custom_id: String,
    title: String,
    online: &str,
    offline: &str,
) -> serenity::CreateModal {
    let online = short_input(tr.get("setup.embed.colors.online"), INPUT_COLOR_ONLINE)
        .required(true)
        .min_length(6)
        .max_length(7)
        .value(online);
    let offline = short_input(tr.get("setup.embed.colors.offline"), INPUT_COLOR_OFFLINE)
        .required(true)
        .min_length(6)
        .max_length(7)
        .value(offline);
    serenity::CreateModal::new(custom_id, truncate(&title, 45)).components(vec![
        serenity::CreateActionRow::InputText(online),
        serenity::CreateActionRow::InputText(offline),
    ])
}

pub fn footer_modal<S: TextStore>(tr: &Tr<'_, S>, current: &str) -> serenity::CreateModal {
    let footer = short_input(tr.get("setup.global.footerModal.field"), INPUT_FOOTER)
        .required(true)
        .max_length(FOOTER_LIMIT)
        .value(current);
    serenity::CreateModal::new(
        ids::MODAL_GLOBAL_FOOTER,
        truncate(&tr.get("setup.global.footerModal.title"), 45),
    )
    .components(vec![serenity::CreateActionRow::InputText(footer)])
}

/// Language code shown next to a flag, used in success messages.
pub fn language_display<S: TextStore>(tr: &Tr<'_, S>, code: &str, config: &GuildConfig) -> String {
    if code == GLOBAL_LANGUAGE {
        tr.texts.language_label(code, config)
    } else {
        format!("{} {}", language_emoji(code), tr.texts.language_name(code))
    }
}
