// Dispatches component and modal interactions of the setup menus.
//
// Every change follows the same path: reload the guild config, mutate,
// save, then restart monitoring so the status messages pick it up.

use super::custom_ids::{self as ids, ModalAction, SetupAction, StatusButton};
use super::menus::{self, MenuView, Tr, FOOTER_LIMIT, INTERVAL_CHOICES};
use super::server_flow::{self, input_value};
use super::status_buttons;
use crate::core::config::{normalize_hex_color, GuildConfig, DEFAULT_FOOTER, GLOBAL_LANGUAGE};
use crate::core::permissions::toggle_allowed_role;
use crate::discord::commands::{guild_name, member_may_setup, Texts};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

type Translator<'a> = Tr<'a, crate::infra::texts::FileTextStore>;

pub async fn handle_interaction(
    ctx: &serenity::Context,
    data: &Data,
    interaction: &serenity::Interaction,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(mci) => handle_component(ctx, data, mci).await,
        serenity::Interaction::Modal(modal) => handle_modal(ctx, data, modal).await,
        _ => Ok(()),
    }
}

fn ephemeral(text: String) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(text)
            .ephemeral(true),
    )
}

fn selected(mci: &serenity::ComponentInteraction) -> Option<&str> {
    match &mci.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().map(String::as_str)
        }
        _ => None,
    }
}

fn selected_index(mci: &serenity::ComponentInteraction) -> Option<usize> {
    selected(mci)?.parse().ok()
}

/// Tells the user something went wrong, whether or not the interaction was already answered.
async fn report_component_failure(
    ctx: &serenity::Context,
    mci: &serenity::ComponentInteraction,
    text: String,
) {
    if mci.create_response(&ctx.http, ephemeral(text.clone())).await.is_err() {
        let followup = serenity::CreateInteractionResponseFollowup::new()
            .content(text)
            .ephemeral(true);
        if let Err(e) = mci.create_followup(&ctx.http, followup).await {
            tracing::warn!("Failed to report interaction error: {}", e);
        }
    }
}

async fn report_modal_failure(ctx: &serenity::Context, modal: &serenity::ModalInteraction, text: String) {
    if modal.create_response(&ctx.http, ephemeral(text.clone())).await.is_err() {
        let followup = serenity::CreateInteractionResponseFollowup::new()
            .content(text)
            .ephemeral(true);
        if let Err(e) = modal.create_followup(&ctx.http, followup).await {
            tracing::warn!("Failed to report interaction error: {}", e);
        }
    }
}

async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    mci: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let custom_id = mci.data.custom_id.as_str();

    if let Some(button) = StatusButton::parse(custom_id) {
        if let Err(e) = status_buttons::handle(ctx, data, mci, button).await {
            tracing::error!(custom_id, "Status button failed: {}", e);
            let language = data.guild_language(mci.guild_id).await;
            report_component_failure(ctx, mci, data.texts.get(&language, "commands.errors.generalError", &[])).await;
        }
        return Ok(());
    }

    let Some(action) = SetupAction::parse(custom_id) else {
        return Ok(());
    };
    let Some(guild_id) = mci.guild_id else {
        return Ok(());
    };

    let mut config = data.guild_config(guild_id, &guild_name(&ctx.cache, guild_id)).await?;
    let tr = Tr::new(&data.texts, &config);
    if !mci.member.as_ref().is_some_and(|m| member_may_setup(m, &config)) {
        mci.create_response(&ctx.http, ephemeral(tr.get("commands.errors.noPermission")))
            .await?;
        return Ok(());
    }

    if let Err(e) = run_component(ctx, data, mci, action, guild_id.get(), &mut config).await {
        tracing::error!(guild_id = guild_id.get(), custom_id, "Setup interaction failed: {}", e);
        report_component_failure(ctx, mci, tr.get("commands.errors.generalError")).await;
    }
    Ok(())
}

async fn save(data: &Data, guild_id: u64, config: &GuildConfig) -> Result<(), Error> {
    data.config.save_guild(guild_id, config).await?;
    Ok(())
}

async fn save_and_restart(data: &Data, guild_id: u64, config: &GuildConfig) -> Result<(), Error> {
    save(data, guild_id, config).await?;
    data.monitoring.start_monitoring(guild_id).await?;
    Ok(())
}

fn server_gone(tr: &Translator<'_>) -> MenuView {
    menus::notice(tr.get("errors.serverNotFound"))
}

async fn run_component(
    ctx: &serenity::Context,
    data: &Data,
    mci: &serenity::ComponentInteraction,
    action: SetupAction,
    guild_id: u64,
    config: &mut GuildConfig,
) -> Result<(), Error> {
    let texts: &Texts = &data.texts;
    let tr = Tr::new(texts, config);
    let default_ms = data.config.defaults().await.update_interval;

    let view = match action {
        SetupAction::MainMenu | SetupAction::Back => match (action, selected(mci)) {
            (SetupAction::MainMenu, Some("servers")) => menus::servers_menu(&tr, config),
            (SetupAction::MainMenu, Some("intervals")) => menus::intervals_menu(&tr, config, default_ms),
            (SetupAction::MainMenu, Some("embed")) => menus::embed_menu(&tr, config),
            (SetupAction::MainMenu, Some("buttons")) => menus::buttons_menu(&tr, config),
            (SetupAction::MainMenu, Some("permissions")) => menus::permissions_menu(&tr, config, None),
            (SetupAction::MainMenu, Some("global")) => menus::global_menu(&tr, config, None),
            (SetupAction::MainMenu, Some("texts")) => menus::texts_menu(&tr, config),
            _ => menus::main_menu(&tr),
        },

        SetupAction::ServersAction => match selected(mci) {
            Some("add") => {
                let modal = menus::server_modal(&tr, None);
                mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                    .await?;
                return Ok(());
            }
            Some("edit") => menus::edit_server_picker(&tr, config),
            Some("delete") => menus::delete_server_picker(&tr, config),
            _ => menus::servers_menu(&tr, config),
        },

        SetupAction::EditServerSelect => {
            let Some((idx, server)) = selected_index(mci).and_then(|i| config.servers.get(i).map(|s| (i, s)))
            else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            let modal = menus::server_modal(&tr, Some((idx, server)));
            mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                .await?;
            return Ok(());
        }

        SetupAction::DeleteServerSelect => {
            let Some(idx) = selected_index(mci).filter(|i| *i < config.servers.len()) else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            // Deleting the message can take longer than the interaction deadline.
            mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Acknowledge)
                .await?;

            // No tick may repost the message between its deletion and the save.
            data.monitoring.stop_monitoring(guild_id);
            let server = config.servers.remove(idx);
            if let Err(e) = data.monitoring.remove_server(guild_id, &server).await {
                tracing::warn!(guild_id, server = %server.server_name, "Failed to remove status message: {}", e);
            }
            save_and_restart(data, guild_id, config).await?;
            tracing::info!(guild_id, server = %server.server_name, "Server deleted");

            let done = menus::success(
                &tr,
                tr.get("setup.servers.deleted.title"),
                tr.with(
                    "setup.servers.deleted.description",
                    &[("serverName", server.server_name.clone())],
                ),
                "servers",
            );
            mci.edit_response(&ctx.http, done.edit()).await?;
            return Ok(());
        }

        SetupAction::IntervalsSelect => match selected_index(mci).and_then(|i| config.servers.get(i).map(|s| (i, s))) {
            Some((idx, server)) => menus::interval_options(&tr, idx, server, default_ms),
            None => server_gone(&tr),
        },

        SetupAction::IntervalSet(idx) => {
            let interval = selected(mci)
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| INTERVAL_CHOICES.iter().any(|(choice, _)| choice == ms));
            let (Some(interval), Some(server)) = (interval, config.servers.get_mut(idx)) else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            server.update_interval = Some(interval);
            let name = server.server_name.clone();
            save_and_restart(data, guild_id, config).await?;
            tracing::info!(guild_id, server = %name, interval, "Update interval changed");

            menus::success(
                &tr,
                tr.get("setup.intervals.success.title"),
                tr.with(
                    "setup.intervals.success.description",
                    &[
                        ("serverName", name),
                        ("interval", menus::format_interval(interval)),
                    ],
                ),
                "intervals",
            )
        }

        SetupAction::EmbedSelect => match selected_index(mci).and_then(|i| config.servers.get(i).map(|s| (i, s))) {
            Some((idx, server)) => menus::embed_options(&tr, idx, server),
            None => server_gone(&tr),
        },

        SetupAction::EmbedOption(idx) => {
            let guild_colors = config.embed_colors.clone();
            let Some(server) = config.servers.get_mut(idx) else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            match selected(mci) {
                Some("colors") => {
                    let online = server
                        .embed_settings
                        .color_online
                        .clone()
                        .unwrap_or(guild_colors.online);
                    let offline = server
                        .embed_settings
                        .color_offline
                        .clone()
                        .unwrap_or(guild_colors.offline);
                    let modal = menus::colors_modal(
                        &tr,
                        ids::indexed(ids::MODAL_COLORS, idx),
                        tr.get("setup.embed.colors.modalTitle"),
                        &online,
                        &offline,
                    );
                    mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                        .await?;
                    return Ok(());
                }
                Some("fields") => menus::embed_fields(&tr, idx, server, None),
                Some("icon") => {
                    server.use_server_icon = !server.use_server_icon;
                    let enabled = server.use_server_icon;
                    let server = server.clone();
                    save(data, guild_id, config).await?;
                    let key = if enabled {
                        "setup.embed.icon.enabled"
                    } else {
                        "setup.embed.icon.disabled"
                    };
                    let done = menus::success(
                        &tr,
                        tr.get("setup.embed.options.icon.label"),
                        tr.with(key, &[("serverName", server.server_name.clone())]),
                        "embed",
                    );
                    mci.create_response(&ctx.http, done.update()).await?;
                    data.monitoring.refresh_server(guild_id, &server).await?;
                    return Ok(());
                }
                _ => menus::embed_options(&tr, idx, server),
            }
        }

        SetupAction::EmbedFields(idx) => {
            let Some(server) = config.servers.get_mut(idx) else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            let settings = &mut server.embed_settings;
            match selected(mci) {
                Some("ip") => settings.show_ip = Some(!settings.shows_ip()),
                Some("port") => settings.show_port = Some(!settings.shows_port()),
                Some("players") => settings.show_players = Some(!settings.shows_players()),
                Some("motd") => settings.show_motd = Some(!settings.shows_motd()),
                _ => {}
            }
            let server = server.clone();
            save_and_restart(data, guild_id, config).await?;
            menus::embed_fields(&tr, idx, &server, Some(tr.get("setup.embed.fields.success")))
        }

        SetupAction::ButtonsSelect => match selected_index(mci).and_then(|i| config.servers.get(i).map(|s| (i, s))) {
            Some((idx, server)) => menus::button_options(&tr, idx, server, None),
            None => server_gone(&tr),
        },

        SetupAction::ButtonToggle(idx) => {
            let Some(server) = config.servers.get_mut(idx) else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            let settings = &mut server.button_settings;
            match selected(mci) {
                Some("row") => settings.enabled = Some(!settings.row_enabled()),
                Some("ip") => settings.show_ip_button = Some(!settings.shows_ip()),
                Some("port") => settings.show_port_button = Some(!settings.shows_port()),
                Some("players") => settings.show_players_button = Some(!settings.shows_players()),
                _ => {}
            }
            let server = server.clone();
            save_and_restart(data, guild_id, config).await?;
            menus::button_options(&tr, idx, &server, Some(tr.get("setup.buttons.success")))
        }

        SetupAction::PermissionsAction => match selected(mci) {
            Some("roles") => menus::role_picker(&tr),
            _ => menus::permissions_menu(&tr, config, None),
        },

        SetupAction::RoleToggle => {
            let role = match &mci.data.kind {
                serenity::ComponentInteractionDataKind::RoleSelect { values } => values.first().copied(),
                _ => None,
            };
            let Some(role) = role else {
                return respond(ctx, mci, menus::permissions_menu(&tr, config, None)).await;
            };
            let added = toggle_allowed_role(&mut config.setup_permissions, role.get());
            save(data, guild_id, config).await?;
            tracing::info!(guild_id, role_id = role.get(), added, "Setup role toggled");

            let key = if added {
                "setup.permissions.roleAdded"
            } else {
                "setup.permissions.roleRemoved"
            };
            let note = tr.with(key, &[("role", format!("<@&{}>", role.get()))]);
            menus::permissions_menu(&tr, config, Some(note))
        }

        SetupAction::GlobalAction => match selected(mci) {
            Some("footer") => {
                let modal = menus::footer_modal(&tr, &config.footer_text);
                mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                    .await?;
                return Ok(());
            }
            Some("colors") => {
                let modal = menus::colors_modal(
                    &tr,
                    ids::MODAL_GLOBAL_COLORS.to_string(),
                    tr.get("setup.global.colorsModal.title"),
                    &config.embed_colors.online,
                    &config.embed_colors.offline,
                );
                mci.create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                    .await?;
                return Ok(());
            }
            _ => menus::global_menu(&tr, config, None),
        },

        SetupAction::TextsAction => match selected(mci) {
            Some("global_language") => menus::global_language_picker(&tr, config),
            Some("server_language") => menus::server_language_menu(&tr, config),
            _ => menus::texts_menu(&tr, config),
        },

        SetupAction::GlobalLanguage => {
            let Some(language) = selected(mci).filter(|code| texts.has_language(code)) else {
                return respond(ctx, mci, menus::texts_menu(&tr, config)).await;
            };
            config.global_text_settings.default_language = language.to_string();
            save_and_restart(data, guild_id, config).await?;
            tracing::info!(guild_id, language, "Default language changed");

            // Answer in the newly chosen language.
            let tr = Tr::new(texts, config);
            menus::success(
                &tr,
                tr.get("setup.texts.title"),
                tr.with(
                    "setup.texts.globalSuccess",
                    &[("language", menus::language_display(&tr, language, config))],
                ),
                "texts",
            )
        }

        SetupAction::ServerLanguageSelect => {
            match selected_index(mci).and_then(|i| config.servers.get(i).map(|s| (i, s))) {
                Some((idx, server)) => menus::server_language_picker(&tr, config, idx, server),
                None => server_gone(&tr),
            }
        }

        SetupAction::ServerLanguageChange(idx) => {
            let language = selected(mci)
                .filter(|code| *code == GLOBAL_LANGUAGE || texts.has_language(code))
                .map(str::to_owned);
            let (Some(language), Some(server)) = (language, config.servers.get_mut(idx)) else {
                return respond(ctx, mci, server_gone(&tr)).await;
            };
            server.text_settings.language = language.clone();
            let name = server.server_name.clone();
            save_and_restart(data, guild_id, config).await?;
            tracing::info!(guild_id, server = %name, %language, "Server language changed");

            menus::success(
                &tr,
                tr.get("setup.texts.title"),
                tr.with(
                    "setup.texts.serverSuccess",
                    &[
                        ("serverName", name),
                        ("language", menus::language_display(&tr, &language, config)),
                    ],
                ),
                "texts",
            )
        }
    };

    respond(ctx, mci, view).await
}

async fn respond(
    ctx: &serenity::Context,
    mci: &serenity::ComponentInteraction,
    view: MenuView,
) -> Result<(), Error> {
    mci.create_response(&ctx.http, view.update()).await?;
    Ok(())
}

async fn handle_modal(
    ctx: &serenity::Context,
    data: &Data,
    modal: &serenity::ModalInteraction,
) -> Result<(), Error> {
    let custom_id = modal.data.custom_id.as_str();
    let Some(action) = ModalAction::parse(custom_id) else {
        return Ok(());
    };
    let Some(guild_id) = modal.guild_id else {
        return Ok(());
    };

    let mut config = data.guild_config(guild_id, &guild_name(&ctx.cache, guild_id)).await?;
    let tr = Tr::new(&data.texts, &config);
    if !modal.member.as_ref().is_some_and(|m| member_may_setup(m, &config)) {
        modal
            .create_response(&ctx.http, ephemeral(tr.get("commands.errors.noPermission")))
            .await?;
        return Ok(());
    }

    let result = match action {
        ModalAction::AddServer => server_flow::add_server(ctx, data, modal, guild_id).await,
        _ => run_modal(ctx, data, modal, action, guild_id.get(), &mut config).await,
    };
    if let Err(e) = result {
        tracing::error!(guild_id = guild_id.get(), custom_id, "Setup modal failed: {}", e);
        report_modal_failure(ctx, modal, tr.get("commands.errors.generalError")).await;
    }
    Ok(())
}

/// Both colors must be valid; nothing is saved otherwise.
fn read_colors(modal: &serenity::ModalInteraction) -> Result<(String, String), String> {
    let read = |id: &str| {
        let raw = input_value(modal, id).unwrap_or_default();
        normalize_hex_color(&raw).ok_or(raw)
    };
    Ok((read(menus::INPUT_COLOR_ONLINE)?, read(menus::INPUT_COLOR_OFFLINE)?))
}

/// Trimmed footer, capped to the modal's limit; blank falls back to the default.
pub fn clean_footer(raw: &str) -> String {
    let footer: String = raw.trim().chars().take(FOOTER_LIMIT as usize).collect();
    if footer.is_empty() {
        DEFAULT_FOOTER.to_string()
    } else {
        footer
    }
}

async fn run_modal(
    ctx: &serenity::Context,
    data: &Data,
    modal: &serenity::ModalInteraction,
    action: ModalAction,
    guild_id: u64,
    config: &mut GuildConfig,
) -> Result<(), Error> {
    let tr = Tr::new(&data.texts, config);

    let view = match action {
        ModalAction::AddServer => return Ok(()),

        ModalAction::EditServer(idx) => {
            let form = match server_flow::read_server_form(modal) {
                Ok(form) => form,
                Err(e) => return reply(ctx, modal, menus::notice(e.text(&tr))).await,
            };
            let Some(server) = config.servers.get_mut(idx) else {
                return reply(ctx, modal, server_gone(&tr)).await;
            };
            server.server_name = form.name;
            server.server_ip = form.address;
            server.server_port = form.port;
            let server = server.clone();
            save(data, guild_id, config).await?;
            tracing::info!(guild_id, server = %server.server_name, address = %server.display_address(), "Server edited");

            let done = menus::success(
                &tr,
                tr.get("setup.servers.edited.title"),
                tr.with(
                    "setup.servers.edited.description",
                    &[
                        ("serverName", server.server_name.clone()),
                        ("address", server.display_address()),
                    ],
                ),
                "servers",
            );
            reply(ctx, modal, done).await?;
            data.monitoring.refresh_server(guild_id, &server).await?;
            return Ok(());
        }

        ModalAction::Colors(idx) => {
            let (online, offline) = match read_colors(modal) {
                Ok(colors) => colors,
                Err(value) => {
                    return reply(ctx, modal, menus::notice(tr.with("errors.invalidColor", &[("value", value)]))).await
                }
            };
            let Some(server) = config.servers.get_mut(idx) else {
                return reply(ctx, modal, server_gone(&tr)).await;
            };
            server.embed_settings.color_online = Some(online);
            server.embed_settings.color_offline = Some(offline);
            save_and_restart(data, guild_id, config).await?;
            menus::success(
                &tr,
                tr.get("setup.embed.colors.modalTitle"),
                tr.get("setup.embed.colors.success"),
                "embed",
            )
        }

        ModalAction::GlobalFooter => {
            let footer = clean_footer(&input_value(modal, menus::INPUT_FOOTER).unwrap_or_default());
            config.footer_text = footer.clone();
            save_and_restart(data, guild_id, config).await?;
            menus::global_menu(
                &tr,
                config,
                Some(tr.with("setup.global.footerModal.success", &[("footer", footer)])),
            )
        }

        ModalAction::GlobalColors => {
            let (online, offline) = match read_colors(modal) {
                Ok(colors) => colors,
                Err(value) => {
                    return reply(ctx, modal, menus::notice(tr.with("errors.invalidColor", &[("value", value)]))).await
                }
            };
            config.embed_colors.online = online;
            config.embed_colors.offline = offline;
            save_and_restart(data, guild_id, config).await?;
            menus::global_menu(&tr, config, Some(tr.get("setup.global.colorsModal.success")))
        }
    };

    reply(ctx, modal, view).await
}

async fn reply(ctx: &serenity::Context, modal: &serenity::ModalInteraction, view: MenuView) -> Result<(), Error> {
    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(view.message()),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_is_trimmed_capped_and_defaulted() {
        assert_eq!(clean_footer("  My Network  "), "My Network");
        assert_eq!(clean_footer("   "), DEFAULT_FOOTER);
        let long = "x".repeat(150);
        assert_eq!(clean_footer(&long).chars().count(), 100);
    }
}
