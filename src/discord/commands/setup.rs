use super::{guild_name, setup_permission_check};
use crate::discord::setup::menus::{self, Tr};
use crate::discord::{Context, Error};

/// Open the setup menu for status messages.
#[poise::command(slash_command, guild_only, check = "setup_permission_check")]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let name = guild_name(ctx.cache(), guild_id);
    let config = ctx.data().guild_config(guild_id, &name).await?;

    let tr = Tr::new(&ctx.data().texts, &config);
    ctx.send(menus::main_menu(&tr).reply()).await?;
    Ok(())
}
