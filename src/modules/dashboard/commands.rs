use crate::{Context, Data, Error};

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![dashboard()]
}

/// Open dashboard
#[poise::command(slash_command, ephemeral)]
pub async fn dashboard(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(ctx.data().dashboard_url.clone()).await?;
    Ok(())
}
