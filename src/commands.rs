use teloxide::{prelude::*, utils::command::BotCommands};

pub const GREETING: &str =
    "Send me an X (Twitter) URL containing a video, and I'll download it for you!";

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Start the bot.
    Start,
    /// Display this text.
    #[command(aliases = ["h", "?"])]
    Help,
}

/// Handle a command from the user.
///
/// # Errors
///
/// Returns a Teloxide error if the message fails to send.
pub async fn answer(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => bot.send_message(msg.chat.id, GREETING).await?,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?
        }
    };

    Ok(())
}
