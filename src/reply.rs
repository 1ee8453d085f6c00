use crate::{error::Result, media::MediaFile};
use teloxide::{
    Bot,
    payloads::{SendMessageSetters, SendVideoSetters},
    prelude::Requester,
    types::{ChatId, InputFile, Message, MessageId, ReplyParameters},
};

/// Where a request sends its answers.
#[async_trait::async_trait]
pub trait Reply: Send + Sync {
    async fn text(&self, text: &str) -> Result<()>;

    /// Upload `media` as a video attachment.
    async fn video(&self, media: &MediaFile) -> Result<()>;
}

/// Replies to a Telegram message in its chat.
#[derive(Debug, Clone)]
pub struct ChatReply {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
}

impl ChatReply {
    /// Answer `msg`, quoting it.
    #[must_use]
    pub fn to_message(bot: Bot, msg: &Message) -> Self {
        Self {
            bot,
            chat_id: msg.chat.id,
            reply_to: msg.id,
        }
    }

    #[inline]
    #[must_use]
    pub const fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

#[async_trait::async_trait]
impl Reply for ChatReply {
    async fn text(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.chat_id, text)
            .reply_parameters(ReplyParameters::new(self.reply_to))
            .await?;
        Ok(())
    }

    async fn video(&self, media: &MediaFile) -> Result<()> {
        let video = InputFile::file(media.path().to_path_buf());
        self.bot
            .send_video(self.chat_id, video)
            .supports_streaming(true)
            .reply_parameters(ReplyParameters::new(self.reply_to))
            .await?;
        Ok(())
    }
}
