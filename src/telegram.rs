//! Telegram transport built on teloxide.
//!
//! Translates updates into [`Action`]s for the [`Router`] and implements
//! [`ChatSink`] on top of the Bot API. The dispatcher runs updates from one
//! chat sequentially and different chats concurrently.

use crate::errors::SendError;
use crate::outputs::{ChatSink, Keyboard, OutboundMessage};
use crate::router::{Action, Router};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, info, instrument, warn};

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show the category menu")]
    Start,
}

/// Outbound side of one Telegram interaction.
///
/// `message_id` is the message the interaction started from (the menu the
/// user tapped). Without one, edits fall back to new messages.
pub struct TelegramSink {
    bot: Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl TelegramSink {
    pub fn new(bot: Bot, chat_id: ChatId, message_id: Option<MessageId>) -> Self {
        Self {
            bot,
            chat_id,
            message_id,
        }
    }
}

fn inline_markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| InlineKeyboardButton::callback(button.label, button.action))
            .collect::<Vec<_>>()
    }))
}

fn send_error(e: RequestError) -> SendError {
    SendError(e.to_string())
}

#[async_trait]
impl ChatSink for TelegramSink {
    async fn send(&self, message: OutboundMessage) -> Result<(), SendError> {
        let mut request = self
            .bot
            .send_message(self.chat_id, message.text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = message.keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        request.await.map(|_| ()).map_err(send_error)
    }

    async fn edit(&self, message: OutboundMessage) -> Result<(), SendError> {
        let Some(message_id) = self.message_id else {
            return self.send(message).await;
        };

        let mut request = self
            .bot
            .edit_message_text(self.chat_id, message_id, message.text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = message.keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        match request.await {
            Ok(_) => Ok(()),
            // Editing to identical content (e.g. "subscribe" tapped twice).
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(send_error(e)),
        }
    }
}

async fn route(router: &Router, action: Action, sink: &TelegramSink) {
    match router.handle(action, sink).await {
        Ok(outcome) => debug!(?outcome, chat_id = ?sink.chat_id, "Interaction finished"),
        Err(e) => error!(error = %e, chat_id = ?sink.chat_id, "Interaction aborted"),
    }
}

async fn on_command(bot: Bot, msg: Message, cmd: Command, router: Arc<Router>) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            info!(chat_id = ?msg.chat.id, "Start command");
            let sink = TelegramSink::new(bot, msg.chat.id, None);
            route(&router, Action::Start, &sink).await;
        }
    }
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, router: Arc<Router>) -> ResponseResult<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let Some(message) = q.message.as_ref() else {
        warn!("Callback query without an attached message");
        return Ok(());
    };
    let Some(payload) = q.data.as_deref() else {
        debug!("Callback query without data");
        return Ok(());
    };

    let action = Action::from_payload(payload);
    info!(chat_id = ?message.chat().id, ?action, "Callback action");
    let sink = TelegramSink::new(bot, message.chat().id, Some(message.id()));
    route(&router, action, &sink).await;
    Ok(())
}

/// Serve updates until Ctrl-C.
#[instrument(level = "info", skip_all)]
pub async fn run(bot: Bot, router: Arc<Router>) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(Update::filter_callback_query().endpoint(on_callback));

    info!("Dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("Dispatcher stopped");
}
