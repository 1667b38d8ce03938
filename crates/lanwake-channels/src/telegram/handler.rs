//! Telegram message handler and bot runner

use super::adapter::TelegramAdapter;
use crate::commands::{CommandExecutor, WakeRequest};
use crate::error::Result;
use crate::message::Reply;
use crate::util::mask_for_logging;
use std::fmt::Display;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use teloxide::{
    payloads::{AnswerCallbackQuerySetters, SendMessageSetters},
    prelude::*,
    types::{ChatId, Message as TelegramMessage, MessageId, ReplyParameters},
};
use tracing::{debug, error, info, instrument, warn};

impl TelegramAdapter {
    /// Start the bot and serve commands until shutdown (Ctrl-C)
    #[instrument(skip(self, executor))]
    pub async fn run(self: Arc<Self>, executor: Arc<CommandExecutor>) -> Result<()> {
        info!("Starting Telegram bot");

        let bot = self.bot.clone();
        let message_adapter = self.clone();
        let message_executor = executor.clone();
        let callback_adapter = self.clone();
        let callback_executor = executor;

        let handler = dptree::entry()
            .branch(
                Update::filter_message().endpoint(move |bot: Bot, msg: TelegramMessage| {
                    let adapter = message_adapter.clone();
                    let executor = message_executor.clone();
                    async move { Self::handle_message(adapter, executor, bot, msg).await }
                }),
            )
            .branch(
                Update::filter_callback_query().endpoint(move |bot: Bot, query: CallbackQuery| {
                    let adapter = callback_adapter.clone();
                    let executor = callback_executor.clone();
                    async move { Self::handle_callback(adapter, executor, bot, query).await }
                }),
            );

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram bot stopped");
        Ok(())
    }

    /// Handle an incoming text message
    pub(crate) async fn handle_message(
        adapter: Arc<Self>,
        executor: Arc<CommandExecutor>,
        bot: Bot,
        msg: TelegramMessage,
    ) -> ResponseResult<()> {
        let Some(normalized) = adapter.normalize_message(&msg) else {
            return Ok(());
        };

        info!(
            chat_id = %normalized.channel_id,
            user_id = %normalized.user_id,
            text = %mask_for_logging(&normalized.text),
            "Received message"
        );

        let Some(reply) = executor
            .handle_text(&normalized.user_id, &normalized.text)
            .await
        else {
            debug!(user_id = %normalized.user_id, "Ignoring non-command message");
            return Ok(());
        };

        Self::send_reply(&bot, msg.chat.id, Some(msg.id), reply).await;
        Ok(())
    }

    /// Handle a wake-button press
    pub(crate) async fn handle_callback(
        adapter: Arc<Self>,
        executor: Arc<CommandExecutor>,
        bot: Bot,
        query: CallbackQuery,
    ) -> ResponseResult<()> {
        let user_id = query.from.id.0;
        let chat_id = query.message.as_ref().map(|m| m.chat().id);

        if !adapter.is_user_allowed(user_id as i64) {
            debug!(user_id = %user_id, "Callback from user not allowed");
            bot.answer_callback_query(query.id.clone()).await?;
            return Ok(());
        }

        let request = query
            .data
            .as_deref()
            .and_then(|data| WakeRequest::from_callback(user_id.to_string(), data));

        let Some(request) = request else {
            warn!(user_id = %user_id, data = ?query.data, "Unrecognized callback data");
            bot.answer_callback_query(query.id.clone()).await?;
            return Ok(());
        };

        info!(user_id = %user_id, name = %request.name, "Wake button pressed");
        let reply = executor.wake(request).await;

        // The wake already happened; the chat reply goes out even when the
        // acknowledgement is rejected (expired query, network hiccup).
        let ack = bot
            .answer_callback_query(query.id.clone())
            .text(reply.text.clone())
            .into_future();
        let chat_reply = async {
            if let Some(chat_id) = chat_id {
                Self::send_reply(&bot, chat_id, None, reply).await;
            }
        };
        acknowledge_then_reply(ack, chat_reply).await;
        Ok(())
    }

    async fn send_reply(bot: &Bot, chat_id: ChatId, reply_to: Option<MessageId>, reply: Reply) {
        let mut request = bot.send_message(chat_id, &reply.text);
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        if let Some(keyboard) = Self::build_keyboard(&reply.buttons) {
            request = request.reply_markup(keyboard);
        }

        match request.await {
            Ok(sent) => {
                debug!(chat_id = %chat_id, message_id = %sent.id, "Sent reply");
            }
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "Failed to send reply");
            }
        }
    }
}

/// Await a callback acknowledgement, then the chat reply
///
/// A failed acknowledgement is logged and never suppresses the reply.
async fn acknowledge_then_reply<T, E: Display>(
    ack: impl Future<Output = std::result::Result<T, E>>,
    reply: impl Future<Output = ()>,
) {
    if let Err(e) = ack.await {
        warn!(error = %e, "Failed to answer callback query");
    }
    reply.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_reply_sent_when_ack_fails() {
        let replied = AtomicBool::new(false);
        acknowledge_then_reply(async { Err::<(), _>("query is too old") }, async {
            replied.store(true, Ordering::SeqCst);
        })
        .await;
        assert!(replied.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_reply_sent_after_ack() {
        let replied = AtomicBool::new(false);
        acknowledge_then_reply(async { Ok::<_, &str>(true) }, async {
            replied.store(true, Ordering::SeqCst);
        })
        .await;
        assert!(replied.load(Ordering::SeqCst));
    }
}
