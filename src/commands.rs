use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{debug, info};

use crate::context::Context;
use crate::registry::HandlerRegistry;
use crate::types::{EventName, OutboundReply, StoredMessage};

/// Demo handlers so the binary answers something useful out of the box.
/// Embedding applications build their own registry instead.
pub fn builtin_handlers(link_base: &str) -> HandlerRegistry {
    let link_base: Arc<str> = Arc::from(link_base);

    HandlerRegistry::new()
        .on(EventName::Status, status)
        .on(EventName::Ask, ask)
        .on(EventName::Query, move |ctx| query(ctx, Arc::clone(&link_base)))
        .on(EventName::Message, message)
}

async fn status(ctx: Context) -> Result<()> {
    let chat = &ctx.message().chat;
    ctx.reply(format!("Bot is running in {} ({}).", chat.title, chat.id), None)
        .await?;
    Ok(())
}

/// Echo the question, and report the size of every attached photo.
async fn ask(ctx: Context) -> Result<()> {
    let message = ctx.message();
    info!("Ask from user {}: {}", message.from.id, message.text);

    for photo in &message.photo {
        let response = ctx.get_file(&photo.file_id).await?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read photo body from {}", photo.file_id.url))?;
        ctx.reply(format!("Photo {}: {} bytes", status, bytes.len()), None)
            .await?;
    }

    ctx.reply(format!("You asked: {}", message.text), None).await?;
    Ok(())
}

/// Answer with the triggering message as a stored record plus its permalink.
async fn query(ctx: Context, link_base: Arc<str>) -> Result<()> {
    let message = ctx.message();
    let stored = StoredMessage {
        group_id: message.chat.id.clone(),
        user_name: message.from.id.clone(),
        content: message.text.clone(),
        message_id: message.message_id.clone(),
        time_stamp: 0,
    };

    match stored.link(&link_base) {
        Some(link) => ctx.reply(link, Some("HTML")).await?,
        None => ctx.reply("No link available for this chat.", None).await?,
    };
    ctx.reply(OutboundReply::query(vec![stored]), None).await?;
    Ok(())
}

async fn message(ctx: Context) -> Result<()> {
    debug!("Ignoring plain message {}", ctx.message().message_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{sample_update, StubFetcher};
    use crate::context::ReplyBuffer;

    async fn run(event: EventName) -> Vec<OutboundReply> {
        let registry = builtin_handlers("https://matrix.example.com");
        let replies = ReplyBuffer::default();
        let ctx = Context::new(
            sample_update(),
            replies.clone(),
            Arc::new(StubFetcher::default()),
        );
        registry.resolve(event).unwrap()(ctx).await.unwrap();
        replies.drain().await
    }

    #[test]
    fn test_registers_demo_events() {
        let registry = builtin_handlers("https://x");
        assert_eq!(
            registry.events(),
            vec![
                EventName::Status,
                EventName::Query,
                EventName::Ask,
                EventName::Message
            ]
        );
    }

    #[tokio::test]
    async fn test_status_names_chat() {
        let replies = run(EventName::Status).await;
        assert_eq!(
            replies,
            vec![OutboundReply::text("Bot is running in Team (-1005).")]
        );
    }

    #[tokio::test]
    async fn test_ask_reports_photo_then_question() {
        let replies = run(EventName::Ask).await;
        assert_eq!(
            replies,
            vec![
                OutboundReply::text("Photo 200 OK: 7 bytes"),
                OutboundReply::text("You asked: look"),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_replies_with_link_and_record() {
        let replies = run(EventName::Query).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(
            replies[0],
            OutboundReply::text("https://matrix.example.com/c/5/99")
        );
        match &replies[1] {
            OutboundReply::Query { payload } => {
                assert_eq!(payload.len(), 1);
                assert_eq!(payload[0].content, "look");
            }
            other => panic!("expected query reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_plain_message_is_silent() {
        assert!(run(EventName::Message).await.is_empty());
    }
}
