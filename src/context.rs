use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::fetch::FileFetcher;
use crate::types::{IncomingMessage, IncomingUpdate, OutboundReply, OutgoingMessage, PhotoReference};

/// Replies collected during a single dispatch, in emission order.
///
/// Handlers only reach this through [`Context`]; the dispatcher drains it once
/// the handler has finished.
#[derive(Clone, Default)]
pub(crate) struct ReplyBuffer {
    replies: Arc<Mutex<Vec<OutboundReply>>>,
}

impl ReplyBuffer {
    async fn push(&self, reply: OutboundReply) {
        self.replies.lock().await.push(reply);
    }

    pub(crate) async fn drain(&self) -> Vec<OutboundReply> {
        std::mem::take(&mut *self.replies.lock().await)
    }
}

/// Result of a send action. The simulated platform never refuses a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplyAck {
    pub ok: bool,
}

/// Everything a handler gets for one invocation: the decoded update plus the
/// actions it may take.
pub struct Context {
    pub update: IncomingUpdate,
    replies: ReplyBuffer,
    fetcher: Arc<dyn FileFetcher>,
}

impl Context {
    pub(crate) fn new(
        update: IncomingUpdate,
        replies: ReplyBuffer,
        fetcher: Arc<dyn FileFetcher>,
    ) -> Self {
        Self {
            update,
            replies,
            fetcher,
        }
    }

    /// The chat message carried by the update.
    pub fn message(&self) -> &IncomingMessage {
        &self.update.update.message
    }

    /// Queue a reply. `parse_mode` is accepted for API parity and not recorded.
    pub async fn reply(
        &self,
        message: impl Into<OutboundReply>,
        parse_mode: Option<&str>,
    ) -> Result<ReplyAck> {
        let reply = message.into();
        debug!("Reply queued (parse_mode={:?}): {:?}", parse_mode, reply);
        self.replies.push(reply).await;
        Ok(ReplyAck { ok: true })
    }

    /// Download a photo through the platform media API.
    pub async fn get_file(&self, photo: &PhotoReference) -> Result<reqwest::Response> {
        self.fetcher.fetch(&photo.url).await
    }

    /// Platform-style API surface.
    pub fn api(&self) -> Api<'_> {
        Api { ctx: self }
    }
}

pub struct Api<'a> {
    ctx: &'a Context,
}

impl Api<'_> {
    /// Direct send. Only group delivery exists, so this is the same as a reply
    /// and `chat_id` is ignored.
    pub async fn send_message(&self, chat_id: &str, message: OutgoingMessage) -> Result<ReplyAck> {
        debug!("send_message to {} routed to reply", chat_id);
        let parse_mode = (!message.parse_mode.is_empty()).then_some(message.parse_mode.as_str());
        self.ctx.reply(message.text.as_str(), parse_mode).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{
        BotInfo, Chat, ChatType, Photo, Sender, StoredMessage, Update, UpdateType,
    };
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Records requested URLs and answers with a fixed body.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        pub(crate) urls: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl FileFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
            self.urls.lock().unwrap().push(url.to_string());
            let response = axum::http::Response::builder()
                .status(200)
                .body("PNGDATA")
                .unwrap();
            Ok(reqwest::Response::from(response))
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl FileFetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
            anyhow::bail!("connection refused: {}", url)
        }
    }

    pub(crate) fn sample_update() -> IncomingUpdate {
        IncomingUpdate {
            update_type: UpdateType::Photo,
            update: Update {
                message: IncomingMessage {
                    photo: vec![Photo {
                        file_id: PhotoReference {
                            url: "https://files.example.com/p/1.png".to_string(),
                        },
                    }],
                    from: Sender {
                        id: "7".to_string(),
                    },
                    chat: Chat {
                        chat_type: ChatType::Group,
                        id: "-1005".to_string(),
                        title: "Team".to_string(),
                    },
                    text: "look".to_string(),
                    message_id: "99".to_string(),
                },
            },
            bot: BotInfo::default(),
        }
    }

    fn context_with(fetcher: Arc<dyn FileFetcher>) -> (Context, ReplyBuffer) {
        let replies = ReplyBuffer::default();
        let ctx = Context::new(sample_update(), replies.clone(), fetcher);
        (ctx, replies)
    }

    #[tokio::test]
    async fn test_replies_keep_emission_order() {
        let (ctx, replies) = context_with(Arc::new(StubFetcher::default()));

        ctx.reply("a", None).await.unwrap();
        ctx.reply(OutboundReply::query(Vec::<StoredMessage>::new()), None)
            .await
            .unwrap();
        ctx.reply(String::from("b"), Some("MarkdownV2")).await.unwrap();

        assert_eq!(
            replies.drain().await,
            vec![
                OutboundReply::text("a"),
                OutboundReply::query(vec![]),
                OutboundReply::text("b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_reply_always_acks() {
        let (ctx, _) = context_with(Arc::new(StubFetcher::default()));
        let ack = ctx.reply("x", None).await.unwrap();
        assert!(ack.ok);
    }

    #[tokio::test]
    async fn test_send_message_matches_reply() {
        let (direct, direct_replies) = context_with(Arc::new(StubFetcher::default()));
        direct.reply("hi", Some("x")).await.unwrap();

        let (shim, shim_replies) = context_with(Arc::new(StubFetcher::default()));
        let ack = shim
            .api()
            .send_message("-100999", OutgoingMessage::new("-100999", "hi").parse_mode("x"))
            .await
            .unwrap();

        assert!(ack.ok);
        assert_eq!(direct_replies.drain().await, shim_replies.drain().await);
    }

    #[tokio::test]
    async fn test_get_file_fetches_url_once() {
        let fetcher = Arc::new(StubFetcher::default());
        let (ctx, replies) = context_with(fetcher.clone());

        let photo = ctx.message().photo[0].file_id.clone();
        let response = ctx.get_file(&photo).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "PNGDATA");
        assert_eq!(
            *fetcher.urls.lock().unwrap(),
            vec!["https://files.example.com/p/1.png".to_string()]
        );
        assert!(replies.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_file_propagates_fetch_errors() {
        let (ctx, _) = context_with(Arc::new(FailingFetcher));
        let photo = PhotoReference {
            url: "https://down.example.com/x".to_string(),
        };

        let err = ctx.get_file(&photo).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_drain_empties_buffer() {
        let (ctx, replies) = context_with(Arc::new(StubFetcher::default()));
        ctx.reply("once", None).await.unwrap();

        assert_eq!(replies.drain().await.len(), 1);
        assert!(replies.drain().await.is_empty());
    }
}
