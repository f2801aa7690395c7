use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

use crate::context::{Context, ReplyBuffer};
use crate::fetch::FileFetcher;
use crate::registry::HandlerRegistry;
use crate::types::{EventName, EventRequest, EventsResponse, IncomingUpdate};

/// Header carrying the pre-shared secret.
pub const PSK_HEADER: &str = "X-Custom-PSK";

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("missing or invalid pre-shared key")]
    Unauthorized,
    #[error("method {0} not allowed")]
    MethodNotAllowed(Method),
    #[error("unsupported content type: {0:?}")]
    UnsupportedMediaType(Option<String>),
    #[error("malformed request body: {0}")]
    BadRequest(String),
    #[error("no handler for event: {0}")]
    HandlerNotFound(String),
    #[error("handler for {event} failed")]
    HandlerFault {
        event: EventName,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Unauthorized => StatusCode::UNAUTHORIZED,
            DispatchError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            DispatchError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::HandlerNotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::HandlerFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Plain status line only; details stay in the logs.
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

/// Turns one inbound request into the replies its handler emitted.
pub struct Dispatcher {
    registry: HandlerRegistry,
    secret: String,
    fetcher: Arc<dyn FileFetcher>,
}

impl Dispatcher {
    pub fn new(
        registry: HandlerRegistry,
        secret: impl Into<String>,
        fetcher: Arc<dyn FileFetcher>,
    ) -> Self {
        Self {
            registry,
            secret: secret.into(),
            fetcher,
        }
    }

    /// Handlers this dispatcher routes to.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Authenticate, validate, route and run one request.
    ///
    /// Checks run in a fixed order (secret, method, content type, body, event)
    /// and the first failure short-circuits. Handler errors are returned as
    /// [`DispatchError::HandlerFault`] without being inspected.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<EventsResponse, DispatchError> {
        let (parts, body) = request.into_parts();

        if !self.authorized(&parts.headers) {
            return Err(DispatchError::Unauthorized);
        }
        if parts.method != Method::POST {
            return Err(DispatchError::MethodNotAllowed(parts.method));
        }
        if !is_json(&parts.headers) {
            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
            return Err(DispatchError::UnsupportedMediaType(content_type));
        }

        let bytes = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| DispatchError::BadRequest(e.to_string()))?;
        let request: EventRequest = serde_json::from_slice(&bytes)
            .map_err(|e| DispatchError::BadRequest(e.to_string()))?;

        let (event, handler) = request
            .event
            .parse::<EventName>()
            .ok()
            .and_then(|event| Some((event, self.registry.resolve(event)?)))
            .ok_or_else(|| DispatchError::HandlerNotFound(request.event.clone()))?;

        let update = IncomingUpdate::from_payload(request.payload)
            .map_err(|e| DispatchError::BadRequest(e.to_string()))?;

        info!(
            "Dispatching {} from user {} in chat {}",
            event, update.update.message.from.id, update.update.message.chat.id
        );

        let replies = ReplyBuffer::default();
        let ctx = Context::new(update, replies.clone(), Arc::clone(&self.fetcher));
        handler(ctx)
            .await
            .map_err(|source| DispatchError::HandlerFault { event, source })?;

        let events = replies.drain().await;
        debug!("Event {} produced {} reply(ies)", event, events.len());
        Ok(EventsResponse { events })
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get(PSK_HEADER)
            .is_some_and(|v| v.as_bytes() == self.secret.as_bytes())
    }
}

/// Accepts `application/json` with any parameters (`; charset=utf-8`) and in
/// any case. Stricter clients compare the raw header value exactly; this
/// endpoint only looks at the media type.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
