//! HTTP front for the [`Dispatcher`]: one endpoint answering on every path.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    Json, Router,
};
use tracing::{error, info, warn};

use crate::dispatcher::{DispatchError, Dispatcher};

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new().fallback(handle).with_state(dispatcher)
}

async fn handle(State(dispatcher): State<Arc<Dispatcher>>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match dispatcher.dispatch(request).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            match &e {
                DispatchError::HandlerFault { event, source } => {
                    error!("Handler for {} failed: {:#}", event, source);
                }
                other => {
                    warn!("Rejected {} {}: {}", method, path, other);
                }
            }
            e.into_response()
        }
    }
}

/// Serve until Ctrl-C.
pub async fn serve(bind: &str, dispatcher: Arc<Dispatcher>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {bind}"))?;

    info!("Listening on http://{}", bind);

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}
