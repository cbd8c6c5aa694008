use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::webhook::{Event, parse_events};
use crate::{Result, signature};

pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    channel_secret: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, channel_secret: &str) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            channel_secret: Arc::from(channel_secret),
        }
    }
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handle_callback))
        .route("/callback", post(handle_callback))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Bind `addr` and serve webhooks until Ctrl+C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Webhook server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}

async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    debug!("Webhook delivery: {}", String::from_utf8_lossy(&body));

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if let Err(e) = signature::verify(&state.channel_secret, &body, signature) {
        warn!("Rejected webhook delivery: {e}");
        return (StatusCode::BAD_REQUEST, "Bad Request");
    }

    let events = match parse_events(&body) {
        Ok(events) => events,
        Err(e) => {
            warn!("Failed to parse webhook delivery: {e}");
            return (StatusCode::BAD_REQUEST, "Bad Request");
        }
    };
    info!("Webhook delivery with {} event(s)", events.len());

    for message in events.iter().filter_map(Event::text_message) {
        let outcome = state
            .dispatcher
            .handle_text(message.reply_token, message.user_id, message.text)
            .await;
        debug!("[{}] Dispatched: {outcome:?}", message.user_id);
    }

    (StatusCode::OK, "OK")
}
