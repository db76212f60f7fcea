//! Change-notification feed: a `graphql-transport-ws` subscription when the
//! node offers one, a fixed-interval polling tick otherwise.
//!
//! Both variants deliver the same opaque signal, `UiEvent::Changed`.
//! Notifications carry no game data; the only reaction to one is a
//! re-fetch, and bursts collapse against the reconciler's refresh guard.

use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{sleep, timeout, Duration};
use tokio_tungstenite::connect_async;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::HeaderValue;
use tungstenite::protocol::Message;

use crate::config::{Config, Source};
use crate::gateway::escape_str;
use crate::types::UiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Ws,
    Poll,
}

/// Owned handle to the one change feed a screen is allowed to have.
/// `stop` is idempotent and never fails; dropping the handle stops the
/// feed too, so every exit path from a screen releases it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    kind: FeedKind,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl SubscriptionHandle {
    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the feed the config asks for. The WebSocket variant reports any
/// failure (connect or mid-stream) as `UiEvent::FeedLost`, and the app
/// restarts the screen's feed in polling mode.
pub fn spawn_change_feed(cfg: &Config, token: u64, tx: UnboundedSender<UiEvent>) -> SubscriptionHandle {
    match cfg.source {
        Source::Ws => spawn_ws_feed(cfg, token, tx),
        Source::Poll => spawn_poll_feed(cfg, token, tx),
    }
}

pub fn spawn_ws_feed(cfg: &Config, token: u64, tx: UnboundedSender<UiEvent>) -> SubscriptionHandle {
    let ws_url = cfg.ws_url.clone();
    let chain_id = cfg.chain_id.clone();
    let timeout_ms = cfg.rpc_timeout_ms;
    let task = tokio::spawn(async move {
        match run_ws_session(&ws_url, &chain_id, timeout_ms, token, &tx).await {
            Ok(()) => log::info!("notification stream closed by the node"),
            Err(e) => log::warn!("notification stream failed: {e:#}"),
        }
        let _ = tx.send(UiEvent::FeedLost { token });
    });
    SubscriptionHandle { kind: FeedKind::Ws, task: Some(task) }
}

pub fn spawn_poll_feed(cfg: &Config, token: u64, tx: UnboundedSender<UiEvent>) -> SubscriptionHandle {
    let interval = Duration::from_millis(cfg.poll_interval_ms);
    let task = tokio::spawn(async move {
        log::info!("⏱ polling every {}ms", interval.as_millis());
        loop {
            sleep(interval).await;
            if tx.send(UiEvent::Changed { token }).is_err() {
                break;
            }
        }
    });
    SubscriptionHandle { kind: FeedKind::Poll, task: Some(task) }
}

/// Connect, run the `graphql-transport-ws` handshake, subscribe to the
/// chain's notifications, then forward a change signal for every frame
/// whose reason is `NewBlock`. Returns when the stream ends.
async fn run_ws_session(
    ws_url: &str,
    chain_id: &str,
    timeout_ms: u64,
    token: u64,
    tx: &UnboundedSender<UiEvent>,
) -> Result<()> {
    let mut request = ws_url.into_client_request().context("bad ws url")?;
    request.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        HeaderValue::from_static("graphql-transport-ws"),
    );
    let handshake_budget = Duration::from_millis(timeout_ms);
    let (ws, _) = timeout(handshake_budget, connect_async(request))
        .await
        .context("ws connect timed out")?
        .context("ws connect failed")?;
    let (mut ws_write, mut ws_read) = ws.split();

    ws_write
        .send(Message::Text(json!({"type": "connection_init"}).to_string()))
        .await?;

    // The server must ack before we subscribe.
    loop {
        let frame = timeout(handshake_budget, ws_read.next())
            .await
            .context("ws ack timed out")?
            .ok_or_else(|| anyhow!("ws closed during handshake"))??;
        if !frame.is_text() {
            continue;
        }
        let text = frame.into_text().unwrap_or_default();
        let v: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        match v.get("type").and_then(Value::as_str) {
            Some("connection_ack") => break,
            Some("connection_error") => return Err(anyhow!("ws handshake rejected: {text}")),
            _ => continue,
        }
    }

    let subscribe = json!({
        "id": "1",
        "type": "subscribe",
        "payload": {
            "query": format!(
                "subscription {{ notifications(chainId: \"{}\") }}",
                escape_str(chain_id)
            )
        }
    });
    ws_write.send(Message::Text(subscribe.to_string())).await?;
    log::info!("🔔 subscribed to notifications for chain {chain_id}");

    while let Some(msg) = ws_read.next().await {
        let msg = msg?;
        if !msg.is_text() {
            continue;
        }
        let text = msg.into_text().unwrap_or_default();
        if let Ok(frame) = serde_json::from_str::<Value>(&text) {
            if is_new_block(&frame) && tx.send(UiEvent::Changed { token }).is_err() {
                break;
            }
        }
    }
    Ok(())
}

/// The one field a notification is trusted for: a truthy `reason.NewBlock`
/// marker inside a `next` frame. Everything else about the payload is
/// opaque and ignored.
pub(crate) fn is_new_block(frame: &Value) -> bool {
    if frame.get("type").and_then(Value::as_str) != Some("next") {
        return false;
    }
    match frame.pointer("/payload/data/notifications") {
        Some(Value::Array(items)) => items.iter().any(has_new_block_reason),
        Some(other) => has_new_block_reason(other),
        None => false,
    }
}

fn has_new_block_reason(v: &Value) -> bool {
    match v.pointer("/reason/NewBlock") {
        Some(Value::Null) | Some(Value::Bool(false)) | None => false,
        Some(_) => true,
    }
}
