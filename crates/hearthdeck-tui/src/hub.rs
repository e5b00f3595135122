//! The hub client task: owns the WebSocket, translates between wire
//! JSON and typed events/commands, and reconnects with backoff.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use hearthdeck_core::wire::{self, Command, Event};
use hearthdeck_core::Config;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    Connected,
    Disconnected,
    SendFailed(String),
    Inbound { event: Event, pretty: String },
}

pub fn hub_url(config: &Config) -> Result<Url> {
    let raw = format!("{}://{}/api/websocket", config.scheme, config.server);
    Url::parse(&raw).with_context(|| format!("invalid hub url: {raw}"))
}

/// One throwaway connection attempt, made before the terminal is taken
/// over, so an unreachable hub aborts startup with a readable error.
pub async fn probe(config: &Config) -> Result<()> {
    let url = hub_url(config)?;
    let (socket, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("hub unreachable at {url}"))?;
    drop(socket);
    Ok(())
}

/// Per connection: auth (fire-and-forget), subscribe (id 1), then one
/// select loop multiplexing inbound frames and outbound commands.
/// Message ids are stamped at send time, strictly increasing within a
/// connection. A dropped link reconnects with doubling backoff; a
/// failed outbound send drops that one command and keeps the link.
pub async fn hub_loop(
    config: Config,
    tx: mpsc::UnboundedSender<HubEvent>,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
) {
    let url = match hub_url(&config) {
        Ok(url) => url,
        Err(err) => {
            warn!("hub_url_error: {err}");
            return;
        }
    };

    let mut backoff = Duration::from_secs(1);
    loop {
        let (mut socket, _) = match connect_async(url.as_str()).await {
            Ok(value) => value,
            Err(err) => {
                warn!("hub_connect_error: {err}");
                tokio::time::sleep(backoff).await;
                backoff = next_backoff(backoff);
                continue;
            }
        };
        backoff = Duration::from_secs(1);

        let mut next_id: u64 = 1;
        let handshake = [
            wire::auth_message(&config.token),
            wire::subscribe_message(next_id),
        ];
        let mut handshake_failed = false;
        for message in handshake {
            if let Err(err) = socket.send(Message::Text(message)).await {
                warn!("hub_handshake_error: {err}");
                handshake_failed = true;
                break;
            }
        }
        if handshake_failed {
            let _ = socket.close(None).await;
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
            continue;
        }
        next_id += 1;

        if tx.send(HubEvent::Connected).is_err() {
            return;
        }
        info!("hub_connected: {url}");

        loop {
            tokio::select! {
                inbound = socket.next() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            let event = wire::parse_event(&text);
                            let pretty = wire::pretty(&text);
                            if tx.send(HubEvent::Inbound { event, pretty }).is_err() {
                                return;
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!("hub_read_error: {err}");
                            break;
                        }
                        None => break,
                    }
                }
                maybe_command = command_rx.recv() => {
                    match maybe_command {
                        Some(command) => {
                            let encoded = wire::encode_command(&command, next_id);
                            next_id += 1;
                            if let Err(err) = socket.send(Message::Text(encoded)).await {
                                warn!("hub_send_error: {err}");
                                let _ = tx.send(HubEvent::SendFailed(err.to_string()));
                            }
                        }
                        None => return,
                    }
                }
            }
        }

        let _ = socket.close(None).await;
        if tx.send(HubEvent::Disconnected).is_err() {
            return;
        }
        tokio::time::sleep(backoff).await;
        backoff = next_backoff(backoff);
    }
}

fn next_backoff(current: Duration) -> Duration {
    let next = current + current;
    if next > Duration::from_secs(10) {
        Duration::from_secs(10)
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scheme: &str, server: &str) -> Config {
        Config {
            scheme: scheme.to_string(),
            server: server.to_string(),
            token: "token".to_string(),
            entities: Vec::new(),
            chordmap: Default::default(),
        }
    }

    #[test]
    fn hub_url_targets_the_websocket_path() {
        let url = hub_url(&config("ws", "hub.lan:8123")).unwrap();
        assert_eq!(url.as_str(), "ws://hub.lan:8123/api/websocket");
    }

    #[test]
    fn hub_url_rejects_unparseable_hosts() {
        assert!(hub_url(&config("ws", "")).is_err());
    }

    #[test]
    fn backoff_doubles_and_caps_at_ten_seconds() {
        let mut backoff = Duration::from_secs(1);
        let mut seen = Vec::new();
        for _ in 0..5 {
            backoff = next_backoff(backoff);
            seen.push(backoff.as_secs());
        }
        assert_eq!(seen, vec![2, 4, 8, 10, 10]);
    }
}
