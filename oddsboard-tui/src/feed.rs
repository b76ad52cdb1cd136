//! WebSocket feed handler for the odds-board server.
//!
//! The server speaks newline-framed JSON over websocket: credentials go up
//! as two newline-terminated lines right after connect, "*" lines in both
//! directions are keep-alives, and every other line is one message
//! discriminated by its `type` field.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use oddsboard::Inbound;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Connection status for the board server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Feed connection configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// Outbound "*" keep-alive interval.
    pub keep_alive: Duration,
    pub reconnect_delay: Duration,
    pub channel_buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:60001".to_string(),
            username: String::new(),
            password: String::new(),
            keep_alive: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
            channel_buffer_size: 1000,
        }
    }
}

impl FeedConfig {
    /// Configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("BOARD_WS_URL").unwrap_or(defaults.url),
            username: std::env::var("BOARD_USERNAME").unwrap_or_default(),
            password: std::env::var("BOARD_PASSWORD").unwrap_or_default(),
            ..defaults
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Spawn the board feed handler. Parsed messages arrive on the returned
/// receiver; connection status on `status_tx`.
pub fn spawn_board_feed(
    config: FeedConfig,
    status_tx: watch::Sender<FeedStatus>,
) -> (mpsc::Receiver<Inbound>, tokio::task::JoinHandle<()>) {
    let (message_tx, message_rx) = mpsc::channel(config.channel_buffer_size);
    let handle = tokio::spawn(async move {
        run_feed_loop(config, message_tx, status_tx).await;
    });
    (message_rx, handle)
}

/// Main connection loop with auto-reconnect.
async fn run_feed_loop(
    config: FeedConfig,
    message_tx: mpsc::Sender<Inbound>,
    status_tx: watch::Sender<FeedStatus>,
) {
    info!("Starting board feed for {}", config.url);

    loop {
        let _ = status_tx.send(FeedStatus::Reconnecting);

        match connect_async(&config.url).await {
            Ok((ws_stream, _)) => {
                info!("Connected to board server at {}", config.url);
                let _ = status_tx.send(FeedStatus::Connected);

                let (mut write, mut read) = ws_stream.split();

                // Credentials go up first, one per line.
                let login = [&config.username, &config.password];
                let mut login_failed = false;
                for line in login {
                    if write
                        .send(Message::Text(format!("{line}\n").into()))
                        .await
                        .is_err()
                    {
                        login_failed = true;
                        break;
                    }
                }
                if login_failed {
                    error!("Failed to send credentials");
                    let _ = status_tx.send(FeedStatus::Disconnected);
                    tokio::time::sleep(config.reconnect_delay).await;
                    continue;
                }

                // Keep-alive task sends "*" lines until the write half dies.
                let keep_alive = config.keep_alive;
                let (ka_shutdown_tx, mut ka_shutdown_rx) = mpsc::channel::<()>(1);
                tokio::spawn(async move {
                    let mut interval = tokio::time::interval(keep_alive);
                    loop {
                        tokio::select! {
                            _ = interval.tick() => {
                                if write.send(Message::Text("*\n".into())).await.is_err() {
                                    debug!("Keep-alive send failed, connection likely dead");
                                    break;
                                }
                            }
                            _ = ka_shutdown_rx.recv() => break,
                        }
                    }
                });

                let mut receiver_gone = false;
                while let Some(msg) = read.next().await {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if !dispatch_lines(&text, &message_tx).await {
                                warn!("Message receiver dropped, stopping feed");
                                receiver_gone = true;
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("Server closed connection");
                            break;
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                        Err(e) => {
                            error!("WebSocket error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }

                let _ = ka_shutdown_tx.send(()).await;
                let _ = status_tx.send(FeedStatus::Disconnected);
                if receiver_gone {
                    return;
                }
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", config.url, e);
                let _ = status_tx.send(FeedStatus::Disconnected);
            }
        }

        debug!("Waiting {:?} before reconnecting", config.reconnect_delay);
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Parse every newline-framed message in one frame and forward it. Returns
/// false once the receiver side is gone.
async fn dispatch_lines(text: &str, message_tx: &mpsc::Sender<Inbound>) -> bool {
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() || line == "*" {
            continue;
        }
        match serde_json::from_str::<Inbound>(line) {
            Ok(message) => {
                if message_tx.send(message).await.is_err() {
                    return false;
                }
            }
            Err(e) => {
                error!("Failed to parse message: {}", e);
                debug!("Raw message: {}", line);
            }
        }
    }
    true
}
