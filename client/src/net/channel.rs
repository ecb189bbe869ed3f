//! Reconnecting chat channel driver.
//!
//! DESIGN
//! ======
//! `spawn_channel` starts one task that owns a `ChatState` and the socket.
//! Callers talk to it through a `ChannelHandle`: commands go in over an mpsc
//! channel, the `(status, messages)` snapshot comes out over a watch channel,
//! and individual events (appends, notices, reconnect delays) are offered on a
//! bounded mpsc that drops when the caller is not listening.
//!
//! The task is the only writer, so there is never more than one live socket.
//! Shutdown is a command like any other: it interrupts a pending connect or a
//! reconnect sleep through `select!`, so no timer outlives the handle.
//!
//! ERROR HANDLING
//! ==============
//! Transport errors never surface as `Err`; they end the session, flip the
//! status to `Disconnected` and schedule the next attempt. Undecodable frames
//! are logged and skipped.

#[cfg(test)]
#[path = "channel_test.rs"]
mod channel_test;

use std::time::Duration;

use frames::{ChatMessage, OutboundFrame, decode_inbound, encode_outbound};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, ReconnectPolicy};
use crate::state::chat::{ChatEvent, ChatState, ConnectionStatus};
use crate::util::format::now_ms;

const EVENT_BUFFER: usize = 256;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Full channel URL, token included.
    pub url: String,
    pub policy: ReconnectPolicy,
}

impl ChannelConfig {
    #[must_use]
    pub fn from_client(config: &ClientConfig, token: Option<&str>) -> Self {
        Self { url: config.chat_url(token), policy: config.reconnect }
    }

    /// The channel URL with the query (and its bearer token) removed.
    #[must_use]
    pub fn redacted_url(&self) -> &str {
        redact_url(&self.url)
    }
}

/// Strip the query string so credentials never reach the logs.
fn redact_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Latest status and message log, published after every transition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelSnapshot {
    pub status: ConnectionStatus,
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Status(ConnectionStatus),
    History(usize),
    Message(ChatMessage),
    Removed(String),
    Notice(String),
    ReconnectIn(Duration),
}

enum Command {
    Send(String),
    Delete(String),
    Shutdown,
}

#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Dropped,
    Shutdown,
}

pub struct ChannelHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<ChannelSnapshot>,
    events: mpsc::Receiver<ChannelEvent>,
    task: Option<JoinHandle<()>>,
}

/// Spawn the channel task on the current tokio runtime and start connecting.
#[must_use]
pub fn spawn_channel(config: ChannelConfig) -> ChannelHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(ChannelSnapshot::default());
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
    let driver = Driver { state: ChatState::new(config.policy), snapshot: snapshot_tx, events: event_tx };
    let task = tokio::spawn(driver.run(config.url, command_rx));
    ChannelHandle { commands: command_tx, snapshot: snapshot_rx, events: event_rx, task: Some(task) }
}

impl ChannelHandle {
    /// Send a chat message. Dropped by the task unless connected.
    pub fn send(&self, text: impl Into<String>) {
        let _ = self.commands.send(Command::Send(text.into()));
    }

    /// Delete a message by id. Dropped by the task unless connected.
    pub fn delete_message(&self, id: impl Into<String>) {
        let _ = self.commands.send(Command::Delete(id.into()));
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.snapshot.borrow().status
    }

    #[must_use]
    pub fn snapshot(&self) -> ChannelSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChannelSnapshot> {
        self.snapshot.clone()
    }

    /// Next driver event; `None` once the task has exited.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Tear down: cancel any pending reconnect, close the socket if open, and
    /// wait for the task to finish.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "chat channel task ended abnormally");
            }
        }
    }

    /// Tear down and reconnect with a new configuration (e.g. a new token).
    pub async fn restart(self, config: ChannelConfig) -> Self {
        self.shutdown().await;
        spawn_channel(config)
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

// =============================================================================
// DRIVER
// =============================================================================

struct Driver {
    state: ChatState,
    snapshot: watch::Sender<ChannelSnapshot>,
    events: mpsc::Sender<ChannelEvent>,
}

impl Driver {
    async fn run(mut self, url: String, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            if self.state.begin_connect() {
                self.publish_status();
            }
            info!(url = redact_url(&url), has_token = url.contains('?'), "chat channel connecting");

            let connect = tokio_tungstenite::connect_async(url.as_str());
            tokio::pin!(connect);
            let connected = loop {
                tokio::select! {
                    result = &mut connect => break Some(result),
                    command = commands.recv() => match command {
                        None | Some(Command::Shutdown) => break None,
                        Some(other) => self.drop_offline(other),
                    },
                }
            };

            let end = match connected {
                None => SessionEnd::Shutdown,
                Some(Ok((stream, _response))) => {
                    self.state.on_open();
                    self.publish_status();
                    info!("chat channel connected");
                    self.run_session(stream, &mut commands).await
                }
                Some(Err(e)) => {
                    warn!(error = %e, "chat channel connect failed");
                    SessionEnd::Dropped
                }
            };

            if end == SessionEnd::Shutdown {
                self.state.on_teardown();
                self.publish_status();
                info!("chat channel shut down");
                return;
            }

            let delay = self.state.on_close();
            self.publish_status();
            self.emit(ChannelEvent::ReconnectIn(delay));
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            info!(delay_ms, attempt = self.state.reconnect_attempt(), "chat channel reconnect scheduled");

            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    () = &mut sleep => break,
                    command = commands.recv() => match command {
                        None | Some(Command::Shutdown) => {
                            self.state.on_teardown();
                            self.publish_status();
                            info!("chat channel shut down while waiting to reconnect");
                            return;
                        }
                        Some(other) => self.drop_offline(other),
                    },
                }
            }
        }
    }

    async fn run_session(&mut self, stream: Socket, commands: &mut mpsc::UnboundedReceiver<Command>) -> SessionEnd {
        let (mut write, mut read) = stream.split();
        loop {
            tokio::select! {
                inbound = read.next() => match inbound {
                    Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => self.handle_text(text),
                        Err(e) => warn!(error = %e, "non-utf8 binary chat frame ignored"),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "chat channel closed by server");
                        return SessionEnd::Dropped;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "chat channel read failed");
                        return SessionEnd::Dropped;
                    }
                    None => return SessionEnd::Dropped,
                },
                command = commands.recv() => {
                    let frame = match command {
                        None | Some(Command::Shutdown) => {
                            if let Err(e) = write.close().await {
                                debug!(error = %e, "chat channel close failed");
                            }
                            return SessionEnd::Shutdown;
                        }
                        Some(Command::Send(text)) => self.state.send(&text),
                        Some(Command::Delete(id)) => {
                            let frame = self.state.delete(&id);
                            if frame.is_some() {
                                self.publish_snapshot();
                                self.emit(ChannelEvent::Removed(id));
                            }
                            frame
                        }
                    };
                    if let Some(frame) = frame {
                        if let Err(e) = write_frame(&mut write, &frame).await {
                            warn!(error = %e, "chat channel write failed");
                            return SessionEnd::Dropped;
                        }
                    }
                }
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        let frame = match decode_inbound(text, now_ms()) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("ignoring chat frame without a known type");
                return;
            }
            Err(e) => {
                warn!(error = %e, "ignoring undecodable chat frame");
                return;
            }
        };
        match self.state.apply(frame) {
            ChatEvent::HistoryReplaced(count) => {
                self.publish_snapshot();
                self.emit(ChannelEvent::History(count));
            }
            ChatEvent::Appended(message) => {
                self.publish_snapshot();
                self.emit(ChannelEvent::Message(message));
            }
            ChatEvent::Duplicate(_) => {}
            ChatEvent::Notice(text) => self.emit(ChannelEvent::Notice(text)),
        }
    }

    fn drop_offline(&mut self, command: Command) {
        match command {
            Command::Send(text) => {
                let _ = self.state.send(&text);
            }
            Command::Delete(id) => {
                let _ = self.state.delete(&id);
            }
            Command::Shutdown => {}
        }
    }

    fn publish_status(&self) {
        self.publish_snapshot();
        self.emit(ChannelEvent::Status(self.state.status()));
    }

    fn publish_snapshot(&self) {
        let snapshot = ChannelSnapshot { status: self.state.status(), messages: self.state.messages().to_vec() };
        self.snapshot.send_replace(snapshot);
    }

    fn emit(&self, event: ChannelEvent) {
        if self.events.try_send(event).is_err() {
            debug!("chat event buffer full or closed; event dropped");
        }
    }
}

async fn write_frame<W>(write: &mut W, frame: &OutboundFrame) -> Result<(), String>
where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    let payload = encode_outbound(frame).map_err(|e| e.to_string())?;
    write.send(Message::Text(payload.into())).await.map_err(|e| e.to_string())
}
