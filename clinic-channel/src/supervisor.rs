//! Supervising reconnect layer over the bare chat link.
//!
//! The bare [`ChatLink`](crate::link::ChatLink) connects once and never
//! retries. The supervisor wraps it with a bounded exponential-backoff
//! policy: when a link ends without a user-initiated close, the terminal
//! transition is forwarded to the consumer (so the session resets its
//! presence and greeting guard) and a fresh connection is attempted. The
//! outward contract is the same as the bare link's — connect, send, close,
//! event stream — so the session layer cannot tell which drives it.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use clinic_common::config::ReconnectConfig;

use crate::error::{LinkError, LinkResult};
use crate::link::{ChatLink, LinkEvent};

/// Retry policy for the supervised link.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Maximum consecutive failed attempts before giving up.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles per consecutive failure.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_backoff: Duration,
    /// Timeout applied to each connection attempt.
    pub connect_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ReconnectConfig> for SupervisorConfig {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_secs(config.initial_backoff_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

enum Command {
    Send(String, oneshot::Sender<bool>),
    Close,
}

/// Handle to a supervised chat link.
///
/// Dropping the handle stops the supervisor; frames sent after that fail
/// with [`LinkError::Closed`].
pub struct SupervisedLink {
    commands: mpsc::Sender<Command>,
}

impl SupervisedLink {
    /// Transmit one pre-encoded text frame over the current connection.
    ///
    /// Returns `Ok(false)` when no connection is open (same guard semantics
    /// as the bare link), `Err(LinkError::Closed)` once the supervisor has
    /// stopped.
    pub async fn send_frame(&self, frame: impl Into<String>) -> LinkResult<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Send(frame.into(), reply_tx))
            .await
            .map_err(|_| LinkError::Closed)?;
        reply_rx.await.map_err(|_| LinkError::Closed)
    }

    /// Stop supervision permanently, closing any open connection.
    ///
    /// Idempotent; closing a stopped supervisor is a no-op.
    pub async fn close(&self) {
        let _ = self.commands.send(Command::Close).await;
    }
}

/// Start a supervised link to `url`.
///
/// The receiver carries the same events as the bare link's, across every
/// reconnect: `Opened` per successful connection, frames in arrival order,
/// `Closed`/`Errored` per ended connection, and a final `Errored` when the
/// retry budget is exhausted.
pub fn supervise(url: String, config: SupervisorConfig) -> (SupervisedLink, mpsc::Receiver<LinkEvent>) {
    let (event_tx, event_rx) = mpsc::channel(32);
    let (command_tx, command_rx) = mpsc::channel(32);

    tokio::spawn(run(url, config, event_tx, command_rx));

    (
        SupervisedLink {
            commands: command_tx,
        },
        event_rx,
    )
}

#[derive(PartialEq)]
enum Flow {
    /// User close or consumer gone; supervision ends.
    Stop,
    /// The link ended on its own; a retry may follow.
    Continue,
}

async fn run(
    url: String,
    config: SupervisorConfig,
    events: mpsc::Sender<LinkEvent>,
    mut commands: mpsc::Receiver<Command>,
) {
    let mut attempt: u32 = 0;
    let mut backoff = config.initial_backoff;

    loop {
        match tokio::time::timeout(config.connect_timeout, ChatLink::connect(&url)).await {
            Ok(Ok((link, link_events))) => {
                // A live connection resets the retry budget.
                attempt = 0;
                backoff = config.initial_backoff;

                if drive(&link, link_events, &events, &mut commands).await == Flow::Stop {
                    link.close().await;
                    let _ = events.send(LinkEvent::Closed).await;
                    return;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Chat link connect failed");
            }
            Err(_) => {
                let e = LinkError::ConnectTimeout(config.connect_timeout.as_secs());
                tracing::warn!(url = %url, error = %e, "Chat link connect failed");
            }
        }

        attempt += 1;
        if attempt > config.max_retries {
            tracing::error!(url = %url, retries = config.max_retries, "Reconnect attempts exhausted");
            let _ = events
                .send(LinkEvent::Errored(
                    LinkError::RetriesExhausted(config.max_retries).to_string(),
                ))
                .await;
            return;
        }

        tracing::warn!(
            url = %url,
            attempt = attempt,
            backoff_secs = backoff.as_secs(),
            "Reconnecting to assistant..."
        );
        if wait_backoff(backoff, &events, &mut commands).await == Flow::Stop {
            return;
        }
        backoff = std::cmp::min(backoff * 2, config.max_backoff);
    }
}

/// Forward events and serve commands until the link or the user ends it.
async fn drive(
    link: &ChatLink,
    mut link_events: mpsc::Receiver<LinkEvent>,
    events: &mpsc::Sender<LinkEvent>,
    commands: &mut mpsc::Receiver<Command>,
) -> Flow {
    loop {
        tokio::select! {
            event = link_events.recv() => match event {
                Some(LinkEvent::Frame(frame)) => {
                    if events.send(LinkEvent::Frame(frame)).await.is_err() {
                        return Flow::Stop;
                    }
                }
                Some(LinkEvent::Opened) => {
                    if events.send(LinkEvent::Opened).await.is_err() {
                        return Flow::Stop;
                    }
                }
                // Terminal transition first, so the consumer resets its
                // per-connection state before any reconnect.
                Some(event @ (LinkEvent::Closed | LinkEvent::Errored(_))) => {
                    let _ = events.send(event).await;
                    return Flow::Continue;
                }
                None => {
                    let _ = events.send(LinkEvent::Closed).await;
                    return Flow::Continue;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Send(frame, reply)) => {
                    let delivered = match link.send_frame(&frame).await {
                        Ok(sent) => sent,
                        Err(e) => {
                            tracing::warn!(error = %e, "Frame transmit failed");
                            false
                        }
                    };
                    let _ = reply.send(delivered);
                }
                Some(Command::Close) | None => return Flow::Stop,
            },
        }
    }
}

/// Sleep out one backoff period while still answering commands.
async fn wait_backoff(
    backoff: Duration,
    events: &mpsc::Sender<LinkEvent>,
    commands: &mut mpsc::Receiver<Command>,
) -> Flow {
    let sleep = tokio::time::sleep(backoff);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return Flow::Continue,
            command = commands.recv() => match command {
                // No connection to carry the frame; guard it.
                Some(Command::Send(_, reply)) => {
                    let _ = reply.send(false);
                }
                Some(Command::Close) | None => {
                    let _ = events.send(LinkEvent::Closed).await;
                    return Flow::Stop;
                }
            },
        }
    }
}
