//! The bare chat link: one WebSocket connection to the assistant endpoint.
//!
//! The link owns the socket for its whole life. Inbound text frames are
//! delivered at-most-once, in arrival order, on an event channel; nothing is
//! buffered or replayed across connections. The link never retries on its
//! own — reconnection is the supervisor's job ([`crate::supervisor`]).

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use clinic_session::ConnectionState;

use crate::error::{LinkError, LinkResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Event delivered by a link (bare or supervised) to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The connection is open and frames may flow.
    Opened,
    /// One raw inbound text frame, prior to decoding.
    Frame(String),
    /// The connection ended normally.
    Closed,
    /// The connection ended with a transport error.
    Errored(String),
}

/// One duplex connection to the assistant.
///
/// State is monotonic for the life of the link: `Open` then exactly one of
/// `Closed` or `Errored`. A fresh session connects a fresh link; ended links
/// are never resurrected.
pub struct ChatLink {
    writer: Arc<Mutex<WsSink>>,
    state: Arc<RwLock<ConnectionState>>,
    reader: tokio::task::JoinHandle<()>,
}

impl ChatLink {
    /// Establish the connection and start delivering inbound frames.
    ///
    /// The returned receiver yields [`LinkEvent::Opened`] first, then one
    /// event per inbound frame, and finally a single `Closed` or `Errored`.
    /// No timeout is applied here; an endpoint that never answers leaves the
    /// caller waiting (the supervisor wraps each attempt in a timeout).
    pub async fn connect(url: &str) -> LinkResult<(Self, mpsc::Receiver<LinkEvent>)> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| LinkError::Connect(e.to_string()))?;

        let (writer, reader) = stream.split();
        let writer = Arc::new(Mutex::new(writer));
        let state = Arc::new(RwLock::new(ConnectionState::Open));
        let (tx, rx) = mpsc::channel(32);

        tracing::debug!(url = %url, "Chat link connected");

        // Buffered; the consumer sees Opened before any frame.
        let _ = tx.send(LinkEvent::Opened).await;

        let reader_state = Arc::clone(&state);
        let reader = tokio::spawn(read_loop(reader, reader_state, tx));

        let link = Self {
            writer,
            state,
            reader,
        };
        Ok((link, rx))
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Transmit one pre-encoded text frame.
    ///
    /// Returns `Ok(false)` without touching the socket when the link is not
    /// open — a guard, not an error. `Err` means the socket rejected the
    /// write; the reader surfaces the matching `Errored` event.
    pub async fn send_frame(&self, frame: &str) -> LinkResult<bool> {
        if !self.state.read().await.is_open() {
            return Ok(false);
        }
        self.writer
            .lock()
            .await
            .send(Message::Text(frame.to_owned()))
            .await
            .map_err(|e| LinkError::SendFailed(e.to_string()))?;
        Ok(true)
    }

    /// Close the connection if it is currently open.
    ///
    /// Closing an already-ended link is a no-op, never an error. Frame
    /// delivery stops immediately; nothing pending is flushed.
    pub async fn close(&self) {
        {
            let mut state = self.state.write().await;
            if !state.is_open() {
                return;
            }
            *state = ConnectionState::Closed;
        }
        self.reader.abort();
        let _ = self.writer.lock().await.send(Message::Close(None)).await;
        tracing::debug!("Chat link closed");
    }
}

impl Drop for ChatLink {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Pump inbound frames into the event channel until the socket ends.
async fn read_loop(
    mut reader: WsSource,
    state: Arc<RwLock<ConnectionState>>,
    tx: mpsc::Sender<LinkEvent>,
) {
    loop {
        match reader.next().await {
            Some(Ok(Message::Text(frame))) => {
                if tx.send(LinkEvent::Frame(frame)).await.is_err() {
                    // Consumer gone; stop delivery.
                    return;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                finish(&state, &tx, ConnectionState::Closed, LinkEvent::Closed).await;
                return;
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Chat link transport error");
                finish(
                    &state,
                    &tx,
                    ConnectionState::Errored,
                    LinkEvent::Errored(e.to_string()),
                )
                .await;
                return;
            }
            // Binary and protocol-level frames carry nothing for the chat.
            Some(Ok(_)) => {}
        }
    }
}

/// Record the terminal state and emit its event, exactly once per link.
async fn finish(
    state: &RwLock<ConnectionState>,
    tx: &mpsc::Sender<LinkEvent>,
    next: ConnectionState,
    event: LinkEvent,
) {
    {
        let mut guard = state.write().await;
        if !guard.is_open() {
            return;
        }
        *guard = next;
    }
    let _ = tx.send(event).await;
}
