//! Core session types: turns, transcript, presence, connection state, and
//! the greeting guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wire;

// ============================================================================
// Connection State
// ============================================================================

/// Lifecycle state of one chat connection.
///
/// Transitions are monotonic within a connection's life:
/// `Connecting → Open → {Closed | Errored}`. A fresh session starts a fresh
/// connection with fresh state; closed links are never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    /// String form for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Errored => "errored",
        }
    }

    /// Whether frames may be transmitted in this state.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Connecting
    }
}

// ============================================================================
// Presence
// ============================================================================

/// The two-state "remote is composing" indicator.
///
/// Enters `Composing` on any successful outbound transmission; returns to
/// `Idle` when an inbound frame becomes a turn or when the connection ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    Idle,
    Composing,
}

impl PresenceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Composing => "composing",
        }
    }

    pub fn is_composing(&self) -> bool {
        matches!(self, Self::Composing)
    }
}

impl Default for PresenceState {
    fn default() -> Self {
        Self::Idle
    }
}

// ============================================================================
// Turns and Transcript
// ============================================================================

/// Origin of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOrigin {
    Local,
    Remote,
}

impl TurnOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// One immutable conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn.
    pub origin: TurnOrigin,
    /// Display text.
    pub body: String,
    /// When the turn was accepted into the transcript.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Create a turn for locally-entered text.
    pub fn local(body: impl Into<String>) -> Self {
        Self {
            origin: TurnOrigin::Local,
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a turn for text received from the assistant.
    pub fn remote(body: impl Into<String>) -> Self {
        Self {
            origin: TurnOrigin::Remote,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ordered, append-only sequence of turns.
///
/// Insertion order is the display order and the only ordering guarantee;
/// turns are never reordered by timestamp and never mutated after append.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn. The only mutation the transcript supports.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, in acceptance order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

// ============================================================================
// Greeting Guard
// ============================================================================

/// Per-connection flag showing the reserved opening message at most once.
///
/// The server may re-send its greeting within one connection (internal
/// retry); only the first occurrence becomes a turn. The guard resets when
/// the connection ends so a fresh connection may greet again. It is keyed to
/// the one reserved string and never generalizes to deduplicating other
/// repeated remote text.
#[derive(Debug, Clone, Default)]
pub struct GreetingGuard {
    greeting_seen: bool,
}

impl GreetingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether remote text may become a turn.
    ///
    /// Returns `false` only for a repeat of the reserved greeting within the
    /// current connection. A first greeting marks the guard and passes.
    pub fn accept(&mut self, text: &str) -> bool {
        if text != wire::INITIAL_GREETING {
            return true;
        }
        if self.greeting_seen {
            return false;
        }
        self.greeting_seen = true;
        true
    }

    /// Whether the greeting was already shown on this connection.
    pub fn seen(&self) -> bool {
        self.greeting_seen
    }

    /// Forget the greeting; called when the connection ends.
    pub fn reset(&mut self) {
        self.greeting_seen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_as_str() {
        assert_eq!(ConnectionState::Connecting.as_str(), "connecting");
        assert_eq!(ConnectionState::Open.as_str(), "open");
        assert_eq!(ConnectionState::Closed.as_str(), "closed");
        assert_eq!(ConnectionState::Errored.as_str(), "errored");
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
    }

    #[test]
    fn test_default_states() {
        assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
        assert_eq!(PresenceState::default(), PresenceState::Idle);
        assert!(!PresenceState::default().is_composing());
    }

    #[test]
    fn test_turn_constructors() {
        let local = Turn::local("hello");
        assert_eq!(local.origin, TurnOrigin::Local);
        assert_eq!(local.body, "hello");

        let remote = Turn::remote("hi there");
        assert_eq!(remote.origin, TurnOrigin::Remote);
        assert_eq!(remote.origin.as_str(), "remote");
    }

    #[test]
    fn test_transcript_append_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.append(Turn::local("first"));
        transcript.append(Turn::remote("second"));
        transcript.append(Turn::local("third"));

        assert_eq!(transcript.len(), 3);
        let bodies: Vec<&str> = transcript.turns().iter().map(|t| t.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
        assert_eq!(transcript.last().unwrap().body, "third");
    }

    #[test]
    fn test_greeting_guard_passes_ordinary_text() {
        let mut guard = GreetingGuard::new();
        assert!(guard.accept("What time works for you?"));
        assert!(guard.accept("What time works for you?"));
        assert!(!guard.seen());
    }

    #[test]
    fn test_greeting_guard_suppresses_repeat() {
        let mut guard = GreetingGuard::new();
        assert!(guard.accept(wire::INITIAL_GREETING));
        assert!(guard.seen());
        assert!(!guard.accept(wire::INITIAL_GREETING));
    }

    #[test]
    fn test_greeting_guard_reset() {
        let mut guard = GreetingGuard::new();
        assert!(guard.accept(wire::INITIAL_GREETING));
        guard.reset();
        assert!(!guard.seen());
        assert!(guard.accept(wire::INITIAL_GREETING));
    }
}
