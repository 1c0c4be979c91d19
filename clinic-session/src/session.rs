//! The chat session state machine.
//!
//! One session owns one conversation: its transcript, presence indicator,
//! greeting guard, and a view of the connection state. Every change flows
//! through [`ChatSession::apply`], which consumes one event and returns the
//! frames the caller must transmit. Events are applied one at a time by the
//! driving task; handlers run to completion, so none of the owned state
//! needs locking.

use crate::types::{ConnectionState, GreetingGuard, PresenceState, Transcript, Turn};
use crate::wire::{self, InboundFrame};

/// Connection lifecycle notification from the link layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    Opened,
    Closed,
    Errored,
}

/// A user-initiated action from the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Send a chat message.
    Send(String),
    /// Ask the assistant to reschedule the appointment under discussion.
    Reschedule,
}

/// The three event kinds that drive a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connection lifecycle change reported by the link.
    Link(LinkTransition),
    /// One raw inbound frame, prior to decoding.
    Frame(String),
    /// User input.
    User(UserCommand),
}

/// Session state: transcript, connection, presence, and greeting guard.
#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
    connection: ConnectionState,
    presence: PresenceState,
    greeting: GreetingGuard,
}

impl ChatSession {
    /// Create a session for a connection that is being established.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn presence(&self) -> PresenceState {
        self.presence
    }

    /// Apply one event and return the wire frames to transmit.
    ///
    /// The return value is the session's only side channel: keep-alive
    /// replies and encoded user messages come back here, and the caller
    /// writes them to the socket in order.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<String> {
        match event {
            SessionEvent::Link(transition) => self.apply_transition(transition),
            SessionEvent::Frame(raw) => self.apply_frame(&raw),
            SessionEvent::User(command) => self.apply_command(command),
        }
    }

    fn apply_transition(&mut self, transition: LinkTransition) -> Vec<String> {
        match transition {
            LinkTransition::Opened => {
                self.connection = ConnectionState::Open;
            }
            LinkTransition::Closed => {
                self.connection = ConnectionState::Closed;
                // The composing indicator must never survive a disconnect,
                // and the next connection may greet again.
                self.presence = PresenceState::Idle;
                self.greeting.reset();
            }
            LinkTransition::Errored => {
                self.connection = ConnectionState::Errored;
                self.presence = PresenceState::Idle;
                self.greeting.reset();
            }
        }
        tracing::debug!(state = self.connection.as_str(), "Connection state changed");
        Vec::new()
    }

    fn apply_frame(&mut self, raw: &str) -> Vec<String> {
        match wire::classify_frame(raw) {
            InboundFrame::KeepAlive => {
                // Answered on the same connection; presence untouched
                tracing::trace!("Keep-alive probe answered");
                vec![wire::KEEP_ALIVE_REPLY.to_string()]
            }
            InboundFrame::Text(text) => {
                if !self.greeting.accept(&text) {
                    tracing::debug!("Duplicate greeting suppressed");
                    return Vec::new();
                }
                self.transcript.append(Turn::remote(text));
                self.presence = PresenceState::Idle;
                Vec::new()
            }
        }
    }

    fn apply_command(&mut self, command: UserCommand) -> Vec<String> {
        match command {
            UserCommand::Send(text) => {
                // Guard, not a failure: nothing is appended or transmitted
                // for whitespace input or a link that is not open.
                if text.trim().is_empty() || !self.connection.is_open() {
                    return Vec::new();
                }
                self.transcript.append(Turn::local(text.clone()));
                self.presence = PresenceState::Composing;
                vec![wire::encode_text(&text)]
            }
            UserCommand::Reschedule => {
                if !self.connection.is_open() {
                    return Vec::new();
                }
                self.presence = PresenceState::Composing;
                vec![wire::encode_reschedule()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TurnOrigin;
    use crate::wire::INITIAL_GREETING;

    fn open_session() -> ChatSession {
        let mut session = ChatSession::new();
        assert!(session
            .apply(SessionEvent::Link(LinkTransition::Opened))
            .is_empty());
        session
    }

    fn send(session: &mut ChatSession, text: &str) -> Vec<String> {
        session.apply(SessionEvent::User(UserCommand::Send(text.into())))
    }

    fn frame(session: &mut ChatSession, raw: &str) -> Vec<String> {
        session.apply(SessionEvent::Frame(raw.into()))
    }

    #[test]
    fn test_send_appends_local_turn_and_transmits() {
        let mut session = open_session();

        let frames = send(&mut session, "Hello");

        assert_eq!(frames, vec![r#"{"text":"Hello"}"#.to_string()]);
        assert_eq!(session.transcript().len(), 1);
        let turn = session.transcript().last().unwrap();
        assert_eq!(turn.origin, TurnOrigin::Local);
        assert_eq!(turn.body, "Hello");
        assert_eq!(session.presence(), PresenceState::Composing);
    }

    #[test]
    fn test_whitespace_send_is_a_noop() {
        let mut session = open_session();

        let frames = send(&mut session, "   \t  ");

        assert!(frames.is_empty());
        assert!(session.transcript().is_empty());
        assert_eq!(session.presence(), PresenceState::Idle);
    }

    #[test]
    fn test_send_before_open_is_a_noop() {
        // Fresh session is still connecting
        let mut session = ChatSession::new();
        assert_eq!(session.connection(), ConnectionState::Connecting);

        let frames = send(&mut session, "Hello");

        assert!(frames.is_empty());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_send_after_close_is_a_noop() {
        let mut session = open_session();
        session.apply(SessionEvent::Link(LinkTransition::Closed));

        assert!(send(&mut session, "anyone there?").is_empty());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_keepalive_answered_without_turn() {
        let mut session = open_session();
        send(&mut session, "Hello");
        assert_eq!(session.presence(), PresenceState::Composing);

        // Probe arrives while composing: answered, not displayed, and the
        // indicator is left alone
        let frames = frame(&mut session, "ping");

        assert_eq!(frames, vec!["pong".to_string()]);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.presence(), PresenceState::Composing);
    }

    #[test]
    fn test_keepalive_recognized_in_every_form() {
        let mut session = open_session();

        for raw in ["ping", r#""ping""#, r#"{"text":"ping"}"#, r#"{"message":"ping"}"#] {
            let frames = frame(&mut session, raw);
            assert_eq!(frames, vec!["pong".to_string()], "form: {raw}");
        }
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_inbound_text_appends_turn_and_clears_composing() {
        let mut session = open_session();
        send(&mut session, "Hello");

        let frames = frame(&mut session, r#"{"text":"Hi, what is your name?"}"#);

        assert!(frames.is_empty());
        assert_eq!(session.transcript().len(), 2);
        let turn = session.transcript().last().unwrap();
        assert_eq!(turn.origin, TurnOrigin::Remote);
        assert_eq!(turn.body, "Hi, what is your name?");
        assert_eq!(session.presence(), PresenceState::Idle);
    }

    #[test]
    fn test_inbound_message_field_becomes_turn() {
        let mut session = open_session();

        frame(&mut session, r#"{"message":"Booked for Tuesday"}"#);

        assert_eq!(session.transcript().last().unwrap().body, "Booked for Tuesday");
    }

    #[test]
    fn test_malformed_inbound_displayed_literally() {
        let mut session = open_session();

        frame(&mut session, "Your appointment is at 3pm");

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(
            session.transcript().last().unwrap().body,
            "Your appointment is at 3pm"
        );
    }

    #[test]
    fn test_greeting_shown_once_per_connection() {
        let mut session = open_session();

        frame(&mut session, INITIAL_GREETING);
        frame(&mut session, INITIAL_GREETING);

        let greetings = session
            .transcript()
            .turns()
            .iter()
            .filter(|t| t.body == INITIAL_GREETING)
            .count();
        assert_eq!(greetings, 1);
    }

    #[test]
    fn test_greeting_returns_after_reconnect() {
        let mut session = open_session();
        frame(&mut session, INITIAL_GREETING);
        assert_eq!(session.transcript().len(), 1);

        session.apply(SessionEvent::Link(LinkTransition::Closed));
        session.apply(SessionEvent::Link(LinkTransition::Opened));
        frame(&mut session, INITIAL_GREETING);

        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_repeated_ordinary_text_is_not_deduplicated() {
        // Suppression is keyed to the one reserved greeting only
        let mut session = open_session();

        frame(&mut session, r#"{"text":"How about Monday?"}"#);
        frame(&mut session, r#"{"text":"How about Monday?"}"#);

        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_close_clears_presence_and_greeting() {
        let mut session = open_session();
        frame(&mut session, INITIAL_GREETING);
        send(&mut session, "I need a new time");
        assert_eq!(session.presence(), PresenceState::Composing);

        session.apply(SessionEvent::Link(LinkTransition::Closed));

        assert_eq!(session.connection(), ConnectionState::Closed);
        assert_eq!(session.presence(), PresenceState::Idle);
        // Transcript survives the disconnect; only ephemeral state resets
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_error_clears_presence() {
        let mut session = open_session();
        send(&mut session, "Hello");

        session.apply(SessionEvent::Link(LinkTransition::Errored));

        assert_eq!(session.connection(), ConnectionState::Errored);
        assert_eq!(session.presence(), PresenceState::Idle);
    }

    #[test]
    fn test_reschedule_transmits_without_turn() {
        let mut session = open_session();

        let frames = session.apply(SessionEvent::User(UserCommand::Reschedule));

        assert_eq!(frames, vec![r#"{"action":"reschedule"}"#.to_string()]);
        assert!(session.transcript().is_empty());
        assert_eq!(session.presence(), PresenceState::Composing);
    }

    #[test]
    fn test_reschedule_before_open_is_a_noop() {
        let mut session = ChatSession::new();

        let frames = session.apply(SessionEvent::User(UserCommand::Reschedule));

        assert!(frames.is_empty());
        assert_eq!(session.presence(), PresenceState::Idle);
    }

    #[test]
    fn test_transcript_preserves_acceptance_order() {
        let mut session = open_session();

        send(&mut session, "one");
        frame(&mut session, r#"{"text":"two"}"#);
        frame(&mut session, "ping");
        send(&mut session, "three");
        frame(&mut session, "four");

        let bodies: Vec<&str> = session
            .transcript()
            .turns()
            .iter()
            .map(|t| t.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["one", "two", "three", "four"]);
    }
}
