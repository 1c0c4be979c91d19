//! Clinic Session - deterministic chat session state machine for the Clinic
//! assistant client.
//!
//! This crate owns everything about a conversation except the socket: the
//! transcript of turns, the presence indicator, the per-connection greeting
//! guard, and the wire encode/decode rules. All state changes flow through
//! [`ChatSession::apply`], one event at a time:
//!
//! ```text
//!   link transitions ─┐
//!   inbound frames  ──┼──▶ ChatSession::apply ──▶ frames to transmit
//!   user commands   ──┘         │
//!                               ▼
//!               transcript / presence / greeting guard
//! ```
//!
//! The crate performs no I/O; the link layer feeds it events and transmits
//! whatever `apply` returns.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod session;
pub mod types;
pub mod wire;

pub use session::{ChatSession, LinkTransition, SessionEvent, UserCommand};
pub use types::{ConnectionState, GreetingGuard, PresenceState, Transcript, Turn, TurnOrigin};
pub use wire::{InboundFrame, INITIAL_GREETING, KEEP_ALIVE_PROBE, KEEP_ALIVE_REPLY};
