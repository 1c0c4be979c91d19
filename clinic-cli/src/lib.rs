//! Clinic CLI - terminal surface for the Clinic assistant client.
//!
//! The `clinic` binary wires the pure session state machine
//! (`clinic-session`) to a supervised WebSocket link (`clinic-channel`) for
//! the interactive chat, and exposes the collaborator REST endpoints
//! (login, appointments, health) as plain subcommands.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod chat;
pub mod client;
