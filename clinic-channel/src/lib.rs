//! Clinic Channel - WebSocket connection layer for the Clinic assistant
//! client.
//!
//! Two layers over the same contract:
//! - [`link::ChatLink`] - one bare connection; opens once, never retries.
//! - [`supervisor`] - wraps the bare link in a bounded exponential-backoff
//!   reconnect policy with a per-attempt connect timeout.
//!
//! Both deliver [`link::LinkEvent`] values on an ordered channel and accept
//! pre-encoded text frames for transmit. All chat semantics (decoding,
//! filtering, transcript, presence) live in `clinic-session`; this crate
//! only moves frames.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod error;
pub mod link;
pub mod supervisor;

pub use error::{LinkError, LinkResult};
pub use link::{ChatLink, LinkEvent};
pub use supervisor::{supervise, SupervisedLink, SupervisorConfig};
