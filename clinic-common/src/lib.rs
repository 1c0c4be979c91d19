//! Clinic Common - Shared error types, logging, and configuration for the
//! Clinic assistant client.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and handling utilities
//! - Logging setup and structured logging helpers

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, ChatConfig, Config, ObservabilityConfig, ReconnectConfig};
pub use error::{Error, Result, ResultExt};
pub use logging::init_logging;
