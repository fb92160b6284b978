#![forbid(unsafe_code)]
//! tally-core library.
//!
//! Shared model for the lifecycle analytics engine: issue histories and
//! their status logs, per-project field classification, timestamp parsing,
//! and the diagnostics side-channel every component reports through.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for recoverable, per-record
//!   failures; `anyhow::Result` at configuration-loading boundaries.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod time;

pub use diagnostics::{Diagnostic, DiagnosticScope};
pub use error::ErrorCode;
