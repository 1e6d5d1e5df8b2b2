//! Murmur core crate - shared error type, configuration, and domain types.
//!
//! Everything the detector and orchestrator crates have in common lives here:
//! the workspace-wide `MurmurError`, the TOML-backed `MurmurConfig`, and the
//! event/signal vocabulary (`KeyEvent`, `AudioChunk`, `Signal`).

pub mod config;
pub mod error;
pub mod types;

pub use config::MurmurConfig;
pub use error::{MurmurError, Result};
