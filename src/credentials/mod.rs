//! Credential management for the search API
//!
//! This module provides the rotating pool of API keys used by the scheduler.
//!
//! # Components
//!
//! - `Credential`: An API key with a log-safe display form
//! - `CredentialState`: Whether a key may currently be used
//! - `CredentialPool`: Round-robin rotation with per-key suspension

mod pool;
mod state;

pub use pool::{Acquisition, CredentialPool};
pub use state::{Credential, CredentialState};
