//! Edge provider collaborator: purge requests and zone settings.
//!
//! Stateless with respect to request directives. One [`EdgeClient`] can be
//! shared across tasks; the underlying connection pool is reused.

mod client;
mod error;
mod models;
mod purge;

pub use client::EdgeClient;
pub use error::EdgeError;
pub use models::{ApiEnvelope, ApiMessage, PurgeOutcome, PurgeRequest, SkipReason};
pub use purge::{CachePurge, EdgeCache};
