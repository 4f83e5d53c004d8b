//! Edge cache control for axum services.
//!
//! [`directives`] resolves a TTL and a tag set for each request and renders
//! them as `Cache-Control` and `Cache-Tags` headers. [`edge`] talks to the
//! provider API to purge by tag, URL, host or prefix.

pub mod config;
pub mod directives;
pub mod edge;
pub mod error;
pub mod infra;
