//! HTTP glue shared by services that mount directive routes.

mod middleware;

pub use middleware::{RequestContext, log_responses, set_request_context};
