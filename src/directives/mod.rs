//! Per-request edge cache directives.
//!
//! A directive is the resolved TTL and tag set for exactly one request. The
//! middleware resolves it from route-declared parameters, stores it on the
//! request's own extensions, and renders it as response headers:
//!
//! - `Cache-Control: max-age=<ttl>, public` on every response
//! - `Cache-Tags: <tag>,<tag>` only when at least one tag survived normalization
//!
//! Nothing here is process-wide. State lives on the request value that is
//! threaded through the handler chain and is reset on every resolution, so a
//! worker serving many requests in sequence never carries tags or TTLs from
//! one request into the next.

mod middleware;
mod route;
pub mod store;
mod tags;
mod ttl;

pub use middleware::{
    CACHE_TAGS_HEADER, DirectiveResolver, DirectivesRendered, RouteDirectives, cache_directives,
};
pub use route::{CacheRoute, CacheRouterExt};
pub use store::{RequestCacheDirectives, ResolvedDirectives};
pub use tags::{CacheTags, TAG_DELIMITER};
pub use ttl::{DEFAULT_TTL_SECONDS, normalize_ttl};
