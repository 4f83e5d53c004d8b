//! Route declaration sugar.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/products", get(products))
//!     .cache(CacheRoute::new(["products"], Some(1800)), resolver);
//! ```

use axum::{Router, middleware, routing::MethodRouter};

use super::{
    middleware::{DirectiveResolver, RouteDirectives, cache_directives},
    tags::CacheTags,
};

/// Tags and TTL declared for a route or a group of routes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheRoute {
    tags: CacheTags,
    ttl_seconds: Option<u32>,
}

impl CacheRoute {
    /// Declare directives. `tags` accepts a string, a list of strings or a
    /// JSON value of mixed types; it is normalized here, once.
    pub fn new(tags: impl Into<CacheTags>, ttl_seconds: Option<u32>) -> Self {
        Self {
            tags: tags.into(),
            ttl_seconds,
        }
    }

    /// TTL only, no tags.
    pub fn ttl(ttl_seconds: u32) -> Self {
        Self::new(CacheTags::new(), Some(ttl_seconds))
    }

    pub fn tags(&self) -> &CacheTags {
        &self.tags
    }

    pub fn ttl_seconds(&self) -> Option<u32> {
        self.ttl_seconds
    }

    /// Middleware TTL parameter, `None` when the default should apply.
    pub fn ttl_param(&self) -> Option<String> {
        self.ttl_seconds.map(|ttl| ttl.to_string())
    }

    /// Middleware tags parameter, `None` when no tags were declared.
    pub fn tags_param(&self) -> Option<String> {
        (!self.tags.is_empty()).then(|| self.tags.to_param())
    }

    pub fn route_directives(&self, resolver: DirectiveResolver) -> RouteDirectives {
        RouteDirectives::new(resolver, self.ttl_param(), self.tags_param())
    }
}

/// Attach a [`CacheRoute`] to a router or a single method router.
///
/// Applied to a `Router`, the declaration covers every route already added to
/// it, which makes it usable for groups. Call it after the routes are added;
/// axum rejects a route layer on an empty router. Declarations never merge: when groups
/// nest, the innermost declaration that wraps the handler is the one rendered.
pub trait CacheRouterExt: Sized {
    fn cache(self, route: CacheRoute, resolver: DirectiveResolver) -> Self;
}

impl<S> CacheRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn cache(self, route: CacheRoute, resolver: DirectiveResolver) -> Self {
        self.route_layer(middleware::from_fn_with_state(
            route.route_directives(resolver),
            cache_directives,
        ))
    }
}

impl<S> CacheRouterExt for MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn cache(self, route: CacheRoute, resolver: DirectiveResolver) -> Self {
        self.route_layer(middleware::from_fn_with_state(
            route.route_directives(resolver),
            cache_directives,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn params_reflect_normalized_declaration() {
        let route = CacheRoute::new(&json!(["first", "", true, "second"]), Some(30));
        assert_eq!(route.ttl_param().as_deref(), Some("30"));
        assert_eq!(route.tags_param().as_deref(), Some("first;second"));
    }

    #[test]
    fn empty_declaration_produces_no_params() {
        let route = CacheRoute::new(&json!(null), None);
        assert_eq!(route.ttl_param(), None);
        assert_eq!(route.tags_param(), None);
    }

    #[test]
    fn ttl_only_declaration() {
        let route = CacheRoute::ttl(45);
        assert!(route.tags().is_empty());
        assert_eq!(route.ttl_seconds(), Some(45));
    }
}
