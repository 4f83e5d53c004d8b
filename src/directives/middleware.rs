//! Directive resolution middleware.
//!
//! Resolves the TTL and tags for the current request, stores them on the
//! request, runs the downstream handler and renders `Cache-Control` and
//! `Cache-Tags` on its response.

use std::{convert::Infallible, future::Future};

use axum::{
    body::Body,
    extract::State,
    http::{
        Extensions, HeaderName, HeaderValue, Request, Response as HttpResponse, header,
    },
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::{
    store::{self, RequestCacheDirectives, ResolvedDirectives},
    tags::CacheTags,
    ttl::{DEFAULT_TTL_SECONDS, normalize_ttl},
};

/// Header carrying the comma-joined tag list for tag-based purge.
pub const CACHE_TAGS_HEADER: HeaderName = HeaderName::from_static("cache-tags");

/// Response extension marking a response whose directives are already rendered.
///
/// When directive layers are nested, the innermost one renders first and the
/// outer ones leave its headers alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectivesRendered(pub ResolvedDirectives);

/// Resolves and renders directives using a configured default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectiveResolver {
    default_ttl: u32,
}

impl Default for DirectiveResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS)
    }
}

impl DirectiveResolver {
    pub fn new(default_ttl: u32) -> Self {
        Self { default_ttl }
    }

    pub fn default_ttl(&self) -> u32 {
        self.default_ttl
    }

    /// Reset, normalize and store directives on `extensions`.
    ///
    /// The reset runs unconditionally, before any parsing, so stale values
    /// from an earlier resolution on the same request can never leak into
    /// this one.
    pub fn resolve(
        &self,
        extensions: &mut Extensions,
        ttl_param: Option<&str>,
        tags_param: Option<&str>,
    ) -> ResolvedDirectives {
        store::reset(extensions);

        let directives = RequestCacheDirectives {
            ttl_seconds: normalize_ttl(ttl_param),
            tags: CacheTags::from_param(tags_param),
        };
        store::set(extensions, directives, self.default_ttl);

        store::get(extensions)
    }

    /// Run one request through the directive pipeline.
    pub async fn handle<B, RB, F, Fut>(
        &self,
        request: Request<B>,
        next: F,
        ttl_param: Option<&str>,
        tags_param: Option<&str>,
    ) -> HttpResponse<RB>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = HttpResponse<RB>>,
    {
        let outcome = self
            .try_handle(
                request,
                |request| async move { Ok::<_, Infallible>(next(request).await) },
                ttl_param,
                tags_param,
            )
            .await;

        match outcome {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    /// Like [`handle`](Self::handle) for fallible handlers.
    ///
    /// A handler error is returned untouched and nothing is rendered.
    pub async fn try_handle<B, RB, E, F, Fut>(
        &self,
        mut request: Request<B>,
        next: F,
        ttl_param: Option<&str>,
        tags_param: Option<&str>,
    ) -> Result<HttpResponse<RB>, E>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Result<HttpResponse<RB>, E>>,
    {
        let resolved = self.resolve(request.extensions_mut(), ttl_param, tags_param);

        // Handlers only get read access to the stored directives, so the
        // values resolved above are the ones to render.
        let mut response = next(request).await?;
        self.render(&mut response, resolved);
        Ok(response)
    }

    /// Write directive headers onto `response`.
    ///
    /// Returns `false` when an inner layer already rendered this response.
    pub fn render<RB>(&self, response: &mut HttpResponse<RB>, directives: ResolvedDirectives) -> bool {
        if response.extensions().get::<DirectivesRendered>().is_some() {
            debug!(
                directives = "render",
                outcome = "skipped",
                "response already carries directives from an inner route"
            );
            return false;
        }

        let headers = response.headers_mut();

        match HeaderValue::try_from(directives.cache_control()) {
            Ok(value) => {
                headers.insert(header::CACHE_CONTROL, value);
            }
            Err(err) => {
                warn!(directives = "render", error = %err, "invalid cache-control value");
            }
        }

        headers.remove(&CACHE_TAGS_HEADER);
        if let Some(joined) = directives.tags.to_header_value() {
            match HeaderValue::try_from(joined) {
                Ok(value) => {
                    headers.insert(CACHE_TAGS_HEADER, value);
                }
                Err(err) => {
                    warn!(directives = "render", error = %err, "invalid cache-tags value");
                }
            }
        }

        let tagged = if directives.tags.is_empty() { "false" } else { "true" };
        metrics::counter!("edgecache_directives_rendered_total", "tagged" => tagged).increment(1);
        debug!(
            directives = "render",
            ttl_seconds = directives.ttl_seconds,
            tags = ?directives.tags.as_slice(),
            "rendered cache directives"
        );

        response
            .extensions_mut()
            .insert(DirectivesRendered(directives));
        true
    }
}

/// Per-route middleware state: the declared parameters plus the resolver.
#[derive(Debug, Clone)]
pub struct RouteDirectives {
    resolver: DirectiveResolver,
    ttl_param: Option<String>,
    tags_param: Option<String>,
}

impl RouteDirectives {
    pub fn new(
        resolver: DirectiveResolver,
        ttl_param: Option<String>,
        tags_param: Option<String>,
    ) -> Self {
        Self {
            resolver,
            ttl_param,
            tags_param,
        }
    }

    pub fn ttl_param(&self) -> Option<&str> {
        self.ttl_param.as_deref()
    }

    pub fn tags_param(&self) -> Option<&str> {
        self.tags_param.as_deref()
    }
}

/// axum middleware applying route-declared directives.
///
/// Install with `axum::middleware::from_fn_with_state(route_directives, cache_directives)`.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn cache_directives(
    State(route): State<RouteDirectives>,
    request: Request<Body>,
    next: Next,
) -> Response {
    route
        .resolver
        .handle(
            request,
            |request| next.run(request),
            route.ttl_param(),
            route.tags_param(),
        )
        .await
}
