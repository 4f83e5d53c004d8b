//! Request-scoped directive storage.
//!
//! Directives are kept in the request's own [`Extensions`] under fixed keys:
//! the tags, the declared TTL and the default TTL the resolver substitutes
//! when none was declared. Nothing is stored anywhere else, so a directive can
//! only be observed by code holding that request.
//!
//! Only the resolution middleware writes these keys; handlers read them back
//! with [`get`] and see exactly what will be rendered.

use axum::http::Extensions;

use super::{tags::CacheTags, ttl::DEFAULT_TTL_SECONDS};

/// Tags key on the request extensions.
#[derive(Debug, Clone)]
struct TagsAttr(CacheTags);

/// Declared TTL key on the request extensions.
#[derive(Debug, Clone, Copy)]
struct TtlAttr(u32);

/// Default TTL the resolver used for this request.
#[derive(Debug, Clone, Copy)]
struct DefaultTtlAttr(u32);

/// Directives computed for one request-response cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCacheDirectives {
    /// `None` means the resolver's default applies.
    pub ttl_seconds: Option<u32>,
    pub tags: CacheTags,
}

/// Directives with the default TTL already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirectives {
    pub ttl_seconds: u32,
    pub tags: CacheTags,
}

impl ResolvedDirectives {
    /// `Cache-Control` value for these directives.
    pub fn cache_control(&self) -> String {
        format!("max-age={}, public", self.ttl_seconds)
    }
}

/// Remove every directive key, whatever it held before.
pub(crate) fn reset(extensions: &mut Extensions) {
    extensions.remove::<TagsAttr>();
    extensions.remove::<TtlAttr>();
    extensions.remove::<DefaultTtlAttr>();
}

/// Store normalized directives and the default TTL they resolve against,
/// replacing any previous entry.
///
/// An absent TTL leaves the key unset rather than storing a placeholder.
pub(crate) fn set(
    extensions: &mut Extensions,
    directives: RequestCacheDirectives,
    default_ttl: u32,
) {
    let RequestCacheDirectives { ttl_seconds, tags } = directives;
    extensions.insert(TagsAttr(tags));
    extensions.insert(DefaultTtlAttr(default_ttl));
    match ttl_seconds {
        Some(ttl) => {
            extensions.insert(TtlAttr(ttl));
        }
        None => {
            extensions.remove::<TtlAttr>();
        }
    }
}

/// Read the stored directives back, substituting the stored default when no
/// TTL was declared. Requests that were never resolved get
/// [`DEFAULT_TTL_SECONDS`] and no tags.
pub fn get(extensions: &Extensions) -> ResolvedDirectives {
    let ttl_seconds = extensions
        .get::<TtlAttr>()
        .map(|TtlAttr(ttl)| *ttl)
        .or_else(|| {
            extensions
                .get::<DefaultTtlAttr>()
                .map(|DefaultTtlAttr(ttl)| *ttl)
        })
        .unwrap_or(DEFAULT_TTL_SECONDS);
    let tags = extensions
        .get::<TagsAttr>()
        .map(|TagsAttr(tags)| tags.clone())
        .unwrap_or_default();

    ResolvedDirectives { ttl_seconds, tags }
}

/// Raw stored values, without default substitution.
pub fn peek(extensions: &Extensions) -> Option<RequestCacheDirectives> {
    let tags = extensions.get::<TagsAttr>();
    let ttl = extensions.get::<TtlAttr>();
    if tags.is_none() && ttl.is_none() {
        return None;
    }
    Some(RequestCacheDirectives {
        ttl_seconds: ttl.map(|TtlAttr(ttl)| *ttl),
        tags: tags.map(|TagsAttr(tags)| tags.clone()).unwrap_or_default(),
    })
}
