/// Fallback TTL used when neither the route nor the configuration supplies one.
pub const DEFAULT_TTL_SECONDS: u32 = 600;

/// Parse a route-declared TTL.
///
/// Accepts a (trimmed) run of ASCII digits that fits in `u32`. Everything else,
/// including the empty string, signs and fractions, resolves to `None` so the
/// caller falls back to its default instead of failing the request.
pub fn normalize_ttl(param: Option<&str>) -> Option<u32> {
    let trimmed = param?.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
