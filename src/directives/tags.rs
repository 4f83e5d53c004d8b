//! Cache tag normalization.
//!
//! Candidates arrive either as the `;`-delimited route parameter or as the
//! mixed-typed values of a route declaration. Only non-blank strings survive;
//! numbers are scalars and are kept in their string form. Booleans, null,
//! arrays and objects are dropped, as is any tag that cannot be rendered in
//! a header value.
//!
//! `;` is the transport delimiter between a declaration and the middleware
//! and `,` separates tags in the rendered header, so neither can be part of a
//! tag: every string candidate is split on both.

use serde_json::Value;

/// Separator used when tags travel as a single route parameter.
pub const TAG_DELIMITER: char = ';';

/// Separator used in the rendered `Cache-Tags` header.
const HEADER_SEPARATOR: char = ',';

/// Ordered, deduplicated set of edge cache tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheTags(Vec<String>);

impl CacheTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `;`-delimited route parameter. `None` and `""` yield no tags.
    pub fn from_param(param: Option<&str>) -> Self {
        let mut tags = Self::new();
        if let Some(param) = param {
            tags.push(param);
        }
        tags
    }

    /// Normalize mixed-typed declaration values.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut tags = Self::new();
        for value in values {
            match value {
                Value::String(text) => tags.push(text),
                Value::Number(number) => tags.push(&number.to_string()),
                Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
                    record_dropped(1);
                }
            }
        }
        tags
    }

    /// Normalize a declaration given either as one string or as a sequence.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::from_values(items),
            other => Self::from_values(std::iter::once(other)),
        }
    }

    /// Add a string candidate, ignoring blanks, unprintable text and duplicates.
    pub fn push(&mut self, candidate: &str) {
        for segment in candidate.split([TAG_DELIMITER, HEADER_SEPARATOR]) {
            self.push_segment(segment);
        }
    }

    fn push_segment(&mut self, segment: &str) {
        let trimmed = segment.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
            record_dropped(1);
            return;
        }
        if !self.contains(trimmed) {
            self.0.push(trimmed.to_string());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|existing| existing == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Route parameter form (`a;b;c`).
    pub fn to_param(&self) -> String {
        self.0.join(&TAG_DELIMITER.to_string())
    }

    /// Header form (`a,b,c`). `None` when empty: the header must be omitted.
    pub fn to_header_value(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| self.0.join(&HEADER_SEPARATOR.to_string()))
    }
}

impl<S: AsRef<str>> FromIterator<S> for CacheTags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Self::new();
        for candidate in iter {
            tags.push(candidate.as_ref());
        }
        tags
    }
}

impl From<&str> for CacheTags {
    fn from(value: &str) -> Self {
        std::iter::once(value).collect()
    }
}

impl From<Vec<String>> for CacheTags {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<&[&str]> for CacheTags {
    fn from(values: &[&str]) -> Self {
        values.iter().collect()
    }
}

impl<const N: usize> From<[&str; N]> for CacheTags {
    fn from(values: [&str; N]) -> Self {
        values.into_iter().collect()
    }
}

impl From<Vec<Value>> for CacheTags {
    fn from(values: Vec<Value>) -> Self {
        Self::from_values(&values)
    }
}

impl From<&Value> for CacheTags {
    fn from(value: &Value) -> Self {
        Self::from_value(value)
    }
}

impl IntoIterator for CacheTags {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn record_dropped(count: u64) {
    metrics::counter!("edgecache_tags_dropped_total").increment(count);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn param_drops_blank_segments_and_keeps_zero_and_one() {
        let tags = CacheTags::from_param(Some("foo;;bar; ;0;1"));
        assert_eq!(tags.as_slice(), ["foo", "bar", "0", "1"]);
    }

    #[test]
    fn param_absent_or_empty_yields_nothing() {
        assert!(CacheTags::from_param(None).is_empty());
        assert!(CacheTags::from_param(Some("")).is_empty());
        assert!(CacheTags::from_param(Some(" ; ;")).is_empty());
    }

    #[test]
    fn duplicates_keep_first_position() {
        let tags = CacheTags::from_param(Some("b;a;b;c;a"));
        assert_eq!(tags.as_slice(), ["b", "a", "c"]);
    }

    #[test]
    fn segments_are_trimmed() {
        let tags = CacheTags::from_param(Some(" user-profile ; user-123"));
        assert_eq!(tags.as_slice(), ["user-profile", "user-123"]);
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let once = CacheTags::from_param(Some("x; y;;x;0"));
        let twice = CacheTags::from_param(Some(&once.to_param()));
        assert_eq!(once, twice);
    }

    #[test]
    fn mixed_values_keep_only_scalars() {
        let cases = [
            (json!("foo"), vec!["foo"]),
            (json!(["foo", "bar"]), vec!["foo", "bar"]),
            (json!(["foo", "123"]), vec!["foo", "123"]),
            (json!(["foo", []]), vec!["foo"]),
            (json!(["foo", ["bar"]]), vec!["foo"]),
            (json!(["foo", true, false]), vec!["foo"]),
            (json!(["foo", {}]), vec!["foo"]),
            (json!(["foo", null]), vec!["foo"]),
            (json!(["foo", "", " ", "0", "1"]), vec!["foo", "0", "1"]),
            (json!(["foo", 42]), vec!["foo", "42"]),
        ];

        for (input, expected) in cases {
            let tags = CacheTags::from_value(&input);
            assert_eq!(tags.as_slice(), expected.as_slice(), "input: {input}");
        }
    }

    #[test]
    fn declared_strings_split_on_the_delimiter() {
        let tags = CacheTags::from_value(&json!("a;b"));
        assert_eq!(tags.as_slice(), ["a", "b"]);

        let tags = CacheTags::from_value(&json!(["a;b", "c"]));
        assert_eq!(tags.as_slice(), ["a", "b", "c"]);
    }

    #[test]
    fn header_separator_splits_like_the_delimiter() {
        let tags = CacheTags::from(["a,b", "b, c", ","]);
        assert_eq!(tags.as_slice(), ["a", "b", "c"]);
        assert_eq!(tags.to_header_value().as_deref(), Some("a,b,c"));
        assert_eq!(
            CacheTags::from_param(tags.to_header_value().as_deref()),
            tags
        );
    }

    #[test]
    fn control_characters_are_rejected() {
        let tags: CacheTags = ["ok", "bad\nvalue", "tab\there"].into();
        assert_eq!(tags.as_slice(), ["ok"]);
    }

    #[test]
    fn header_value_is_absent_when_empty() {
        assert_eq!(CacheTags::new().to_header_value(), None);
        let tags: CacheTags = ["first", "second"].into();
        assert_eq!(tags.to_header_value().as_deref(), Some("first,second"));
    }
}
