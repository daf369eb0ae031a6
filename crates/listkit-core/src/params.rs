//! Query-parameter handling: the ordered multi-valued parameter map, the
//! reserved keys this subsystem owns, and the reconciliation pass that turns
//! raw parameters into validated lookup candidates.

use crate::{
    error::LookupError,
    lookup::{LookupOp, LookupValue, parse_lookup_key},
};

///
/// RESERVED KEYS
///
/// Stripped before anything else is treated as a lookup.
///

pub const PAGE_VAR: &str = "p";
pub const ORDER_VAR: &str = "o";
pub const SEARCH_VAR: &str = "q";
pub const ALL_VAR: &str = "all";
pub const ERROR_FLAG_VAR: &str = "e";
pub const IS_POPUP_VAR: &str = "_popup";
pub const IS_FACETS_VAR: &str = "_facets";
pub const TO_FIELD_VAR: &str = "_to_field";

pub const RESERVED_VARS: [&str; 8] = [
    PAGE_VAR,
    ORDER_VAR,
    SEARCH_VAR,
    ALL_VAR,
    ERROR_FLAG_VAR,
    IS_POPUP_VAR,
    IS_FACETS_VAR,
    TO_FIELD_VAR,
];

/// True when this subsystem owns the key.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_VARS.contains(&key)
}

///
/// QueryParams
///
/// Insertion-ordered multi-valued string map over query-string pairs.
/// Insertion order is irrelevant for lookups but is preserved so rendered
/// query strings stay stable across edits.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    #[must_use]
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Parse a query string, with or without its leading `?`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut pairs = Vec::new();

        for piece in raw.split('&') {
            if piece.is_empty() {
                continue;
            }
            let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
            pairs.push((percent_decode(key), percent_decode(value)));
        }

        Self { pairs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Last value for a key, matching the "latest occurrence wins" rule for
    /// single-valued reads of a multi-valued map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Unique keys in first-appearance order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for (key, _) in &self.pairs {
            if !seen.contains(&key.as_str()) {
                seen.push(key.as_str());
            }
        }
        seen
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace all occurrences of a key with one value, appending when the
    /// key was absent.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.pairs.retain(|(k, _)| *k != key);
        self.pairs.push((key, value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Copy with the given pairs set (replacing existing occurrences).
    #[must_use]
    pub fn with(
        &self,
        updates: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut out = self.clone();
        for (key, value) in updates {
            out.set(key, value);
        }
        out
    }

    /// Copy with the given keys removed.
    #[must_use]
    pub fn without(&self, keys: &[&str]) -> Self {
        let mut out = self.clone();
        out.pairs.retain(|(k, _)| !keys.contains(&k.as_str()));
        out
    }

    /// Render as a `?key=value&...` query string. An empty map renders as a
    /// bare `?` so the result is always a valid self-link.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut out = String::from("?");

        for (index, (key, value)) in self.pairs.iter().enumerate() {
            if index > 0 {
                out.push('&');
            }
            out.push_str(&percent_encode(key));
            out.push('=');
            out.push_str(&percent_encode(value));
        }

        out
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = (&'a String, &'a String);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a String, &'a String),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter().map(|(k, v)| (k, v))
    }
}

fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }

    out
}

fn percent_decode(text: &str) -> String {
    let mut out = Vec::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'%' => {
                if let Some(hex) = bytes.get(index + 1..index + 3)
                    && let Ok(text) = std::str::from_utf8(hex)
                    && let Ok(byte) = u8::from_str_radix(text, 16)
                {
                    out.push(byte);
                    index += 3;
                    continue;
                }
                out.push(b'%');
                index += 1;
            }
            b'+' => {
                out.push(b' ');
                index += 1;
            }
            byte => {
                out.push(byte);
                index += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

///
/// LookupParams
///
/// Reconciled, value-normalized lookup candidates: reserved keys removed,
/// allow-list enforced, suffix-driven value shapes applied.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LookupParams {
    entries: Vec<(String, LookupValue)>,
}

impl LookupParams {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LookupValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LookupValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries whose keys are not in the claimed set.
    #[must_use]
    pub fn except(&self, claimed: &[String]) -> Vec<(&str, &LookupValue)> {
        self.entries
            .iter()
            .filter(|(k, _)| !claimed.contains(k))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

/// Reconcile raw request parameters into lookup candidates.
///
/// Reserved keys are stripped; every remaining key must pass the embedding
/// application's allow-list predicate. Rejection is fatal for the request:
/// a probing key must fail loudly, not degrade. Accepted keys are
/// value-normalized: `__in` splits its comma-separated value, `__isnull`
/// coerces text to a boolean.
pub fn reconcile(
    params: &QueryParams,
    allow: impl Fn(&str) -> bool,
) -> Result<LookupParams, LookupError> {
    let mut entries: Vec<(String, LookupValue)> = Vec::new();

    for (key, value) in params.iter() {
        if is_reserved(key) {
            continue;
        }
        if !allow(key) {
            return Err(LookupError::Disallowed {
                key: key.to_string(),
            });
        }

        let normalized = normalize_value(key, value);

        // Latest occurrence of a key wins.
        entries.retain(|(k, _)| k != key);
        entries.push((key.to_string(), normalized));
    }

    Ok(LookupParams { entries })
}

fn normalize_value(key: &str, value: &str) -> LookupValue {
    let (_, op) = parse_lookup_key(key);

    match op {
        LookupOp::In => LookupValue::TextList(value.split(',').map(str::to_string).collect()),
        LookupOp::IsNull => LookupValue::Bool(coerce_bool(value)),
        _ => LookupValue::Text(value.to_string()),
    }
}

/// Textual boolean coercion for `__isnull` values: empty, `false`, and `0`
/// are false; anything else is true.
fn coerce_bool(value: &str) -> bool {
    !matches!(value, "" | "false" | "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_are_stripped() {
        let params = QueryParams::from_pairs([
            ("p", "2"),
            ("o", "1.-2"),
            ("q", "term"),
            ("all", ""),
            ("_popup", "1"),
            ("_facets", ""),
            ("_to_field", "id"),
            ("e", "1"),
            ("name", "ice"),
        ]);

        let lookups = reconcile(&params, |_| true).unwrap();
        assert_eq!(lookups.keys(), vec!["name"]);
    }

    #[test]
    fn disallowed_key_is_fatal() {
        let params = QueryParams::from_pairs([("secret__exact", "x")]);
        let err = reconcile(&params, |key| !key.starts_with("secret")).unwrap_err();

        assert_eq!(
            err,
            LookupError::Disallowed {
                key: "secret__exact".to_string()
            }
        );
        assert!(err.is_disallowed());
    }

    #[test]
    fn in_suffix_splits_comma_list() {
        let params = QueryParams::from_pairs([("id__in", "1,2,3")]);
        let lookups = reconcile(&params, |_| true).unwrap();

        assert_eq!(
            lookups.get("id__in"),
            Some(&LookupValue::TextList(vec![
                "1".into(),
                "2".into(),
                "3".into()
            ]))
        );
    }

    #[test]
    fn isnull_suffix_coerces_boolean() {
        let params = QueryParams::from_pairs([
            ("a__isnull", ""),
            ("b__isnull", "false"),
            ("c__isnull", "0"),
            ("d__isnull", "true"),
            ("e__isnull", "anything"),
        ]);
        let lookups = reconcile(&params, |_| true).unwrap();

        assert_eq!(lookups.get("a__isnull"), Some(&LookupValue::Bool(false)));
        assert_eq!(lookups.get("b__isnull"), Some(&LookupValue::Bool(false)));
        assert_eq!(lookups.get("c__isnull"), Some(&LookupValue::Bool(false)));
        assert_eq!(lookups.get("d__isnull"), Some(&LookupValue::Bool(true)));
        assert_eq!(lookups.get("e__isnull"), Some(&LookupValue::Bool(true)));
    }

    #[test]
    fn latest_occurrence_wins() {
        let params = QueryParams::from_pairs([("name", "a"), ("name", "b")]);
        let lookups = reconcile(&params, |_| true).unwrap();

        assert_eq!(lookups.get("name"), Some(&LookupValue::Text("b".into())));
        assert_eq!(lookups.keys().len(), 1);
    }

    #[test]
    fn query_string_round_trips() {
        let params = QueryParams::from_pairs([("q", "two words"), ("name", "a&b=c")]);
        let rendered = params.to_query_string();
        let reparsed = QueryParams::parse(&rendered);

        assert_eq!(reparsed, params);
    }

    #[test]
    fn with_and_without_edit_copies() {
        let params = QueryParams::from_pairs([("a", "1"), ("b", "2")]);

        let edited = params.with([("b", "3"), ("c", "4")]).without(&["a"]);
        assert_eq!(edited.get("a"), None);
        assert_eq!(edited.get("b"), Some("3"));
        assert_eq!(edited.get("c"), Some("4"));

        // Source map is untouched.
        assert_eq!(params.get("b"), Some("2"));
    }

    #[test]
    fn empty_params_render_as_self_link() {
        assert_eq!(QueryParams::new().to_query_string(), "?");
    }
}
