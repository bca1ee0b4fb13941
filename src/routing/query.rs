//! Query string lookup.

use url::form_urlencoded;

/// First value of `name` in `search` (with or without the leading `?`).
///
/// Keys and values are form-decoded, so `+` reads as a space.
pub fn query_parameter(search: &str, name: &str) -> Option<String> {
    let query = search.strip_prefix('?').unwrap_or(search);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
