//! Path canonicalization.
//!
//! # Responsibilities
//! - Collapse runs of `/` and `\` into a single `/`
//! - Rewrite Windows namespace prefixes (`\\?\`, `\\.\`) to a leading `//`
//! - Optionally drop the trailing empty segment
//!
//! # Design Decisions
//! - Total function: every input produces a string, no error path
//! - Inputs of one character or less are returned untouched

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\]+").expect("separator regex is valid"));

/// Canonicalize `path` so that syntactically equivalent paths compare equal.
///
/// ```
/// use spa_router::routing::normalize::normalize;
///
/// assert_eq!(normalize("//a\\\\b/", false), "/a/b/");
/// assert_eq!(normalize("//a\\\\b/", true), "/a/b");
/// ```
pub fn normalize(path: &str, strip_trailing: bool) -> String {
    if path == "\\" || path == "/" {
        return "/".to_string();
    }

    if path.len() <= 1 {
        return path.to_string();
    }

    let (prefix, rest) = split_namespace_prefix(path);

    let mut segments: Vec<&str> = SEPARATOR_RUN.split(rest).collect();
    if strip_trailing && segments.last() == Some(&"") {
        segments.pop();
    }

    let mut normalized = String::with_capacity(path.len());
    normalized.push_str(prefix);
    normalized.push_str(&segments.join("/"));
    normalized
}

/// Namespaced win32 paths keep two leading slashes after normalization.
fn split_namespace_prefix(path: &str) -> (&'static str, &str) {
    let bytes = path.as_bytes();
    if bytes.len() > 4
        && bytes[3] == b'\\'
        && matches!(bytes[2], b'?' | b'.')
        && path.starts_with("\\\\")
    {
        return ("//", &path[2..]);
    }
    ("", path)
}
