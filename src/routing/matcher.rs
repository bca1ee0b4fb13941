//! Route matching logic.
//!
//! # Responsibilities
//! - Normalize the candidate path before testing it
//! - Require the first match of the pattern to consume the whole path
//! - Percent-decode captured values into a dynamic parameter map
//!
//! # Design Decisions
//! - Matching is case-sensitive; lowercasing is a router option applied upstream
//! - Later duplicate names overwrite earlier ones in the map
//! - A capture that is not valid UTF-8 once decoded rejects the match

use std::collections::HashMap;
use std::fmt::Debug;

use percent_encoding::percent_decode_str;

use crate::routing::normalize::normalize;
use crate::routing::pattern::Pattern;

/// Dynamic segment name → decoded value.
pub type DynamicMap = HashMap<String, String>;

/// Outcome of testing one pattern against one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    Match(DynamicMap),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match(_))
    }

    /// The parameter map, if the pattern matched.
    pub fn into_params(self) -> Option<DynamicMap> {
        match self {
            MatchResult::Match(map) => Some(map),
            MatchResult::NoMatch => None,
        }
    }
}

/// Trait for testing paths against a route condition.
pub trait Matcher: Send + Sync + Debug {
    /// Text identifying the condition in logs.
    fn pattern(&self) -> &str;

    /// Test `source` and extract dynamic values on success.
    fn match_path(&self, source: &str) -> MatchResult;
}

impl Matcher for Pattern {
    fn pattern(&self) -> &str {
        self.as_str()
    }

    fn match_path(&self, source: &str) -> MatchResult {
        let source = normalize(source, false);

        let Some(captures) = self.regex().captures(&source) else {
            return MatchResult::NoMatch;
        };

        // The first match must span the entire path, a prefix is not enough.
        let full = captures.get(0).is_some_and(|m| m.start() == 0 && m.end() == source.len());
        if !full {
            return MatchResult::NoMatch;
        }

        let names = self.param_names();
        if names.is_empty() {
            return MatchResult::Match(DynamicMap::new());
        }

        if captures.len() - 1 != names.len() {
            return MatchResult::NoMatch;
        }

        let mut map = DynamicMap::with_capacity(names.len());
        for (name, group) in names.iter().zip(captures.iter().skip(1)) {
            let Some(group) = group else {
                return MatchResult::NoMatch;
            };
            match percent_decode_str(group.as_str()).decode_utf8() {
                Ok(value) => {
                    map.insert(name.clone(), value.into_owned());
                }
                Err(_) => {
                    tracing::debug!(
                        pattern = %self.as_str(),
                        segment = %group.as_str(),
                        "Captured segment is not valid UTF-8 after decoding"
                    );
                    return MatchResult::NoMatch;
                }
            }
        }

        MatchResult::Match(map)
    }
}

/// Compile `pattern` and test it against `source` in one step.
pub fn match_path(pattern: &str, source: &str) -> MatchResult {
    match Pattern::compile(pattern) {
        Ok(compiled) => compiled.match_path(source),
        Err(e) => {
            tracing::warn!(pattern = %pattern, error = %e, "Pattern failed to compile");
            MatchResult::NoMatch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> DynamicMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_static_pattern_matches_normalized_equal() {
        assert_eq!(match_path("/about", "/about"), MatchResult::Match(DynamicMap::new()));
        assert!(match_path("/about", "//about").is_match());
        assert!(match_path("\\about", "/about").is_match());
        assert!(!match_path("/about", "/about/team").is_match());
        assert!(!match_path("/about", "/abou").is_match());
    }

    #[test]
    fn test_static_text_is_literal() {
        assert!(match_path("/file.txt", "/file.txt").is_match());
        assert!(!match_path("/file.txt", "/fileXtxt").is_match());
    }

    #[test]
    fn test_dynamic_segment() {
        assert_eq!(
            match_path("/[home]", "/hello"),
            MatchResult::Match(params(&[("home", "hello")]))
        );
    }

    #[test]
    fn test_dynamic_segment_does_not_span_slash() {
        assert!(!match_path("/[x]", "/a/b").is_match());
        assert!(!match_path("/a/[x]/[y]", "/a/1").is_match());
        assert_eq!(
            match_path("/a/[x]/[y]", "/a/1/2"),
            MatchResult::Match(params(&[("x", "1"), ("y", "2")]))
        );
    }

    #[test]
    fn test_wildcard_spans_segments() {
        assert_eq!(
            match_path("/a/*", "/a/b/c/d"),
            MatchResult::Match(DynamicMap::new())
        );
        assert!(match_path("/a/*", "/a/").is_match());
        assert!(!match_path("/a/*", "/b/c").is_match());
        assert!(match_path("*", "/anything/at/all").is_match());
    }

    #[test]
    fn test_wildcard_with_dynamic() {
        assert_eq!(
            match_path("/[lang]/*", "/en/docs/intro"),
            MatchResult::Match(params(&[("lang", "en")]))
        );
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            match_path("/[name]", "/%5Bfoo%5D"),
            MatchResult::Match(params(&[("name", "[foo]")]))
        );
        assert_eq!(
            match_path("/[name]", "/caf%C3%A9"),
            MatchResult::Match(params(&[("name", "café")]))
        );
        assert!(!match_path("/[name]", "/%FF").is_match());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        assert_eq!(
            match_path("/[id]/[id]", "/1/2"),
            MatchResult::Match(params(&[("id", "2")]))
        );
    }

    #[test]
    fn test_empty_pattern_and_source() {
        assert!(match_path("", "").is_match());
        assert!(!match_path("", "/").is_match());
        assert!(!match_path("/", "").is_match());
    }

    #[test]
    fn test_partial_match_rejected() {
        // The leftmost match is "/a", which is not the whole source.
        assert!(!match_path("/a", "/a/a").is_match());
        assert!(!match_path("/b", "/a/b").is_match());
    }
}
