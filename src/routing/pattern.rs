//! Route pattern compilation.
//!
//! A pattern is static text interleaved with `[name]` placeholders and `*`
//! wildcards. Compilation turns it into a single regular expression:
//!
//! ```text
//! "/users/[id]/*"
//!     → [Static("/users/"), Dynamic("id"), Static("/"), Wildcard]
//!     → /users/([^/]+)/(?s:.*)
//! ```
//!
//! # Design Decisions
//! - Static text is escaped, so `.` or `+` in a pattern are literal
//! - `[name]` captures one or more characters other than `/`
//! - `*` is greedy, spans `/`, and does not produce a capture
//! - Placeholder names are ASCII word characters; anything else stays static text

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PatternError;
use crate::routing::normalize::normalize;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z0-9_]+)\]|\*").expect("placeholder regex is valid"));

/// One piece of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, may contain `/`.
    Static(String),
    /// `[name]` placeholder.
    Dynamic(String),
    /// `*` wildcard.
    Wildcard,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    normalized: String,
    segments: Vec<Segment>,
    names: Vec<String>,
    regex: Regex,
}

impl Pattern {
    /// Compile `pattern` after normalizing it.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let normalized = normalize(pattern, false);
        let segments = tokenize(&normalized);

        let mut expression = String::with_capacity(normalized.len() * 2);
        let mut names = Vec::new();
        for segment in &segments {
            match segment {
                Segment::Static(text) => expression.push_str(&regex::escape(text)),
                Segment::Dynamic(name) => {
                    expression.push_str("([^/]+)");
                    names.push(name.clone());
                }
                Segment::Wildcard => expression.push_str("(?s:.*)"),
            }
        }

        let regex = Regex::new(&expression).map_err(|e| PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            raw: pattern.to_string(),
            normalized,
            segments,
            names,
            regex,
        })
    }

    /// The pattern as it was registered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized pattern text the expression was built from.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Dynamic names in left-to-right order, duplicates included.
    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Reject patterns whose dynamic names repeat.
    pub fn check_unique_params(&self) -> Result<(), PatternError> {
        for (i, name) in self.names.iter().enumerate() {
            if self.names[..i].contains(name) {
                return Err(PatternError::DuplicateParam {
                    pattern: self.raw.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn tokenize(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(pattern) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            segments.push(Segment::Static(pattern[last..whole.start()].to_string()));
        }
        match caps.get(1) {
            Some(name) => segments.push(Segment::Dynamic(name.as_str().to_string())),
            None => segments.push(Segment::Wildcard),
        }
        last = whole.end();
    }

    if last < pattern.len() {
        segments.push(Segment::Static(pattern[last..].to_string()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed_pattern() {
        let pattern = Pattern::compile("/users/[id]/*").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Static("/users/".into()),
                Segment::Dynamic("id".into()),
                Segment::Static("/".into()),
                Segment::Wildcard,
            ]
        );
        assert_eq!(pattern.param_names(), &["id".to_string()]);
    }

    #[test]
    fn test_placeholder_inside_segment() {
        let pattern = Pattern::compile("/post-[slug].html").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Static("/post-".into()),
                Segment::Dynamic("slug".into()),
                Segment::Static(".html".into()),
            ]
        );
    }

    #[test]
    fn test_non_word_brackets_stay_static() {
        let pattern = Pattern::compile("/[a-b]").unwrap();
        assert_eq!(pattern.segments(), &[Segment::Static("/[a-b]".into())]);
        assert!(pattern.param_names().is_empty());
    }

    #[test]
    fn test_pattern_is_normalized() {
        let pattern = Pattern::compile("\\a//[x]").unwrap();
        assert_eq!(pattern.normalized(), "/a/[x]");
        assert_eq!(pattern.as_str(), "\\a//[x]");
    }

    #[test]
    fn test_duplicate_params_detected() {
        let pattern = Pattern::compile("/[id]/[id]").unwrap();
        assert_eq!(pattern.param_names().len(), 2);
        assert_eq!(
            pattern.check_unique_params(),
            Err(PatternError::DuplicateParam {
                pattern: "/[id]/[id]".into(),
                name: "id".into(),
            })
        );
        assert!(Pattern::compile("/[a]/[b]").unwrap().check_unique_params().is_ok());
    }
}
