//! Key-Paths
//!
//! A key-path names a property reachable from an object by following object
//! references: `childView.childProp` reads `childView` on the starting
//! object, then `childProp` on whatever object that holds.
//!
//! Dependency declarations may also use brace patterns, so that
//! `name.{first,last}` declares both `name.first` and `name.last`.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{GraphError, Result};

/// Segment storage. Almost every real path has four segments or fewer.
pub type Segments = SmallVec<[String; 4]>;

/// A parsed, validated dot-separated key-path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Segments,
}

impl KeyPath {
    /// Parse a key-path, rejecting empty segments and paths longer than
    /// `max_depth` segments.
    pub fn parse(path: &str, max_depth: usize) -> Result<Self> {
        let invalid = |reason| GraphError::InvalidKeyPath {
            path: path.to_owned(),
            reason,
        };

        if path.is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Segments::new();
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if segment.contains(['{', '}', ',']) {
                return Err(invalid("unexpanded brace pattern"));
            }
            if segments.len() == max_depth {
                return Err(invalid("too many segments"));
            }
            segments.push(segment.to_owned());
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments. Always at least one.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The property read on the final object of the chain.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Expand brace groups in a dependency pattern.
///
/// Every group multiplies the result, so `{a,b}.{c,d}` yields four paths.
/// Groups cannot nest.
pub fn expand_braces(pattern: &str) -> Result<Vec<String>> {
    let invalid = |reason| GraphError::InvalidKeyPath {
        path: pattern.to_owned(),
        reason,
    };

    let Some(open) = pattern.find('{') else {
        if pattern.contains('}') {
            return Err(invalid("unbalanced brace"));
        }
        return Ok(vec![pattern.to_owned()]);
    };

    let prefix = &pattern[..open];
    if prefix.contains('}') {
        return Err(invalid("unbalanced brace"));
    }

    let rest = &pattern[open + 1..];
    let close = rest.find('}').ok_or_else(|| invalid("unbalanced brace"))?;
    let group = &rest[..close];
    if group.contains('{') {
        return Err(invalid("nested brace group"));
    }
    let suffix = &rest[close + 1..];

    let mut expanded = Vec::new();
    for tail in expand_braces(suffix)? {
        for alternative in group.split(',') {
            expanded.push(format!("{prefix}{alternative}{tail}"));
        }
    }
    Ok(expanded)
}
