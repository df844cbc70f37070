//! Topic expressions and matching.
//!
//! Topics are hierarchical strings split into segments by a delimiter. A
//! compiled [`TopicExpr`] is an ordered list of segment matchers:
//!
//! - a **literal** segment matches the same text exactly (case-sensitive)
//! - the **single-level** wildcard matches exactly one segment
//! - the **multi-level** wildcard, valid only as the final segment, matches one
//!   or more remaining segments
//!
//! The delimiter and wildcard tokens are a [`TopicSyntax`]; the default is the
//! MQTT-like `/`, `+`, `#`.
//!
//! # Example
//!
//! ```rust
//! use portico_core::TopicExpr;
//!
//! let expr = TopicExpr::compile("door/+/open").unwrap();
//! assert!(expr.matches("door/1/open"));
//! assert!(!expr.matches("door/1/close"));
//!
//! let all = TopicExpr::compile("sensor/#").unwrap();
//! assert!(all.matches("sensor/room1/temp"));
//! assert!(!all.matches("sensor"));
//! ```

use crate::error::TopicError;
use std::{fmt, str::FromStr};

/// Delimiter and wildcard tokens used when compiling patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSyntax {
    /// Segment delimiter.
    pub delimiter: char,
    /// Token matching exactly one segment.
    pub single_level: String,
    /// Token matching one or more trailing segments.
    pub multi_level: String,
}

impl TopicSyntax {
    /// Create a custom syntax.
    pub fn new(
        delimiter: char,
        single_level: impl Into<String>,
        multi_level: impl Into<String>,
    ) -> Self {
        Self {
            delimiter,
            single_level: single_level.into(),
            multi_level: multi_level.into(),
        }
    }
}

impl Default for TopicSyntax {
    fn default() -> Self {
        Self::new('/', "+", "#")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    SingleLevel,
    MultiLevel,
}

/// An immutable compiled topic pattern.
#[derive(Debug, Clone)]
pub struct TopicExpr {
    pattern: String,
    delimiter: char,
    segments: Vec<Segment>,
}

impl TopicExpr {
    /// Compile a pattern with the default syntax.
    pub fn compile(pattern: &str) -> Result<Self, TopicError> {
        Self::compile_with(pattern, &TopicSyntax::default())
    }

    /// Compile a pattern with a custom syntax.
    pub fn compile_with(pattern: &str, syntax: &TopicSyntax) -> Result<Self, TopicError> {
        if pattern.is_empty() {
            return Err(TopicError::Empty);
        }

        let raw: Vec<&str> = pattern.split(syntax.delimiter).collect();
        let last = raw.len() - 1;
        let mut segments = Vec::with_capacity(raw.len());

        for (index, segment) in raw.into_iter().enumerate() {
            if segment == syntax.multi_level {
                if index != last {
                    return Err(TopicError::MisplacedMultiLevel(pattern.to_string()));
                }
                segments.push(Segment::MultiLevel);
            } else if segment == syntax.single_level {
                segments.push(Segment::SingleLevel);
            } else if segment.contains(syntax.single_level.as_str())
                || segment.contains(syntax.multi_level.as_str())
            {
                return Err(TopicError::MixedWildcard {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                });
            } else {
                segments.push(Segment::Literal(segment.to_string()));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            delimiter: syntax.delimiter,
            segments,
        })
    }

    /// Whether `topic` is accepted by this pattern.
    pub fn matches(&self, topic: &str) -> bool {
        let mut parts = topic.split(self.delimiter);
        for segment in &self.segments {
            match segment {
                Segment::MultiLevel => return parts.next().is_some(),
                Segment::SingleLevel => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(literal) => match parts.next() {
                    Some(part) if part == literal => {}
                    _ => return false,
                },
            }
        }
        parts.next().is_none()
    }

    /// The source pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern contains no wildcards.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }
}

impl FromStr for TopicExpr {
    type Err = TopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for TopicExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// The set of patterns a component is interested in.
///
/// A topic is of interest when it matches **any** pattern. Components that opt
/// out of filtering use [`TopicFilter::any`].
#[derive(Debug, Clone)]
pub enum TopicFilter {
    /// Accept every topic.
    Any,
    /// Accept topics matching at least one pattern.
    Patterns(Vec<TopicExpr>),
}

impl TopicFilter {
    /// A filter accepting every topic.
    pub fn any() -> Self {
        TopicFilter::Any
    }

    /// A filter over compiled patterns.
    pub fn patterns(exprs: Vec<TopicExpr>) -> Self {
        TopicFilter::Patterns(exprs)
    }

    /// Compile every pattern with `syntax`, failing on the first malformed one.
    pub fn compile<S: AsRef<str>>(
        patterns: &[S],
        syntax: &TopicSyntax,
    ) -> Result<Self, TopicError> {
        let exprs = patterns
            .iter()
            .map(|p| TopicExpr::compile_with(p.as_ref(), syntax))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TopicFilter::Patterns(exprs))
    }

    /// Whether the topic is of interest.
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            TopicFilter::Any => true,
            TopicFilter::Patterns(exprs) => exprs.iter().any(|e| e.matches(topic)),
        }
    }

    /// The compiled patterns (empty for [`TopicFilter::Any`]).
    pub fn exprs(&self) -> &[TopicExpr] {
        match self {
            TopicFilter::Any => &[],
            TopicFilter::Patterns(exprs) => exprs,
        }
    }
}
