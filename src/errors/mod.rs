//! Error types and result aliases for the completion engine.
//!
//! All caller-visible errors are variants of [`TempletError`], rendered via
//! `miette` diagnostics. Only construction and feed parsing can fail; every
//! suggestion-time operation degrades to "no match" instead of erroring.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Main error type for the completion engine
#[derive(Error, Debug, Diagnostic)]
pub enum TempletError {
    #[error("invalid expression prefix")]
    #[diagnostic(code(templet::config::prefix), help("{help}"))]
    InvalidPrefix { prefix: char, help: String },

    #[error("invalid top-level identifier")]
    #[diagnostic(
        code(templet::config::top_level),
        help("top-level names must be non-empty and contain only word characters")
    )]
    InvalidTopLevel { name: String },

    #[error("malformed schema feed")]
    #[diagnostic(code(templet::feed::schema), help("{help}"))]
    MalformedSchemaFeed {
        #[source_code]
        src: String,
        #[label("parse error here")]
        span: SourceSpan,
        help: String,
    },

    #[error("malformed function feed")]
    #[diagnostic(code(templet::feed::functions), help("{help}"))]
    MalformedFunctionFeed {
        #[source_code]
        src: String,
        #[label("parse error here")]
        span: SourceSpan,
        help: String,
    },
}

impl TempletError {
    pub fn invalid_prefix(prefix: char, help: impl Into<String>) -> Self {
        TempletError::InvalidPrefix {
            prefix,
            help: help.into(),
        }
    }

    pub fn invalid_top_level(name: impl Into<String>) -> Self {
        TempletError::InvalidTopLevel { name: name.into() }
    }

    pub fn schema_feed(src: &str, err: &serde_json::Error) -> Self {
        let offset = position_offset(src, err.line(), err.column());
        TempletError::MalformedSchemaFeed {
            src: src.to_string(),
            span: (offset, 0).into(),
            help: err.to_string(),
        }
    }

    pub fn function_feed(src: &str, err: &serde_json::Error) -> Self {
        let offset = position_offset(src, err.line(), err.column());
        TempletError::MalformedFunctionFeed {
            src: src.to_string(),
            span: (offset, 0).into(),
            help: err.to_string(),
        }
    }
}

/// Convert serde_json's 1-based line/column into a byte offset into `src`
fn position_offset(src: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (idx, text) in src.lines().enumerate() {
        if idx + 1 == line {
            return offset + column.saturating_sub(1).min(text.len());
        }
        offset += text.len() + 1;
    }
    src.len()
}

/// Result type alias for the completion engine
pub type TempletResult<T> = Result<T, TempletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_offset_first_line() {
        assert_eq!(position_offset("{\"a\": }", 1, 7), 6);
    }

    #[test]
    fn test_position_offset_later_line() {
        let src = "{\n  \"a\": }\n}";
        // line 2, column 8 points at the closing brace after the colon
        assert_eq!(position_offset(src, 2, 8), 9);
    }

    #[test]
    fn test_position_offset_out_of_range() {
        assert_eq!(position_offset("{}", 9, 9), 2);
    }

    #[test]
    fn test_schema_feed_error_carries_source() {
        let src = "{\"types\": ]";
        let err = serde_json::from_str::<serde_json::Value>(src).unwrap_err();
        match TempletError::schema_feed(src, &err) {
            TempletError::MalformedSchemaFeed { src: s, .. } => assert_eq!(s, src),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
