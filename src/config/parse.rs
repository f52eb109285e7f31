//! Parsing cluster configuration text
//!
//! JSON files may carry `//` and `/* */` comments (JSONC). YAML is parsed
//! as-is. Both land in the same [`ClusterConfig`].

use thiserror::Error;

use super::input::ClusterConfig;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Json(String),

    #[error("Invalid YAML: {0}")]
    Yaml(String),
}

/// Input text format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// JSON, comments allowed
    Json,
    Yaml,
}

impl InputFormat {
    /// Guess the format from a file extension; anything unrecognised is JSON
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("yaml") | Some("yml") => InputFormat::Yaml,
            _ => InputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Scan {
    Code,
    Str,
    StrEscape,
    LineComment,
    BlockComment,
    BlockCommentStar,
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Remove JSONC comments, leaving string contents untouched.
/// Newlines inside comments are kept so parse errors report the right line.
pub fn strip_jsonc_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = Scan::Code;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        state = match (state, c) {
            (Scan::Code, '"') => {
                out.push(c);
                Scan::Str
            }
            (Scan::Code, '/') if chars.peek() == Some(&'/') => {
                chars.next();
                Scan::LineComment
            }
            (Scan::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                Scan::BlockComment
            }
            (Scan::Code, _) => {
                out.push(c);
                Scan::Code
            }
            (Scan::Str, '\\') => {
                out.push(c);
                Scan::StrEscape
            }
            (Scan::Str, '"') => {
                out.push(c);
                Scan::Code
            }
            (Scan::Str, _) | (Scan::StrEscape, _) => {
                out.push(c);
                Scan::Str
            }
            (Scan::LineComment, '\n') => {
                out.push('\n');
                Scan::Code
            }
            (Scan::LineComment, _) => Scan::LineComment,
            (Scan::BlockComment, '*') | (Scan::BlockCommentStar, '*') => Scan::BlockCommentStar,
            (Scan::BlockCommentStar, '/') => Scan::Code,
            (Scan::BlockComment, '\n') | (Scan::BlockCommentStar, '\n') => {
                out.push('\n');
                Scan::BlockComment
            }
            (Scan::BlockComment, _) | (Scan::BlockCommentStar, _) => Scan::BlockComment,
        };
    }

    out
}

/// Parse a cluster configuration in the given format.
/// Pure function - no I/O.
pub fn parse_cluster_config(
    content: &str,
    format: InputFormat,
) -> Result<ClusterConfig, ParseError> {
    match format {
        InputFormat::Json => {
            let stripped = strip_jsonc_comments(content);
            serde_json::from_str(&stripped).map_err(|e| ParseError::Json(e.to_string()))
        }
        InputFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| ParseError::Yaml(e.to_string()))
        }
    }
}
