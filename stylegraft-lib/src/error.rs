use std::path::PathBuf;
use thiserror::Error;

use crate::parser::css::CssParseError;

pub type GraftResult<T> = std::result::Result<T, GraftError>;

#[derive(Debug, Error)]
pub enum GraftError {
    #[error(transparent)]
    CssParse(#[from] CssParseError),

    #[error("failed to parse source: {}", .diagnostics.join("; "))]
    SourceParse { diagnostics: Vec<String> },

    /// A rule spec leaf that is neither a string nor an object.
    #[error("invalid value for `{property}` in `{selector}`: expected a string or an object")]
    InvalidLeaf { selector: String, property: String },

    #[error("unknown base color `{0}`")]
    UnknownBaseColor(String),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
