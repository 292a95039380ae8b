use std::io;
use std::path::PathBuf;

use pest::error::{InputLocation, LineColLocation};
use thiserror::Error;

use super::grammar::Rule;

/// Everything that can abort a parse. No partial document is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {column} (offset {offset}): {message}")]
    Syntax {
        /// Byte offset into the document where no production matched.
        offset: usize,
        line: usize,
        column: usize,
        message: String,
    },
    /// The parse tree matched the grammar but its shape does not fit the reducer (e.g. a field
    /// without a type).
    #[error("malformed declaration: {0}")]
    Structural(String),
    /// The grammar produced a node the reducer has no use for.
    #[error("internal parser error: {0}")]
    Internal(String),
    #[error("reference to undeclared type {name:?}")]
    UnresolvedReference { name: String },
    #[error("{name:?} is declared more than once")]
    DuplicateDeclaration { name: String },
    #[error("{owner:?} contains {name:?} more than once")]
    DuplicateName { owner: String, name: String },
    #[error("type alias {name:?} refers back to itself")]
    CyclicAlias { name: String },
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

impl ParseError {
    /// A syntax error at byte `offset` of `text`, with a 1-based line and column.
    pub(crate) fn syntax_at(text: &str, offset: usize, message: impl Into<String>) -> Self {
        let before = &text[..offset];
        let line_start = before.rfind('\n').map_or(0, |newline| newline + 1);
        Self::Syntax {
            offset,
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
            message: message.into(),
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(error: pest::error::Error<Rule>) -> Self {
        let offset = match error.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        let (line, column) = match error.line_col {
            LineColLocation::Pos(line_col) => line_col,
            LineColLocation::Span(start, _) => start,
        };
        Self::Syntax {
            offset,
            line,
            column,
            message: error.variant.message().into_owned(),
        }
    }
}

/// Failure to obtain the document text from a [`Source`](crate::Source).
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to read {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read the input stream")]
    Io(#[from] io::Error),
    #[error("the input is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("failed to fetch {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("FTP transfer of {url} failed: {message}")]
    Ftp { url: String, message: String },
    #[error("unsupported URL scheme {0:?}")]
    UnsupportedScheme(String),
}
