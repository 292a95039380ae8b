pub mod components;
pub mod display;
pub mod document;
pub mod enum_def;
pub mod error;
pub mod flags_def;
pub mod function_def;
pub mod grammar;
pub mod loader;
pub mod record_def;
pub mod resource_def;
pub mod scalar;
pub mod type_alias;
pub mod types;
pub mod union_def;
pub mod variant_def;

mod mapping_context;

pub use components::{ComponentTable, Named, Ref};
pub use display::Declaration;
pub use document::Document;
pub use enum_def::Enum;
pub use error::{ParseError, RetrievalError};
pub use flags_def::Flags;
pub use function_def::Function;
pub use loader::Source;
pub use record_def::Record;
pub use resource_def::Resource;
pub use scalar::Scalar;
pub use type_alias::TypeAlias;
pub use types::{Expected, Kind, Type};
pub use union_def::Union;
pub use variant_def::Variant;

use log::debug;

/// What to do with a type reference that names nothing declared in the document.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum UnresolvedAction {
    /// Fail with [`ParseError::UnresolvedReference`].
    #[default]
    Deny,
    /// Log a warning and keep the reference as [`Type::Named`].
    Warn,
    /// Keep the reference as [`Type::Named`].
    Allow,
}

#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    pub unresolved: UnresolvedAction,
}

/// Parses one complete document.
///
/// Either the whole document is returned or the first error that was encountered.
pub fn parse<'a>(
    source: impl Into<Source<'a>>,
    options: &ParseOptions,
) -> Result<Document, ParseError> {
    let text = source.into().into_text()?;
    debug!("parsing {} bytes", text.len());
    let document = grammar::parse_document(&text)?;
    Document::map_from_pair(document, options)
}

/// Shorthand for parsing literal text with the default options.
pub fn parse_str(text: &str) -> Result<Document, ParseError> {
    parse(text, &ParseOptions::default())
}
