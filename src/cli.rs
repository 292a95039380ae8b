use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum UnresolvedAction {
    Deny,
    Warn,
    Allow,
}

impl From<UnresolvedAction> for witx_parser::UnresolvedAction {
    fn from(action: UnresolvedAction) -> Self {
        match action {
            UnresolvedAction::Deny => Self::Deny,
            UnresolvedAction::Warn => Self::Warn,
            UnresolvedAction::Allow => Self::Allow,
        }
    }
}

/// The declaration collections of a document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Functions,
    Records,
    Variants,
    Enums,
    Flags,
    Unions,
    Resources,
    Aliases,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Self::Functions,
        Self::Records,
        Self::Variants,
        Self::Enums,
        Self::Flags,
        Self::Unions,
        Self::Resources,
        Self::Aliases,
    ];
}

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// The WITX file, an http(s) or ftp URL, or the document text itself
    pub input: String,

    /// How to treat references to types the document does not declare
    #[arg(long, value_enum, default_value_t = UnresolvedAction::Deny)]
    pub unresolved: UnresolvedAction,

    /// Only print declarations from this collection
    #[arg(long, value_enum)]
    pub kind: Option<Collection>,
}
