use pest::iterators::{Pair, Pairs};
use pest::Parser;

use super::error::ParseError;

/// This module exists because `#[derive(Parser)]` generates an undocumented `Rule` enum.
#[allow(missing_docs)]
mod parser {
    use pest_derive::Parser;

    /// The WITX grammar, see `witx.pest`.
    #[derive(Parser)]
    #[grammar = "witx.pest"]
    pub struct WitxParser;
}

pub use parser::Rule;

/// How deeply `list<...>`, `option<...>`, `tuple<...>` and `expected<...>` may nest. Matching
/// and reduction both recurse once per level.
pub const MAX_NESTING: usize = 128;

/// Matches `text` against the grammar and returns the `document` node.
pub(crate) fn parse_document(text: &str) -> Result<Pair<'_, Rule>, ParseError> {
    check_nesting(text)?;
    let mut pairs = parser::WitxParser::parse(Rule::document, text)?;
    pairs
        .next()
        .ok_or_else(|| ParseError::Internal("the document rule produced no parse tree".into()))
}

/// Fails at the first `<` that opens a type nested deeper than [`MAX_NESTING`]. Quoted names are
/// skipped.
fn check_nesting(text: &str) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => {
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' if matches!(chars.peek(), Some((_, '"'))) => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '<' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(ParseError::syntax_at(
                        text,
                        offset,
                        format!("types nest deeper than {MAX_NESTING} levels"),
                    ));
                }
            }
            '>' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Takes the next child of a node, failing with a [`ParseError::Structural`] naming `what` if
/// the node has no more children.
pub(crate) fn next_child<'i>(
    children: &mut Pairs<'i, Rule>,
    what: &str,
) -> Result<Pair<'i, Rule>, ParseError> {
    children
        .next()
        .ok_or_else(|| ParseError::Structural(format!("missing {what}")))
}

/// Returns the only child of `pair`.
pub(crate) fn single_child(pair: Pair<'_, Rule>) -> Result<Pair<'_, Rule>, ParseError> {
    let rule = pair.as_rule();
    let mut children = pair.into_inner();
    match (children.next(), children.next()) {
        (Some(child), None) => Ok(child),
        _ => Err(ParseError::Structural(format!(
            "{rule:?} must have exactly one child"
        ))),
    }
}

/// Converts a `name` node into the name it denotes; quoted names are unquoted and `\"` is
/// unescaped.
pub(crate) fn name_text(name: Pair<'_, Rule>) -> Result<String, ParseError> {
    if name.as_rule() != Rule::name {
        return Err(ParseError::Internal(format!(
            "expected a name, found {:?}",
            name.as_rule()
        )));
    }
    let inner = single_child(name)?;
    match inner.as_rule() {
        Rule::identifier => Ok(inner.as_str().to_owned()),
        Rule::quoted => Ok(single_child(inner)?.as_str().replace("\\\"", "\"")),
        other => Err(ParseError::Internal(format!(
            "unexpected {other:?} inside a name"
        ))),
    }
}

/// The name a top-level declaration node declares. Every declaration starts with its name.
pub(crate) fn declared_name(declaration: &Pair<'_, Rule>) -> Result<String, ParseError> {
    let mut children = declaration.clone().into_inner();
    name_text(next_child(&mut children, "declaration name")?)
}
