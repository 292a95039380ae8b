use std::fmt;

use super::components::{ComponentTable, Named};

/// Whether `name` can be written without quotes. `_` is reserved for absent `expected` arms.
pub(crate) fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_well && name != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Writes a declared name the way the grammar reads it back.
pub(crate) struct DisplayName<'a>(pub &'a str);

impl fmt::Display for DisplayName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_bare_identifier(self.0) {
            f.write_str(self.0)
        } else {
            write!(f, "\"{}\"", self.0.replace('"', "\\\""))
        }
    }
}

/// Writes `keyword name { a, b, }`, or `keyword name {}` without items.
pub(crate) fn fmt_braced<I, F>(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    name: &str,
    items: I,
    mut fmt_item: F,
) -> fmt::Result
where
    I: IntoIterator,
    F: FnMut(&mut fmt::Formatter<'_>, I::Item) -> fmt::Result,
{
    write!(f, "{keyword} {} {{", DisplayName(name))?;
    let mut empty = true;
    for item in items {
        f.write_str(" ")?;
        fmt_item(f, item)?;
        f.write_str(",")?;
        empty = false;
    }
    f.write_str(if empty { "}" } else { " }" })
}

/// Writes the items separated by `, ` with no trailing separator.
pub(crate) fn fmt_separated<I, F>(f: &mut fmt::Formatter<'_>, items: I, mut fmt_item: F) -> fmt::Result
where
    I: IntoIterator,
    F: FnMut(&mut fmt::Formatter<'_>, I::Item) -> fmt::Result,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        fmt_item(f, item)?;
    }
    Ok(())
}

/// A named declaration with a long canonical form, i.e. the text that declares it.
pub trait Declaration: Named + Sized {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result;

    /// The long canonical form, resolving references through `table`.
    fn declaration<'a, T: ComponentTable>(&'a self, table: &'a T) -> DeclarationDisplay<'a, Self, T> {
        DeclarationDisplay {
            declaration: self,
            table,
        }
    }
}

pub struct DeclarationDisplay<'a, D, T> {
    declaration: &'a D,
    table: &'a T,
}

impl<D, T> fmt::Display for DeclarationDisplay<'_, D, T>
where
    D: Declaration,
    T: ComponentTable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.declaration.fmt_declaration(f, self.table)
    }
}
