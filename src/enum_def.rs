use std::fmt;

use indexmap::IndexSet;
use pest::iterators::{Pair, Pairs};

use super::{
    components::{Component, ComponentTable, Named},
    display::{fmt_braced, Declaration, DisplayName},
    error::ParseError,
    grammar::{name_text, next_child, Rule},
    mapping_context::{MappingContext, TopLevelMappable},
    Ref,
};

/// `enum name { value, ... }`
#[derive(Clone, Debug)]
pub struct Enum {
    pub name: String,
    pub values: IndexSet<String>,
}

impl Enum {
    /// The discriminant of `value`, i.e. its position in the declaration.
    pub fn discriminant(&self, value: &str) -> Option<usize> {
        self.values.get_index_of(value)
    }
}

/// Collects the names following the declaration name, rejecting duplicates.
pub(crate) fn map_unique_names(
    owner: &str,
    names: Pairs<'_, Rule>,
) -> Result<IndexSet<String>, ParseError> {
    let mut unique = IndexSet::new();
    for name in names {
        let name = name_text(name)?;
        if unique.contains(&name) {
            return Err(ParseError::DuplicateName {
                owner: owner.into(),
                name,
            });
        }
        unique.insert(name);
    }
    Ok(unique)
}

impl TopLevelMappable for Enum {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        enum_: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(enum_.as_rule(), Rule::enum_def);
        let mut children = enum_.into_inner();
        let name = name_text(next_child(&mut children, "enum name")?)?;
        let values = map_unique_names(&name, children)?;

        context.insert(self_ref, Self { name, values });
        Ok(())
    }
}

impl Component for Enum {
    const DISPLAY_NAME: &'static str = "Enum";
}

impl Named for Enum {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Enum {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        _table: &T,
    ) -> fmt::Result {
        fmt_braced(f, "enum", &self.name, &self.values, |f, value| {
            write!(f, "{}", DisplayName(value))
        })
    }
}
