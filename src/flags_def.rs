use std::fmt;

use indexmap::IndexSet;
use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTable, Named},
    display::{fmt_braced, Declaration, DisplayName},
    enum_def::map_unique_names,
    error::ParseError,
    grammar::{name_text, next_child, Rule},
    mapping_context::{MappingContext, TopLevelMappable},
    Ref,
};

/// `flags name { flag, ... }`. The bit of a flag is its position in the declaration.
#[derive(Clone, Debug)]
pub struct Flags {
    pub name: String,
    pub flags: IndexSet<String>,
}

impl Flags {
    pub fn bit(&self, flag: &str) -> Option<usize> {
        self.flags.get_index_of(flag)
    }

    /// The value with the bits of all `flags` set; `None` if one of them is not declared or does
    /// not fit into 64 bits.
    pub fn mask<'a>(&self, flags: impl IntoIterator<Item = &'a str>) -> Option<u64> {
        flags.into_iter().try_fold(0u64, |mask, flag| {
            let bit = u32::try_from(self.bit(flag)?).ok()?;
            Some(mask | 1u64.checked_shl(bit)?)
        })
    }
}

impl TopLevelMappable for Flags {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        flags: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(flags.as_rule(), Rule::flags_def);
        let mut children = flags.into_inner();
        let name = name_text(next_child(&mut children, "flags name")?)?;
        let flags = map_unique_names(&name, children)?;

        context.insert(self_ref, Self { name, flags });
        Ok(())
    }
}

impl Component for Flags {
    const DISPLAY_NAME: &'static str = "Flags";
}

impl Named for Flags {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Flags {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        _table: &T,
    ) -> fmt::Result {
        fmt_braced(f, "flags", &self.name, &self.flags, |f, flag| {
            write!(f, "{}", DisplayName(flag))
        })
    }
}
