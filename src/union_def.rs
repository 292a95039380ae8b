use std::fmt;

use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTable, Named},
    display::{fmt_braced, Declaration},
    error::ParseError,
    grammar::{name_text, next_child, Rule},
    mapping_context::{MappingContext, TopLevelMappable},
    Ref, Type,
};

/// `union name { type, ... }`. Members are not required to be distinct.
#[derive(Clone, Debug)]
pub struct Union {
    pub name: String,
    pub members: Vec<Type>,
}

impl TopLevelMappable for Union {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        union: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(union.as_rule(), Rule::union_def);
        let mut children = union.into_inner();
        let name = name_text(next_child(&mut children, "union name")?)?;
        let members = children
            .map(|member| context.map_type(member))
            .collect::<Result<_, _>>()?;

        context.insert(self_ref, Self { name, members });
        Ok(())
    }
}

impl Component for Union {
    const DISPLAY_NAME: &'static str = "Union";
}

impl Named for Union {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Union {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        fmt_braced(f, "union", &self.name, &self.members, |f, member| {
            member.fmt_with(f, table)
        })
    }
}
