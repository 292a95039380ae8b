use std::fmt;

use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTable, Named},
    display::{Declaration, DisplayName},
    error::ParseError,
    grammar::{name_text, next_child, Rule},
    mapping_context::{MappingContext, TopLevelMappable},
    Ref, Type,
};

/// `type name = target`
#[derive(Clone, Debug)]
pub struct TypeAlias {
    pub name: String,
    pub target: Type,
}

impl TopLevelMappable for TypeAlias {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        alias: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(alias.as_rule(), Rule::type_alias);
        let mut children = alias.into_inner();
        let name = name_text(next_child(&mut children, "alias name")?)?;
        let target = context.map_type(next_child(&mut children, "aliased type")?)?;

        context.insert(self_ref, Self { name, target });
        Ok(())
    }
}

impl Component for TypeAlias {
    const DISPLAY_NAME: &'static str = "TypeAlias";
}

impl Named for TypeAlias {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for TypeAlias {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        write!(
            f,
            "type {} = {}",
            DisplayName(&self.name),
            self.target.display(table)
        )
    }
}
