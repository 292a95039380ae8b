use std::fmt;

use indexmap::IndexMap;
use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTable, Named},
    display::{fmt_braced, Declaration, DisplayName},
    error::ParseError,
    grammar::{name_text, next_child, Rule},
    mapping_context::{insert_unique, MappingContext, TopLevelMappable},
    Ref, Type,
};

/// `record name { field: type, ... }`
#[derive(Clone, Debug)]
pub struct Record {
    pub name: String,
    /// Fields in declaration order.
    pub fields: IndexMap<String, Type>,
}

impl TopLevelMappable for Record {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        record: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(record.as_rule(), Rule::record_def);
        let mut children = record.into_inner();
        let name = name_text(next_child(&mut children, "record name")?)?;

        let mut fields = IndexMap::new();
        for field in children {
            let (field_name, ty) = context.map_name_and_type(field)?;
            insert_unique(&mut fields, &name, field_name, ty)?;
        }

        context.insert(self_ref, Self { name, fields });
        Ok(())
    }
}

impl Component for Record {
    const DISPLAY_NAME: &'static str = "Record";
}

impl Named for Record {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Record {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        fmt_braced(f, "record", &self.name, &self.fields, |f, (name, ty)| {
            write!(f, "{}: {}", DisplayName(name), ty.display(table))
        })
    }
}
