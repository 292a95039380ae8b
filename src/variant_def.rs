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

/// `variant name { case, case(payload), ... }`
#[derive(Clone, Debug)]
pub struct Variant {
    pub name: String,
    /// Cases in declaration order, each with its optional payload.
    pub cases: IndexMap<String, Option<Type>>,
}

impl Variant {
    /// The payload of `case`; `None` both for unknown cases and for cases without payload.
    pub fn payload(&self, case: &str) -> Option<&Type> {
        self.cases.get(case)?.as_ref()
    }
}

impl TopLevelMappable for Variant {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        variant: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(variant.as_rule(), Rule::variant_def);
        let mut children = variant.into_inner();
        let name = name_text(next_child(&mut children, "variant name")?)?;

        let mut cases = IndexMap::new();
        for case in children {
            let mut parts = case.into_inner();
            let case_name = name_text(next_child(&mut parts, "case name")?)?;
            let payload = parts.next().map(|ty| context.map_type(ty)).transpose()?;
            if parts.next().is_some() {
                return Err(ParseError::Structural(format!(
                    "case {case_name:?} of {name:?} has more than one payload"
                )));
            }
            insert_unique(&mut cases, &name, case_name, payload)?;
        }

        context.insert(self_ref, Self { name, cases });
        Ok(())
    }
}

impl Component for Variant {
    const DISPLAY_NAME: &'static str = "Variant";
}

impl Named for Variant {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Variant {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        fmt_braced(f, "variant", &self.name, &self.cases, |f, (name, payload)| {
            write!(f, "{}", DisplayName(name))?;
            match payload {
                Some(ty) => write!(f, "({})", ty.display(table)),
                None => Ok(()),
            }
        })
    }
}
