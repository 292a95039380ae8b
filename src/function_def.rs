use std::fmt;

use indexmap::IndexMap;
use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTable, Named},
    display::{fmt_separated, Declaration, DisplayName},
    error::ParseError,
    grammar::{name_text, next_child, single_child, Rule},
    mapping_context::{insert_unique, MappingContext, TopLevelMappable},
    Ref, Type,
};

/// `name: function(arg: type, ...) -> results`
///
/// Top-level functions and resource methods share this representation.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    /// Arguments in declaration order.
    pub args: IndexMap<String, Type>,
    /// Results in declaration order.
    pub results: Vec<Type>,
}

impl Function {
    pub(crate) fn map_from_pair(
        context: &MappingContext,
        function: Pair<'_, Rule>,
    ) -> Result<Self, ParseError> {
        debug_assert_eq!(function.as_rule(), Rule::function_def);
        let mut children = function.into_inner();
        let name = name_text(next_child(&mut children, "function name")?)?;

        let mut args = IndexMap::new();
        let mut results = Vec::new();
        let mut child_count = 0;
        for child in children {
            child_count += 1;
            match child.as_rule() {
                Rule::arg => {
                    let (arg_name, ty) = context.map_name_and_type(child)?;
                    insert_unique(&mut args, &name, arg_name, ty)?;
                }
                Rule::result => results.push(context.map_type(single_child(child)?)?),
                _ => {}
            }
        }

        if args.len() + results.len() != child_count {
            return Err(ParseError::Internal(format!(
                "function {name:?} has {child_count} parts, but only {} arguments and {} results",
                args.len(),
                results.len()
            )));
        }

        Ok(Self {
            name,
            args,
            results,
        })
    }

    /// The short canonical form, e.g. `function(a: u32) -> (u8, u8)`.
    pub fn signature<'a, T: ComponentTable>(&'a self, table: &'a T) -> SignatureDisplay<'a, T> {
        SignatureDisplay {
            function: self,
            table,
        }
    }

    pub(crate) fn fmt_signature<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        f.write_str("function(")?;
        fmt_separated(f, &self.args, |f, (name, ty)| {
            write!(f, "{}: {}", DisplayName(name), ty.display(table))
        })?;
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [result] => write!(f, " -> {}", result.display(table)),
            results => {
                f.write_str(" -> (")?;
                fmt_separated(f, results, |f, result| result.fmt_with(f, table))?;
                f.write_str(")")
            }
        }
    }
}

impl TopLevelMappable for Function {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        function: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        let function = Self::map_from_pair(context, function)?;
        context.insert(self_ref, function);
        Ok(())
    }
}

impl Component for Function {
    const DISPLAY_NAME: &'static str = "Function";
}

impl Named for Function {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Function {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        write!(f, "{}: ", DisplayName(&self.name))?;
        self.fmt_signature(f, table)
    }
}

pub struct SignatureDisplay<'a, T> {
    function: &'a Function,
    table: &'a T,
}

impl<T: ComponentTable> fmt::Display for SignatureDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.function.fmt_signature(f, self.table)
    }
}
