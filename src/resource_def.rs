use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTable, Named},
    display::{Declaration, DisplayName},
    error::ParseError,
    grammar::{declared_name, name_text, next_child, Rule},
    mapping_context::{MappingContext, TopLevelMappable},
    Function, Ref,
};

/// `resource name { method: function(...) static constructor: function(...) }`
///
/// Methods share one namespace with top-level functions and are listed in
/// [`Document::functions`](crate::Document::functions) as well.
#[derive(Clone, Debug)]
pub struct Resource {
    pub name: String,
    pub instance_methods: IndexMap<String, Ref<Function>>,
    pub static_methods: IndexMap<String, Ref<Function>>,
}

impl Resource {
    pub fn has_methods(&self) -> bool {
        !self.instance_methods.is_empty() || !self.static_methods.is_empty()
    }

    /// Looks up a method in either partition.
    pub fn method(&self, name: &str) -> Option<Ref<Function>> {
        self.instance_methods
            .get(name)
            .or_else(|| self.static_methods.get(name))
            .copied()
    }

    /// Reserves a slot for every method of a `resource_def` node and registers its name as a
    /// function.
    pub(crate) fn register_methods(
        context: &mut MappingContext,
        resource: &Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        let mut children = resource.clone().into_inner();
        let name = name_text(next_child(&mut children, "resource name")?)?;
        let mut seen = HashSet::new();
        for method in children.filter(|child| child.as_rule() == Rule::function_def) {
            let method_name = declared_name(&method)?;
            if !seen.insert(method_name.clone()) {
                return Err(ParseError::DuplicateName {
                    owner: name,
                    name: method_name,
                });
            }
            let function = context.reserve();
            context.register_function(method_name, function)?;
        }
        Ok(())
    }
}

impl TopLevelMappable for Resource {
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        resource: Pair<'_, Rule>,
    ) -> Result<(), ParseError> {
        debug_assert_eq!(resource.as_rule(), Rule::resource_def);
        let mut children = resource.into_inner();
        let name = name_text(next_child(&mut children, "resource name")?)?;

        let mut instance_methods = IndexMap::new();
        let mut static_methods = IndexMap::new();
        // `static` only ever applies to the function right after it
        let mut next_is_static = false;
        for child in children {
            match child.as_rule() {
                Rule::static_marker => next_is_static = true,
                Rule::function_def => {
                    let method = Function::map_from_pair(context, child)?;
                    let function = context.registered_function(&method.name)?;
                    let partition = if next_is_static {
                        &mut static_methods
                    } else {
                        &mut instance_methods
                    };
                    partition.insert(method.name.clone(), context.insert(function, method));
                    next_is_static = false;
                }
                other => {
                    return Err(ParseError::Internal(format!(
                        "unexpected {other:?} in resource {name:?}"
                    )))
                }
            }
        }

        context.insert(
            self_ref,
            Self {
                name,
                instance_methods,
                static_methods,
            },
        );
        Ok(())
    }
}

impl Component for Resource {
    const DISPLAY_NAME: &'static str = "Resource";
}

impl Named for Resource {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Declaration for Resource {
    fn fmt_declaration<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        write!(f, "resource {}", DisplayName(&self.name))?;
        if !self.has_methods() {
            return Ok(());
        }

        f.write_str(" {\n")?;
        for method in self.instance_methods.values() {
            writeln!(f, "  {}", method.get(table).declaration(table))?;
        }
        for method in self.static_methods.values() {
            writeln!(f, "  static {}", method.get(table).declaration(table))?;
        }
        f.write_str("}")
    }
}
