use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;
use pest::iterators::Pair;

use super::{
    components::{
        Component, ComponentTable, ComponentTraits, DocumentComponentTable, HasArenaContainer,
    },
    error::ParseError,
    grammar::{declared_name, Rule},
    mapping_context::MappingContext,
    Enum, Flags, Function, ParseOptions, Record, Ref, Resource, Scalar, Type, TypeAlias, Union,
    Variant,
};

/// A parsed WITX document.
///
/// Owns every declaration of the document. The name-keyed collections list declarations in the
/// order they were declared; the [`Ref`]s they hold are dereferenced through the document itself,
/// e.g. `document.records()["r"].get(&document)`.
#[derive(Debug)]
pub struct Document {
    components: DocumentComponentTable,
    functions: IndexMap<String, Ref<Function>>,
    records: IndexMap<String, Ref<Record>>,
    variants: IndexMap<String, Ref<Variant>>,
    enums: IndexMap<String, Ref<Enum>>,
    flags: IndexMap<String, Ref<Flags>>,
    unions: IndexMap<String, Ref<Union>>,
    resources: IndexMap<String, Ref<Resource>>,
    type_aliases: IndexMap<String, Ref<TypeAlias>>,
}

impl Document {
    /// Reduces the `document` node of a parse tree.
    ///
    /// Every top-level declaration is reserved and registered before any body is reduced, so a
    /// name may be used before the declaration that introduces it.
    pub(crate) fn map_from_pair(
        document: Pair<'_, Rule>,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        debug_assert_eq!(document.as_rule(), Rule::document);
        let mut context = MappingContext::new(options.unresolved);

        let declarations: Vec<_> = document
            .into_inner()
            .filter(|pair| pair.as_rule() != Rule::EOI)
            .collect();

        let mut reserved = Vec::with_capacity(declarations.len());
        for declaration in &declarations {
            reserved.push(Self::reserve_declaration(&mut context, declaration)?);
        }

        for (declaration, handle) in declarations.into_iter().zip(reserved) {
            match handle {
                Type::Record(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Variant(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Enum(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Flags(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Union(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Resource(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Function(ref_) => context.map_top_level(ref_, declaration)?,
                Type::Alias(ref_) => context.map_top_level(ref_, declaration)?,
                other => {
                    return Err(ParseError::Internal(format!(
                        "{other:?} is not a declaration handle"
                    )))
                }
            }
        }

        let (components, types, functions) = context.into_parts();
        let components = components.convert_to_document_table().ok_or_else(|| {
            ParseError::Internal("a reserved declaration was never reduced".into())
        })?;

        let mut document = Self {
            components,
            functions,
            records: IndexMap::new(),
            variants: IndexMap::new(),
            enums: IndexMap::new(),
            flags: IndexMap::new(),
            unions: IndexMap::new(),
            resources: IndexMap::new(),
            type_aliases: IndexMap::new(),
        };
        for (name, handle) in types {
            match handle {
                Type::Record(ref_) => {
                    document.records.insert(name, ref_);
                }
                Type::Variant(ref_) => {
                    document.variants.insert(name, ref_);
                }
                Type::Enum(ref_) => {
                    document.enums.insert(name, ref_);
                }
                Type::Flags(ref_) => {
                    document.flags.insert(name, ref_);
                }
                Type::Union(ref_) => {
                    document.unions.insert(name, ref_);
                }
                Type::Resource(ref_) => {
                    document.resources.insert(name, ref_);
                }
                Type::Alias(ref_) => {
                    document.type_aliases.insert(name, ref_);
                }
                other => {
                    return Err(ParseError::Internal(format!(
                        "type name {name:?} is bound to {other:?}"
                    )))
                }
            }
        }
        document.check_alias_cycles()?;

        debug!(
            "reduced {} functions, {} records, {} variants, {} enums, {} flags, {} unions, \
             {} resources and {} type aliases",
            document.functions.len(),
            document.records.len(),
            document.variants.len(),
            document.enums.len(),
            document.flags.len(),
            document.unions.len(),
            document.resources.len(),
            document.type_aliases.len(),
        );
        Ok(document)
    }

    /// Reserves a slot for a top-level declaration and registers its name. Returns the handle
    /// references to the declaration resolve to.
    fn reserve_declaration(
        context: &mut MappingContext,
        declaration: &Pair<'_, Rule>,
    ) -> Result<Type, ParseError> {
        let name = declared_name(declaration)?;
        let handle = match declaration.as_rule() {
            Rule::record_def => Type::Record(context.reserve()),
            Rule::variant_def => Type::Variant(context.reserve()),
            Rule::enum_def => Type::Enum(context.reserve()),
            Rule::flags_def => Type::Flags(context.reserve()),
            Rule::union_def => Type::Union(context.reserve()),
            Rule::resource_def => {
                Resource::register_methods(context, declaration)?;
                Type::Resource(context.reserve())
            }
            Rule::type_alias => Type::Alias(context.reserve()),
            Rule::function_def => {
                let function = context.reserve();
                context.register_function(name, function)?;
                return Ok(Type::Function(function));
            }
            other => {
                return Err(ParseError::Internal(format!(
                    "{other:?} is not a top-level declaration"
                )))
            }
        };
        context.register_type(name, handle.clone())?;
        Ok(handle)
    }

    /// Rejects aliases that expand to themselves, possibly through options.
    fn check_alias_cycles(&self) -> Result<(), ParseError> {
        for (name, &alias) in &self.type_aliases {
            let mut seen = HashSet::from([alias]);
            let mut ty = &alias.get(self).target;
            loop {
                match ty {
                    Type::Alias(next) => {
                        if !seen.insert(*next) {
                            return Err(ParseError::CyclicAlias { name: name.clone() });
                        }
                        ty = &next.get(self).target;
                    }
                    Type::Option(inner) => ty = &**inner,
                    _ => break,
                }
            }
        }
        Ok(())
    }

    /// Whether the document declares nothing at all.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.records.is_empty()
            && self.variants.is_empty()
            && self.enums.is_empty()
            && self.flags.is_empty()
            && self.unions.is_empty()
            && self.resources.is_empty()
            && self.type_aliases.is_empty()
    }

    pub fn components(&self) -> &DocumentComponentTable {
        &self.components
    }

    /// The functions declared outside of any resource, in declaration order.
    pub fn top_level_functions(&self) -> impl Iterator<Item = (&str, Ref<Function>)> + '_ {
        let methods: HashSet<Ref<Function>> = self
            .resources
            .values()
            .flat_map(|resource| {
                let resource = resource.get(self);
                resource
                    .instance_methods
                    .values()
                    .chain(resource.static_methods.values())
                    .copied()
            })
            .collect();
        self.functions
            .iter()
            .filter(move |(_, function)| !methods.contains(*function))
            .map(|(name, &function)| (name.as_str(), function))
    }

    /// Resolves a type name the way a reference inside the document would.
    pub fn lookup_type(&self, name: &str) -> Option<Type> {
        if let Some(scalar) = Scalar::from_keyword(name) {
            return Some(Type::Scalar(scalar));
        }
        self.records
            .get(name)
            .map(|&r| Type::from(r))
            .or_else(|| self.variants.get(name).map(|&r| r.into()))
            .or_else(|| self.enums.get(name).map(|&r| r.into()))
            .or_else(|| self.flags.get(name).map(|&r| r.into()))
            .or_else(|| self.unions.get(name).map(|&r| r.into()))
            .or_else(|| self.resources.get(name).map(|&r| r.into()))
            .or_else(|| self.type_aliases.get(name).map(|&r| r.into()))
    }
}

impl ComponentTable for Document {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        self.components.get(ref_)
    }
}

macro_rules! document_collection_impl {
    ($($collection:ident, $single:ident: $component:ty;)*) => {
        impl Document {
            $(
                pub fn $collection(&self) -> &IndexMap<String, Ref<$component>> {
                    &self.$collection
                }

                pub fn $single(&self, name: &str) -> Option<&$component> {
                    self.$collection.get(name).map(|ref_| ref_.get(self))
                }
            )*
        }
    };
}

document_collection_impl! {
    functions, function: Function;
    records, record: Record;
    variants, variant: Variant;
    enums, enum_: Enum;
    flags, flags_named: Flags;
    unions, union: Union;
    resources, resource: Resource;
    type_aliases, type_alias: TypeAlias;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grammar::parse_document, Kind, UnresolvedAction};

    fn parse(text: &str) -> Result<Document, ParseError> {
        Document::map_from_pair(parse_document(text)?, &ParseOptions::default())
    }

    #[test]
    fn declarations_are_sorted_into_their_collections() {
        let document = parse(
            "
            record r { a: u32 }
            variant v { a }
            enum e { a }
            flags f { a }
            union u { u8 }
            resource x
            g: function()
            type t = r
            ",
        )
        .unwrap();

        assert_eq!(document.records().keys().collect::<Vec<_>>(), ["r"]);
        assert_eq!(document.variants().keys().collect::<Vec<_>>(), ["v"]);
        assert_eq!(document.enums().keys().collect::<Vec<_>>(), ["e"]);
        assert_eq!(document.flags().keys().collect::<Vec<_>>(), ["f"]);
        assert_eq!(document.unions().keys().collect::<Vec<_>>(), ["u"]);
        assert_eq!(document.resources().keys().collect::<Vec<_>>(), ["x"]);
        assert_eq!(document.functions().keys().collect::<Vec<_>>(), ["g"]);
        assert_eq!(document.type_aliases().keys().collect::<Vec<_>>(), ["t"]);
        assert!(!document.is_empty());
    }

    #[test]
    fn references_share_the_declaration() {
        let document = parse("f: function(a: r) -> option<r> record r { x: u8 }").unwrap();
        let f = document.function("f").unwrap();
        let r = document.records()["r"];

        assert_eq!(f.args["a"], Type::Record(r));
        assert_eq!(f.results[0].innermost(&document), &Type::Record(r));
        assert!(f.results[0].is_within_option(Kind::Record, &document));
    }

    #[test]
    fn self_references_are_allowed() {
        let document = parse("variant tree { leaf(u32), node(list<tree>) }").unwrap();
        let tree = document.variants()["tree"];
        let node = document.variant("tree").unwrap().payload("node").unwrap();
        assert_eq!(node.element(&document), Some(&Type::Variant(tree)));
    }

    #[test]
    fn undeclared_names_are_an_error_by_default() {
        assert!(matches!(
            parse("f: function(a: nowhere)"),
            Err(ParseError::UnresolvedReference { name }) if name == "nowhere"
        ));

        let options = ParseOptions {
            unresolved: UnresolvedAction::Allow,
        };
        let document =
            Document::map_from_pair(parse_document("f: function(a: nowhere)").unwrap(), &options)
                .unwrap();
        assert_eq!(
            document.function("f").unwrap().args["a"],
            Type::Named("nowhere".into())
        );
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        assert!(matches!(
            parse("record a {} variant a { x }"),
            Err(ParseError::DuplicateDeclaration { name }) if name == "a"
        ));
        assert!(matches!(
            parse("f: function() f: function(a: u8)"),
            Err(ParseError::DuplicateDeclaration { name }) if name == "f"
        ));
        // functions and types do not share a namespace
        assert!(parse("a: function() record a {}").is_ok());
        // methods do share it with functions, wherever they are declared
        for text in [
            "m: function() resource r { m: function() }",
            "resource r { m: function() } m: function()",
            "resource r { m: function() } resource s { static m: function() }",
        ] {
            assert!(
                matches!(
                    parse(text),
                    Err(ParseError::DuplicateDeclaration { ref name }) if name == "m"
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn methods_are_functions() {
        let document = parse(
            "
            a: function()
            resource r { m: function() static new: function() -> r }
            b: function(x: r)
            ",
        )
        .unwrap();
        assert_eq!(
            document.functions().keys().collect::<Vec<_>>(),
            ["a", "m", "new", "b"]
        );
        let r = document.resource("r").unwrap();
        assert_eq!(document.functions()["new"], r.static_methods["new"]);
        assert_eq!(
            document.top_level_functions().map(|(name, _)| name).collect::<Vec<_>>(),
            ["a", "b"]
        );
    }

    #[test]
    fn alias_cycles_are_rejected() {
        for text in [
            "type a = a",
            "type a = b type b = a",
            "type a = option<b> type b = option<a>",
        ] {
            assert!(
                matches!(parse(text), Err(ParseError::CyclicAlias { .. })),
                "{text}"
            );
        }
        // recursion through a named declaration is fine
        assert!(parse("type a = list<r> record r { next: option<a> }").is_ok());
    }

    #[test]
    fn lookup_prefers_scalars() {
        let document = parse("record string {} record r {}").unwrap();
        assert_eq!(
            document.lookup_type("string"),
            Some(Type::Scalar(Scalar::String))
        );
        assert_eq!(
            document.lookup_type("r"),
            Some(Type::Record(document.records()["r"]))
        );
        assert_eq!(document.lookup_type("missing"), None);
    }
}
