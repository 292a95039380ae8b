use indexmap::IndexMap;
use log::warn;
use pest::iterators::Pair;

use super::{
    components::{Component, ComponentTraits, ConstructionComponentTable, HasArenaContainer},
    error::ParseError,
    grammar::{name_text, next_child, single_child, Rule},
    Expected, Function, Ref, Scalar, Type, UnresolvedAction,
};

pub(crate) trait TopLevelMappable: Component + Sized
where
    ComponentTraits: HasArenaContainer<Self>,
{
    /// Map this component from a top-level declaration. `self_ref` is the pre-reserved [`Ref`]
    /// for this component, which must be filled in before returning `Ok`.
    fn map_from_top_level_pair(
        context: &mut MappingContext,
        self_ref: Ref<Self>,
        declaration: Pair<'_, Rule>,
    ) -> Result<(), ParseError>;
}

/// The environment of one reduction: the component table under construction and the names
/// declared by the document.
pub(crate) struct MappingContext {
    components: ConstructionComponentTable,
    types: IndexMap<String, Type>,
    functions: IndexMap<String, Ref<Function>>,
    unresolved: UnresolvedAction,
}

impl MappingContext {
    pub(crate) fn new(unresolved: UnresolvedAction) -> Self {
        Self {
            components: ConstructionComponentTable::new(),
            types: IndexMap::new(),
            functions: IndexMap::new(),
            unresolved,
        }
    }

    pub(crate) fn reserve<R>(&mut self) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        self.components.reserve::<R>()
    }

    pub(crate) fn insert<R>(&mut self, ref_: Ref<R>, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        self.components.insert(ref_, value)
    }

    /// Reduces a reserved top-level declaration and checks that its slot was filled.
    pub(crate) fn map_top_level<C>(
        &mut self,
        ref_: Ref<C>,
        declaration: Pair<'_, Rule>,
    ) -> Result<(), ParseError>
    where
        C: TopLevelMappable,
        ComponentTraits: HasArenaContainer<C>,
    {
        C::map_from_top_level_pair(self, ref_, declaration)?;
        if !self.components.is_present(ref_) {
            return Err(ParseError::Internal(format!(
                "{ref_:?} was reserved but never reduced"
            )));
        }
        Ok(())
    }

    /// Declares a type name. `declared` is the handle every reference to `name` will resolve to.
    pub(crate) fn register_type(&mut self, name: String, declared: Type) -> Result<(), ParseError> {
        if self.types.contains_key(&name) {
            return Err(ParseError::DuplicateDeclaration { name });
        }
        if Scalar::from_keyword(&name).is_some() {
            warn!("{name:?} is declared but references to it resolve to the scalar type");
        }
        self.types.insert(name, declared);
        Ok(())
    }

    pub(crate) fn register_function(
        &mut self,
        name: String,
        function: Ref<Function>,
    ) -> Result<(), ParseError> {
        if self.functions.contains_key(&name) {
            return Err(ParseError::DuplicateDeclaration { name });
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// The handle registered for the function `name` while reserving.
    pub(crate) fn registered_function(&self, name: &str) -> Result<Ref<Function>, ParseError> {
        self.functions.get(name).copied().ok_or_else(|| {
            ParseError::Internal(format!("function {name:?} was never registered"))
        })
    }

    /// Resolves a type reference: scalar keywords first, then declared names.
    pub(crate) fn resolve_name(&self, name: &str) -> Result<Type, ParseError> {
        if let Some(scalar) = Scalar::from_keyword(name) {
            return Ok(Type::Scalar(scalar));
        }
        if let Some(declared) = self.types.get(name) {
            return Ok(declared.clone());
        }
        match self.unresolved {
            UnresolvedAction::Deny => Err(ParseError::UnresolvedReference { name: name.into() }),
            UnresolvedAction::Warn => {
                warn!("reference to undeclared type {name:?} is kept unresolved");
                Ok(Type::Named(name.into()))
            }
            UnresolvedAction::Allow => Ok(Type::Named(name.into())),
        }
    }

    /// Reduces a type reference node (`scalar`, `list`, `option`, `tuple`, `expected` or `name`).
    pub(crate) fn map_type(&self, ty: Pair<'_, Rule>) -> Result<Type, ParseError> {
        match ty.as_rule() {
            Rule::scalar => Scalar::from_keyword(ty.as_str())
                .map(Type::Scalar)
                .ok_or_else(|| ParseError::Internal(format!("unknown scalar {:?}", ty.as_str()))),
            Rule::list => Ok(Type::List(Box::new(self.map_type(single_child(ty)?)?))),
            Rule::option => Ok(Type::Option(Box::new(self.map_type(single_child(ty)?)?))),
            Rule::tuple => Ok(Type::Tuple(
                ty.into_inner()
                    .map(|element| self.map_type(element))
                    .collect::<Result<_, _>>()?,
            )),
            Rule::expected => {
                let mut arms = ty.into_inner();
                let ok = self.map_expected_arm(next_child(&mut arms, "ok arm of expected")?)?;
                let err = self.map_expected_arm(next_child(&mut arms, "error arm of expected")?)?;
                Ok(Type::Expected(Expected { ok, err }))
            }
            Rule::name => self.resolve_name(&name_text(ty)?),
            other => Err(ParseError::Internal(format!(
                "{other:?} is not a type reference"
            ))),
        }
    }

    fn map_expected_arm(&self, arm: Pair<'_, Rule>) -> Result<Option<Box<Type>>, ParseError> {
        if arm.as_rule() == Rule::placeholder {
            return Ok(None);
        }
        self.map_type(arm).map(|ty| Some(Box::new(ty)))
    }

    /// Reduces a `field` or `arg` node into its name and type.
    pub(crate) fn map_name_and_type(
        &self,
        pair: Pair<'_, Rule>,
    ) -> Result<(String, Type), ParseError> {
        let rule = pair.as_rule();
        let mut children = pair.into_inner();
        match (children.next(), children.next(), children.next()) {
            (Some(name), Some(ty), None) => Ok((name_text(name)?, self.map_type(ty)?)),
            _ => Err(ParseError::Structural(format!(
                "{rule:?} does not pair a name with a type"
            ))),
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        ConstructionComponentTable,
        IndexMap<String, Type>,
        IndexMap<String, Ref<Function>>,
    ) {
        (self.components, self.types, self.functions)
    }
}

/// Inserts a member of `owner`, failing if the name is already taken.
pub(crate) fn insert_unique<V>(
    members: &mut IndexMap<String, V>,
    owner: &str,
    name: String,
    value: V,
) -> Result<(), ParseError> {
    if members.contains_key(&name) {
        return Err(ParseError::DuplicateName {
            owner: owner.into(),
            name,
        });
    }
    members.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_document;
    use crate::Record;

    /// Reduces the type of the single argument of `f: function(a: <ty>)`.
    fn map_arg_type(context: &MappingContext, ty: &str) -> Result<Type, ParseError> {
        let text = format!("f: function(a: {ty})");
        let document = parse_document(&text)?;
        let function = document.into_inner().next().unwrap();
        let arg = function.into_inner().nth(1).unwrap();
        Ok(context.map_name_and_type(arg)?.1)
    }

    #[test]
    fn scalar_keywords_win_over_declarations() {
        let mut context = MappingContext::new(UnresolvedAction::Deny);
        let record: Ref<Record> = context.reserve();
        context.register_type("u8".into(), record.into()).unwrap();
        context.register_type("r".into(), record.into()).unwrap();

        assert_eq!(map_arg_type(&context, "u8").unwrap(), Type::Scalar(Scalar::U8));
        assert_eq!(map_arg_type(&context, "\"u8\"").unwrap(), Type::Scalar(Scalar::U8));
        assert_eq!(map_arg_type(&context, "r").unwrap(), Type::Record(record));
    }

    #[test]
    fn constructors_nest() {
        let context = MappingContext::new(UnresolvedAction::Deny);
        assert_eq!(
            map_arg_type(&context, "list<option<tuple<u8, string>>>").unwrap(),
            Type::List(Box::new(Type::Option(Box::new(Type::Tuple(vec![
                Type::Scalar(Scalar::U8),
                Type::Scalar(Scalar::String),
            ])))))
        );
        assert_eq!(
            map_arg_type(&context, "expected<_, u32>").unwrap(),
            Type::Expected(Expected {
                ok: None,
                err: Some(Box::new(Type::Scalar(Scalar::U32))),
            })
        );
    }

    #[test]
    fn unresolved_names_follow_the_configured_action() {
        let deny = MappingContext::new(UnresolvedAction::Deny);
        assert!(matches!(
            map_arg_type(&deny, "missing"),
            Err(ParseError::UnresolvedReference { name }) if name == "missing"
        ));

        for action in [UnresolvedAction::Warn, UnresolvedAction::Allow] {
            let context = MappingContext::new(action);
            assert_eq!(
                map_arg_type(&context, "option<missing>").unwrap(),
                Type::Option(Box::new(Type::Named("missing".into())))
            );
        }
    }

    #[test]
    fn names_are_declared_once_per_namespace() {
        let mut context = MappingContext::new(UnresolvedAction::Deny);
        let record: Ref<Record> = context.reserve();
        let function: Ref<Function> = context.reserve();
        context.register_type("x".into(), record.into()).unwrap();
        // functions live in their own namespace
        context.register_function("x".into(), function).unwrap();

        assert!(matches!(
            context.register_type("x".into(), record.into()),
            Err(ParseError::DuplicateDeclaration { name }) if name == "x"
        ));
        assert!(matches!(
            context.register_function("x".into(), function),
            Err(ParseError::DuplicateDeclaration { name }) if name == "x"
        ));
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let mut members = IndexMap::new();
        insert_unique(&mut members, "r", "a".into(), 1).unwrap();
        insert_unique(&mut members, "r", "b".into(), 2).unwrap();
        assert!(matches!(
            insert_unique(&mut members, "r", "a".into(), 3),
            Err(ParseError::DuplicateName { owner, name }) if owner == "r" && name == "a"
        ));
        assert_eq!(
            members.into_iter().collect::<Vec<_>>(),
            [("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }
}
