use std::fmt;

use super::{
    components::{ComponentTable, Ref},
    display::{fmt_separated, DisplayName},
    Enum, Flags, Function, Record, Resource, Scalar, TypeAlias, Union, Variant,
};

/// A value in a type position.
///
/// Anonymous types (scalars, options, lists, tuples, expected) are held inline. Named
/// declarations are held as [`Ref`]s into the document's component table, so every position that
/// names the same declaration holds the same handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Scalar(Scalar),
    Option(Box<Type>),
    List(Box<Type>),
    Tuple(Vec<Type>),
    Expected(Expected),
    Record(Ref<Record>),
    Variant(Ref<Variant>),
    Enum(Ref<Enum>),
    Flags(Ref<Flags>),
    Union(Ref<Union>),
    Function(Ref<Function>),
    Resource(Ref<Resource>),
    Alias(Ref<TypeAlias>),
    /// A reference that did not resolve, kept only when unresolved references are tolerated.
    Named(String),
}

/// `expected<ok, err>`; an absent arm is written `_`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Expected {
    pub ok: Option<Box<Type>>,
    pub err: Option<Box<Type>>,
}

/// The twelve kinds a [`Type`] can have once aliases are looked through.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Scalar,
    Option,
    List,
    Tuple,
    Expected,
    Record,
    Variant,
    Enum,
    Flags,
    Union,
    Function,
    Resource,
}

impl Kind {
    pub const ALL: [Kind; 12] = [
        Self::Scalar,
        Self::Option,
        Self::List,
        Self::Tuple,
        Self::Expected,
        Self::Record,
        Self::Variant,
        Self::Enum,
        Self::Flags,
        Self::Union,
        Self::Function,
        Self::Resource,
    ];

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Option => "option",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Expected => "expected",
            Self::Record => "record",
            Self::Variant => "variant",
            Self::Enum => "enum",
            Self::Flags => "flags",
            Self::Union => "union",
            Self::Function => "function",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl Type {
    /// Follows alias chains to the aliased type.
    pub fn resolved<'a, T: ComponentTable>(&'a self, table: &'a T) -> &'a Type {
        let mut ty = self;
        while let Type::Alias(alias) = ty {
            ty = &alias.get(table).target;
        }
        ty
    }

    /// The kind of this type, looking through aliases. Unresolved names have no kind.
    pub fn kind<T: ComponentTable>(&self, table: &T) -> Option<Kind> {
        let kind = match self.resolved(table) {
            Type::Scalar(_) => Kind::Scalar,
            Type::Option(_) => Kind::Option,
            Type::List(_) => Kind::List,
            Type::Tuple(_) => Kind::Tuple,
            Type::Expected(_) => Kind::Expected,
            Type::Record(_) => Kind::Record,
            Type::Variant(_) => Kind::Variant,
            Type::Enum(_) => Kind::Enum,
            Type::Flags(_) => Kind::Flags,
            Type::Union(_) => Kind::Union,
            Type::Function(_) => Kind::Function,
            Type::Resource(_) => Kind::Resource,
            Type::Alias(_) | Type::Named(_) => return None,
        };
        Some(kind)
    }

    pub fn is<T: ComponentTable>(&self, kind: Kind, table: &T) -> bool {
        self.kind(table) == Some(kind)
    }

    /// Unwraps every option layer, looking through aliases that stand for options.
    ///
    /// The result is the first type that is not an option; if that type is reached through an
    /// alias, the alias itself is returned.
    pub fn innermost<'a, T: ComponentTable>(&'a self, table: &'a T) -> &'a Type {
        let mut ty = self;
        while let Type::Option(inner) = ty.resolved(table) {
            ty = &**inner;
        }
        ty
    }

    /// Like [`Self::is()`], but unwraps options first.
    pub fn is_within_option<T: ComponentTable>(&self, kind: Kind, table: &T) -> bool {
        self.innermost(table).is(kind, table)
    }

    pub fn scalar<T: ComponentTable>(&self, table: &T) -> Option<Scalar> {
        match self.resolved(table) {
            Type::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }

    pub fn is_scalar<T: ComponentTable>(&self, scalar: Scalar, table: &T) -> bool {
        self.scalar(table) == Some(scalar)
    }

    pub fn is_scalar_within_option<T: ComponentTable>(&self, scalar: Scalar, table: &T) -> bool {
        self.innermost(table).is_scalar(scalar, table)
    }

    /// The element type of a list.
    pub fn element<'a, T: ComponentTable>(&'a self, table: &'a T) -> Option<&'a Type> {
        match self.resolved(table) {
            Type::List(element) => Some(&**element),
            _ => None,
        }
    }

    pub fn tuple_elements<'a, T: ComponentTable>(&'a self, table: &'a T) -> Option<&'a [Type]> {
        match self.resolved(table) {
            Type::Tuple(elements) => Some(elements.as_slice()),
            _ => None,
        }
    }

    pub fn as_expected<'a, T: ComponentTable>(&'a self, table: &'a T) -> Option<&'a Expected> {
        match self.resolved(table) {
            Type::Expected(expected) => Some(expected),
            _ => None,
        }
    }

    /// The short canonical form, e.g. `list<option<u8>>`. Named declarations render as their
    /// name.
    pub fn display<'a, T: ComponentTable>(&'a self, table: &'a T) -> TypeDisplay<'a, T> {
        TypeDisplay { ty: self, table }
    }

    pub(crate) fn fmt_with<T: ComponentTable>(
        &self,
        f: &mut fmt::Formatter<'_>,
        table: &T,
    ) -> fmt::Result {
        match self {
            Type::Scalar(scalar) => write!(f, "{scalar}"),
            Type::Option(inner) => write!(f, "option<{}>", inner.display(table)),
            Type::List(element) => write!(f, "list<{}>", element.display(table)),
            Type::Tuple(elements) => {
                f.write_str("tuple<")?;
                fmt_separated(f, elements, |f, element| element.fmt_with(f, table))?;
                f.write_str(">")
            }
            Type::Expected(Expected { ok, err }) => {
                f.write_str("expected<")?;
                fmt_expected_arm(f, ok.as_deref(), table)?;
                f.write_str(", ")?;
                fmt_expected_arm(f, err.as_deref(), table)?;
                f.write_str(">")
            }
            Type::Record(record) => write!(f, "{}", DisplayName(&record.get(table).name)),
            Type::Variant(variant) => write!(f, "{}", DisplayName(&variant.get(table).name)),
            Type::Enum(enum_) => write!(f, "{}", DisplayName(&enum_.get(table).name)),
            Type::Flags(flags) => write!(f, "{}", DisplayName(&flags.get(table).name)),
            Type::Union(union) => write!(f, "{}", DisplayName(&union.get(table).name)),
            Type::Function(function) => function.get(table).fmt_signature(f, table),
            Type::Resource(resource) => write!(f, "{}", DisplayName(&resource.get(table).name)),
            Type::Alias(alias) => write!(f, "{}", DisplayName(&alias.get(table).name)),
            Type::Named(name) => write!(f, "{}", DisplayName(name)),
        }
    }
}

fn fmt_expected_arm<T: ComponentTable>(
    f: &mut fmt::Formatter<'_>,
    arm: Option<&Type>,
    table: &T,
) -> fmt::Result {
    match arm {
        Some(ty) => ty.fmt_with(f, table),
        None => f.write_str("_"),
    }
}

pub struct TypeDisplay<'a, T> {
    ty: &'a Type,
    table: &'a T,
}

impl<T: ComponentTable> fmt::Display for TypeDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ty.fmt_with(f, self.table)
    }
}

impl From<Scalar> for Type {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

macro_rules! declaration_type_impl {
    ($($method:ident: $variant:ident($component:ty)),* $(,)?) => {
        impl Type {
            $(
                /// Looks through aliases and returns the declaration if it has the matching kind.
                pub fn $method<'a, T: ComponentTable>(&'a self, table: &'a T) -> Option<&'a $component> {
                    match self.resolved(table) {
                        Type::$variant(ref_) => Some(ref_.get(table)),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<Ref<$component>> for Type {
                fn from(ref_: Ref<$component>) -> Self {
                    Self::$variant(ref_)
                }
            }
        )*
    };
}

declaration_type_impl!(
    as_record: Record(Record),
    as_variant: Variant(Variant),
    as_enum: Enum(Enum),
    as_flags: Flags(Flags),
    as_union: Union(Union),
    as_function: Function(Function),
    as_resource: Resource(Resource),
);

impl From<Ref<TypeAlias>> for Type {
    fn from(ref_: Ref<TypeAlias>) -> Self {
        Self::Alias(ref_)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::components::ConstructionComponentTable;

    fn option(ty: Type) -> Type {
        Type::Option(Box::new(ty))
    }

    #[test]
    fn scalars_render_as_keywords_inside_constructors() {
        let table = ConstructionComponentTable::new()
            .convert_to_document_table()
            .unwrap();
        let ty = Type::List(Box::new(Type::Tuple(vec![
            Scalar::U8.into(),
            option(Scalar::String.into()),
            Type::Expected(Expected {
                ok: None,
                err: Some(Box::new(Scalar::Char.into())),
            }),
        ])));
        assert_eq!(
            ty.display(&table).to_string(),
            "list<tuple<u8, option<string>, expected<_, char>>>"
        );
        assert_eq!(Type::Tuple(Vec::new()).display(&table).to_string(), "tuple<>");
        assert_eq!(
            Type::Named("not declared".into()).display(&table).to_string(),
            r#""not declared""#
        );
    }

    #[test]
    fn innermost_unwraps_any_number_of_options() {
        let table = ConstructionComponentTable::new()
            .convert_to_document_table()
            .unwrap();
        for depth in 0..5 {
            let mut ty = Type::from(Scalar::Bool);
            for _ in 0..depth {
                ty = option(ty);
            }
            assert_eq!(ty.innermost(&table), &Type::Scalar(Scalar::Bool));
            assert!(ty.is_scalar_within_option(Scalar::Bool, &table));
            assert_eq!(ty.is(Kind::Option, &table), depth > 0);
            assert_eq!(ty.is_scalar(Scalar::Bool, &table), depth == 0);
        }
    }

    #[test]
    fn aliases_are_transparent_to_kind_queries() {
        let mut components = ConstructionComponentTable::new();
        let record = components.create(Record {
            name: "r".into(),
            fields: IndexMap::new(),
        });
        let alias = components.create(TypeAlias {
            name: "maybe_r".into(),
            target: option(record.into()),
        });
        let table = components.convert_to_document_table().unwrap();

        let ty = Type::from(alias);
        assert_eq!(ty.kind(&table), Some(Kind::Option));
        assert!(ty.is_within_option(Kind::Record, &table));
        assert_eq!(ty.innermost(&table), &Type::Record(record));
        assert_eq!(ty.display(&table).to_string(), "maybe_r");

        let wrapped = option(Type::from(alias));
        assert_eq!(wrapped.innermost(&table), &Type::Record(record));
        assert_eq!(
            option(record.into()).as_record(&table).map(|r| r.name.as_str()),
            None
        );
        assert_eq!(Type::from(record).as_record(&table).unwrap().name, "r");
    }

    #[test]
    fn unresolved_names_have_no_kind() {
        let table = ConstructionComponentTable::new()
            .convert_to_document_table()
            .unwrap();
        let ty = Type::Named("later".into());
        assert_eq!(ty.kind(&table), None);
        assert!(Kind::ALL.iter().all(|&kind| !ty.is(kind, &table)));
    }
}
