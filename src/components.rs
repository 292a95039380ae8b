use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::{NonZeroU32, NonZeroUsize};

use super::{Enum, Flags, Function, Record, Resource, TypeAlias, Union, Variant};

/// Trait implemented by all named declarations that live in a component table.
pub trait Component {
    const DISPLAY_NAME: &'static str;
}

/// Type on which internal component traits are implemented.
///
/// This type is used to prevent leaking internal functions into the [`Component`]
pub struct ComponentTraits;

/// A component referencable via [`Ref`]. Intended for internal use.
pub trait HasArenaContainer<R: Component>: Sized {
    fn get_container_from_construction_component_table(
        table: &ConstructionComponentTable,
    ) -> &[Option<R>];
    fn get_container_from_construction_component_table_mut(
        table: &mut ConstructionComponentTable,
    ) -> &mut Vec<Option<R>>;
    fn get_container_from_document_component_table(table: &DocumentComponentTable) -> &[R];
}

/// A reference to a [`Component`] stored in a [`ComponentTable`].
///
/// Every reference to the same declaration within one document is the same `Ref`, so two type
/// positions naming the same record compare equal and share the record's value.
pub struct Ref<R>(NonZeroU32, PhantomData<R>)
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>;

impl<R> Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    const fn from_inner(inner: NonZeroU32) -> Self {
        Self(inner, PhantomData)
    }

    fn index(self) -> usize {
        let size: NonZeroUsize = self
            .0
            .try_into()
            .expect("Could not convert component reference to usize index");
        usize::from(size) - 1
    }

    pub fn get(self, table: &impl ComponentTable) -> &R {
        table.get(self)
    }
}

// derive(...) does not work if R itself does not derive the trait, even though it is only "used"
// in the PhantomData; hence the manual impls below.

impl<R> Copy for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
}

impl<R> Clone for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> fmt::Debug for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{} #{}>", R::DISPLAY_NAME, self.0)
    }
}

impl<R> PartialEq for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<R> Eq for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
}

impl<R> Hash for Ref<R>
where
    R: Component,
    ComponentTraits: HasArenaContainer<R>,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// An arena-like container for the declarations of one document
pub trait ComponentTable {
    /// Retrieves a component's value by reference from this component table.
    /// This function panics if the reference does not belong to this table.
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>;
}

/// The table used while a document is being reduced.
///
/// Slots are `Option`s because every top-level declaration is reserved before any body is
/// reduced, so that forward and self references can be handed out before the value exists.
#[derive(Default)]
pub struct ConstructionComponentTable {
    enums: Vec<Option<Enum>>,
    flags: Vec<Option<Flags>>,
    functions: Vec<Option<Function>>,
    records: Vec<Option<Record>>,
    resources: Vec<Option<Resource>>,
    type_aliases: Vec<Option<TypeAlias>>,
    unions: Vec<Option<Union>>,
    variants: Vec<Option<Variant>>,
}

impl ConstructionComponentTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Ref`] which points to an absent, reserved slot in the table.
    pub(crate) fn reserve<R>(&mut self) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table_mut(self);

        container.push(None);

        // The length after the push is the slot's one-based ID
        let size = NonZeroUsize::new(container.len()).expect("container is non-empty after push");
        let id: NonZeroU32 = size.try_into().expect("ID did not fit into 32-bit integer");

        Ref::from_inner(id)
    }

    /// Inserts the `value` into the slot pointed to by `ref_`. Returns `ref_` for convenience.
    pub(crate) fn insert<R>(&mut self, ref_: Ref<R>, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_construction_component_table_mut(self);

        let slot = container
            .get_mut(ref_.index())
            .expect("Invalid component reference (out-of-bounds)");

        *slot = Some(value);

        ref_
    }

    /// Shorthand for `insert(reserve(), value)`
    #[cfg(test)]
    pub(crate) fn create<R>(&mut self, value: R) -> Ref<R>
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let ref_ = self.reserve();
        self.insert(ref_, value)
    }

    pub(crate) fn is_present<R>(&self, ref_: Ref<R>) -> bool
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        ComponentTraits::get_container_from_construction_component_table(self)
            .get(ref_.index())
            .map_or(false, Option::is_some)
    }

    /// Tries to convert this construction table to a [document table](DocumentComponentTable).
    /// If a reserved slot was never filled, `None` is returned instead.
    pub(crate) fn convert_to_document_table(self) -> Option<DocumentComponentTable> {
        Some(DocumentComponentTable {
            enums: Self::convert_container(self.enums)?,
            flags: Self::convert_container(self.flags)?,
            functions: Self::convert_container(self.functions)?,
            records: Self::convert_container(self.records)?,
            resources: Self::convert_container(self.resources)?,
            type_aliases: Self::convert_container(self.type_aliases)?,
            unions: Self::convert_container(self.unions)?,
            variants: Self::convert_container(self.variants)?,
        })
    }

    /// Helper for [`Self::convert_to_document_table()`]
    fn convert_container<R>(container: Vec<Option<R>>) -> Option<Box<[R]>> {
        container.into_iter().collect()
    }
}

/// The [component table](ComponentTable) owned by a parsed [`Document`](crate::Document).
///
/// Components for which a [`Ref`] exists will always be present in this table. The table is
/// read-only, so the components are stored in boxed slices.
#[derive(Debug)]
pub struct DocumentComponentTable {
    enums: Box<[Enum]>,
    flags: Box<[Flags]>,
    functions: Box<[Function]>,
    records: Box<[Record]>,
    resources: Box<[Resource]>,
    type_aliases: Box<[TypeAlias]>,
    unions: Box<[Union]>,
    variants: Box<[Variant]>,
}

impl ComponentTable for DocumentComponentTable {
    fn get<R>(&self, ref_: Ref<R>) -> &R
    where
        R: Component,
        ComponentTraits: HasArenaContainer<R>,
    {
        let container = ComponentTraits::get_container_from_document_component_table(self);
        container
            .get(ref_.index())
            .expect("Invalid component reference (out-of-bounds)")
    }
}

macro_rules! has_arena_container_impl {
    ($type_name:ty, $field_name:ident) => {
        impl HasArenaContainer<$type_name> for ComponentTraits {
            fn get_container_from_construction_component_table(
                table: &ConstructionComponentTable,
            ) -> &[Option<$type_name>] {
                &table.$field_name
            }

            fn get_container_from_construction_component_table_mut(
                table: &mut ConstructionComponentTable,
            ) -> &mut Vec<Option<$type_name>> {
                &mut table.$field_name
            }

            fn get_container_from_document_component_table(
                table: &DocumentComponentTable,
            ) -> &[$type_name] {
                &table.$field_name
            }
        }
    };
}

has_arena_container_impl!(Enum, enums);
has_arena_container_impl!(Flags, flags);
has_arena_container_impl!(Function, functions);
has_arena_container_impl!(Record, records);
has_arena_container_impl!(Resource, resources);
has_arena_container_impl!(TypeAlias, type_aliases);
has_arena_container_impl!(Union, unions);
has_arena_container_impl!(Variant, variants);

/// A component that is declared under a name
pub trait Named: Component {
    fn name(&self) -> &str;
}
