//! Record schemas - the per-type field descriptors.
//!
//! A record type describes itself once, in [`Record::schema`]: each field's
//! property name, tag, static shape and accessors, plus the custom
//! capabilities it registers. The resolver turns that description into a
//! [`FieldMap`](crate::FieldMap), which is cached per type.

use std::any::TypeId;
use std::fmt;

use propmap_core::{Error, Key, Property};

use crate::capability::{Capabilities, KeyLoader, PropertyLoader, PropertySaver};
use crate::slot::Slot;

/// A native record type that can be loaded from and saved to a property list.
///
/// # Example
///
/// ```rust
/// use propmap_core::{Entity, Key};
/// use propmap_mapper::{load, Record, Schema};
///
/// #[derive(Default)]
/// struct User {
///     name: String,
///     age: i64,
///     key: Option<Key>,
/// }
///
/// impl Record for User {
///     fn schema() -> Schema<Self> {
///         Schema::<Self>::new()
///             .field("Name", |u| &u.name, |u| &mut u.name)
///             .tagged("Age", "age,noindex", |u| &u.age, |u| &mut u.age)
///             .tagged("Key", "__key__", |u| &u.key, |u| &mut u.key)
///     }
/// }
///
/// let mut user = User::default();
/// let entity = Entity::new()
///     .with_key(Key::name("User", "alice", None))
///     .with_property("Name", "Alice")
///     .with_property("age", 30i64);
/// load(&mut user, entity).unwrap();
/// assert_eq!(user.age, 30);
/// assert!(user.key.is_some());
/// ```
pub trait Record: Sized + 'static {
    /// Describe this type's fields and capabilities.
    ///
    /// Called once per process when the type is first mapped (and again,
    /// harmlessly, if two threads race on that first use).
    fn schema() -> Schema<Self>;
}

/// A type that can be declared as a record field.
pub trait FieldType: Slot + 'static {
    /// The static shape of the field, used by the resolver.
    fn shape() -> Shape;
}

/// The statically known shape of a field.
#[derive(Clone, Debug)]
pub enum Shape {
    /// A primitive or well-known value type.
    Scalar(&'static str),
    /// A key reference.
    Key,
    /// A dynamically typed slot, with the name of its constraint.
    Dynamic(&'static str),
    /// A nested record.
    Record(RecordType),
    /// An optional value (the pointer case).
    Optional(Box<Shape>),
    /// A sequence of values.
    Slice(Box<Shape>),
}

impl Shape {
    /// The record reached directly or through one `Optional`.
    pub fn record(&self) -> Option<&RecordType> {
        match self {
            Shape::Record(record) => Some(record),
            Shape::Optional(inner) => inner.record(),
            _ => None,
        }
    }

    /// The record reached directly, through an `Optional`, or as the
    /// element of a `Slice`.
    pub fn element_record(&self) -> Option<&RecordType> {
        match self {
            Shape::Slice(inner) => inner.record(),
            other => other.record(),
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, Shape::Slice(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Shape::Optional(_))
    }

    /// `Key` or `Option<Key>`.
    pub fn is_key(&self) -> bool {
        match self {
            Shape::Key => true,
            Shape::Optional(inner) => matches!(**inner, Shape::Key),
            _ => false,
        }
    }

    /// A slice whose elements are (optionally) slices themselves.
    pub(crate) fn is_nested_slice(&self) -> bool {
        fn contains_slice(shape: &Shape) -> bool {
            match shape {
                Shape::Slice(_) => true,
                Shape::Optional(inner) => contains_slice(inner),
                _ => false,
            }
        }
        match self {
            Shape::Slice(inner) => contains_slice(inner),
            Shape::Optional(inner) => inner.is_nested_slice(),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(name) => f.write_str(name),
            Shape::Key => f.write_str("Key"),
            Shape::Dynamic(constraint) => write!(f, "Dynamic<{}>", constraint),
            Shape::Record(record) => f.write_str(record.name()),
            Shape::Optional(inner) => write!(f, "Option<{}>", inner),
            Shape::Slice(inner) => write!(f, "Vec<{}>", inner),
        }
    }
}

/// Type-level handle on a record type, usable without an instance.
#[derive(Clone, Copy)]
pub struct RecordType {
    type_id: TypeId,
    name: &'static str,
    fields: fn() -> Vec<FieldInfo>,
    capabilities: fn() -> Capabilities,
}

impl RecordType {
    pub fn of<T: Record>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
            fields: || T::schema().infos(),
            capabilities: || T::schema().capabilities(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> Vec<FieldInfo> {
        (self.fields)()
    }

    pub fn capabilities(&self) -> Capabilities {
        (self.capabilities)()
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType").field("name", &self.name).finish()
    }
}

/// The instance-independent part of a field declaration.
#[derive(Clone, Debug)]
pub struct FieldInfo {
    /// Property name used when the tag does not rename the field.
    pub name: &'static str,
    /// Raw tag: `"name,option,option"`, `"-"` or `"__key__"`.
    pub tag: &'static str,
    /// Declared with [`Schema::embed`].
    pub embedded: bool,
    pub shape: Shape,
}

/// Erased field accessors for one record type.
pub(crate) trait Accessor<T>: Send + Sync {
    fn get<'a>(&self, record: &'a T) -> &'a dyn Slot;
    fn get_mut<'a>(&self, record: &'a mut T) -> &'a mut dyn Slot;
}

struct Typed<T, F> {
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: 'static, F: FieldType> Accessor<T> for Typed<T, F> {
    fn get<'a>(&self, record: &'a T) -> &'a dyn Slot {
        (self.get)(record)
    }

    fn get_mut<'a>(&self, record: &'a mut T) -> &'a mut dyn Slot {
        (self.get_mut)(record)
    }
}

pub(crate) struct FieldDef<T> {
    pub(crate) info: FieldInfo,
    pub(crate) accessor: Box<dyn Accessor<T>>,
}

pub(crate) type LoadFn<T> = fn(&mut T, Vec<Property>) -> Result<(), Error>;
pub(crate) type SaveFn<T> = fn(&T) -> Result<Vec<Property>, Error>;
pub(crate) type LoadKeyFn<T> = fn(&mut T, Key) -> Result<(), Error>;

/// Builder for a record type's description.
///
/// Fields are kept in declaration order. Field names follow the property
/// names they map to (`"I"`, `"Address"`), not the Rust field names.
pub struct Schema<T> {
    pub(crate) fields: Vec<FieldDef<T>>,
    pub(crate) loader: Option<LoadFn<T>>,
    pub(crate) saver: Option<SaveFn<T>>,
    pub(crate) key_loader: Option<LoadKeyFn<T>>,
}

impl<T: Record> Schema<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            loader: None,
            saver: None,
            key_loader: None,
        }
    }

    /// Declare a field mapped by its name.
    pub fn field<F: FieldType>(
        self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.push(name, "", false, get, get_mut)
    }

    /// Declare a field with a tag, e.g. `"AA"`, `",noindex"`, `"B.B"`,
    /// `"__key__"` or `"-"`.
    pub fn tagged<F: FieldType>(
        self,
        name: &'static str,
        tag: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.push(name, tag, false, get, get_mut)
    }

    /// Declare an embedded record whose fields are promoted into this
    /// record's namespace.
    pub fn embed<F: FieldType>(
        self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.push(name, "", true, get, get_mut)
    }

    /// Hand the whole property list to [`PropertyLoader::load`].
    pub fn with_loader(mut self) -> Self
    where
        T: PropertyLoader,
    {
        self.loader = Some(<T as PropertyLoader>::load);
        self
    }

    /// Produce properties through [`PropertySaver::save`].
    pub fn with_saver(mut self) -> Self
    where
        T: PropertySaver,
    {
        self.saver = Some(<T as PropertySaver>::save);
        self
    }

    /// Receive entity keys through [`KeyLoader::load_key`].
    pub fn with_key_loader(mut self) -> Self
    where
        T: KeyLoader,
    {
        self.key_loader = Some(<T as KeyLoader>::load_key);
        self
    }

    fn push<F: FieldType>(
        mut self,
        name: &'static str,
        tag: &'static str,
        embedded: bool,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.fields.push(FieldDef {
            info: FieldInfo {
                name,
                tag,
                embedded,
                shape: F::shape(),
            },
            accessor: Box::new(Typed { get, get_mut }),
        });
        self
    }

    pub fn infos(&self) -> Vec<FieldInfo> {
        self.fields.iter().map(|f| f.info.clone()).collect()
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            load: self.loader.is_some(),
            save: self.saver.is_some(),
            load_key: self.key_loader.is_some(),
        }
    }
}

impl<T: Record> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unqualified type name, keeping generic arguments.
pub(crate) fn type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}
