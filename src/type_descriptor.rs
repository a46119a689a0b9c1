use crate::projection::content_type;
use serde::{Serialize, Serializer};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

/// A type that can describe its own shape for schema generation.
///
/// Implement this for request, response, query and header types:
///
/// ```
/// use openapi_from_routes::type_descriptor::{ApiType, TypeDescriptor};
///
/// struct Pet {
///     id: u64,
///     name: String,
///     age: Option<u32>,
/// }
///
/// impl ApiType for Pet {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::object::<Pet>("Pet")
///             .field::<u64>("id")
///             .field::<String>("name")
///             .field::<Option<u32>>("age")
///     }
/// }
///
/// assert_eq!(Pet::descriptor().name, "Pet");
/// ```
pub trait ApiType {
    fn descriptor() -> TypeDescriptor;
}

/// A type with a canonical example value used for schemas, examples and link detection.
pub trait WithExample: ApiType + Serialize + Sized {
    fn example() -> Self;
}

/// Shape of a type, as seen by the schema generator
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Simple type name, used as component name for named kinds
    pub name: String,
    /// Identity of the Rust type, when known
    pub type_id: Option<TypeId>,
    /// Description carried into the generated schema
    pub description: Option<String>,
    /// The kind of type
    pub kind: TypeKind,
}

/// Type kind - represents different categories of types
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A primitive type (String, i32, Uuid, etc.)
    Primitive(PrimitiveType),
    /// A struct type with fields, registered as a named object component
    Struct(StructDef),
    /// A string enum, registered as a named component
    Enum(EnumDef),
    /// A collection of elements
    Array(Box<TypeDescriptor>),
    /// A string-keyed map
    Map(Box<TypeDescriptor>),
    /// A value that may be absent
    Optional(Box<TypeDescriptor>),
    /// A union or intersection of other types
    Composite(CompositeDef),
    /// Any JSON value
    Any,
    /// A type whose encoding cannot be described, with the reason
    Unrepresentable(String),
}

/// Struct definition with fields
#[derive(Debug, Clone, Default)]
pub struct StructDef {
    pub fields: Vec<FieldDef>,
}

/// Field definition in a struct
///
/// The field type is resolved lazily so that recursive types can be described.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Encoded field name
    pub name: String,
    /// Produces the field type's descriptor
    pub descriptor: fn() -> TypeDescriptor,
    pub description: Option<String>,
}

/// Enum definition with its encoded variant names
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub variants: Vec<String>,
}

/// Composite (`allOf` / `anyOf` / `oneOf` / `not`) definition
#[derive(Debug, Clone)]
pub struct CompositeDef {
    pub kind: CompositeKind,
    pub members: Vec<TypeDescriptor>,
    /// Property name used as discriminator
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    AllOf,
    AnyOf,
    OneOf,
    Not,
}

/// Primitive types supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Uuid,
    DateTime,
    Date,
    Uri,
    /// Raw bytes, served as `application/octet-stream`
    Binary,
    /// Rendered HTML, served as `text/html`
    Html,
}

impl PrimitiveType {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::String => "String",
            PrimitiveType::Char => "Char",
            PrimitiveType::I8 => "Int8",
            PrimitiveType::I16 => "Int16",
            PrimitiveType::I32 => "Int32",
            PrimitiveType::I64 => "Int64",
            PrimitiveType::U8 => "UInt8",
            PrimitiveType::U16 => "UInt16",
            PrimitiveType::U32 => "UInt32",
            PrimitiveType::U64 => "UInt64",
            PrimitiveType::F32 => "Float",
            PrimitiveType::F64 => "Double",
            PrimitiveType::Bool => "Bool",
            PrimitiveType::Uuid => "UUID",
            PrimitiveType::DateTime => "DateTime",
            PrimitiveType::Date => "Date",
            PrimitiveType::Uri => "URL",
            PrimitiveType::Binary => "Binary",
            PrimitiveType::Html => "HTML",
        }
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 | PrimitiveType::U64
        )
    }
}

impl TypeDescriptor {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            type_id: None,
            description: None,
            kind,
        }
    }

    pub fn primitive(primitive: PrimitiveType) -> Self {
        Self::new(primitive.name(), TypeKind::Primitive(primitive))
    }

    /// Starts a struct descriptor for `T`, registered under `name`.
    pub fn object<T: 'static>(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Struct(StructDef::default())).identified::<T>()
    }

    /// A string enum with the given encoded variants.
    pub fn string_enum<T: 'static>(name: impl Into<String>, variants: &[&str]) -> Self {
        let variants = variants.iter().map(|v| v.to_string()).collect();
        Self::new(name, TypeKind::Enum(EnumDef { variants })).identified::<T>()
    }

    /// A named composite of other types, e.g. an enum with data-carrying variants.
    pub fn composite<T: 'static>(
        name: impl Into<String>,
        kind: CompositeKind,
        members: Vec<TypeDescriptor>,
    ) -> Self {
        let def = CompositeDef {
            kind,
            members,
            discriminator: None,
        };
        Self::new(name, TypeKind::Composite(def)).identified::<T>()
    }

    pub fn array(items: TypeDescriptor) -> Self {
        let name = format!("{}Array", items.name);
        Self::new(name, TypeKind::Array(Box::new(items)))
    }

    pub fn map(values: TypeDescriptor) -> Self {
        let name = format!("{}Map", values.name);
        Self::new(name, TypeKind::Map(Box::new(values)))
    }

    pub fn optional(wrapped: TypeDescriptor) -> Self {
        let name = wrapped.name.clone();
        Self::new(name, TypeKind::Optional(Box::new(wrapped)))
    }

    pub fn any() -> Self {
        Self::new("Any", TypeKind::Any)
    }

    /// Describes a type whose custom encoding has no schema counterpart.
    pub fn unrepresentable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Unrepresentable(reason.into()))
    }

    fn identified<T: 'static>(mut self) -> Self {
        self.type_id = Some(TypeId::of::<T>());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field of type `F` to a struct descriptor.
    pub fn field<F: ApiType>(self, name: impl Into<String>) -> Self {
        self.push_field(FieldDef {
            name: name.into(),
            descriptor: F::descriptor,
            description: None,
        })
    }

    /// Adds a documented field of type `F` to a struct descriptor.
    pub fn described_field<F: ApiType>(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.push_field(FieldDef {
            name: name.into(),
            descriptor: F::descriptor,
            description: Some(description.into()),
        })
    }

    fn push_field(mut self, field: FieldDef) -> Self {
        if let TypeKind::Struct(def) = &mut self.kind {
            def.fields.push(field);
        }
        self
    }

    /// Sets the discriminator property of a composite descriptor.
    pub fn discriminator(mut self, property: impl Into<String>) -> Self {
        if let TypeKind::Composite(def) = &mut self.kind {
            def.discriminator = Some(property.into());
        }
        self
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, TypeKind::Optional(_))
    }

    /// Media type a value of this type is served with when none is declared.
    pub fn default_content_type(&self) -> &'static str {
        match &self.kind {
            TypeKind::Primitive(PrimitiveType::String | PrimitiveType::Char) => {
                content_type::PLAIN_TEXT
            }
            TypeKind::Primitive(PrimitiveType::Binary) => content_type::OCTET_STREAM,
            TypeKind::Primitive(PrimitiveType::Html) => content_type::HTML,
            TypeKind::Optional(wrapped) => wrapped.default_content_type(),
            _ => content_type::JSON,
        }
    }
}

/// Raw bytes served as `application/octet-stream`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binary(pub Vec<u8>);

impl Serialize for Binary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Rendered HTML served as `text/html`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Html(pub String);

macro_rules! primitive_api_type {
    ($($ty:ty => $primitive:ident, $example:expr;)*) => {
        $(
            impl ApiType for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive(PrimitiveType::$primitive)
                }
            }

            impl WithExample for $ty {
                fn example() -> Self {
                    $example
                }
            }
        )*
    };
}

primitive_api_type! {
    String => String, "some string".to_string();
    char => Char, 'a';
    bool => Bool, true;
    i8 => I8, 1;
    i16 => I16, 1;
    i32 => I32, 1;
    i64 => I64, 1;
    isize => I64, 1;
    u8 => U8, 1;
    u16 => U16, 1;
    u32 => U32, 1;
    u64 => U64, 1;
    usize => U64, 1;
    f32 => F32, 1.0;
    f64 => F64, 1.0;
    uuid::Uuid => Uuid, uuid::Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8);
    chrono::DateTime<chrono::Utc> => DateTime, chrono::DateTime::<chrono::Utc>::default();
    chrono::NaiveDate => Date, chrono::NaiveDate::default();
    Binary => Binary, Binary::default();
    Html => Html, Html("<html>HTML text</html>".to_string());
}

impl ApiType for serde_json::Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::any()
    }
}

impl WithExample for serde_json::Value {
    fn example() -> Self {
        serde_json::json!({ "key": "value" })
    }
}

impl<T: ApiType> ApiType for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor())
    }
}

impl<T: WithExample> WithExample for Vec<T> {
    fn example() -> Self {
        vec![T::example()]
    }
}

impl<T: ApiType> ApiType for HashSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(T::descriptor())
    }
}

impl<T: WithExample + Hash + Eq> WithExample for HashSet<T> {
    fn example() -> Self {
        HashSet::from([T::example()])
    }
}

impl<T: ApiType> ApiType for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::descriptor())
    }
}

impl<T: WithExample> WithExample for Option<T> {
    fn example() -> Self {
        Some(T::example())
    }
}

impl<T: ApiType> ApiType for Box<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }
}

impl<T: WithExample> WithExample for Box<T> {
    fn example() -> Self {
        Box::new(T::example())
    }
}

impl<T: ApiType> ApiType for HashMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::descriptor())
    }
}

impl<T: WithExample> WithExample for HashMap<String, T> {
    fn example() -> Self {
        HashMap::from([("key".to_string(), T::example())])
    }
}

impl<T: ApiType> ApiType for BTreeMap<String, T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map(T::descriptor())
    }
}

impl<T: WithExample> WithExample for BTreeMap<String, T> {
    fn example() -> Self {
        BTreeMap::from([("key".to_string(), T::example())])
    }
}
