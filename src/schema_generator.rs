use crate::any_value::AnyValue;
use crate::components::{Components, ExampleObject};
use crate::error::{Error, Result};
use crate::type_descriptor::{
    CompositeDef, CompositeKind, EnumDef, PrimitiveType, StructDef, TypeDescriptor, TypeKind,
};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::HashMap;

/// Schema generator - converts type descriptors to OpenAPI schemas
///
/// Named types (structs, string enums, composites) are registered as components and
/// referenced by `$ref`. Structurally equal schemas share one name; a different schema
/// under a taken name gets a numeric suffix (`Pet`, `Pet1`, `Pet2`, ...).
#[derive(Debug, Default)]
pub struct SchemaGenerator {
    /// Generated schema and example components
    components: Components,
    /// Component name assigned to each type during this pass
    names: HashMap<TypeId, String>,
    /// Named types currently being generated, innermost last
    resolving: Vec<Resolving>,
}

#[derive(Debug)]
struct Resolving {
    type_id: Option<TypeId>,
    name: String,
    /// Set when the type referenced itself while being generated
    recursive: bool,
}

/// Either a `$ref` to a component or an inline value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

impl<T> ReferenceOr<T> {
    /// Reference to `#/components/<section>/<name>`
    pub fn component(section: &str, name: &str) -> Self {
        ReferenceOr::Reference {
            reference: format!("#/components/{}/{}", section, name),
        }
    }

    pub fn as_item(&self) -> Option<&T> {
        match self {
            ReferenceOr::Item(item) => Some(item),
            ReferenceOr::Reference { .. } => None,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            ReferenceOr::Reference { reference } => Some(reference),
            ReferenceOr::Item(_) => None,
        }
    }

    /// Name of the referenced component, if this is a reference
    pub fn component_name(&self) -> Option<&str> {
        self.reference()
            .and_then(|reference| reference.rsplit('/').next())
    }
}

impl ReferenceOr<Schema> {
    pub fn schema_ref(name: &str) -> Self {
        Self::component("schemas", name)
    }
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "uuid", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Properties for object types
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, ReferenceOr<Schema>>,
    /// Required field names for object types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ReferenceOr<Schema>>>,
    /// Value schema for map types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<ReferenceOr<Schema>>>,
    /// Enum values for enum types
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<ReferenceOr<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<ReferenceOr<Schema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<ReferenceOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<ReferenceOr<Schema>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<AnyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
}

impl Schema {
    /// A schema with only `type` (and optionally `format`) set
    pub fn typed(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(|f| f.to_string()),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::typed("string", None)
    }

    pub fn object(properties: IndexMap<String, ReferenceOr<Schema>>, required: Vec<String>) -> Self {
        Self {
            properties,
            required,
            ..Self::typed("object", None)
        }
    }

    pub fn array(items: ReferenceOr<Schema>) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array", None)
        }
    }

    /// Composite schema of the given kind; `not` keeps only the first member
    pub fn composite(kind: CompositeKind, mut members: Vec<ReferenceOr<Schema>>) -> Self {
        let mut schema = Self::default();
        match kind {
            CompositeKind::AllOf => schema.all_of = members,
            CompositeKind::AnyOf => schema.any_of = members,
            CompositeKind::OneOf => schema.one_of = members,
            CompositeKind::Not => {
                if !members.is_empty() {
                    schema.not = Some(Box::new(members.swap_remove(0)));
                }
            }
        }
        schema
    }

    /// Whether the property is listed in `required`
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl SchemaGenerator {
    /// Create an empty SchemaGenerator
    pub fn new() -> Self {
        debug!("Initializing SchemaGenerator");
        Self::default()
    }

    /// Generate a schema for a type descriptor
    ///
    /// Named kinds are registered in the component table and returned as references.
    pub fn generate_schema(&mut self, descriptor: &TypeDescriptor) -> Result<ReferenceOr<Schema>> {
        debug!("Generating schema for type: {}", descriptor.name);

        match &descriptor.kind {
            TypeKind::Primitive(primitive) => Ok(ReferenceOr::Item(primitive_to_schema(primitive))),
            TypeKind::Array(items) => {
                let items = self.generate_schema(items)?;
                Ok(ReferenceOr::Item(Schema::array(items)))
            }
            TypeKind::Map(values) => {
                let values = self.generate_schema(values)?;
                Ok(ReferenceOr::Item(Schema {
                    additional_properties: Some(Box::new(values)),
                    ..Schema::typed("object", None)
                }))
            }
            TypeKind::Optional(wrapped) => {
                let wrapped = self.generate_schema(wrapped)?;
                Ok(ReferenceOr::Item(nullable(wrapped)))
            }
            TypeKind::Any => Ok(ReferenceOr::Item(Schema::default())),
            TypeKind::Unrepresentable(reason) => Err(Error::InferenceError {
                type_name: descriptor.name.clone(),
                message: reason.clone(),
            }),
            TypeKind::Struct(_) | TypeKind::Enum(_) | TypeKind::Composite(_) => {
                self.generate_named_schema(descriptor)
            }
        }
    }

    /// Generate a schema for a descriptor and register `example` next to it
    ///
    /// The example is stored under the same component name as the schema when the schema
    /// is a reference, and inlined otherwise. A different value already stored under that
    /// name moves the new one to the next suffixed name.
    pub fn generate_example(
        &mut self,
        descriptor: &TypeDescriptor,
        example: AnyValue,
    ) -> Result<(ReferenceOr<Schema>, ReferenceOr<ExampleObject>)> {
        let schema = self.generate_schema(descriptor)?;
        let example = match schema.component_name() {
            Some(name) => {
                let name = name.to_string();
                let name = self.assign_example_name(&name, example);
                ReferenceOr::component("examples", &name)
            }
            None => ReferenceOr::Item(ExampleObject::new(example)),
        };
        Ok((schema, example))
    }

    /// Generate (or reuse) the component for a struct, enum or composite
    fn generate_named_schema(&mut self, descriptor: &TypeDescriptor) -> Result<ReferenceOr<Schema>> {
        if let Some(type_id) = descriptor.type_id {
            if let Some(name) = self.names.get(&type_id) {
                debug!("Schema for {} already exists as {}", descriptor.name, name);
                return Ok(ReferenceOr::schema_ref(name));
            }
            if let Some(entry) = self
                .resolving
                .iter_mut()
                .find(|entry| entry.type_id == Some(type_id))
            {
                debug!("Recursive reference to {}", entry.name);
                entry.recursive = true;
                return Ok(ReferenceOr::schema_ref(&entry.name));
            }
        }

        let provisional = self.free_name(&descriptor.name);
        self.resolving.push(Resolving {
            type_id: descriptor.type_id,
            name: provisional,
            recursive: false,
        });
        let schema = self.build_named_schema(descriptor);
        let entry = self.resolving.pop();
        let mut schema = schema?;
        if let Some(description) = &descriptor.description {
            schema.description = Some(description.clone());
        }

        let name = match entry {
            Some(entry) if entry.recursive => {
                self.components.schemas.insert(entry.name.clone(), schema);
                entry.name
            }
            _ => self.assign_name(&descriptor.name, schema),
        };
        if let Some(type_id) = descriptor.type_id {
            self.names.insert(type_id, name.clone());
        }
        Ok(ReferenceOr::schema_ref(&name))
    }

    fn build_named_schema(&mut self, descriptor: &TypeDescriptor) -> Result<Schema> {
        match &descriptor.kind {
            TypeKind::Struct(def) => self.generate_struct_schema(descriptor, def),
            TypeKind::Enum(def) => Ok(enum_schema(def)),
            TypeKind::Composite(def) => self.generate_composite_schema(def),
            _ => match self.generate_schema(descriptor)? {
                ReferenceOr::Item(schema) => Ok(schema),
                reference => Ok(Schema::composite(CompositeKind::AllOf, vec![reference])),
            },
        }
    }

    fn generate_struct_schema(&mut self, descriptor: &TypeDescriptor, def: &StructDef) -> Result<Schema> {
        debug!("Generating struct schema for: {}", descriptor.name);

        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for field in &def.fields {
            let field_type = (field.descriptor)();
            let property = self.generate_schema(&field_type).map_err(|err| match err {
                Error::InferenceError { message, .. } => Error::InferenceError {
                    type_name: descriptor.name.clone(),
                    message: format!("field `{}`: {}", field.name, message),
                },
                other => other,
            })?;
            let property = match (property, &field.description) {
                (ReferenceOr::Item(schema), Some(description)) => {
                    ReferenceOr::Item(schema.description(description.clone()))
                }
                (property, _) => property,
            };
            properties.insert(field.name.clone(), property);

            // Optional fields are the only ones left out of `required`
            if !field_type.is_optional() {
                required.push(field.name.clone());
            }
        }

        Ok(Schema::object(properties, required))
    }

    fn generate_composite_schema(&mut self, def: &CompositeDef) -> Result<Schema> {
        let members = def
            .members
            .iter()
            .map(|member| self.generate_schema(member))
            .collect::<Result<Vec<_>>>()?;
        let mut schema = Schema::composite(def.kind, members);
        schema.discriminator = def.discriminator.clone().map(|property_name| Discriminator { property_name });
        Ok(schema)
    }

    /// First name in `base`, `base1`, `base2`, ... that is neither registered nor reserved
    fn free_name(&self, base: &str) -> String {
        candidate_names(base)
            .find(|name| !self.components.schemas.contains_key(name) && !self.is_reserved(name))
            .unwrap_or_else(|| base.to_string())
    }

    /// Registers `schema` under the first candidate name that is free or already holds an equal schema
    fn assign_name(&mut self, base: &str, schema: Schema) -> String {
        for name in candidate_names(base) {
            if self.is_reserved(&name) {
                continue;
            }
            match self.components.schemas.get(&name) {
                Some(existing) if *existing == schema => {
                    debug!("Reusing structurally equal schema {}", name);
                    return name;
                }
                Some(_) => continue,
                None => {
                    self.components.schemas.insert(name.clone(), schema);
                    return name;
                }
            }
        }
        base.to_string()
    }

    fn assign_example_name(&mut self, base: &str, value: AnyValue) -> String {
        for name in candidate_names(base) {
            match self.components.examples.get(&name) {
                Some(existing) if existing.value == value => return name,
                Some(_) => continue,
                None => {
                    self.components.examples.insert(name.clone(), ExampleObject::new(value));
                    return name;
                }
            }
        }
        base.to_string()
    }

    fn is_reserved(&self, name: &str) -> bool {
        self.resolving.iter().any(|entry| entry.name == name)
    }

    /// Registered schemas and examples
    pub fn components(&self) -> &Components {
        &self.components
    }

    pub fn into_components(self) -> Components {
        self.components
    }
}

fn candidate_names(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((1..=u32::MAX).map(move |suffix| format!("{}{}", base, suffix)))
}

fn nullable(schema: ReferenceOr<Schema>) -> Schema {
    match schema {
        ReferenceOr::Item(schema) => Schema {
            nullable: Some(true),
            ..schema
        },
        reference => Schema {
            nullable: Some(true),
            ..Schema::composite(CompositeKind::AllOf, vec![reference])
        },
    }
}

fn enum_schema(def: &EnumDef) -> Schema {
    Schema {
        enum_values: def.variants.clone(),
        ..Schema::string()
    }
}

/// Convert a primitive type to an OpenAPI schema
pub fn primitive_to_schema(primitive: &PrimitiveType) -> Schema {
    let (schema_type, format) = match primitive {
        PrimitiveType::String | PrimitiveType::Char | PrimitiveType::Html => ("string", None),
        PrimitiveType::I8 | PrimitiveType::I16 | PrimitiveType::I32 => ("integer", Some("int32")),
        PrimitiveType::I64 => ("integer", Some("int64")),
        PrimitiveType::U8 | PrimitiveType::U16 | PrimitiveType::U32 => ("integer", Some("int32")),
        PrimitiveType::U64 => ("integer", Some("int64")),
        PrimitiveType::F32 => ("number", Some("float")),
        PrimitiveType::F64 => ("number", Some("double")),
        PrimitiveType::Bool => ("boolean", None),
        PrimitiveType::Uuid => ("string", Some("uuid")),
        PrimitiveType::DateTime => ("string", Some("date-time")),
        PrimitiveType::Date => ("string", Some("date")),
        PrimitiveType::Uri => ("string", Some("uri")),
        PrimitiveType::Binary => ("string", Some("binary")),
    };

    let mut schema = Schema::typed(schema_type, format);
    if primitive.is_unsigned() {
        schema.minimum = Some(0);
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_descriptor::ApiType;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    struct User;

    impl ApiType for User {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<User>("User")
                .field::<u32>("id")
                .field::<String>("name")
                .field::<bool>("active")
        }
    }

    struct Profile;

    impl ApiType for Profile {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<Profile>("Profile")
                .described_field::<String>("bio", "Short biography")
                .field::<Option<String>>("avatar")
        }
    }

    struct Account;

    impl ApiType for Account {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<Account>("Account")
                .field::<Uuid>("id")
                .field::<Profile>("profile")
                .field::<Option<Vec<User>>>("friends")
        }
    }

    struct Status;

    impl ApiType for Status {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::string_enum::<Status>("Status", &["active", "inactive", "pending"])
        }
    }

    mod other {
        use super::*;

        pub struct User;

        impl ApiType for User {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::object::<User>("User").field::<String>("email")
            }
        }

        pub struct SameUser;

        impl ApiType for SameUser {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::object::<SameUser>("User")
                    .field::<u32>("id")
                    .field::<String>("name")
                    .field::<bool>("active")
            }
        }
    }

    struct Category;

    impl ApiType for Category {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<Category>("Category")
                .field::<String>("name")
                .field::<Vec<Category>>("children")
        }
    }

    struct Broken;

    impl ApiType for Broken {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::object::<Broken>("Broken")
                .field::<String>("name")
                .field::<Opaque>("payload")
        }
    }

    struct Opaque;

    impl ApiType for Opaque {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::unrepresentable("Opaque", "custom encoding")
        }
    }

    fn item(schema: &ReferenceOr<Schema>) -> &Schema {
        schema.as_item().expect("expected inline schema")
    }

    #[test]
    fn test_primitive_type_string() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&String::descriptor()).unwrap();

        assert_eq!(schema, ReferenceOr::Item(Schema::string()));
    }

    #[test]
    fn test_primitive_type_i32() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&i32::descriptor()).unwrap();

        assert_eq!(item(&schema).schema_type.as_deref(), Some("integer"));
        assert_eq!(item(&schema).format.as_deref(), Some("int32"));
        assert_eq!(item(&schema).minimum, None);
    }

    #[test]
    fn test_primitive_type_u64_has_minimum() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&u64::descriptor()).unwrap();

        assert_eq!(item(&schema).format.as_deref(), Some("int64"));
        assert_eq!(item(&schema).minimum, Some(0));
    }

    #[test]
    fn test_primitive_type_floats() {
        assert_eq!(primitive_to_schema(&PrimitiveType::F32), Schema::typed("number", Some("float")));
        assert_eq!(primitive_to_schema(&PrimitiveType::F64), Schema::typed("number", Some("double")));
    }

    #[test]
    fn test_primitive_type_formats() {
        assert_eq!(primitive_to_schema(&PrimitiveType::Bool), Schema::typed("boolean", None));
        assert_eq!(primitive_to_schema(&PrimitiveType::Uuid), Schema::typed("string", Some("uuid")));
        assert_eq!(
            primitive_to_schema(&PrimitiveType::DateTime),
            Schema::typed("string", Some("date-time"))
        );
        assert_eq!(primitive_to_schema(&PrimitiveType::Date), Schema::typed("string", Some("date")));
    }

    #[test]
    fn test_vec_type() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&Vec::<String>::descriptor()).unwrap();

        assert_eq!(schema, ReferenceOr::Item(Schema::array(ReferenceOr::Item(Schema::string()))));
        assert!(generator.components().schemas.is_empty());
    }

    #[test]
    fn test_map_type() {
        let mut generator = SchemaGenerator::new();
        let descriptor = std::collections::HashMap::<String, i64>::descriptor();
        let schema = generator.generate_schema(&descriptor).unwrap();

        let schema = item(&schema);
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(
            schema.additional_properties.as_deref(),
            Some(&ReferenceOr::Item(Schema::typed("integer", Some("int64"))))
        );
    }

    #[test]
    fn test_option_type_is_nullable() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&Option::<i32>::descriptor()).unwrap();

        assert_eq!(item(&schema).schema_type.as_deref(), Some("integer"));
        assert_eq!(item(&schema).nullable, Some(true));
    }

    #[test]
    fn test_struct_schema_generation() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&User::descriptor()).unwrap();

        assert_eq!(schema.reference(), Some("#/components/schemas/User"));

        let schemas = &generator.components().schemas;
        let user = &schemas["User"];
        assert_eq!(user.schema_type.as_deref(), Some("object"));
        assert_eq!(
            user.properties.keys().collect::<Vec<_>>(),
            vec!["id", "name", "active"]
        );
        assert_eq!(user.required, vec!["id", "name", "active"]);
    }

    #[test]
    fn test_struct_with_optional_field() {
        let mut generator = SchemaGenerator::new();
        generator.generate_schema(&Profile::descriptor()).unwrap();

        let profile = &generator.components().schemas["Profile"];
        assert_eq!(profile.required, vec!["bio"]);
        assert_eq!(item(&profile.properties["avatar"]).nullable, Some(true));
        assert_eq!(
            item(&profile.properties["bio"]).description.as_deref(),
            Some("Short biography")
        );
    }

    #[test]
    fn test_enum_schema_generation() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&Status::descriptor()).unwrap();

        assert_eq!(schema.reference(), Some("#/components/schemas/Status"));
        let status = &generator.components().schemas["Status"];
        assert_eq!(status.schema_type.as_deref(), Some("string"));
        assert_eq!(status.enum_values, vec!["active", "inactive", "pending"]);
    }

    #[test]
    fn test_nested_struct_schema() {
        let mut generator = SchemaGenerator::new();
        generator.generate_schema(&Account::descriptor()).unwrap();

        let schemas = &generator.components().schemas;
        assert_eq!(schemas.keys().collect::<Vec<_>>(), vec!["Profile", "User", "Account"]);

        let account = &schemas["Account"];
        assert_eq!(
            account.properties["profile"].reference(),
            Some("#/components/schemas/Profile")
        );
        assert_eq!(account.required, vec!["id", "profile"]);

        let friends = item(&account.properties["friends"]);
        assert_eq!(friends.nullable, Some(true));
        assert_eq!(
            friends.items.as_deref().and_then(|items| items.reference()),
            Some("#/components/schemas/User")
        );
    }

    #[test]
    fn test_schema_caching() {
        let mut generator = SchemaGenerator::new();

        let first = generator.generate_schema(&User::descriptor()).unwrap();
        let second = generator.generate_schema(&User::descriptor()).unwrap();

        assert_eq!(first, second);
        assert_eq!(generator.components().schemas.len(), 1);
        assert!(generator.components().schemas.contains_key("User"));
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let mut generator = SchemaGenerator::new();

        let first = generator.generate_schema(&User::descriptor()).unwrap();
        let second = generator.generate_schema(&other::User::descriptor()).unwrap();

        assert_eq!(first.reference(), Some("#/components/schemas/User"));
        assert_eq!(second.reference(), Some("#/components/schemas/User1"));

        let schemas = &generator.components().schemas;
        assert_eq!(schemas["User"].required, vec!["id", "name", "active"]);
        assert_eq!(schemas["User1"].required, vec!["email"]);

        // cached names keep resolving to the right component
        let again = generator.generate_schema(&other::User::descriptor()).unwrap();
        assert_eq!(again.reference(), Some("#/components/schemas/User1"));
    }

    #[test]
    fn test_structurally_equal_types_share_name() {
        let mut generator = SchemaGenerator::new();

        generator.generate_schema(&User::descriptor()).unwrap();
        let same = generator.generate_schema(&other::SameUser::descriptor()).unwrap();

        assert_eq!(same.reference(), Some("#/components/schemas/User"));
        assert_eq!(generator.components().schemas.len(), 1);
    }

    #[test]
    fn test_recursive_struct() {
        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&Category::descriptor()).unwrap();

        assert_eq!(schema.reference(), Some("#/components/schemas/Category"));
        let category = &generator.components().schemas["Category"];
        let children = item(&category.properties["children"]);
        assert_eq!(
            children.items.as_deref().and_then(|items| items.reference()),
            Some("#/components/schemas/Category")
        );
    }

    #[test]
    fn test_composite_schema() {
        struct Shape;
        let descriptor = TypeDescriptor::composite::<Shape>(
            "Shape",
            CompositeKind::OneOf,
            vec![User::descriptor(), String::descriptor()],
        )
        .discriminator("kind");

        let mut generator = SchemaGenerator::new();
        let schema = generator.generate_schema(&descriptor).unwrap();

        assert_eq!(schema.reference(), Some("#/components/schemas/Shape"));
        let shape = &generator.components().schemas["Shape"];
        assert_eq!(
            shape.one_of,
            vec![ReferenceOr::schema_ref("User"), ReferenceOr::Item(Schema::string())]
        );
        assert_eq!(
            shape.discriminator,
            Some(Discriminator {
                property_name: "kind".to_string()
            })
        );
    }

    #[test]
    fn test_unrepresentable_field_fails_whole_schema() {
        let mut generator = SchemaGenerator::new();
        let err = generator.generate_schema(&Broken::descriptor()).unwrap_err();

        assert_eq!(
            err,
            Error::InferenceError {
                type_name: "Broken".to_string(),
                message: "field `payload`: custom encoding".to_string(),
            }
        );
        assert!(generator.components().schemas.is_empty());
    }

    #[test]
    fn test_example_registered_next_to_schema() {
        let mut generator = SchemaGenerator::new();
        let value = AnyValue::object([("id", AnyValue::Int(1))]);
        let (schema, example) = generator.generate_example(&User::descriptor(), value.clone()).unwrap();

        assert_eq!(schema.reference(), Some("#/components/schemas/User"));
        assert_eq!(example.reference(), Some("#/components/examples/User"));
        assert_eq!(generator.components().examples["User"].value, value);
    }

    #[test]
    fn test_different_examples_of_one_type_are_kept() {
        let mut generator = SchemaGenerator::new();
        let posted = AnyValue::object([("id", AnyValue::Int(1))]);
        let replaced = AnyValue::object([("id", AnyValue::Int(2))]);

        let (_, first) = generator.generate_example(&User::descriptor(), posted.clone()).unwrap();
        let (_, second) = generator.generate_example(&User::descriptor(), replaced.clone()).unwrap();
        let (_, again) = generator.generate_example(&User::descriptor(), posted.clone()).unwrap();

        assert_eq!(first.reference(), Some("#/components/examples/User"));
        assert_eq!(second.reference(), Some("#/components/examples/User1"));
        assert_eq!(again.reference(), Some("#/components/examples/User"));
        let examples = &generator.components().examples;
        assert_eq!(examples.len(), 2);
        assert_eq!(examples["User"].value, posted);
        assert_eq!(examples["User1"].value, replaced);
    }

    #[test]
    fn test_example_inlined_for_unnamed_schema() {
        let mut generator = SchemaGenerator::new();
        let (_, example) = generator
            .generate_example(&String::descriptor(), AnyValue::from("hi"))
            .unwrap();

        assert_eq!(example, ReferenceOr::Item(ExampleObject::new(AnyValue::from("hi"))));
        assert!(generator.components().examples.is_empty());
    }

    #[test]
    fn test_serialized_schema_skips_empty_members() {
        let json = serde_json::to_value(Schema::typed("integer", Some("int32"))).unwrap();
        assert_eq!(json, serde_json::json!({"type": "integer", "format": "int32"}));

        let reference = serde_json::to_value(ReferenceOr::<Schema>::schema_ref("Pet")).unwrap();
        assert_eq!(reference, serde_json::json!({"$ref": "#/components/schemas/Pet"}));
    }
}
