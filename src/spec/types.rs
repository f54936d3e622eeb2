use serde_json::{Number, Value};
use std::collections::BTreeSet;

/// Prefix of a local component reference (`$ref: '#/components/schemas/Pet'`)
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// Format hints the type mapper understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Date,
    DateTime,
    Uuid,
    Binary,
}

impl FormatHint {
    /// Parse an OpenAPI `format` value; unknown formats carry no hint
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "date" => Some(FormatHint::Date),
            "date-time" => Some(FormatHint::DateTime),
            "uuid" => Some(FormatHint::Uuid),
            "binary" | "byte" => Some(FormatHint::Binary),
            _ => None,
        }
    }
}

/// Declared kind of a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    String,
    Integer,
    Number,
    Boolean,
    /// Array with its item definition; `None` when `items` is absent
    Array(Option<Box<PropertyDef>>),
    /// Inline object; `None` when no nested `properties` were given
    Object(Option<Box<SchemaDef>>),
    /// `$ref` to another component schema, by raw component name
    Ref(String),
    /// No `type` key at all
    Untyped,
    /// A `type` the mapper does not recognize, kept verbatim
    Unknown(String),
}

/// Optional validation and storage constraints of a property
///
/// Every member is independently present or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub pattern: Option<String>,
    /// `Some(false)` only when the source explicitly says `nullable: false`
    pub nullable: Option<bool>,
    pub unique: bool,
    pub primary: bool,
    pub indexed: bool,
    pub default: Option<Value>,
}

impl Constraints {
    /// True when any validation-side bound is present
    pub fn has_bounds(&self) -> bool {
        self.min_length.is_some()
            || self.max_length.is_some()
            || self.minimum.is_some()
            || self.maximum.is_some()
            || self.pattern.is_some()
    }
}

/// One named, typed field within a schema
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
    pub format: Option<FormatHint>,
    /// Inline enumeration, already stringified, in declaration order
    pub enum_values: Option<Vec<String>>,
    /// `title` of the property, used as the enumeration name hint
    pub title: Option<String>,
    pub description: Option<String>,
    pub constraints: Constraints,
}

impl PropertyDef {
    /// Property of the given kind with no format, enum or constraints
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        PropertyDef {
            name: name.into(),
            kind,
            format: None,
            enum_values: None,
            title: None,
            description: None,
            constraints: Constraints::default(),
        }
    }

    /// True when this property should become a synthesized enumeration
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, PropertyKind::String | PropertyKind::Untyped)
            && self.enum_values.as_ref().is_some_and(|v| !v.is_empty())
    }
}

/// One named entity of the description: ordered properties plus the required set
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDef {
    pub name: String,
    pub description: Option<String>,
    pub properties: Vec<PropertyDef>,
    pub required: BTreeSet<String>,
}

impl SchemaDef {
    /// Whether `property` is listed in this schema's `required` array
    pub fn is_required(&self, property: &str) -> bool {
        self.required.contains(property)
    }
}

/// All component schemas of one description, in declaration order
///
/// Built once by the loader and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaTable {
    schemas: Vec<SchemaDef>,
}

impl SchemaTable {
    pub(crate) fn new(schemas: Vec<SchemaDef>) -> Self {
        SchemaTable { schemas }
    }

    /// Look up a schema by its raw component name
    pub fn get(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// Iterate schemas in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaDef> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
