use super::types::{Primitive, TargetType, TypeExpr};
use crate::spec::Constraints;
use tracing::warn;

/// Field name of the synthetic persistence identity
pub const IDENTITY_FIELD: &str = "id";

/// Output flavor of a generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// In-memory request/response models carrying validation rules
    Validation,
    /// Storage entities with keys, uniqueness and indexes
    Persistence,
}

impl Flavor {
    pub fn as_str(self) -> &'static str {
        match self {
            Flavor::Validation => "validation",
            Flavor::Persistence => "persistence",
        }
    }
}

impl std::fmt::Display for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a generated model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    /// A component schema named in the description
    Schema,
    /// Synthesized from an inline object or array-of-object property
    Nested,
    /// Synthesized from an inline enumeration
    Enum,
}

/// One field of a generated struct model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelField {
    /// Sanitized, collision-free identifier
    pub name: String,
    /// Name as written in the description
    pub raw_name: String,
    pub ty: TargetType,
    /// Required fields carry no default
    pub required: bool,
    pub description: Option<String>,
    /// True only for the appended persistence identity
    pub synthetic: bool,
}

impl ModelField {
    pub fn is_primary(&self) -> bool {
        self.ty.constraints.primary
    }
}

/// One member of a generated enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub name: String,
    /// Literal value as written in the description
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelShape {
    Struct { fields: Vec<ModelField> },
    Enum { members: Vec<EnumMember> },
}

/// A fully assembled model; write-once, only ever serialized after assembly
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedModel {
    /// Type identifier, unique within a run
    pub name: String,
    /// Name the model was derived from (component name or `{owner}_{property}`)
    pub raw_name: String,
    pub flavor: Flavor,
    pub origin: ModelOrigin,
    pub description: Option<String>,
    pub shape: ModelShape,
}

impl GeneratedModel {
    /// Struct fields in declaration order; empty for enumerations
    pub fn fields(&self) -> &[ModelField] {
        match &self.shape {
            ModelShape::Struct { fields } => fields,
            ModelShape::Enum { .. } => &[],
        }
    }

    /// Enumeration members; empty for structs
    pub fn members(&self) -> &[EnumMember] {
        match &self.shape {
            ModelShape::Enum { members } => members,
            ModelShape::Struct { .. } => &[],
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.shape, ModelShape::Enum { .. })
    }
}

/// A model whose fields are resolved but not yet shaped for a flavor
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDraft {
    pub name: String,
    pub raw_name: String,
    pub origin: ModelOrigin,
    pub description: Option<String>,
    pub fields: Vec<ModelField>,
}

/// Assemble a struct model for `flavor`
///
/// Validation keeps the fields exactly as resolved. Persistence makes every
/// field nullable unless the source said `nullable: false` or the field is a
/// primary key, and appends an auto-incrementing identity as the last field
/// when no declared field is primary. Only the first declared primary key
/// stays primary; any later one is demoted to a unique column.
pub fn emit(draft: ModelDraft, flavor: Flavor) -> GeneratedModel {
    let ModelDraft {
        name,
        raw_name,
        origin,
        description,
        mut fields,
    } = draft;

    if flavor == Flavor::Persistence {
        let mut primary: Option<String> = None;
        for field in fields.iter_mut().filter(|f| f.is_primary()) {
            match &primary {
                None => primary = Some(field.name.clone()),
                Some(kept) => {
                    warn!(model = %name, field = %field.name, primary = %kept, "demoting extra primary key to unique");
                    field.ty.constraints.primary = false;
                    field.ty.constraints.unique = true;
                }
            }
        }
        for field in &mut fields {
            let nullable = !field.is_primary() && field.ty.constraints.nullable != Some(false);
            if nullable && !field.ty.expr.is_optional() {
                let inner = std::mem::replace(
                    &mut field.ty.expr,
                    TypeExpr::Primitive(Primitive::Any),
                );
                field.ty.expr = TypeExpr::Optional(Box::new(inner));
            } else if !nullable && field.ty.expr.is_optional() {
                field.ty.expr = field.ty.expr.without_optional().clone();
            }
            field.required = !nullable;
        }
        if !fields.iter().any(ModelField::is_primary) {
            fields.push(identity_field(&fields));
        }
    }

    GeneratedModel {
        name,
        raw_name,
        flavor,
        origin,
        description,
        shape: ModelShape::Struct { fields },
    }
}

fn identity_field(existing: &[ModelField]) -> ModelField {
    let mut name = IDENTITY_FIELD.to_string();
    let mut counter = 2;
    while existing.iter().any(|f| f.name == name) {
        name = format!("{IDENTITY_FIELD}_{counter}");
        counter += 1;
    }
    ModelField {
        raw_name: name.clone(),
        name,
        ty: TargetType {
            expr: TypeExpr::Primitive(Primitive::Integer),
            constraints: Constraints {
                primary: true,
                nullable: Some(false),
                ..Constraints::default()
            },
        },
        required: true,
        description: None,
        synthetic: true,
    }
}
