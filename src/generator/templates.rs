//! Flavor-specific serializers turning [`GeneratedModel`]s into Rust source.
//!
//! Each template receives render-ready rows; all type and attribute decisions
//! are made here so the templates stay free of logic.

use askama::Template;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use super::model::{Flavor, GeneratedModel, ModelField, ModelShape};
use super::naming::{rust_ident, to_snake_case};
use super::types::{Primitive, RefKind, TypeExpr};
use crate::error::{GenerateError, Result};

/// Items `DeriveEntityModel` generates next to `Model`
const ENTITY_ITEMS: &[&str] = &["Model", "ActiveModel", "Entity", "Column", "PrimaryKey", "Relation"];

/// A struct field ready for printing
#[derive(Debug, Clone)]
pub struct FieldRow {
    /// Doc comment lines, each starting with `///`
    pub doc: Vec<String>,
    /// Attribute lines (`#[serde(...)]`, `#[sea_orm(...)]`, ...)
    pub attrs: Vec<String>,
    pub name: String,
    pub ty: String,
}

/// An enumeration member ready for printing
#[derive(Debug, Clone)]
pub struct MemberRow {
    pub name: String,
    /// Raw value as a Rust string literal
    pub value: String,
}

/// A lazily compiled regex backing a `#[validate(regex(...))]` rule
#[derive(Debug, Clone)]
pub struct PatternStatic {
    pub name: String,
    /// Pattern as a Rust string literal
    pub literal: String,
}

/// Template data for a validation-flavor struct
#[derive(Template)]
#[template(path = "validation_model.rs.txt", escape = "none")]
pub struct ValidationModelTemplate {
    pub header: String,
    pub imports: Vec<String>,
    pub patterns: Vec<PatternStatic>,
    pub doc: Vec<String>,
    pub name: String,
    pub fields: Vec<FieldRow>,
}

/// Template data for a validation-flavor enumeration
#[derive(Template)]
#[template(path = "validation_enum.rs.txt", escape = "none")]
pub struct ValidationEnumTemplate {
    pub header: String,
    pub doc: Vec<String>,
    pub name: String,
    pub members: Vec<MemberRow>,
}

/// Template data for a persistence-flavor entity
#[derive(Template)]
#[template(path = "persistence_model.rs.txt", escape = "none")]
pub struct PersistenceModelTemplate {
    pub header: String,
    pub imports: Vec<String>,
    pub doc: Vec<String>,
    pub name: String,
    pub table_name: String,
    pub fields: Vec<FieldRow>,
    /// Whether `pub type {name} = Model;` can be emitted without shadowing an entity item
    pub alias: bool,
}

/// Template data for a persistence-flavor enumeration
#[derive(Template)]
#[template(path = "persistence_enum.rs.txt", escape = "none")]
pub struct PersistenceEnumTemplate {
    pub header: String,
    pub doc: Vec<String>,
    pub name: String,
    pub members: Vec<MemberRow>,
}

/// Template data for the per-directory module index
#[derive(Template)]
#[template(path = "mod.rs.txt", escape = "none")]
pub struct ModRsTemplate {
    pub header: String,
    pub modules: Vec<String>,
}

/// Render one model as a complete source file
///
/// `modules` maps every model name of the run to its module (file stem), so
/// references can be imported from sibling modules.
///
/// # Errors
///
/// Returns [`GenerateError::Render`] if the template fails.
pub fn render_model(model: &GeneratedModel, modules: &HashMap<String, String>) -> Result<String> {
    let header = format!(
        "// @generated by modelgen from `{}` ({} flavor). Do not edit by hand.",
        model.raw_name.escape_debug(),
        model.flavor
    );
    let doc = doc_lines(model.description.as_deref(), "");
    let rendered = match (&model.shape, model.flavor) {
        (ModelShape::Struct { fields }, Flavor::Validation) => ValidationModelTemplate {
            header,
            imports: imports(model, modules),
            patterns: pattern_statics(model),
            doc,
            name: model.name.clone(),
            fields: fields
                .iter()
                .enumerate()
                .map(|(index, f)| validation_row(model, index, f))
                .collect(),
        }
        .render(),
        (ModelShape::Enum { .. }, Flavor::Validation) => ValidationEnumTemplate {
            header,
            doc,
            name: model.name.clone(),
            members: member_rows(model),
        }
        .render(),
        (ModelShape::Struct { fields }, Flavor::Persistence) => PersistenceModelTemplate {
            header,
            imports: imports(model, modules),
            doc: if doc.is_empty() {
                vec![format!("/// `{}` entity.", model.name)]
            } else {
                doc
            },
            name: model.name.clone(),
            table_name: to_snake_case(&model.name),
            fields: fields.iter().map(persistence_row).collect(),
            alias: !ENTITY_ITEMS.contains(&model.name.as_str()),
        }
        .render(),
        (ModelShape::Enum { .. }, Flavor::Persistence) => PersistenceEnumTemplate {
            header,
            doc,
            name: model.name.clone(),
            members: member_rows(model),
        }
        .render(),
    };
    let mut out = rendered.map_err(|source| GenerateError::Render {
        model: model.name.clone(),
        source,
    })?;
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Render the `mod.rs` index declaring `base` and every generated module
///
/// # Errors
///
/// Returns [`GenerateError::Render`] if the template fails.
pub fn render_mod_rs(modules: &[String], flavor: Flavor) -> Result<String> {
    let mut out = ModRsTemplate {
        header: format!("// @generated by modelgen ({flavor} flavor). Do not edit by hand."),
        modules: modules.iter().map(|m| rust_ident(m)).collect(),
    }
    .render()
    .map_err(|source| GenerateError::Render {
        model: "mod".to_string(),
        source,
    })?;
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Rust type of an expression in the validation flavor
pub fn validation_type(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Primitive(p) => match p {
            Primitive::Text => "String".to_string(),
            Primitive::Date => "chrono::NaiveDate".to_string(),
            Primitive::Timestamp => "chrono::DateTime<chrono::Utc>".to_string(),
            Primitive::Uuid => "uuid::Uuid".to_string(),
            Primitive::Bytes => "Vec<u8>".to_string(),
            Primitive::Integer => "i64".to_string(),
            Primitive::Float => "f64".to_string(),
            Primitive::Boolean => "bool".to_string(),
            Primitive::Map => "std::collections::HashMap<String, serde_json::Value>".to_string(),
            Primitive::Any => "serde_json::Value".to_string(),
        },
        TypeExpr::Optional(inner) => format!("Option<{}>", validation_type(inner)),
        TypeExpr::Sequence(inner) => format!("Vec<{}>", validation_type(inner)),
        TypeExpr::Named { name, .. } => name.clone(),
    }
}

/// Rust type of an expression in the persistence flavor
///
/// Sequences, maps, untyped values and nested models are stored as JSON columns.
pub fn persistence_type(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Primitive(p) => match p {
            Primitive::Text => "String".to_string(),
            Primitive::Date => "Date".to_string(),
            Primitive::Timestamp => "DateTimeUtc".to_string(),
            Primitive::Uuid => "Uuid".to_string(),
            Primitive::Bytes => "Vec<u8>".to_string(),
            Primitive::Integer => "i64".to_string(),
            Primitive::Float => "f64".to_string(),
            Primitive::Boolean => "bool".to_string(),
            Primitive::Map | Primitive::Any => "Json".to_string(),
        },
        TypeExpr::Optional(inner) => format!("Option<{}>", persistence_type(inner)),
        TypeExpr::Sequence(_) => "Json".to_string(),
        TypeExpr::Named {
            name,
            kind: RefKind::Enum,
        } => name.clone(),
        TypeExpr::Named {
            kind: RefKind::Model,
            ..
        } => "Json".to_string(),
    }
}

/// Names of other generated models that the rendered source of `model` mentions
///
/// Persistence entities store model references and sequences as JSON, so only
/// their directly typed enumerations count.
pub fn referenced_models(model: &GeneratedModel) -> BTreeSet<&str> {
    let mut names = BTreeSet::new();
    for field in model.fields() {
        match model.flavor {
            Flavor::Validation => names.extend(field.ty.expr.named_refs().into_iter().map(|(name, _)| name)),
            Flavor::Persistence => {
                if let TypeExpr::Named {
                    name,
                    kind: RefKind::Enum,
                } = field.ty.expr.without_optional()
                {
                    names.insert(name.as_str());
                }
            }
        }
    }
    names.remove(model.name.as_str());
    names
}

/// Module stem for a model: its snake-cased name, never a reserved path segment
pub fn module_stem(name: &str) -> String {
    let ident = rust_ident(&to_snake_case(name));
    match ident.strip_prefix("r#") {
        Some(plain) => plain.to_string(),
        None => ident,
    }
}

/// Whether the printed identifier differs from the name on the wire
fn renamed(raw_name: &str, ident: &str) -> bool {
    ident.strip_prefix("r#").unwrap_or(ident) != raw_name
}

/// Validator rules a field of this type can carry
#[derive(Debug, Clone, Copy, Default)]
struct RuleSupport {
    length: bool,
    range: bool,
    regex: bool,
}

impl RuleSupport {
    fn of(expr: &TypeExpr) -> Self {
        match expr.without_optional() {
            TypeExpr::Primitive(Primitive::Text) => RuleSupport {
                length: true,
                regex: true,
                ..Default::default()
            },
            TypeExpr::Primitive(Primitive::Bytes) | TypeExpr::Sequence(_) => RuleSupport {
                length: true,
                ..Default::default()
            },
            TypeExpr::Primitive(Primitive::Integer | Primitive::Float) => RuleSupport {
                range: true,
                ..Default::default()
            },
            _ => RuleSupport::default(),
        }
    }
}

fn validation_row(model: &GeneratedModel, index: usize, field: &ModelField) -> FieldRow {
    let name = rust_ident(&field.name);
    let mut attrs = Vec::new();
    if renamed(&field.raw_name, &name) {
        attrs.push(format!("#[serde(rename = {:?})]", field.raw_name));
    }

    let optional = !field.required && !field.ty.expr.is_optional();
    if !field.required {
        attrs.push("#[serde(default, skip_serializing_if = \"Option::is_none\")]".to_string());
    }

    let c = &field.ty.constraints;
    let support = RuleSupport::of(&field.ty.expr);
    let mut rules = Vec::new();
    let mut dropped = Vec::new();
    if c.min_length.is_some() || c.max_length.is_some() {
        if support.length {
            rules.push(format!("length({})", bounds(c.min_length, c.max_length)));
        } else {
            dropped.push("length");
        }
    }
    if c.minimum.is_some() || c.maximum.is_some() {
        if support.range {
            rules.push(format!("range({})", bounds(c.minimum.as_ref(), c.maximum.as_ref())));
        } else {
            dropped.push("range");
        }
    }
    if c.pattern.is_some() {
        if support.regex {
            rules.push(format!("regex(path = *{})", pattern_name(model, index, field)));
        } else {
            dropped.push("regex");
        }
    }
    for rule in dropped {
        warn!(model = %model.name, field = %field.name, rule, "dropping validation rule the field type cannot carry");
    }
    if field
        .ty
        .expr
        .named_refs()
        .iter()
        .any(|(_, kind)| *kind == RefKind::Model)
    {
        rules.push("nested".to_string());
    }
    if !rules.is_empty() {
        attrs.push(format!("#[validate({})]", rules.join(", ")));
    }

    let ty = validation_type(&field.ty.expr);
    FieldRow {
        doc: doc_lines(field.description.as_deref(), "    "),
        attrs,
        name,
        ty: if optional { format!("Option<{ty}>") } else { ty },
    }
}

fn persistence_row(field: &ModelField) -> FieldRow {
    let name = rust_ident(&field.name);
    let c = &field.ty.constraints;
    let mut parts = Vec::new();
    if c.primary {
        parts.push("primary_key".to_string());
        if field.ty.expr != TypeExpr::Primitive(Primitive::Integer) {
            parts.push("auto_increment = false".to_string());
        }
    }
    if renamed(&field.raw_name, &name) {
        parts.push(format!("column_name = {:?}", field.raw_name));
    }
    if c.unique && !c.primary {
        parts.push("unique".to_string());
    }
    if c.indexed {
        parts.push("indexed".to_string());
    }
    if let Some(default) = c.default.as_ref().and_then(scalar_literal) {
        parts.push(format!("default_value = {default}"));
    }

    let mut attrs = Vec::new();
    if !parts.is_empty() {
        attrs.push(format!("#[sea_orm({})]", parts.join(", ")));
    }
    let doc = if field.synthetic {
        vec!["    /// Auto-incrementing identity.".to_string()]
    } else {
        doc_lines(field.description.as_deref(), "    ")
    };
    FieldRow {
        doc,
        attrs,
        name,
        ty: persistence_type(&field.ty.expr),
    }
}

fn member_rows(model: &GeneratedModel) -> Vec<MemberRow> {
    model
        .members()
        .iter()
        .map(|m| MemberRow {
            name: rust_ident(&m.name),
            value: format!("{:?}", m.value),
        })
        .collect()
}

fn pattern_statics(model: &GeneratedModel) -> Vec<PatternStatic> {
    model
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| RuleSupport::of(&f.ty.expr).regex)
        .filter_map(|(index, f)| {
            f.ty.constraints.pattern.as_ref().map(|p| PatternStatic {
                name: pattern_name(model, index, f),
                literal: format!("{p:?}"),
            })
        })
        .collect()
}

/// `{MODEL}_{FIELD}_{index}_PATTERN`; the index keeps fields differing only by case apart
fn pattern_name(model: &GeneratedModel, index: usize, field: &ModelField) -> String {
    format!(
        "{}_{}_{index}_PATTERN",
        to_snake_case(&model.name).to_uppercase(),
        to_snake_case(&field.name).to_uppercase()
    )
}

fn imports(model: &GeneratedModel, modules: &HashMap<String, String>) -> Vec<String> {
    let lines: BTreeSet<String> = referenced_models(model)
        .into_iter()
        .map(|name| import_line(name, modules))
        .collect();
    lines.into_iter().collect()
}

fn import_line(name: &str, modules: &HashMap<String, String>) -> String {
    let module = modules
        .get(name)
        .cloned()
        .unwrap_or_else(|| module_stem(name));
    format!("use super::{}::{};", rust_ident(&module), name)
}

fn doc_lines(description: Option<&str>, indent: &str) -> Vec<String> {
    description
        .map(|d| {
            d.trim()
                .lines()
                .map(|l| {
                    let l = l.trim_end();
                    if l.is_empty() {
                        format!("{indent}///")
                    } else {
                        format!("{indent}/// {l}")
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn bounds<T: std::fmt::Display>(min: Option<T>, max: Option<T>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("min = {min}, max = {max}"),
        (Some(min), None) => format!("min = {min}"),
        (None, Some(max)) => format!("max = {max}"),
        (None, None) => String::new(),
    }
}

fn scalar_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(format!("{s:?}")),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
