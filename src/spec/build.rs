use super::types::{
    Constraints, FormatHint, PropertyDef, PropertyKind, SchemaDef, SchemaTable,
    COMPONENT_REF_PREFIX,
};
use crate::error::{GenerateError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Build the schema table from an already parsed description
///
/// The root must be a mapping with a `components.schemas` mapping, and every
/// schema entry must carry a `properties` mapping. `$ref` targets are checked
/// once every component name is known.
///
/// # Errors
///
/// Returns [`GenerateError::MalformedDescription`] for any structural problem.
pub fn build_schema_table(root: &Value) -> Result<SchemaTable> {
    let root = root
        .as_object()
        .ok_or_else(|| GenerateError::malformed("<root>", "description root must be a mapping"))?;
    let components = root
        .get("components")
        .ok_or_else(|| GenerateError::malformed("<root>", "missing `components` section"))?
        .as_object()
        .ok_or_else(|| GenerateError::malformed("components", "`components` must be a mapping"))?;
    let schemas = components
        .get("schemas")
        .ok_or_else(|| GenerateError::malformed("components", "missing `schemas` mapping"))?
        .as_object()
        .ok_or_else(|| {
            GenerateError::malformed("components.schemas", "`schemas` must be a mapping")
        })?;

    let mut defs = Vec::with_capacity(schemas.len());
    for (name, schema) in schemas {
        let location = format!("components.schemas.{name}");
        let obj = schema
            .as_object()
            .ok_or_else(|| GenerateError::malformed(&location, "schema entry must be a mapping"))?;
        if !obj.contains_key("properties") {
            return Err(GenerateError::malformed(
                &location,
                "schema entry has no `properties` collection",
            ));
        }
        defs.push(parse_object(name, obj, &location)?);
    }

    let known: BTreeSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    for def in &defs {
        check_refs(&def.properties, &known, &format!("components.schemas.{}", def.name))?;
    }

    debug!(schemas = defs.len(), "built schema table");
    Ok(SchemaTable::new(defs))
}

fn parse_object(name: &str, obj: &Map<String, Value>, location: &str) -> Result<SchemaDef> {
    let mut properties = Vec::new();
    if let Some(props) = obj.get("properties") {
        let props = props.as_object().ok_or_else(|| {
            GenerateError::malformed(format!("{location}.properties"), "`properties` must be a mapping")
        })?;
        for (prop_name, prop) in props {
            let prop_location = format!("{location}.properties.{prop_name}");
            properties.push(parse_property(prop_name, prop, &prop_location)?);
        }
    }

    let required = match obj.get("required") {
        None | Some(Value::Null) => BTreeSet::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| {
                    GenerateError::malformed(
                        format!("{location}.required"),
                        "`required` entries must be strings",
                    )
                })
            })
            .collect::<Result<BTreeSet<_>>>()?,
        Some(_) => {
            return Err(GenerateError::malformed(
                format!("{location}.required"),
                "`required` must be a list of property names",
            ))
        }
    };
    for name in &required {
        if !properties.iter().any(|p| &p.name == name) {
            warn!(location, property = %name, "required property is not declared");
        }
    }

    Ok(SchemaDef {
        name: name.to_string(),
        description: opt_str(obj, "description", location)?,
        properties,
        required,
    })
}

fn parse_property(name: &str, prop: &Value, location: &str) -> Result<PropertyDef> {
    let obj = prop
        .as_object()
        .ok_or_else(|| GenerateError::malformed(location, "property must be a mapping"))?;

    let kind = if let Some(r) = obj.get("$ref") {
        let r = r
            .as_str()
            .ok_or_else(|| GenerateError::malformed(location, "`$ref` must be a string"))?;
        let target = r.strip_prefix(COMPONENT_REF_PREFIX).ok_or_else(|| {
            GenerateError::malformed(location, format!("unsupported reference {r:?}"))
        })?;
        PropertyKind::Ref(target.to_string())
    } else {
        match obj.get("type") {
            None | Some(Value::Null) => PropertyKind::Untyped,
            Some(Value::String(t)) => match t.as_str() {
                "string" => PropertyKind::String,
                "integer" => PropertyKind::Integer,
                "number" => PropertyKind::Number,
                "boolean" => PropertyKind::Boolean,
                "array" => match obj.get("items") {
                    Some(items) => {
                        let item_name = format!("{name}_item");
                        let item = parse_property(&item_name, items, &format!("{location}.items"))?;
                        PropertyKind::Array(Some(Box::new(item)))
                    }
                    None => PropertyKind::Array(None),
                },
                "object" => match obj.get("properties") {
                    Some(_) => PropertyKind::Object(Some(Box::new(parse_object(name, obj, location)?))),
                    None => PropertyKind::Object(None),
                },
                other => PropertyKind::Unknown(other.to_string()),
            },
            // OpenAPI 3.1 type lists (`[string, "null"]`) keep the first non-null entry
            Some(Value::Array(types)) => {
                let first = types.iter().filter_map(Value::as_str).find(|t| *t != "null");
                let mut single = obj.clone();
                match first {
                    Some(t) => single.insert("type".to_string(), Value::String(t.to_string())),
                    None => single.remove("type"),
                };
                if types.iter().any(|t| t.as_str() == Some("null")) {
                    single.insert("nullable".to_string(), Value::Bool(true));
                }
                return parse_property(name, &Value::Object(single), location);
            }
            Some(_) => {
                return Err(GenerateError::malformed(location, "`type` must be a string"));
            }
        }
    };

    let format = opt_str(obj, "format", location)?
        .as_deref()
        .and_then(FormatHint::parse);

    let enum_values = match obj.get("enum") {
        None | Some(Value::Null) => None,
        Some(Value::Array(values)) => Some(
            values
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>(),
        ),
        Some(_) => return Err(GenerateError::malformed(location, "`enum` must be a list")),
    };

    Ok(PropertyDef {
        name: name.to_string(),
        kind,
        format,
        enum_values,
        title: opt_str(obj, "title", location)?,
        description: opt_str(obj, "description", location)?,
        constraints: parse_constraints(obj, location)?,
    })
}

fn parse_constraints(obj: &Map<String, Value>, location: &str) -> Result<Constraints> {
    let pattern = opt_str(obj, "pattern", location)?;
    if let Some(p) = &pattern {
        regex::Regex::new(p).map_err(|e| {
            GenerateError::malformed(location, format!("`pattern` is not a valid regex: {e}"))
        })?;
    }
    Ok(Constraints {
        min_length: opt_u64(obj, "minLength", location)?,
        max_length: opt_u64(obj, "maxLength", location)?,
        minimum: opt_number(obj, "minimum", location)?,
        maximum: opt_number(obj, "maximum", location)?,
        pattern,
        nullable: opt_bool(obj, "nullable", location)?,
        unique: opt_bool(obj, "unique", location)?.unwrap_or(false),
        primary: opt_bool(obj, "primary_key", location)?.unwrap_or(false),
        indexed: opt_bool(obj, "index", location)?.unwrap_or(false),
        default: obj.get("default").filter(|v| !v.is_null()).cloned(),
    })
}

fn check_refs(props: &[PropertyDef], known: &BTreeSet<&str>, location: &str) -> Result<()> {
    for prop in props {
        check_property(prop, known, &format!("{location}.properties.{}", prop.name))?;
    }
    Ok(())
}

fn check_property(prop: &PropertyDef, known: &BTreeSet<&str>, location: &str) -> Result<()> {
    match &prop.kind {
        PropertyKind::Ref(target) if !known.contains(target.as_str()) => Err(GenerateError::malformed(
            location,
            format!("reference to unknown schema {target:?}"),
        )),
        PropertyKind::Array(Some(item)) => check_property(item, known, &format!("{location}.items")),
        PropertyKind::Object(Some(nested)) => check_refs(&nested.properties, known, location),
        _ => Ok(()),
    }
}

fn opt_str(obj: &Map<String, Value>, key: &str, location: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GenerateError::malformed(location, format!("`{key}` must be a string"))),
    }
}

fn opt_bool(obj: &Map<String, Value>, key: &str, location: &str) -> Result<Option<bool>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(GenerateError::malformed(location, format!("`{key}` must be a boolean"))),
    }
}

fn opt_u64(obj: &Map<String, Value>, key: &str, location: &str) -> Result<Option<u64>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_u64().map(Some).ok_or_else(|| {
            GenerateError::malformed(location, format!("`{key}` must be a non-negative integer"))
        }),
    }
}

fn opt_number(
    obj: &Map<String, Value>,
    key: &str,
    location: &str,
) -> Result<Option<serde_json::Number>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n.clone())),
        Some(_) => Err(GenerateError::malformed(location, format!("`{key}` must be a number"))),
    }
}
