//! Co-recursive model construction: enum synthesis, nested-object expansion
//! and on-demand building of referenced component schemas.

use super::model::{
    emit, EnumMember, Flavor, GeneratedModel, ModelDraft, ModelField, ModelOrigin, ModelShape,
};
use super::naming::{sanitize, type_identifier, NameRegistry, Role};
use super::types::{map_type, SatelliteNames};
use crate::error::{GenerateError, Result};
use crate::spec::{PropertyDef, PropertyKind, SchemaDef, SchemaTable};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Per-run state threaded through model construction
///
/// Holds the type-name registry shared by schemas and satellites, the stack of
/// names currently being expanded, and the models assembled so far in
/// creation order (satellites always precede the models referencing them).
pub struct ModelBuilder<'a> {
    table: &'a SchemaTable,
    flavor: Flavor,
    names: NameRegistry,
    schema_idents: HashMap<String, String>,
    built: HashSet<String>,
    in_progress: Vec<Frame>,
    /// Enumerations emitted so far, by raw name, with their resolved identifiers
    enums: HashMap<String, Vec<(Vec<EnumMember>, String)>>,
    models: Vec<GeneratedModel>,
}

/// One entry of the in-progress stack
///
/// Only component schemas can be re-entered through `$ref`; nested objects are
/// tracked so a cycle report shows the full path.
#[derive(Debug, Clone)]
enum Frame {
    Schema(String),
    Nested(String),
}

impl Frame {
    fn raw(&self) -> &str {
        match self {
            Frame::Schema(raw) | Frame::Nested(raw) => raw,
        }
    }
}

impl<'a> ModelBuilder<'a> {
    /// Create a builder, assigning identifiers to every component schema up front
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidIdentifier`] if a schema name sanitizes to nothing.
    pub fn new(table: &'a SchemaTable, flavor: Flavor) -> Result<Self> {
        let mut names = NameRegistry::new();
        let mut schema_idents = HashMap::with_capacity(table.len());
        for schema in table.iter() {
            let ident = type_identifier(&schema.name, Role::Schema)?;
            let ident = names.claim(&schema.name, &ident);
            schema_idents.insert(schema.name.clone(), ident);
        }
        Ok(ModelBuilder {
            table,
            flavor,
            names,
            schema_idents,
            built: HashSet::new(),
            in_progress: Vec::new(),
            enums: HashMap::new(),
            models: Vec::new(),
        })
    }

    /// Build every component schema in declaration order
    ///
    /// # Errors
    ///
    /// Propagates the first naming or cycle failure; no models are returned then.
    pub fn build_all(mut self) -> Result<Vec<GeneratedModel>> {
        let table = self.table;
        for schema in table.iter() {
            self.build_schema(&schema.name)?;
        }
        Ok(self.models)
    }

    fn build_schema(&mut self, raw: &str) -> Result<()> {
        if self.built.contains(raw) {
            return Ok(());
        }
        self.enter(Frame::Schema(raw.to_string()))?;
        let table = self.table;
        let schema = table.get(raw).ok_or_else(|| {
            GenerateError::malformed("components.schemas", format!("unknown schema {raw:?}"))
        })?;
        let ident = self.ident_of(raw)?;
        let draft = self.draft(&ident, raw, schema, ModelOrigin::Schema)?;
        self.leave();
        self.built.insert(raw.to_string());
        debug!(schema = raw, model = %ident, fields = draft.fields.len(), "assembled model");
        self.models.push(emit(draft, self.flavor));
        Ok(())
    }

    fn draft(
        &mut self,
        ident: &str,
        raw: &str,
        schema: &SchemaDef,
        origin: ModelOrigin,
    ) -> Result<ModelDraft> {
        let mut field_names = NameRegistry::new();
        let mut fields = Vec::with_capacity(schema.properties.len());
        for prop in &schema.properties {
            let field_ident = sanitize(&prop.name, Role::Property)?;
            let name = field_names.claim(&prop.name, &field_ident);
            let satellites = self.synthesize(ident, prop)?;
            fields.push(ModelField {
                name,
                raw_name: prop.name.clone(),
                ty: map_type(prop, &satellites),
                required: schema.is_required(&prop.name),
                description: prop.description.clone(),
                synthetic: false,
            });
        }
        Ok(ModelDraft {
            name: ident.to_string(),
            raw_name: raw.to_string(),
            origin,
            description: schema.description.clone(),
            fields,
        })
    }

    /// Create (or look up) every satellite `prop` needs, before its owner references them
    fn synthesize(&mut self, owner: &str, prop: &PropertyDef) -> Result<SatelliteNames> {
        let mut names = SatelliteNames::default();
        if prop.is_enum() {
            names.enumeration = Some(self.synthesize_enum(owner, prop)?);
            return Ok(names);
        }
        match &prop.kind {
            PropertyKind::Array(Some(item)) => {
                names.item = Some(Box::new(self.synthesize(owner, item)?));
            }
            PropertyKind::Object(Some(nested)) if self.flavor == Flavor::Validation => {
                names.model = Some(self.expand_nested(owner, prop, nested)?);
            }
            PropertyKind::Ref(target) => {
                self.build_schema(target)?;
                names.reference = Some(self.ident_of(target)?);
            }
            _ => {}
        }
        Ok(names)
    }

    fn synthesize_enum(&mut self, owner: &str, prop: &PropertyDef) -> Result<String> {
        let raw = match &prop.title {
            Some(title) => title.clone(),
            None => format!("{owner}_{}", prop.name),
        };
        let requested = type_identifier(&raw, Role::Enum)?;
        let members = enum_members(prop.enum_values.as_deref().unwrap_or_default())?;

        if let Some((_, ident)) = self
            .enums
            .get(&raw)
            .and_then(|seen| seen.iter().find(|(m, _)| *m == members))
        {
            debug!(enumeration = %ident, "enumeration already emitted");
            return Ok(ident.clone());
        }
        // same raw name already taken by a schema or a differently shaped enum
        let ident = if self.names.owner(&requested) == Some(raw.as_str()) {
            self.names.claim_fresh(&raw, &requested)
        } else {
            self.names.claim(&raw, &requested)
        };
        self.enums
            .entry(raw.clone())
            .or_default()
            .push((members.clone(), ident.clone()));

        debug!(enumeration = %ident, owner, property = %prop.name, members = members.len(), "synthesized enumeration");
        self.models.push(GeneratedModel {
            name: ident.clone(),
            raw_name: raw,
            flavor: self.flavor,
            origin: ModelOrigin::Enum,
            description: prop.description.clone(),
            shape: ModelShape::Enum { members },
        });
        Ok(ident)
    }

    fn expand_nested(&mut self, owner: &str, prop: &PropertyDef, nested: &SchemaDef) -> Result<String> {
        let raw = format!("{owner}_{}", prop.name);
        let requested = type_identifier(&raw, Role::Schema)?;
        // a component schema may carry the same raw name
        let ident = if self.schema_idents.contains_key(&raw) {
            self.names.claim_fresh(&raw, &requested)
        } else {
            self.names.claim(&raw, &requested)
        };

        self.enter(Frame::Nested(raw.clone()))?;
        let draft = self.draft(&ident, &raw, nested, ModelOrigin::Nested)?;
        self.leave();

        debug!(model = %ident, owner, property = %prop.name, "expanded nested object");
        self.models.push(emit(draft, self.flavor));
        Ok(ident)
    }

    fn enter(&mut self, frame: Frame) -> Result<()> {
        if let Frame::Schema(raw) = &frame {
            let revisited = self
                .in_progress
                .iter()
                .any(|f| matches!(f, Frame::Schema(n) if n == raw));
            if revisited {
                let mut chain: Vec<String> =
                    self.in_progress.iter().map(|f| f.raw().to_string()).collect();
                chain.push(raw.clone());
                return Err(GenerateError::CyclicSchema { chain });
            }
        }
        self.in_progress.push(frame);
        Ok(())
    }

    fn leave(&mut self) {
        self.in_progress.pop();
    }

    fn ident_of(&self, raw: &str) -> Result<String> {
        self.schema_idents.get(raw).cloned().ok_or_else(|| {
            GenerateError::malformed("components.schemas", format!("unknown schema {raw:?}"))
        })
    }
}

/// Sanitize enumeration values into members, dropping repeated values
fn enum_members(values: &[String]) -> Result<Vec<EnumMember>> {
    let mut seen = HashSet::new();
    let mut names = NameRegistry::new();
    let mut members = Vec::with_capacity(values.len());
    for value in values {
        if !seen.insert(value.as_str()) {
            continue;
        }
        let ident = sanitize(value, Role::EnumValue)?;
        members.push(EnumMember {
            name: names.claim(value, &ident),
            value: value.clone(),
        });
    }
    Ok(members)
}

/// Build every model of `table` for `flavor`
///
/// # Errors
///
/// Returns the first [`GenerateError::InvalidIdentifier`] or
/// [`GenerateError::CyclicSchema`] encountered; the run produces nothing then.
pub fn build_models(table: &SchemaTable, flavor: Flavor) -> Result<Vec<GeneratedModel>> {
    ModelBuilder::new(table, flavor)?.build_all()
}
