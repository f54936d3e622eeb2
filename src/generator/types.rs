use crate::spec::{Constraints, FormatHint, PropertyDef, PropertyKind};

/// Leaf types a property can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Text,
    Date,
    Timestamp,
    Uuid,
    Bytes,
    Integer,
    Float,
    Boolean,
    /// Generic string-keyed map for objects without declared properties
    Map,
    /// Universal fallback for untyped or unrecognized properties
    Any,
}

/// What a named reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Model,
    Enum,
}

/// Resolved type expression, independent of any output flavor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(Primitive),
    Optional(Box<TypeExpr>),
    Sequence(Box<TypeExpr>),
    Named { name: String, kind: RefKind },
}

impl TypeExpr {
    /// Strip one optional wrapper, if any
    pub fn without_optional(&self) -> &TypeExpr {
        match self {
            TypeExpr::Optional(inner) => inner.as_ref(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeExpr::Optional(_))
    }

    /// Every named reference inside this expression, outermost first
    pub fn named_refs(&self) -> Vec<(&str, RefKind)> {
        match self {
            TypeExpr::Primitive(_) => Vec::new(),
            TypeExpr::Optional(inner) | TypeExpr::Sequence(inner) => inner.named_refs(),
            TypeExpr::Named { name, kind } => vec![(name.as_str(), *kind)],
        }
    }
}

/// A type expression together with the normalized constraint bag of its property
#[derive(Debug, Clone, PartialEq)]
pub struct TargetType {
    pub expr: TypeExpr,
    pub constraints: Constraints,
}

/// Names already assigned to the satellites of one property
///
/// Filled by the expander before [`map_type`] runs, so the mapper stays pure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SatelliteNames {
    /// Enumeration synthesized for this property (or its array items)
    pub enumeration: Option<String>,
    /// Model synthesized for an inline object (or array-of-object items)
    pub model: Option<String>,
    /// Type identifier of a `$ref` target
    pub reference: Option<String>,
    /// Names for the array item, when the property is an array
    pub item: Option<Box<SatelliteNames>>,
}

/// Map a property to its target type
///
/// Total: every property yields exactly one [`TargetType`]. Kinds that need a
/// synthesized name fall back to a structural type when `names` has none
/// (enum → text, object → map, unresolved ref → any).
pub fn map_type(prop: &PropertyDef, names: &SatelliteNames) -> TargetType {
    let expr = base_expr(prop, names);
    let expr = if prop.constraints.nullable == Some(true) {
        TypeExpr::Optional(Box::new(expr))
    } else {
        expr
    };
    TargetType {
        expr,
        constraints: prop.constraints.clone(),
    }
}

fn base_expr(prop: &PropertyDef, names: &SatelliteNames) -> TypeExpr {
    if prop.is_enum() {
        if let Some(name) = &names.enumeration {
            return TypeExpr::Named {
                name: name.clone(),
                kind: RefKind::Enum,
            };
        }
    }
    match &prop.kind {
        PropertyKind::String => TypeExpr::Primitive(match prop.format {
            None => Primitive::Text,
            Some(FormatHint::Date) => Primitive::Date,
            Some(FormatHint::DateTime) => Primitive::Timestamp,
            Some(FormatHint::Uuid) => Primitive::Uuid,
            Some(FormatHint::Binary) => Primitive::Bytes,
        }),
        PropertyKind::Integer => TypeExpr::Primitive(Primitive::Integer),
        PropertyKind::Number => TypeExpr::Primitive(Primitive::Float),
        PropertyKind::Boolean => TypeExpr::Primitive(Primitive::Boolean),
        PropertyKind::Array(Some(item)) => {
            let empty = SatelliteNames::default();
            let item_names = names.item.as_deref().unwrap_or(&empty);
            TypeExpr::Sequence(Box::new(map_type(item, item_names).expr))
        }
        PropertyKind::Array(None) => {
            TypeExpr::Sequence(Box::new(TypeExpr::Primitive(Primitive::Any)))
        }
        PropertyKind::Object(_) => match &names.model {
            Some(name) => TypeExpr::Named {
                name: name.clone(),
                kind: RefKind::Model,
            },
            None => TypeExpr::Primitive(Primitive::Map),
        },
        PropertyKind::Ref(_) => match &names.reference {
            Some(name) => TypeExpr::Named {
                name: name.clone(),
                kind: RefKind::Model,
            },
            None => TypeExpr::Primitive(Primitive::Any),
        },
        PropertyKind::Untyped | PropertyKind::Unknown(_) => TypeExpr::Primitive(Primitive::Any),
    }
}
