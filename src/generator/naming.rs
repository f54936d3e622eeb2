//! Identifier sanitization and collision handling.
//!
//! Collision policy: within one scope, the first raw name to produce an
//! identifier keeps it. A later, different raw name that sanitizes to the same
//! identifier gets `_{pos}` appended, where `pos` is the character index at
//! which it first diverges from the raw name that already owns the identifier
//! (the shorter length when one is a prefix of the other). If that is taken as
//! well, `_2`, `_3`, ... are appended after it. Claims are processed in
//! declaration order, so the outcome is deterministic.

use crate::error::{GenerateError, Result};
use std::collections::HashMap;

/// What kind of identifier is being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Schema,
    Property,
    Enum,
    EnumValue,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Schema => "schema",
            Role::Property => "property",
            Role::Enum => "enum",
            Role::EnumValue => "enum value",
        }
    }
}

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Map a raw name to a valid identifier for `role`
///
/// Schema, property and enum names drop every character outside
/// `[A-Za-z0-9_]`. Enum values replace those characters with `_` and are
/// upper-cased. A result starting with a digit is prefixed with `_`, and a
/// lone `_` becomes `__`.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidIdentifier`] when nothing usable remains.
pub fn sanitize(raw: &str, role: Role) -> Result<String> {
    let mut s: String = match role {
        Role::EnumValue => raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect(),
        _ => raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect(),
    };
    if s.is_empty() {
        return Err(GenerateError::InvalidIdentifier {
            raw: raw.to_string(),
            role: role.as_str(),
        });
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if s == "_" {
        // a lone underscore is not an identifier
        s.push('_');
    }
    Ok(s)
}

/// Sanitize a schema or synthesized name into a CamelCase type identifier
///
/// # Errors
///
/// Returns [`GenerateError::InvalidIdentifier`] when nothing usable remains.
pub fn type_identifier(raw: &str, role: Role) -> Result<String> {
    let sanitized = sanitize(raw, role)?;
    let mut camel = to_camel_case(&sanitized);
    if camel.is_empty() {
        // only underscores survived
        camel = sanitized;
    }
    if camel.starts_with(|c: char| c.is_ascii_digit()) {
        camel.insert(0, '_');
    }
    if KEYWORDS.contains(&camel.as_str()) {
        // `Self`
        camel.push('_');
    }
    Ok(camel)
}

/// Convert a snake_case string to CamelCase
///
/// ```rust
/// use oas_modelgen::generator::to_camel_case;
/// assert_eq!(to_camel_case("cart_items_item"), "CartItemsItem");
/// ```
pub fn to_camel_case(s: &str) -> String {
    s.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert a CamelCase identifier into the lower-case file stem used for its artifact
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Render an identifier, escaping Rust keywords as raw identifiers
pub fn rust_ident(name: &str) -> String {
    match name {
        // cannot be raw identifiers
        "self" | "Self" | "super" | "crate" => format!("{name}_"),
        _ if KEYWORDS.contains(&name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

/// Identifiers claimed within one scope, remembering which raw name owns each
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    owners: HashMap<String, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `ident` for `raw`, disambiguating if another raw name owns it
    ///
    /// Claiming the same `(raw, ident)` pair twice returns the same identifier.
    pub fn claim(&mut self, raw: &str, ident: &str) -> String {
        match self.owners.get(ident) {
            None => {
                self.owners.insert(ident.to_string(), raw.to_string());
                ident.to_string()
            }
            Some(owner) if owner == raw => ident.to_string(),
            Some(owner) => {
                let candidate = format!("{ident}_{}", divergence(owner, raw));
                self.claim_fresh(raw, &candidate)
            }
        }
    }

    /// Claim an identifier that no raw name owns yet, starting from `ident`
    pub fn claim_fresh(&mut self, raw: &str, ident: &str) -> String {
        let mut candidate = ident.to_string();
        let mut counter = 2;
        while self.owners.contains_key(&candidate) {
            candidate = format!("{ident}_{counter}");
            counter += 1;
        }
        if candidate != ident {
            tracing::warn!(raw, requested = ident, assigned = %candidate, "identifier collision");
        }
        self.owners.insert(candidate.clone(), raw.to_string());
        candidate
    }

    /// Raw name owning `ident`, if claimed
    pub fn owner(&self, ident: &str) -> Option<&str> {
        self.owners.get(ident).map(String::as_str)
    }
}

/// Index of the first character at which `a` and `b` differ
fn divergence(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| a.chars().count().min(b.chars().count()))
}
