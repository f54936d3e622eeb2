//! # Generator Module
//!
//! Turns the component schemas of an API description into Rust model sources,
//! in one of two flavors sharing a single type-mapping core.
//!
//! ## Overview
//!
//! - **Validation flavor** - `serde` + `validator` structs for request/response
//!   payloads, implementing `super::base::ValidationModel`
//! - **Persistence flavor** - `sea_orm` entities with keys, uniqueness and
//!   indexes, implementing `super::base::PersistenceModel`
//!
//! The `base` module with both traits is supplied by the consuming project;
//! generated files only reference it.
//!
//! ## Architecture
//!
//! ```text
//! SchemaTable → ModelBuilder (naming, enum synthesis, nested expansion, $ref)
//!             → emit (flavor shaping) → templates (askama) → writer (policy)
//! ```
//!
//! 1. **Naming** - sanitizes raw names and resolves collisions deterministically
//! 2. **Type mapping** - a total map from property to [`TypeExpr`]
//! 3. **Model building** - creates satellites (enums, nested objects, referenced
//!    schemas) before the models that use them, rejecting cycles
//! 4. **Rendering** - one file per model plus a `mod.rs` index
//! 5. **Writing** - a single [`WritePolicy`] decides skip, overwrite or backup
//!
//! Every model is built in memory before the first file is written, so a
//! malformed description or an unusable name never leaves a half-generated
//! directory behind.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use oas_modelgen::config::GeneratorConfig;
//! use oas_modelgen::generator::{generate, Flavor, RunOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = generate(&GeneratorConfig::from_env(), Flavor::Validation, RunOptions::default())?;
//! for result in &report.written {
//!     println!("{}: {}", result.path.display(), result.action);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Templates
//!
//! Templates live in the crate's `templates/` directory:
//!
//! - `validation_model.rs.txt` / `validation_enum.rs.txt`
//! - `persistence_model.rs.txt` / `persistence_enum.rs.txt`
//! - `mod.rs.txt`

mod model;
mod naming;
mod project;
mod schema;
mod templates;
mod types;
mod writer;
#[cfg(test)]
mod tests;

pub use model::*;
pub use naming::*;
pub use project::*;
pub use schema::*;
pub use templates::*;
pub use types::*;
pub use writer::*;
