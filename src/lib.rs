//! # oas-modelgen
//!
//! **oas-modelgen** turns the component schemas of an OpenAPI description into
//! strongly-typed Rust model sources.
//!
//! ## Overview
//!
//! Each component schema becomes one model file in either (or both) of two
//! flavors:
//!
//! - **Validation** - `serde` structs with `validator` rules, for request and
//!   response payloads
//! - **Persistence** - `sea_orm` entities with primary keys, unique columns and
//!   indexes
//!
//! Inline enumerations and nested objects become satellite models of their
//! own, `$ref`s become named references, and every name is sanitized into a
//! valid, collision-free identifier.
//!
//! ## Architecture
//!
//! - **[`spec`]** - loads the description into an immutable [`spec::SchemaTable`]
//! - **[`generator`]** - naming, type mapping, model building, rendering and
//!   the file writer
//! - **[`config`]** - environment-driven paths
//! - **[`logging`]** - `tracing` subscriber setup for the binary
//! - **[`cli`]** - the `modelgen` command line
//! - **[`error`]** - the [`GenerateError`] taxonomy
//!
//! ### Generation Flow
//!
//! ```text
//! openapi.yaml ─ load ─▶ SchemaTable ─ build_models ─▶ [GeneratedModel]
//!              ─ render ─▶ [OutputArtifact] ─ write (policy) ─▶ GenerationReport
//! ```
//!
//! Nothing is written until every model of the run has been built, so a
//! malformed description leaves the output directory untouched.
//!
//! ## Example
//!
//! ```rust
//! use oas_modelgen::generator::{build_models, Flavor};
//! use oas_modelgen::spec::parse_schema_table;
//!
//! let yaml = r#"
//! components:
//!   schemas:
//!     Order:
//!       properties:
//!         status: { type: string, enum: [pending, shipped] }
//! "#;
//! let table = parse_schema_table(yaml, true).unwrap();
//! let models = build_models(&table, Flavor::Validation).unwrap();
//! let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
//! assert_eq!(names, ["OrderStatus", "Order"]);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod spec;

pub use error::{GenerateError, Result};
