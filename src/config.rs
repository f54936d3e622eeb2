//! # Generator Configuration
//!
//! Where a generation run reads its API description and writes its models,
//! loaded from environment variables. The CLI layers its flags on top.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Purpose |
//! |---|---|---|
//! | `MODELGEN_SPEC_PATH` | `openapi.yaml` | API description to read |
//! | `MODELGEN_SCHEMAS_DIR` | `src/schemas` | Output directory for validation models |
//! | `MODELGEN_MODELS_DIR` | `src/models` | Output directory for persistence models |
//!
//! Logging is configured separately through `MODELGEN_LOG_*`, see
//! [`LogConfig`](crate::logging::LogConfig).
//!
//! ## Usage
//!
//! ```rust
//! use oas_modelgen::config::GeneratorConfig;
//! use oas_modelgen::generator::Flavor;
//!
//! let config = GeneratorConfig::from_env();
//! println!("persistence models go to {}", config.output_dir(Flavor::Persistence).display());
//! ```

use std::env;
use std::path::{Path, PathBuf};

use crate::generator::Flavor;

pub const DEFAULT_SPEC_PATH: &str = "openapi.yaml";
pub const DEFAULT_SCHEMAS_DIR: &str = "src/schemas";
pub const DEFAULT_MODELS_DIR: &str = "src/models";

/// Paths used by a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// API description (YAML or JSON)
    pub spec_path: PathBuf,
    /// Output directory for validation-flavor models
    pub schemas_dir: PathBuf,
    /// Output directory for persistence-flavor models
    pub models_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spec_path: PathBuf::from(DEFAULT_SPEC_PATH),
            schemas_dir: PathBuf::from(DEFAULT_SCHEMAS_DIR),
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let path = |key: &str, default: &str| {
            env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };
        Self {
            spec_path: path("MODELGEN_SPEC_PATH", DEFAULT_SPEC_PATH),
            schemas_dir: path("MODELGEN_SCHEMAS_DIR", DEFAULT_SCHEMAS_DIR),
            models_dir: path("MODELGEN_MODELS_DIR", DEFAULT_MODELS_DIR),
        }
    }

    /// Output directory for `flavor`
    pub fn output_dir(&self, flavor: Flavor) -> &Path {
        match flavor {
            Flavor::Validation => &self.schemas_dir,
            Flavor::Persistence => &self.models_dir,
        }
    }
}
