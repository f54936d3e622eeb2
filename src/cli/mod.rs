//! # CLI Module
//!
//! Command-line front end of the model generator.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate model sources for one or both flavors:
//!
//! ```bash
//! modelgen generate --spec openapi.yaml --flavor all
//! ```
//!
//! Options:
//! - `--spec <FILE>` - API description (default: `MODELGEN_SPEC_PATH` or `openapi.yaml`)
//! - `--schemas-dir <DIR>` - validation output (default: `MODELGEN_SCHEMAS_DIR` or `src/schemas`)
//! - `--models-dir <DIR>` - persistence output (default: `MODELGEN_MODELS_DIR` or `src/models`)
//! - `--flavor <validation|persistence|all>` - default `all`
//! - `--policy <skip|backup|overwrite>` - default `skip` for validation, `backup` for persistence
//! - `--dry-run` - render and report only
//!
//! The command exits non-zero when any artifact failed to write.
//!
//! ### `inspect`
//!
//! Print the models a description would produce:
//!
//! ```bash
//! modelgen inspect --spec openapi.yaml
//! ```

mod commands;


pub use commands::{resolve_config, run, run_cli, Cli, Commands, FlavorArg, PolicyArg};
