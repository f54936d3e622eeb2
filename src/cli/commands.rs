use crate::config::GeneratorConfig;
use crate::generator::{
    build_models, generate, validation_type, Flavor, GenerationReport, RunOptions, WriteAction,
    WritePolicy,
};
use crate::spec::load_schema_table;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line interface for the model generator
#[derive(Parser)]
#[command(name = "modelgen", version)]
#[command(about = "Generate validation and persistence models from OpenAPI component schemas", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate model sources from the component schemas of an API description
    Generate {
        /// Path to the API description (YAML or JSON) [env: MODELGEN_SPEC_PATH]
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Output directory for validation models [env: MODELGEN_SCHEMAS_DIR]
        #[arg(long)]
        schemas_dir: Option<PathBuf>,

        /// Output directory for persistence models [env: MODELGEN_MODELS_DIR]
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Which flavor(s) to generate
        #[arg(long, value_enum, env = "MODELGEN_FLAVOR", default_value_t = FlavorArg::All)]
        flavor: FlavorArg,

        /// What to do with files that already exist (default depends on the flavor)
        #[arg(long, value_enum, env = "MODELGEN_POLICY")]
        policy: Option<PolicyArg>,

        /// Render and report without writing files
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print every model the description would produce, with mapped types
    Inspect {
        /// Path to the API description (YAML or JSON) [env: MODELGEN_SPEC_PATH]
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },
}

/// Flavor selection on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
    /// serde + validator request/response models
    Validation,
    /// sea_orm storage entities
    Persistence,
    /// Both flavors, validation first
    All,
}

impl FlavorArg {
    pub fn flavors(self) -> &'static [Flavor] {
        match self {
            FlavorArg::Validation => &[Flavor::Validation],
            FlavorArg::Persistence => &[Flavor::Persistence],
            FlavorArg::All => &[Flavor::Validation, Flavor::Persistence],
        }
    }
}

/// Existing-file policy on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Leave existing files untouched
    Skip,
    /// Keep a timestamped `.bak` copy, then overwrite
    Backup,
    /// Overwrite existing files
    Overwrite,
}

impl From<PolicyArg> for WritePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Skip => WritePolicy::SkipIfExists,
            PolicyArg::Backup => WritePolicy::BackupThenOverwrite,
            PolicyArg::Overwrite => WritePolicy::Overwrite,
        }
    }
}

/// Environment configuration with command-line overrides applied
pub fn resolve_config(
    spec: Option<PathBuf>,
    schemas_dir: Option<PathBuf>,
    models_dir: Option<PathBuf>,
) -> GeneratorConfig {
    let mut config = GeneratorConfig::from_env();
    if let Some(spec) = spec {
        config.spec_path = spec;
    }
    if let Some(dir) = schemas_dir {
        config.schemas_dir = dir;
    }
    if let Some(dir) = models_dir {
        config.models_dir = dir;
    }
    config
}

/// Parse the process arguments and run the selected command
///
/// # Errors
///
/// Fails when the description cannot be turned into models, or when any
/// artifact could not be written.
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

/// Run an already parsed command line
///
/// # Errors
///
/// See [`run_cli`].
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            spec,
            schemas_dir,
            models_dir,
            flavor,
            policy,
            dry_run,
        } => {
            let config = resolve_config(spec, schemas_dir, models_dir);
            let options = RunOptions {
                policy: policy.map(WritePolicy::from),
                dry_run,
            };

            let mut failed = 0;
            for &flavor in flavor.flavors() {
                let report = generate(&config, flavor, options).with_context(|| {
                    format!(
                        "failed to generate {flavor} models from {}",
                        config.spec_path.display()
                    )
                })?;
                print_report(&report);
                failed += report.failed.len();
            }
            if failed > 0 {
                anyhow::bail!("{failed} artifact(s) could not be written");
            }
            Ok(())
        }
        Commands::Inspect { spec } => {
            let config = resolve_config(spec, None, None);
            let table = load_schema_table(&config.spec_path)
                .with_context(|| format!("failed to load {}", config.spec_path.display()))?;
            let models = build_models(&table, Flavor::Validation)?;
            for model in &models {
                if model.is_enum() {
                    let values: Vec<&str> = model.members().iter().map(|m| m.value.as_str()).collect();
                    println!("enum {} [{}]", model.name, values.join(", "));
                    continue;
                }
                println!("model {} (from `{}`)", model.name, model.raw_name);
                for field in model.fields() {
                    let marker = if field.required { "" } else { "?" };
                    let bounds = if field.ty.constraints.has_bounds() { " (constrained)" } else { "" };
                    println!(
                        "  {}{marker}: {}{bounds}",
                        field.name,
                        validation_type(&field.ty.expr)
                    );
                }
            }
            Ok(())
        }
    }
}

fn print_report(report: &GenerationReport) {
    println!(
        "{} models ({} policy): {} created, {} overwritten, {} backed up, {} skipped, {} dry-run, {} failed",
        report.flavor,
        report.policy,
        report.count(&WriteAction::Created),
        report.count(&WriteAction::Overwritten),
        report.count(&WriteAction::BackedUp {
            backup: PathBuf::new()
        }),
        report.count(&WriteAction::Skipped),
        report.count(&WriteAction::DryRun),
        report.failed.len()
    );
    for (path, err) in &report.failed {
        eprintln!("❌ {}: {err}", path.display());
    }
}
