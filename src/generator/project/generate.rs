use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{error, info, info_span, warn};

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};
use crate::spec::{load_schema_table, SchemaTable};

use crate::generator::model::{Flavor, GeneratedModel};
use crate::generator::naming::NameRegistry;
use crate::generator::schema::build_models;
use crate::generator::templates::{module_stem, referenced_models, render_mod_rs, render_model};
use crate::generator::writer::{write_artifact, OutputArtifact, WriteAction, WritePolicy, WriteResult};

/// Per-invocation knobs of a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Overrides the flavor's default policy
    pub policy: Option<WritePolicy>,
    /// Render and report without touching the filesystem
    pub dry_run: bool,
}

/// Policy used when the caller does not pick one
///
/// Validation models are hand-extended after generation and are never
/// clobbered; persistence models track the schema and keep a backup.
pub fn default_policy(flavor: Flavor) -> WritePolicy {
    match flavor {
        Flavor::Validation => WritePolicy::SkipIfExists,
        Flavor::Persistence => WritePolicy::BackupThenOverwrite,
    }
}

/// Outcome of one generation run
#[derive(Debug)]
pub struct GenerationReport {
    pub flavor: Flavor,
    pub policy: WritePolicy,
    /// Artifacts that were written, skipped or dry-run, in write order
    pub written: Vec<WriteResult>,
    /// Artifacts whose write failed
    pub failed: Vec<(PathBuf, GenerateError)>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of written results with `action`
    pub fn count(&self, action: &WriteAction) -> usize {
        self.written
            .iter()
            .filter(|r| std::mem::discriminant(&r.action) == std::mem::discriminant(action))
            .count()
    }
}

/// Load the configured description and generate every model of `flavor`
///
/// # Errors
///
/// Loader, naming, cycle and render failures abort the run before any file is
/// written. Individual write failures do not; they land in
/// [`GenerationReport::failed`], together with every model that references a
/// model that was not written. Those are withheld so no written file names a
/// type without a definition, and `mod.rs` declares only the modules that landed.
pub fn generate(config: &GeneratorConfig, flavor: Flavor, options: RunOptions) -> Result<GenerationReport> {
    let table = load_schema_table(&config.spec_path)?;
    generate_from_table(&table, config.output_dir(flavor), flavor, options)
}

/// Generate every model of `flavor` from an already loaded table into `out_dir`
///
/// # Errors
///
/// See [`generate`].
pub fn generate_from_table(
    table: &SchemaTable,
    out_dir: &Path,
    flavor: Flavor,
    options: RunOptions,
) -> Result<GenerationReport> {
    let span = info_span!("generate", %flavor, out_dir = %out_dir.display());
    let _enter = span.enter();

    let policy = options.policy.unwrap_or_else(|| default_policy(flavor));
    let models = build_models(table, flavor)?;
    let artifacts = plan_artifacts(&models, out_dir, flavor)?;

    let mut report = GenerationReport {
        flavor,
        policy,
        written: Vec::with_capacity(artifacts.len()),
        failed: Vec::new(),
    };
    let Some((planned_index, model_artifacts)) = artifacts.split_last() else {
        return Ok(report);
    };

    let refs: HashMap<&str, _> = models
        .iter()
        .map(|m| (m.name.as_str(), referenced_models(m)))
        .collect();
    let mut missing: HashSet<&str> = HashSet::new();
    let mut landed = Vec::with_capacity(model_artifacts.len());
    for (artifact, model) in model_artifacts.iter().zip(&models) {
        let blocker = refs
            .get(model.name.as_str())
            .and_then(|names| names.iter().find(|n| missing.contains(**n)).copied());
        if let Some(dependency) = blocker {
            warn!(path = %artifact.path.display(), model = %model.name, dependency, "withholding model");
            missing.insert(model.name.as_str());
            report.failed.push((
                artifact.path.clone(),
                GenerateError::DependencyNotWritten {
                    model: model.name.clone(),
                    dependency: dependency.to_string(),
                },
            ));
            continue;
        }
        match write_artifact(artifact, policy, options.dry_run) {
            Ok(result) => {
                landed.push(module_stem_of(&artifact.path));
                report.written.push(result);
            }
            Err(err) => {
                error!(path = %artifact.path.display(), model = %artifact.model, error = %err, "failed to write model");
                missing.insert(model.name.as_str());
                report.failed.push((artifact.path.clone(), err));
            }
        }
    }

    let index = if missing.is_empty() {
        Ok(planned_index.clone())
    } else {
        render_mod_rs(&landed, flavor).map(|content| OutputArtifact {
            content,
            ..planned_index.clone()
        })
    };
    match index.and_then(|index| write_artifact(&index, policy, options.dry_run)) {
        Ok(result) => report.written.push(result),
        Err(err) => {
            error!(path = %planned_index.path.display(), error = %err, "failed to write module index");
            report.failed.push((planned_index.path.clone(), err));
        }
    }

    info!(
        models = models.len(),
        written = report.written.len(),
        failed = report.failed.len(),
        %policy,
        dry_run = options.dry_run,
        "generation finished"
    );
    Ok(report)
}

/// Render every model plus the `mod.rs` index into artifacts under `out_dir`
///
/// Artifacts keep creation order (satellites before the models using them),
/// with the index last. File stems are the snake-cased model names, made
/// unique within the directory.
///
/// # Errors
///
/// Returns [`GenerateError::Render`] if any template fails.
pub fn plan_artifacts(models: &[GeneratedModel], out_dir: &Path, flavor: Flavor) -> Result<Vec<OutputArtifact>> {
    let mut stems = NameRegistry::new();
    // `base` and `mod` are taken by the collaborator module and the index
    stems.claim("<base>", "base");
    stems.claim("<mod>", "mod");

    let mut modules = HashMap::with_capacity(models.len());
    let mut order = Vec::with_capacity(models.len());
    for model in models {
        let stem = stems.claim(&model.name, &module_stem(&model.name));
        modules.insert(model.name.clone(), stem.clone());
        order.push(stem);
    }

    let mut artifacts = Vec::with_capacity(models.len() + 1);
    for (model, stem) in models.iter().zip(&order) {
        artifacts.push(OutputArtifact {
            path: out_dir.join(format!("{stem}.rs")),
            content: render_model(model, &modules)?,
            model: model.name.clone(),
        });
    }
    artifacts.push(OutputArtifact {
        path: out_dir.join("mod.rs"),
        content: render_mod_rs(&order, flavor)?,
        model: "mod".to_string(),
    });
    Ok(artifacts)
}

fn module_stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
