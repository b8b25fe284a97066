use crate::error::Result;
use crate::host::{AssetHost, BundleStore};
use crate::model::{BundlePlan, ImageHandle};
use crate::reader::{RuleDocument, read_rule_file};
use crate::reconcile::plan_update;
use crate::settings::GeneratorSettings;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// What happened to one rule document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Not a rule document (no atlas name, or not JSON).
    Skipped,
    /// The document could not be read or decoded.
    FormatError { message: String },
    /// The bundle could not be opened, updated or saved.
    Failed { message: String },
    Updated(BundleUpdate),
}

/// Summary of a bundle update (or of the planned update in a dry run).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BundleUpdate {
    pub name: String,
    pub added: Vec<ImageHandle>,
    pub removed: Vec<ImageHandle>,
    /// Member count after the update.
    pub members: usize,
    /// Requested candidates that were not packable images.
    pub dropped: usize,
    /// Field diagnostics from the rule document.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Per-document outcomes of one generator run, in input order.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GenerateReport {
    pub documents: Vec<DocumentReport>,
}

impl GenerateReport {
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    /// Documents that ended in a format error or a store failure.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::FormatError { .. } | Outcome::Failed { .. }))
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.documents.iter().filter(|d| f(&d.outcome)).count()
    }

    /// Returns a human-readable summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "Documents: {}, Updated: {}, Skipped: {}, Failed: {}",
            self.documents.len(),
            self.updated(),
            self.skipped(),
            self.failed(),
        )
    }
}

/// Runs every rule document through the reader and reconciler and applies the
/// result to a [`BundleStore`].
pub struct Generator<'a, H: AssetHost, S: BundleStore> {
    settings: &'a GeneratorSettings,
    host: &'a H,
    store: &'a mut S,
    dry_run: bool,
}

impl<'a, H: AssetHost, S: BundleStore> Generator<'a, H, S> {
    pub fn new(settings: &'a GeneratorSettings, host: &'a H, store: &'a mut S) -> Self {
        Self {
            settings,
            host,
            store,
            dry_run: false,
        }
    }

    /// Plan only: bundles are opened but never modified or persisted.
    pub fn dry_run(mut self, v: bool) -> Self {
        self.dry_run = v;
        self
    }

    /// Processes `rule_files` in order. A failing document never stops the run.
    ///
    /// `observer` is called with `(index, total, path)` before each document.
    #[instrument(skip_all, fields(count = rule_files.len(), dry_run = self.dry_run))]
    pub fn run<P: AsRef<Path>>(
        &mut self,
        rule_files: &[P],
        mut observer: impl FnMut(usize, usize, &Path),
    ) -> GenerateReport {
        let mut report = GenerateReport::default();
        for (index, path) in rule_files.iter().enumerate() {
            let path = path.as_ref();
            observer(index, rule_files.len(), path);
            let outcome = self.process(path);
            report.documents.push(DocumentReport {
                path: path.to_path_buf(),
                outcome,
            });
        }
        info!("{}", report.summary());
        report
    }

    /// Reads, reconciles and applies a single rule document.
    pub fn process(&mut self, path: &Path) -> Outcome {
        let rule = read_rule_file(path);
        if rule.has_format_error() {
            let message = rule.error_message();
            error!(?path, %message, "format error in rule document");
            return Outcome::FormatError { message };
        }
        if rule.is_empty() {
            debug!(?path, "not a rule document");
            return Outcome::Skipped;
        }
        for w in &rule.errors {
            warn!(?path, warning = %w, "rule field ignored");
        }
        match self.apply(&rule) {
            Ok(update) => Outcome::Updated(update),
            Err(e) => {
                error!(?path, error = %e, "bundle update failed");
                Outcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn apply(&mut self, rule: &RuleDocument) -> Result<BundleUpdate> {
        let name = rule.atlas_name.clone().unwrap_or_default();
        let id = self.store.open_or_create(&name, &self.settings.defaults)?;
        let current = self.store.members(&id)?;
        let BundlePlan {
            settings,
            desired,
            to_add,
            to_remove,
            dropped,
        } = plan_update(rule, &self.settings.defaults, &current, self.host);
        let members = desired.len();

        if !self.dry_run {
            self.store.set_members(&id, desired.into_iter().collect())?;
            self.store.set_packing_params(&id, settings)?;
            self.store.persist(&id)?;
        }
        info!(
            atlas = %name,
            added = to_add.len(),
            removed = to_remove.len(),
            members,
            "bundle updated"
        );
        Ok(BundleUpdate {
            name,
            added: to_add,
            removed: to_remove,
            members,
            dropped,
            warnings: rule.errors.clone(),
        })
    }
}
