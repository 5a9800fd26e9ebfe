//! The classification cascade over a whole table.
//!
//! Each description is resolved by the first stage that can answer it:
//! cache, then keyword rules, then the batched remote classifier. Keyword
//! hits are written to the cache so later files in the same run reuse them.

use gastos_core::{
    AmountKind, Category, Classification, ClassificationCache, ClassifiedTransaction,
    ColumnRoleMap, KeywordMatcher, Source, Table, Taxonomy, Transaction,
};
use tracing::{info, warn};

use crate::batch::{BatchClassifier, BatchReport};
use crate::export::{ExportOptions, export_table};
use crate::service::CompletionService;
use crate::settings::BatchSettings;

/// Marker reason used when rows need a remote answer but no service is set.
pub const SERVICE_DISABLED: &str = "classification service not configured";

/// Tally of one run, by stage and outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    pub total: usize,
    pub from_cache: usize,
    pub from_keywords: usize,
    pub from_remote: usize,
    pub skipped: usize,
    pub unclassified: usize,
    pub failed: usize,
    pub batch: BatchReport,
}

impl ClassificationReport {
    fn tally(classifications: &[Classification], batch: BatchReport) -> Self {
        let mut r = Self {
            total: classifications.len(),
            batch,
            ..Default::default()
        };
        for c in classifications {
            match c.source {
                Source::Cache => r.from_cache += 1,
                Source::Keyword => r.from_keywords += 1,
                Source::Remote => r.from_remote += 1,
                Source::Skipped => r.skipped += 1,
            }
            if c.category.is_unclassified() {
                r.unclassified += 1;
            } else if c.category.is_failed() {
                r.failed += 1;
            }
        }
        r
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationRun {
    /// One entry per input row, in input order.
    pub transactions: Vec<ClassifiedTransaction>,
    pub roles: ColumnRoleMap,
    pub report: ClassificationReport,
}

impl ClassificationRun {
    pub fn categories(&self) -> Vec<&Category> {
        self.transactions.iter().map(|t| t.category()).collect()
    }

    /// Project the run onto the output schema.
    pub fn export(&self, options: ExportOptions) -> gastos_core::Result<Table> {
        export_table(&self.transactions, &self.roles, options)
    }
}

pub struct Classifier<'a> {
    taxonomy: Taxonomy,
    rules: KeywordMatcher,
    settings: BatchSettings,
    service: Option<&'a dyn CompletionService>,
}

impl std::fmt::Debug for Classifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("taxonomy", &self.taxonomy)
            .field("rules", &self.rules)
            .field("settings", &self.settings)
            .field("service", &self.service.is_some())
            .finish()
    }
}

impl Default for Classifier<'_> {
    fn default() -> Self {
        Self::new(Taxonomy::default(), KeywordMatcher::default(), BatchSettings::default())
    }
}

impl<'a> Classifier<'a> {
    pub fn new(taxonomy: Taxonomy, rules: KeywordMatcher, settings: BatchSettings) -> Self {
        Self {
            taxonomy,
            rules,
            settings,
            service: None,
        }
    }

    pub fn with_service(mut self, service: &'a dyn CompletionService) -> Self {
        self.service = Some(service);
        self
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn rules(&self) -> &KeywordMatcher {
        &self.rules
    }

    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }

    /// Classify every row of `table`.
    ///
    /// Fails with `Schema` before any remote request when no description
    /// column can be resolved. Otherwise always succeeds: per-row problems
    /// surface as `No clasificado` or `Error: ...` categories.
    pub fn classify_table(
        &self,
        table: &Table,
        cache: &mut ClassificationCache,
    ) -> gastos_core::Result<ClassificationRun> {
        let roles = ColumnRoleMap::resolve(&table.headers);
        let transactions = Transaction::from_table(table, &roles)?;

        let descriptions: Vec<&str> = transactions.iter().map(|t| t.description.as_str()).collect();
        let (classifications, report) =
            self.classify_descriptions(&descriptions, roles.amount_kind, cache);

        info!(
            rows = report.total,
            cache = report.from_cache,
            keyword = report.from_keywords,
            remote = report.from_remote,
            unclassified = report.unclassified,
            failed = report.failed,
            "classified table"
        );

        let transactions = transactions
            .into_iter()
            .zip(classifications)
            .map(|(transaction, classification)| ClassifiedTransaction {
                transaction,
                classification,
            })
            .collect();

        Ok(ClassificationRun {
            transactions,
            roles,
            report,
        })
    }

    /// Run the cascade over plain descriptions. Output matches input order
    /// and length.
    pub fn classify_descriptions<S: AsRef<str>>(
        &self,
        descriptions: &[S],
        amount_kind: Option<AmountKind>,
        cache: &mut ClassificationCache,
    ) -> (Vec<Classification>, ClassificationReport) {
        let mut out: Vec<Option<Classification>> = vec![None; descriptions.len()];
        let mut residual: Vec<(usize, &str)> = Vec::new();

        for (i, d) in descriptions.iter().enumerate() {
            let d = d.as_ref();
            if d.trim().is_empty() {
                out[i] = Some(Classification::new(Category::Unclassified, Source::Skipped));
            } else if let Some(entry) = cache.lookup(d) {
                out[i] = Some(
                    Classification::new(Category::label(&entry.label), Source::Cache)
                        .with_explanation(entry.explanation.clone()),
                );
            } else if let Some(hit) = self.rules.find(d) {
                let explanation = self
                    .settings
                    .explain
                    .then(|| format!("palabra clave \"{}\"", hit.keyword));
                cache.store_explained(d, hit.category, explanation.clone());
                out[i] = Some(
                    Classification::new(Category::label(hit.category), Source::Keyword)
                        .with_explanation(explanation),
                );
            } else {
                residual.push((i, d));
            }
        }

        let mut batch_report = BatchReport::default();
        if !residual.is_empty() {
            match self.service {
                Some(service) => {
                    let texts: Vec<&str> = residual.iter().map(|(_, d)| *d).collect();
                    let outcome = BatchClassifier::new(service, &self.taxonomy, &self.settings)
                        .with_amount_kind(amount_kind)
                        .classify(&texts, cache);
                    for ((pos, _), classification) in residual.iter().zip(outcome.classifications) {
                        out[*pos] = Some(classification);
                    }
                    batch_report = outcome.report;
                }
                None => {
                    warn!(rows = residual.len(), "no classification service; rows left as errors");
                    for (pos, _) in &residual {
                        out[*pos] = Some(Classification::new(
                            Category::failed(SERVICE_DISABLED),
                            Source::Remote,
                        ));
                    }
                }
            }
        }

        let classifications: Vec<Classification> = out
            .into_iter()
            .map(|c| c.unwrap_or_else(|| Classification::new(Category::Unclassified, Source::Skipped)))
            .collect();
        let report = ClassificationReport::tally(&classifications, batch_report);
        (classifications, report)
    }
}
