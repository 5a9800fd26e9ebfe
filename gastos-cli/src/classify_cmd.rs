use anyhow::{Context, Result, bail};
use gastos_core::{ClassificationCache, ColumnRoleMap, Role};
use gastos_engine::{ClassificationRun, ExportOptions};
use gastos_ingest::{read_table, write_csv};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::load_config;
use crate::llm::{Provider, remote_from_config};

#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    pub out: Option<PathBuf>,
    pub explain: bool,
    pub include_note: bool,
    pub offline: bool,
}

/// Classify every file with one shared cache and write a single combined
/// export. Files that fail to parse, lack a description column or cannot be
/// exported are reported and skipped; the command fails at the end if any did.
pub fn classify_files(files: &[PathBuf], opts: &ClassifyOptions) -> Result<()> {
    let mut cfg = load_config()?;
    if opts.explain {
        cfg.batch.explain = true;
    }

    let remote = if opts.offline {
        None
    } else {
        let remote = remote_from_config(&cfg.llm)?;
        if remote.is_none() {
            let provider = Provider::parse(&cfg.llm.provider)?;
            eprintln!(
                "No API key for {}: set {} or run `{}`. Rows not matched by cache or keywords will be marked as errors.",
                cfg.llm.provider,
                provider.env_var(),
                provider.auth_hint()
            );
        }
        remote
    };
    let mut classifier = cfg.classifier()?;
    if let Some(service) = remote.as_ref() {
        classifier = classifier.with_service(service);
    }
    info!(
        files = files.len(),
        categories = classifier.taxonomy().len(),
        remote = classifier.has_service(),
        "classifier ready"
    );

    let export = ExportOptions {
        include_note: opts.include_note,
        include_explanation: cfg.batch.explain,
    };

    let mut cache = ClassificationCache::new();
    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut failures = 0usize;

    for path in files {
        let table = match read_table(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("{}: {e:#}", path.display());
                failures += 1;
                continue;
            }
        };

        let run = match classifier.classify_table(&table, &mut cache) {
            Ok(run) => run,
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                failures += 1;
                continue;
            }
        };
        print_summary(path, &run);

        match run.export(export) {
            Ok(t) => {
                headers.get_or_insert(t.headers);
                rows.extend(t.rows);
            }
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                print_rows(&run);
                failures += 1;
            }
        }
    }

    info!(files = files.len(), cached = cache.len(), "run finished");

    if let Some(headers) = headers {
        let bytes = write_csv(&headers, &rows)?;
        match &opts.out {
            Some(p) => {
                fs::write(p, bytes).with_context(|| format!("write {}", p.display()))?;
                eprintln!("Wrote {} rows to {}", rows.len(), p.display());
            }
            None => io::stdout().write_all(&bytes).context("write stdout")?,
        }
    }

    if failures > 0 {
        bail!("{failures} of {} file(s) could not be fully processed", files.len());
    }
    Ok(())
}

fn print_summary(path: &Path, run: &ClassificationRun) {
    let r = &run.report;
    eprintln!(
        "{}: {} rows | cache {} | keywords {} | remote {} | blank {} | unclassified {} | errors {}",
        path.display(),
        r.total,
        r.from_cache,
        r.from_keywords,
        r.from_remote,
        r.skipped,
        r.unclassified,
        r.failed
    );
    if !r.batch.mismatches.is_empty() {
        eprintln!(
            "  {} chunk(s) answered with the wrong number of lines",
            r.batch.mismatches.len()
        );
    }
}

/// Fallback listing when the export schema cannot be produced.
fn print_rows(run: &ClassificationRun) {
    for t in &run.transactions {
        eprintln!("  {:<20} {}", t.category().to_string(), t.transaction.description);
    }
}

pub fn show_columns(path: &Path) -> Result<()> {
    let table = read_table(path)?;
    let roles = ColumnRoleMap::resolve(&table.headers);

    println!("{} ({} rows)", path.display(), table.len());
    println!("Headers: {}", table.headers.join(" | "));
    for role in [Role::Note, Role::Date, Role::Amount] {
        let found = roles.get(role).unwrap_or("(not found)");
        match (role, roles.amount_kind) {
            (Role::Amount, Some(kind)) => println!("  {:<7} {found} [{kind:?}]", role.name()),
            _ => println!("  {:<7} {found}", role.name()),
        }
    }
    if let Err(e) = roles.require_note() {
        println!("\n{e}");
    } else if let Err(e) = roles.require_export() {
        println!("\n{e}");
    }
    Ok(())
}

pub fn show_categories() -> Result<()> {
    let classifier = load_config()?.classifier()?;
    println!("Categories:");
    for (i, label) in classifier.taxonomy().labels().iter().enumerate() {
        println!("  {:>2}. {label}", i + 1);
    }
    println!("\nKeyword rules (first match wins):");
    if classifier.rules().rules().is_empty() {
        println!("  (none)");
    }
    for rule in classifier.rules().rules() {
        println!("  {}: {}", rule.category, rule.keywords.join(", "));
    }
    Ok(())
}
