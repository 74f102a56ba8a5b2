//! `ledgerlink reconcile` and `ledgerlink history`.

use std::path::{Path, PathBuf};

use ledgerlink_config::{ResolvedAIConfig, Settings};
use ledgerlink_recon::plan::sort_by_date;
use ledgerlink_recon::{Dataset, ReconReport, ReconSummary, Reconciler};

use crate::account::require_account;
use crate::exit_codes::*;
use crate::{open_store, print_json, CliError};

pub struct ReconcileArgs {
    pub file_a: PathBuf,
    pub file_b: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub window: Option<usize>,
    pub pool: Option<usize>,
    pub no_save: bool,
}

fn load(path: &Path) -> Result<Dataset, CliError> {
    if !path.exists() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("File not found: {}", path.display()),
            hint: None,
        });
    }
    ledgerlink_io::load_dataset_from_path(path).map_err(|e| CliError {
        code: EXIT_INGEST,
        message: format!("{}: {}", path.display(), e),
        hint: None,
    })
}

pub fn cmd_reconcile(args: ReconcileArgs) -> Result<(), CliError> {
    let store = open_store()?;
    let account = require_account(&store)?;

    let settings = Settings::load();
    let mut config = settings.recon.clone();
    if let Some(window) = args.window {
        config.window_size = window;
    }
    if let Some(pool) = args.pool {
        config.pool_size = pool;
    }
    config.validate().map_err(recon_error)?;

    let dataset_a = load(&args.file_a)?;
    let dataset_b = load(&args.file_b)?;

    let ai = ResolvedAIConfig::from_settings(&settings.ai);
    let oracle = ledgerlink_ai::oracle_from_config(&ai).map_err(oracle_error)?;
    log::info!("matching with {} ({})", ai.provider_name(), ai.model);

    let reconciler = Reconciler::new(oracle, config).map_err(recon_error)?;
    let report = reconciler.run(&dataset_a, &dataset_b);

    let saved_id = if args.no_save {
        None
    } else {
        let id = store
            .save_reconciliation(&account.id, &sort_by_date(&dataset_a), &sort_by_date(&dataset_b), &report)
            .map_err(store_error)?;
        Some(id)
    };

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: e.to_string(),
            hint: None,
        })?;
        std::fs::write(path, json).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("Failed to write {}: {}", path.display(), e),
            hint: None,
        })?;
    }

    if args.json {
        print_json(&report)?;
    }
    print_summary(&report, saved_id.as_deref());

    let units = report.meta.units;
    if units.nothing_reconciled() {
        return Err(CliError {
            code: EXIT_NOTHING_RECONCILED,
            message: format!("none of the {} AI call(s) produced a usable result", units.planned),
            hint: Some("run `ledgerlink ai doctor`, or RUST_LOG=debug for per-call errors".to_string()),
        });
    }
    Ok(())
}

fn print_summary(report: &ReconReport, saved_id: Option<&str>) {
    let s: &ReconSummary = &report.summary;
    let units = report.meta.units;

    eprintln!("Reconciliation");
    eprintln!("──────────────────────────────");
    eprintln!("File A records:    {}", s.records_a);
    eprintln!("File B records:    {}", s.records_b);
    eprintln!("Matches:           {}", s.matches);
    if let Some(mean) = s.mean_confidence {
        eprintln!("Mean confidence:   {:.2}", mean);
    }
    eprintln!("Unmatched in A:    {}", s.unmatched_a);
    eprintln!("Unmatched in B:    {}", s.unmatched_b);
    if s.foreign_matches > 0 {
        eprintln!("Unknown records:   {} match(es) name records not in either file", s.foreign_matches);
    }
    eprintln!(
        "AI calls:          {} planned, {} ok, {} failed, {} unusable",
        units.planned, units.succeeded, units.failed, units.unusable
    );
    if let Some(id) = saved_id {
        eprintln!("Saved as:          {}", id);
    }
}

pub fn cmd_history(json: bool, show: Option<String>) -> Result<(), CliError> {
    let store = open_store()?;
    let account = require_account(&store)?;

    if let Some(id) = show {
        let record = store
            .get_reconciliation(&account.id, &id)
            .map_err(store_error)?
            .ok_or_else(|| CliError {
                code: EXIT_USAGE,
                message: format!("No reconciliation with id {}", id),
                hint: Some("list yours with `ledgerlink history`".to_string()),
            })?;

        if json {
            print_json(&record)?;
        } else {
            println!("{}  {}", record.id, record.created_at);
            println!(
                "  {} x {} records, {} match(es)",
                record.dataset_a.len(),
                record.dataset_b.len(),
                record.result.summary.matches
            );
            for m in &record.result.result.matches {
                println!(
                    "  {:.2}  {}",
                    m.confidence_score,
                    if m.match_reason.is_empty() { "-" } else { &m.match_reason }
                );
            }
        }
        return Ok(());
    }

    let history = store.list_reconciliations(&account.id).map_err(store_error)?;

    if json {
        print_json(&history)?;
    } else if history.is_empty() {
        eprintln!("No reconciliations yet");
    } else {
        for entry in &history {
            let s = &entry.result.summary;
            println!(
                "{}  {}  A:{} B:{}  matched:{}  unmatched A:{} B:{}",
                entry.id, entry.created_at, s.records_a, s.records_b, s.matches, s.unmatched_a, s.unmatched_b
            );
        }
    }
    Ok(())
}
