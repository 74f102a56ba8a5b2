use crate::aggregate::aggregate;
use crate::config::EngineConfig;
use crate::dispatch::dispatch;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::model::{ReconMeta, ReconReport, Record};
use crate::oracle::MatchOracle;
use crate::plan::plan;

/// A configured reconciliation pipeline bound to one oracle.
pub struct Reconciler<O: MatchOracle> {
    oracle: O,
    config: EngineConfig,
}

impl<O: MatchOracle> Reconciler<O> {
    pub fn new(oracle: O, config: EngineConfig) -> Result<Self, ReconError> {
        config.validate()?;
        Ok(Self { oracle, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile two datasets: sort, plan, dispatch, aggregate, summarize.
    ///
    /// Oracle failures never surface here; check `meta.units` for how many
    /// units actually contributed.
    pub fn run(&self, dataset_a: &[Record], dataset_b: &[Record]) -> ReconReport {
        run_pipeline(&self.oracle, &self.config, dataset_a, dataset_b)
    }
}

/// Free-function form of [`Reconciler::run`].
pub fn reconcile(
    dataset_a: &[Record],
    dataset_b: &[Record],
    oracle: &dyn MatchOracle,
    config: &EngineConfig,
) -> Result<ReconReport, ReconError> {
    config.validate()?;
    Ok(run_pipeline(oracle, config, dataset_a, dataset_b))
}

fn run_pipeline(
    oracle: &dyn MatchOracle,
    config: &EngineConfig,
    dataset_a: &[Record],
    dataset_b: &[Record],
) -> ReconReport {
    let plan = plan(dataset_a, dataset_b, config.window_size);
    log::info!(
        "reconciling {} x {} record(s) in {} unit(s)",
        plan.dataset_a.len(),
        plan.dataset_b.len(),
        plan.unit_count()
    );

    let outcome = dispatch(&plan.units, oracle, config.pool_size, config.date_window_days);

    let result = aggregate(
        &plan.dataset_a,
        &plan.dataset_b,
        outcome.results,
        config.duplicate_matches,
    );
    let summary = compute_summary(&plan.dataset_a, &plan.dataset_b, &result);

    if summary.foreign_matches > 0 {
        log::warn!(
            "{} match(es) name records not present in the inputs",
            summary.foreign_matches
        );
    }

    ReconReport {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            window_size: plan.window_size,
            pool_size: config.pool_size,
            bigger_side: plan.bigger,
            units: outcome.stats,
        },
        summary,
        result,
    }
}
