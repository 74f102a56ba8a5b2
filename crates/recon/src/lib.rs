//! `ledgerlink-recon`: Batch reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded datasets and a matching oracle,
//! returns a fully-accounted reconciliation. No CLI, file or network IO.

pub mod aggregate;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod oracle;
pub mod plan;

pub use config::{DuplicateMatches, EngineConfig};
pub use engine::{reconcile, Reconciler};
pub use error::{OracleError, ReconError};
pub use dispatch::{dispatch, DispatchOutcome};
pub use model::{
    ComparisonUnit, Dataset, DispatchStats, MatchCandidate, OracleResult, ReconMeta, ReconReport,
    ReconSummary, ReconciliationResult, Record, Side,
};
pub use oracle::{MatchOracle, OracleRequest};
