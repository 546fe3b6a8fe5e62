//! `linkdiff-recon`: Gene/accession link snapshot reconciliation.
//!
//! Pure engine crate: receives pre-loaded relations, returns named result
//! tables. No CLI or export dependencies.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fix;
pub mod model;
pub mod normalize;
pub mod store;

pub use catalog::{NamedReport, ReportCatalog, ReportTable, RunResult};
pub use config::ReconConfig;
pub use engine::Reconciliation;
pub use error::ReconError;
pub use model::{DiffRecord, FixProposal, LinkRecord, Side, Transition, TransitionCount};
pub use normalize::{normalize, CompositeKey, NormalizedSnapshot, Snapshot};
pub use store::{RecordStore, RelationName};

/// Normalize both snapshots held by `store` and compute every catalog
/// report. Fails before any report runs if either snapshot is unusable.
pub fn run(config: &ReconConfig, store: &RecordStore) -> Result<RunResult, ReconError> {
    let old = normalize(store.snapshot(Side::Old)?)?;
    let new = normalize(store.snapshot(Side::New)?)?;
    let catalog = ReportCatalog::standard(config)?;
    let recon = Reconciliation::new(&old, &new);
    Ok(catalog.run(&config.name, &recon))
}
