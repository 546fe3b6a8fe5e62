//! Report Catalog: named, ordered report definitions and the run result.
//!
//! Registration order is significant: it becomes file, sheet and table
//! order downstream.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::ReconConfig;
use crate::engine::Reconciliation;
use crate::error::ReconError;
use crate::fix::{attributions_replaced_counts, propose_fixes};
use crate::model::{DiffRecord, FixProposal, LinkRecord, TransitionCount};

/// Standard reports in registration order, with their descriptions.
pub const STANDARD_REPORTS: [(&str, &str); 7] = [
    (
        "gene_accession_pairs_lost",
        "Gene/accession links present in the old snapshot and absent from the new one under any attribution",
    ),
    (
        "gene_accession_attribs_lost",
        "Gene/accession/attribution triples present in the old snapshot and absent from the new one",
    ),
    (
        "gene_accession_attribs_kept",
        "Gene/accession/attribution triples present in both snapshots, limited to the attributions of interest",
    ),
    (
        "old_vs_new",
        "Attributions lost and gained per gene/accession pair; unchanged pairs are omitted",
    ),
    (
        "attribs_changed_counts",
        "Number of gene/accession pairs per (old, new) attribution change",
    ),
    (
        "attribs_replaced_counts",
        "Attribution change counts excluding the already-handled replacement",
    ),
    (
        "attribs_to_fix",
        "Proposed reversals of allow-listed attribution changes, for operator review",
    ),
];

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A materialized result relation: ordered columns, text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn from_rows<T: Tabular>(rows: &[T]) -> Self {
        Self {
            columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows.iter().map(Tabular::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// SHA-256 over header and rows → "sha256:<64 hex>".
    /// Cells are length-prefixed so no two tables share an encoding.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut line = |cells: &[String]| {
            hasher.update((cells.len() as u64).to_le_bytes());
            for cell in cells {
                hasher.update((cell.len() as u64).to_le_bytes());
                hasher.update(cell.as_bytes());
            }
        };
        line(&self.columns);
        for row in &self.rows {
            line(row);
        }
        format!("sha256:{:x}", hasher.finalize())
    }
}

/// A row type with a fixed header.
pub trait Tabular {
    const COLUMNS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl Tabular for LinkRecord {
    const COLUMNS: &'static [&'static str] = &["gene", "acc", "pub", "acc_type", "abbr"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.gene.clone(),
            self.accession.clone(),
            self.attribution.clone(),
            self.accession_type.clone(),
            self.abbreviation.clone().unwrap_or_default(),
        ]
    }
}

impl Tabular for DiffRecord {
    const COLUMNS: &'static [&'static str] = &["gene", "acc", "old_pubs", "new_pubs"];

    fn cells(&self) -> Vec<String> {
        vec![self.gene.clone(), self.accession.clone(), self.old_joined(), self.new_joined()]
    }
}

impl Tabular for TransitionCount {
    const COLUMNS: &'static [&'static str] = &["old_pubs", "new_pubs", "count"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.old_attributions.clone(),
            self.new_attributions.clone(),
            self.count.to_string(),
        ]
    }
}

impl Tabular for FixProposal {
    const COLUMNS: &'static [&'static str] =
        &["gene", "acc", "acc_type", "abbr", "from_pub", "to_pub", "statement"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.gene.clone(),
            self.accession.clone(),
            self.accession_type.clone(),
            self.abbreviation.clone().unwrap_or_default(),
            self.from_attribution.clone(),
            self.to_attribution.clone(),
            self.statement.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

type Producer = Box<dyn Fn(&Reconciliation<'_>) -> ReportTable>;

pub struct ReportDefinition {
    pub name: String,
    pub description: String,
    producer: Producer,
}

impl std::fmt::Debug for ReportDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ReportCatalog {
    entries: Vec<ReportDefinition>,
}

fn valid_report_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl ReportCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        producer: F,
    ) -> Result<(), ReconError>
    where
        F: Fn(&Reconciliation<'_>) -> ReportTable + 'static,
    {
        let name = name.into();
        if !valid_report_name(&name) {
            return Err(ReconError::InvalidReportName(name));
        }
        if self.entries.iter().any(|e| e.name == name) {
            return Err(ReconError::DuplicateReport(name));
        }
        self.entries.push(ReportDefinition {
            name,
            description: description.into(),
            producer: Box::new(producer),
        });
        Ok(())
    }

    /// The standard report set, minus any names in `reports.skip`.
    pub fn standard(config: &ReconConfig) -> Result<Self, ReconError> {
        let mut catalog = Self::new();
        for (name, description) in STANDARD_REPORTS {
            if config.reports.skip.iter().any(|s| s == name) {
                log::debug!("skipping report '{name}'");
                continue;
            }
            match name {
                "gene_accession_pairs_lost" => catalog.register(name, description, |r: &Reconciliation<'_>| {
                    ReportTable::from_rows(&r.pairs_lost())
                })?,
                "gene_accession_attribs_lost" => catalog.register(name, description, |r: &Reconciliation<'_>| {
                    ReportTable::from_rows(&r.attributions_lost())
                })?,
                "gene_accession_attribs_kept" => {
                    let filter = config.kept.clone();
                    catalog.register(name, description, move |r: &Reconciliation<'_>| {
                        ReportTable::from_rows(&r.attributions_kept(&filter))
                    })?
                }
                "old_vs_new" => catalog.register(name, description, |r: &Reconciliation<'_>| {
                    ReportTable::from_rows(&r.old_vs_new())
                })?,
                "attribs_changed_counts" => catalog.register(name, description, |r: &Reconciliation<'_>| {
                    ReportTable::from_rows(&r.attributions_changed_counts())
                })?,
                "attribs_replaced_counts" => {
                    let handled = config.fix.already_handled.clone();
                    catalog.register(name, description, move |r: &Reconciliation<'_>| {
                        ReportTable::from_rows(&attributions_replaced_counts(&r.old_vs_new(), handled.as_ref()))
                    })?
                }
                "attribs_to_fix" => {
                    let transitions = config.fix.transitions.clone();
                    let template = config.fix.statement_template().to_string();
                    catalog.register(name, description, move |r: &Reconciliation<'_>| {
                        ReportTable::from_rows(&propose_fixes(&r.old_vs_new(), &transitions, r.new_snapshot(), &template))
                    })?
                }
                other => return Err(ReconError::InvalidReportName(other.to_string())),
            }
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ReportDefinition> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Compute every report in registration order.
    pub fn run(&self, config_name: &str, recon: &Reconciliation<'_>) -> RunResult {
        let mut reports = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let table = (entry.producer)(recon);
            log::info!("report '{}': {} row(s)", entry.name, table.len());
            reports.push(NamedReport {
                name: entry.name.clone(),
                description: entry.description.clone(),
                table,
            });
        }
        RunResult {
            meta: RunMeta {
                config_name: config_name.to_string(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                old_records: recon.old().records().len(),
                new_records: recon.new_snapshot().records().len(),
            },
            reports,
        }
    }
}

// ---------------------------------------------------------------------------
// Run result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NamedReport {
    pub name: String,
    pub description: String,
    pub table: ReportTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub old_records: usize,
    pub new_records: usize,
}

/// Everything one run produced, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub reports: Vec<NamedReport>,
}

impl RunResult {
    pub fn report(&self, name: &str) -> Option<&NamedReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Side;
    use crate::normalize::{normalize, Snapshot};

    const CONFIG: &str = r#"
name = "catalog test"
[inputs]
old_links = "old.csv"
new_links = "new.csv"
abbreviations = "abbr.csv"
"#;

    fn empty_recon_inputs() -> (crate::normalize::NormalizedSnapshot, crate::normalize::NormalizedSnapshot) {
        (
            normalize(Snapshot::new(Side::Old, Vec::new())).unwrap(),
            normalize(Snapshot::new(Side::New, Vec::new())).unwrap(),
        )
    }

    #[test]
    fn standard_catalog_order() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let catalog = ReportCatalog::standard(&config).unwrap();
        let expected: Vec<&str> = STANDARD_REPORTS.iter().map(|(n, _)| *n).collect();
        assert_eq!(catalog.names(), expected);
    }

    #[test]
    fn skipped_reports_are_left_out() {
        let input = format!("{CONFIG}\n[reports]\nskip = [\"old_vs_new\", \"attribs_to_fix\"]\n");
        let config = ReconConfig::from_toml(&input).unwrap();
        let catalog = ReportCatalog::standard(&config).unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(!catalog.names().contains(&"old_vs_new"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut catalog = ReportCatalog::new();
        catalog
            .register("a", "first", |r: &Reconciliation<'_>| ReportTable::from_rows(&r.pairs_lost()))
            .unwrap();
        let err = catalog
            .register("a", "second", |r: &Reconciliation<'_>| ReportTable::from_rows(&r.old_vs_new()))
            .unwrap_err();
        assert!(matches!(err, ReconError::DuplicateReport(ref n) if n == "a"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn invalid_names_rejected() {
        let mut catalog = ReportCatalog::new();
        for bad in ["", "Lost", "pairs lost", "../x"] {
            let err = catalog
                .register(bad, "", |r: &Reconciliation<'_>| ReportTable::from_rows(&r.pairs_lost()))
                .unwrap_err();
            assert!(matches!(err, ReconError::InvalidReportName(_)), "{bad:?}");
        }
    }

    #[test]
    fn run_preserves_registration_order() {
        let (old, new) = empty_recon_inputs();
        let recon = Reconciliation::new(&old, &new);
        let mut catalog = ReportCatalog::new();
        for name in ["zeta", "alpha", "mid"] {
            catalog
                .register(name, format!("{name} report"), |r: &Reconciliation<'_>| {
                    ReportTable::from_rows(&r.old_vs_new())
                })
                .unwrap();
        }
        let result = catalog.run("order", &recon);
        let names: Vec<_> = result.reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(result.report("alpha").unwrap().description, "alpha report");
        assert_eq!(result.report("mid").unwrap().table.columns, vec!["gene", "acc", "old_pubs", "new_pubs"]);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = ReportTable {
            columns: vec!["x".into()],
            rows: vec![vec!["ab".into()], vec!["c".into()]],
        };
        let b = ReportTable {
            columns: vec!["x".into()],
            rows: vec![vec!["a".into()], vec!["bc".into()]],
        };
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(a.fingerprint().starts_with("sha256:"));
        assert_eq!(a.fingerprint().len(), "sha256:".len() + 64);
    }

    #[test]
    fn link_record_cells() {
        let record = LinkRecord {
            gene: "G1".into(),
            accession: "A1".into(),
            attribution: "P1".into(),
            accession_type: "GenBank".into(),
            abbreviation: None,
        };
        let table = ReportTable::from_rows(&[record]);
        assert_eq!(table.columns, vec!["gene", "acc", "pub", "acc_type", "abbr"]);
        assert_eq!(table.rows[0], vec!["G1", "A1", "P1", "GenBank", ""]);
        assert_eq!(table.column_index("pub"), Some(2));
    }
}
