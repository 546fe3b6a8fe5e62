// Run manifest: a JSON record of what one run produced and where it went

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use linkdiff_recon::RunResult;

use crate::error::ExportError;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub description: String,
    pub rows: usize,
    /// `sha256:<hex>` over the table's columns and rows.
    pub fingerprint: String,
    /// Output files that contain this report, relative to the output dir.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub elapsed_ms: u64,
    pub old_records: usize,
    pub new_records: usize,
    pub reports: Vec<ManifestEntry>,
}

impl RunManifest {
    pub fn from_result(result: &RunResult, elapsed: Duration) -> Self {
        RunManifest {
            name: result.meta.config_name.clone(),
            engine_version: result.meta.engine_version.clone(),
            run_at: result.meta.run_at.clone(),
            elapsed_ms: elapsed.as_millis() as u64,
            old_records: result.meta.old_records,
            new_records: result.meta.new_records,
            reports: result
                .reports
                .iter()
                .map(|r| ManifestEntry {
                    name: r.name.clone(),
                    description: r.description.clone(),
                    rows: r.table.len(),
                    fingerprint: r.table.fingerprint(),
                    files: Vec::new(),
                })
                .collect(),
        }
    }

    /// Record that `file` holds `report` (or every report when `None`).
    pub fn add_file(&mut self, report: Option<&str>, file: impl Into<String>) {
        let file = file.into();
        for entry in &mut self.reports {
            if report.map_or(true, |name| name == entry.name) {
                entry.files.push(file.clone());
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Json(e.to_string()))
    }

    pub fn write(&self, path: &Path) -> Result<(), ExportError> {
        let mut json = self.to_json()?;
        json.push('\n');
        std::fs::write(path, json).map_err(|e| ExportError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdiff_recon::catalog::RunMeta;
    use linkdiff_recon::{NamedReport, ReportTable};

    fn result() -> RunResult {
        RunResult {
            meta: RunMeta {
                config_name: "weekly".into(),
                engine_version: "0.3.0".into(),
                run_at: "2026-04-08T00:00:00+00:00".into(),
                old_records: 10,
                new_records: 9,
            },
            reports: vec![
                NamedReport {
                    name: "gene_accession_pairs_lost".into(),
                    description: "lost pairs".into(),
                    table: ReportTable {
                        columns: vec!["gene".into(), "acc".into()],
                        rows: vec![vec!["G1".into(), "A1".into()]],
                    },
                },
                NamedReport {
                    name: "old_vs_new".into(),
                    description: "moved".into(),
                    table: ReportTable {
                        columns: vec!["gene".into()],
                        rows: Vec::new(),
                    },
                },
            ],
        }
    }

    #[test]
    fn manifest_mirrors_result() {
        let manifest = RunManifest::from_result(&result(), Duration::from_millis(1500));
        assert_eq!(manifest.name, "weekly");
        assert_eq!(manifest.elapsed_ms, 1500);
        assert_eq!(manifest.reports.len(), 2);
        assert_eq!(manifest.reports[0].rows, 1);
        assert!(manifest.reports[0].fingerprint.starts_with("sha256:"));
    }

    #[test]
    fn files_attach_to_named_or_all_reports() {
        let mut manifest = RunManifest::from_result(&result(), Duration::ZERO);
        manifest.add_file(Some("old_vs_new"), "old_vs_new.csv");
        manifest.add_file(None, "all.xlsx");
        assert_eq!(manifest.reports[0].files, vec!["all.xlsx"]);
        assert_eq!(manifest.reports[1].files, vec!["old_vs_new.csv", "all.xlsx"]);
    }

    #[test]
    fn json_round_trips_and_omits_empty_files() {
        let manifest = RunManifest::from_result(&result(), Duration::ZERO);
        let json = manifest.to_json().unwrap();
        assert!(!json.contains("\"files\""));
        let back: RunManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        RunManifest::from_result(&result(), Duration::ZERO).write(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["reports"][1]["name"], "old_vs_new");
    }
}
