use std::collections::HashSet;

use serde::Deserialize;

use crate::catalog::STANDARD_REPORTS;
use crate::error::ReconError;
use crate::fix::{unknown_placeholders, DEFAULT_STATEMENT_TEMPLATE};
use crate::model::Transition;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub inputs: InputFiles,
    #[serde(default)]
    pub columns: LinkColumns,
    #[serde(default)]
    pub abbreviation_columns: AbbreviationColumns,
    #[serde(default)]
    pub kept: KeptFilter,
    #[serde(default)]
    pub fix: FixConfig,
    #[serde(default)]
    pub reports: ReportSelection,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Source files, resolved relative to the config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    pub old_links: String,
    pub new_links: String,
    pub abbreviations: String,
}

/// Column names of the two link relations. Other columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkColumns {
    #[serde(default = "default_gene_column")]
    pub gene: String,
    #[serde(default = "default_accession_column")]
    pub accession: String,
    #[serde(default = "default_attribution_column")]
    pub attribution: String,
    #[serde(default = "default_accession_type_column")]
    pub accession_type: String,
}

impl Default for LinkColumns {
    fn default() -> Self {
        Self {
            gene: default_gene_column(),
            accession: default_accession_column(),
            attribution: default_attribution_column(),
            accession_type: default_accession_type_column(),
        }
    }
}

fn default_gene_column() -> String {
    "dblink_linked_recid".into()
}

fn default_accession_column() -> String {
    "dblink_acc_num".into()
}

fn default_attribution_column() -> String {
    "recattrib_source_zdb_id".into()
}

fn default_accession_type_column() -> String {
    "acc_type".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbbreviationColumns {
    #[serde(default = "default_abbr_gene_column")]
    pub gene: String,
    #[serde(default = "default_abbr_column")]
    pub abbreviation: String,
}

impl Default for AbbreviationColumns {
    fn default() -> Self {
        Self {
            gene: default_abbr_gene_column(),
            abbreviation: default_abbr_column(),
        }
    }
}

fn default_abbr_gene_column() -> String {
    "gene".into()
}

fn default_abbr_column() -> String {
    "abbr".into()
}

// ---------------------------------------------------------------------------
// Report filters
// ---------------------------------------------------------------------------

/// Attribution ids of interest for the kept report.
/// Unset means every surviving triple is reported.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeptFilter {
    #[serde(default)]
    pub attributions: Option<Vec<String>>,
}

impl KeptFilter {
    pub fn all() -> Self {
        Self { attributions: None }
    }

    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attributions: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn includes(&self, attribution: &str) -> bool {
        match &self.attributions {
            None => true,
            Some(ids) => ids.iter().any(|id| id == attribution),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixConfig {
    /// Known, intentional (old → new) replacements that may be reverted.
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// Replacement excluded from the replaced-counts report.
    #[serde(default)]
    pub already_handled: Option<Transition>,
    /// Statement template; see `fix::render_statement`.
    #[serde(default)]
    pub statement: Option<String>,
}

impl FixConfig {
    pub fn statement_template(&self) -> &str {
        self.statement.as_deref().unwrap_or(DEFAULT_STATEMENT_TEMPLATE)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSelection {
    /// Standard reports to leave out of the run.
    #[serde(default)]
    pub skip: Vec<String>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_true")]
    pub csv: bool,
    #[serde(default)]
    pub xlsx: Option<String>,
    #[serde(default)]
    pub sqlite: Option<String>,
    #[serde(default = "default_true")]
    pub manifest: bool,
    /// Workbook link column target, e.g. `https://zfin.org/{gene}#sequences`.
    #[serde(default)]
    pub link_url: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            csv: true,
            xlsx: None,
            sqlite: None,
            manifest: true,
            link_url: None,
        }
    }
}

fn default_output_dir() -> String {
    "out".into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }

        for (field, path) in [
            ("old_links", &self.inputs.old_links),
            ("new_links", &self.inputs.new_links),
            ("abbreviations", &self.inputs.abbreviations),
        ] {
            if path.trim().is_empty() {
                return Err(invalid(format!("inputs.{field} must not be empty")));
            }
        }

        let cols = &self.columns;
        let mut seen = HashSet::new();
        for (field, column) in [
            ("gene", &cols.gene),
            ("accession", &cols.accession),
            ("attribution", &cols.attribution),
            ("accession_type", &cols.accession_type),
        ] {
            if column.is_empty() {
                return Err(invalid(format!("columns.{field} must not be empty")));
            }
            if !seen.insert(column.as_str()) {
                return Err(invalid(format!("columns.{field}: column '{column}' is mapped twice")));
            }
        }

        if self.abbreviation_columns.gene.is_empty() || self.abbreviation_columns.abbreviation.is_empty() {
            return Err(invalid("abbreviation_columns must not be empty"));
        }

        if let Some(ref ids) = self.kept.attributions {
            if ids.iter().any(|id| id.trim().is_empty()) {
                return Err(invalid("kept.attributions contains an empty id"));
            }
        }

        let mut transitions = HashSet::new();
        for t in &self.fix.transitions {
            check_transition("fix.transitions", t)?;
            if !transitions.insert(t) {
                return Err(invalid(format!("fix.transitions: '{t}' is listed twice")));
            }
        }
        if let Some(ref handled) = self.fix.already_handled {
            check_transition("fix.already_handled", handled)?;
        }

        let unknown = unknown_placeholders(self.fix.statement_template());
        if !unknown.is_empty() {
            return Err(invalid(format!(
                "fix.statement: unknown placeholder(s) {}",
                unknown.iter().map(|p| format!("{{{p}}}")).collect::<Vec<_>>().join(", ")
            )));
        }

        for name in &self.reports.skip {
            if !STANDARD_REPORTS.iter().any(|(known, _)| known == name) {
                return Err(invalid(format!("reports.skip: unknown report '{name}'")));
            }
        }

        if self.output.dir.trim().is_empty() {
            return Err(invalid("output.dir must not be empty"));
        }
        if let Some(ref url) = self.output.link_url {
            if !url.contains("{gene}") {
                return Err(invalid("output.link_url must contain {gene}"));
            }
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ReconError {
    ReconError::ConfigValidation(msg.into())
}

/// Transition ids are compared against single-valued joined strings,
/// so a comma can never match.
fn check_transition(field: &str, t: &Transition) -> Result<(), ReconError> {
    for id in [&t.old, &t.new] {
        if id.trim().is_empty() {
            return Err(invalid(format!("{field}: empty attribution id in '{t}'")));
        }
        if id.contains(',') {
            return Err(invalid(format!("{field}: attribution id '{id}' contains ','")));
        }
    }
    if t.old == t.new {
        return Err(invalid(format!("{field}: '{t}' does not change the attribution")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "GenBank 0306 vs 0408"

[inputs]
old_links = "genbank0306.csv"
new_links = "genbank0408.csv"
abbreviations = "gene2abbr.csv"
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = ReconConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "GenBank 0306 vs 0408");
        assert_eq!(config.columns.gene, "dblink_linked_recid");
        assert_eq!(config.columns.accession, "dblink_acc_num");
        assert_eq!(config.columns.attribution, "recattrib_source_zdb_id");
        assert_eq!(config.columns.accession_type, "acc_type");
        assert_eq!(config.abbreviation_columns.abbreviation, "abbr");
        assert!(config.kept.attributions.is_none());
        assert!(config.fix.transitions.is_empty());
        assert_eq!(config.output.dir, "out");
        assert!(config.output.csv);
        assert!(config.output.manifest);
        assert!(config.output.xlsx.is_none());
        assert_eq!(config.fix.statement_template(), DEFAULT_STATEMENT_TEMPLATE);
    }

    #[test]
    fn parse_full() {
        let input = format!(
            r#"{MINIMAL}
[columns]
gene = "gene_id"
accession = "acc"
attribution = "pub"
accession_type = "type"

[kept]
attributions = ["P1", "P2"]

[fix]
transitions = [{{ old = "P1", new = "P2" }}, {{ old = "P3", new = "P2" }}]
already_handled = {{ old = "P1", new = "P2" }}
statement = "move {{gene}}/{{accession}} from {{from}} to {{to}}"

[reports]
skip = ["attribs_to_fix"]

[output]
dir = "reports"
csv = false
xlsx = "all.xlsx"
sqlite = "reports.db"
link_url = "https://zfin.org/{{gene}}#sequences"
"#
        );
        let config = ReconConfig::from_toml(&input).unwrap();
        assert_eq!(config.columns.gene, "gene_id");
        assert!(config.kept.includes("P2"));
        assert!(!config.kept.includes("P9"));
        assert_eq!(config.fix.transitions.len(), 2);
        assert_eq!(config.fix.transitions[1], Transition::new("P3", "P2"));
        assert_eq!(config.fix.already_handled, Some(Transition::new("P1", "P2")));
        assert_eq!(config.reports.skip, vec!["attribs_to_fix"]);
        assert_eq!(config.output.xlsx.as_deref(), Some("all.xlsx"));
        assert!(!config.output.csv);
    }

    #[test]
    fn kept_filter_unset_includes_everything() {
        assert!(KeptFilter::all().includes("anything"));
        assert!(!KeptFilter::only(Vec::<String>::new()).includes("anything"));
    }

    #[test]
    fn reject_missing_inputs() {
        let err = ReconConfig::from_toml("name = \"x\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_comma_in_transition() {
        let input = format!("{MINIMAL}\n[fix]\ntransitions = [{{ old = \"P1,P2\", new = \"P3\" }}]\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("contains ','"), "{err}");
    }

    #[test]
    fn reject_duplicate_transition() {
        let input = format!(
            "{MINIMAL}\n[fix]\ntransitions = [{{ old = \"P1\", new = \"P2\" }}, {{ old = \"P1\", new = \"P2\" }}]\n"
        );
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn reject_identity_transition() {
        let input = format!("{MINIMAL}\n[fix]\nalready_handled = {{ old = \"P1\", new = \"P1\" }}\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("does not change"));
    }

    #[test]
    fn reject_unknown_placeholder() {
        let input = format!("{MINIMAL}\n[fix]\nstatement = \"set {{pub}} on {{gene}}\"\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("{pub}"), "{err}");
    }

    #[test]
    fn reject_unknown_skipped_report() {
        let input = format!("{MINIMAL}\n[reports]\nskip = [\"not_a_report\"]\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("'not_a_report'"));
    }

    #[test]
    fn reject_column_mapped_twice() {
        let input = format!("{MINIMAL}\n[columns]\ngene = \"id\"\naccession = \"id\"\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("mapped twice"));
    }

    #[test]
    fn reject_link_url_without_gene() {
        let input = format!("{MINIMAL}\n[output]\nlink_url = \"https://example.org/\"\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("link_url"));
    }
}
