use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Which of the two snapshots a relation or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}

/// One asserted claim, in one snapshot, that `gene` links to `accession`,
/// with `attribution` naming the source asserting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkRecord {
    pub gene: String,
    pub accession: String,
    pub attribution: String,
    pub accession_type: String,
    pub abbreviation: Option<String>,
}

impl LinkRecord {
    /// Report ordering: accession, then gene, then the remaining columns.
    pub fn report_key(&self) -> (&str, &str, &str, &str, Option<&str>) {
        (
            &self.accession,
            &self.gene,
            &self.attribution,
            &self.accession_type,
            self.abbreviation.as_deref(),
        )
    }
}

/// Display form of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GenePair {
    pub gene: String,
    pub accession: String,
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

/// Attributions that moved for one gene/accession pair.
///
/// `old_attributions` holds only the attributions lost, `new_attributions`
/// only those gained; attributions common to both snapshots are omitted.
/// At least one side is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    pub gene: String,
    pub accession: String,
    pub old_attributions: Vec<String>,
    pub new_attributions: Vec<String>,
}

/// Joins attribution lists in report cells. Loaded ids never contain it.
pub const ATTRIBUTION_SEPARATOR: char = ',';

impl DiffRecord {
    pub fn old_joined(&self) -> String {
        join_attributions(&self.old_attributions)
    }

    pub fn new_joined(&self) -> String {
        join_attributions(&self.new_attributions)
    }
}

fn join_attributions(ids: &[String]) -> String {
    let mut joined = String::new();
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            joined.push(ATTRIBUTION_SEPARATOR);
        }
        joined.push_str(id);
    }
    joined
}

/// Frequency of one (old, new) attribution-string pair in the diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionCount {
    pub old_attributions: String,
    pub new_attributions: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Fixes
// ---------------------------------------------------------------------------

/// An observed (old → new) attribution replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub old: String,
    pub new: String,
}

impl Transition {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Whether a diff row's joined attribution strings are exactly this pair.
    pub fn matches(&self, old_attributions: &str, new_attributions: &str) -> bool {
        self.old == old_attributions && self.new == new_attributions
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.old, self.new)
    }
}

/// A suggested reversal of an allow-listed attribution change.
/// Reassigns `from_attribution` (current) back to `to_attribution`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixProposal {
    pub gene: String,
    pub accession: String,
    pub accession_type: String,
    pub abbreviation: Option<String>,
    pub from_attribution: String,
    pub to_attribution: String,
    pub statement: String,
}
