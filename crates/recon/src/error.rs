use std::fmt;

use crate::store::RelationName;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad transition, unknown report, etc.).
    ConfigValidation(String),
    /// A required input relation was never loaded.
    MissingRelation(RelationName),
    /// Missing required column in an input relation.
    MissingColumn { relation: RelationName, column: String },
    /// A CSV record could not be read.
    MalformedRow { relation: RelationName, line: u64, message: String },
    /// A gene or accession id is blank.
    EmptyId { relation: RelationName, line: u64, column: String },
    /// Two different gene/accession pairs would share one composite key.
    KeyCollision { snapshot: String, gene: String, accession: String, detail: String },
    /// Two catalog entries share a name.
    DuplicateReport(String),
    /// Report name is not usable as a file / sheet / table name.
    InvalidReportName(String),
}

impl ReconError {
    /// True for errors raised while loading input relations.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRelation(_) | Self::MissingColumn { .. } | Self::MalformedRow { .. } | Self::EmptyId { .. }
        )
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingRelation(relation) => {
                write!(f, "relation '{relation}' has not been loaded")
            }
            Self::MissingColumn { relation, column } => {
                write!(f, "relation '{relation}': missing column '{column}'")
            }
            Self::MalformedRow { relation, line, message } => {
                write!(f, "relation '{relation}', line {line}: {message}")
            }
            Self::EmptyId { relation, line, column } => {
                write!(f, "relation '{relation}', line {line}: column '{column}' is empty")
            }
            Self::KeyCollision { snapshot, gene, accession, detail } => {
                write!(
                    f,
                    "snapshot '{snapshot}': composite key collision for gene '{gene}', accession '{accession}': {detail}"
                )
            }
            Self::DuplicateReport(name) => write!(f, "report '{name}' is registered twice"),
            Self::InvalidReportName(name) => write!(
                f,
                "invalid report name '{name}' (expected lowercase letters, digits and '_')"
            ),
        }
    }
}

impl std::error::Error for ReconError {}
