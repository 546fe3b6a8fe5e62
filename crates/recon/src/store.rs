//! Record Store: the three input relations, loaded verbatim.
//!
//! Relations are populated once from delimited text and are read-only
//! afterwards. `RecordStore::snapshot` is the only way the engine sees them.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::{AbbreviationColumns, LinkColumns};
use crate::error::ReconError;
use crate::model::{LinkRecord, Side, ATTRIBUTION_SEPARATOR};
use crate::normalize::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationName {
    OldLinks,
    NewLinks,
    Abbreviations,
}

impl RelationName {
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Old => Self::OldLinks,
            Side::New => Self::NewLinks,
        }
    }
}

impl std::fmt::Display for RelationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OldLinks => write!(f, "old_links"),
            Self::NewLinks => write!(f, "new_links"),
            Self::Abbreviations => write!(f, "abbreviations"),
        }
    }
}

/// One row of `OldLinks` / `NewLinks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRow {
    pub gene: String,
    pub accession: String,
    pub attribution: String,
    pub accession_type: String,
}

/// One row of `Abbreviations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbreviationRow {
    pub gene: String,
    pub abbreviation: String,
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

fn reader(csv_data: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes())
}

fn header_index(
    relation: RelationName,
    headers: &[String],
) -> impl Fn(&str) -> Result<usize, ReconError> + '_ {
    move |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            relation,
            column: name.into(),
        })
    }
}

fn read_headers(relation: RelationName, reader: &mut csv::Reader<&[u8]>) -> Result<Vec<String>, ReconError> {
    Ok(reader
        .headers()
        .map_err(|e| ReconError::MalformedRow {
            relation,
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect())
}

/// Load a link relation, keeping only the four mapped columns.
pub fn load_link_rows(
    relation: RelationName,
    csv_data: &str,
    columns: &LinkColumns,
) -> Result<Vec<LinkRow>, ReconError> {
    let mut reader = reader(csv_data);
    let headers = read_headers(relation, &mut reader)?;
    let idx = header_index(relation, &headers);

    let gene_idx = idx(&columns.gene)?;
    let accession_idx = idx(&columns.accession)?;
    let attribution_idx = idx(&columns.attribution)?;
    let accession_type_idx = idx(&columns.accession_type)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = i as u64 + 2;
        let record = record.map_err(|e| ReconError::MalformedRow {
            relation,
            line,
            message: e.to_string(),
        })?;
        let field = |at: usize| record.get(at).unwrap_or("").trim().to_string();

        let gene = field(gene_idx);
        if gene.is_empty() {
            return Err(ReconError::EmptyId { relation, line, column: columns.gene.clone() });
        }
        let accession = field(accession_idx);
        if accession.is_empty() {
            return Err(ReconError::EmptyId { relation, line, column: columns.accession.clone() });
        }

        // Attribution lists are reported comma-joined, so an id must be
        // non-blank and comma-free for the joined form to stay unambiguous.
        let attribution = field(attribution_idx);
        if attribution.is_empty() {
            return Err(ReconError::EmptyId { relation, line, column: columns.attribution.clone() });
        }
        if attribution.contains(ATTRIBUTION_SEPARATOR) {
            return Err(ReconError::MalformedRow {
                relation,
                line,
                message: format!(
                    "column '{}': attribution id '{attribution}' contains '{ATTRIBUTION_SEPARATOR}'",
                    columns.attribution
                ),
            });
        }

        rows.push(LinkRow {
            gene,
            accession,
            attribution,
            accession_type: field(accession_type_idx),
        });
    }

    log::debug!("loaded {} row(s) into '{relation}'", rows.len());
    Ok(rows)
}

/// Load the gene → abbreviation relation.
pub fn load_abbreviation_rows(
    csv_data: &str,
    columns: &AbbreviationColumns,
) -> Result<Vec<AbbreviationRow>, ReconError> {
    let relation = RelationName::Abbreviations;
    let mut reader = reader(csv_data);
    let headers = read_headers(relation, &mut reader)?;
    let idx = header_index(relation, &headers);

    let gene_idx = idx(&columns.gene)?;
    let abbreviation_idx = idx(&columns.abbreviation)?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i as u64 + 2;
        let record = record.map_err(|e| ReconError::MalformedRow {
            relation,
            line,
            message: e.to_string(),
        })?;
        let gene = record.get(gene_idx).unwrap_or("").trim().to_string();
        if gene.is_empty() {
            return Err(ReconError::EmptyId { relation, line, column: columns.gene.clone() });
        }
        rows.push(AbbreviationRow {
            gene,
            abbreviation: record.get(abbreviation_idx).unwrap_or("").trim().to_string(),
        });
    }

    log::debug!("loaded {} row(s) into '{relation}'", rows.len());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordStore {
    old_links: Option<Vec<LinkRow>>,
    new_links: Option<Vec<LinkRow>>,
    abbreviations: Option<BTreeMap<String, String>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows of `OldLinks` or `NewLinks`.
    pub fn insert_links(&mut self, side: Side, rows: Vec<LinkRow>) {
        match side {
            Side::Old => self.old_links = Some(rows),
            Side::New => self.new_links = Some(rows),
        }
    }

    /// Index the abbreviation relation by gene. A gene listed with two
    /// different abbreviations keeps the first one.
    pub fn insert_abbreviations(&mut self, rows: Vec<AbbreviationRow>) {
        let mut by_gene = BTreeMap::new();
        for row in rows {
            match by_gene.entry(row.gene) {
                Entry::Vacant(slot) => {
                    slot.insert(row.abbreviation);
                }
                Entry::Occupied(slot) => {
                    if *slot.get() != row.abbreviation {
                        log::warn!(
                            "gene '{}' has abbreviations '{}' and '{}'; keeping the first",
                            slot.key(),
                            slot.get(),
                            row.abbreviation
                        );
                    }
                }
            }
        }
        self.abbreviations = Some(by_gene);
    }

    pub fn links(&self, side: Side) -> Result<&[LinkRow], ReconError> {
        let rows = match side {
            Side::Old => self.old_links.as_ref(),
            Side::New => self.new_links.as_ref(),
        };
        rows.map(Vec::as_slice)
            .ok_or(ReconError::MissingRelation(RelationName::for_side(side)))
    }

    pub fn abbreviation(&self, gene: &str) -> Result<Option<&str>, ReconError> {
        let index = self
            .abbreviations
            .as_ref()
            .ok_or(ReconError::MissingRelation(RelationName::Abbreviations))?;
        Ok(index.get(gene).map(String::as_str))
    }

    /// Join one link relation with `Abbreviations` (left join on gene)
    /// into an immutable, deduplicated snapshot.
    pub fn snapshot(&self, side: Side) -> Result<Snapshot, ReconError> {
        let links = self.links(side)?;
        let abbreviations = self
            .abbreviations
            .as_ref()
            .ok_or(ReconError::MissingRelation(RelationName::Abbreviations))?;
        let mut records = BTreeSet::new();
        for row in links {
            let abbreviation = abbreviations.get(&row.gene).cloned();
            records.insert(LinkRecord {
                gene: row.gene.clone(),
                accession: row.accession.clone(),
                attribution: row.attribution.clone(),
                accession_type: row.accession_type.clone(),
                abbreviation,
            });
        }
        if records.len() < links.len() {
            log::debug!(
                "snapshot '{side}': {} duplicate row(s) collapsed",
                links.len() - records.len()
            );
        }
        Ok(Snapshot::new(side, records))
    }
}
