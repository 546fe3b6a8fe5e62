//! Snapshot normalization: composite keys and per-key attribution sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReconError;
use crate::model::{GenePair, LinkRecord, Side};

/// Separator between gene and accession in a composite key.
/// Source ids are structured identifiers that never contain it.
pub const KEY_SEPARATOR: char = '|';

/// Attributions asserting one composite key within one snapshot.
pub type AttributionSet = BTreeSet<String>;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable set of link records captured at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    side: Side,
    records: Vec<LinkRecord>,
}

impl Snapshot {
    /// Deduplicate and canonically order `records`.
    pub fn new<I>(side: Side, records: I) -> Self
    where
        I: IntoIterator<Item = LinkRecord>,
    {
        let records: BTreeSet<LinkRecord> = records.into_iter().collect();
        Self {
            side,
            records: records.into_iter().collect(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }
}

// ---------------------------------------------------------------------------
// Composite key
// ---------------------------------------------------------------------------

/// Join key over (gene, accession), ignoring attribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Fails when either id contains the separator, since the key would no
    /// longer identify a single pair.
    pub fn new(side: Side, gene: &str, accession: &str) -> Result<Self, ReconError> {
        for (what, id) in [("gene", gene), ("accession", accession)] {
            if id.contains(KEY_SEPARATOR) {
                return Err(ReconError::KeyCollision {
                    snapshot: side.to_string(),
                    gene: gene.into(),
                    accession: accession.into(),
                    detail: format!("{what} id contains the key separator '{KEY_SEPARATOR}'"),
                });
            }
        }
        Ok(Self(format!("{gene}{KEY_SEPARATOR}{accession}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exact (gene, accession, attribution) identity of a link assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub gene: String,
    pub accession: String,
    pub attribution: String,
}

impl Triple {
    pub fn of(record: &LinkRecord) -> Self {
        Self {
            gene: record.gene.clone(),
            accession: record.accession.clone(),
            attribution: record.attribution.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NormalizedSnapshot {
    snapshot: Snapshot,
    /// Composite key of each record, parallel to `snapshot.records()`.
    keys: Vec<CompositeKey>,
    attributions: BTreeMap<CompositeKey, AttributionSet>,
    pairs: BTreeMap<CompositeKey, GenePair>,
    triples: BTreeSet<Triple>,
}

impl NormalizedSnapshot {
    pub fn side(&self) -> Side {
        self.snapshot.side()
    }

    pub fn records(&self) -> &[LinkRecord] {
        self.snapshot.records()
    }

    /// Records paired with the composite key they were indexed under.
    pub fn keyed_records(&self) -> impl Iterator<Item = (&CompositeKey, &LinkRecord)> {
        self.keys.iter().zip(self.snapshot.records())
    }

    pub fn attributions(&self) -> &BTreeMap<CompositeKey, AttributionSet> {
        &self.attributions
    }

    pub fn pairs(&self) -> &BTreeMap<CompositeKey, GenePair> {
        &self.pairs
    }

    pub fn contains_key(&self, key: &CompositeKey) -> bool {
        self.attributions.contains_key(key)
    }

    pub fn attribution_set(&self, key: &CompositeKey) -> Option<&AttributionSet> {
        self.attributions.get(key)
    }

    pub fn contains_triple(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Records of this snapshot for one gene/accession pair, canonical order.
    pub fn records_for<'a>(&'a self, gene: &'a str, accession: &'a str) -> impl Iterator<Item = &'a LinkRecord> + 'a {
        self.records()
            .iter()
            .filter(move |r| r.gene == gene && r.accession == accession)
    }
}

/// Build composite-key indexes over a snapshot.
pub fn normalize(snapshot: Snapshot) -> Result<NormalizedSnapshot, ReconError> {
    let side = snapshot.side();
    let mut attributions: BTreeMap<CompositeKey, AttributionSet> = BTreeMap::new();
    let mut pairs: BTreeMap<CompositeKey, GenePair> = BTreeMap::new();
    let mut triples = BTreeSet::new();
    let mut keys = Vec::with_capacity(snapshot.records().len());

    for record in snapshot.records() {
        let key = CompositeKey::new(side, &record.gene, &record.accession)?;

        let pair = pairs.entry(key.clone()).or_insert_with(|| GenePair {
            gene: record.gene.clone(),
            accession: record.accession.clone(),
        });
        if pair.gene != record.gene || pair.accession != record.accession {
            return Err(ReconError::KeyCollision {
                snapshot: side.to_string(),
                gene: record.gene.clone(),
                accession: record.accession.clone(),
                detail: format!(
                    "key '{key}' already belongs to gene '{}', accession '{}'",
                    pair.gene, pair.accession
                ),
            });
        }

        attributions
            .entry(key.clone())
            .or_default()
            .insert(record.attribution.clone());
        triples.insert(Triple::of(record));
        keys.push(key);
    }

    log::debug!(
        "normalized snapshot '{side}': {} record(s), {} pair(s), {} triple(s)",
        snapshot.records().len(),
        pairs.len(),
        triples.len()
    );

    Ok(NormalizedSnapshot {
        snapshot,
        keys,
        attributions,
        pairs,
        triples,
    })
}
