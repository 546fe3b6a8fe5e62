use std::collections::{BTreeMap, HashMap};

use crate::config::KeptFilter;
use crate::model::{DiffRecord, GenePair, LinkRecord, TransitionCount};
use crate::normalize::{AttributionSet, CompositeKey, NormalizedSnapshot, Triple};

/// Classifies every (gene, accession, attribution) triple across two
/// normalized snapshots. Every operation is pure and deterministic.
#[derive(Debug, Clone, Copy)]
pub struct Reconciliation<'a> {
    old: &'a NormalizedSnapshot,
    new: &'a NormalizedSnapshot,
}

impl<'a> Reconciliation<'a> {
    pub fn new(old: &'a NormalizedSnapshot, new: &'a NormalizedSnapshot) -> Self {
        Self { old, new }
    }

    pub fn old(&self) -> &'a NormalizedSnapshot {
        self.old
    }

    pub fn new_snapshot(&self) -> &'a NormalizedSnapshot {
        self.new
    }

    /// Old records whose gene/accession pair is absent from New under any
    /// attribution.
    pub fn pairs_lost(&self) -> Vec<LinkRecord> {
        self.select_old(|_, key| !self.new.contains_key(key))
    }

    /// Old records whose exact (gene, accession, attribution) triple is
    /// absent from New, even if the pair survives under another attribution.
    pub fn attributions_lost(&self) -> Vec<LinkRecord> {
        self.select_old(|record, _| !self.new.contains_triple(&Triple::of(record)))
    }

    /// Old records whose triple survives verbatim in New, restricted to the
    /// attribution ids of interest.
    pub fn attributions_kept(&self, filter: &KeptFilter) -> Vec<LinkRecord> {
        self.select_old(|record, _| {
            filter.includes(&record.attribution) && self.new.contains_triple(&Triple::of(record))
        })
    }

    /// Per-key attribution movement across the union of keys. Only lost and
    /// gained attributions are reported; unchanged keys produce no row.
    pub fn old_vs_new(&self) -> Vec<DiffRecord> {
        let empty = AttributionSet::new();
        // Every attribution key has a pair entry; old wins where both sides
        // know the key, which is the same pair by construction.
        let mut pairs: BTreeMap<&CompositeKey, &GenePair> = self.new.pairs().iter().collect();
        pairs.extend(self.old.pairs());

        let mut rows = Vec::new();
        for (key, pair) in pairs {
            let old_set = self.old.attribution_set(key).unwrap_or(&empty);
            let new_set = self.new.attribution_set(key).unwrap_or(&empty);
            let (lost, gained) = attribution_delta(old_set, new_set);
            if lost.is_empty() && gained.is_empty() {
                continue;
            }

            rows.push(DiffRecord {
                gene: pair.gene.clone(),
                accession: pair.accession.clone(),
                old_attributions: lost,
                new_attributions: gained,
            });
        }

        rows.sort_by(|a, b| (&a.accession, &a.gene).cmp(&(&b.accession, &b.gene)));
        rows
    }

    /// Frequency of each (old, new) attribution-string pair in `old_vs_new`.
    pub fn attributions_changed_counts(&self) -> Vec<TransitionCount> {
        count_transitions(&self.old_vs_new(), |_| true)
    }

    fn select_old<F>(&self, keep: F) -> Vec<LinkRecord>
    where
        F: Fn(&LinkRecord, &CompositeKey) -> bool,
    {
        let mut rows: Vec<LinkRecord> = self
            .old
            .keyed_records()
            .filter(|&(key, record)| keep(record, key))
            .map(|(_, record)| record.clone())
            .collect();
        rows.sort_by(|a, b| a.report_key().cmp(&b.report_key()));
        rows
    }
}

/// `(old \ new, new \ old)`, each in ascending order.
pub fn attribution_delta(old: &AttributionSet, new: &AttributionSet) -> (Vec<String>, Vec<String>) {
    let lost = old.difference(new).cloned().collect();
    let gained = new.difference(old).cloned().collect();
    (lost, gained)
}

/// Group diff rows by their joined (old, new) strings. Ordered by count
/// descending, then old, then new.
pub fn count_transitions<F>(rows: &[DiffRecord], include: F) -> Vec<TransitionCount>
where
    F: Fn(&DiffRecord) -> bool,
{
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for row in rows.iter().filter(|r| include(r)) {
        *counts.entry((row.old_joined(), row.new_joined())).or_insert(0) += 1;
    }

    let mut table: Vec<TransitionCount> = counts
        .into_iter()
        .map(|((old_attributions, new_attributions), count)| TransitionCount {
            old_attributions,
            new_attributions,
            count,
        })
        .collect();
    table.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.old_attributions.cmp(&b.old_attributions))
            .then_with(|| a.new_attributions.cmp(&b.new_attributions))
    });
    table
}
