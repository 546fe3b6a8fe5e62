// Property-based tests for snapshot reconciliation.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use linkdiff_recon::config::KeptFilter;
use linkdiff_recon::engine::attribution_delta;
use linkdiff_recon::fix::{attributions_replaced_counts, propose_fixes, DEFAULT_STATEMENT_TEMPLATE};
use linkdiff_recon::{normalize, CompositeKey, LinkRecord, NormalizedSnapshot, Reconciliation, Side, Snapshot, Transition};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small id pools so snapshots overlap often.
fn arb_record() -> impl Strategy<Value = LinkRecord> {
    (0..4u8, 0..4u8, 0..4u8, prop::bool::ANY).prop_map(|(g, a, p, refseq)| LinkRecord {
        gene: format!("ZDB-GENE-{g}"),
        accession: format!("AB00000{a}"),
        attribution: format!("ZDB-PUB-{p}"),
        accession_type: if refseq { "RefSeq".into() } else { "GenBank".into() },
        abbreviation: Some(format!("g{g}")),
    })
}

fn arb_records() -> impl Strategy<Value = Vec<LinkRecord>> {
    prop::collection::vec(arb_record(), 0..24)
}

fn normalized(side: Side, records: Vec<LinkRecord>) -> NormalizedSnapshot {
    normalize(Snapshot::new(side, records)).unwrap()
}

fn all_transitions() -> Vec<Transition> {
    let mut out = Vec::new();
    for a in 0..4 {
        for b in 0..4 {
            if a != b {
                out.push(Transition::new(format!("ZDB-PUB-{a}"), format!("ZDB-PUB-{b}")));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn lost_and_gained_are_disjoint(old in arb_records(), new in arb_records()) {
        let old = normalized(Side::Old, old);
        let new = normalized(Side::New, new);
        let keys: BTreeSet<&CompositeKey> = old.attributions().keys().chain(new.attributions().keys()).collect();
        let empty = BTreeSet::new();
        for key in keys {
            let (lost, gained) = attribution_delta(
                old.attribution_set(key).unwrap_or(&empty),
                new.attribution_set(key).unwrap_or(&empty),
            );
            for attribution in &lost {
                prop_assert!(!gained.contains(attribution), "{} both lost and gained for {}", attribution, key);
            }
        }
    }

    #[test]
    fn diff_rows_are_never_empty(old in arb_records(), new in arb_records()) {
        let old = normalized(Side::Old, old);
        let new = normalized(Side::New, new);
        for row in Reconciliation::new(&old, &new).old_vs_new() {
            prop_assert!(!(row.old_attributions.is_empty() && row.new_attributions.is_empty()));
        }
    }

    #[test]
    fn lost_pairs_are_absent_from_new(old in arb_records(), new in arb_records()) {
        let new_pairs: BTreeSet<(String, String)> =
            new.iter().map(|r| (r.gene.clone(), r.accession.clone())).collect();
        let old = normalized(Side::Old, old);
        let new = normalized(Side::New, new);
        for row in Reconciliation::new(&old, &new).pairs_lost() {
            prop_assert!(!new_pairs.contains(&(row.gene.clone(), row.accession.clone())));
        }
    }

    #[test]
    fn diff_sides_match_set_differences(old in arb_records(), new in arb_records()) {
        let old_triples: BTreeSet<(String, String, String)> =
            old.iter().map(|r| (r.gene.clone(), r.accession.clone(), r.attribution.clone())).collect();
        let new_triples: BTreeSet<(String, String, String)> =
            new.iter().map(|r| (r.gene.clone(), r.accession.clone(), r.attribution.clone())).collect();

        let old = normalized(Side::Old, old);
        let new = normalized(Side::New, new);
        let mut lost_from_diff = BTreeSet::new();
        let mut gained_from_diff = BTreeSet::new();
        for row in Reconciliation::new(&old, &new).old_vs_new() {
            for a in &row.old_attributions {
                lost_from_diff.insert((row.gene.clone(), row.accession.clone(), a.clone()));
            }
            for a in &row.new_attributions {
                gained_from_diff.insert((row.gene.clone(), row.accession.clone(), a.clone()));
            }
        }
        let expected_lost: BTreeSet<_> = old_triples.difference(&new_triples).cloned().collect();
        let expected_gained: BTreeSet<_> = new_triples.difference(&old_triples).cloned().collect();
        prop_assert_eq!(lost_from_diff, expected_lost);
        prop_assert_eq!(gained_from_diff, expected_gained);
    }

    #[test]
    fn reconciliation_is_idempotent(old in arb_records(), new in arb_records()) {
        let old_a = normalized(Side::Old, old.clone());
        let new_a = normalized(Side::New, new.clone());
        let mut old_rev = old;
        old_rev.reverse();
        let mut new_rev = new;
        new_rev.reverse();
        let old_b = normalized(Side::Old, old_rev);
        let new_b = normalized(Side::New, new_rev);

        let a = Reconciliation::new(&old_a, &new_a);
        let b = Reconciliation::new(&old_b, &new_b);
        prop_assert_eq!(a.pairs_lost(), b.pairs_lost());
        prop_assert_eq!(a.attributions_lost(), b.attributions_lost());
        prop_assert_eq!(a.attributions_kept(&KeptFilter::all()), b.attributions_kept(&KeptFilter::all()));
        prop_assert_eq!(a.old_vs_new(), b.old_vs_new());
        prop_assert_eq!(a.attributions_changed_counts(), b.attributions_changed_counts());
    }

    #[test]
    fn identical_snapshots_produce_empty_reports(records in arb_records()) {
        let old = normalized(Side::Old, records.clone());
        let new = normalized(Side::New, records);
        let recon = Reconciliation::new(&old, &new);
        prop_assert!(recon.pairs_lost().is_empty());
        prop_assert!(recon.attributions_lost().is_empty());
        prop_assert!(recon.old_vs_new().is_empty());
        prop_assert!(recon.attributions_changed_counts().is_empty());
        prop_assert!(attributions_replaced_counts(&recon.old_vs_new(), None).is_empty());
        prop_assert!(propose_fixes(&recon.old_vs_new(), &all_transitions(), &new, DEFAULT_STATEMENT_TEMPLATE).is_empty());
    }

    #[test]
    fn fix_proposals_are_single_valued_reversals(old in arb_records(), new in arb_records()) {
        let old = normalized(Side::Old, old);
        let new = normalized(Side::New, new);
        let recon = Reconciliation::new(&old, &new);
        let allowed = all_transitions();
        for fix in propose_fixes(&recon.old_vs_new(), &allowed, &new, DEFAULT_STATEMENT_TEMPLATE) {
            prop_assert!(!fix.from_attribution.contains(','));
            prop_assert!(!fix.to_attribution.contains(','));
            prop_assert!(allowed.contains(&Transition::new(fix.to_attribution.clone(), fix.from_attribution.clone())));
            prop_assert!(new.records_for(&fix.gene, &fix.accession).any(|r| r.attribution == fix.from_attribution));
        }
    }

    #[test]
    fn counts_sum_to_diff_rows(old in arb_records(), new in arb_records()) {
        let old = normalized(Side::Old, old);
        let new = normalized(Side::New, new);
        let recon = Reconciliation::new(&old, &new);
        let total: usize = recon.attributions_changed_counts().iter().map(|c| c.count).sum();
        prop_assert_eq!(total, recon.old_vs_new().len());
    }
}
