//! Fix Proposer: reversal candidates for allow-listed attribution changes.
//!
//! Proposals are text for an operator to review and apply elsewhere;
//! nothing here executes them.

use crate::engine::count_transitions;
use crate::model::{DiffRecord, FixProposal, Transition, TransitionCount};
use crate::normalize::NormalizedSnapshot;

/// Reassigns the attribution only where the link row for this
/// gene/accession pair currently carries `{from}`.
pub const DEFAULT_STATEMENT_TEMPLATE: &str = "update record_attribution \
set recattrib_source_zdb_id = '{to}' \
where recattrib_source_zdb_id = '{from}' \
and recattrib_data_zdb_id in (select dblink_zdb_id from db_link \
where dblink_linked_recid = '{gene}' and dblink_acc_num = '{accession}');";

const PLACEHOLDERS: [&str; 5] = ["gene", "accession", "accession_type", "from", "to"];

/// Placeholder names in `template` that `render_statement` cannot fill.
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    let mut unknown = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        let name = &after[..close];
        if !PLACEHOLDERS.contains(&name) && !unknown.iter().any(|u| u == name) {
            unknown.push(name.to_string());
        }
        rest = &after[close + 1..];
    }
    unknown
}

/// Fill a statement template; values have single quotes doubled.
/// Single pass, so ids that happen to contain `{...}` are never expanded.
pub fn render_statement(template: &str, proposal: &FixProposal) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            rest = &rest[open..];
            break;
        };
        let value = match &after[..close] {
            "gene" => Some(&proposal.gene),
            "accession" => Some(&proposal.accession),
            "accession_type" => Some(&proposal.accession_type),
            "from" => Some(&proposal.from_attribution),
            "to" => Some(&proposal.to_attribution),
            _ => None,
        };
        match value {
            Some(v) => out.push_str(&v.replace('\'', "''")),
            None => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Single-valued (old, new) pair of a diff row, if it has one on each side.
fn single_transition(row: &DiffRecord) -> Option<(&str, &str)> {
    match (row.old_attributions.as_slice(), row.new_attributions.as_slice()) {
        ([old], [new]) => Some((old.as_str(), new.as_str())),
        _ => None,
    }
}

/// One proposal per diff row whose single-valued transition is allow-listed.
/// Rows with several attributions on either side name no unambiguous target
/// and are skipped.
pub fn propose_fixes(
    diff: &[DiffRecord],
    allowed: &[Transition],
    new: &NormalizedSnapshot,
    template: &str,
) -> Vec<FixProposal> {
    let mut proposals = Vec::new();
    let mut ambiguous = 0usize;

    for row in diff {
        let Some((old_attr, new_attr)) = single_transition(row) else {
            if allowed
                .iter()
                .any(|t| row.old_attributions.contains(&t.old) && row.new_attributions.contains(&t.new))
            {
                ambiguous += 1;
            }
            continue;
        };
        if !allowed.iter().any(|t| t.matches(old_attr, new_attr)) {
            continue;
        }

        let current = new
            .records_for(&row.gene, &row.accession)
            .find(|r| r.attribution == new_attr);
        let mut proposal = FixProposal {
            gene: row.gene.clone(),
            accession: row.accession.clone(),
            accession_type: current.map(|r| r.accession_type.clone()).unwrap_or_default(),
            abbreviation: current.and_then(|r| r.abbreviation.clone()),
            from_attribution: new_attr.to_string(),
            to_attribution: old_attr.to_string(),
            statement: String::new(),
        };
        proposal.statement = render_statement(template, &proposal);
        proposals.push(proposal);
    }

    if ambiguous > 0 {
        log::info!("{ambiguous} multi-valued attribution change(s) excluded from fix proposals");
    }
    proposals
}

/// Changed-attribution counts without the already-handled replacement.
pub fn attributions_replaced_counts(diff: &[DiffRecord], excluded: Option<&Transition>) -> Vec<TransitionCount> {
    count_transitions(diff, |row| match excluded {
        Some(t) => !t.matches(&row.old_joined(), &row.new_joined()),
        None => true,
    })
}
