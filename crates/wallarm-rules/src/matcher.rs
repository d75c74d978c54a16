//! Pure matching of remote rules against a local declaration.

use wallarm_core::{Condition, RuleFingerprint, RuleRecord, conditions_equal};

/// Result of matching one declaration against a candidate list.
#[derive(Debug, Default)]
pub struct MatchOutcome<'a> {
    /// One entry per satisfied fingerprint, in fingerprint order.
    pub matched: Vec<&'a RuleRecord>,
    /// Candidates nothing claimed.
    pub orphaned: Vec<&'a RuleRecord>,
    /// Indices of expected fingerprints no candidate satisfied.
    pub missing: Vec<usize>,
}

impl MatchOutcome<'_> {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    pub fn rule_ids(&self) -> Vec<i64> {
        self.matched.iter().map(|r| r.id).collect()
    }
}

/// Match `candidates` (in API order, newest first) against the expected
/// fingerprints and normalized conditions of a declaration.
///
/// For every fingerprint the first unclaimed candidate wins. A candidate
/// whose id is already known is accepted without comparing fields, as long
/// as it targets the same attack type.
pub fn match_rules<'a>(
    expected: &[RuleFingerprint],
    conditions: &[Condition],
    known_ids: &[i64],
    candidates: &'a [RuleRecord],
) -> MatchOutcome<'a> {
    let mut claimed = vec![false; candidates.len()];
    let mut matched = Vec::with_capacity(expected.len());
    let mut missing = Vec::new();

    for (index, fingerprint) in expected.iter().enumerate() {
        let known = candidates.iter().enumerate().find(|(i, record)| {
            !claimed[*i] && known_ids.contains(&record.id) && same_attack_type(fingerprint, record)
        });
        let found = known.or_else(|| {
            candidates.iter().enumerate().find(|(i, record)| {
                !claimed[*i]
                    && fingerprint.matches(record)
                    && conditions_equal(conditions, &record.action)
            })
        });
        match found {
            Some((i, record)) => {
                claimed[i] = true;
                matched.push(record);
            }
            None => missing.push(index),
        }
    }

    let orphaned = candidates
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(record, _)| record)
        .collect();

    MatchOutcome {
        matched,
        orphaned,
        missing,
    }
}

fn same_attack_type(fingerprint: &RuleFingerprint, record: &RuleRecord) -> bool {
    match &fingerprint.attack_type {
        Some(expected) => record.attack_type.as_deref() == Some(expected.as_str()),
        None => true,
    }
}
