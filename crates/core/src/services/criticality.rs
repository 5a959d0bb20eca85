//! Naming criticality classification.
//!
//! Criticality escalates with disagreement among candidates. An existing
//! custom name or a manual resolution short-circuits the escalation.

use std::collections::BTreeSet;

use crate::model::{Criticality, LabelCandidate};

/// Classify a candidate set.
///
/// Rules, first match wins:
/// 1. no candidates -> `NoSignal`
/// 2. custom name present -> `Named`
/// 3. manually resolved -> `Resolved`
/// 4. otherwise `Unresolved`, +1 if more than one distinct label text exists,
///    +1 more if the candidates sharing the top score disagree as well.
pub fn classify<'a, I>(candidates: I, has_custom_name: bool, is_resolved: bool) -> Criticality
where
    I: IntoIterator<Item = &'a LabelCandidate>,
{
    let candidates: Vec<&LabelCandidate> = candidates.into_iter().collect();
    let Some(top_score) = candidates.iter().map(|c| c.score).max() else {
        return Criticality::NoSignal;
    };
    if has_custom_name {
        return Criticality::Named;
    }
    if is_resolved {
        return Criticality::Resolved;
    }

    let mut criticality = Criticality::Unresolved;
    let distinct: BTreeSet<&str> = candidates.iter().map(|c| c.label_text.as_str()).collect();
    if distinct.len() > 1 {
        criticality = criticality.escalate();
        let top: BTreeSet<&str> = candidates
            .iter()
            .filter(|c| c.score == top_score)
            .map(|c| c.label_text.as_str())
            .collect();
        if top.len() > 1 {
            criticality = criticality.escalate();
        }
    }
    criticality
}
