//! Sticky per-function label selection.
//!
//! Values stored here are always either a candidate string produced by the
//! aggregator (`"score|label"`) or one of the two sentinels:
//! [`NO_CHOICE`] (`"-"`, default) and [`CLEARED_CHOICE`] (`"-|-"`, cleared).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CLEARED_CHOICE, NO_CHOICE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionParseError {
    #[error("Selection '{0}' has no score|label separator")]
    MissingSeparator(String),
    #[error("Selection '{0}' has a non-numeric score")]
    InvalidScore(String),
}

/// A selection string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChoice<'a> {
    pub score: i64,
    pub label: &'a str,
}

/// Split `"score|label"`. The label keeps any further `|` characters.
pub fn parse_choice(choice: &str) -> Result<ParsedChoice<'_>, SelectionParseError> {
    let (score, label) = choice
        .split_once('|')
        .ok_or_else(|| SelectionParseError::MissingSeparator(choice.to_string()))?;
    let score = score
        .trim()
        .parse::<i64>()
        .map_err(|_| SelectionParseError::InvalidScore(choice.to_string()))?;
    Ok(ParsedChoice { score, label })
}

/// Numeric score prefix of a selection string, if it carries one.
pub fn choice_score(choice: &str) -> Option<i64> {
    parse_choice(choice).ok().map(|parsed| parsed.score)
}

/// Whether a stored value is one of the sentinels rather than a candidate.
pub fn is_sentinel(choice: &str) -> bool {
    choice == NO_CHOICE || choice == CLEARED_CHOICE
}

/// Result of the global (de)select toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "functions", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Every visible function was set to the cleared sentinel.
    Deselected(usize),
    /// All explicit choices were forgotten; defaults apply again.
    Reset(usize),
}

/// Offset -> selected choice string, kept across recomputations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    entries: BTreeMap<u64, String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    pub fn get(&self, offset: u64) -> Option<&str> {
        self.entries.get(&offset).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.entries.iter().map(|(offset, value)| (*offset, value.as_str()))
    }

    /// Carry the analyst's prior choice for one displayed row forward.
    ///
    /// - no prior entry: adopt what is displayed;
    /// - displayed is the default `"-"`: keep the prior entry;
    /// - displayed differs from the prior entry: the analyst changed it, adopt it;
    /// - otherwise keep the prior entry.
    ///
    /// A result whose score prefix is below `threshold` is forced to `"-|-"`.
    pub fn reconcile_row(&mut self, offset: u64, displayed: &str, threshold: i64) -> String {
        let adopted = match self.entries.get(&offset) {
            None => displayed.to_string(),
            Some(prior) if displayed == NO_CHOICE => prior.clone(),
            Some(prior) if displayed != prior => displayed.to_string(),
            Some(prior) => prior.clone(),
        };
        let value = match choice_score(&adopted) {
            Some(score) if score < threshold => CLEARED_CHOICE.to_string(),
            _ => adopted,
        };
        self.entries.insert(offset, value.clone());
        value
    }

    /// Clear a stored candidate that is no longer offered for its row.
    ///
    /// Returns true when the entry was changed.
    pub fn invalidate_missing(&mut self, offset: u64, offered: &[String]) -> bool {
        match self.entries.get_mut(&offset) {
            Some(value) if !is_sentinel(value) && !offered.iter().any(|c| c == value) => {
                *value = CLEARED_CHOICE.to_string();
                true
            }
            _ => false,
        }
    }

    /// Set every given offset to the cleared sentinel.
    pub fn deselect_all(&mut self, visible_offsets: &[u64]) {
        for offset in visible_offsets {
            self.entries.insert(*offset, CLEARED_CHOICE.to_string());
        }
    }

    /// Forget every explicit choice.
    pub fn select_all(&mut self) {
        self.entries.clear();
    }

    /// Deselect when any visible row still holds something other than the
    /// cleared sentinel; otherwise reset the whole map.
    pub fn toggle_all(&mut self, visible_offsets: &[u64]) -> ToggleOutcome {
        let any_selected = visible_offsets
            .iter()
            .any(|offset| self.get(*offset).unwrap_or(NO_CHOICE) != CLEARED_CHOICE);
        if any_selected {
            self.deselect_all(visible_offsets);
            ToggleOutcome::Deselected(visible_offsets.len())
        } else {
            self.select_all();
            ToggleOutcome::Reset(visible_offsets.len())
        }
    }
}

impl FromIterator<(u64, String)> for SelectionState {
    fn from_iter<T: IntoIterator<Item = (u64, String)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
