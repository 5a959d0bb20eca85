//! Boundary to the remote matching service that supplies function labels.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::FunctionLabelRecord;

/// Labels grouped by remote function id. Functions without labels are absent.
pub type LabelIndex = BTreeMap<u64, Vec<FunctionLabelRecord>>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Label source unavailable: {0}")]
    Unavailable(String),
    #[error("Label source returned malformed data: {0}")]
    Malformed(String),
}

/// Supplier of label records for remote functions.
pub trait LabelSource {
    /// Fetch every label attached to any of `function_ids`.
    fn fetch_labels(&self, function_ids: &[u64]) -> Result<Vec<FunctionLabelRecord>, SourceError>;
}

/// Group label records by remote function id.
pub fn index_labels<I>(records: I) -> LabelIndex
where
    I: IntoIterator<Item = FunctionLabelRecord>,
{
    let mut index = LabelIndex::new();
    for record in records {
        index.entry(record.function_id).or_default().push(record);
    }
    index
}

/// Label source over a fixed set of records (imported labels, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticLabelSource {
    records: Vec<FunctionLabelRecord>,
}

impl StaticLabelSource {
    pub fn new(records: Vec<FunctionLabelRecord>) -> Self {
        Self { records }
    }
}

impl LabelSource for StaticLabelSource {
    fn fetch_labels(&self, function_ids: &[u64]) -> Result<Vec<FunctionLabelRecord>, SourceError> {
        let wanted: BTreeSet<u64> = function_ids.iter().copied().collect();
        Ok(self.records.iter().filter(|r| wanted.contains(&r.function_id)).cloned().collect())
    }
}
