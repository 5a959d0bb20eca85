use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of data brought into the project by an import.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Matches,
    Labels,
    Names,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Matches => "matches",
            ImportKind::Labels => "labels",
            ImportKind::Names => "names",
        }
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matches" => Ok(ImportKind::Matches),
            "labels" => Ok(ImportKind::Labels),
            "names" => Ok(ImportKind::Names),
            other => Err(format!("unknown import kind '{other}'")),
        }
    }
}

/// Bookkeeping for one import into the project database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportRecord {
    pub kind: ImportKind,
    /// Source file, as given on the command line.
    pub source_path: String,
    /// Optional content hash of the source file (SHA-256).
    pub source_hash: Option<String>,
    pub records: usize,
    pub imported_at: String,
}

/// A function name as known to the host program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionNameRecord {
    pub offset: u64,
    pub name: String,
}
