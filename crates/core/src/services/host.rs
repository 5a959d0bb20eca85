//! Host binary-analysis environment: function names, renaming, navigation.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Auto-generated name pattern used by IDA-style disassemblers.
pub const DEFAULT_NAME_PATTERN: &str = "sub_[0-9A-Fa-f]+";

static DEFAULT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&anchored(DEFAULT_NAME_PATTERN)).unwrap_or_else(|_| panic!("Invalid Regex"))
});

fn anchored(pattern: &str) -> String {
    format!("(?i)^(?:{pattern})$")
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("No function at offset 0x{0:x}")]
    UnknownFunction(u64),
    #[error("Host refused to rename 0x{offset:x} to '{name}': {reason}")]
    RenameRejected { offset: u64, name: String, reason: String },
    #[error("Invalid default name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Matcher for the host's default (auto-generated) function names.
///
/// The pattern is anchored on the whole name and matched case-insensitively.
#[derive(Debug, Clone)]
pub struct DefaultNamePattern {
    regex: Regex,
}

impl DefaultNamePattern {
    pub fn new(pattern: &str) -> Result<Self, HostError> {
        let regex = Regex::new(&anchored(pattern))
            .map_err(|source| HostError::InvalidPattern { pattern: pattern.to_string(), source })?;
        Ok(Self { regex })
    }

    pub fn is_default(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl Default for DefaultNamePattern {
    fn default() -> Self {
        Self { regex: DEFAULT_NAME_RE.clone() }
    }
}

/// Naming and navigation facilities of the host program.
pub trait FunctionHost {
    /// Current display name of the function at `offset`, if the host knows one.
    fn function_name(&self, offset: u64) -> Option<String>;

    /// Whether `name` follows the host's auto-generated naming pattern.
    fn is_default_name(&self, name: &str) -> bool;

    fn rename_function(&mut self, offset: u64, name: &str) -> Result<(), HostError>;

    fn jump_to(&mut self, offset: u64) -> Result<(), HostError>;

    /// A function counts as custom-named when its name is not auto-generated.
    ///
    /// Unknown functions are treated as unnamed.
    fn has_custom_name(&self, offset: u64) -> bool {
        match self.function_name(offset) {
            Some(name) => !self.is_default_name(&name),
            None => false,
        }
    }
}

/// Host backed by a plain offset -> name snapshot.
///
/// Used by the CLI (names imported into the project database) and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    names: BTreeMap<u64, String>,
    pattern: DefaultNamePattern,
    renamed: Vec<(u64, String)>,
    cursor: Option<u64>,
}

impl InMemoryHost {
    pub fn new(pattern: DefaultNamePattern) -> Self {
        Self { pattern, ..Self::default() }
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(|(offset, name)| (offset, name.into())));
        self
    }

    pub fn names(&self) -> &BTreeMap<u64, String> {
        &self.names
    }

    /// Renames applied through this host, in order.
    pub fn renamed(&self) -> &[(u64, String)] {
        &self.renamed
    }

    /// Offset of the last navigation request.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }
}

impl FunctionHost for InMemoryHost {
    fn function_name(&self, offset: u64) -> Option<String> {
        self.names.get(&offset).cloned()
    }

    fn is_default_name(&self, name: &str) -> bool {
        self.pattern.is_default(name)
    }

    fn rename_function(&mut self, offset: u64, name: &str) -> Result<(), HostError> {
        if name.trim().is_empty() {
            return Err(HostError::RenameRejected {
                offset,
                name: name.to_string(),
                reason: "empty name".into(),
            });
        }
        let slot = self.names.get_mut(&offset).ok_or(HostError::UnknownFunction(offset))?;
        *slot = name.to_string();
        self.renamed.push((offset, name.to_string()));
        Ok(())
    }

    fn jump_to(&mut self, offset: u64) -> Result<(), HostError> {
        if !self.names.contains_key(&offset) {
            return Err(HostError::UnknownFunction(offset));
        }
        self.cursor = Some(offset);
        Ok(())
    }
}
