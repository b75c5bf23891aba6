use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("reading manifest {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One artifact the host produced during a build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum OutputEntry {
    Chunk {
        file_name: String,
        #[serde(default)]
        is_entry: bool,
    },
    Asset {
        file_name: String,
    },
}

impl OutputEntry {
    pub fn chunk(file_name: impl Into<String>, is_entry: bool) -> Self {
        Self::Chunk {
            file_name: file_name.into(),
            is_entry,
        }
    }

    pub fn asset(file_name: impl Into<String>) -> Self {
        Self::Asset {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Chunk { file_name, .. } | Self::Asset { file_name } => file_name,
        }
    }
}

/// Finalized outputs of one build, keyed the way the host keys them.
///
/// Iteration follows insertion order (document order when parsed from JSON);
/// tags are emitted in exactly this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct OutputBundle {
    entries: IndexMap<String, OutputEntry>,
}

impl OutputBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`. A replaced key keeps its first position.
    pub fn insert(&mut self, key: impl Into<String>, entry: OutputEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&OutputEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputEntry)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

impl<K: Into<String>> FromIterator<(K, OutputEntry)> for OutputBundle {
    fn from_iter<I: IntoIterator<Item = (K, OutputEntry)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, entry)| (key.into(), entry))
                .collect(),
        }
    }
}
