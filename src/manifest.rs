//! Manifest loading and file identifiers.
//!
//! A manifest is a JSON document listing the remote files to fetch:
//!
//! ```json
//! {"files": [{"projectID": 1, "fileID": 10}]}
//! ```
//!
//! Unknown fields (modpack name, `required`, ...) are ignored.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest source could not be read.
    #[error("failed to read manifest from {source_name}: {source}")]
    Io {
        /// Path of the manifest, or `<stdin>`.
        source_name: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON or does not have the expected shape.
    #[error("malformed manifest from {source_name}: {source}")]
    Parse {
        /// Path of the manifest, or `<stdin>`.
        source_name: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Identifies one remote file by project and file id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct FileIdentifier {
    /// Upstream project (addon) id.
    #[serde(rename = "projectID")]
    pub project_id: u64,
    /// Upstream file id within the project.
    #[serde(rename = "fileID")]
    pub file_id: u64,
}

impl FileIdentifier {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(project_id: u64, file_id: u64) -> Self {
        Self {
            project_id,
            file_id,
        }
    }
}

impl fmt::Display for FileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.file_id)
    }
}

/// The ordered list of files to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    /// Files in manifest order.
    pub files: Vec<FileIdentifier>,
}

impl Manifest {
    /// Loads a manifest from a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be read and
    /// [`ManifestError::Parse`] if its content is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let source_name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            source_name: source_name.clone(),
            source,
        })?;
        Self::parse(&text, &source_name)
    }

    /// Loads a manifest from any reader (typically stdin).
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] on read failure and
    /// [`ManifestError::Parse`] on malformed content.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ManifestError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|source| ManifestError::Io {
                source_name: "<stdin>".to_string(),
                source,
            })?;
        Self::parse(&text, "<stdin>")
    }

    /// Loads from `path` when given, otherwise from the supplied reader.
    ///
    /// # Errors
    ///
    /// See [`Manifest::load`] and [`Manifest::from_reader`].
    pub fn load_or_read<R: Read>(path: Option<&PathBuf>, reader: R) -> Result<Self, ManifestError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_reader(reader),
        }
    }

    fn parse(text: &str, source_name: &str) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(text).map_err(|source| ManifestError::Parse {
            source_name: source_name.to_string(),
            source,
        })?;
        debug!(source = source_name, files = manifest.files.len(), "manifest loaded");
        Ok(manifest)
    }

    /// Returns the number of listed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the manifest lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Drops repeated identifiers, keeping the first occurrence of each.
    ///
    /// Returns the number of entries removed.
    pub fn dedup(&mut self) -> usize {
        let before = self.files.len();
        let mut seen = HashSet::with_capacity(before);
        self.files.retain(|id| {
            let first = seen.insert(*id);
            if !first {
                warn!(identifier = %id, "duplicate manifest entry ignored");
            }
            first
        });
        before - self.files.len()
    }
}
