//! Loading and atomically rewriting preference documents on disk.
//!
//! The store holds no state besides the output format. Every edit is a
//! load-mutate-save cycle against the given path; only one session edits a
//! path at a time, so no finer-grained locking is done here.

use std::fs;
use std::io::{BufWriter, Cursor, ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::document::PreferenceDocument;
use super::error::{PrefResult, PreferencesError};
use super::value::PrefValue;

/// Property-list encoding used when writing. Reading accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Xml,
    Binary,
}

/// How a load resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file existed and parsed (an empty file counts as an empty document).
    Parsed,
    /// No file at the path.
    NotFound,
    /// The file exists but could not be read as a property-list dictionary.
    Corrupt { reason: String },
}

/// Result of [`DocumentStore::load`]. Always carries a usable document.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub document: PreferenceDocument,
    pub status: LoadStatus,
}

impl Loaded {
    pub fn is_corrupt(&self) -> bool {
        matches!(self.status, LoadStatus::Corrupt { .. })
    }

    /// The corruption as an error value, for callers that want to surface it.
    pub fn corruption(&self, path: &Path) -> Option<PreferencesError> {
        match &self.status {
            LoadStatus::Corrupt { reason } => Some(PreferencesError::CorruptDocument {
                path: path.to_path_buf(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }

    fn empty(status: LoadStatus) -> Self {
        Self {
            document: PreferenceDocument::new(),
            status,
        }
    }
}

/// Reads and writes preference documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    format: DocumentFormat,
}

impl DocumentStore {
    pub fn new(format: DocumentFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Load the document at `path`.
    ///
    /// Never fails: a missing file gives an empty document with
    /// [`LoadStatus::NotFound`], an unreadable or unparseable one gives an
    /// empty document with [`LoadStatus::Corrupt`].
    pub fn load(&self, path: &Path) -> Loaded {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                crate::debug_event!("store", "not found", "{}", path.display());
                return Loaded::empty(LoadStatus::NotFound);
            }
            Err(e) => {
                tracing::warn!("[store] cannot read {}: {e}", path.display());
                return Loaded::empty(LoadStatus::Corrupt {
                    reason: e.to_string(),
                });
            }
        };

        if bytes.is_empty() {
            return Loaded::empty(LoadStatus::Parsed);
        }

        let parsed = plist::Value::from_reader(Cursor::new(bytes))
            .map_err(|e| e.to_string())
            .and_then(|value| PreferenceDocument::from_plist(value).map_err(|e| e.to_string()));

        match parsed {
            Ok(document) => {
                crate::debug_event!(
                    "store",
                    "loaded",
                    "{} keys from {}",
                    document.len(),
                    path.display()
                );
                Loaded {
                    document,
                    status: LoadStatus::Parsed,
                }
            }
            Err(reason) => {
                tracing::warn!("[store] corrupt document {}: {reason}", path.display());
                Loaded::empty(LoadStatus::Corrupt { reason })
            }
        }
    }

    /// Replace the file at `path` with `document`.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed over the target, so readers see either the old or the new
    /// complete file.
    pub fn save(&self, document: &PreferenceDocument, path: &Path) -> PrefResult<()> {
        let write_failure = |source: std::io::Error| PreferencesError::WriteFailure {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir).map_err(write_failure)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let value = document.to_plist();
            let encoded = match self.format {
                DocumentFormat::Xml => value.to_writer_xml(&mut writer),
                DocumentFormat::Binary => value.to_writer_binary(&mut writer),
            };
            encoded.map_err(|e| write_failure(std::io::Error::other(e)))?;
            writer.flush().map_err(write_failure)?;
        }
        temp.as_file().sync_all().map_err(write_failure)?;

        // Keep the permissions of the file being replaced.
        if let Ok(meta) = fs::metadata(path) {
            fs::set_permissions(temp.path(), meta.permissions()).map_err(write_failure)?;
        }

        temp.persist(path).map_err(|e| write_failure(e.error))?;

        crate::debug_event!(
            "store",
            "saved",
            "{} keys to {}",
            document.len(),
            path.display()
        );
        Ok(())
    }

    /// Set `key` to `value` in the file at `path`, returning the written document.
    pub fn set_value(
        &self,
        key: &str,
        value: PrefValue,
        path: &Path,
    ) -> PrefResult<PreferenceDocument> {
        let mut document = self.load_for_edit(path)?;
        document.set(key, value)?;
        self.save(&document, path)?;
        Ok(document)
    }

    /// Remove `key` from the file at `path`, returning the resulting document.
    ///
    /// Removing an absent key leaves the file untouched.
    pub fn delete_key(&self, key: &str, path: &Path) -> PrefResult<PreferenceDocument> {
        let mut document = self.load_for_edit(path)?;
        if document.remove(key).is_some() {
            self.save(&document, path)?;
        }
        Ok(document)
    }

    /// Replace the file at `path` with an empty document.
    ///
    /// Works on corrupt files too, since nothing from the old content is kept.
    pub fn clear_all(&self, path: &Path) -> PrefResult<PreferenceDocument> {
        let document = PreferenceDocument::new();
        self.save(&document, path)?;
        Ok(document)
    }

    /// Load for a read-modify-write cycle. A corrupt file is refused rather
    /// than silently replaced by a document holding only the new key.
    fn load_for_edit(&self, path: &Path) -> PrefResult<PreferenceDocument> {
        let loaded = self.load(path);
        match loaded.corruption(path) {
            Some(err) => Err(err),
            None => Ok(loaded.document),
        }
    }
}
