//! The layered kubeconfig store.
//!
//! Holds every loaded kubeconfig file in priority order (the first file listed in
//! `KUBECONFIG` wins) and routes reads, mutations and writes through
//! [`ConfigSnippet`]s to the file each piece of data came from.
//!
//! # Merge semantics
//!
//! The merged view is a shallow merge of top-level keys. Documents are folded from the
//! lowest priority to the highest so that earlier files overwrite later ones:
//!
//! ```text
//! KUBECONFIG=a:b
//!
//! a: current-context: dev           merged: current-context: dev
//! b: current-context: prod                  users: <b's users>
//!    users: [...]
//! ```
//!
//! Named lists (`contexts`, `users`, `clusters`) are *not* merged entry by entry; use
//! [`LayeredConfigStore::find_named`] to search every document in priority order.

use super::document::{ConfigDocument, ConfigSnippet, TreePath};
use crate::core::{OcAuthError, Result};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;
use tracing::debug;

/// Ordered collection of kubeconfig documents.
#[derive(Debug, Default)]
pub struct LayeredConfigStore {
    documents: Vec<ConfigDocument>,
}

impl LayeredConfigStore {
    /// Load every existing, non-empty path in `paths`, keeping their order.
    ///
    /// Paths that are empty or do not exist are skipped silently.
    ///
    /// # Errors
    ///
    /// [`OcAuthError::ConfigFileError`] if an existing file cannot be read or parsed.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            if path.as_os_str().is_empty() {
                continue;
            }
            if !path.exists() {
                debug!("Skipping missing kubeconfig {}", path.display());
                continue;
            }
            documents.push(ConfigDocument::load(path)?);
        }
        Ok(Self::from_documents(documents))
    }

    /// Build a store from documents already in priority order.
    #[must_use]
    pub const fn from_documents(documents: Vec<ConfigDocument>) -> Self {
        Self {
            documents,
        }
    }

    /// Number of loaded documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in priority order. Call again to restart.
    pub fn documents(&self) -> impl Iterator<Item = &ConfigDocument> + '_ {
        self.documents.iter()
    }

    /// A computed document holding the shallow merge of all top-level keys.
    ///
    /// The result is detached from the store: it can be read through
    /// [`ConfigDocument::root`] but never persisted.
    #[must_use]
    pub fn merged_view(&self) -> ConfigDocument {
        let mut merged = Mapping::new();
        for document in self.documents.iter().rev() {
            if let Value::Mapping(top) = document.tree() {
                for (key, value) in top {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        ConfigDocument::computed(Value::Mapping(merged))
    }

    /// The document a snippet points into.
    ///
    /// # Errors
    ///
    /// - [`OcAuthError::ComputedNotPersistable`] for snippets of the merged view
    /// - [`OcAuthError::DocumentNotFound`] if no loaded document shares its origin
    pub fn find_owning_document(&self, snippet: &ConfigSnippet) -> Result<&ConfigDocument> {
        self.position_of(snippet).map(|index| &self.documents[index])
    }

    fn position_of(&self, snippet: &ConfigSnippet) -> Result<usize> {
        if snippet.origin().is_computed() {
            return Err(OcAuthError::ComputedNotPersistable);
        }
        self.documents.iter().position(|document| document.is_origin_of(snippet)).ok_or_else(|| {
            OcAuthError::DocumentNotFound {
                origin: snippet.origin().to_string(),
            }
        })
    }

    fn owning_document_mut(&mut self, snippet: &ConfigSnippet) -> Result<&mut ConfigDocument> {
        let index = self.position_of(snippet)?;
        Ok(&mut self.documents[index])
    }

    /// Read the subtree behind a snippet.
    ///
    /// # Errors
    ///
    /// Fails if the owning document is gone or the path no longer resolves.
    pub fn get(&self, snippet: &ConfigSnippet) -> Result<&Value> {
        self.find_owning_document(snippet)?.get(snippet).ok_or_else(|| dangling(snippet))
    }

    /// Mutate the subtree behind a snippet in place.
    ///
    /// Marks both the owning document and the snippet dirty.
    ///
    /// # Errors
    ///
    /// Fails if the owning document is gone or the path no longer resolves.
    pub fn update<R>(
        &mut self,
        snippet: &mut ConfigSnippet,
        f: impl FnOnce(&mut Value) -> R,
    ) -> Result<R> {
        let document = self.owning_document_mut(snippet)?;
        document.update(snippet, f).ok_or_else(|| dangling(snippet))
    }

    /// Flag a snippet as holding unpersisted changes without touching its tree.
    ///
    /// # Errors
    ///
    /// Fails if the snippet has no owning document.
    pub fn mark_dirty(&self, snippet: &mut ConfigSnippet) -> Result<()> {
        self.find_owning_document(snippet)?.stamp_dirty(snippet);
        Ok(())
    }

    /// Write the document owning `snippet` if it has unpersisted changes.
    ///
    /// Writes when the document is dirty or the snippet was changed after the document
    /// was last written; otherwise does nothing. Clears the dirty flags either way.
    /// Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// - [`OcAuthError::ComputedNotPersistable`] for snippets of the merged view
    /// - [`OcAuthError::DocumentNotFound`] if no loaded document shares its origin
    /// - [`OcAuthError::ConfigFileError`] if the write fails
    pub fn persist(&mut self, snippet: &mut ConfigSnippet) -> Result<bool> {
        let document = self.owning_document_mut(snippet)?;
        let written = if document.needs_write(snippet) {
            document.persist()?;
            true
        } else {
            debug!("{} has no unpersisted changes", document.origin());
            false
        };
        snippet.mark_clean();
        Ok(written)
    }

    /// Find the first entry named `name` in the top-level list `list_key`.
    ///
    /// Documents are searched in priority order; within a document the first matching
    /// entry wins.
    #[must_use]
    pub fn find_named(&self, list_key: &str, name: &str) -> Option<ConfigSnippet> {
        self.documents.iter().find_map(|document| {
            let entries = document.tree().get(list_key)?.as_sequence()?;
            let index = entries
                .iter()
                .position(|entry| entry.get("name").and_then(Value::as_str) == Some(name))?;
            document.snippet(TreePath::root().key(list_key).index(index))
        })
    }

    /// Append `entry` to the list `list_key` of the highest-priority document.
    ///
    /// The list is created when missing (or null). The document is marked dirty and the
    /// returned snippet is dirty. Returns `None` when the store holds no document.
    ///
    /// # Errors
    ///
    /// [`OcAuthError::InvalidEntry`] if `list_key` exists but is not a sequence.
    pub fn append_named(&mut self, list_key: &str, entry: Value) -> Result<Option<ConfigSnippet>> {
        let Some(document) = self.documents.first_mut() else {
            return Ok(None);
        };

        // Checked up front so a rejected append leaves the document clean
        if document.tree().get(list_key).is_some_and(|list| !list.is_null() && !list.is_sequence()) {
            return Err(OcAuthError::InvalidEntry {
                entry: format!("'{list_key}' in {}", document.origin()),
                reason: "expected a list".to_string(),
            });
        }

        let mut root = document.root();
        let index = document
            .update(&mut root, |tree| {
                if !tree.is_mapping() {
                    *tree = Value::Mapping(Mapping::new());
                }
                let list = &mut tree[list_key];
                if !list.is_sequence() {
                    *list = Value::Sequence(Vec::new());
                }
                let entries = list.as_sequence_mut()?;
                entries.push(entry);
                Some(entries.len() - 1)
            })
            .flatten()
            .ok_or_else(|| dangling(&root))?;

        let mut snippet = document
            .snippet(TreePath::root().key(list_key).index(index))
            .ok_or_else(|| dangling(&root))?;
        document.stamp_dirty(&mut snippet);
        Ok(Some(snippet))
    }
}

fn dangling(snippet: &ConfigSnippet) -> OcAuthError {
    OcAuthError::InvalidEntry {
        entry: format!("{}{}", snippet.origin(), snippet.path()),
        reason: "no longer present in the document".to_string(),
    }
}
