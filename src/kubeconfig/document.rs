//! Parsed kubeconfig documents and the snippets that point into them.
//!
//! A [`ConfigDocument`] owns the YAML tree of exactly one file. A [`ConfigSnippet`] never
//! owns tree memory: it records which document it belongs to ([`Origin`]) and where in
//! that document's tree its subtree lives ([`TreePath`]). Reads and mutations go through
//! the owning document, so a change made through a snippet is a change to the document.
//!
//! The [`Origin::Computed`] sentinel marks the in-memory merged view produced by
//! [`LayeredConfigStore::merged_view`](super::LayeredConfigStore::merged_view). Such a
//! document is never dirty and refuses to be persisted.

use super::layout;
use crate::core::{OcAuthError, Result};
use crate::utils::fs::safe_write;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A file on disk, identified by the path it was loaded from
    File(PathBuf),
    /// The merged view; exists only in memory
    Computed,
}

impl Origin {
    /// Path of the backing file, `None` for the computed view.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Computed => None,
        }
    }

    /// Whether this is the merged, non-persistable view.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(self, Self::Computed)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Computed => f.write_str("COMPUTED"),
        }
    }
}

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Mapping key
    Key(String),
    /// Sequence index
    Index(usize),
}

/// Location of a subtree, relative to a document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePath(Vec<Segment>);

impl TreePath {
    /// The document root.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// This path extended by a mapping key.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.into()));
        Self(segments)
    }

    /// This path extended by a sequence index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// Follow this path from `node`.
    #[must_use]
    pub fn resolve<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(node, |node, segment| match segment {
            Segment::Key(key) => node.get(key.as_str()),
            Segment::Index(index) => node.get(*index),
        })
    }

    /// Follow this path from `node`, mutably.
    pub fn resolve_mut<'a>(&self, node: &'a mut Value) -> Option<&'a mut Value> {
        self.0.iter().try_fold(node, |node, segment| match segment {
            Segment::Key(key) => node.get_mut(key.as_str()),
            Segment::Index(index) => node.get_mut(*index),
        })
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => write!(f, "/{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// An in-memory kubeconfig file.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    origin: Origin,
    tree: Value,
    // Text and tree as of the last load or write; edits are spliced into this text.
    source: Option<String>,
    pristine: Value,
    dirty: bool,
    // Bumped on every write; lets a snippet tell whether its change already hit disk.
    generation: u64,
}

impl ConfigDocument {
    /// Parse the file at `path`.
    ///
    /// A file that is empty (or holds only comments) loads as an empty mapping.
    ///
    /// # Errors
    ///
    /// [`OcAuthError::ConfigFileError`] if the file cannot be read, is not valid YAML, or
    /// its top level is not a mapping.
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |reason: String| OcAuthError::ConfigFileError {
            path: path.display().to_string(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let tree = if content.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            match serde_yaml::from_str::<Value>(&content).map_err(|e| config_error(e.to_string()))? {
                Value::Null => Value::Mapping(Mapping::new()),
                tree @ Value::Mapping(_) => tree,
                _ => return Err(config_error("top level must be a mapping".to_string())),
            }
        };

        debug!("Loaded kubeconfig {}", path.display());
        let mut document = Self::from_tree(Origin::File(path.to_path_buf()), tree);
        document.source = Some(content);
        Ok(document)
    }

    /// Wrap an already-parsed tree.
    ///
    /// Without source text, writes render the whole tree.
    #[must_use]
    pub fn from_tree(origin: Origin, tree: Value) -> Self {
        Self {
            origin,
            pristine: tree.clone(),
            tree,
            source: None,
            dirty: false,
            generation: 0,
        }
    }

    /// A non-persistable document holding a computed tree.
    #[must_use]
    pub fn computed(tree: Value) -> Self {
        Self::from_tree(Origin::Computed, tree)
    }

    /// Where this document came from.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The whole tree.
    #[must_use]
    pub const fn tree(&self) -> &Value {
        &self.tree
    }

    /// Whether this document has changes that are not on disk yet.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag unpersisted changes. No-op for the computed view.
    pub fn mark_dirty(&mut self) {
        if !self.origin.is_computed() {
            self.dirty = true;
        }
    }

    /// Whether `snippet` points into this document.
    #[must_use]
    pub fn is_origin_of(&self, snippet: &ConfigSnippet) -> bool {
        self.origin == snippet.origin
    }

    /// A snippet covering the whole tree.
    #[must_use]
    pub fn root(&self) -> ConfigSnippet {
        ConfigSnippet::new(self, TreePath::root())
    }

    /// A snippet for the subtree at `path`, if it exists.
    #[must_use]
    pub fn snippet(&self, path: TreePath) -> Option<ConfigSnippet> {
        path.resolve(&self.tree)?;
        Some(ConfigSnippet::new(self, path))
    }

    /// Read the subtree a snippet points at.
    ///
    /// Returns `None` when the snippet belongs to another document or its path no
    /// longer exists.
    #[must_use]
    pub fn get(&self, snippet: &ConfigSnippet) -> Option<&Value> {
        if !self.is_origin_of(snippet) {
            return None;
        }
        snippet.path.resolve(&self.tree)
    }

    /// Mutate the subtree a snippet points at, marking both document and snippet dirty.
    ///
    /// Returns `None` when the snippet does not resolve in this document.
    pub fn update<R>(
        &mut self,
        snippet: &mut ConfigSnippet,
        f: impl FnOnce(&mut Value) -> R,
    ) -> Option<R> {
        if !self.is_origin_of(snippet) {
            return None;
        }
        let node = snippet.path.resolve_mut(&mut self.tree)?;
        let result = f(node);
        self.mark_dirty();
        self.stamp_dirty(snippet);
        Some(result)
    }

    /// Flag a snippet of this document as holding unpersisted changes.
    pub fn stamp_dirty(&self, snippet: &mut ConfigSnippet) {
        if !self.origin.is_computed() {
            snippet.dirty = true;
            snippet.generation = self.generation;
        }
    }

    /// Whether persisting `snippet` has to write this document.
    ///
    /// True when the document is dirty, or when the snippet was changed after the last
    /// write of the document.
    #[must_use]
    pub fn needs_write(&self, snippet: &ConfigSnippet) -> bool {
        self.dirty || (snippet.dirty && snippet.generation == self.generation)
    }

    /// The YAML text the next write produces.
    ///
    /// A loaded document keeps its text outside the entries changed since the last load
    /// or write, so comments, quoting and flow style survive there (see
    /// [`layout`](super::layout)). When the edited text would not parse back to the
    /// current tree, the whole tree is rendered instead.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_yaml(&self) -> Result<String> {
        if let Some(source) = &self.source {
            if self.tree == self.pristine {
                return Ok(source.clone());
            }
            match layout::splice(source, &self.pristine, &self.tree) {
                Some(text) if parses_to(&text, &self.tree) => return Ok(text),
                _ => warn!("Cannot keep the layout of {}, rewriting it in full", self.origin),
            }
        }
        Ok(serde_yaml::to_string(&self.tree)?)
    }

    /// Write the tree back to its file and clear the dirty flag.
    ///
    /// # Errors
    ///
    /// - [`OcAuthError::ComputedNotPersistable`] for the merged view
    /// - [`OcAuthError::ConfigFileError`] if the file cannot be written
    pub fn persist(&mut self) -> Result<()> {
        let Origin::File(path) = &self.origin else {
            return Err(OcAuthError::ComputedNotPersistable);
        };

        info!("Writing file {}", path.display());
        let content = self.to_yaml()?;
        safe_write(path, &content).map_err(|e| OcAuthError::ConfigFileError {
            path: path.display().to_string(),
            reason: format!("{e:#}"),
        })?;

        self.source = Some(content);
        self.pristine = self.tree.clone();
        self.dirty = false;
        self.generation += 1;
        Ok(())
    }
}

fn parses_to(text: &str, tree: &Value) -> bool {
    serde_yaml::from_str::<Value>(text).is_ok_and(|parsed| parsed == *tree)
}

/// A route to a subtree of one specific document.
///
/// Cloning a snippet clones the route, never the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnippet {
    origin: Origin,
    path: TreePath,
    dirty: bool,
    generation: u64,
}

impl ConfigSnippet {
    fn new(owner: &ConfigDocument, path: TreePath) -> Self {
        Self {
            origin: owner.origin.clone(),
            path,
            dirty: !owner.origin.is_computed() && owner.dirty,
            generation: owner.generation,
        }
    }

    /// Origin of the owning document.
    #[must_use]
    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Location of the subtree inside the owning document.
    #[must_use]
    pub const fn path(&self) -> &TreePath {
        &self.path
    }

    /// Whether changes were made through this snippet that may not be on disk yet.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Snippet for a child of this subtree. The child is not checked for existence.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        Self {
            origin: self.origin.clone(),
            path: self.path.key(key),
            dirty: self.dirty,
            generation: self.generation,
        }
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
