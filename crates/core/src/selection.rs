//! The set of files chosen for conversion.
//!
//! A [`Selection`] is immutable: every add/remove produces a new value that
//! replaces the old one wholesale. [`SelectionStore`] holds the current value
//! and publishes each replacement to observers through a `watch` channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::catalog::{formats_for, FormatChoices};

/// Errors building a selection entry.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("File not found: {0}")]
    NotFound(PathBuf),
}

/// One file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    /// Display name; also the key within a selection.
    pub name: String,
    /// Declared MIME type (e.g., "video/quicktime").
    pub media_type: String,
    /// Where the bytes are read from at submission time.
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            path: path.into(),
        }
    }

    /// Build an entry from a path on disk, guessing the media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, SelectionError> {
        if !path.is_file() {
            return Err(SelectionError::NotFound(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SelectionError::NoFileName(path.to_path_buf()))?;
        let media_type = mime_guess::from_path(path).first_or_octet_stream();

        Ok(Self::new(name, media_type.essence_str(), path))
    }
}

/// Ordered set of selected files, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    files: Arc<[SelectedFile]>,
}

impl Selection {
    /// Build a selection; a later file with an already-present name replaces the earlier one.
    pub fn new(files: impl IntoIterator<Item = SelectedFile>) -> Self {
        Self::default().with_added(files)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn first(&self) -> Option<&SelectedFile> {
        self.files.first()
    }

    pub fn get(&self, name: &str) -> Option<&SelectedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedFile> {
        self.files.iter()
    }

    /// A new selection with `files` appended. Same-name entries are replaced in place.
    pub fn with_added(&self, files: impl IntoIterator<Item = SelectedFile>) -> Self {
        let mut next: Vec<SelectedFile> = self.files.to_vec();
        for file in files {
            match next.iter_mut().find(|f| f.name == file.name) {
                Some(existing) => *existing = file,
                None => next.push(file),
            }
        }
        Self { files: next.into() }
    }

    /// A new selection without the file called `name`.
    pub fn without(&self, name: &str) -> Self {
        let next: Vec<SelectedFile> = self
            .files
            .iter()
            .filter(|f| f.name != name)
            .cloned()
            .collect();
        Self { files: next.into() }
    }
}

/// Holds the current selection and notifies observers after each mutation.
#[derive(Debug)]
pub struct SelectionStore {
    tx: watch::Sender<Selection>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Selection::default());
        Self { tx }
    }

    /// Snapshot of the current selection.
    pub fn current(&self) -> Selection {
        self.tx.borrow().clone()
    }

    /// Receive every replacement of the selection.
    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.tx.subscribe()
    }

    /// Formats offered for the current selection.
    pub fn format_choices(&self) -> FormatChoices {
        formats_for(&self.tx.borrow())
    }

    pub fn add(&self, files: impl IntoIterator<Item = SelectedFile>) -> Selection {
        let next = self.current().with_added(files);
        self.replace(next)
    }

    pub fn remove(&self, name: &str) -> Selection {
        let next = self.current().without(name);
        self.replace(next)
    }

    pub fn replace(&self, selection: Selection) -> Selection {
        debug!("Selection now holds {} file(s)", selection.len());
        self.tx.send_replace(selection.clone());
        selection
    }
}
