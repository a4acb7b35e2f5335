//! The code workspace: an ordered collection of extracted files, each with
//! its own linear undo/redo history.
//!
//! [`Workspace::edit`], [`Workspace::undo`], and [`Workspace::redo`] are the
//! entire mutation surface for file content. History is a stack pair, not a
//! tree: a fresh edit clears the redo side.

use std::collections::VecDeque;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::utils::id::new_id;

/// A single named, versioned unit of extracted code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub id: String,
    pub filename: String,
    pub language: String,
    pub content: String,
    #[serde(default)]
    pub undo_stack: Vec<String>,
    #[serde(default)]
    pub redo_stack: VecDeque<String>,
}

impl CodeArtifact {
    pub fn new(
        filename: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            filename: filename.into(),
            language: language.into(),
            content: content.into(),
            undo_stack: Vec::new(),
            redo_stack: VecDeque::new(),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Workspace {
    files: Vec<CodeArtifact>,
    active_id: Option<String>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the workspace from persisted files. Nothing starts active.
    pub fn from_files(files: Vec<CodeArtifact>) -> Self {
        Self {
            files,
            active_id: None,
        }
    }

    pub fn files(&self) -> &[CodeArtifact] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CodeArtifact> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Look a file up by id, falling back to the first exact filename match.
    pub fn resolve(&self, needle: &str) -> Option<&CodeArtifact> {
        self.get(needle)
            .or_else(|| self.files.iter().find(|f| f.filename == needle))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&CodeArtifact> {
        let id = self.active_id.as_deref()?;
        self.get(id)
    }

    /// Point activation at an existing file. Unknown ids are ignored.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.files.iter().any(|f| f.id == id) {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Append an extraction batch. The last new file becomes active; an
    /// empty batch changes nothing.
    pub fn append(&mut self, batch: Vec<CodeArtifact>) {
        if let Some(last) = batch.last() {
            self.active_id = Some(last.id.clone());
        }
        self.files.extend(batch);
    }

    /// Replace a file's content, remembering the previous content for undo.
    /// A fresh edit invalidates any redo branch. Unknown ids are a no-op.
    pub fn edit(&mut self, id: &str, new_content: String) {
        if let Some(file) = self.files.iter_mut().find(|f| f.id == id) {
            let previous = mem::replace(&mut file.content, new_content);
            file.undo_stack.push(previous);
            file.redo_stack.clear();
        }
    }

    /// Step one edit back. No-op when there is nothing to undo.
    pub fn undo(&mut self, id: &str) {
        if let Some(file) = self.files.iter_mut().find(|f| f.id == id) {
            if let Some(last_content) = file.undo_stack.pop() {
                let current = mem::replace(&mut file.content, last_content);
                file.redo_stack.push_front(current);
            }
        }
    }

    /// Step one undone edit forward. No-op when there is nothing to redo.
    pub fn redo(&mut self, id: &str) {
        if let Some(file) = self.files.iter_mut().find(|f| f.id == id) {
            if let Some(next_content) = file.redo_stack.pop_front() {
                let current = mem::replace(&mut file.content, next_content);
                file.undo_stack.push(current);
            }
        }
    }

    /// Remove a file from the collection. When the active file is closed,
    /// activation moves to the previous file in collection order, else the
    /// next one, else nothing. Returns false for unknown ids.
    pub fn close(&mut self, id: &str) -> bool {
        let Some(index) = self.files.iter().position(|f| f.id == id) else {
            return false;
        };

        if self.active_id.as_deref() == Some(id) {
            self.active_id = if self.files.len() == 1 {
                None
            } else if index > 0 {
                Some(self.files[index - 1].id.clone())
            } else {
                Some(self.files[index + 1].id.clone())
            };
        }

        self.files.remove(index);
        true
    }

    /// Drop every file and the active pointer (new chat, session switch).
    pub fn reset(&mut self) {
        self.files.clear();
        self.active_id = None;
    }
}
