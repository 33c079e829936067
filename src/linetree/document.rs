//! # Documents
//!
//! A document owns one model, its undo/redo history, the dirty flag and the
//! log flag. Its methods are the entry points hosts call: each builds a
//! command, runs it through the history and hands back a [`CmdResult`].
//!
//! Documents never print and never touch the filesystem. Loading and saving
//! live in [`crate::store`].
//!
//! Two concrete kinds exist, [`TextDocument`] and [`XmlDocument`]. Code that
//! does not care which one it holds works through the [`Document`] trait or
//! the [`AnyDocument`] enum the store returns.

use crate::commands::text::{
    AppendCommand, DeleteCommand, InsertCommand, ReplaceCommand, TextCommand,
};
use crate::commands::xml::{
    AppendChildCommand, DeleteElementCommand, EditIdCommand, EditTextCommand,
    InsertBeforeCommand, XmlCommand,
};
use crate::commands::CmdResult;
use crate::config::EditorConfig;
use crate::error::{EditError, Result};
use crate::history::History;
use crate::text::TextBuffer;
use crate::xml::{self, IndexRepair, XmlTree};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Xml,
}

impl DocumentKind {
    /// Picks the kind from the file extension (`.txt` or `.xml`, any case).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("txt") => Ok(DocumentKind::Text),
            Some("xml") => Ok(DocumentKind::Xml),
            _ => Err(EditError::UnsupportedFileType(path.display().to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Text => f.write_str("text"),
            DocumentKind::Xml => f.write_str("xml"),
        }
    }
}

/// Operations shared by every document kind.
pub trait Document {
    fn kind(&self) -> DocumentKind;

    /// Reverses the last applied command; `Ok(None)` when there is none.
    fn undo(&mut self) -> Result<Option<CmdResult>>;

    /// Re-applies the last undone command; `Ok(None)` when there is none.
    fn redo(&mut self) -> Result<Option<CmdResult>>;

    /// Serialized content, without the log marker line.
    fn get_content(&self) -> String;

    fn is_modified(&self) -> bool;

    fn mark_modified(&mut self, modified: bool);

    fn is_log_enabled(&self) -> bool;

    fn set_log_enabled(&mut self, enabled: bool);
}

fn trace_result(kind: DocumentKind, result: &CmdResult) {
    tracing::debug!(
        document = %kind,
        action = ?result.action,
        command = %result.command,
        "command completed"
    );
}

#[derive(Debug, Clone)]
pub struct TextDocument {
    buffer: TextBuffer,
    history: History<TextCommand>,
    modified: bool,
    log_enabled: bool,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl TextDocument {
    /// An empty document
    pub fn new(config: &EditorConfig) -> Self {
        Self::from_buffer(TextBuffer::new(), config)
    }

    pub fn from_content(content: &str, config: &EditorConfig) -> Self {
        Self::from_buffer(TextBuffer::from_content(content), config)
    }

    pub fn from_buffer(buffer: TextBuffer, config: &EditorConfig) -> Self {
        Self {
            buffer,
            history: History::new(config.history_limit),
            modified: false,
            log_enabled: false,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn lines(&self) -> &[String] {
        self.buffer.lines()
    }

    pub fn history(&self) -> &History<TextCommand> {
        &self.history
    }

    /// Numbered view of lines `start..=end`, see [`TextBuffer::show`]
    pub fn show(&self, start: usize, end: usize) -> Result<String> {
        self.buffer.show(start, end)
    }

    pub fn append(&mut self, text: impl Into<String>) -> Result<CmdResult> {
        self.apply(AppendCommand::new(text).into())
    }

    pub fn insert(&mut self, line: usize, col: usize, text: impl Into<String>) -> Result<CmdResult> {
        self.apply(InsertCommand::new(line, col, text).into())
    }

    pub fn delete(&mut self, line: usize, col: usize, length: usize) -> Result<CmdResult> {
        self.apply(DeleteCommand::new(line, col, length).into())
    }

    pub fn replace(
        &mut self,
        line: usize,
        col: usize,
        length: usize,
        text: impl Into<String>,
    ) -> Result<CmdResult> {
        self.apply(ReplaceCommand::new(line, col, length, text).into())
    }

    fn apply(&mut self, command: TextCommand) -> Result<CmdResult> {
        let result = self.history.apply(command, &mut self.buffer)?;
        self.modified = true;
        trace_result(DocumentKind::Text, &result);
        Ok(result)
    }
}

impl Document for TextDocument {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Text
    }

    fn undo(&mut self) -> Result<Option<CmdResult>> {
        let result = self.history.undo(&mut self.buffer);
        if let Some(result) = &result {
            self.modified = true;
            trace_result(DocumentKind::Text, result);
        }
        Ok(result)
    }

    fn redo(&mut self) -> Result<Option<CmdResult>> {
        let result = self.history.redo(&mut self.buffer)?;
        if let Some(result) = &result {
            self.modified = true;
            trace_result(DocumentKind::Text, result);
        }
        Ok(result)
    }

    fn get_content(&self) -> String {
        self.buffer.as_string()
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn mark_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    fn is_log_enabled(&self) -> bool {
        self.log_enabled
    }

    fn set_log_enabled(&mut self, enabled: bool) {
        self.log_enabled = enabled;
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    tree: XmlTree,
    history: History<XmlCommand>,
    indent: String,
    modified: bool,
    log_enabled: bool,
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl XmlDocument {
    /// A document holding only `<root id="root"/>`
    pub fn new(config: &EditorConfig) -> Self {
        Self::from_tree(XmlTree::with_default_root(), config)
    }

    /// Parses `content`. Malformed input is an error; the caller decides
    /// whether to substitute a placeholder.
    pub fn from_content(content: &str, config: &EditorConfig) -> Result<Self> {
        Ok(Self::from_tree(xml::parse(content)?, config))
    }

    pub fn from_tree(tree: XmlTree, config: &EditorConfig) -> Self {
        Self {
            tree,
            history: History::new(config.history_limit),
            indent: config.indent(),
            modified: false,
            log_enabled: false,
        }
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn history(&self) -> &History<XmlCommand> {
        &self.history
    }

    /// ASCII outline of the tree, see [`xml::tree_dump`]
    pub fn tree_dump(&self) -> String {
        xml::tree_dump(&self.tree)
    }

    /// Rebuilds the identifier index from the tree and reports what changed.
    pub fn repair_index(&mut self) -> IndexRepair {
        self.tree.repair_index()
    }

    pub fn insert_before(
        &mut self,
        tag: impl Into<String>,
        new_id: impl Into<String>,
        target_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<CmdResult> {
        self.apply(InsertBeforeCommand::new(tag, new_id, target_id, text).into())
    }

    pub fn append_child(
        &mut self,
        tag: impl Into<String>,
        new_id: impl Into<String>,
        parent_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<CmdResult> {
        self.apply(AppendChildCommand::new(tag, new_id, parent_id, text).into())
    }

    pub fn edit_id(
        &mut self,
        old_id: impl Into<String>,
        new_id: impl Into<String>,
    ) -> Result<CmdResult> {
        self.apply(EditIdCommand::new(old_id, new_id).into())
    }

    pub fn edit_text(
        &mut self,
        element_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<CmdResult> {
        self.apply(EditTextCommand::new(element_id, text).into())
    }

    pub fn delete(&mut self, element_id: impl Into<String>) -> Result<CmdResult> {
        self.apply(DeleteElementCommand::new(element_id).into())
    }

    fn apply(&mut self, command: XmlCommand) -> Result<CmdResult> {
        let result = self.history.apply(command, &mut self.tree)?;
        self.modified = true;
        trace_result(DocumentKind::Xml, &result);
        Ok(result)
    }
}

impl Document for XmlDocument {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Xml
    }

    fn undo(&mut self) -> Result<Option<CmdResult>> {
        let result = self.history.undo(&mut self.tree);
        if let Some(result) = &result {
            self.modified = true;
            trace_result(DocumentKind::Xml, result);
        }
        Ok(result)
    }

    fn redo(&mut self) -> Result<Option<CmdResult>> {
        let result = self.history.redo(&mut self.tree)?;
        if let Some(result) = &result {
            self.modified = true;
            trace_result(DocumentKind::Xml, result);
        }
        Ok(result)
    }

    fn get_content(&self) -> String {
        xml::to_xml(&self.tree, &self.indent)
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    fn mark_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    fn is_log_enabled(&self) -> bool {
        self.log_enabled
    }

    fn set_log_enabled(&mut self, enabled: bool) {
        self.log_enabled = enabled;
    }
}

/// Either document kind, as produced by the store
#[derive(Debug, Clone)]
pub enum AnyDocument {
    Text(TextDocument),
    Xml(XmlDocument),
}

impl AnyDocument {
    /// A fresh document of `kind`
    pub fn empty(kind: DocumentKind, config: &EditorConfig) -> Self {
        match kind {
            DocumentKind::Text => AnyDocument::Text(TextDocument::new(config)),
            DocumentKind::Xml => AnyDocument::Xml(XmlDocument::new(config)),
        }
    }

    pub fn as_text(&self) -> Option<&TextDocument> {
        match self {
            AnyDocument::Text(doc) => Some(doc),
            AnyDocument::Xml(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextDocument> {
        match self {
            AnyDocument::Text(doc) => Some(doc),
            AnyDocument::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match self {
            AnyDocument::Xml(doc) => Some(doc),
            AnyDocument::Text(_) => None,
        }
    }

    pub fn as_xml_mut(&mut self) -> Option<&mut XmlDocument> {
        match self {
            AnyDocument::Xml(doc) => Some(doc),
            AnyDocument::Text(_) => None,
        }
    }

    fn inner(&self) -> &dyn Document {
        match self {
            AnyDocument::Text(doc) => doc,
            AnyDocument::Xml(doc) => doc,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Document {
        match self {
            AnyDocument::Text(doc) => doc,
            AnyDocument::Xml(doc) => doc,
        }
    }
}

impl Document for AnyDocument {
    fn kind(&self) -> DocumentKind {
        self.inner().kind()
    }

    fn undo(&mut self) -> Result<Option<CmdResult>> {
        self.inner_mut().undo()
    }

    fn redo(&mut self) -> Result<Option<CmdResult>> {
        self.inner_mut().redo()
    }

    fn get_content(&self) -> String {
        self.inner().get_content()
    }

    fn is_modified(&self) -> bool {
        self.inner().is_modified()
    }

    fn mark_modified(&mut self, modified: bool) {
        self.inner_mut().mark_modified(modified)
    }

    fn is_log_enabled(&self) -> bool {
        self.inner().is_log_enabled()
    }

    fn set_log_enabled(&mut self, enabled: bool) {
        self.inner_mut().set_log_enabled(enabled)
    }
}

impl From<TextDocument> for AnyDocument {
    fn from(doc: TextDocument) -> Self {
        AnyDocument::Text(doc)
    }
}

impl From<XmlDocument> for AnyDocument {
    fn from(doc: XmlDocument) -> Self {
        AnyDocument::Xml(doc)
    }
}
