//! # Storage Layer
//!
//! Documents are plain UTF-8 files. The [`DocumentStore`] trait is the raw
//! read/write surface; [`DocumentFiles`] sits on top of it and turns file
//! content into documents and back.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: files under a root directory, written atomically
//!   (temp file then rename)
//! - [`memory::InMemoryStore`]: a map of path → content for tests
//!
//! ## File format
//!
//! ```text
//! # log                <- optional; switches the document's log flag on
//! <document content>
//! ```
//!
//! The marker line (configurable, compared after trimming) is stripped before
//! the content is parsed and written back in front of it on save. The kind of
//! document is picked from the extension: `.txt` or `.xml`.
//!
//! ## Malformed XML
//!
//! With `recover_malformed_xml` set, an XML file that fails to parse loads as
//! a placeholder `<parse-error id="parse-error"/>` document and the load
//! result carries a warning. Otherwise the parse error is returned.

use crate::commands::CmdMessage;
use crate::config::EditorConfig;
use crate::document::{AnyDocument, Document, DocumentKind, TextDocument, XmlDocument};
use crate::error::{EditError, Result};
use crate::xml::{XmlElement, XmlTree};
use std::io;
use std::path::Path;

pub mod fs;
pub mod memory;

pub const PLACEHOLDER_TAG: &str = "parse-error";
pub const PLACEHOLDER_ID: &str = "parse-error";

/// Raw content storage addressed by path.
pub trait DocumentStore {
    /// Content of `path`, or `None` if nothing is stored there.
    fn read(&self, path: &Path) -> Result<Option<String>>;

    /// Replaces the content of `path`. MUST NOT leave partial content behind.
    fn write(&mut self, path: &Path, content: &str) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// A document read from a store, plus anything worth telling the user.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: AnyDocument,
    pub messages: Vec<CmdMessage>,
}

/// Loads, saves and initializes documents over a [`DocumentStore`].
pub struct DocumentFiles<S: DocumentStore> {
    store: S,
    config: EditorConfig,
}

impl<S: DocumentStore> DocumentFiles<S> {
    pub fn new(store: S, config: EditorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let kind = DocumentKind::from_path(path)?;
        let content = self.store.read(path)?.ok_or_else(|| {
            EditError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no document at {}", path.display()),
            ))
        })?;
        let (log_enabled, body) = split_log_marker(&content, &self.config);

        let mut messages = Vec::new();
        let mut document: AnyDocument = match kind {
            DocumentKind::Text => TextDocument::from_content(body, &self.config).into(),
            DocumentKind::Xml => match XmlDocument::from_content(body, &self.config) {
                Ok(doc) => doc.into(),
                Err(EditError::MalformedContent(reason)) if self.config.recover_malformed_xml => {
                    tracing::warn!(
                        path = %path.display(),
                        %reason,
                        "malformed XML replaced by placeholder"
                    );
                    messages.push(CmdMessage::warning(format!(
                        "{} could not be parsed ({}); loaded an empty <{}> placeholder",
                        path.display(),
                        reason,
                        PLACEHOLDER_TAG
                    )));
                    XmlDocument::from_tree(placeholder_tree(), &self.config).into()
                }
                Err(err) => return Err(err),
            },
        };
        document.set_log_enabled(log_enabled);

        tracing::debug!(path = %path.display(), %kind, log_enabled, "document loaded");
        Ok(LoadedDocument { document, messages })
    }

    /// Writes `document` to `path` and clears its dirty flag.
    pub fn save<D: Document + ?Sized>(&mut self, document: &mut D, path: &Path) -> Result<()> {
        let content = self.serialize(document);
        self.store.write(path, &content)?;
        document.mark_modified(false);
        tracing::debug!(path = %path.display(), kind = %document.kind(), "document saved");
        Ok(())
    }

    /// Creates a fresh document at `path` and writes it out.
    ///
    /// Text starts empty, XML starts as `<root id="root"/>`.
    pub fn init(&mut self, path: &Path, with_log: bool) -> Result<AnyDocument> {
        let kind = DocumentKind::from_path(path)?;
        let mut document = AnyDocument::empty(kind, &self.config);
        document.set_log_enabled(with_log);
        self.save(&mut document, path)?;
        Ok(document)
    }

    /// File content for `document`, log marker included
    pub fn serialize<D: Document + ?Sized>(&self, document: &D) -> String {
        let content = document.get_content();
        if document.is_log_enabled() {
            format!("{}\n{}", self.config.log_marker, content)
        } else {
            content
        }
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

/// Splits a leading log marker line off `content`.
pub fn split_log_marker<'a>(content: &'a str, config: &EditorConfig) -> (bool, &'a str) {
    let (first, rest) = content.split_once('\n').unwrap_or((content, ""));
    if config.is_log_marker(first) {
        (true, rest)
    } else {
        (false, content)
    }
}

fn placeholder_tree() -> XmlTree {
    XmlTree::new(XmlElement::new(PLACEHOLDER_TAG).with_id(PLACEHOLDER_ID))
}
