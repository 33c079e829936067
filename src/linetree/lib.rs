//! # Linetree Architecture
//!
//! Linetree is a **document-editing engine**: reversible, position-addressed
//! mutations over two document kinds, a line-oriented text buffer and an XML
//! element tree. It has no UI of its own. Hosts (a CLI, a REPL, a server)
//! call into documents and render the structured results they get back.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Document Layer (document.rs)                               │
//! │  - TextDocument / XmlDocument entry points                  │
//! │  - Owns model, history, dirty flag and log flag             │
//! │  - Returns Result<CmdResult>                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  History (history.rs)                                       │
//! │  - Undo/redo stacks, generic over the command type          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/)                                  │
//! │  - One reversible value per mutation                        │
//! │  - Validate first, mutate second, remember minimal undo     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Models (text.rs, xml/)                                     │
//! │  - TextBuffer: Vec of lines, 1-based addressing             │
//! │  - XmlTree: element arena + identifier index                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storage layer ([`store`]) sits beside this stack: it reads file
//! content into documents and writes them back, handling the `# log` marker
//! line and the malformed-XML placeholder.
//!
//! ## Key Principle: No I/O in the Core
//!
//! From documents inward, code:
//! - Takes regular Rust arguments and returns `Result<CmdResult>`
//! - **Never** writes to stdout/stderr
//! - **Never** touches the filesystem
//!
//! Diagnostics go through `tracing`; the crate installs no subscriber.
//!
//! ## Example
//!
//! ```
//! use linetree::{Document, TextDocument, XmlDocument};
//!
//! let mut text = TextDocument::default();
//! text.append("X").unwrap();
//! text.insert(1, 1, "AB\nCD").unwrap();
//! assert_eq!(text.get_content(), "AB\nCDX");
//! text.undo().unwrap();
//! assert_eq!(text.get_content(), "X");
//!
//! let mut xml = XmlDocument::default();
//! xml.append_child("book", "b2", "root", "Title").unwrap();
//! xml.edit_id("b2", "b3").unwrap();
//! assert!(xml.tree().contains_id("b3"));
//! ```
//!
//! ## Module Overview
//!
//! - [`document`]: Document entry points, the [`Document`] trait
//! - [`history`]: Undo/redo history
//! - [`commands`]: Text and XML commands, `CmdResult`
//! - [`text`]: Line buffer model
//! - [`xml`]: Element tree, parsing, serialization, tree dump
//! - [`store`]: Storage abstraction and implementations
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod store;
pub mod text;
pub mod xml;

pub use commands::{CmdMessage, CmdResult, Command, CommandKind, EditAction, MessageLevel};
pub use config::EditorConfig;
pub use document::{AnyDocument, Document, DocumentKind, TextDocument, XmlDocument};
pub use error::{EditError, Result};
pub use history::History;
pub use store::{fs::FileStore, memory::InMemoryStore, DocumentFiles, DocumentStore};
pub use text::TextBuffer;
pub use xml::{NodeId, XmlElement, XmlTree};
