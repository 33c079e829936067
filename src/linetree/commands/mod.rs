//! # Command Layer
//!
//! Every mutation of a document is a [`Command`]: a value that knows how to
//! apply itself to its target model and how to reverse that application
//! exactly once. Commands are closed sets of variants per document kind
//! ([`text::TextCommand`], [`xml::XmlCommand`]), each carrying only the undo
//! state it needs.
//!
//! ## Contract
//!
//! - `execute` validates first. On failure it returns the error, performs no
//!   mutation and leaves `is_executed()` false.
//! - `undo` is a no-op unless the command is currently executed.
//! - Re-executing an undone command (redo) runs the same validation again.
//!
//! - `release` runs when the history discards a command. It never changes
//!   what the target looks like.
//!
//! Commands never push themselves anywhere: the document decides whether a
//! command enters the history, based on the result of `execute`.
//!
//! Commands report [`CmdResult`]s instead of printing, so that observers and
//! statistics layers outside this crate can log or time them.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod text;
pub mod xml;

/// A reversible mutation of `Target`.
pub trait Command {
    type Target;

    fn execute(&mut self, target: &mut Self::Target) -> Result<()>;

    fn undo(&mut self, target: &mut Self::Target);

    fn is_executed(&self) -> bool;

    fn kind(&self) -> CommandKind;

    /// Canonical one-line form, e.g. `insert 1:1 "AB"`
    fn describe(&self) -> String;

    /// Called once the command leaves the history for good, to free any
    /// target storage only this command could still reach.
    fn release(&mut self, _target: &mut Self::Target) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Append,
    Insert,
    Delete,
    Replace,
    InsertBefore,
    AppendChild,
    EditId,
    EditText,
    DeleteElement,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Append => "append",
            CommandKind::Insert => "insert",
            CommandKind::Delete => "delete",
            CommandKind::Replace => "replace",
            CommandKind::InsertBefore => "insert-before",
            CommandKind::AppendChild => "append-child",
            CommandKind::EditId => "edit-id",
            CommandKind::EditText => "edit-text",
            CommandKind::DeleteElement => "delete",
        };
        f.write_str(name)
    }
}

/// What happened to the command that produced a [`CmdResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Apply,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

/// Structured outcome of a successful apply, undo or redo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdResult {
    pub kind: CommandKind,
    pub action: EditAction,
    pub command: String,
    pub at: DateTime<Utc>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn new<C: Command + ?Sized>(command: &C, action: EditAction) -> Self {
        Self {
            kind: command.kind(),
            action,
            command: command.describe(),
            at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }
}

/// Quotes free text for [`Command::describe`]
pub(crate) fn quoted(text: &str) -> String {
    format!("{:?}", text)
}
