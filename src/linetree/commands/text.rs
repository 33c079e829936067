//! Text-buffer commands: append, insert, delete and replace.
//!
//! Undo state is kept minimal: the index of an appended line, the single
//! original line an insert or delete overwrote, and the number of lines an
//! insert produced. No command snapshots the whole buffer.

use super::{quoted, Command, CommandKind};
use crate::error::{EditError, Result};
use crate::text::{byte_offset, char_len, TextBuffer};

#[derive(Debug, Clone)]
pub struct AppendCommand {
    text: String,
    appended_at: Option<usize>,
}

impl AppendCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            appended_at: None,
        }
    }
}

impl Command for AppendCommand {
    type Target = TextBuffer;

    fn execute(&mut self, buffer: &mut TextBuffer) -> Result<()> {
        if self.appended_at.is_some() {
            return Ok(());
        }
        self.appended_at = Some(buffer.push_line(self.text.clone()));
        Ok(())
    }

    fn undo(&mut self, buffer: &mut TextBuffer) {
        if let Some(idx) = self.appended_at.take() {
            buffer.remove_line(idx);
        }
    }

    fn is_executed(&self) -> bool {
        self.appended_at.is_some()
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Append
    }

    fn describe(&self) -> String {
        format!("append {}", quoted(&self.text))
    }
}

#[derive(Debug, Clone)]
struct InsertUndo {
    /// `None` when the insert went into an empty buffer
    original: Option<String>,
    produced: usize,
}

#[derive(Debug, Clone)]
pub struct InsertCommand {
    line: usize,
    col: usize,
    text: String,
    undo: Option<InsertUndo>,
}

impl InsertCommand {
    pub fn new(line: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            col,
            text: text.into(),
            undo: None,
        }
    }

    fn validate(&self, buffer: &TextBuffer) -> Result<()> {
        if buffer.is_empty() {
            if self.line == 1 && self.col == 1 {
                return Ok(());
            }
            return Err(EditError::OutOfRange(format!(
                "empty buffer only accepts 1:1, got {}:{}",
                self.line, self.col
            )));
        }

        if self.line < 1 || self.line > buffer.line_count() {
            return Err(EditError::OutOfRange(format!(
                "line {} outside 1..={}",
                self.line,
                buffer.line_count()
            )));
        }

        let max_col = char_len(buffer.line_at(self.line - 1)) + 1;
        if self.col < 1 || self.col > max_col {
            return Err(EditError::OutOfRange(format!(
                "column {} outside 1..={} on line {}",
                self.col, max_col, self.line
            )));
        }
        Ok(())
    }
}

impl Command for InsertCommand {
    type Target = TextBuffer;

    fn execute(&mut self, buffer: &mut TextBuffer) -> Result<()> {
        if self.undo.is_some() {
            return Ok(());
        }
        self.validate(buffer)?;

        let idx = self.line - 1;
        let original = if buffer.is_empty() {
            None
        } else {
            Some(buffer.line_at(idx).to_string())
        };

        let current = original.as_deref().unwrap_or("");
        let (prefix, suffix) = current.split_at(byte_offset(current, self.col - 1));
        let fragments: Vec<&str> = self.text.split('\n').collect();

        let new_lines = match fragments.as_slice() {
            [single] => vec![format!("{}{}{}", prefix, single, suffix)],
            [first, middle @ .., last] => {
                let mut lines = Vec::with_capacity(fragments.len());
                lines.push(format!("{}{}", prefix, first));
                lines.extend(middle.iter().map(|s| s.to_string()));
                lines.push(format!("{}{}", last, suffix));
                lines
            }
            [] => unreachable!("split always yields at least one fragment"),
        };

        let produced = new_lines.len();
        let replaced = usize::from(original.is_some());
        buffer.splice_lines(idx, replaced, new_lines);

        self.undo = Some(InsertUndo { original, produced });
        Ok(())
    }

    fn undo(&mut self, buffer: &mut TextBuffer) {
        if let Some(state) = self.undo.take() {
            buffer.splice_lines(
                self.line - 1,
                state.produced,
                state.original.into_iter().collect(),
            );
        }
    }

    fn is_executed(&self) -> bool {
        self.undo.is_some()
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Insert
    }

    fn describe(&self) -> String {
        format!("insert {}:{} {}", self.line, self.col, quoted(&self.text))
    }
}

#[derive(Debug, Clone)]
pub struct DeleteCommand {
    line: usize,
    col: usize,
    length: usize,
    original: Option<String>,
}

impl DeleteCommand {
    pub fn new(line: usize, col: usize, length: usize) -> Self {
        Self {
            line,
            col,
            length,
            original: None,
        }
    }

    fn validate(&self, buffer: &TextBuffer) -> Result<()> {
        if self.line < 1 || self.line > buffer.line_count() {
            return Err(EditError::OutOfRange(format!(
                "line {} outside 1..={}",
                self.line,
                buffer.line_count()
            )));
        }

        let line_len = char_len(buffer.line_at(self.line - 1));
        if self.col < 1 || self.col > line_len {
            return Err(EditError::OutOfRange(format!(
                "column {} outside 1..={} on line {}",
                self.col, line_len, self.line
            )));
        }
        if self.length == 0 {
            return Err(EditError::OutOfRange("length must be positive".into()));
        }
        if self.length > line_len - (self.col - 1) {
            return Err(EditError::OutOfRange(format!(
                "deleting {} chars from column {} runs past the end of line {}",
                self.length, self.col, self.line
            )));
        }
        Ok(())
    }
}

impl Command for DeleteCommand {
    type Target = TextBuffer;

    fn execute(&mut self, buffer: &mut TextBuffer) -> Result<()> {
        if self.original.is_some() {
            return Ok(());
        }
        self.validate(buffer)?;

        let idx = self.line - 1;
        let current = buffer.line_at(idx);
        let start = byte_offset(current, self.col - 1);
        let end = byte_offset(current, self.col - 1 + self.length);
        let updated = format!("{}{}", &current[..start], &current[end..]);

        self.original = Some(buffer.set_line(idx, updated));
        Ok(())
    }

    fn undo(&mut self, buffer: &mut TextBuffer) {
        if let Some(original) = self.original.take() {
            buffer.set_line(self.line - 1, original);
        }
    }

    fn is_executed(&self) -> bool {
        self.original.is_some()
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Delete
    }

    fn describe(&self) -> String {
        format!("delete {}:{} {}", self.line, self.col, self.length)
    }
}

/// Delete followed by insert at the same coordinates.
///
/// The insert is validated against the post-delete line. A delete that passed
/// validation leaves `col - 1 <= len - length`, which is exactly the insert's
/// column bound, so the insert step cannot fail once the delete succeeded.
#[derive(Debug, Clone)]
pub struct ReplaceCommand {
    delete: DeleteCommand,
    insert: InsertCommand,
    executed: bool,
}

impl ReplaceCommand {
    pub fn new(line: usize, col: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            delete: DeleteCommand::new(line, col, length),
            insert: InsertCommand::new(line, col, text),
            executed: false,
        }
    }
}

impl Command for ReplaceCommand {
    type Target = TextBuffer;

    fn execute(&mut self, buffer: &mut TextBuffer) -> Result<()> {
        if self.executed {
            return Ok(());
        }
        self.delete.execute(buffer)?;
        if let Err(err) = self.insert.execute(buffer) {
            self.delete.undo(buffer);
            return Err(err);
        }
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, buffer: &mut TextBuffer) {
        if !self.executed {
            return;
        }
        self.insert.undo(buffer);
        self.delete.undo(buffer);
        self.executed = false;
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Replace
    }

    fn describe(&self) -> String {
        format!(
            "replace {}:{} {} {}",
            self.delete.line,
            self.delete.col,
            self.delete.length,
            quoted(&self.insert.text)
        )
    }
}

#[derive(Debug, Clone)]
pub enum TextCommand {
    Append(AppendCommand),
    Insert(InsertCommand),
    Delete(DeleteCommand),
    Replace(ReplaceCommand),
}

impl TextCommand {
    fn inner(&self) -> &dyn Command<Target = TextBuffer> {
        match self {
            TextCommand::Append(cmd) => cmd,
            TextCommand::Insert(cmd) => cmd,
            TextCommand::Delete(cmd) => cmd,
            TextCommand::Replace(cmd) => cmd,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Command<Target = TextBuffer> {
        match self {
            TextCommand::Append(cmd) => cmd,
            TextCommand::Insert(cmd) => cmd,
            TextCommand::Delete(cmd) => cmd,
            TextCommand::Replace(cmd) => cmd,
        }
    }
}

impl Command for TextCommand {
    type Target = TextBuffer;

    fn execute(&mut self, buffer: &mut TextBuffer) -> Result<()> {
        self.inner_mut().execute(buffer)
    }

    fn undo(&mut self, buffer: &mut TextBuffer) {
        self.inner_mut().undo(buffer)
    }

    fn is_executed(&self) -> bool {
        self.inner().is_executed()
    }

    fn kind(&self) -> CommandKind {
        self.inner().kind()
    }

    fn describe(&self) -> String {
        self.inner().describe()
    }
}

impl From<AppendCommand> for TextCommand {
    fn from(cmd: AppendCommand) -> Self {
        TextCommand::Append(cmd)
    }
}

impl From<InsertCommand> for TextCommand {
    fn from(cmd: InsertCommand) -> Self {
        TextCommand::Insert(cmd)
    }
}

impl From<DeleteCommand> for TextCommand {
    fn from(cmd: DeleteCommand) -> Self {
        TextCommand::Delete(cmd)
    }
}

impl From<ReplaceCommand> for TextCommand {
    fn from(cmd: ReplaceCommand) -> Self {
        TextCommand::Replace(cmd)
    }
}
