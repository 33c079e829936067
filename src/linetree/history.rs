//! Linear undo/redo history, generic over the command type.
//!
//! Executed commands live on the undo stack (newest at the back); undone
//! commands move to the redo stack. Applying a new command clears redo.
//! With a limit set, the oldest undo entry is dropped once the stack grows
//! past it. Every command the history drops is released against the target
//! first (see [`Command::release`]).

use crate::commands::{CmdResult, Command, EditAction};
use crate::error::Result;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct History<C> {
    undo: VecDeque<C>,
    redo: Vec<C>,
    limit: Option<usize>,
}

impl<C> Default for History<C> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<C> History<C> {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

}

impl<C: Command> History<C> {
    /// Drops every entry from both stacks.
    pub fn clear(&mut self, target: &mut C::Target) {
        self.clear_redo(target);
        for mut command in self.undo.drain(..) {
            command.release(target);
        }
    }

    fn clear_redo(&mut self, target: &mut C::Target) {
        for mut command in self.redo.drain(..) {
            command.release(target);
        }
    }

    fn push_undo(&mut self, command: C, target: &mut C::Target) {
        self.undo.push_back(command);
        if let Some(limit) = self.limit {
            while self.undo.len() > limit {
                if let Some(mut dropped) = self.undo.pop_front() {
                    dropped.release(target);
                }
            }
        }
    }

    /// Executes `command` against `target` and records it on success.
    /// A failed command is discarded and the history is left untouched.
    pub fn apply(&mut self, mut command: C, target: &mut C::Target) -> Result<CmdResult> {
        command.execute(target)?;
        let result = CmdResult::new(&command, EditAction::Apply);
        self.clear_redo(target);
        self.push_undo(command, target);
        Ok(result)
    }

    /// Reverses the most recent command. `None` when there is nothing to undo.
    pub fn undo(&mut self, target: &mut C::Target) -> Option<CmdResult> {
        let mut command = self.undo.pop_back()?;
        command.undo(target);
        let result = CmdResult::new(&command, EditAction::Undo);
        self.redo.push(command);
        Some(result)
    }

    /// Re-executes the most recently undone command.
    ///
    /// If re-execution fails the command stays on the redo stack and the
    /// error is returned.
    pub fn redo(&mut self, target: &mut C::Target) -> Result<Option<CmdResult>> {
        let Some(mut command) = self.redo.pop() else {
            return Ok(None);
        };
        if let Err(err) = command.execute(target) {
            self.redo.push(command);
            return Err(err);
        }
        let result = CmdResult::new(&command, EditAction::Redo);
        self.push_undo(command, target);
        Ok(Some(result))
    }
}
