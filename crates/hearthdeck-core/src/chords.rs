//! Vi-style key chords: a nomen keystroke selects an action category,
//! a verb keystroke selects the action, and templates ending in the
//! postfix sentinel take one trailing digit (`cb5` -> `set:brightness:#5`).
//!
//! The machine is pure: no I/O, no knowledge of the UI or the hub.

use std::collections::HashMap;
use thiserror::Error;

pub const POSTFIX_SENTINEL: char = '#';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChordError {
    #[error("invalid nomen [{0}]")]
    InvalidNomen(char),
    #[error("invalid verb [{0}]")]
    InvalidVerb(char),
    #[error("invalid postfix [{0}]")]
    InvalidPostfix(char),
}

/// Two-level lookup from nomen to verb to an action template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChordGrammar {
    table: HashMap<char, HashMap<char, String>>,
}

impl ChordGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, nomen: char, verb: char, template: impl Into<String>) {
        self.table
            .entry(nomen)
            .or_default()
            .insert(verb, template.into());
    }

    pub fn has_nomen(&self, key: char) -> bool {
        self.table.contains_key(&key)
    }

    pub fn template(&self, nomen: char, verb: char) -> Option<&str> {
        self.table
            .get(&nomen)
            .and_then(|verbs| verbs.get(&verb))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Accumulator for an in-flight chord. `active` is true while a
/// sequence is incomplete; `buffer` holds consumed keystrokes not yet
/// resolved into a verb; `action` holds the resolved template once a
/// verb (and postfix, if demanded) has landed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChordState {
    pub active: bool,
    pub buffer: String,
    pub action: String,
}

impl ChordState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the chord back to the empty state. Idempotent.
    pub fn reset(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.action.clear();
    }

    fn awaiting_postfix(&self) -> bool {
        self.active && !self.action.is_empty()
    }

    /// Feeds one keystroke into the machine. On any error the state is
    /// fully reset before returning. The buffer never retains more than
    /// two keystrokes.
    pub fn consume(&mut self, key: char, grammar: &ChordGrammar) -> Result<(), ChordError> {
        if self.awaiting_postfix() {
            if !key.is_ascii_digit() {
                self.reset();
                return Err(ChordError::InvalidPostfix(key));
            }
            self.action.push(key);
            self.active = false;
            self.buffer.clear();
            return Ok(());
        }

        self.buffer.push(key);
        let mut keys = self.buffer.chars();
        match (keys.next(), keys.next()) {
            (Some(nomen), None) => {
                if !grammar.has_nomen(nomen) {
                    self.reset();
                    return Err(ChordError::InvalidNomen(nomen));
                }
                self.active = true;
                Ok(())
            }
            (Some(nomen), Some(verb)) => {
                let template = match grammar.template(nomen, verb) {
                    Some(template) => template.to_string(),
                    None => {
                        self.reset();
                        return Err(ChordError::InvalidVerb(verb));
                    }
                };
                let wants_postfix = template.ends_with(POSTFIX_SENTINEL);
                self.action = template;
                self.buffer.clear();
                if !wants_postfix {
                    self.active = false;
                }
                Ok(())
            }
            _ => {
                self.reset();
                Ok(())
            }
        }
    }

    /// Yields a completed action at most once, clearing it. An action
    /// still ending in the bare sentinel means the grammar promised a
    /// postfix that never arrived; it is discarded as a no-op.
    pub fn take_action(&mut self) -> Option<String> {
        if self.active || self.action.is_empty() {
            return None;
        }
        let action = std::mem::take(&mut self.action);
        if action.ends_with(POSTFIX_SENTINEL) {
            return None;
        }
        Some(action)
    }
}
