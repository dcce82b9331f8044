//! Mutable view over the process argument vector.
//!
//! The leading tokens that name the command path (`release`, `create`) are
//! marked as consumed by the dispatcher; every positional accessor below
//! works on the remaining tokens only. `array()` always yields the whole
//! sequence so it can be handed to git as-is.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArgsError {
    #[error("no arguments left")]
    Empty,

    #[error("argument index {index} out of range ({len} remaining)")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    tokens: Vec<String>,
    consumed: usize,
    noop: bool,
}

impl Args {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            consumed: 0,
            noop: false,
        }
    }

    /// Latch no-op mode. There is deliberately no way to clear it.
    pub fn set_noop(&mut self) {
        self.noop = true;
    }

    pub fn is_noop(&self) -> bool {
        self.noop
    }

    /// Number of tokens after the command path.
    pub fn size(&self) -> usize {
        self.tokens.len() - self.consumed
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn first(&self) -> Result<&str, ArgsError> {
        self.params().first().map(String::as_str).ok_or(ArgsError::Empty)
    }

    #[allow(dead_code)]
    pub fn last(&self) -> Result<&str, ArgsError> {
        self.params().last().map(String::as_str).ok_or(ArgsError::Empty)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.params().get(index).map(String::as_str)
    }

    /// Remaining tokens, in order.
    pub fn params(&self) -> &[String] {
        &self.tokens[self.consumed..]
    }

    /// Tokens already matched as the command path.
    pub fn command_path(&self) -> &[String] {
        &self.tokens[..self.consumed]
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.params().iter().position(|t| t == token)
    }

    pub fn remove(&mut self, index: usize) -> Result<String, ArgsError> {
        let len = self.size();
        if index >= len {
            return Err(ArgsError::OutOfRange { index, len });
        }
        Ok(self.tokens.remove(self.consumed + index))
    }

    pub fn append<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
    }

    /// Last remaining token that is not flag-shaped, or "" when there is none.
    pub fn last_param(&self) -> String {
        self.params()
            .iter()
            .rev()
            .find(|t| !is_flag_like(t))
            .cloned()
            .unwrap_or_default()
    }

    /// Mark the first remaining token as part of the command path.
    pub(crate) fn consume(&mut self) -> Result<String, ArgsError> {
        let token = self.first()?.to_string();
        self.consumed += 1;
        Ok(token)
    }

    /// Full token sequence, command path included.
    pub fn array(&self) -> Vec<String> {
        self.tokens.clone()
    }
}

pub(crate) fn is_flag_like(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}
