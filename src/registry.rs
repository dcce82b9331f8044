//! The set of commands ghx understands.
//!
//! Built once before dispatch and read-only afterwards. Tests build their
//! own instance with [`Registry::builtin`] instead of sharing one.

use crate::command::Command;
use crate::flags::FlagError;
use crate::{config, help_cmd, release_cmd, remote_cmd};
use thiserror::Error;

pub const REMOTE_COMMANDS: &str = "Remote Commands";
pub const GITHUB_COMMANDS: &str = "GitHub Commands";
pub const SETUP_COMMANDS: &str = "Setup Commands";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("command `{0}' registered twice")]
    DuplicateCommand(String),

    #[error("`{parent}' already has a `{keyword}' subcommand")]
    DuplicateKeyword { parent: String, keyword: String },

    #[error(transparent)]
    Flags(#[from] FlagError),
}

#[derive(Default)]
pub struct Registry {
    commands: Vec<Command>,
    categories: Vec<(&'static str, Vec<usize>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command ghx ships with, grouped the way `help` shows them.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(Some(REMOTE_COMMANDS), remote_cmd::command())?;
        registry.register(Some(GITHUB_COMMANDS), release_cmd::command()?)?;
        registry.register(Some(SETUP_COMMANDS), config::command()?)?;
        registry.register(None, help_cmd::command())?;
        Ok(registry)
    }

    /// Add a top-level command, optionally under a help category.
    pub fn register(
        &mut self,
        category: Option<&'static str>,
        command: Command,
    ) -> Result<(), RegistryError> {
        if self.lookup(command.name()).is_some() {
            return Err(RegistryError::DuplicateCommand(command.name().to_string()));
        }

        let index = self.commands.len();
        self.commands.push(command);

        if let Some(title) = category {
            match self.categories.iter_mut().find(|(t, _)| *t == title) {
                Some((_, members)) => members.push(index),
                None => self.categories.push((title, vec![index])),
            }
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name() == name)
    }

    /// Categories in registration order, each with its commands in registration order.
    pub fn categories(&self) -> impl Iterator<Item = (&'static str, Vec<&Command>)> + '_ {
        self.categories.iter().map(move |(title, members)| {
            let commands = members.iter().map(|&i| &self.commands[i]).collect();
            (*title, commands)
        })
    }
}
