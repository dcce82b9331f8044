//! One node of the command tree and the contract its handler follows.

use crate::args::{Args, ArgsError};
use crate::context::Context;
use crate::flags::{FlagError, FlagSet, FlagValues};
use crate::registry::{Registry, RegistryError};
use thiserror::Error;

/// How a handler wants the invocation to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0.
    Done,
    /// Exit with this status, typically one reported by git.
    Exit(i32),
}

impl Outcome {
    pub fn code(self) -> i32 {
        match self {
            Outcome::Done => 0,
            Outcome::Exit(code) => code,
        }
    }
}

#[derive(Error, Debug)]
pub enum CmdError {
    /// Bad invocation: exit 2, nothing was changed.
    #[error("{0}")]
    Usage(String),

    /// A collaborator failed.
    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

impl CmdError {
    pub fn usage(message: impl Into<String>) -> Self {
        CmdError::Usage(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CmdError::Usage(_) => 2,
            CmdError::Failure(_) => 1,
        }
    }
}

impl From<FlagError> for CmdError {
    fn from(err: FlagError) -> Self {
        CmdError::Usage(err.to_string())
    }
}

impl From<ArgsError> for CmdError {
    fn from(err: ArgsError) -> Self {
        CmdError::Usage(err.to_string())
    }
}

impl From<std::io::Error> for CmdError {
    fn from(err: std::io::Error) -> Self {
        CmdError::Failure(err.into())
    }
}

pub type CmdResult = Result<Outcome, CmdError>;

/// What the dispatcher hands to a handler once flags are stripped.
pub struct Invocation<'a> {
    pub command: &'a Command,
    pub registry: &'a Registry,
    pub args: &'a mut Args,
    pub flags: FlagValues,
}

pub type Handler = fn(&mut Invocation<'_>, &mut Context) -> CmdResult;

/// Rewrites the arguments in place before they are handed to git.
pub type Transform = fn(&mut Args, &mut Context) -> Result<(), CmdError>;

#[derive(Clone, Copy)]
pub enum Action {
    /// Handled entirely in-process.
    Run(Handler),
    /// Transformed, then executed by git.
    PassThrough(Transform),
}

pub struct Command {
    name: &'static str,
    usage: &'static str,
    summary: &'static str,
    long: &'static str,
    flags: FlagSet,
    action: Option<Action>,
    listed: bool,
    children: Vec<Command>,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            usage: "",
            summary: "",
            long: "",
            flags: FlagSet::new(),
            action: None,
            listed: true,
            children: Vec::new(),
        }
    }

    pub fn usage(mut self, usage: &'static str) -> Self {
        self.usage = usage;
        self
    }

    pub fn summary(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    pub fn long(mut self, long: &'static str) -> Self {
        self.long = long;
        self
    }

    pub fn flags(mut self, flags: FlagSet) -> Self {
        self.flags = flags;
        self
    }

    pub fn run(mut self, handler: Handler) -> Self {
        self.action = Some(Action::Run(handler));
        self
    }

    pub fn pass_through(mut self, transform: Transform) -> Self {
        self.action = Some(Action::PassThrough(transform));
        self
    }

    /// Keep the command out of the `help` listing.
    pub fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    pub fn subcommand(mut self, child: Command) -> Result<Self, RegistryError> {
        if self.child(child.name).is_some() {
            return Err(RegistryError::DuplicateKeyword {
                parent: self.name.to_string(),
                keyword: child.name.to_string(),
            });
        }
        self.children.push(child);
        Ok(self)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn short(&self) -> &'static str {
        self.summary
    }

    pub fn flag_set(&self) -> &FlagSet {
        &self.flags
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    pub fn child(&self, keyword: &str) -> Option<&Command> {
        self.children.iter().find(|c| c.name == keyword)
    }

    pub fn is_runnable(&self) -> bool {
        self.action.is_some() || !self.children.is_empty()
    }

    pub fn is_listed(&self) -> bool {
        self.listed && self.is_runnable()
    }

    pub fn usage_text(&self) -> String {
        let usage = if self.usage.trim().is_empty() {
            self.name
        } else {
            self.usage.trim()
        };

        let mut text = String::new();
        for (i, line) in usage.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
            let prefix = if i == 0 { "Usage:" } else { "      " };
            text.push_str(&format!("{} ghx {}\n", prefix, line));
        }

        let long = self.long.trim();
        if !long.is_empty() {
            text.push('\n');
            text.push_str(long);
            text.push('\n');
        } else if !self.summary.is_empty() {
            text.push('\n');
            text.push_str(self.summary);
            text.push('\n');
        }

        if long.is_empty() && !self.flags.is_empty() {
            text.push_str("\nOptions:\n");
            for flag in self.flags.iter() {
                text.push_str(&format!("    {}\n", flag.label()));
            }
        }
        text
    }
}
