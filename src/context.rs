//! Collaborators the command handlers talk to.
//!
//! Every side effect (running git, calling the hosting API, opening an
//! editor, printing) goes through one of these traits so that dispatch and
//! handlers can be exercised without touching the outside world.

use crate::config::Config;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// Runs the wrapped binary with the current process's stdio.
pub trait Executor {
    /// Exit status of `program args...`.
    fn exec(&self, program: &str, args: &[String]) -> Result<i32>;
}

/// Facts about the repository in the current directory.
pub trait LocalRepo {
    /// Project behind the `upstream` remote, falling back to `origin`.
    fn main_project(&self) -> Result<Project>;

    /// Project behind the remote the current branch tracks, else the main project.
    fn current_project(&self) -> Result<Project>;

    /// Short name of the checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// `core.commentChar`, `#` when unset.
    fn comment_char(&self) -> String;
}

/// Release operations on the hosting service.
pub trait Hosting {
    fn fetch_releases(&self, project: &Project) -> Result<Vec<Release>>;

    fn fetch_release(&self, project: &Project, tag: &str) -> Result<Release>;

    fn create_release(&self, project: &Project, params: &NewRelease) -> Result<Release>;

    fn upload_asset(
        &self,
        project: &Project,
        release: &Release,
        path: &Path,
        label: &str,
    ) -> Result<Asset>;

    /// Login of the user authenticated against `host`.
    fn current_user(&self, host: &str) -> Result<String>;
}

pub trait Editor {
    /// Let the user edit `template`; lines starting with `comment_char` are dropped.
    fn edit_title_and_body(&self, comment_char: &str, template: &str) -> Result<(String, String)>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    pub tag_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub upload_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tarball_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zipball_url: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub label: String,
    #[serde(default)]
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

// The API sends `null` for unset names and bodies.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Everything a handler may touch, bundled for one invocation.
pub struct Context {
    pub config: Config,
    pub git: Box<dyn Executor>,
    pub repo: Box<dyn LocalRepo>,
    pub hosting: Box<dyn Hosting>,
    pub editor: Box<dyn Editor>,
    pub out: Box<dyn Write>,
    pub err: Box<dyn Write>,
}

impl Context {
    /// Run git with `args`, or describe the run in no-op mode.
    pub fn run_git(&mut self, args: &[String], noop: bool) -> Result<i32> {
        if noop {
            writeln!(self.out, "{} {}", self.config.git.program, args.join(" "))?;
            return Ok(0);
        }
        self.git.exec(&self.config.git.program, args)
    }

    /// Write a diagnostic line to stderr, ignoring a closed pipe.
    pub fn warn(&mut self, line: impl fmt::Display) {
        if let Err(e) = writeln!(self.err, "{}", line) {
            if e.kind() != io::ErrorKind::BrokenPipe {
                tracing::debug!("failed to write diagnostic: {}", e);
            }
        }
    }
}
