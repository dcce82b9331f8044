use crate::context::{Executor, LocalRepo, Project};
use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::process::Command;
use tracing::{debug, trace};

/// Runs git (or any program) with inherited stdio.
#[derive(Debug, Default)]
pub struct GitExecutor;

impl Executor for GitExecutor {
    fn exec(&self, program: &str, args: &[String]) -> Result<i32> {
        debug!("exec: {} {}", program, args.join(" "));
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to run {}", program))?;

        // Killed by a signal: no code to forward.
        Ok(status.code().unwrap_or(1))
    }
}

/// Reads remotes, branches, and config of the repository in the working directory.
#[derive(Debug, Clone)]
pub struct GitRepo {
    program: String,
}

impl GitRepo {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Trimmed stdout of a successful git call, `None` if git exits nonzero.
    fn read(&self, args: &[&str]) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {} {}", self.program, args.join(" ")))?;

        if !output.status.success() {
            trace!(
                "{} {} failed: {}",
                self.program,
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if stdout.is_empty() { None } else { Some(stdout) })
    }

    fn remote_project(&self, remote: &str) -> Result<Option<Project>> {
        let key = format!("remote.{}.url", remote);
        let Some(url) = self.read(&["config", "--get", &key])? else {
            return Ok(None);
        };
        let project = parse_remote_url(&url);
        debug!("remote {} -> {:?}", remote, project);
        Ok(project)
    }
}

impl LocalRepo for GitRepo {
    fn main_project(&self) -> Result<Project> {
        for remote in ["upstream", "origin"] {
            if let Some(project) = self.remote_project(remote)? {
                return Ok(project);
            }
        }
        bail!("Aborted: could not find any git remote pointing to a GitHub repository")
    }

    fn current_project(&self) -> Result<Project> {
        let branch = self.current_branch()?;
        let key = format!("branch.{}.remote", branch);
        if let Some(remote) = self.read(&["config", "--get", &key])? {
            if let Some(project) = self.remote_project(&remote)? {
                return Ok(project);
            }
        }
        self.main_project()
    }

    fn current_branch(&self) -> Result<String> {
        match self.read(&["symbolic-ref", "--short", "-q", "HEAD"])? {
            Some(branch) => Ok(branch),
            None => bail!("Aborted: not currently on any branch."),
        }
    }

    fn comment_char(&self) -> String {
        match self.read(&["config", "--get", "core.commentChar"]) {
            Ok(Some(c)) if c != "auto" => c,
            _ => "#".to_string(),
        }
    }
}

/// Extract host, owner and repository name from a remote URL.
///
/// Understands `https://host/owner/name(.git)`, `git://`, `ssh://[user@]host/...`
/// and scp-like `user@host:owner/name(.git)`.
pub fn parse_remote_url(url: &str) -> Option<Project> {
    lazy_static! {
        static ref REMOTE_RE: Regex = Regex::new(
            r"^(?:(?:https?|git|ssh)://(?:[^@/]+@)?|[^@/:]+@)?([^/:@]+)(?::\d+)?[:/]([^/]+)/([^/]+?)(?:\.git)?/?$"
        )
        .unwrap();
    }

    let caps = REMOTE_RE.captures(url.trim())?;
    Some(Project {
        host: caps[1].to_string(),
        owner: caps[2].to_string(),
        name: caps[3].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://github.com/jingweno/gh.git")]
    #[case("https://github.com/jingweno/gh")]
    #[case("https://github.com/jingweno/gh/")]
    #[case("git@github.com:jingweno/gh.git")]
    #[case("git://github.com/jingweno/gh.git")]
    #[case("ssh://git@github.com/jingweno/gh.git")]
    #[case("ssh://git@github.com:22/jingweno/gh.git")]
    fn test_parse_remote_url(#[case] url: &str) {
        let project = parse_remote_url(url).unwrap();
        assert_eq!(project.host, "github.com");
        assert_eq!(project.owner, "jingweno");
        assert_eq!(project.name, "gh");
    }

    #[test]
    fn test_parse_remote_url_keeps_dots_in_name() {
        let project = parse_remote_url("git@github.com:owner/my.repo.js.git").unwrap();
        assert_eq!(project.name, "my.repo.js");
        assert_eq!(project.to_string(), "owner/my.repo.js");
    }

    #[rstest]
    #[case("/srv/git/project.git")]
    #[case("../sibling")]
    #[case("file:///tmp/repo.git")]
    #[case("")]
    fn test_parse_remote_url_rejects_local_paths(#[case] url: &str) {
        assert_eq!(parse_remote_url(url), None);
    }

    #[test]
    fn test_executor_reports_launch_failure() {
        let err = GitExecutor
            .exec("ghx-definitely-not-a-program", &[])
            .unwrap_err();
        assert!(err.to_string().contains("Failed to run ghx-definitely-not-a-program"));
    }
}
