//! GitHub release API, reached through the authenticated `gh` CLI.
//!
//! ghx never handles tokens itself: every request is `gh api ...`, so the
//! user's existing `gh auth` session (and GitHub Enterprise host config)
//! applies.

use crate::config::HostingConfig;
use crate::context::{Asset, Hosting, NewRelease, Project, Release};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GhClient {
    cli: String,
}

impl GhClient {
    pub fn new(config: &HostingConfig) -> Self {
        Self {
            cli: config.cli.clone(),
        }
    }

    fn api(&self, host: &str, args: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut cmd = Command::new(&self.cli);
        cmd.arg("api").arg("--hostname").arg(host).args(args);
        debug!("{} api --hostname {} {}", self.cli, host, args.join(" "));

        let output = match stdin {
            None => cmd.output(),
            Some(body) => {
                let mut child = cmd
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .with_context(|| format!("Failed to run {} api", self.cli))?;
                if let Some(mut pipe) = child.stdin.take() {
                    pipe.write_all(body)?;
                }
                child.wait_with_output()
            }
        }
        .with_context(|| format!("Failed to run {} api", self.cli))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} api {}: {}", self.cli, endpoint_of(args), stderr.trim());
        }
        Ok(output.stdout)
    }
}

fn endpoint_of(args: &[String]) -> &str {
    args.iter()
        .find(|a| a.contains('/') && !a.starts_with('-'))
        .map(String::as_str)
        .unwrap_or("")
}

/// `gh api --paginate` prints one JSON array per page back to back.
fn parse_pages<T: for<'de> Deserialize<'de>>(raw: &[u8]) -> Result<Vec<T>> {
    let mut items = Vec::new();
    for page in serde_json::Deserializer::from_slice(raw).into_iter::<Vec<T>>() {
        items.extend(page.context("Failed to parse API response")?);
    }
    Ok(items)
}

/// Upload endpoint from a release's `upload_url` template.
fn upload_endpoint(release: &Release) -> Result<String> {
    let base = release
        .upload_url
        .split('{')
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() {
        bail!("Release {} has no upload URL", release.tag_name);
    }
    Ok(base.to_string())
}

impl Hosting for GhClient {
    fn fetch_releases(&self, project: &Project) -> Result<Vec<Release>> {
        let raw = self.api(
            &project.host,
            &[
                "--paginate".to_string(),
                format!("repos/{}/releases?per_page=100", project),
            ],
            None,
        )?;
        parse_pages(&raw)
    }

    fn fetch_release(&self, project: &Project, tag: &str) -> Result<Release> {
        let raw = self
            .api(
                &project.host,
                &[format!("repos/{}/releases/tags/{}", project, tag)],
                None,
            )
            .with_context(|| format!("Unable to find release with tag name `{}'", tag))?;
        serde_json::from_slice(&raw).context("Failed to parse release")
    }

    fn create_release(&self, project: &Project, params: &NewRelease) -> Result<Release> {
        let body = serde_json::to_vec(params)?;
        let raw = self
            .api(
                &project.host,
                &[
                    "--method".to_string(),
                    "POST".to_string(),
                    format!("repos/{}/releases", project),
                    "--input".to_string(),
                    "-".to_string(),
                ],
                Some(&body),
            )
            .context("Error creating release")?;
        serde_json::from_slice(&raw).context("Failed to parse created release")
    }

    fn upload_asset(
        &self,
        project: &Project,
        release: &Release,
        path: &Path,
        label: &str,
    ) -> Result<Asset> {
        if !path.is_file() {
            bail!("Asset {} is not a file", path.display());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut args = vec![
            "--method".to_string(),
            "POST".to_string(),
            "-H".to_string(),
            "Content-Type: application/octet-stream".to_string(),
            "--input".to_string(),
            path.display().to_string(),
            "-f".to_string(),
            format!("name={}", name),
        ];
        if !label.is_empty() {
            args.push("-f".to_string());
            args.push(format!("label={}", label));
        }
        args.push(upload_endpoint(release)?);

        let raw = self
            .api(&project.host, &args, None)
            .with_context(|| format!("Error uploading release asset {}", path.display()))?;
        serde_json::from_slice(&raw).context("Failed to parse uploaded asset")
    }

    fn current_user(&self, host: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct User {
            login: String,
        }

        let raw = self.api(host, &["user".to_string()], None)?;
        let user: User = serde_json::from_slice(&raw).context("Failed to parse user")?;
        Ok(user.login)
    }
}
