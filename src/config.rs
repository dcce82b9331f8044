use crate::args::Args;
use crate::command::{CmdResult, Command, Invocation, Outcome};
use crate::context::Context;
use crate::flags::{flag_set, FlagStruct};
use crate::registry::RegistryError;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub hosting: HostingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitConfig {
    pub program: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: "git".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Https,
    Ssh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostingConfig {
    pub host: String,
    pub protocol: Protocol,
    pub cli: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            host: "github.com".into(),
            protocol: Protocol::Https,
            cli: "gh".into(),
            user: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub colors: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { colors: true }
    }
}

impl Config {
    /// Effective configuration. An unreadable config file is reported as a
    /// warning and the defaults are used.
    pub fn load() -> Self {
        let mut config = match get_config_path() {
            Ok(path) => Self::load_or_default(&path),
            Err(e) => {
                warn!("{:#}; using default configuration", e);
                Config::default()
            }
        };
        if let Ok(program) = std::env::var("GHX_GIT") {
            if !program.is_empty() {
                config.git.program = program;
            }
        }
        config
    }

    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!("{:#}; using default configuration", e);
            Config::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(config_dir.join("ghx").join("config.toml"))
}

flag_set! {
    pub struct ConfigFlags {
        create: bool = ("create"),
    }
}

pub fn command() -> Result<Command, RegistryError> {
    Ok(Command::new("config")
        .usage("config [--create]")
        .summary("Show or create the configuration file")
        .flags(ConfigFlags::grammar()?)
        .run(run))
}

/// `config [--create]`
pub fn run(inv: &mut Invocation<'_>, ctx: &mut Context) -> CmdResult {
    let flags = ConfigFlags::from_values(&inv.flags);
    let path = get_config_path()?;
    if flags.create {
        create_default(inv.args, ctx, &path)
    } else {
        show_config(ctx, &path)
    }
}

fn create_default(args: &Args, ctx: &mut Context, path: &Path) -> CmdResult {
    if args.is_noop() {
        writeln!(ctx.out, "Would write default config to {}", path.display())?;
        return Ok(Outcome::Done);
    }
    Config::default().save_to(path)?;
    writeln!(ctx.out, "Created: {}", path.display())?;
    Ok(Outcome::Done)
}

fn show_config(ctx: &mut Context, path: &Path) -> CmdResult {
    writeln!(ctx.out, "Config: {}", path.display())?;
    writeln!(ctx.out)?;

    if !path.exists() {
        writeln!(ctx.out, "(default config, file not created)")?;
        writeln!(ctx.out)?;
    }
    let rendered = toml::to_string_pretty(&ctx.config).context("Failed to render config")?;
    writeln!(ctx.out, "{}", rendered)?;
    Ok(Outcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.git.program, "git");
        assert_eq!(config.hosting.host, "github.com");
        assert_eq!(config.hosting.protocol, Protocol::Https);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[hosting]\nhost = \"ghe.example.com\"\nprotocol = \"ssh\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.hosting.host, "ghe.example.com");
        assert_eq!(config.hosting.protocol, Protocol::Ssh);
        assert_eq!(config.hosting.cli, "gh");
        assert_eq!(config.git.program, "git");
        assert!(config.display.colors);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.hosting.user = "octocat".into();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[git\nprogram = 1").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hosting\nhost = ").unwrap();
        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn test_config_command_shows_effective_config() {
        let mut h = crate::testing::Harness::new();
        h.ctx.config.git.program = "/opt/git/bin/git".into();
        assert_eq!(h.run(&["config"]), 0);
        let out = h.out.contents();
        assert!(out.starts_with("Config: "));
        assert!(out.contains("[git]\nprogram = \"/opt/git/bin/git\""));
        assert!(out.contains("protocol = \"https\""));
        assert!(h.exec.calls().is_empty());
    }

    #[test]
    fn test_config_create_noop_writes_nothing() {
        let mut h = crate::testing::Harness::new();
        assert_eq!(h.run_noop(&["config", "--create"]), 0);
        let expected = format!(
            "Would write default config to {}\n",
            get_config_path().unwrap().display()
        );
        assert_eq!(h.out.contents(), expected);
    }
}
