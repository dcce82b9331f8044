mod args;
mod command;
mod config;
mod context;
mod dispatch;
mod editor;
mod flags;
mod git;
mod help_cmd;
mod hosting;
mod registry;
mod release_cmd;
mod remote_cmd;
mod utils;

#[cfg(test)]
mod testing;

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser;
use colored::Colorize;
use config::Config;
use context::Context;
use editor::MessageEditor;
use git::{GitExecutor, GitRepo};
use hosting::GhClient;
use registry::Registry;
use std::io::{self, Write};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

#[derive(Parser, Debug)]
#[command(
    name = "ghx",
    version,
    about = "git wrapper that adds GitHub commands",
    long_about = "Wraps git: known commands are handled or rewritten, everything else is passed to git unchanged.",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Show what would be done without doing it
    #[arg(short = 'n', long)]
    noop: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// git program to run for this invocation
    #[arg(long, value_name = "PATH")]
    git: Option<String>,

    /// Command and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "ghx:".red(), e);
            1
        }
    };
    std::process::exit(code);
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbosity > 2)
        .without_time();

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let mut config = Config::load();
    if let Some(program) = cli.git {
        config.git.program = program;
    }
    if !config.display.colors {
        colored::control::set_override(false);
    }

    let registry = Registry::builtin().context("Failed to build command registry")?;

    let mut args = Args::new(cli.args);
    if cli.noop {
        args.set_noop();
    }

    let repo = GitRepo::new(config.git.program.clone());
    let hosting = GhClient::new(&config.hosting);
    let mut ctx = Context {
        config,
        git: Box::new(GitExecutor),
        repo: Box::new(repo),
        hosting: Box::new(hosting),
        editor: Box::new(MessageEditor::new("RELEASE")),
        out: Box::new(io::stdout()),
        err: Box::new(io::stderr()),
    };

    let code = dispatch::dispatch(&registry, &mut args, &mut ctx);
    if let Err(e) = ctx.out.flush() {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(e).context("Failed to flush stdout");
        }
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options_before_command() {
        let cli = Cli::try_parse_from([
            "ghx", "-n", "-vv", "--git", "/opt/git", "release", "create", "-d", "v1",
        ])
        .unwrap();
        assert!(cli.noop);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.git.as_deref(), Some("/opt/git"));
        assert_eq!(cli.args, ["release", "create", "-d", "v1"]);
    }

    #[test]
    fn test_options_after_command_belong_to_command() {
        let cli = Cli::try_parse_from(["ghx", "log", "-n", "3", "-v"]).unwrap();
        assert!(!cli.noop);
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.args, ["log", "-n", "3", "-v"]);
    }

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["ghx"]).unwrap();
        assert!(cli.args.is_empty());
        assert!(!cli.noop);
    }
}
