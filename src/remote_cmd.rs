use crate::args::{is_flag_like, Args};
use crate::command::{CmdError, Command};
use crate::config::Protocol;
use crate::context::Context;
use anyhow::Context as _;
use tracing::debug;

const LONG: &str = "View and manage a set of remote repositories.

    remote add [-p] USER[/REPOSITORY]
    remote set-url [-p] USER[/REPOSITORY]

Expands USER into the URL of USER's fork of the current repository and
adds it as a remote named USER. With USER/REPOSITORY the named repository
is used instead. `origin' stands for the authenticated user.

    -p  Use the SSH transport (for private repositories).

Every other form is passed to git unchanged.";

pub fn command() -> Command {
    Command::new("remote")
        .usage("remote [-p] OPTIONS USER[/REPOSITORY]")
        .summary("View and manage a set of remote repositories")
        .long(LONG)
        .pass_through(transform_remote_args)
}

/// `remote add [-p] USER[/REPO]` -> `remote add USER <url>`
fn transform_remote_args(args: &mut Args, ctx: &mut Context) -> Result<(), CmdError> {
    if !is_expandable(args) {
        return Ok(());
    }

    let private = match args.index_of("-p") {
        Some(i) => {
            args.remove(i)?;
            true
        }
        None => false,
    };
    let Some(at) = owner_index(args) else {
        return Ok(());
    };
    let owner = args.remove(at)?;

    let (name, owner, repo, host) = match owner.split_once('/') {
        Some((user, repo)) => (
            user.to_string(),
            user.to_string(),
            repo.to_string(),
            ctx.config.hosting.host.clone(),
        ),
        None => {
            let project = ctx.repo.main_project()?;
            let login = if owner == "origin" {
                fetch_login(ctx, &project.host)?
            } else {
                owner.clone()
            };
            (owner, login, project.name, project.host)
        }
    };

    let protocol = if private {
        Protocol::Ssh
    } else {
        ctx.config.hosting.protocol
    };
    let url = remote_url(&host, &owner, &repo, protocol);
    debug!("remote {} -> {}", name, url);

    args.append([name, url]);
    Ok(())
}

fn is_expandable(args: &Args) -> bool {
    if !matches!(args.first(), Ok("add" | "set-url")) {
        return false;
    }
    match owner_index(args) {
        Some(at) if at > 0 => !is_explicit_location(&args.params()[at]),
        _ => false,
    }
}

/// Position of the last positional token; trailing git options stay put.
fn owner_index(args: &Args) -> Option<usize> {
    args.params().iter().rposition(|t| !is_flag_like(t))
}

/// Already a URL or a local path, not an owner name.
fn is_explicit_location(token: &str) -> bool {
    token.contains(':')
        || token.starts_with(['.', '/', '~'])
        || token.matches('/').count() > 1
}

fn fetch_login(ctx: &Context, host: &str) -> Result<String, CmdError> {
    if !ctx.config.hosting.user.is_empty() {
        return Ok(ctx.config.hosting.user.clone());
    }
    let login = ctx
        .hosting
        .current_user(host)
        .context("Unable to determine the login for `origin'")?;
    Ok(login)
}

pub fn remote_url(host: &str, owner: &str, repo: &str, protocol: Protocol) -> String {
    match protocol {
        Protocol::Ssh => format!("git@{}:{}/{}.git", host, owner, repo),
        Protocol::Https => format!("https://{}/{}/{}.git", host, owner, repo),
    }
}
