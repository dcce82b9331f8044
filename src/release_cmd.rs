use crate::command::{CmdError, CmdResult, Command, Invocation, Outcome};
use crate::context::{Context, NewRelease, Project, Release};
use crate::flags::{flag_set, FlagStruct};
use crate::registry::RegistryError;
use crate::utils::{split_asset, split_message};
use anyhow::{anyhow, Context as _};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const USAGE: &str = "
release
release show <TAG>
release create [-dp] [-a <FILE>] [-m <MESSAGE>|-f <FILE>] [-c <COMMIT>] <TAG>
";

const LONG: &str = "Manage GitHub releases.

## Commands:

With no arguments, shows a list of existing releases.

With '--include-drafts', include draft releases in the listing.

    * show:
        Show GitHub release notes for <TAG>.

        With '--show-downloads' option, include the \"Downloads\" section.

    * create:
        Create a GitHub release for the specified <TAG> name. If git tag <TAG>
        doesn't exist, it will be created at <COMMIT> (default: current branch).

## Options:
    -d, --draft
        Create a draft release.

    -p, --prerelease
        Create a pre-release.

    -a, --attach <FILE>
        Attach a file as an asset for this release.

        If <FILE> is in the \"<filename>#<text>\" format, the text after the '#'
        character is taken as asset label.

    -m, --message <MESSAGE>
        Use the first paragraph of <MESSAGE> as release title, and the rest as
        release description.

    -f, --file <FILE>
        Read the release title and description from <FILE> ('-' for stdin).

    -c, --commitish <COMMIT>
        A SHA, tag, or branch name to attach the release to (default: current branch).

    <TAG>
        The git tag name for this release.";

flag_set! {
    pub struct ListFlags {
        include_drafts: bool = ("include-drafts", 'd'),
    }
}

flag_set! {
    pub struct ShowFlags {
        show_downloads: bool = ("show-downloads", 'd'),
    }
}

flag_set! {
    pub struct CreateFlags {
        draft: bool = ("draft", 'd'),
        prerelease: bool = ("prerelease", 'p'),
        assets: Vec<String> = ("attach", 'a'),
        message: String = ("message", 'm'),
        file: String = ("file", 'f'),
        commitish: String = ("commitish", 'c'),
    }
}

pub fn command() -> Result<Command, RegistryError> {
    let show = Command::new("show")
        .usage("release show [-d] <TAG>")
        .summary("Show GitHub release notes for <TAG>")
        .flags(ShowFlags::grammar()?)
        .run(show_release);

    let create = Command::new("create")
        .usage("release create [-dp] [-a <FILE>] [-m <MESSAGE>|-f <FILE>] [-c <COMMIT>] <TAG>")
        .summary("Create a GitHub release for <TAG>")
        .flags(CreateFlags::grammar()?)
        .run(create_release);

    Command::new("release")
        .usage(USAGE)
        .summary("Manage GitHub releases")
        .long(LONG)
        .flags(ListFlags::grammar()?)
        .run(list_releases)
        .subcommand(show)?
        .subcommand(create)
}

/// `release [-d]`
fn list_releases(inv: &mut Invocation<'_>, ctx: &mut Context) -> CmdResult {
    let flags = ListFlags::from_values(&inv.flags);
    let project = ctx.repo.main_project()?;

    if inv.args.is_noop() {
        writeln!(ctx.out, "Would request list of releases for {}", project)?;
        return Ok(Outcome::Done);
    }

    let releases = ctx.hosting.fetch_releases(&project)?;
    debug!("{} releases for {}", releases.len(), project);
    for release in releases.iter().filter(|r| flags.include_drafts || !r.draft) {
        writeln!(ctx.out, "{}", release.tag_name)?;
    }
    Ok(Outcome::Done)
}

/// `release show [-d] <TAG>`
fn show_release(inv: &mut Invocation<'_>, ctx: &mut Context) -> CmdResult {
    let tag = required_tag(inv)?;
    let flags = ShowFlags::from_values(&inv.flags);
    let project = ctx.repo.main_project()?;

    if inv.args.is_noop() {
        writeln!(ctx.out, "Would display information for `{}' release", tag)?;
        return Ok(Outcome::Done);
    }

    let release = ctx.hosting.fetch_release(&project, &tag)?;
    write!(ctx.out, "{}", render_release(&release, flags.show_downloads))?;
    Ok(Outcome::Done)
}

fn render_release(release: &Release, downloads: bool) -> String {
    let mut text = format!("{} ({})\n", release.name, release.tag_name);

    let body = release.body.trim();
    if !body.is_empty() {
        text.push_str(&format!("\n{}\n", body));
    }

    if downloads {
        text.push_str("\n## Downloads\n\n");
        for asset in &release.assets {
            text.push_str(&format!("{}\n", asset.browser_download_url));
        }
        if !release.zipball_url.is_empty() {
            text.push_str(&format!("{}\n", release.zipball_url));
            text.push_str(&format!("{}\n", release.tarball_url));
        }
    }
    text
}

/// `release create [-dp] [-a <FILE>] [-m <MESSAGE>|-f <FILE>] [-c <COMMIT>] <TAG>`
fn create_release(inv: &mut Invocation<'_>, ctx: &mut Context) -> CmdResult {
    let tag = required_tag(inv)?;
    let flags = CreateFlags::from_values(&inv.flags);
    let noop = inv.args.is_noop();

    let project = ctx.repo.current_project()?;
    let commitish = if flags.commitish.is_empty() {
        ctx.repo.current_branch()?
    } else {
        flags.commitish.clone()
    };

    let (title, body) = release_message(&flags, ctx, &tag, &project, &commitish)?;
    if title.is_empty() {
        return Err(anyhow!("Aborting release due to empty release title").into());
    }

    let params = NewRelease {
        tag_name: tag.clone(),
        target_commitish: commitish,
        name: title,
        body,
        draft: flags.draft,
        prerelease: flags.prerelease,
    };

    if noop {
        writeln!(
            ctx.out,
            "Would create release `{}' for {} with tag name `{}'",
            params.name, project, tag
        )?;
        for spec in &flags.assets {
            let (file, label) = split_asset(spec);
            if label.is_empty() {
                ctx.warn(format!("Would attach release asset `{}'", file));
            } else {
                ctx.warn(format!(
                    "Would attach release asset `{}' with label `{}'",
                    file, label
                ));
            }
        }
        return Ok(Outcome::Done);
    }

    let release = ctx.hosting.create_release(&project, &params)?;
    info!("created release {} ({})", release.tag_name, release.id);
    writeln!(ctx.out, "{}", release.html_url)?;

    for spec in &flags.assets {
        let (file, label) = split_asset(spec);
        ctx.warn(format!("Attaching release asset `{}'...", file));
        ctx.hosting
            .upload_asset(&project, &release, Path::new(file), label)?;
    }
    Ok(Outcome::Done)
}

fn required_tag(inv: &Invocation<'_>) -> Result<String, CmdError> {
    let tag = inv.args.last_param();
    if tag.is_empty() {
        debug!("release {}: no TAG in {:?}", inv.command.name(), inv.args.params());
        return Err(CmdError::usage("Missing argument TAG"));
    }
    Ok(tag)
}

/// Title and body from `-m`, `-f`, or the editor, in that order.
fn release_message(
    flags: &CreateFlags,
    ctx: &Context,
    tag: &str,
    project: &Project,
    commitish: &str,
) -> Result<(String, String), CmdError> {
    if !flags.message.is_empty() {
        return Ok(split_message(&flags.message));
    }
    if !flags.file.is_empty() {
        let text = read_message_file(&flags.file)?;
        return Ok(split_message(&text));
    }

    let cc = ctx.repo.comment_char();
    let template = release_template(&cc, tag, project, commitish);
    Ok(ctx.editor.edit_title_and_body(&cc, &template)?)
}

fn read_message_file(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read message from stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
}

fn release_template(cc: &str, tag: &str, project: &Project, commitish: &str) -> String {
    format!(
        "{cc} Creating release {tag} for {project} from {commitish}\n\
         {cc}\n\
         {cc} Write a message for this release. The first block of\n\
         {cc} text is the title and the rest is the description.\n"
    )
}
