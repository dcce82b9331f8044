//! Route one invocation to a command, or hand it to git untouched.
//!
//! Nothing in here exits the process: [`dispatch`] turns whatever happened
//! into a status code and `main` is the only place that calls `exit`.

use crate::args::Args;
use crate::command::{Action, CmdError, CmdResult, Command, Invocation, Outcome};
use crate::context::Context;
use crate::flags::FlagValues;
use crate::registry::Registry;
use crate::utils::args_display;
use colored::Colorize;
use tracing::{debug, trace};

/// Run `args` against `registry` and report the exit status.
pub fn dispatch(registry: &Registry, args: &mut Args, ctx: &mut Context) -> i32 {
    match route(registry, args, ctx) {
        Ok(outcome) => outcome.code(),
        Err(err) => {
            let code = err.exit_code();
            ctx.warn(format!("{} {}", "ghx:".red(), DisplayChain(&err)));
            code
        }
    }
}

fn route(registry: &Registry, args: &mut Args, ctx: &mut Context) -> CmdResult {
    let command = args.first().ok().and_then(|name| registry.lookup(name));
    let Some(command) = command else {
        debug!("no command matches, forwarding: {}", args_display(args.params()));
        let code = ctx.run_git(&args.array(), args.is_noop())?;
        return Ok(Outcome::Exit(code));
    };

    args.consume()?;
    let (command, flags) = resolve(command, args)?;
    debug!(
        "resolved `{}', remaining: {}",
        args_display(args.command_path()),
        args_display(args.params())
    );
    invoke(registry, command, args, flags, ctx)
}

/// Walk down the tree as far as action keywords allow, stripping each
/// visited node's flags on the way.
fn resolve<'r>(
    mut node: &'r Command,
    args: &mut Args,
) -> Result<(&'r Command, FlagValues), CmdError> {
    let mut inherited = FlagValues::default();

    loop {
        if let Some(child) = keyword_child(node, args) {
            trace!("`{}' -> `{}'", node.name(), child.name());
            args.consume()?;
            node = child;
            continue;
        }

        let mut values = node.flag_set().parse(args)?;
        values.merge_parent(std::mem::take(&mut inherited));
        inherited = values;

        match keyword_child(node, args) {
            Some(child) => {
                trace!("`{}' -> `{}' after flags", node.name(), child.name());
                args.consume()?;
                node = child;
            }
            None => return Ok((node, inherited)),
        }
    }
}

fn keyword_child<'r>(node: &'r Command, args: &Args) -> Option<&'r Command> {
    args.first().ok().and_then(|keyword| node.child(keyword))
}

fn invoke(
    registry: &Registry,
    command: &Command,
    args: &mut Args,
    flags: FlagValues,
    ctx: &mut Context,
) -> CmdResult {
    match command.action() {
        Some(Action::Run(handler)) => {
            let mut invocation = Invocation {
                command,
                registry,
                args,
                flags,
            };
            handler(&mut invocation, ctx)
        }
        Some(Action::PassThrough(transform)) => {
            transform(args, ctx)?;
            debug!("delegating: {}", args_display(&args.array()));
            let code = ctx.run_git(&args.array(), args.is_noop())?;
            Ok(Outcome::Exit(code))
        }
        None => {
            ctx.warn(command.usage_text().trim_end());
            Ok(Outcome::Exit(2))
        }
    }
}

/// Collaborator failures print their whole context chain on one line.
struct DisplayChain<'a>(&'a CmdError);

impl std::fmt::Display for DisplayChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            CmdError::Usage(message) => write!(f, "{}", message),
            CmdError::Failure(err) => write!(f, "{:#}", err),
        }
    }
}
