use crate::command::{CmdError, CmdResult, Command, Invocation, Outcome};
use crate::context::Context;
use crate::registry::Registry;
use std::io::Write;

pub fn command() -> Command {
    Command::new("help")
        .usage("help [command]")
        .summary("Show help")
        .long("Shows usage for a command.")
        .unlisted()
        .run(run)
}

fn run(inv: &mut Invocation<'_>, ctx: &mut Context) -> CmdResult {
    if inv.args.is_empty() {
        write!(ctx.out, "{}", render_listing(inv.registry))?;
        return Ok(Outcome::Done);
    }
    if inv.args.size() != 1 {
        return Err(CmdError::usage("too many arguments"));
    }

    let topic = inv.args.first()?;
    match inv.registry.lookup(topic) {
        Some(command) => {
            write!(ctx.out, "{}", command.usage_text())?;
            Ok(Outcome::Done)
        }
        None => {
            ctx.warn(format!("Unknown help topic: {:?}. Run 'ghx help'.", topic));
            Ok(Outcome::Exit(2))
        }
    }
}

/// Every listed command, grouped by category.
pub fn render_listing(registry: &Registry) -> String {
    let mut text = String::from("Usage: ghx [command] [options] [arguments]\n");

    for (title, commands) in registry.categories() {
        let listed: Vec<&Command> = commands.into_iter().filter(|c| c.is_listed()).collect();
        if listed.is_empty() {
            continue;
        }
        text.push_str(&format!("\n{}:\n", title));
        for command in listed {
            text.push_str(&format!("    {:<16}  {}\n", command.name(), command.short()));
        }
    }

    text.push_str("\nSee 'ghx help [command]' for more information about a command.\n");
    text
}
