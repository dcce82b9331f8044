use crate::context::Editor;
use crate::utils::split_message;
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Opens `$VISUAL`, `$EDITOR`, or `vi` on a temporary message file.
#[derive(Debug, Clone)]
pub struct MessageEditor {
    topic: String,
}

impl MessageEditor {
    /// `topic` names the temp file, e.g. `RELEASE` gives `RELEASE_EDITMSG-xxxx`.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    fn editor_command() -> String {
        std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string())
    }

    fn launch(editor: &str, path: &Path) -> Result<()> {
        debug!("editor: {} {}", editor, path.display());

        // The editor setting may carry its own arguments ("code --wait").
        let status = if cfg!(target_os = "windows") {
            Command::new("cmd")
                .arg("/C")
                .arg(format!("{} \"{}\"", editor, path.display()))
                .status()
        } else {
            Command::new("sh")
                .arg("-c")
                .arg(format!("{} \"$1\"", editor))
                .arg(editor)
                .arg(path)
                .status()
        }
        .with_context(|| format!("Failed to launch editor {}", editor))?;

        if !status.success() {
            bail!("editor {} exited with {}", editor, status);
        }
        Ok(())
    }
}

impl Editor for MessageEditor {
    fn edit_title_and_body(&self, comment_char: &str, template: &str) -> Result<(String, String)> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}_EDITMSG-", self.topic))
            .tempfile()
            .context("Failed to create message file")?;
        file.write_all(template.as_bytes())?;
        file.flush()?;

        Self::launch(&Self::editor_command(), file.path())?;

        let edited = std::fs::read_to_string(file.path())
            .with_context(|| format!("Failed to read {}", file.path().display()))?;
        let message = strip_comments(&edited, comment_char);
        if message.trim().is_empty() {
            bail!("Aborting due to empty message");
        }
        Ok(split_message(&message))
    }
}

/// Drop every line that starts with `comment_char`.
pub fn strip_comments(text: &str, comment_char: &str) -> String {
    text.lines()
        .filter(|line| comment_char.is_empty() || !line.starts_with(comment_char))
        .collect::<Vec<_>>()
        .join("\n")
}
