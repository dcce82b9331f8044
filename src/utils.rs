//! Small text helpers shared by the command handlers.
//!
//! - Joining argument vectors for log lines
//! - Splitting a message into title and body
//! - Splitting `file#label` asset specs

/// Join arguments with single spaces for display.
///
/// # Examples
/// ```ignore
/// assert_eq!(args_display(&["remote".into(), "add".into()]), "remote add");
/// ```
pub fn args_display(args: &[String]) -> String {
    args.join(" ")
}

/// Split a message into `(title, body)`.
///
/// The title is the first paragraph with its line breaks folded into
/// spaces; the body is everything after the first blank line.
///
/// # Examples
/// ```ignore
/// let (title, body) = split_message("v1.0\nfinal\n\nNotes here\n");
/// assert_eq!(title, "v1.0 final");
/// assert_eq!(body, "Notes here");
/// ```
pub fn split_message(message: &str) -> (String, String) {
    let normalized = message.replace("\r\n", "\n");
    let trimmed = normalized.trim();

    let (title, body) = match trimmed.split_once("\n\n") {
        Some((title, body)) => (title, body),
        None => (trimmed, ""),
    };

    let title = title
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (title, body.trim().to_string())
}

/// Split an asset spec on the first `#` into `(file, label)`.
///
/// # Examples
/// ```ignore
/// assert_eq!(split_asset("dist/app.zip#App for Linux"), ("dist/app.zip", "App for Linux"));
/// assert_eq!(split_asset("notes.txt"), ("notes.txt", ""));
/// ```
pub fn split_asset(spec: &str) -> (&str, &str) {
    spec.split_once('#').unwrap_or((spec, ""))
}
