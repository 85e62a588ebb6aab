//! Color palette and styling for CLI output.
//!
//! Every formatter takes `use_color` so callers can route the decision from
//! `--color` without checking the terminal themselves.

use owo_colors::{OwoColorize, Style};

/// Style for identifiers: repository names, issue numbers, gist ids.
pub fn name() -> Style {
    Style::new().cyan().bold()
}

/// Style for section headings like "Open issues for octo/cat:".
pub fn heading() -> Style {
    Style::new().white().bold()
}

/// Style for labels like "State:" or "Author:".
pub fn label() -> Style {
    Style::new().blue()
}

/// Style for secondary text - readable but subdued.
pub fn description() -> Style {
    Style::new().dimmed()
}

/// Style for local paths and URLs.
pub fn path() -> Style {
    Style::new().white()
}

/// Style for open or successful states.
pub fn status_ok() -> Style {
    Style::new().green()
}

/// Style for pending or in-progress states.
pub fn status_pending() -> Style {
    Style::new().yellow()
}

/// Style for closed or failed states.
pub fn status_error() -> Style {
    Style::new().red()
}

/// Style for merged pull requests.
pub fn status_merged() -> Style {
    Style::new().magenta()
}

/// Style for warning text.
pub fn warning() -> Style {
    Style::new().yellow()
}

/// Apply `style` when color is enabled.
fn paint(text: &str, style: Style, use_color: bool) -> String {
    if use_color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// Format an identifier with styling.
pub fn fmt_name(text: &str, use_color: bool) -> String {
    paint(text, name(), use_color)
}

/// Format a section heading with styling.
pub fn fmt_heading(text: &str, use_color: bool) -> String {
    paint(text, heading(), use_color)
}

/// Format a label with styling.
pub fn fmt_label(text: &str, use_color: bool) -> String {
    paint(text, label(), use_color)
}

/// Format secondary text with styling.
pub fn fmt_description(text: &str, use_color: bool) -> String {
    paint(text, description(), use_color)
}

/// Format a path or URL with styling.
pub fn fmt_path(text: &str, use_color: bool) -> String {
    paint(text, path(), use_color)
}

/// Format warning text with styling.
pub fn fmt_warning(text: &str, use_color: bool) -> String {
    paint(text, warning(), use_color)
}

/// Format a remote state word (`open`, `closed`, `success`, ...) by meaning.
pub fn fmt_state(state: &str, use_color: bool) -> String {
    let style = match state {
        "open" | "success" | "completed" | "active" => status_ok(),
        "merged" => status_merged(),
        "closed" | "failure" | "cancelled" | "timed_out" | "startup_failure" => status_error(),
        _ => status_pending(),
    };
    paint(state, style, use_color)
}

#[cfg(test)]
mod tests {
    use super::{fmt_name, fmt_state};

    #[test]
    fn disables_color_output() {
        assert_eq!(fmt_state("failure", false), "failure");
        assert_eq!(fmt_name("octo/cat", false), "octo/cat");
    }

    #[test]
    fn colors_when_enabled() {
        let painted = fmt_state("open", true);
        assert!(painted.contains("open"));
        assert_ne!(painted, "open");
    }
}
