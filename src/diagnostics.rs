//! Warning aggregation and diagnostic summaries.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::palette;

/// An entry a command passed over without aborting.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    /// Path of the skipped entry.
    pub(crate) path: PathBuf,
    /// Reason the entry was skipped.
    pub(crate) reason: String,
}

/// Aggregates warnings and skipped entries for a command run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Whether warnings are colorized.
    use_color: bool,
    /// Collected warning messages.
    warnings: Vec<String>,
    /// Collected skipped entries.
    skipped: Vec<SkippedEntry>,
}

impl Diagnostics {
    /// Create a new diagnostics collector.
    pub(crate) fn new(use_color: bool) -> Self {
        Self {
            use_color,
            ..Self::default()
        }
    }

    /// Record a warning and print it immediately.
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        eprintln!(
            "{} {message}",
            palette::fmt_warning("Warning:", self.use_color)
        );
        self.warnings.push(message);
    }

    /// Record a skipped entry and emit the warning.
    pub(crate) fn warn_skipped(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        self.warn(format!("{} - {reason}", path.display()));
        self.skipped.push(SkippedEntry {
            path: path.to_path_buf(),
            reason,
        });
    }

    /// Number of warnings recorded so far.
    pub(crate) fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Print a summary for skipped entries if any were recorded.
    pub(crate) fn print_skipped_summary(&self) {
        if self.skipped.is_empty() {
            return;
        }

        eprintln!("Skipped {} entries due to errors:", self.skipped.len());
        for skipped in &self.skipped {
            eprintln!("  - {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    /// Print a warning summary when warnings were emitted.
    pub(crate) fn print_warning_summary(&self) {
        if self.warnings.is_empty() {
            return;
        }

        eprintln!("Completed with {} warning(s).", self.warnings.len());
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::Diagnostics;

    #[test]
    fn counts_warnings_and_skips() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.warn("gitignore template not found");
        diagnostics.warn_skipped(Path::new("templates/broken"), "invalid template.json");
        assert_eq!(diagnostics.warning_count(), 2);
        assert_eq!(diagnostics.skipped.len(), 1);
        assert_eq!(diagnostics.skipped[0].reason, "invalid template.json");
    }
}
