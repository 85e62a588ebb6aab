//! Release notes built from the commit log since the previous tag.

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::{error::Result, git::Git};

/// Body used when the range holds no commits.
const NO_CHANGES: &str = "No changes since previous release.\n";

/// Section a commit line is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommitKind {
    /// New functionality.
    Feature,
    /// Bug fixes.
    Fix,
    /// Documentation changes.
    Docs,
    /// Everything else.
    Other,
}

impl CommitKind {
    /// Kinds in the order their sections are printed.
    const ORDER: [Self; 4] = [Self::Feature, Self::Fix, Self::Docs, Self::Other];

    /// Markdown section heading.
    fn heading(self) -> &'static str {
        match self {
            Self::Feature => "Features",
            Self::Fix => "Bug Fixes",
            Self::Docs => "Documentation",
            Self::Other => "Other Changes",
        }
    }

    /// Keywords that file a line under this kind.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Feature => &["feat", "feature", "add", "new"],
            Self::Fix => &["fix", "bug", "issue", "error", "crash"],
            Self::Docs => &["doc", "docs", "documentation"],
            Self::Other => &[],
        }
    }
}

/// File a commit line by keyword, case-insensitively, first match wins.
pub fn classify(line: &str) -> CommitKind {
    let lower = line.to_lowercase();
    CommitKind::ORDER
        .into_iter()
        .find(|kind| kind.keywords().iter().any(|word| lower.contains(word)))
        .unwrap_or(CommitKind::Other)
}

/// Render Markdown notes for `tag` from one-line commit summaries.
pub fn render_notes(tag: &str, date: NaiveDate, commits: &[String]) -> String {
    let mut notes = format!("# Release {tag} ({})\n\n", date.format("%Y-%m-%d"));
    let commits: Vec<&String> = commits.iter().filter(|line| !line.is_empty()).collect();
    if commits.is_empty() {
        notes.push_str(NO_CHANGES);
        return notes;
    }
    for kind in CommitKind::ORDER {
        let lines: Vec<&&String> = commits
            .iter()
            .filter(|line| classify(line) == kind)
            .collect();
        if lines.is_empty() {
            continue;
        }
        notes.push_str(&format!("## {}\n\n", kind.heading()));
        for line in lines {
            notes.push_str(&format!("* {line}\n"));
        }
        notes.push('\n');
    }
    notes
}

/// Tag or commit the notes range starts from.
///
/// The nearest tag before `HEAD`, else the repository's root commit.
pub fn previous_release(git: &Git) -> Result<String> {
    if let Some(tag) = git.try_run(&["describe", "--tags", "--abbrev=0", "HEAD^"])?
        && !tag.is_empty()
    {
        return Ok(tag);
    }
    let roots = git.run(&["rev-list", "--max-parents=0", "HEAD"])?;
    Ok(roots.lines().next().unwrap_or_default().to_string())
}

/// Generate notes for `tag` from the commits after `previous` (or the
/// detected previous release) up to `HEAD`.
pub fn generate(git: &Git, tag: &str, previous: Option<&str>) -> Result<String> {
    let previous = match previous {
        Some(previous) => previous.to_string(),
        None => previous_release(git)?,
    };
    debug!(%previous, "collecting commits for release notes");
    let range = if previous.is_empty() {
        "HEAD".to_string()
    } else {
        format!("{previous}..HEAD")
    };
    let log = git.run(&["log", &range, "--pretty=format:%h %s (%an)"])?;
    let commits: Vec<String> = log.lines().map(str::to_string).collect();
    info!(tag, commits = commits.len(), "generated release notes");
    Ok(render_notes(tag, Local::now().date_naive(), &commits))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::{CommitKind, classify, generate, render_notes};
    use crate::git::Git;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).expect("date")
    }

    #[test]
    fn classifies_in_priority_order() {
        assert_eq!(classify("abc1234 FEAT: login page (Ann)"), CommitKind::Feature);
        assert_eq!(classify("abc1234 Fix crash on start (Ann)"), CommitKind::Fix);
        assert_eq!(classify("abc1234 Update README docs (Ann)"), CommitKind::Docs);
        assert_eq!(classify("abc1234 Bump deps (Ann)"), CommitKind::Other);
        assert_eq!(classify("abc1234 Add fix for doc typo (Ann)"), CommitKind::Feature);
    }

    #[test]
    fn renders_sections_in_fixed_order() {
        let commits = vec![
            "c4 Bump deps (Ann)".to_string(),
            "c3 Write docs for setup (Ann)".to_string(),
            "c2 Fix crash (Ann)".to_string(),
            "c1 Add login (Ann)".to_string(),
        ];
        let notes = render_notes("v1.0.0", date(), &commits);
        assert_eq!(
            notes,
            "# Release v1.0.0 (2024-03-09)\n\n\
             ## Features\n\n* c1 Add login (Ann)\n\n\
             ## Bug Fixes\n\n* c2 Fix crash (Ann)\n\n\
             ## Documentation\n\n* c3 Write docs for setup (Ann)\n\n\
             ## Other Changes\n\n* c4 Bump deps (Ann)\n\n"
        );
    }

    #[test]
    fn empty_range_has_no_changes_body() {
        let notes = render_notes("v1.0.1", date(), &[String::new()]);
        assert_eq!(
            notes,
            "# Release v1.0.1 (2024-03-09)\n\nNo changes since previous release.\n"
        );
    }

    #[test]
    fn generates_from_commits_after_previous_tag() {
        let dir = tempdir().expect("tempdir");
        let git = Git::new(dir.path());
        git.init_main().expect("init");
        git.config_set("user.name", "Tester", false).expect("name");
        git.config_set("user.email", "tester@example.com", false)
            .expect("email");
        git.config_set("commit.gpgsign", "false", false)
            .expect("gpgsign");
        git.config_set("tag.gpgsign", "false", false).expect("tag sign");

        fs::write(dir.path().join("a.txt"), "a").expect("write");
        git.stage(&[]).expect("stage");
        git.commit("Initial import").expect("commit");
        git.tag("v0.1.0", "Release v0.1.0", false).expect("tag");
        fs::write(dir.path().join("b.txt"), "b").expect("write");
        git.stage(&[]).expect("stage");
        git.commit("Support login").expect("commit");

        let notes = generate(&git, "v0.2.0", None).expect("notes");
        assert!(notes.starts_with("# Release v0.2.0 ("));
        assert!(notes.contains("Support login (Tester)"));
        assert!(!notes.contains("Initial import"));
    }
}
