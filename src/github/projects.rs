//! Classic project boards: projects, columns, and cards.

use std::fmt;

use serde_json::json;

use crate::{
    error::{Error, Result},
    github::{
        GitHubClient, RepoName,
        types::{Project, ProjectCard, ProjectColumn},
    },
};

/// Column layouts offered by `project create-from-template`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTemplate {
    /// To Do, In Progress, Done.
    Basic,
    /// To Do, In Progress, Review, Done.
    Automated,
    /// New, Needs Triage, Confirmed, In Progress, Fixed.
    BugTriage,
}

impl ProjectTemplate {
    /// Parse a template name (case-insensitive).
    pub(crate) fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "automated" => Ok(Self::Automated),
            "bug_triage" => Ok(Self::BugTriage),
            _ => Err(Error::validation(format!(
                "Unknown template: {name}. Use 'basic', 'automated', or 'bug_triage'."
            ))),
        }
    }

    /// Column names in board order.
    pub(crate) fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["To Do", "In Progress", "Done"],
            Self::Automated => &["To Do", "In Progress", "Review", "Done"],
            Self::BugTriage => &["New", "Needs Triage", "Confirmed", "In Progress", "Fixed"],
        }
    }

    /// Name as typed on the command line.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Automated => "automated",
            Self::BugTriage => "bug_triage",
        }
    }
}

/// Where a moved card lands in its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPosition {
    /// First card.
    Top,
    /// Last card.
    Bottom,
    /// Directly after the given card.
    After(u64),
}

impl CardPosition {
    /// Parse `top`, `bottom`, or `after:<card_id>`.
    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let invalid = || {
            Error::validation(format!(
                "Invalid position: {raw}. Use 'top', 'bottom', or 'after:card_id'."
            ))
        };
        match raw {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => other
                .strip_prefix("after:")
                .and_then(|id| id.parse().ok())
                .map(Self::After)
                .ok_or_else(invalid),
        }
    }
}

impl fmt::Display for CardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Bottom => f.write_str("bottom"),
            Self::After(id) => write!(f, "after:{id}"),
        }
    }
}

/// Kind of item a card links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardContentKind {
    /// An issue.
    Issue,
    /// A pull request.
    PullRequest,
}

/// Extract the linked item kind and number from a card's `content_url`.
pub fn card_content_ref(content_url: &str) -> Option<(CardContentKind, u64)> {
    let (kind, tail) = if let Some((_, tail)) = content_url.rsplit_once("/issues/") {
        (CardContentKind::Issue, tail)
    } else if let Some((_, tail)) = content_url.rsplit_once("/pulls/") {
        (CardContentKind::PullRequest, tail)
    } else {
        return None;
    };
    tail.parse().ok().map(|number| (kind, number))
}

impl GitHubClient {
    /// Project boards attached to a repository.
    pub(crate) async fn list_projects(&self, repo: &RepoName) -> Result<Vec<Project>> {
        let path = format!("{}/projects", repo.path());
        self.get_pages(&path, &[("state", "all".to_string())], None)
            .await
    }

    /// Fetch one project.
    pub(crate) async fn project(&self, id: u64) -> Result<Project> {
        self.get(&format!("/projects/{id}")).await
    }

    /// Create a project board on a repository.
    pub(crate) async fn create_project(
        &self,
        repo: &RepoName,
        name: &str,
        body: Option<&str>,
    ) -> Result<Project> {
        let path = format!("{}/projects", repo.path());
        self.post(&path, &json!({ "name": name, "body": body })).await
    }

    /// Delete a project board.
    pub(crate) async fn delete_project(&self, id: u64) -> Result<()> {
        self.delete(&format!("/projects/{id}")).await
    }

    /// Columns of a project, in board order.
    pub(crate) async fn project_columns(&self, project_id: u64) -> Result<Vec<ProjectColumn>> {
        self.get_pages(&format!("/projects/{project_id}/columns"), &[], None)
            .await
    }

    /// Add a column to a project.
    pub(crate) async fn create_column(&self, project_id: u64, name: &str) -> Result<ProjectColumn> {
        self.post(
            &format!("/projects/{project_id}/columns"),
            &json!({ "name": name }),
        )
        .await
    }

    /// Delete a column.
    pub(crate) async fn delete_column(&self, column_id: u64) -> Result<()> {
        self.delete(&format!("/projects/columns/{column_id}")).await
    }

    /// Cards in a column, in column order.
    pub(crate) async fn column_cards(&self, column_id: u64) -> Result<Vec<ProjectCard>> {
        self.get_pages(&format!("/projects/columns/{column_id}/cards"), &[], None)
            .await
    }

    /// Add a free-text note card.
    pub(crate) async fn create_note_card(&self, column_id: u64, note: &str) -> Result<ProjectCard> {
        self.post(
            &format!("/projects/columns/{column_id}/cards"),
            &json!({ "note": note }),
        )
        .await
    }

    /// Add a card linking an issue or pull request by its global id.
    pub(crate) async fn create_content_card(
        &self,
        column_id: u64,
        content_id: u64,
        kind: CardContentKind,
    ) -> Result<ProjectCard> {
        let content_type = match kind {
            CardContentKind::Issue => "Issue",
            CardContentKind::PullRequest => "PullRequest",
        };
        self.post(
            &format!("/projects/columns/{column_id}/cards"),
            &json!({ "content_id": content_id, "content_type": content_type }),
        )
        .await
    }

    /// Move a card within or across columns.
    pub(crate) async fn move_card(
        &self,
        card_id: u64,
        column_id: u64,
        position: CardPosition,
    ) -> Result<()> {
        let body = json!({ "position": position.to_string(), "column_id": column_id });
        self.post::<_, serde_json::Value>(&format!("/projects/columns/cards/{card_id}/moves"), &body)
            .await?;
        Ok(())
    }

    /// Delete a card.
    pub(crate) async fn delete_card(&self, card_id: u64) -> Result<()> {
        self.delete(&format!("/projects/columns/cards/{card_id}"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{CardContentKind, CardPosition, ProjectTemplate, card_content_ref};
    use crate::error::Error;

    #[test]
    fn template_columns_follow_board_order() {
        let template = ProjectTemplate::parse("Bug_Triage").expect("parse");
        assert_eq!(
            template.columns(),
            ["New", "Needs Triage", "Confirmed", "In Progress", "Fixed"]
        );
        assert_eq!(ProjectTemplate::parse("basic").expect("basic").columns().len(), 3);
        assert!(ProjectTemplate::parse("kanban").is_err());
    }

    #[test]
    fn parses_card_positions() {
        assert_eq!(CardPosition::parse("top").expect("top"), CardPosition::Top);
        assert_eq!(
            CardPosition::parse("after:17").expect("after"),
            CardPosition::After(17)
        );
        assert_eq!(CardPosition::After(17).to_string(), "after:17");
        let error = CardPosition::parse("middle").expect_err("invalid");
        assert!(matches!(error, Error::Validation { .. }));
        assert!(CardPosition::parse("after:x").is_err());
    }

    #[test]
    fn extracts_card_content_ref() {
        assert_eq!(
            card_content_ref("https://api.github.com/repos/o/r/issues/12"),
            Some((CardContentKind::Issue, 12))
        );
        assert_eq!(
            card_content_ref("https://api.github.com/repos/o/r/pulls/3"),
            Some((CardContentKind::PullRequest, 3))
        );
        assert_eq!(card_content_ref("https://api.github.com/repos/o/r"), None);
    }
}
