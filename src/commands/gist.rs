//! Implementation of the `hubqueue gist` commands.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use clap::Subcommand;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    commands::{confirm, timestamp, wrap_body},
    context::Context,
    error::{Error, Result},
    github::{
        GitHubClient,
        types::{Gist, GistFileContent},
    },
    palette,
    paths::display_path,
    system::format_bytes,
    table::{OutputFormat, Table},
};

/// Gist subcommands.
#[derive(Debug, Subcommand)]
pub enum GistCommand {
    /// List your gists.
    List {
        /// Only public gists.
        #[arg(long)]
        public_only: bool,
        /// Starred gists instead of owned ones.
        #[arg(long)]
        starred: bool,
        /// Maximum number of gists.
        #[arg(long)]
        limit: Option<usize>,
        /// Output format.
        #[arg(long, value_enum, default_value = "simple")]
        format: OutputFormat,
    },
    /// Show a gist with its files and comments.
    View {
        /// Gist id.
        id: String,
    },
    /// Create a gist from files.
    Create {
        /// Files to include.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Description.
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Make the gist public.
        #[arg(long)]
        public: bool,
    },
    /// Change a gist's description or files.
    Update {
        /// Gist id.
        id: String,
        /// File to add or replace (repeatable).
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// File name to remove (repeatable).
        #[arg(long = "delete")]
        deletions: Vec<String>,
        /// New description.
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Delete a gist.
    Delete {
        /// Gist id.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Star a gist.
    Star {
        /// Gist id.
        id: String,
    },
    /// Remove a star.
    Unstar {
        /// Gist id.
        id: String,
    },
    /// Comment on a gist.
    Comment {
        /// Gist id.
        id: String,
        /// Comment text.
        body: String,
    },
    /// Delete a gist comment.
    DeleteComment {
        /// Gist id.
        id: String,
        /// Comment id.
        comment_id: u64,
    },
    /// Fork a gist.
    Fork {
        /// Gist id.
        id: String,
    },
    /// Write every file of a gist into a directory.
    Download {
        /// Gist id.
        id: String,
        /// Target directory.
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },
    /// Create a gist from files or a directory tree.
    Upload {
        /// Files or directories.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Description.
        #[arg(long, short = 'd', default_value = "")]
        description: String,
        /// Make the gist public.
        #[arg(long)]
        public: bool,
    },
}

/// Execute a gist subcommand.
pub async fn run(ctx: &Context, command: GistCommand) -> Result<()> {
    let client = ctx.client()?;
    let color = ctx.use_color();
    match command {
        GistCommand::List {
            public_only,
            starred,
            limit,
            format,
        } => list(ctx, &client, public_only, starred, limit, format).await,
        GistCommand::View { id } => view(ctx, &client, &id).await,
        GistCommand::Create {
            files,
            description,
            public,
        } => {
            let files = read_gist_files(&files)?;
            let gist = client.create_gist(&description, public, &files).await?;
            print_created(&gist, color);
            Ok(())
        }
        GistCommand::Update {
            id,
            files,
            deletions,
            description,
        } => {
            let changes = update_entries(&files, &deletions)?;
            if changes.is_empty() && description.is_none() {
                return Err(Error::validation(
                    "Nothing to update: pass --file, --delete, or --description",
                ));
            }
            let gist = client
                .update_gist(&id, description.as_deref(), &changes)
                .await?;
            println!("Updated gist {}", palette::fmt_name(&gist.id, color));
            Ok(())
        }
        GistCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete gist {id}?"), false)? {
                println!("Aborted.");
                return Ok(());
            }
            client.delete_gist(&id).await?;
            println!("Deleted gist {id}");
            Ok(())
        }
        GistCommand::Star { id } => {
            client.star_gist(&id).await?;
            println!("Starred gist {id}");
            Ok(())
        }
        GistCommand::Unstar { id } => {
            client.unstar_gist(&id).await?;
            println!("Unstarred gist {id}");
            Ok(())
        }
        GistCommand::Comment { id, body } => {
            let comment = client.add_gist_comment(&id, &body).await?;
            println!("Added comment {} to gist {id}", comment.id);
            Ok(())
        }
        GistCommand::DeleteComment { id, comment_id } => {
            client.delete_gist_comment(&id, comment_id).await?;
            println!("Deleted comment {comment_id} from gist {id}");
            Ok(())
        }
        GistCommand::Fork { id } => {
            let gist = client.fork_gist(&id).await?;
            println!("Forked gist {id} as {}", palette::fmt_name(&gist.id, color));
            println!("URL: {}", palette::fmt_path(&gist.html_url, color));
            Ok(())
        }
        GistCommand::Download { id, directory } => download(ctx, &client, &id, &directory).await,
        GistCommand::Upload {
            paths,
            description,
            public,
        } => {
            let files = read_gist_files(&collect_upload_files(&paths)?)?;
            let gist = client.create_gist(&description, public, &files).await?;
            print_created(&gist, color);
            Ok(())
        }
    }
}

/// Report a newly created gist.
fn print_created(gist: &Gist, color: bool) {
    println!(
        "Created gist {} with {} file(s)",
        palette::fmt_name(&gist.id, color),
        gist.files.len()
    );
    println!("URL: {}", palette::fmt_path(&gist.html_url, color));
}

/// First line of a gist description, or a placeholder.
fn summary(gist: &Gist) -> String {
    gist.description
        .as_deref()
        .and_then(|text| text.lines().next())
        .filter(|line| !line.trim().is_empty())
        .unwrap_or("(no description)")
        .to_string()
}

/// `gist list`.
async fn list(
    ctx: &Context,
    client: &GitHubClient,
    public_only: bool,
    starred: bool,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let gists: Vec<Gist> = client
        .list_gists(starred, limit)
        .await?
        .into_iter()
        .filter(|gist| !public_only || gist.public)
        .collect();
    if gists.is_empty() {
        println!("No gists found.");
        return Ok(());
    }
    let color = ctx.use_color();
    match format {
        OutputFormat::Simple => {
            for gist in &gists {
                println!("{} - {}", palette::fmt_name(&gist.id, color), summary(gist));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new(["ID", "Description", "Files", "Public", "Updated"]);
            for gist in &gists {
                table.row([
                    gist.id.clone(),
                    summary(gist),
                    gist.files.len().to_string(),
                    if gist.public { "yes" } else { "no" }.to_string(),
                    timestamp(&gist.updated_at),
                ]);
            }
            println!("{}", table.render());
        }
    }
    Ok(())
}

/// `gist view`.
async fn view(ctx: &Context, client: &GitHubClient, id: &str) -> Result<()> {
    let gist = client.gist(id).await?;
    let starred = client.is_gist_starred(id).await?;
    let comments = if gist.comments > 0 {
        client.gist_comments(id).await?
    } else {
        Vec::new()
    };
    let color = ctx.use_color();
    println!(
        "{}",
        palette::fmt_heading(&format!("Gist {}", gist.id), color)
    );
    println!("Description: {}", summary(&gist));
    if let Some(owner) = &gist.owner {
        println!("Owner: {}", owner.login);
    }
    println!("Public: {}", if gist.public { "yes" } else { "no" });
    println!("Starred: {}", if starred { "yes" } else { "no" });
    println!("Created at: {}", timestamp(&gist.created_at));
    println!("Updated at: {}", timestamp(&gist.updated_at));
    println!("URL: {}", palette::fmt_path(&gist.html_url, color));
    println!("\n{}", palette::fmt_heading("Files:", color));
    for file in gist.files.values() {
        println!(
            "  {} ({}, {})",
            palette::fmt_name(&file.filename, color),
            file.language.as_deref().unwrap_or("text"),
            format_bytes(file.size)
        );
    }
    if !comments.is_empty() {
        println!("\n{}", palette::fmt_heading("Comments:", color));
        for comment in &comments {
            println!(
                "{} (#{}) on {}:",
                palette::fmt_name(&comment.user.login, color),
                comment.id,
                timestamp(&comment.created_at)
            );
            println!("{}\n", wrap_body(&comment.body));
        }
    }
    Ok(())
}

/// `gist download`.
async fn download(ctx: &Context, client: &GitHubClient, id: &str, directory: &Path) -> Result<()> {
    let gist = client.gist(id).await?;
    fs::create_dir_all(directory).map_err(|source| Error::FileWrite {
        path: directory.to_path_buf(),
        source,
    })?;
    let color = ctx.use_color();
    for file in gist.files.values() {
        let name = Path::new(&file.filename)
            .file_name()
            .ok_or_else(|| Error::validation(format!("Invalid gist file name: {}", file.filename)))?;
        let bytes = match (&file.content, file.truncated, &file.raw_url) {
            (Some(content), false, _) => content.clone().into_bytes(),
            (_, _, Some(raw_url)) => client.gist_raw_file(raw_url).await?,
            (Some(content), true, None) => content.clone().into_bytes(),
            (None, _, None) => Vec::new(),
        };
        let target = directory.join(name);
        fs::write(&target, &bytes).map_err(|source| Error::FileWrite {
            path: target.clone(),
            source,
        })?;
        println!("  {}", palette::fmt_path(&display_path(&target), color));
    }
    info!(gist = %gist.id, files = gist.files.len(), "downloaded gist");
    println!(
        "Downloaded {} file(s) from gist {}",
        gist.files.len(),
        gist.id
    );
    Ok(())
}

/// Expand directories into the files beneath them.
fn collect_upload_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|error| Error::FileRead {
                    path: path.clone(),
                    source: error.into(),
                })?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    if files.is_empty() {
        return Err(Error::validation("No files to upload"));
    }
    Ok(files)
}

/// Gist file name for a local path: its base name.
fn gist_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| Error::PathMissing {
            path: path.to_path_buf(),
        })
}

/// Read local files keyed by base name. Later files replace earlier ones
/// with the same name.
fn read_gist_files(paths: &[PathBuf]) -> Result<BTreeMap<String, GistFileContent>> {
    let mut files = BTreeMap::new();
    for path in paths {
        let content = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.clone(),
            source,
        })?;
        let name = gist_file_name(path)?;
        debug!(path = %path.display(), %name, "adding gist file");
        files.insert(name, GistFileContent { content });
    }
    Ok(files)
}

/// File changes for `gist update`: replacements plus `None` deletions.
fn update_entries(
    files: &[PathBuf],
    deletions: &[String],
) -> Result<BTreeMap<String, Option<GistFileContent>>> {
    let mut changes: BTreeMap<_, _> = read_gist_files(files)?
        .into_iter()
        .map(|(name, content)| (name, Some(content)))
        .collect();
    for name in deletions {
        changes.insert(name.clone(), None);
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{collect_upload_files, read_gist_files, update_entries};

    #[test]
    fn directories_expand_to_files_keyed_by_base_name() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("a.txt"), "alpha").expect("write");
        fs::write(dir.path().join("nested/b.rs"), "fn main() {}").expect("write");

        let paths = collect_upload_files(&[dir.path().to_path_buf()]).expect("collect");
        assert_eq!(paths.len(), 2);
        let files = read_gist_files(&paths).expect("read");
        assert_eq!(files.keys().collect::<Vec<_>>(), ["a.txt", "b.rs"]);
        assert_eq!(files["a.txt"].content, "alpha");
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempdir().expect("tempdir");
        assert!(collect_upload_files(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn deletions_become_null_entries() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("keep.md");
        fs::write(&file, "# keep").expect("write");
        let changes = update_entries(&[file], &["old.md".to_string()]).expect("entries");
        assert!(changes["keep.md"].is_some());
        assert!(changes["old.md"].is_none());
    }
}
