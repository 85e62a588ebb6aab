//! Implementation of the `hubqueue release` commands.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Subcommand;
use tracing::warn;

use crate::{
    context::Context,
    error::{Error, Result},
    git::Git,
    github::releases::NewRelease,
    palette,
    paths::display_path,
    release::{default_release_message, notes, version},
};

/// Release subcommands.
#[derive(Debug, Subcommand)]
pub enum ReleaseCommand {
    /// Replace the project version in version files.
    UpdateVersion {
        /// New version (bumps the patch component when omitted).
        new_version: Option<String>,
        /// Regex matching the version string.
        #[arg(long)]
        pattern: Option<String>,
        /// File or glob to update (repeatable).
        #[arg(long = "file")]
        files: Vec<String>,
        /// Project directory.
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },
    /// Create an annotated tag.
    Tag {
        /// Tag name.
        tag: String,
        /// Tag message.
        #[arg(long, short = 'm')]
        message: Option<String>,
        /// Sign the tag with GPG.
        #[arg(long)]
        sign: bool,
        /// Push the tag to `origin`.
        #[arg(long)]
        push: bool,
        /// Repository directory.
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },
    /// Generate release notes from the commit log.
    Notes {
        /// Tag the notes are for.
        tag: String,
        /// Tag or commit to start from.
        #[arg(long)]
        previous: Option<String>,
        /// Write the notes to a file instead of stdout.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Repository directory.
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },
    /// Create a GitHub release for a tag.
    Publish {
        /// Tag to release.
        tag: String,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
        /// Release title (defaults to the tag).
        #[arg(long)]
        name: Option<String>,
        /// Release body (defaults to generated notes).
        #[arg(long)]
        body: Option<String>,
        /// Create as a draft.
        #[arg(long)]
        draft: bool,
        /// Mark as a prerelease.
        #[arg(long)]
        prerelease: bool,
        /// File to attach (repeatable).
        #[arg(long = "asset")]
        assets: Vec<PathBuf>,
        /// Repository directory used for generated notes.
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },
    /// Attach a file to an existing release.
    UploadAsset {
        /// Release id or tag.
        release: String,
        /// File to upload.
        file: PathBuf,
        /// Repository as `owner/repo`.
        #[arg(long)]
        repo: Option<String>,
        /// Display label for the asset.
        #[arg(long)]
        label: Option<String>,
    },
}

/// Execute a release subcommand.
pub async fn run(ctx: &Context, command: ReleaseCommand) -> Result<()> {
    let color = ctx.use_color();
    match command {
        ReleaseCommand::UpdateVersion {
            new_version,
            pattern,
            files,
            directory,
        } => {
            let update = version::update_version(
                &directory,
                new_version.as_deref(),
                pattern.as_deref(),
                &files,
            )?;
            println!(
                "Version: {} -> {}",
                update.old_version,
                palette::fmt_name(&update.new_version, color)
            );
            if update.updated_files.is_empty() {
                println!("No files needed updating.");
            }
            for path in &update.updated_files {
                println!("  Updated {}", palette::fmt_path(&display_path(path), color));
            }
            Ok(())
        }
        ReleaseCommand::Tag {
            tag,
            message,
            sign,
            push,
            directory,
        } => {
            let git = Git::new(&directory);
            git.ensure_repository()?;
            let message = message.unwrap_or_else(|| default_release_message(&tag));
            git.tag(&tag, &message, sign)?;
            println!("Created tag {}", palette::fmt_name(&tag, color));
            if push {
                git.push_ref("origin", &tag)?;
                println!("Pushed tag {tag} to origin");
            }
            Ok(())
        }
        ReleaseCommand::Notes {
            tag,
            previous,
            output,
            directory,
        } => write_notes(ctx, &tag, previous.as_deref(), output.as_deref(), &directory),
        ReleaseCommand::Publish {
            tag,
            repo,
            name,
            body,
            draft,
            prerelease,
            assets,
            directory,
        } => {
            let details = PublishDetails {
                name,
                body,
                draft,
                prerelease,
            };
            publish(ctx, repo.as_deref(), &tag, details, &assets, &directory).await
        }
        ReleaseCommand::UploadAsset {
            release,
            file,
            repo,
            label,
        } => {
            let repo = ctx.repo(repo.as_deref())?;
            let client = ctx.client()?;
            let release = client.release(&repo, &release).await?;
            let asset = client
                .upload_release_asset(&release, &file, label.as_deref())
                .await?;
            println!(
                "Uploaded {} to release {}",
                palette::fmt_name(&asset.name, color),
                release.tag_name
            );
            println!("URL: {}", palette::fmt_path(&asset.browser_download_url, color));
            Ok(())
        }
    }
}

/// `release notes`.
fn write_notes(
    ctx: &Context,
    tag: &str,
    previous: Option<&str>,
    output: Option<&Path>,
    directory: &Path,
) -> Result<()> {
    let git = Git::new(directory);
    git.ensure_repository()?;
    let text = notes::generate(&git, tag, previous)?;
    match output {
        Some(path) => {
            fs::write(path, &text).map_err(|source| Error::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;
            println!(
                "Release notes written to {}",
                palette::fmt_path(&display_path(path), ctx.use_color())
            );
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Optional fields for `release publish`.
#[derive(Debug)]
struct PublishDetails {
    /// Release title.
    name: Option<String>,
    /// Release body.
    body: Option<String>,
    /// Create as a draft.
    draft: bool,
    /// Mark as a prerelease.
    prerelease: bool,
}

/// Body for a new release: explicit text, generated notes, or the default
/// message when notes cannot be produced.
fn release_body(body: Option<String>, directory: &Path, tag: &str) -> String {
    if let Some(body) = body {
        return body;
    }
    let git = Git::new(directory);
    match git
        .ensure_repository()
        .and_then(|()| notes::generate(&git, tag, None))
    {
        Ok(notes) => notes,
        Err(error) => {
            warn!(%error, "could not generate release notes");
            default_release_message(tag)
        }
    }
}

/// `release publish`.
async fn publish(
    ctx: &Context,
    repo: Option<&str>,
    tag: &str,
    details: PublishDetails,
    assets: &[PathBuf],
    directory: &Path,
) -> Result<()> {
    let repo = ctx.repo(repo)?;
    let client = ctx.client()?;
    let color = ctx.use_color();
    let name = details.name.unwrap_or_else(|| tag.to_string());
    let body = release_body(details.body, directory, tag);
    let release = client
        .create_release(
            &repo,
            &NewRelease {
                tag_name: tag,
                name: &name,
                body: &body,
                draft: details.draft,
                prerelease: details.prerelease,
            },
        )
        .await?;
    println!(
        "Created release {} for {repo}",
        palette::fmt_name(&release.tag_name, color)
    );
    println!("URL: {}", palette::fmt_path(&release.html_url, color));
    for asset in assets {
        let uploaded = client.upload_release_asset(&release, asset, None).await?;
        println!("  Uploaded {}", palette::fmt_name(&uploaded.name, color));
    }
    Ok(())
}
