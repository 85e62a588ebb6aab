use std::{fs, path::Path};

use serde::Serialize;

use crate::{
    error::{Error, Result},
    github::{
        GitHubClient, RepoName,
        types::{Release, ReleaseAsset},
    },
};

/// Body for creating a release.
#[derive(Debug, Serialize)]
pub struct NewRelease<'a> {
    /// Tag to publish.
    pub tag_name: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Release notes.
    pub body: &'a str,
    /// Draft flag.
    pub draft: bool,
    /// Prerelease flag.
    pub prerelease: bool,
}

impl GitHubClient {
    /// Create a release for an existing tag.
    pub(crate) async fn create_release(
        &self,
        repo: &RepoName,
        release: &NewRelease<'_>,
    ) -> Result<Release> {
        self.post(&format!("{}/releases", repo.path()), release).await
    }

    /// Find a release by numeric id or tag name.
    pub(crate) async fn release(&self, repo: &RepoName, id_or_tag: &str) -> Result<Release> {
        match id_or_tag.parse::<u64>() {
            Ok(id) => self.get(&format!("{}/releases/{id}", repo.path())).await,
            Err(_) => {
                self.get(&format!("{}/releases/tags/{id_or_tag}", repo.path()))
                    .await
            }
        }
    }

    /// Upload a local file as a release asset.
    pub(crate) async fn upload_release_asset(
        &self,
        release: &Release,
        file: &Path,
        label: Option<&str>,
    ) -> Result<ReleaseAsset> {
        if !file.is_file() {
            return Err(Error::PathMissing {
                path: file.to_path_buf(),
            });
        }
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| Error::PathMissing {
                path: file.to_path_buf(),
            })?;
        let data = fs::read(file).map_err(|source| Error::FileRead {
            path: file.to_path_buf(),
            source,
        })?;
        let mut query = vec![("name", name.clone())];
        query.push(("label", label.unwrap_or(&name).to_string()));
        self.upload(
            upload_base(&release.upload_url),
            &query,
            content_type_for(file),
            data,
        )
        .await
    }
}

/// Strip the RFC 6570 suffix (`{?name,label}`) from an upload URL.
fn upload_base(template: &str) -> &str {
    template
        .split_once('{')
        .map_or(template, |(base, _)| base)
}

/// Content type for an asset, guessed from its extension.
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "tar" => "application/x-tar",
        "json" => "application/json",
        "txt" | "md" => "text/plain",
        "pdf" => "application/pdf",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{content_type_for, upload_base};

    #[test]
    fn strips_upload_url_template() {
        assert_eq!(
            upload_base("https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}"),
            "https://uploads.github.com/repos/o/r/releases/1/assets"
        );
        assert_eq!(upload_base("https://x/assets"), "https://x/assets");
    }

    #[test]
    fn guesses_content_types() {
        assert_eq!(content_type_for(Path::new("dist/app.ZIP")), "application/zip");
        assert_eq!(
            content_type_for(Path::new("bin/app")),
            "application/octet-stream"
        );
    }
}
