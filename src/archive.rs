//! ZIP download and extraction for template imports.

use std::{
    fs::{self, File},
    io::{self, Cursor},
    path::{Component, Path, PathBuf},
};

use reqwest::Client;
use tracing::debug;
use url::Url;
use zip::ZipArchive;

use crate::{
    error::{Error, Result},
    github::{read_capped, user_agent},
};

/// Maximum size of a ZIP fetched from an arbitrary URL (10 MB).
pub const MAX_DOWNLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum size of a repository zipball (100 MB).
pub const MAX_ZIPBALL_SIZE: u64 = 100 * 1024 * 1024;

/// Directory macOS archivers add next to the real content.
const MACOS_METADATA: &str = "__MACOSX/";

/// Download a file over HTTPS, refusing plain HTTP and oversized bodies.
pub async fn download_https(raw_url: &str, max: u64) -> Result<Vec<u8>> {
    let url = Url::parse(raw_url).map_err(|_| Error::InvalidUrl {
        url: raw_url.to_string(),
    })?;
    match url.scheme() {
        "https" => {}
        "http" => {
            return Err(Error::HttpNotAllowed {
                url: raw_url.to_string(),
            });
        }
        _ => {
            return Err(Error::InvalidUrl {
                url: raw_url.to_string(),
            });
        }
    }

    let client = Client::builder()
        .user_agent(user_agent())
        .build()
        .map_err(|error| Error::Download {
            url: raw_url.to_string(),
            message: error.to_string(),
        })?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| Error::Download {
            url: raw_url.to_string(),
            message: error.to_string(),
        })?;
    if !response.status().is_success() {
        return Err(Error::Download {
            url: raw_url.to_string(),
            message: format!("server returned {}", response.status()),
        });
    }
    read_capped(response, raw_url, max).await
}

/// Open an in-memory archive.
fn open(data: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    ZipArchive::new(Cursor::new(data)).map_err(|error| Error::InvalidZip {
        message: error.to_string(),
    })
}

/// Top-level directory every entry of a GitHub zipball sits under
/// (`owner-repo-sha`).
pub fn archive_root(data: &[u8]) -> Result<String> {
    let archive = open(data)?;
    archive
        .file_names()
        .filter(|name| !name.starts_with(MACOS_METADATA))
        .find_map(|name| name.split('/').next().filter(|root| !root.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidZip {
            message: "empty ZIP archive".to_string(),
        })
}

/// Extract the entries under `prefix` into `target`, stripping the prefix.
///
/// An empty prefix extracts everything. Returns the files written.
pub fn extract_zip(data: &[u8], prefix: &str, target: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = open(data)?;
    let prefix = match prefix.trim_matches('/') {
        "" => String::new(),
        trimmed => format!("{trimmed}/"),
    };

    fs::create_dir_all(target).map_err(|source| Error::FileWrite {
        path: target.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(|error| Error::InvalidZip {
            message: error.to_string(),
        })?;
        let name = file.name().to_string();
        if name.starts_with(MACOS_METADATA) {
            continue;
        }
        let Some(relative) = name.strip_prefix(&prefix) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|part| !matches!(part, Component::Normal(_)))
        {
            return Err(Error::InvalidZip {
                message: format!("path traversal detected: {name}"),
            });
        }

        let out_path = target.join(relative);
        if file.is_dir() {
            fs::create_dir_all(&out_path).map_err(|source| Error::FileWrite {
                path: out_path.clone(),
                source,
            })?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut outfile = File::create(&out_path).map_err(|source| Error::FileWrite {
            path: out_path.clone(),
            source,
        })?;
        io::copy(&mut file, &mut outfile).map_err(|source| Error::FileWrite {
            path: out_path.clone(),
            source,
        })?;
        debug!(path = %out_path.display(), "extracted");
        written.push(out_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        io::{Cursor, Write},
    };

    use tempfile::tempdir;
    use zip::{ZipWriter, write::SimpleFileOptions};

    use super::{archive_root, extract_zip};
    use crate::error::Error;

    fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut buffer));
            for (name, contents) in entries {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .expect("start");
                writer.write_all(contents.as_bytes()).expect("write");
            }
            writer.finish().expect("finish");
        }
        buffer
    }

    #[test]
    fn strips_zipball_root_and_subdir() {
        let data = zip_of(&[
            ("octo-tpl-abc123/README.md", "root"),
            ("octo-tpl-abc123/python/setup.py", "setup"),
            ("octo-tpl-abc123/python/src/app.py", "app"),
        ]);
        let root = archive_root(&data).expect("root");
        assert_eq!(root, "octo-tpl-abc123");

        let dir = tempdir().expect("tempdir");
        let written =
            extract_zip(&data, &format!("{root}/python"), dir.path()).expect("extract");
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("src/app.py")).expect("read"),
            "app"
        );
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn rejects_path_traversal() {
        let data = zip_of(&[("../evil.txt", "x")]);
        let dir = tempdir().expect("tempdir");
        let error = extract_zip(&data, "", dir.path()).expect_err("traversal");
        assert!(matches!(error, Error::InvalidZip { .. }));
    }

    #[tokio::test]
    async fn refuses_plain_http() {
        let error = super::download_https("http://example.com/t.zip", 10)
            .await
            .expect_err("http");
        assert!(matches!(error, Error::HttpNotAllowed { .. }));
    }
}
