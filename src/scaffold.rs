//! Standard project files and directories for a new repository.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{Datelike, Local};
use tracing::{debug, info};

use crate::{
    archive::{MAX_DOWNLOAD_SIZE, download_https},
    error::{Error, Result},
    git::Git,
};

/// Directories created when the caller names none.
pub const DEFAULT_DIRS: [&str; 3] = ["src", "tests", "docs"];

/// Where `.gitignore` templates are fetched from.
const GITIGNORE_BASE_URL: &str = "https://raw.githubusercontent.com/github/gitignore/main";

/// Author written into a license when none is known.
const FALLBACK_AUTHOR: &str = "Your Name";

/// MIT license text with `{year}` and `{author}` placeholders.
const MIT_LICENSE: &str = "MIT License

Copyright (c) {year} {author}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the \"Software\"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
";

/// Create each missing directory under `base`, returning only the new ones.
pub fn create_dirs(base: &Path, dirs: &[String]) -> Result<Vec<PathBuf>> {
    let defaults;
    let dirs: &[String] = if dirs.is_empty() {
        defaults = DEFAULT_DIRS.map(str::to_string);
        &defaults
    } else {
        dirs
    };

    let mut created = Vec::new();
    for dir in dirs {
        let path = base.join(dir);
        if path.exists() {
            continue;
        }
        fs::create_dir_all(&path).map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "created directory");
        created.push(path);
    }
    Ok(created)
}

/// Write a new file, refusing to replace an existing one.
fn write_new(path: PathBuf, contents: &str) -> Result<PathBuf> {
    if path.exists() {
        return Err(Error::PathExists { path });
    }
    fs::write(&path, contents).map_err(|source| Error::FileWrite {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "created file");
    Ok(path)
}

/// Project name taken from a directory's final component.
pub fn project_name_for(dir: &Path) -> String {
    let absolute = dunce::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    absolute
        .file_name()
        .map_or_else(|| "project".to_string(), |name| name.to_string_lossy().to_string())
}

/// README body for a project.
pub fn readme_contents(project_name: &str, description: Option<&str>) -> String {
    let mut content = format!("# {project_name}\n\n");
    if let Some(description) = description {
        content.push_str(description);
        content.push_str("\n\n");
    }
    content.push_str(&format!(
        "## Installation\n\n```bash\n# Clone the repository\ngit clone <repository-url>\ncd {project_name}\n```\n\n"
    ));
    content.push_str("## Usage\n\n```bash\n# Add usage examples here\n```\n\n");
    content.push_str(
        "## License\n\nThis project is licensed under the MIT License - see the LICENSE file for details.\n",
    );
    content
}

/// Write `README.md` into `dir`.
pub fn write_readme(
    dir: &Path,
    project_name: Option<&str>,
    description: Option<&str>,
) -> Result<PathBuf> {
    let path = dir.join("README.md");
    if path.exists() {
        return Err(Error::PathExists { path });
    }
    let name = project_name.map_or_else(|| project_name_for(dir), str::to_string);
    write_new(path, &readme_contents(&name, description))
}

/// Fetch a `.gitignore` template from `github/gitignore` and write it into `dir`.
pub async fn write_gitignore(dir: &Path, template: &str) -> Result<PathBuf> {
    let path = dir.join(".gitignore");
    if path.exists() {
        return Err(Error::PathExists { path });
    }
    let url = format!("{GITIGNORE_BASE_URL}/{template}.gitignore");
    let body = download_https(&url, MAX_DOWNLOAD_SIZE).await?;
    let contents = String::from_utf8(body).map_err(|error| Error::Download {
        url,
        message: error.to_string(),
    })?;
    write_new(path, &contents)
}

/// License text for `kind` (only MIT is supported).
pub fn license_contents(kind: &str, year: i32, author: &str) -> Result<String> {
    if !kind.eq_ignore_ascii_case("mit") {
        return Err(Error::validation(format!("Unsupported license type: {kind}")));
    }
    Ok(MIT_LICENSE
        .replace("{year}", &year.to_string())
        .replace("{author}", author))
}

/// Write `LICENSE` into `dir`, taking the author from git config when unset.
pub fn write_license(dir: &Path, kind: &str, author: Option<&str>) -> Result<PathBuf> {
    let path = dir.join("LICENSE");
    if path.exists() {
        return Err(Error::PathExists { path });
    }
    let author = match author {
        Some(author) => author.to_string(),
        None => Git::new(dir)
            .config_get("user.name", false)
            .ok()
            .flatten()
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_string()),
    };
    let contents = license_contents(kind, Local::now().year(), &author)?;
    write_new(path, &contents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{create_dirs, license_contents, readme_contents, write_license, write_readme};
    use crate::error::Error;

    #[test]
    fn reports_only_created_directories() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("src")).expect("mkdir");
        let created = create_dirs(dir.path(), &[]).expect("create");
        assert_eq!(
            created,
            vec![dir.path().join("tests"), dir.path().join("docs")]
        );
        assert!(create_dirs(dir.path(), &[]).expect("again").is_empty());
    }

    #[test]
    fn readme_includes_name_and_description() {
        let readme = readme_contents("widget", Some("Makes widgets."));
        assert!(readme.starts_with("# widget\n\nMakes widgets.\n\n## Installation"));
        assert!(readme.contains("cd widget\n"));
    }

    #[test]
    fn refuses_to_overwrite_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("README.md"), "mine").expect("write");
        let error = write_readme(dir.path(), Some("x"), None).expect_err("exists");
        assert!(matches!(error, Error::PathExists { .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join("README.md")).expect("read"),
            "mine"
        );
    }

    #[test]
    fn writes_mit_license_only() {
        let text = license_contents("MIT", 2024, "Ann Author").expect("mit");
        assert!(text.starts_with("MIT License\n\nCopyright (c) 2024 Ann Author\n"));
        assert!(license_contents("GPL-3.0", 2024, "Ann").is_err());

        let dir = tempdir().expect("tempdir");
        let path = write_license(dir.path(), "mit", Some("Ann")).expect("license");
        assert!(fs::read_to_string(path).expect("read").contains("Ann"));
    }
}
