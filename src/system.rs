//! Host inspection and environment setup.
//!
//! Everything here is local except [`check_updates`], which asks crates.io
//! for the newest published version.

use std::{
    collections::BTreeMap,
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    git::Git,
    github::user_agent,
    paths,
};

/// Replacement shown for environment values that look secret.
pub const REDACTED: &str = "***REDACTED***";

/// Key fragments that mark an environment variable as secret.
const SENSITIVE_FRAGMENTS: [&str; 5] = ["token", "key", "secret", "password", "auth"];

/// Registry endpoint describing this crate.
pub const CRATES_IO_URL: &str = "https://crates.io/api/v1/crates/hubqueue";

/// Value git reports for `init.defaultBranch` when it is unset.
const GIT_DEFAULT_BRANCH: &str = "master";

/// Git settings reported by [`git_config`].
const GIT_CONFIG_KEYS: [&str; 5] = [
    "user.name",
    "user.email",
    "init.defaultBranch",
    "credential.helper",
    "core.editor",
];

/// Snapshot of the host and the tool.
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    /// Operating system name.
    pub os: String,
    /// Operating system version.
    pub os_version: String,
    /// Kernel release.
    pub kernel_version: String,
    /// CPU architecture.
    pub architecture: String,
    /// Host name.
    pub hostname: String,
    /// Logical CPU count.
    pub cpu_count: usize,
    /// Total memory in bytes.
    pub total_memory: u64,
    /// Used memory in bytes.
    pub used_memory: u64,
    /// `git --version` output, or a note that git is missing.
    pub git_version: String,
    /// Version of this tool.
    pub tool_version: String,
    /// Environment variables with secret-looking values masked.
    pub environment: BTreeMap<String, String>,
}

/// Host signals relevant to running under Windows.
#[derive(Debug, Clone, Serialize)]
pub struct WindowsCompatibility {
    /// Running on Windows.
    pub is_windows: bool,
    /// OS version string.
    pub release: Option<String>,
    /// Running inside the Windows Subsystem for Linux.
    pub is_wsl: bool,
    /// Launched from PowerShell.
    pub is_powershell: bool,
    /// Launched from `cmd.exe`.
    pub is_cmd: bool,
    /// `bash.exe` is on `PATH`.
    pub git_bash_available: bool,
}

/// Outcome of comparing the running version with the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    /// Version of this binary.
    pub current_version: String,
    /// Newest published version.
    pub latest_version: String,
    /// Whether the two differ.
    pub update_available: bool,
}

/// Inputs to [`setup`].
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Global `user.name` to set.
    pub user_name: Option<String>,
    /// Global `user.email` to set.
    pub user_email: Option<String>,
    /// Configure a platform credential helper when none is set.
    pub credential_helper: bool,
}

/// What [`setup`] changed.
#[derive(Debug, Clone, Default)]
pub struct SetupReport {
    /// Directories and files created.
    pub created: Vec<PathBuf>,
    /// Global git settings written, as `(key, value)`.
    pub git_settings: Vec<(String, String)>,
}

/// Everything [`export`] writes.
#[derive(Debug, Serialize)]
struct EnvironmentReport {
    /// Host snapshot.
    system_info: SystemInfo,
    /// Git settings.
    git_config: BTreeMap<String, Option<String>>,
    /// Tool availability.
    dependencies: BTreeMap<String, bool>,
    /// Windows signals, on Windows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    windows_compatibility: Option<WindowsCompatibility>,
}

/// Registry response envelope.
#[derive(Debug, Deserialize)]
struct CrateResponse {
    /// Crate metadata.
    #[serde(rename = "crate")]
    krate: CrateMetadata,
}

/// The part of the registry's crate record we read.
#[derive(Debug, Deserialize)]
struct CrateMetadata {
    /// Newest published version.
    max_version: String,
}

/// Whether an environment variable name looks like it holds a secret.
pub fn is_sensitive(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

/// Collect variables into a sorted map, masking secret-looking values.
pub fn mask_environment<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .map(|(key, value)| {
            let key = key.to_string_lossy().to_string();
            let value = if is_sensitive(&key) {
                REDACTED.to_string()
            } else {
                value.to_string_lossy().to_string()
            };
            (key, value)
        })
        .collect()
}

/// Gather host details, the git version, and the masked environment.
pub fn system_info() -> SystemInfo {
    debug!("collecting system information");
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_all();
    let git_version = Git::new(".")
        .version()
        .unwrap_or_else(|_| "Git not found".to_string());

    SystemInfo {
        os: System::name().unwrap_or_else(|| env::consts::OS.to_string()),
        os_version: System::os_version().unwrap_or_default(),
        kernel_version: System::kernel_version().unwrap_or_default(),
        architecture: env::consts::ARCH.to_string(),
        hostname: System::host_name().unwrap_or_default(),
        cpu_count: sys.cpus().len(),
        total_memory: sys.total_memory(),
        used_memory: sys.used_memory(),
        git_version,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        environment: mask_environment(env::vars_os()),
    }
}

/// Whether `name` resolves to an executable on `PATH`.
pub fn command_available(name: &str) -> bool {
    let found = paths::find_executable(name).is_some();
    debug!(command = name, found, "checked command availability");
    found
}

/// Split a configured command line into its program and arguments.
pub fn split_command(command: &str) -> Result<(String, Vec<String>)> {
    let mut parts = shell_words::split(command).map_err(|error| Error::EditorFailed {
        editor: command.to_string(),
        message: error.to_string(),
    })?;
    if parts.is_empty() {
        return Err(Error::EditorFailed {
            editor: command.to_string(),
            message: "command is empty".to_string(),
        });
    }
    let args = parts.split_off(1);
    let program = parts.remove(0);
    Ok((program, args))
}

/// Open `path` in `editor` and wait for it to exit.
pub fn open_in_editor(editor: &str, path: &Path) -> Result<()> {
    let (program, args) = split_command(editor)?;
    let status = Command::new(&program)
        .args(&args)
        .arg(path)
        .status()
        .map_err(|error| Error::EditorFailed {
            editor: editor.to_string(),
            message: error.to_string(),
        })?;
    if !status.success() {
        return Err(Error::EditorFailed {
            editor: editor.to_string(),
            message: format!("exited with status {status}"),
        });
    }
    Ok(())
}

/// Availability of the external programs the tool drives.
pub fn check_dependencies(editor: &str) -> BTreeMap<String, bool> {
    let mut dependencies = BTreeMap::new();
    dependencies.insert("git".to_string(), command_available("git"));
    if let Ok((program, _)) = split_command(editor) {
        let available = Path::new(&program).is_file() || command_available(&program);
        dependencies.insert(program, available);
    }
    dependencies
}

/// Current global-or-local git settings the tool cares about.
///
/// `init.defaultBranch` reports git's built-in default when unset.
pub fn git_config() -> Result<BTreeMap<String, Option<String>>> {
    let git = Git::new(".");
    let mut settings = BTreeMap::new();
    for key in GIT_CONFIG_KEYS {
        let mut value = git.config_get(key, false)?;
        if key == "init.defaultBranch" && value.is_none() {
            value = Some(GIT_DEFAULT_BRANCH.to_string());
        }
        settings.insert(key.to_string(), value);
    }
    Ok(settings)
}

/// Write a git setting, globally or for the current repository.
pub fn set_git_config(key: &str, value: &str, global: bool) -> Result<()> {
    Git::new(".").config_set(key, value, global)?;
    info!(key, value, global, "set git config");
    Ok(())
}

/// Credential helper suited to this platform.
fn platform_credential_helper() -> String {
    if cfg!(windows) {
        return "manager-core".to_string();
    }
    if cfg!(target_os = "macos") {
        return "osxkeychain".to_string();
    }
    let libsecret = Path::new("/usr/share/doc/git/contrib/credential/libsecret");
    if libsecret.exists() {
        return libsecret
            .join("git-credential-libsecret")
            .to_string_lossy()
            .to_string();
    }
    "cache --timeout=3600".to_string()
}

/// Create a directory when missing, recording it in `created`.
fn ensure_dir(path: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    created.push(path.to_path_buf());
    Ok(())
}

/// Prepare the data directory, templates root, config file, and git identity.
pub fn setup(config: &Config, options: &SetupOptions) -> Result<SetupReport> {
    let mut report = SetupReport::default();
    if let Some(parent) = config.path().parent() {
        ensure_dir(parent, &mut report.created)?;
    }
    ensure_dir(&config.templates_dir()?, &mut report.created)?;
    if !config.path().exists() {
        config.save()?;
        report.created.push(config.path().to_path_buf());
    }

    let mut settings = Vec::new();
    if let Some(name) = &options.user_name {
        settings.push(("user.name".to_string(), name.clone()));
    }
    if let Some(email) = &options.user_email {
        settings.push(("user.email".to_string(), email.clone()));
    }
    if options.credential_helper {
        match Git::new(".").config_get("credential.helper", true)? {
            Some(existing) => debug!(%existing, "credential helper already configured"),
            None => settings.push((
                "credential.helper".to_string(),
                platform_credential_helper(),
            )),
        }
    }
    for (key, value) in settings {
        set_git_config(&key, &value, true)?;
        report.git_settings.push((key, value));
    }
    info!(created = report.created.len(), "environment setup complete");
    Ok(report)
}

/// Windows-related facts about the current host.
pub fn windows_compatibility() -> WindowsCompatibility {
    let is_windows = cfg!(windows);
    let is_wsl = fs::read_to_string("/proc/version")
        .map(|version| version.to_lowercase().contains("microsoft"))
        .unwrap_or(false);
    let is_powershell = env::var_os("POWERSHELL_DISTRIBUTION_CHANNEL").is_some();
    WindowsCompatibility {
        is_windows,
        release: is_windows.then(System::os_version).flatten(),
        is_wsl,
        is_powershell,
        is_cmd: is_windows && env::var_os("PROMPT").is_some() && !is_powershell,
        git_bash_available: command_available("bash"),
    }
}

/// Write system info, git settings, and dependency checks as JSON.
///
/// Without a target path the report goes to a timestamped file in the
/// system temp directory. Returns the path written.
pub fn export(target: Option<&Path>, editor: &str) -> Result<PathBuf> {
    let report = EnvironmentReport {
        system_info: system_info(),
        git_config: git_config()?,
        dependencies: check_dependencies(editor),
        windows_compatibility: cfg!(windows).then(windows_compatibility),
    };
    let path = match target {
        Some(path) => path.to_path_buf(),
        None => env::temp_dir().join(format!(
            "hubqueue_env_{}.json",
            Local::now().format("%Y%m%d%H%M%S")
        )),
    };
    let mut text = serde_json::to_string_pretty(&report)
        .map_err(|error| Error::validation(error.to_string()))?;
    text.push('\n');
    fs::write(&path, text).map_err(|source| Error::FileWrite {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "exported environment report");
    Ok(path)
}

/// Compare the running version with the newest one on the registry.
pub async fn check_updates(registry_url: &str) -> Result<UpdateStatus> {
    let http = |source| Error::Http {
        url: registry_url.to_string(),
        source,
    };
    let client = Client::builder().user_agent(user_agent()).build().map_err(http)?;
    let response = client.get(registry_url).send().await.map_err(http)?;
    if !response.status().is_success() {
        warn!(status = %response.status(), "update check failed");
        return Err(Error::Download {
            url: registry_url.to_string(),
            message: format!("server returned {}", response.status()),
        });
    }
    let body: CrateResponse = response.json().await.map_err(|error| Error::Decode {
        url: registry_url.to_string(),
        message: error.to_string(),
    })?;
    Ok(compare_versions(
        env!("CARGO_PKG_VERSION"),
        &body.krate.max_version,
    ))
}

/// Build an [`UpdateStatus`] from two version strings.
fn compare_versions(current: &str, latest: &str) -> UpdateStatus {
    UpdateStatus {
        current_version: current.to_string(),
        latest_version: latest.to_string(),
        update_available: current != latest,
    }
}

/// Human-readable byte count (`1.5 GB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, fs};

    use serde_json::Value;
    use tempfile::tempdir;

    use super::{
        REDACTED, compare_versions, export, format_bytes, is_sensitive, mask_environment,
        split_command,
    };

    fn pair(key: &str, value: &str) -> (OsString, OsString) {
        (OsString::from(key), OsString::from(value))
    }

    #[test]
    fn masks_secret_looking_variables() {
        let env = mask_environment(vec![
            pair("GITHUB_TOKEN", "ghp_abc"),
            pair("AWS_SECRET_ACCESS_KEY", "s3cr3t"),
            pair("HOME", "/home/octo"),
            pair("OAuthCode", "x"),
        ]);
        assert_eq!(env["GITHUB_TOKEN"], REDACTED);
        assert_eq!(env["AWS_SECRET_ACCESS_KEY"], REDACTED);
        assert_eq!(env["OAuthCode"], REDACTED);
        assert_eq!(env["HOME"], "/home/octo");
        assert!(!is_sensitive("PATH"));
    }

    #[test]
    fn splits_editor_command_lines() {
        let (program, args) = split_command("code --wait").expect("split");
        assert_eq!(program, "code");
        assert_eq!(args, vec!["--wait".to_string()]);
        assert!(split_command("   ").is_err());
    }

    #[test]
    fn export_writes_json_report() {
        let dir = tempdir().expect("tempdir");
        let target = dir.path().join("env.json");
        let written = export(Some(&target), "vi").expect("export");
        assert_eq!(written, target);

        let report: Value =
            serde_json::from_str(&fs::read_to_string(&target).expect("read")).expect("json");
        assert_eq!(
            report["system_info"]["tool_version"],
            env!("CARGO_PKG_VERSION")
        );
        assert!(report["git_config"].is_object());
        assert!(report["dependencies"]["git"].is_boolean());
    }

    #[test]
    fn update_available_when_versions_differ() {
        assert!(compare_versions("0.1.0", "0.2.0").update_available);
        assert!(!compare_versions("0.2.0", "0.2.0").update_available);
    }

    #[test]
    fn formats_byte_counts() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
