//! Actions workflows, runs, secrets, and caches, plus the run monitor.

use std::{collections::BTreeMap, future::Future, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD};
use crypto_box::{PublicKey as SealKey, aead::OsRng};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    github::{
        GitHubClient, RepoName,
        types::{
            ActionsCache, CacheList, Job, JobList, PublicKey, Secret, SecretList, Workflow,
            WorkflowList, WorkflowRun, WorkflowRunList,
        },
    },
    poll::{Clock, PollOutcome, poll_until},
};

/// Default seconds between run status checks.
pub const DEFAULT_MONITOR_INTERVAL: u64 = 5;
/// Default seconds before monitoring gives up.
pub const DEFAULT_MONITOR_TIMEOUT: u64 = 300;

/// Filters for listing workflow runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    /// Workflow id or file name.
    pub workflow: Option<String>,
    /// Run status (`queued`, `in_progress`, `completed`, ...).
    pub status: Option<String>,
    /// Branch name.
    pub branch: Option<String>,
    /// Maximum number of runs to return.
    pub limit: Option<usize>,
}

/// Final state of a monitored run.
#[derive(Debug, Clone)]
pub struct MonitorResult {
    /// The last fetched run.
    pub run: WorkflowRun,
    /// Conclusion, unset when monitoring timed out.
    pub conclusion: Option<String>,
    /// Whether the timeout elapsed before the run completed.
    pub timed_out: bool,
}

/// Body for `PUT .../actions/secrets/{name}`.
#[derive(Debug, Serialize)]
struct EncryptedSecret<'a> {
    /// Sealed value, base64-encoded.
    encrypted_value: &'a str,
    /// Id of the key used to seal it.
    key_id: &'a str,
}

/// Body for a `workflow_dispatch` event.
#[derive(Debug, Serialize)]
struct Dispatch<'a> {
    /// Git ref to run on.
    #[serde(rename = "ref")]
    git_ref: &'a str,
    /// Workflow inputs.
    inputs: &'a BTreeMap<String, String>,
}

impl GitHubClient {
    /// Workflows defined in a repository.
    pub(crate) async fn list_workflows(&self, repo: &RepoName) -> Result<Vec<Workflow>> {
        let path = format!("{}/actions/workflows", repo.path());
        self.get_pages_with(&path, &[], None, |page: WorkflowList| page.workflows)
            .await
    }

    /// Resolve a workflow by numeric id or file name.
    pub(crate) async fn workflow(&self, repo: &RepoName, id_or_file: &str) -> Result<Workflow> {
        let path = format!("{}/actions/workflows/{id_or_file}", repo.path());
        match self.get::<Workflow>(&path).await {
            Ok(workflow) => Ok(workflow),
            Err(Error::Api { status, .. }) if status == StatusCode::NOT_FOUND => {
                debug!(id_or_file, "workflow lookup missed, scanning by path");
                self.list_workflows(repo)
                    .await?
                    .into_iter()
                    .find(|workflow| workflow.path.ends_with(id_or_file))
                    .ok_or_else(|| Error::NotFound {
                        what: format!("Workflow {id_or_file}"),
                    })
            }
            Err(error) => Err(error),
        }
    }

    /// Fire a `workflow_dispatch` event.
    pub(crate) async fn dispatch_workflow(
        &self,
        repo: &RepoName,
        workflow_id: u64,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<()> {
        let path = format!("{}/actions/workflows/{workflow_id}/dispatches", repo.path());
        let body = Dispatch { git_ref, inputs };
        self.send_json(Method::POST, &path, &body).await
    }

    /// List runs, optionally scoped to one workflow.
    pub(crate) async fn list_runs(
        &self,
        repo: &RepoName,
        filter: &RunFilter,
    ) -> Result<Vec<WorkflowRun>> {
        let path = match &filter.workflow {
            Some(id_or_file) => {
                let workflow = self.workflow(repo, id_or_file).await?;
                format!("{}/actions/workflows/{}/runs", repo.path(), workflow.id)
            }
            None => format!("{}/actions/runs", repo.path()),
        };
        let mut query = Vec::new();
        if let Some(status) = &filter.status {
            query.push(("status", status.clone()));
        }
        if let Some(branch) = &filter.branch {
            query.push(("branch", branch.clone()));
        }
        self.get_pages_with(&path, &query, filter.limit, |page: WorkflowRunList| {
            page.workflow_runs
        })
        .await
    }

    /// Fetch one run.
    pub(crate) async fn workflow_run(&self, repo: &RepoName, run_id: u64) -> Result<WorkflowRun> {
        self.get(&format!("{}/actions/runs/{run_id}", repo.path()))
            .await
    }

    /// Jobs (with steps) of a run.
    pub(crate) async fn run_jobs(&self, repo: &RepoName, run_id: u64) -> Result<Vec<Job>> {
        let path = format!("{}/actions/runs/{run_id}/jobs", repo.path());
        self.get_pages_with(&path, &[], None, |page: JobList| page.jobs)
            .await
    }

    /// Request cancellation of a run.
    pub(crate) async fn cancel_run(&self, repo: &RepoName, run_id: u64) -> Result<()> {
        let path = format!("{}/actions/runs/{run_id}/cancel", repo.path());
        self.call(Method::POST, &path).await
    }

    /// Re-run every job of a run.
    pub(crate) async fn rerun_run(&self, repo: &RepoName, run_id: u64) -> Result<()> {
        let path = format!("{}/actions/runs/{run_id}/rerun", repo.path());
        self.call(Method::POST, &path).await
    }

    /// Poll a run until it completes or `timeout` elapses.
    pub(crate) async fn monitor_workflow_run<C: Clock>(
        &self,
        repo: &RepoName,
        run_id: u64,
        clock: &C,
        interval: Duration,
        timeout: Duration,
    ) -> Result<MonitorResult> {
        monitor_run(clock, interval, timeout, move || {
            self.workflow_run(repo, run_id)
        })
        .await
    }

    /// Secret names in a repository.
    pub(crate) async fn list_secrets(&self, repo: &RepoName) -> Result<Vec<Secret>> {
        let path = format!("{}/actions/secrets", repo.path());
        self.get_pages_with(&path, &[], None, |page: SecretList| page.secrets)
            .await
    }

    /// Key used to seal secrets for this repository.
    pub(crate) async fn secrets_public_key(&self, repo: &RepoName) -> Result<PublicKey> {
        self.get(&format!("{}/actions/secrets/public-key", repo.path()))
            .await
    }

    /// Create or replace a secret, sealing the value locally first.
    pub(crate) async fn put_secret(&self, repo: &RepoName, name: &str, value: &str) -> Result<()> {
        let key = self.secrets_public_key(repo).await?;
        let encrypted_value = seal_secret(&key.key, value)?;
        let body = EncryptedSecret {
            encrypted_value: &encrypted_value,
            key_id: &key.key_id,
        };
        let path = format!("{}/actions/secrets/{name}", repo.path());
        self.send_json(Method::PUT, &path, &body).await
    }

    /// Delete a secret.
    pub(crate) async fn delete_secret(&self, repo: &RepoName, name: &str) -> Result<()> {
        self.delete(&format!("{}/actions/secrets/{name}", repo.path()))
            .await
    }

    /// Actions caches in a repository.
    pub(crate) async fn list_caches(&self, repo: &RepoName) -> Result<Vec<ActionsCache>> {
        let path = format!("{}/actions/caches", repo.path());
        self.get_pages_with(&path, &[], None, |page: CacheList| page.actions_caches)
            .await
    }

    /// Delete a cache by id.
    pub(crate) async fn delete_cache_by_id(&self, repo: &RepoName, id: u64) -> Result<()> {
        self.delete(&format!("{}/actions/caches/{id}", repo.path()))
            .await
    }

    /// Delete every cache entry with the given key.
    pub(crate) async fn delete_cache_by_key(&self, repo: &RepoName, key: &str) -> Result<()> {
        let path = format!("{}/actions/caches", repo.path());
        self.call_query(Method::DELETE, &path, &[("key", key.to_string())])
            .await
    }
}

/// Drive [`poll_until`] over a run fetcher, stopping on `completed`.
pub async fn monitor_run<C, F, Fut>(
    clock: &C,
    interval: Duration,
    timeout: Duration,
    fetch: F,
) -> Result<MonitorResult>
where
    C: Clock,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<WorkflowRun>>,
{
    let outcome = poll_until(clock, interval, Some(timeout), fetch, WorkflowRun::is_completed)
        .await?;
    Ok(match outcome {
        PollOutcome::Completed(run) => {
            info!(
                run_id = run.id,
                conclusion = run.conclusion.as_deref().unwrap_or("none"),
                "workflow run completed"
            );
            MonitorResult {
                conclusion: run.conclusion.clone(),
                run,
                timed_out: false,
            }
        }
        PollOutcome::TimedOut(run) => {
            warn!(run_id = run.id, ?timeout, "monitoring workflow run timed out");
            MonitorResult {
                run,
                conclusion: None,
                timed_out: true,
            }
        }
    })
}

/// Seal `value` for the repository key, returning base64 ciphertext.
pub fn seal_secret(public_key_b64: &str, value: &str) -> Result<String> {
    let raw = STANDARD
        .decode(public_key_b64)
        .map_err(|error| Error::SecretEncryption {
            message: format!("invalid public key: {error}"),
        })?;
    let bytes: [u8; 32] = raw.try_into().map_err(|_| Error::SecretEncryption {
        message: "public key must be 32 bytes".to_string(),
    })?;
    let key = SealKey::from(bytes);
    let sealed = key
        .seal(&mut OsRng, value.as_bytes())
        .map_err(|error| Error::SecretEncryption {
            message: error.to_string(),
        })?;
    Ok(STANDARD.encode(sealed))
}

/// Parse `key=value` workflow inputs.
pub fn parse_inputs(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut inputs = BTreeMap::new();
    for entry in raw {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(Error::validation(format!(
                "Input must be in key=value form, got '{entry}'"
            )));
        };
        if key.trim().is_empty() {
            return Err(Error::validation(format!("Input has an empty key: '{entry}'")));
        }
        inputs.insert(key.trim().to_string(), value.to_string());
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, time::Duration};

    use base64::{Engine, engine::general_purpose::STANDARD};
    use chrono::Utc;
    use crypto_box::{SecretKey, aead::OsRng};

    use super::{monitor_run, parse_inputs, seal_secret};
    use crate::{error::Error, github::types::WorkflowRun, poll::testing::ManualClock};

    fn run(status: &str, conclusion: Option<&str>) -> WorkflowRun {
        WorkflowRun {
            id: 42,
            name: Some("CI".to_string()),
            workflow_id: 7,
            status: status.to_string(),
            conclusion: conclusion.map(str::to_string),
            head_branch: Some("main".to_string()),
            head_sha: "abc".to_string(),
            event: "push".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            html_url: "https://github.com/o/r/actions/runs/42".to_string(),
        }
    }

    #[tokio::test]
    async fn completed_run_returns_without_sleeping() {
        let clock = ManualClock::default();
        let result = monitor_run(
            &clock,
            Duration::from_secs(5),
            Duration::from_secs(300),
            || async { Ok(run("completed", Some("success"))) },
        )
        .await
        .expect("monitor");
        assert!(!result.timed_out);
        assert_eq!(result.conclusion.as_deref(), Some("success"));
        assert_eq!(clock.sleeps(), 0);
    }

    #[tokio::test]
    async fn stuck_run_times_out_without_conclusion() {
        let clock = ManualClock::default();
        let polls = Cell::new(0_u32);
        let result = monitor_run(
            &clock,
            Duration::from_secs(5),
            Duration::from_secs(15),
            || {
                polls.set(polls.get() + 1);
                async { Ok(run("in_progress", None)) }
            },
        )
        .await
        .expect("monitor");
        assert!(result.timed_out);
        assert!(result.conclusion.is_none());
        assert!(polls.get() <= 4);
    }

    #[tokio::test]
    async fn fetch_error_aborts_monitoring() {
        let clock = ManualClock::default();
        let error = monitor_run(
            &clock,
            Duration::from_secs(5),
            Duration::from_secs(15),
            || async { Err(Error::NotFound { what: "run".to_string() }) },
        )
        .await
        .expect_err("should fail");
        assert!(matches!(error, Error::NotFound { .. }));
    }

    #[test]
    fn sealed_secret_opens_with_private_key() {
        let secret = SecretKey::generate(&mut OsRng);
        let public = STANDARD.encode(secret.public_key().as_bytes());
        let sealed = seal_secret(&public, "hunter2").expect("seal");
        let ciphertext = STANDARD.decode(sealed).expect("base64");
        let opened = secret.unseal(&ciphertext).expect("unseal");
        assert_eq!(opened, b"hunter2");
    }

    #[test]
    fn rejects_short_public_key() {
        let error = seal_secret(&STANDARD.encode([1_u8; 8]), "x").expect_err("short key");
        assert!(matches!(error, Error::SecretEncryption { .. }));
    }

    #[test]
    fn parses_key_value_inputs() {
        let inputs =
            parse_inputs(&["env=prod".to_string(), "note=a=b".to_string()]).expect("parse");
        assert_eq!(inputs["env"], "prod");
        assert_eq!(inputs["note"], "a=b");
        let error = parse_inputs(&["broken".to_string()]).expect_err("invalid");
        assert!(matches!(error, Error::Validation { .. }));
    }
}
