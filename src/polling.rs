//! Polling asynchronous platform operations to a terminal state.
//!
//! [`poll_until_terminal`] is the generic loop: fetch, classify, sleep,
//! repeat. [`JobPoller`] instantiates it for jobs, packages and builds.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::CfClient;
use crate::error::{ApiError, CfError, Result};
use crate::models::{Build, BuildState, Job, JobState, Package, PackageState};
use crate::traits::Get;

/// Default delay between two status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default ceiling on how long to wait for a terminal state.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// How a fetched status value should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still running; wait and fetch again.
    Pending,
    /// Finished successfully.
    Complete,
    /// Finished unsuccessfully with these errors.
    Failed(Vec<ApiError>),
}

/// Interval and timeout for a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between fetches.
    pub interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_POLL_TIMEOUT),
        }
    }
}

impl PollOptions {
    #[must_use]
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        Self { interval, timeout }
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait until the operation finishes, however long it takes.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Fetch a status repeatedly until `classify` reports a terminal state.
///
/// Fetches are strictly sequential. Returns the terminal value on
/// [`PollOutcome::Complete`].
///
/// # Errors
///
/// - [`CfError::JobFailed`] with the reported errors on [`PollOutcome::Failed`]
/// - [`CfError::PollTimeout`] if the timeout elapses first
/// - [`CfError::Cancelled`] if `cancel` fires
/// - any error returned by `fetch`
pub async fn poll_until_terminal<T, F, Fut, C>(
    operation: &str,
    mut fetch: F,
    classify: C,
    options: &PollOptions,
    cancel: &CancellationToken,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    C: Fn(&T) -> PollOutcome,
{
    let started = Instant::now();
    // A timeout too large to represent behaves as no timeout.
    let deadline = options.timeout.and_then(|t| started.checked_add(t));
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(CfError::Cancelled);
        }

        let value = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fetch())
                .await
                .map_err(|_| timeout_error(operation, options))??,
            None => fetch().await?,
        };
        attempt += 1;

        match classify(&value) {
            PollOutcome::Complete => {
                tracing::debug!(operation, attempt, "operation complete");
                return Ok(value);
            }
            PollOutcome::Failed(errors) => {
                tracing::debug!(operation, attempt, "operation failed");
                return Err(CfError::JobFailed {
                    operation: operation.to_string(),
                    errors,
                });
            }
            PollOutcome::Pending => {
                tracing::debug!(operation, attempt, "operation still pending");
            }
        }

        let sleep_for = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(timeout_error(operation, options));
                }
                options.interval.min(deadline - now)
            }
            None => options.interval,
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CfError::Cancelled),
            () = tokio::time::sleep(sleep_for) => {}
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(timeout_error(operation, options));
        }
    }
}

fn timeout_error(operation: &str, options: &PollOptions) -> CfError {
    CfError::PollTimeout {
        operation: operation.to_string(),
        timeout: options.timeout.unwrap_or_default(),
    }
}

/// Waits for jobs, packages and builds.
#[derive(Debug, Clone)]
pub struct JobPoller {
    client: CfClient,
    options: PollOptions,
}

impl JobPoller {
    pub fn new(client: CfClient, options: PollOptions) -> Self {
        Self { client, options }
    }

    /// The interval and timeout this poller uses.
    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// [`poll_until_terminal`] with this poller's options, cancelled by the
    /// client's cancellation token.
    pub async fn poll_until_terminal<T, F, Fut, C>(
        &self,
        operation: &str,
        fetch: F,
        classify: C,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        C: Fn(&T) -> PollOutcome,
    {
        poll_until_terminal(
            operation,
            fetch,
            classify,
            &self.options,
            self.client.cancellation_token(),
        )
        .await
    }

    /// Poll `GET /v3/jobs/:guid` until the job completes or fails.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::JobFailed`] carrying the job's own errors if it
    /// fails, and [`CfError::PollTimeout`] if it is still running when the
    /// timeout elapses.
    #[tracing::instrument(skip(self))]
    pub async fn wait_for_job(&self, job_guid: &str) -> Result<Job> {
        let client = &self.client;
        self.poll_until_terminal(
            &format!("job {job_guid}"),
            || Job::get(client, job_guid.to_string()),
            |job: &Job| match job.state {
                JobState::Complete => PollOutcome::Complete,
                JobState::Failed => PollOutcome::Failed(job.errors.clone()),
                JobState::Processing | JobState::Polling => PollOutcome::Pending,
            },
        )
        .await
    }

    /// Poll a package until it is READY.
    pub async fn wait_for_package_ready(&self, package_guid: &str) -> Result<Package> {
        let client = &self.client;
        self.poll_until_terminal(
            &format!("package {package_guid}"),
            || Package::get(client, package_guid.to_string()),
            |package: &Package| match package.state {
                PackageState::Ready => PollOutcome::Complete,
                PackageState::Failed | PackageState::Expired => {
                    PollOutcome::Failed(vec![ApiError::new(
                        0,
                        "PackageFailed",
                        format!("package is {}", package.state),
                    )])
                }
                _ => PollOutcome::Pending,
            },
        )
        .await
    }

    /// Poll a build until it is STAGED.
    pub async fn wait_for_build_staged(&self, build_guid: &str) -> Result<Build> {
        let client = &self.client;
        self.poll_until_terminal(
            &format!("build {build_guid}"),
            || Build::get(client, build_guid.to_string()),
            |build: &Build| match build.state {
                BuildState::Staged => PollOutcome::Complete,
                BuildState::Failed => PollOutcome::Failed(vec![ApiError::new(
                    0,
                    "StagingFailed",
                    build.error.clone().unwrap_or_else(|| "build failed".to_string()),
                )]),
                BuildState::Staging => PollOutcome::Pending,
            },
        )
        .await
    }
}
