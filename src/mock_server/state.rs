//! Mock server state management.
//!
//! Provides the in-memory data store for the mock platform.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{ApiError, App, Job, JobState, Metadata, Organization, Space};

/// Default username accepted by the password grant.
pub const DEFAULT_USERNAME: &str = "admin";

/// Default password accepted by the password grant.
pub const DEFAULT_PASSWORD: &str = "admin";

/// Seconds until an issued access token expires.
pub const TOKEN_LIFETIME_SECS: i64 = 599;

/// A job plus the script that drives it.
#[derive(Debug, Clone)]
pub struct MockJob {
    pub job: Job,
    /// Polls left that report PROCESSING.
    pub remaining_polls: u32,
    /// Finish FAILED instead of COMPLETE.
    pub fail: bool,
}

/// Tokens handed out by the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
}

/// Shared state for the mock server.
///
/// Collections are kept in insertion order so pagination is stable.
#[derive(Debug, Default)]
pub struct MockState {
    /// Address the server is reachable at, used for absolute links.
    pub base_url: String,

    pub apps: Vec<App>,
    pub organizations: Vec<Organization>,
    pub spaces: Vec<Space>,

    /// Jobs indexed by guid.
    pub jobs: HashMap<String, MockJob>,

    /// Username to password.
    pub users: HashMap<String, String>,

    /// Access tokens currently accepted by the API.
    pub valid_tokens: HashSet<String>,
    /// Refresh tokens accepted by the refresh grant.
    pub refresh_tokens: HashSet<String>,

    /// Number of successful grants issued so far.
    pub token_requests: u64,

    /// How many polls a new job stays PROCESSING.
    pub job_polls: u32,
    /// New jobs finish FAILED.
    pub fail_jobs: bool,

    next_id: u64,
}

impl MockState {
    /// Create a new empty state that accepts the default user.
    pub fn new() -> Self {
        Self::default().with_user(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    pub fn with_app(mut self, app: App) -> Self {
        self.apps.push(app);
        self
    }

    pub fn with_organization(mut self, organization: Organization) -> Self {
        self.organizations.push(organization);
        self
    }

    pub fn with_space(mut self, space: Space) -> Self {
        self.spaces.push(space);
        self
    }

    /// Accept `username`/`password` on the password grant.
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users
            .insert(username.to_string(), password.to_string());
        self
    }

    /// Keep new jobs PROCESSING for `polls` polls.
    pub fn with_job_polls(mut self, polls: u32) -> Self {
        self.job_polls = polls;
        self
    }

    /// Make new jobs finish FAILED.
    pub fn with_failing_jobs(mut self) -> Self {
        self.fail_jobs = true;
        self
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    pub fn get_app(&self, guid: &str) -> Option<&App> {
        self.apps.iter().find(|a| a.guid == guid)
    }

    pub fn get_organization(&self, guid: &str) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.guid == guid)
    }

    pub fn get_space(&self, guid: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.guid == guid)
    }

    /// Apply a partial update and return the updated app.
    ///
    /// Metadata is merged key by key; a `null` value removes the key.
    pub fn update_app(
        &mut self,
        guid: &str,
        name: Option<String>,
        metadata: Option<Metadata>,
    ) -> Option<&App> {
        let app = self.apps.iter_mut().find(|a| a.guid == guid)?;
        if let Some(name) = name {
            app.name = name;
        }
        if let Some(metadata) = metadata {
            merge_entries(&mut app.metadata.labels, metadata.labels);
            merge_entries(&mut app.metadata.annotations, metadata.annotations);
        }
        Some(app)
    }

    /// Remove an app and start the job that reports the deletion.
    ///
    /// Returns the job guid, or `None` if the app does not exist.
    pub fn delete_app(&mut self, guid: &str) -> Option<String> {
        let index = self.apps.iter().position(|a| a.guid == guid)?;
        self.apps.remove(index);
        Some(self.start_job("app.delete"))
    }

    /// Start a job following the configured script.
    pub fn start_job(&mut self, operation: &str) -> String {
        let guid = self.next_id("job");
        let job = Job {
            guid: guid.clone(),
            operation: operation.to_string(),
            state: JobState::Processing,
            errors: vec![],
            warnings: vec![],
            created_at: Some(chrono::Utc::now()),
            updated_at: None,
            links: Default::default(),
        };
        self.jobs.insert(
            guid.clone(),
            MockJob {
                job,
                remaining_polls: self.job_polls,
                fail: self.fail_jobs,
            },
        );
        guid
    }

    /// Observe a job, advancing its script by one step.
    pub fn poll_job(&mut self, guid: &str) -> Option<Job> {
        let entry = self.jobs.get_mut(guid)?;
        if entry.remaining_polls > 0 {
            entry.remaining_polls -= 1;
        } else if entry.fail {
            entry.job.state = JobState::Failed;
            entry.job.errors = vec![ApiError::new(
                10008,
                "CF-UnprocessableEntity",
                format!("{} failed", entry.job.operation),
            )];
        } else {
            entry.job.state = JobState::Complete;
        }
        entry.job.updated_at = Some(chrono::Utc::now());
        Some(entry.job.clone())
    }

    /// Check a password grant.
    pub fn check_password(&self, username: &str, password: &str) -> bool {
        self.users.get(username).is_some_and(|p| p == password)
    }

    /// Issue a fresh access/refresh token pair.
    pub fn issue_token(&mut self) -> TokenGrant {
        self.token_requests += 1;
        let grant = TokenGrant {
            access_token: self.next_id("access"),
            refresh_token: self.next_id("refresh"),
        };
        self.valid_tokens.insert(grant.access_token.clone());
        self.refresh_tokens.insert(grant.refresh_token.clone());
        grant
    }

    /// Exchange a refresh token. Refresh tokens are single use.
    pub fn redeem_refresh_token(&mut self, refresh_token: &str) -> Option<TokenGrant> {
        if !self.refresh_tokens.remove(refresh_token) {
            return None;
        }
        Some(self.issue_token())
    }

    pub fn is_authorized(&self, access_token: &str) -> bool {
        self.valid_tokens.contains(access_token)
    }

    /// Reject every access token issued so far.
    pub fn revoke_tokens(&mut self) {
        self.valid_tokens.clear();
    }
}

fn merge_entries(
    target: &mut BTreeMap<String, Option<String>>,
    patch: BTreeMap<String, Option<String>>,
) {
    for (key, value) in patch {
        match value {
            Some(value) => {
                target.insert(key, Some(value));
            }
            None => {
                target.remove(&key);
            }
        }
    }
}
