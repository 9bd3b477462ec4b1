//! Delete trait for resources the platform removes asynchronously.

use async_trait::async_trait;

use crate::client::CfClient;
use crate::error::Result;

/// Start deleting a resource.
///
/// Deletion runs as a platform job; the returned guid can be handed to
/// [`crate::JobPoller::wait_for_job`].
///
/// # Example
///
/// ```no_run
/// use cfclient::{App, CfClient, Delete};
///
/// # async fn example(client: &CfClient, guid: String) -> cfclient::Result<()> {
/// let job_guid = App::delete(client, guid).await?;
/// client.jobs().wait_for_job(&job_guid).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Delete {
    type Id: Send;

    /// Issue the delete and return the job guid.
    ///
    /// # Errors
    ///
    /// Returns an API error if the platform rejects the request, or
    /// [`crate::CfError::UnexpectedResponse`] if it names no job.
    async fn delete(client: &CfClient, id: Self::Id) -> Result<String>;
}
