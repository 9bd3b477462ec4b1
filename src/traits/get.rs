//! Get trait for fetching single resources.

use async_trait::async_trait;

use crate::client::CfClient;
use crate::error::Result;

/// Fetch a single resource by guid.
///
/// # Example
///
/// ```no_run
/// use cfclient::{App, CfClient, Get};
///
/// # async fn example(client: &CfClient) -> cfclient::Result<()> {
/// let app = App::get(client, "8b5f4a52-1c8d-4f0e-9a6e-6f1e7b2a9c01".to_string()).await?;
/// println!("{} is {}", app.name, app.state);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The identifier type, usually the resource guid.
    type Id: Send;

    /// Fetch the resource.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CfError::Api`] with a `CF-ResourceNotFound` entry if
    /// the resource does not exist, or any transport error.
    async fn get(client: &CfClient, id: Self::Id) -> Result<Self>;
}
