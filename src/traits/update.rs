//! Update trait for modifying resources.

use async_trait::async_trait;

use crate::client::CfClient;
use crate::error::Result;

/// Update an existing resource with a partial `PATCH`.
///
/// # Example
///
/// ```no_run
/// use cfclient::{App, AppUpdate, CfClient, Update};
///
/// # async fn example(client: &CfClient, guid: String) -> cfclient::Result<()> {
/// let app = App::update(
///     client,
///     guid,
///     AppUpdate {
///         name: Some("renamed".to_string()),
///         ..Default::default()
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Update: Sized {
    type Id: Send;

    /// Fields to change. Fields left `None` are not sent.
    type Params: Send;

    /// Update the resource and return the updated version.
    async fn update(client: &CfClient, id: Self::Id, params: Self::Params) -> Result<Self>;
}
