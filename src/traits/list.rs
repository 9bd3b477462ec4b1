//! List trait for fetching collections.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::client::CfClient;
use crate::error::Result;
use crate::pagination::{ListOptions, Page};
use crate::request::Request;

/// List a collection, one page or all of them.
///
/// Implementors only name their collection path; paging is handled by the
/// client's [`crate::PageWalker`], which follows the server's `next` links
/// until there are none.
///
/// # Example
///
/// ```no_run
/// use cfclient::{CfClient, List, ListOptions, Space};
///
/// # async fn example(client: &CfClient) -> cfclient::Result<()> {
/// // Fetch a single page
/// let page = Space::list_page(client, &ListOptions::new().page(1).per_page(10)).await?;
/// println!("{} of {}", page.len(), page.total());
///
/// // Fetch all pages
/// let spaces = Space::list_all(client, &ListOptions::new()).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait List: Sized + Send + DeserializeOwned {
    /// Collection path, e.g. `/v3/apps`.
    const PATH: &'static str;

    /// Fetch the page selected by `options` (the first page by default).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a
    /// collection.
    async fn list_page(client: &CfClient, options: &ListOptions) -> Result<Page<Self>> {
        client.list_page(Self::PATH, options).await
    }

    /// Fetch every resource matching `options`.
    ///
    /// If `options` pins a page only that page is returned.
    ///
    /// # Errors
    ///
    /// Returns the first failing page's error.
    async fn list_all(client: &CfClient, options: &ListOptions) -> Result<Vec<Self>> {
        client.list_all(Self::PATH, options).await
    }

    /// The first matching resource.
    async fn first(client: &CfClient, options: &ListOptions) -> Result<Self> {
        client
            .pages()
            .first(
                Request::get(options.apply(Self::PATH)),
                client.cancellation_token(),
            )
            .await
    }

    /// The only matching resource, e.g. an app looked up by name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CfError::NoResults`] or
    /// [`crate::CfError::MultipleResults`] unless exactly one matches.
    async fn single(client: &CfClient, options: &ListOptions) -> Result<Self> {
        client
            .pages()
            .single(
                Request::get(options.apply(Self::PATH)),
                client.cancellation_token(),
            )
            .await
    }
}
