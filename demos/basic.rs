//! Basic example demonstrating the Cloud Foundry API client.
//!
//! Run with:
//! ```
//! CF_API=https://api.sys.example.com CF_USERNAME=admin CF_PASSWORD=secret \
//!     cargo run --example basic
//! ```

use cfclient::{App, CfClient, Get, List, ListOptions, Organization, Space};

#[tokio::main]
async fn main() -> cfclient::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating Cloud Foundry client...");
    let client = CfClient::from_env().await?;
    println!("Connected to: {}", client.base_url());

    // List first page of organizations
    println!("\n--- Listing Organizations (first page) ---");
    let orgs = Organization::list_page(&client, &ListOptions::new().per_page(10)).await?;
    println!("Found {} organizations (total: {})", orgs.len(), orgs.total());

    for org in &orgs {
        println!("  - {} ({})", org.name, org.guid);
    }

    // Walk the spaces of the first organization
    if let Some(first_org) = orgs.items.first() {
        println!("\n--- Spaces in {} ---", first_org.name);
        let spaces = Space::list_in_organization(&client, &first_org.guid).await?;
        for space in &spaces {
            println!("  - {} ({})", space.name, space.guid);
        }

        // List every app in the first space, following pagination links
        if let Some(space) = spaces.first() {
            println!("\n--- Apps in {} ---", space.name);
            let options = ListOptions::new()
                .filter("space_guids", space.guid.as_str())
                .order_by("name");
            let apps = App::list_all(&client, &options).await?;
            println!("Found {} apps", apps.len());

            for app in apps.iter().take(5) {
                println!("  - {} [{}]", app.name, app.state);
            }

            // Get one app in full
            if let Some(first_app) = apps.first() {
                println!("\n--- App Details ---");
                let app = App::get(&client, first_app.guid.clone()).await?;
                println!("  Guid: {}", app.guid);
                println!("  State: {}", app.state);
                if let Some(lifecycle) = &app.lifecycle {
                    println!("  Lifecycle: {}", lifecycle.lifecycle_type);
                }
                println!("  Labels: {:?}", app.metadata.labels);
            }
        }
    }

    println!("\nDone!");
    Ok(())
}
