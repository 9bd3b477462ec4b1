//! Cloud Foundry V3 API CLI binary.
//!
//! A command-line interface for inspecting and deleting platform resources.

use std::process::ExitCode;
use std::time::Duration;

use cfclient::cli::{Cli, Command, Entity};
use cfclient::output::PrettyPrint;
use cfclient::{
    App, CfClient, CfError, Delete, Get, List, ListOptions, Organization, Page, PollOptions, Space,
};
use clap::Parser;
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match CfClient::from_env().await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set CF_API and CF_USERNAME/CF_PASSWORD (or CF_CLIENT_ID/CF_CLIENT_SECRET)");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &CfClient, cli: Cli) -> cfclient::Result<()> {
    match cli.command {
        Command::Get { entity, guid } => handle_get(client, entity, guid, cli.json).await,
        Command::List {
            entity,
            page,
            per_page,
        } => handle_list(client, entity, page, per_page, cli.json).await,
        Command::Delete {
            entity,
            guid,
            wait,
            timeout,
        } => handle_delete(client, entity, guid, wait, timeout, cli.json).await,
    }
}

async fn handle_get(
    client: &CfClient,
    entity: Entity,
    guid: String,
    json: bool,
) -> cfclient::Result<()> {
    match entity {
        Entity::App => output_single(&App::get(client, guid).await?, json),
        Entity::Org => output_single(&Organization::get(client, guid).await?, json),
        Entity::Space => output_single(&Space::get(client, guid).await?, json),
    }
}

async fn handle_list(
    client: &CfClient,
    entity: Entity,
    page: Option<u32>,
    per_page: Option<u32>,
    json: bool,
) -> cfclient::Result<()> {
    let mut options = ListOptions::new();
    if let Some(per_page) = per_page {
        options = options.per_page(per_page);
    }

    match (entity, page) {
        (Entity::App, Some(page)) => {
            let apps = App::list_page(client, &options.page(page)).await?;
            output_page(&apps, json, |a| AppRow::from(a))
        }
        (Entity::App, None) => output_all(
            &App::list_all(client, &options).await?,
            json,
            |a| AppRow::from(a),
        ),
        (Entity::Org, Some(page)) => {
            let orgs = Organization::list_page(client, &options.page(page)).await?;
            output_page(&orgs, json, |o| OrgRow::from(o))
        }
        (Entity::Org, None) => output_all(
            &Organization::list_all(client, &options).await?,
            json,
            |o| OrgRow::from(o),
        ),
        (Entity::Space, Some(page)) => {
            let spaces = Space::list_page(client, &options.page(page)).await?;
            output_page(&spaces, json, |s| SpaceRow::from(s))
        }
        (Entity::Space, None) => output_all(
            &Space::list_all(client, &options).await?,
            json,
            |s| SpaceRow::from(s),
        ),
    }
}

async fn handle_delete(
    client: &CfClient,
    entity: Entity,
    guid: String,
    wait: bool,
    timeout: Option<u64>,
    json: bool,
) -> cfclient::Result<()> {
    if entity != Entity::App {
        eprintln!("Error: Only apps can be deleted via CLI");
        return Err(CfError::Config("only apps support delete".to_string()));
    }

    let job_guid = App::delete(client, guid).await?;
    if !wait {
        println!("Deletion started (job {job_guid})");
        return Ok(());
    }

    let mut options = PollOptions::default();
    if let Some(secs) = timeout {
        options = options.timeout(Duration::from_secs(secs));
    }
    let job = client
        .clone()
        .with_poll_options(options)
        .jobs()
        .wait_for_job(&job_guid)
        .await?;
    output_single(&job, json)
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> cfclient::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item).map_err(CfError::Encode)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_all<T, R, F>(items: &[T], json: bool, to_row: F) -> cfclient::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items).map_err(CfError::Encode)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        println!("\n{} total items", items.len());
    }
    Ok(())
}

fn output_page<T, R, F>(page: &Page<T>, json: bool, to_row: F) -> cfclient::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(&page.items).map_err(CfError::Encode)?);
    } else {
        let rows: Vec<R> = page.items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        let more = if page.has_more() { "more available" } else { "end" };
        println!(
            "\n{} of {} total items across {} pages ({more})",
            page.len(),
            page.total(),
            page.pagination.total_pages
        );
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct AppRow {
    guid: String,
    name: String,
    state: String,
    space: String,
}

impl From<&App> for AppRow {
    fn from(a: &App) -> Self {
        Self {
            guid: a.guid.clone(),
            name: a.name.clone(),
            state: a.state.to_string(),
            space: a.space_guid().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Tabled)]
struct OrgRow {
    guid: String,
    name: String,
    suspended: bool,
}

impl From<&Organization> for OrgRow {
    fn from(o: &Organization) -> Self {
        Self {
            guid: o.guid.clone(),
            name: o.name.clone(),
            suspended: o.suspended,
        }
    }
}

#[derive(Tabled)]
struct SpaceRow {
    guid: String,
    name: String,
    organization: String,
}

impl From<&Space> for SpaceRow {
    fn from(s: &Space) -> Self {
        Self {
            guid: s.guid.clone(),
            name: s.name.clone(),
            organization: s.organization_guid().unwrap_or_default().to_string(),
        }
    }
}
