//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! cfclient binary.

use clap::{Parser, Subcommand, ValueEnum};

/// Cloud Foundry V3 API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "cfclient", about = "Cloud Foundry V3 API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a single resource by guid.
    Get {
        /// The type of resource to get.
        entity: Entity,

        /// The resource guid.
        guid: String,
    },

    /// List resources. Fetches every page unless --page is given.
    List {
        /// The type of resource to list.
        entity: Entity,

        /// Fetch only this page (1-indexed).
        #[arg(long)]
        page: Option<u32>,

        /// Number of items per page.
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Delete a resource.
    Delete {
        /// The type of resource to delete. Only apps are supported.
        entity: Entity,

        /// The resource guid.
        guid: String,

        /// Wait for the deletion job to finish.
        #[arg(long)]
        wait: bool,

        /// Seconds to wait with --wait before giving up.
        #[arg(long, requires = "wait")]
        timeout: Option<u64>,
    },
}

/// Resource types that can be operated on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    /// An application.
    #[value(alias = "apps")]
    App,
    /// An organization.
    #[value(alias = "orgs", alias = "organization", alias = "organizations")]
    Org,
    /// A space.
    #[value(alias = "spaces")]
    Space,
}
