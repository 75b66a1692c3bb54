//! Command-line interface for adcheck.

pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Device;

/// adcheck - paid search ad presence checker
/// Checks whether ads show up for a query, on demand or on a schedule
#[derive(Parser)]
#[command(name = "adcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API together with the scheduler loop
    #[command(alias = "daemon")]
    Serve,

    /// Process due jobs once and exit
    RunOnce,

    /// Check a query for ads right now
    #[command(alias = "c")]
    Check {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Device profile (desktop or mobile)
        #[arg(long, default_value = "desktop")]
        device: Device,
        /// Free-text location, e.g. "Izmir"
        #[arg(long)]
        location: Option<String>,
    },

    /// Manage scheduled jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },

    /// Show recent search logs
    Logs {
        /// Number of entries to show
        #[arg(default_value = "20")]
        limit: u64,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum JobsCommands {
    /// Add a recurring check
    Add {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Minutes between runs
        #[arg(long, default_value = "60")]
        interval: i32,
        #[arg(long, default_value = "desktop")]
        device: Device,
        #[arg(long)]
        location: Option<String>,
        /// Chat that receives this job's alerts
        #[arg(long)]
        chat: Option<String>,
    },
    /// List all jobs
    #[command(alias = "ls")]
    List,
    /// Delete a job
    #[command(alias = "rm")]
    Remove {
        /// Job ID
        id: i32,
    },
    /// Stop selecting a job as due
    Pause {
        id: i32,
    },
    /// Resume a paused job
    Resume {
        id: i32,
    },
}
