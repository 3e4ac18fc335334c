//! CLI module - Command-line interface for Recipebox
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Recipebox - recipe catalog and account service
#[derive(Parser)]
#[command(name = "recipebox")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API until Ctrl+C
    #[command(alias = "daemon")]
    Serve,

    /// Block until the database accepts connections
    WaitForDb {
        /// Give up after this many failed checks (0 waits forever)
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Milliseconds between checks
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Create an account with staff and superuser rights
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Re-enable login for an account
    Activate {
        /// Account email
        email: String,
    },

    /// Disable login for an account without deleting it
    Deactivate {
        /// Account email
        email: String,
    },

    /// Create default config file
    Init,
}

pub use commands::*;
