use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wgbridge",
    about = "WireGuard tunnel lifecycle manager",
    version = env!("WGBRIDGE_BUILD_VERSION")
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: TopCommand,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum TopCommand {
    /// Generate a WireGuard key pair and print it as JSON
    Genkey,

    /// Show the current status of a tunnel
    Status {
        /// Tunnel name
        tunnel: String,
    },

    /// Bring a tunnel up and monitor it until interrupted
    Connect {
        /// Tunnel name
        tunnel: String,

        /// Path to a wg-quick config file
        #[arg(long)]
        config: PathBuf,
    },

    /// Bring a tunnel down
    Disconnect {
        /// Tunnel name
        tunnel: String,
    },

    /// Follow status transitions and statistics for a running tunnel
    Watch {
        /// Tunnel name
        tunnel: String,
    },
}
