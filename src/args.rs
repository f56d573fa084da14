use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "brandwatch",
    about = "Track how often a brand domain shows up in AI search answers for a set of topics",
    version,
    long_about = None
)]
pub struct Args {
    /// Base URL of the keyword backend
    #[arg(long, env = "BRANDWATCH_API_URL", default_value = "http://localhost:8080", global = true)]
    pub api_url: String,

    /// Request path of the conversational keywords endpoint
    #[arg(long, env = "BRANDWATCH_ENDPOINT", default_value = "/analyze", global = true)]
    pub endpoint: String,

    /// Path to the session database
    #[arg(long, env = "BRANDWATCH_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 120, global = true)]
    pub timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a brand domain and its topics, then show the dashboard
    Submit {
        /// Brand domain, e.g. example.com
        domain: String,

        /// Topics to track
        #[arg(required = true)]
        topics: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Re-run the saved domain and topics
    Refresh {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the dashboard for the saved results
    Show {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Forget the saved domain, topics and results
    Reset,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Only show topics whose name contains this text
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Table page to show (1-based)
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,

    /// Toggle chart membership of a topic id (repeatable)
    #[arg(short, long = "toggle")]
    pub toggle: Vec<String>,

    /// Print the dashboard as JSON
    #[arg(long)]
    pub json: bool,
}
