use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vibe-review",
    version,
    about = "AI code review with a traffic-light verdict and a session leaderboard"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review one or more repositories, one after another.
    Review(ReviewArgs),
    /// Open the interactive review screen.
    Tui(TuiArgs),
    /// Print the reviewer output schema.
    Schema,
    /// Print the review request for a repository without calling the reviewer.
    Prompt(PromptArgs),
}

/// Settings that override the loaded configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Reviewer model name.
    #[arg(long)]
    pub model: Option<String>,

    /// Hosting API base URL (e.g., "https://api.github.com").
    #[arg(long)]
    pub api_base: Option<String>,
}

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Repository URLs (e.g., "https://github.com/owner/repo").
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Print outcomes and leaderboard as JSON.
    #[arg(long)]
    pub json: bool,

    /// Use a saved reviewer payload instead of calling the reviewer.
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Args, Debug)]
pub struct TuiArgs {
    /// Repository URL to prefill.
    pub url: Option<String>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Repository URL.
    pub url: String,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
