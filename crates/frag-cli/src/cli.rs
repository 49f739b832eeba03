use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "frag",
    about = "Store, list and convert user-owned fragments",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML store configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store fragments on disk under this directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Acting user (defaults to $USER)
    #[arg(short, long, global = true)]
    pub user: Option<String>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a fragment from a file or stdin
    Create(CreateArgs),
    /// Replace the content of an existing fragment
    Update(UpdateArgs),
    /// Print a fragment's content, optionally converted by extension
    Get(GetArgs),
    /// Show a fragment's metadata
    Info(InfoArgs),
    /// List the current user's fragments
    List(ListArgs),
    /// Delete a fragment
    Rm(RmArgs),
    /// Show the accepted content types
    Types(TypesArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Input file, or `-` for stdin
    pub input: String,
    #[arg(short = 't', long = "type")]
    pub fragment_type: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    /// Input file, or `-` for stdin
    pub input: String,
    /// New declared type (defaults to the stored one)
    #[arg(short = 't', long = "type")]
    pub fragment_type: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    /// Fragment id, optionally followed by `.ext`
    pub target: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct InfoArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Include full metadata
    #[arg(long)]
    pub expand: bool,
}

#[derive(Args)]
pub struct RmArgs {
    pub id: String,
}

#[derive(Args)]
pub struct TypesArgs {}
