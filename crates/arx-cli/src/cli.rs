use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arx",
    about = "Inspect and validate Arx artifact directories",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with session settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List artifacts under a directory
    Ls(LsArgs),
    /// Check artifacts against their schemas and content hashes
    Validate(ValidateArgs),
    /// Load an artifact and summarise its contents
    Show(ShowArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct LsArgs {
    #[arg(default_value = ".")]
    pub dir: PathBuf,
    /// Also list artifacts nested inside other artifacts
    #[arg(short, long)]
    pub children: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    pub dir: PathBuf,
}
