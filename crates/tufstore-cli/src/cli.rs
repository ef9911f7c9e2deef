use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tufstore",
    about = "Stage, publish, and garbage-collect a software-update trust repository",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory. Overrides `root` from the config file.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

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
    /// Create the keys/, repository/, and staged/ layout
    Init,
    /// List effective metadata documents
    Meta,
    /// Stage a metadata document
    SetMeta(SetMetaArgs),
    /// Show whether a target is staged
    Target(TargetArgs),
    /// Publish staging into the repository
    Commit(CommitArgs),
    /// Discard everything staged
    Clean,
    /// List key IDs saved for a role
    Keys(KeysArgs),
    /// Save a signing key for a role
    AddKey(AddKeyArgs),
}

#[derive(Args)]
pub struct SetMetaArgs {
    /// Name relative to the staging directory, e.g. `root.json`
    pub name: String,
    /// File holding the document bytes
    pub file: PathBuf,
}

#[derive(Args)]
pub struct TargetArgs {
    /// Path relative to the staged targets directory
    pub path: String,
}

#[derive(Args)]
pub struct CommitArgs {
    /// JSON hash set: `{"targets/a.txt": {"sha256": "<hex>"}}`
    #[arg(long)]
    pub hashes: PathBuf,
    /// Publish under content-addressed names. Defaults to the config value.
    #[arg(long)]
    pub consistent_snapshot: bool,
    /// Publish under plain names even when the config enables snapshots.
    #[arg(long, conflicts_with = "consistent_snapshot")]
    pub no_consistent_snapshot: bool,
}

impl CommitArgs {
    /// Publication mode after applying flags over the configured default.
    pub fn snapshot_mode(&self, configured: bool) -> bool {
        if self.no_consistent_snapshot {
            false
        } else {
            self.consistent_snapshot || configured
        }
    }
}

#[derive(Args)]
pub struct KeysArgs {
    pub role: String,
}

#[derive(Args)]
pub struct AddKeyArgs {
    pub role: String,
    /// JSON key file: `{"keytype": "...", "keyval": {"public": "<hex>"}}`
    pub key: PathBuf,
}
