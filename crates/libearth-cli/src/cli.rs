//! Command-line definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query libearth documents and browse repositories
#[derive(Parser, Debug)]
#[command(name = "earth", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read values from an XML document
    Query {
        /// Schema file declaring the document (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Document to read
        file: PathBuf,

        /// Attribute paths such as `entries.0.title`; prints the whole
        /// document as JSON when omitted
        paths: Vec<String>,
    },

    /// Repository operations
    Repo {
        /// Repository URL, defaults to the configured repository
        #[arg(short, long, env = "EARTH_REPOSITORY")]
        url: Option<String>,

        /// Repository subcommand
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Configuration management
    Config {
        /// Configuration subcommand
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Repository subcommands. Keys are written with `/` between segments.
#[derive(Subcommand, Debug)]
pub enum RepoAction {
    /// List names under a directory key (the root when omitted)
    Ls {
        /// Directory key
        key: Option<String>,
    },
    /// Print a stored object
    Cat {
        /// Object key
        key: String,
    },
    /// Report whether a key exists
    Exists {
        /// Key to check
        key: String,
    },
    /// Store a local file under a key
    Put {
        /// Object key
        key: String,
        /// File to store
        file: PathBuf,
    },
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Show the effective configuration
    Show,
    /// Create a default configuration file
    Init {
        /// Where to write the file, defaults to the config path
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
