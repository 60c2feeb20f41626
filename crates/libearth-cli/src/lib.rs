//! # libearth-cli
//!
//! Library behind the `earth` command:
//! - `query`: read values from XML documents declared with a TOML schema
//! - `repo`: browse and fill repositories
//! - `config`: manage the configuration file

pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod error;
pub mod query;
pub mod repo_handlers;
pub mod schema_file;

pub use cli::{Cli, Command, ConfigAction, RepoAction};
pub use config::EarthConfig;
pub use error::{Error, Result};
pub use schema_file::SchemaFile;

use std::io::Write;

/// Runs a parsed command line, writing command output to `out`.
///
/// # Errors
///
/// Whatever the selected command reports.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action, out)?;
        }
        Command::Query {
            schema,
            file,
            paths,
        } => {
            let config = EarthConfig::load(config_path)?;
            let doc_type = SchemaFile::load(&schema)?.document_type()?;
            query::run_query(&doc_type, &file, &paths, config.chunk_size, out)?;
        }
        Command::Repo { url, action } => {
            let config = EarthConfig::load(config_path)?;
            let repository = repo_handlers::open_repository(url.as_deref(), &config)?;
            repo_handlers::handle_repo_command(repository.as_ref(), action, out)?;
        }
    }
    Ok(())
}
