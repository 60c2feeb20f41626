//! Handler functions for repository CLI commands.

use crate::cli::RepoAction;
use crate::config::EarthConfig;
use libearth_core::{Error, Result};
use libearth_repository::{from_url, Repository};
use std::io::Write;
use std::path::Path;

/// Splits a `/`-separated key into segments. Empty segments are dropped, so
/// `""` and `"/"` name the root.
pub fn parse_key(key: &str) -> Vec<&str> {
    key.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Opens the repository given on the command line or in the configuration.
pub fn open_repository(url: Option<&str>, config: &EarthConfig) -> Result<Box<dyn Repository>> {
    let url = url
        .or(config.repository_url.as_deref())
        .ok_or_else(|| Error::config("no repository URL; pass --url or set repository_url"))?;
    tracing::debug!(url, "opening repository");
    from_url(url)
}

/// Handle a repository subcommand.
pub fn handle_repo_command(
    repository: &dyn Repository,
    action: RepoAction,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        RepoAction::Ls { key } => cmd_repo_ls(repository, key.as_deref().unwrap_or(""), out),
        RepoAction::Cat { key } => cmd_repo_cat(repository, &key, out),
        RepoAction::Exists { key } => cmd_repo_exists(repository, &key, out).map(|_| ()),
        RepoAction::Put { key, file } => cmd_repo_put(repository, &key, &file, out),
    }
}

/// List the names under a directory key, one per line.
pub fn cmd_repo_ls(repository: &dyn Repository, key: &str, out: &mut dyn Write) -> Result<()> {
    for name in repository.list(&parse_key(key))? {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Copy a stored object to `out` chunk by chunk.
pub fn cmd_repo_cat(repository: &dyn Repository, key: &str, out: &mut dyn Write) -> Result<()> {
    for chunk in repository.read(&parse_key(key))? {
        out.write_all(&chunk?)?;
    }
    out.flush()?;
    Ok(())
}

/// Print and return whether a key exists.
pub fn cmd_repo_exists(repository: &dyn Repository, key: &str, out: &mut dyn Write) -> Result<bool> {
    let exists = repository.exists(&parse_key(key));
    writeln!(out, "{exists}")?;
    Ok(exists)
}

/// Store a local file under a key.
pub fn cmd_repo_put(
    repository: &dyn Repository,
    key: &str,
    file: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let data = std::fs::read(file)?;
    repository.write_bytes(&parse_key(key), &data)?;
    writeln!(out, "Stored {} bytes at {key}", data.len())?;
    Ok(())
}
