//! Example: print the status of paths as JSON
//!
//! Run with: cargo run --example status -- path/to/wc/file.txt [more paths...]
//!
//! Set `SVN_CLIENT_CONFIG` to a TOML file to override the client defaults.

use std::path::PathBuf;

use anyhow::Context;
use svn::{ClientConfig, ClientFactory, StatusOptions, SvnWorkingCopy};

fn main() -> anyhow::Result<()> {
    utils::log::init_tracing("svn=info");

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: status <path>...");
    }

    let config = match std::env::var_os("SVN_CLIENT_CONFIG") {
        Some(path) => ClientConfig::load(path.as_ref())?,
        None => ClientConfig::default(),
    };
    let client = ClientFactory::create(&config).context("svn client unavailable")?;
    tracing::info!("using {}", client.description());

    let options = StatusOptions {
        contact_server: std::env::var_os("SVN_STATUS_REMOTE").is_some(),
        ..Default::default()
    };
    let statuses = client.status_with_options(&paths, &options)?;
    println!("{}", serde_json::to_string_pretty(&statuses)?);
    Ok(())
}
