use crate::backend::cli::CommandlineClient;
use crate::error::SvnError;
use crate::metadata::WorkingCopyParser;
use crate::traits::SvnClient;
use crate::types::{Credentials, Version};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Oldest executable release whose output the parsers understand
pub const MIN_VERSION: Version = Version::new(1, 6, 0);

/// Type of client implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientType {
    /// Drives the `svn` executable
    Commandline,
}

/// Retry policy for commits hitting transient working-copy locks
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommitRetry {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Sleep before retry `n` is `n * backoff_unit_ms`
    pub backoff_unit_ms: u64,
}

impl Default for CommitRetry {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_unit_ms: 100,
        }
    }
}

impl CommitRetry {
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_unit_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Configuration for the command-line client
///
/// Every field has a default, so an empty TOML document is valid:
///
/// ```toml
/// executable = "/usr/bin/svn"
/// config_dir = "/home/me/.config/svn-cli/config"
/// working_dir = "/home/me/src"
/// targets_threshold = 30
///
/// [credentials]
/// username = "alice"
/// password = "secret"
///
/// [commit_retry]
/// max_attempts = 5
/// backoff_unit_ms = 100
///
/// [locale]
/// LC_MESSAGES = "C"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub executable: PathBuf,
    /// Passed as `--config-dir` to every command; defaults to a private directory
    pub config_dir: Option<PathBuf>,
    /// Directory commands run in; relative paths resolve against it
    pub working_dir: Option<PathBuf>,
    pub credentials: Option<Credentials>,
    /// Environment set on every process; the defaults keep messages and dates parseable
    pub locale: BTreeMap<String, String>,
    pub commit_retry: CommitRetry,
    /// Target lists longer than this go through a `--targets` file
    pub targets_threshold: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("svn"),
            config_dir: utils::svn::default_config_dir().ok(),
            working_dir: None,
            credentials: None,
            locale: default_locale(),
            commit_retry: CommitRetry::default(),
            targets_threshold: 30,
        }
    }
}

fn default_locale() -> BTreeMap<String, String> {
    [("LC_ALL", ""), ("LC_MESSAGES", "C"), ("LC_TIME", "C")]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

impl ClientConfig {
    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, SvnError> {
        toml::from_str(content).map_err(|err| SvnError::Config(err.to_string()))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self, SvnError> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            SvnError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Locale overrides as a process environment
    pub fn environment(&self) -> Vec<(String, String)> {
        self.locale
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Factory for creating clients
pub struct ClientFactory;

impl ClientFactory {
    /// Create a client, verifying the executable runs and is recent enough
    pub fn create(config: &ClientConfig) -> Result<Box<dyn SvnClient>, SvnError> {
        Ok(Box::new(Self::create_commandline(config, None)?))
    }

    /// Create a client that asks `parser` before spawning the executable for status
    pub fn create_with_parser(
        config: &ClientConfig,
        parser: Arc<dyn WorkingCopyParser>,
    ) -> Result<Box<dyn SvnClient>, SvnError> {
        Ok(Box::new(Self::create_commandline(config, Some(parser))?))
    }

    fn create_commandline(
        config: &ClientConfig,
        parser: Option<Arc<dyn WorkingCopyParser>>,
    ) -> Result<CommandlineClient, SvnError> {
        let executable = utils::svn::check_svn_installed(&config.executable)
            .map_err(|err| SvnError::NotAvailable(err.to_string()))?;
        let config_dir = match &config.config_dir {
            Some(dir) => dir.clone(),
            None => utils::svn::default_config_dir()
                .map_err(|err| SvnError::Config(err.to_string()))?,
        };
        let config_dir = utils::svn::setup_config_dir(&config_dir)
            .map_err(|err| SvnError::Config(err.to_string()))?;
        let config = ClientConfig {
            executable,
            config_dir: Some(config_dir),
            ..config.clone()
        };

        let mut client = CommandlineClient::new(config);
        if let Some(parser) = parser {
            client = client.with_metadata_parser(parser);
        }

        let version = client.version()?;
        if version < MIN_VERSION {
            return Err(SvnError::NotAvailable(format!(
                "svn {version} is older than the supported minimum {MIN_VERSION}"
            )));
        }
        tracing::debug!(%version, "svn client ready");
        Ok(client)
    }

    /// Detect which client type manages `path`
    pub fn detect(path: &Path) -> Result<ClientType, SvnError> {
        if utils::svn::has_metadata(path) {
            Ok(ClientType::Commandline)
        } else {
            Err(SvnError::invalid_path(path, "not a working copy"))
        }
    }
}
