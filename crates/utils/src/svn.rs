//! Utilities for locating Subversion and preparing its environment

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::shell::resolve_executable_path_blocking;

/// Names of the per-working-copy metadata directory.
///
/// `_svn` is the variant some Windows setups use instead of `.svn`.
pub const METADATA_DIR_NAMES: [&str; 2] = [".svn", "_svn"];

#[derive(Debug, Error)]
pub enum SvnSetupError {
    #[error("svn executable not found: {0}. Install a Subversion command-line client and make sure it is on PATH")]
    NotInstalled(String),
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to prepare config directory {path}: {source}")]
    ConfigDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Check that the given svn executable can be found
pub fn check_svn_installed(executable: impl AsRef<Path>) -> Result<PathBuf, SvnSetupError> {
    let executable = executable.as_ref();
    resolve_executable_path_blocking(executable)
        .ok_or_else(|| SvnSetupError::NotInstalled(executable.display().to_string()))
}

/// Check whether a path lies inside a Subversion working copy.
///
/// This only checks the filesystem for metadata directories on the path and
/// its ancestors; the executable is never invoked.
pub fn has_metadata(path: &Path) -> bool {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    absolute.ancestors().any(|dir| {
        METADATA_DIR_NAMES
            .iter()
            .any(|name| dir.join(name).is_dir())
    })
}

/// Default `config` file written into a private configuration directory
pub fn get_default_config() -> &'static str {
    r#"### Private Subversion configuration used by the command-line client.
### Edit freely; the file is only written when missing.

[auth]
### Keyring integrations may prompt on a terminal; keep them off.
password-stores =

[helpers]
### Messages are always passed with -F, an editor is never needed.
editor-cmd = true

[miscellany]
enable-auto-props = no
use-commit-times = no
"#
}

/// Default `servers` file written into a private configuration directory
pub fn get_default_servers() -> &'static str {
    r#"### Private Subversion server configuration used by the command-line client.

[global]
http-timeout = 600
store-plaintext-passwords = no
"#
}

/// Default location of the private configuration directory
pub fn default_config_dir() -> Result<PathBuf, SvnSetupError> {
    dirs::config_dir()
        .map(|dir| dir.join("svn-cli").join("config"))
        .ok_or(SvnSetupError::NoConfigDir)
}

/// Create a private configuration directory with default files.
///
/// Existing files are left untouched.
pub fn setup_config_dir(dir: &Path) -> Result<PathBuf, SvnSetupError> {
    let wrap = |source| SvnSetupError::ConfigDir {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(wrap)?;

    for (name, contents) in [
        ("config", get_default_config()),
        ("servers", get_default_servers()),
    ] {
        let file = dir.join(name);
        if !file.exists() {
            fs::write(&file, contents).map_err(wrap)?;
            tracing::debug!(path = %file.display(), "wrote default svn {name} file");
        }
    }

    Ok(dir.to_path_buf())
}
