use crate::error::SvnError;
use crate::types::*;
use std::path::{Path, PathBuf};

/// Working-copy bookkeeping operations
///
/// Calls block until the executable finishes. Callers with a UI thread should
/// run them elsewhere.
pub trait SvnWorkingCopy: Send + Sync {
    /// Get one status record per path, in the order the paths were given
    ///
    /// Paths without version-control metadata yield an unversioned record
    /// instead of being omitted.
    fn status(&self, paths: &[PathBuf]) -> Result<Vec<Status>, SvnError> {
        self.status_with_options(paths, &StatusOptions::default())
    }

    /// Status with explicit options
    fn status_with_options(
        &self,
        paths: &[PathBuf],
        options: &StatusOptions,
    ) -> Result<Vec<Status>, SvnError>;

    /// Status of a single path
    fn single_status(&self, path: &Path) -> Result<Status, SvnError> {
        let mut statuses = self.status(&[path.to_path_buf()])?;
        statuses
            .pop()
            .ok_or_else(|| SvnError::Parse(format!("no status for {}", path.display())))
    }

    /// Schedule paths for addition
    fn add(&self, paths: &[PathBuf], options: &AddOptions) -> Result<(), SvnError>;

    /// Undo local modifications
    fn revert(&self, paths: &[PathBuf], recursive: bool) -> Result<(), SvnError>;

    /// Mark a conflict as resolved using the given choice
    fn resolve(&self, path: &Path, choice: ConflictChoice) -> Result<(), SvnError>;

    /// Release stale working-copy locks and finish interrupted operations
    fn cleanup(&self, path: &Path) -> Result<(), SvnError>;

    /// Upgrade the working-copy metadata format
    fn upgrade(&self, path: &Path) -> Result<(), SvnError>;

    /// Rewrite the repository root URL recorded in a working copy
    fn relocate(&self, from: &str, to: &str, path: &Path) -> Result<(), SvnError>;
}

/// Operations moving content between repository and working copy
pub trait SvnSync: Send + Sync {
    /// Check out `url` into `path`, returning the checked-out revision
    fn checkout(
        &self,
        url: &Target,
        path: &Path,
        revision: &Revision,
        depth: Depth,
    ) -> Result<u64, SvnError>;

    /// Update paths, returning the revision they were brought to
    fn update(&self, paths: &[PathBuf], revision: &Revision, depth: Depth)
        -> Result<u64, SvnError>;

    /// Switch a working copy to another URL
    fn switch(
        &self,
        path: &Path,
        url: &Target,
        revision: &Revision,
        depth: Depth,
    ) -> Result<u64, SvnError>;

    /// Commit paths; `None` when there was nothing to commit
    ///
    /// Transient working-copy lock contention is retried with backoff.
    fn commit(
        &self,
        paths: &[PathBuf],
        message: &str,
        keep_locks: bool,
    ) -> Result<Option<u64>, SvnError>;

    /// Export a clean tree without metadata
    ///
    /// Exports from a working copy report no revision.
    fn export(
        &self,
        source: &Target,
        destination: &Path,
        revision: &Revision,
        force: bool,
    ) -> Result<Option<u64>, SvnError>;

    /// Import an unversioned tree into the repository
    fn import(&self, path: &Path, url: &str, message: &str) -> Result<Option<u64>, SvnError>;
}

/// Read-only history and content queries
pub trait SvnHistory: Send + Sync {
    /// Metadata of a path or URL
    fn info(&self, target: &Target) -> Result<Info, SvnError>;

    /// Log entries of a path or URL
    fn log(
        &self,
        target: &Target,
        range: &RevisionRange,
        limit: Option<usize>,
    ) -> Result<Vec<LogEntry>, SvnError>;

    /// Raw content of a file at a revision
    fn content(&self, target: &Target, revision: &Revision) -> Result<Vec<u8>, SvnError>;

    /// Blame information correlated with the file content line by line
    fn annotate(
        &self,
        target: &Target,
        range: &RevisionRange,
    ) -> Result<Vec<AnnotateLine>, SvnError>;

    /// List a repository directory
    fn list(
        &self,
        target: &Target,
        revision: &Revision,
        recursive: bool,
    ) -> Result<Vec<ListEntry>, SvnError>;
}

/// Versioned property operations
pub trait SvnProperties: Send + Sync {
    /// Value of one property; `None` when unset
    fn property_get(&self, target: &Target, name: &str) -> Result<Option<Vec<u8>>, SvnError>;

    /// All properties of a node
    fn property_list(&self, target: &Target) -> Result<Vec<Property>, SvnError>;

    /// Set a property on working-copy paths
    fn property_set(
        &self,
        path: &Path,
        name: &str,
        value: &[u8],
        recursive: bool,
    ) -> Result<(), SvnError>;

    /// Delete a property from working-copy paths
    fn property_delete(&self, path: &Path, name: &str, recursive: bool) -> Result<(), SvnError>;
}

/// Tree-shaping and locking operations
pub trait SvnTree: Send + Sync {
    /// Copy a node; `message` is required when the destination is a URL
    fn copy(
        &self,
        source: &Target,
        destination: &Target,
        revision: Option<&Revision>,
        message: Option<&str>,
    ) -> Result<(), SvnError>;

    /// Move a node; `message` is required when the destination is a URL
    fn move_to(
        &self,
        source: &Target,
        destination: &Target,
        message: Option<&str>,
        force: bool,
    ) -> Result<(), SvnError>;

    /// Remove nodes; `message` is required when removing URLs
    fn remove(
        &self,
        targets: &[Target],
        message: Option<&str>,
        options: &RemoveOptions,
    ) -> Result<(), SvnError>;

    /// Create directories
    fn mkdir(&self, targets: &[Target], message: Option<&str>, parents: bool)
        -> Result<(), SvnError>;

    /// Merge a revision range of `source` into a working copy
    fn merge(
        &self,
        source: &Target,
        range: &RevisionRange,
        path: &Path,
        options: &MergeOptions,
    ) -> Result<(), SvnError>;

    /// Reintegrate a branch back into a working copy
    fn merge_reintegrate(&self, source: &Target, path: &Path, dry_run: bool)
        -> Result<(), SvnError>;

    /// Summarize differences between two repository trees
    fn diff_summarize(
        &self,
        from: &Target,
        to: &Target,
        recursive: bool,
    ) -> Result<Vec<DiffSummary>, SvnError>;

    /// Take repository locks
    fn lock(&self, targets: &[Target], comment: &str, force: bool) -> Result<(), SvnError>;

    /// Release repository locks
    fn unlock(&self, targets: &[Target], force: bool) -> Result<(), SvnError>;
}

/// Combined trait representing a full client
///
/// This is the main trait that users will interact with, combining all
/// client capabilities into a single interface.
pub trait SvnClient: SvnWorkingCopy + SvnSync + SvnHistory + SvnProperties + SvnTree {
    /// Get client type
    fn client_type(&self) -> crate::factory::ClientType;

    /// Version of the underlying implementation
    fn version(&self) -> Result<Version, SvnError>;

    /// Abort the running call, if any
    ///
    /// Effects the executable already applied to the working copy are not
    /// rolled back.
    fn cancel(&self);

    /// Get a human-readable description of this client
    fn description(&self) -> String {
        format!("{:?} client", self.client_type())
    }
}
