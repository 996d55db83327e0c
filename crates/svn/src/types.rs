use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A revision specifier understood by the executable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Revision {
    Number(u64),
    Head,
    Base,
    Working,
    Committed,
    Previous,
    Date(DateTime<Utc>),
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Head => f.write_str("HEAD"),
            Self::Base => f.write_str("BASE"),
            Self::Working => f.write_str("WORKING"),
            Self::Committed => f.write_str("COMMITTED"),
            Self::Previous => f.write_str("PREV"),
            Self::Date(date) => write!(
                f,
                "{{{}}}",
                date.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }
}

impl From<u64> for Revision {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

/// A `START:END` revision range; a missing endpoint means `HEAD`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRange {
    pub start: Option<Revision>,
    pub end: Option<Revision>,
}

impl RevisionRange {
    pub fn new(start: impl Into<Revision>, end: impl Into<Revision>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Render as the value of `-r`
    pub fn to_arg(&self) -> String {
        let render = |rev: &Option<Revision>| {
            rev.as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| Revision::Head.to_string())
        };
        format!("{}:{}", render(&self.start), render(&self.end))
    }
}

/// Something a command can operate on: a local path or a repository URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Path(PathBuf),
    Url { url: String, peg: Option<Revision> },
}

impl Target {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::Url {
            url: url.into(),
            peg: None,
        }
    }

    /// A URL pinned to a peg revision
    pub fn url_at(url: impl Into<String>, peg: impl Into<Revision>) -> Self {
        Self::Url {
            url: url.into(),
            peg: Some(peg.into()),
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url { .. })
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Url { .. } => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url { url, peg: None } => f.write_str(url),
            Self::Url {
                url,
                peg: Some(peg),
            } => write!(f, "{url}@{peg}"),
        }
    }
}

impl From<&Path> for Target {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Target {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Operation depth (`--depth`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Depth {
    Empty,
    Files,
    Immediates,
    Infinity,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Files => "files",
            Self::Immediates => "immediates",
            Self::Infinity => "infinity",
        }
    }

    pub fn recursive(recursive: bool) -> Self {
        if recursive {
            Self::Infinity
        } else {
            Self::Empty
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "empty" => Some(Self::Empty),
            "files" => Some(Self::Files),
            "immediates" => Some(Self::Immediates),
            "infinity" => Some(Self::Infinity),
            _ => None,
        }
    }
}

impl std::str::FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown depth '{s}'"))
    }
}

/// Username and password passed to every command
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"******")
            .finish()
    }
}

/// Kind of a versioned node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
    #[default]
    Unknown,
}

impl NodeKind {
    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "file" => Self::File,
            "directory" | "dir" => Self::Directory,
            _ => Self::Unknown,
        }
    }
}

/// Working-copy state of text or properties, one per status column letter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    /// Not reported at all (e.g. no properties, or no remote information)
    #[default]
    None,
    Normal,
    Added,
    Conflicted,
    Deleted,
    Ignored,
    Modified,
    Replaced,
    External,
    Unversioned,
    Missing,
    Obstructed,
    Incomplete,
}

impl StatusKind {
    /// Map the first status column
    pub(crate) fn from_text_column(c: char) -> Self {
        match c {
            ' ' => Self::Normal,
            'A' => Self::Added,
            'C' => Self::Conflicted,
            'D' => Self::Deleted,
            'I' => Self::Ignored,
            'M' => Self::Modified,
            'R' => Self::Replaced,
            'X' => Self::External,
            '?' => Self::Unversioned,
            '!' => Self::Missing,
            '~' => Self::Obstructed,
            _ => Self::None,
        }
    }

    /// Map the second (property) status column
    pub(crate) fn from_prop_column(c: char) -> Self {
        match c {
            'C' => Self::Conflicted,
            'M' => Self::Modified,
            _ => Self::None,
        }
    }

    /// Whether the node is under version control
    pub fn is_managed(&self) -> bool {
        !matches!(
            self,
            Self::None | Self::Unversioned | Self::Ignored | Self::External
        )
    }
}

/// Lock-token state (sixth status column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    #[default]
    None,
    /// Locked in this working copy (`K`)
    Owned,
    /// Locked in another working copy (`O`)
    Other,
    /// Lock was stolen (`T`)
    Stolen,
    /// Lock was broken (`B`)
    Broken,
}

impl LockState {
    pub(crate) fn from_column(c: char) -> Self {
        match c {
            'K' => Self::Owned,
            'O' => Self::Other,
            'T' => Self::Stolen,
            'B' => Self::Broken,
            _ => Self::None,
        }
    }
}

/// Scheduled operation reported by `info`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Schedule {
    #[default]
    Normal,
    Add,
    Delete,
    Replace,
}

impl Schedule {
    pub(crate) fn parse(value: &str) -> Self {
        match value {
            "add" => Self::Add,
            "delete" => Self::Delete,
            "replace" => Self::Replace,
            _ => Self::Normal,
        }
    }
}

/// Repository lock held on a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// Files left behind by a text conflict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFiles {
    pub base: Option<PathBuf>,
    pub working: Option<PathBuf>,
    pub incoming: Option<PathBuf>,
}

impl ConflictFiles {
    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.working.is_none() && self.incoming.is_none()
    }
}

/// Metadata reported by `svn info` for one target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub path: Option<PathBuf>,
    pub name: Option<String>,
    pub working_copy_root: Option<PathBuf>,
    pub url: Option<String>,
    pub relative_url: Option<String>,
    pub repository_root: Option<String>,
    pub repository_uuid: Option<String>,
    pub revision: Option<u64>,
    pub node_kind: NodeKind,
    pub schedule: Schedule,
    pub depth: Option<Depth>,
    pub last_changed_author: Option<String>,
    pub last_changed_revision: Option<u64>,
    pub last_changed_date: Option<DateTime<Utc>>,
    pub text_last_updated: Option<DateTime<Utc>>,
    pub checksum: Option<String>,
    pub copied_from_url: Option<String>,
    pub copied_from_revision: Option<u64>,
    pub lock: Option<LockInfo>,
    pub conflict: ConflictFiles,
    pub tree_conflict: Option<String>,
    pub changelist: Option<String>,
}

/// Merged per-path view of working-copy status and `info` metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub path: PathBuf,
    pub text_status: StatusKind,
    pub prop_status: StatusKind,
    pub repository_text_status: StatusKind,
    pub out_of_date: bool,
    pub wc_locked: bool,
    pub copied: bool,
    pub switched: bool,
    pub tree_conflicted: bool,
    pub lock_state: LockState,
    pub node_kind: NodeKind,
    pub revision: Option<u64>,
    pub last_changed_revision: Option<u64>,
    pub last_changed_author: Option<String>,
    pub last_changed_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub repository_root: Option<String>,
    pub repository_uuid: Option<String>,
    pub copied_from_url: Option<String>,
    pub copied_from_revision: Option<u64>,
    pub lock: Option<LockInfo>,
    pub conflict: ConflictFiles,
    pub changelist: Option<String>,
}

impl Status {
    /// A record for a path with no version-control metadata
    pub fn unversioned(path: impl Into<PathBuf>) -> Self {
        Self::with_text_status(path, StatusKind::Unversioned)
    }

    pub(crate) fn with_text_status(path: impl Into<PathBuf>, text_status: StatusKind) -> Self {
        Self {
            path: path.into(),
            text_status,
            prop_status: StatusKind::None,
            repository_text_status: StatusKind::None,
            out_of_date: false,
            wc_locked: false,
            copied: false,
            switched: false,
            tree_conflicted: false,
            lock_state: LockState::None,
            node_kind: NodeKind::Unknown,
            revision: None,
            last_changed_revision: None,
            last_changed_author: None,
            last_changed_date: None,
            url: None,
            repository_root: None,
            repository_uuid: None,
            copied_from_url: None,
            copied_from_revision: None,
            lock: None,
            conflict: ConflictFiles::default(),
            changelist: None,
        }
    }

    /// Whether the node is under version control
    pub fn is_managed(&self) -> bool {
        self.text_status.is_managed()
    }

    /// Fill in the fields `info` knows better than `status`
    pub(crate) fn merge_info(mut self, info: Info) -> Self {
        if self.node_kind == NodeKind::Unknown {
            self.node_kind = info.node_kind;
        }
        self.revision = self.revision.or(info.revision);
        self.last_changed_revision = self.last_changed_revision.or(info.last_changed_revision);
        self.last_changed_author = self.last_changed_author.or(info.last_changed_author);
        self.last_changed_date = info.last_changed_date.or(self.last_changed_date);
        self.url = info.url;
        self.repository_root = info.repository_root;
        self.repository_uuid = info.repository_uuid;
        self.copied_from_url = info.copied_from_url;
        self.copied_from_revision = info.copied_from_revision;
        self.lock = info.lock;
        if !info.conflict.is_empty() {
            self.conflict = info.conflict;
        }
        self.changelist = self.changelist.or(info.changelist);
        self
    }

    /// Build a record from `info` alone, for paths status did not report
    #[cfg(test)]
    pub(crate) fn from_info(path: impl Into<PathBuf>, info: Info) -> Self {
        let text_status = match info.schedule {
            Schedule::Normal => StatusKind::Normal,
            Schedule::Add => StatusKind::Added,
            Schedule::Delete => StatusKind::Deleted,
            Schedule::Replace => StatusKind::Replaced,
        };
        Self::with_text_status(path, text_status).merge_info(info)
    }
}

/// A path touched by a logged revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedPath {
    /// `A`, `D`, `M` or `R`
    pub action: char,
    pub path: String,
    pub copied_from_path: Option<String>,
    pub copied_from_revision: Option<u64>,
}

/// One revision from `svn log`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub revision: u64,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub message: String,
    pub changed_paths: Vec<ChangedPath>,
}

/// One line of annotated content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateLine {
    pub line_number: usize,
    /// None for lines modified locally and not yet committed
    pub revision: Option<u64>,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub content: String,
}

/// A versioned property and its raw value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: Vec<u8>,
}

impl Property {
    pub fn value_lossy(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }
}

/// An entry of a repository directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub path: String,
    pub node_kind: NodeKind,
}

/// One changed node between two trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub path: String,
    pub kind: StatusKind,
    pub props_changed: bool,
    pub node_kind: NodeKind,
}

/// Resolution to apply to a conflicted path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictChoice {
    Base,
    Working,
    MineConflict,
    TheirsConflict,
    MineFull,
    TheirsFull,
}

impl ConflictChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Working => "working",
            Self::MineConflict => "mine-conflict",
            Self::TheirsConflict => "theirs-conflict",
            Self::MineFull => "mine-full",
            Self::TheirsFull => "theirs-full",
        }
    }
}

/// Options for status queries
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Contact the repository and report out-of-date nodes (`-u`)
    pub contact_server: bool,
    /// Report ignored nodes as ignored instead of unversioned
    pub no_ignore: bool,
}

/// Options for scheduling additions
#[derive(Debug, Clone)]
pub struct AddOptions {
    pub depth: Depth,
    /// Skip paths that are already versioned instead of failing
    pub force: bool,
    pub no_ignore: bool,
    /// Add intermediate unversioned parents
    pub parents: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            depth: Depth::Infinity,
            force: false,
            no_ignore: false,
            parents: false,
        }
    }
}

/// Options for removal
#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub force: bool,
    /// Unschedule but leave the files on disk
    pub keep_local: bool,
}

/// Options for merges
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub dry_run: bool,
    pub ignore_ancestry: bool,
    pub force: bool,
    pub record_only: bool,
}

/// `major.minor.patch` of the executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
