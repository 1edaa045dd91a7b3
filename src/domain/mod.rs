//! Strongly-typed domain structures for directory browsing.
use std::cmp::Ordering;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use thiserror::Error;

/// Collapse `.` and `..` segments using only the path string.
///
/// `..` at the filesystem root stays at the root, mirroring how the kernel
/// treats `/..`. Symlinks are not consulted.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(segment) => normalized.push(segment),
        }
    }
    normalized
}

/// Absolute, lexically normalized directory beyond which requests never escape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RootDirectory(PathBuf);

impl RootDirectory {
    pub fn try_new(path: PathBuf) -> Result<Self, TypeConstraintError> {
        if !path.is_absolute() {
            return Err(TypeConstraintError::RelativeRoot(path));
        }
        Ok(Self(normalize_lexically(&path)))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// URL path (always with a trailing slash) addressing `dir` below the root.
    pub fn url_path_of(&self, dir: &Path) -> Option<String> {
        let relative = dir.strip_prefix(&self.0).ok()?;
        let mut url = String::from("/");
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                url.push_str(&segment.to_string_lossy());
                url.push('/');
            }
        }
        Some(url)
    }
}

impl fmt::Display for RootDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.display(), f)
    }
}

/// Per-request view of the incoming HTTP request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestContext {
    /// Percent-decoded request path.
    pub path: String,
    pub query: Option<String>,
    pub client_address: String,
}

/// Outcome of mapping a request path onto the filesystem.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedTarget {
    Directory(PathBuf),
    File(PathBuf),
    NotFound,
    /// The path escaped its confinement root.
    Forbidden,
}

/// Column a listing is ordered by.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SortField {
    #[default]
    Name,
    Size,
    Date,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Name, SortField::Size, SortField::Date];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Size => "size",
            SortField::Date => "date",
        }
    }
}

impl FromStr for SortField {
    type Err = TypeConstraintError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "name" => Ok(SortField::Name),
            "size" => Ok(SortField::Size),
            "date" => Ok(SortField::Date),
            other => Err(TypeConstraintError::InvalidSortField(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}

impl FromStr for SortOrder {
    type Err = TypeConstraintError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(TypeConstraintError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// Requested listing order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Lenient parse: unknown or missing values fall back to `name`/`asc`.
    pub fn from_params(sort: Option<&str>, order: Option<&str>) -> Self {
        let field = sort.and_then(|s| s.parse().ok()).unwrap_or_default();
        let order = order.and_then(|o| o.parse().ok()).unwrap_or_default();
        Self { field, order }
    }

    /// Order a column header link switches to: the active column flips its
    /// order, any other column starts ascending.
    pub fn toggle(&self, field: SortField) -> Self {
        if self.field == field {
            Self::new(field, self.order.flipped())
        } else {
            Self::new(field, SortOrder::Asc)
        }
    }

    pub fn to_query(&self) -> String {
        format!("?sort={}&order={}", self.field.as_str(), self.order.as_str())
    }
}

/// Immediate child of a listed directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
    /// Always 0 for directories.
    pub size_bytes: u64,
    pub last_modified: SystemTime,
}

impl DirectoryEntry {
    /// Case-insensitive name order, made total by falling back to the exact name.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }

    pub fn cmp_by(&self, other: &Self, field: SortField) -> Ordering {
        match field {
            SortField::Name => self.cmp_by_name(other),
            SortField::Size => self
                .size_bytes
                .cmp(&other.size_bytes)
                .then_with(|| self.cmp_by_name(other)),
            SortField::Date => self
                .last_modified
                .cmp(&other.last_modified)
                .then_with(|| self.cmp_by_name(other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("unknown sort field `{0}`")]
    InvalidSortField(String),
    #[error("unknown sort order `{0}`")]
    InvalidSortOrder(String),
    #[error("root directory must be absolute: {0}")]
    RelativeRoot(PathBuf),
}
