//! Filesystem services behind the request dispatcher.
pub mod assets;
pub mod files;
pub mod listing;
pub mod resolver;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Unexpected failures; each one becomes a 500 for its own request only.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to read metadata")]
    ReadMetadata(#[source] std::io::Error),
    #[error("failed to list entries")]
    ListEntries(#[source] std::io::Error),
    #[error("failed to open file")]
    OpenFile(#[source] std::io::Error),
    #[error("failed to check path containment")]
    Boundary(#[source] strict_path::StrictPathError),
    #[error("failed to render listing")]
    Render(#[source] tera::Error),
}
