/// Errors surfaced by durable store implementations.
///
/// Backends translate their native errors into this type so that the engine
/// never depends on a particular database driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique key was already taken (e.g. a second profile row for the
    /// same nickname).
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Any other backend failure (connection loss, timeout, bad SQL).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}
