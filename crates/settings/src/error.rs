//! Error types for settings backends

/// Errors from reading the backing settings table.
///
/// These never reach `Settings::get` callers; the cache logs them and keeps
/// serving what it has.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("settings backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("invalid settings payload: {0}")]
    Parse(String),
}

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, Error>;
