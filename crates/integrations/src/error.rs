//! Error types for upstream API calls

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

impl Error {
    /// Whether upstream rejected the credential itself (401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Upstream { status: 401, .. })
    }
}

/// Result alias for upstream operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_names_service() {
        let err = Error::Upstream {
            service: "gmail",
            status: 403,
            body: "insufficientPermissions".into(),
        };
        assert_eq!(err.to_string(), "gmail returned 403: insufficientPermissions");
        assert!(!err.is_unauthorized());
    }
}
