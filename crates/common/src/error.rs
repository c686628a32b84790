//! Configuration error types shared by the binary and its loaders

use thiserror::Error;

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable {name} is invalid: {reason}")]
    Env { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_context() {
        let config_err = Error::Config("public_url must be absolute".into());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: public_url must be absolute"
        );

        let env_err = Error::Env {
            name: "TOKEN_ENCRYPTION_KEY".into(),
            reason: "expected 32 bytes".into(),
        };
        assert_eq!(
            env_err.to_string(),
            "Environment variable TOKEN_ENCRYPTION_KEY is invalid: expected 32 bytes"
        );
    }

    #[test]
    fn toml_errors_convert() {
        let parse = toml::from_str::<toml::Table>("not = [valid").unwrap_err();
        let err: Error = parse.into();
        assert!(
            err.to_string().starts_with("TOML parse error:"),
            "got: {err}"
        );
    }
}
