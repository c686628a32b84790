//! Shared types for the Splash Banana services

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
