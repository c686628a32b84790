//! Typed adapters for the third-party APIs behind the dashboard
//!
//! Each adapter deserializes upstream JSON into explicit structs and enums
//! and reshapes it into the compact form the dashboard routes return. A
//! response that does not match the expected shape is an `Error::Shape`,
//! not a silently empty field.

pub mod error;
pub mod google;
pub mod notion;

mod http;

pub use error::{Error, Result};
pub use google::{GoogleApi, GoogleApiUrls};
pub use notion::{ClientRecord, NotionClient, PropertyValue};
