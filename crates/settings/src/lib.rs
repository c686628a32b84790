//! Settings resolver for API keys, OAuth client configuration and database ids
//!
//! Values come from a backing key-value table (Supabase in production) cached
//! in memory for a fixed TTL, with a static environment-variable fallback per
//! key. A value present in the table wins over the environment.
//!
//! Resolution for `Settings::get(key)`:
//! 1. Reload the cache from the `SettingsStore` if it is older than the TTL
//! 2. Return the cached value if non-empty
//! 3. Return the mapped environment variable if non-empty
//! 4. Otherwise `None`

pub mod cache;
pub mod error;
pub mod key;
pub mod store;

pub use cache::{DEFAULT_TTL, EnvSource, Settings};
pub use error::{Error, Result};
pub use key::SettingKey;
pub use store::{MemoryStore, SettingRow, SettingsStore, SupabaseStore};
