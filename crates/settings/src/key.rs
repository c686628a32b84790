//! Known setting keys and their environment-variable fallbacks

use std::fmt;

/// A named setting the dashboard reads at runtime.
///
/// The table stores keys by their snake_case name (`as_str`). Each key maps
/// to exactly one environment variable used when the table has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    GoogleClientId,
    GoogleClientSecret,
    GoogleRedirectUri,
    NotionApiKey,
    NotionClientsDatabaseId,
    GeminiApiKey,
    PerplexityApiKey,
    QontoLogin,
    QontoSecretKey,
    ApifyApiToken,
    MatonApiKey,
}

impl SettingKey {
    pub const ALL: [SettingKey; 11] = [
        SettingKey::GoogleClientId,
        SettingKey::GoogleClientSecret,
        SettingKey::GoogleRedirectUri,
        SettingKey::NotionApiKey,
        SettingKey::NotionClientsDatabaseId,
        SettingKey::GeminiApiKey,
        SettingKey::PerplexityApiKey,
        SettingKey::QontoLogin,
        SettingKey::QontoSecretKey,
        SettingKey::ApifyApiToken,
        SettingKey::MatonApiKey,
    ];

    /// Row key in the settings table.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::GoogleClientId => "google_client_id",
            SettingKey::GoogleClientSecret => "google_client_secret",
            SettingKey::GoogleRedirectUri => "google_redirect_uri",
            SettingKey::NotionApiKey => "notion_api_key",
            SettingKey::NotionClientsDatabaseId => "notion_clients_database_id",
            SettingKey::GeminiApiKey => "gemini_api_key",
            SettingKey::PerplexityApiKey => "perplexity_api_key",
            SettingKey::QontoLogin => "qonto_login",
            SettingKey::QontoSecretKey => "qonto_secret_key",
            SettingKey::ApifyApiToken => "apify_api_token",
            SettingKey::MatonApiKey => "maton_api_key",
        }
    }

    /// Environment variable consulted when the table has no value.
    pub fn env_var(&self) -> &'static str {
        match self {
            SettingKey::GoogleClientId => "GOOGLE_CLIENT_ID",
            SettingKey::GoogleClientSecret => "GOOGLE_CLIENT_SECRET",
            SettingKey::GoogleRedirectUri => "GOOGLE_REDIRECT_URI",
            SettingKey::NotionApiKey => "NOTION_API_KEY",
            SettingKey::NotionClientsDatabaseId => "NOTION_CLIENTS_DATABASE_ID",
            SettingKey::GeminiApiKey => "GEMINI_API_KEY",
            SettingKey::PerplexityApiKey => "PERPLEXITY_API_KEY",
            SettingKey::QontoLogin => "QONTO_LOGIN",
            SettingKey::QontoSecretKey => "QONTO_SECRET_KEY",
            SettingKey::ApifyApiToken => "APIFY_API_TOKEN",
            SettingKey::MatonApiKey => "MATON_API_KEY",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_and_env_vars_are_unique() {
        let names: HashSet<_> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
        let vars: HashSet<_> = SettingKey::ALL.iter().map(|k| k.env_var()).collect();
        assert_eq!(names.len(), SettingKey::ALL.len());
        assert_eq!(vars.len(), SettingKey::ALL.len());
    }

    #[test]
    fn google_keys_map_to_expected_env() {
        assert_eq!(SettingKey::GoogleClientId.env_var(), "GOOGLE_CLIENT_ID");
        assert_eq!(
            SettingKey::GoogleClientSecret.env_var(),
            "GOOGLE_CLIENT_SECRET"
        );
    }
}
