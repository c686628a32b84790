//! Google Workspace adapters (Calendar, Gmail, Drive)
//!
//! All calls authenticate with a bearer access token obtained from the
//! token accessor; this module never refreshes anything itself.

pub mod calendar;
pub mod drive;
pub mod gmail;

pub use calendar::CalendarEvent;
pub use drive::DriveFile;
pub use gmail::MessageSummary;

/// Base URLs of the Google APIs. Overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleApiUrls {
    pub calendar: String,
    pub gmail: String,
    pub drive: String,
}

impl Default for GoogleApiUrls {
    fn default() -> Self {
        Self {
            calendar: "https://www.googleapis.com/calendar/v3".to_string(),
            gmail: "https://gmail.googleapis.com/gmail/v1".to_string(),
            drive: "https://www.googleapis.com/drive/v3".to_string(),
        }
    }
}

/// Google API client shared by all routes.
#[derive(Debug, Clone)]
pub struct GoogleApi {
    pub(crate) http: reqwest::Client,
    pub(crate) urls: GoogleApiUrls,
}

impl GoogleApi {
    pub fn new(http: reqwest::Client, urls: GoogleApiUrls) -> Self {
        Self { http, urls }
    }
}
