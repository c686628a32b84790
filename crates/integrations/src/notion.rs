//! Notion: database queries and the typed property union
//!
//! Notion page properties are a tagged union keyed by `type`. Each known
//! variant is modelled explicitly; anything else lands in
//! `PropertyValue::Unsupported` instead of failing the whole page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::http::send_json;

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";

const PAGE_SIZE: u32 = 100;
/// Upper bound on pagination round trips per query.
const MAX_PAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichTextSpan {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateRange {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageReference {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileReference {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniqueId {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String { string: Option<String> },
    Number { number: Option<f64> },
    Boolean { boolean: Option<bool> },
    Date { date: Option<DateRange> },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RollupValue {
    Number {
        number: Option<f64>,
    },
    Date {
        date: Option<DateRange>,
    },
    Array {
        array: Vec<PropertyValue>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichTextSpan> },
    RichText { rich_text: Vec<RichTextSpan> },
    Number { number: Option<f64> },
    Select { select: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Status { status: Option<SelectOption> },
    Date { date: Option<DateRange> },
    Email { email: Option<String> },
    PhoneNumber { phone_number: Option<String> },
    Url { url: Option<String> },
    Checkbox { checkbox: bool },
    People { people: Vec<Person> },
    Relation { relation: Vec<PageReference> },
    Formula { formula: FormulaValue },
    Rollup { rollup: RollupValue },
    Files { files: Vec<FileReference> },
    CreatedTime { created_time: String },
    LastEditedTime { last_edited_time: String },
    UniqueId { unique_id: UniqueId },
    #[serde(other)]
    Unsupported,
}

fn join<'a>(parts: impl IntoIterator<Item = &'a str>, sep: &str) -> String {
    parts.into_iter().collect::<Vec<_>>().join(sep)
}

impl DateRange {
    fn text(&self) -> String {
        match &self.end {
            Some(end) => format!("{} - {end}", self.start),
            None => self.start.clone(),
        }
    }
}

impl PropertyValue {
    /// Flatten the value to display text. Empty for null or unsupported.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Title { title: spans } | Self::RichText { rich_text: spans } => {
                spans.iter().map(|s| s.plain_text.as_str()).collect()
            }
            Self::Number { number } => number.map(|n| n.to_string()).unwrap_or_default(),
            Self::Select { select: opt } | Self::Status { status: opt } => {
                opt.as_ref().map(|o| o.name.clone()).unwrap_or_default()
            }
            Self::MultiSelect { multi_select } => {
                join(multi_select.iter().map(|o| o.name.as_str()), ", ")
            }
            Self::Date { date } => date.as_ref().map(DateRange::text).unwrap_or_default(),
            Self::Email { email: v } | Self::PhoneNumber { phone_number: v } | Self::Url { url: v } => {
                v.clone().unwrap_or_default()
            }
            Self::Checkbox { checkbox } => checkbox.to_string(),
            Self::People { people } => {
                join(people.iter().filter_map(|p| p.name.as_deref()), ", ")
            }
            Self::Relation { relation } => join(relation.iter().map(|r| r.id.as_str()), ", "),
            Self::Formula { formula } => match formula {
                FormulaValue::String { string } => string.clone().unwrap_or_default(),
                FormulaValue::Number { number } => {
                    number.map(|n| n.to_string()).unwrap_or_default()
                }
                FormulaValue::Boolean { boolean } => {
                    boolean.map(|b| b.to_string()).unwrap_or_default()
                }
                FormulaValue::Date { date } => {
                    date.as_ref().map(DateRange::text).unwrap_or_default()
                }
                FormulaValue::Unsupported => String::new(),
            },
            Self::Rollup { rollup } => match rollup {
                RollupValue::Number { number } => {
                    number.map(|n| n.to_string()).unwrap_or_default()
                }
                RollupValue::Date { date } => {
                    date.as_ref().map(DateRange::text).unwrap_or_default()
                }
                RollupValue::Array { array } => array
                    .iter()
                    .map(PropertyValue::plain_text)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
                RollupValue::Unsupported => String::new(),
            },
            Self::Files { files } => join(files.iter().map(|f| f.name.as_str()), ", "),
            Self::CreatedTime { created_time: t } | Self::LastEditedTime { last_edited_time: t } => {
                t.clone()
            }
            Self::UniqueId { unique_id } => match (&unique_id.prefix, unique_id.number) {
                (Some(prefix), Some(n)) => format!("{prefix}-{n}"),
                (None, Some(n)) => n.to_string(),
                _ => String::new(),
            },
            Self::Unsupported => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Page {
    /// Display text of the first named property that is present and non-empty.
    pub fn text(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.properties.get(*name))
            .map(PropertyValue::plain_text)
            .find(|s| !s.is_empty())
    }

    /// Display text of the page's title property, whatever its column name.
    pub fn title(&self) -> Option<String> {
        self.properties
            .values()
            .find(|p| matches!(p, PropertyValue::Title { .. }))
            .map(PropertyValue::plain_text)
            .filter(|s| !s.is_empty())
    }

    fn first_of_type(&self, pred: fn(&PropertyValue) -> bool) -> Option<String> {
        self.properties
            .values()
            .filter(|p| pred(p))
            .map(PropertyValue::plain_text)
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Row of the clients database as returned by `/api/crm/clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&Page> for ClientRecord {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id.clone(),
            name: page.title().unwrap_or_default(),
            email: page
                .text(&["Email", "E-mail"])
                .or_else(|| page.first_of_type(|p| matches!(p, PropertyValue::Email { .. }))),
            phone: page
                .text(&["Phone", "Téléphone"])
                .or_else(|| page.first_of_type(|p| matches!(p, PropertyValue::PhoneNumber { .. }))),
            company: page.text(&["Company", "Entreprise", "Société"]),
            status: page.text(&["Status", "Statut"]),
            url: page.url.clone(),
        }
    }
}

/// Notion REST client. The integration token is passed per call since it is
/// resolved from settings at request time.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// All pages of a database, following `next_cursor` up to a fixed bound.
    pub async fn query_database(&self, api_key: &str, database_id: &str) -> Result<Vec<Page>> {
        let url = format!("{}/v1/databases/{database_id}/query", self.base_url);
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut body = serde_json::json!({ "page_size": PAGE_SIZE });
            if let Some(c) = &cursor {
                body["start_cursor"] = serde_json::Value::String(c.clone());
            }
            let request = self
                .http
                .post(&url)
                .bearer_auth(api_key)
                .header("Notion-Version", NOTION_VERSION)
                .json(&body);
            let response: QueryResponse = send_json("notion", request).await?;
            pages.extend(response.results);

            match (response.has_more, response.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => return Ok(pages),
            }
        }

        debug!(database_id, pages = pages.len(), "notion pagination bound reached");
        Ok(pages)
    }

    pub async fn clients(&self, api_key: &str, database_id: &str) -> Result<Vec<ClientRecord>> {
        let pages = self.query_database(api_key, database_id).await?;
        Ok(pages
            .iter()
            .filter(|p| p.title().is_some())
            .map(ClientRecord::from)
            .collect())
    }
}
