//! Gmail: recent inbox messages with a typed MIME walker
//!
//! Gmail returns each message as a tree of `MessagePart`s. The walker finds
//! headers on the root part and the first `text/plain` body anywhere in the
//! tree (falling back to `text/html`), decoding Gmail's base64url bodies.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::google::GoogleApi;
use crate::http::send_json;

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub payload: MessagePart,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

/// Message as returned by `/api/gmail/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub date: String,
    pub snippet: String,
    pub unread: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl MessagePart {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Depth-first search for the first part of `mime_type` carrying data.
    fn find_data(&self, mime_type: &str) -> Option<&str> {
        if self.mime_type.eq_ignore_ascii_case(mime_type) {
            if let Some(data) = self.body.as_ref().and_then(|b| b.data.as_deref()) {
                return Some(data);
            }
        }
        self.parts.iter().find_map(|p| p.find_data(mime_type))
    }

    /// Decoded text body, preferring `text/plain` over `text/html`.
    pub fn text_body(&self) -> Result<Option<String>> {
        let Some(data) = self
            .find_data("text/plain")
            .or_else(|| self.find_data("text/html"))
        else {
            return Ok(None);
        };
        decode_body(data).map(Some)
    }
}

/// Gmail bodies are base64url, sometimes padded.
fn decode_body(data: &str) -> Result<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .map_err(|e| Error::Shape(format!("gmail body is not base64url: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl Message {
    pub fn summarize(self, include_body: bool) -> Result<MessageSummary> {
        let body = if include_body {
            self.payload.text_body()?
        } else {
            None
        };
        let header = |name: &str| self.payload.header(name).unwrap_or_default().to_string();
        Ok(MessageSummary {
            subject: header("Subject"),
            from: header("From"),
            date: header("Date"),
            unread: self.label_ids.iter().any(|l| l == "UNREAD"),
            id: self.id,
            thread_id: self.thread_id,
            snippet: self.snippet,
            body,
        })
    }
}

impl GoogleApi {
    /// Most recent messages matching `query` (Gmail search syntax).
    pub async fn recent_messages(
        &self,
        access_token: &str,
        query: &str,
        max_results: u32,
        include_body: bool,
    ) -> Result<Vec<MessageSummary>> {
        let max_results = max_results.to_string();
        let list_request = self
            .http
            .get(format!("{}/users/me/messages", self.urls.gmail))
            .bearer_auth(access_token)
            .query(&[("maxResults", max_results.as_str()), ("q", query)]);
        let list: MessageList = send_json("gmail", list_request).await?;

        let format = if include_body { "full" } else { "metadata" };
        let fetches = list.messages.iter().map(|m| {
            let request = self
                .http
                .get(format!("{}/users/me/messages/{}", self.urls.gmail, m.id))
                .bearer_auth(access_token)
                .query(&[("format", format)]);
            send_json::<Message>("gmail", request)
        });
        let messages = try_join_all(fetches).await?;

        messages
            .into_iter()
            .map(|m| m.summarize(include_body))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::test_support::serve;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use std::collections::HashMap;

    fn b64(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text)
    }

    fn multipart_message() -> serde_json::Value {
        serde_json::json!({
            "id": "m1",
            "threadId": "t1",
            "snippet": "Devis pour le tournage",
            "labelIds": ["INBOX", "UNREAD"],
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [
                    {"name": "subject", "value": "Devis tournage"},
                    {"name": "From", "value": "Lune <hello@lune.fr>"},
                    {"name": "Date", "value": "Thu, 15 Oct 2026 10:00:00 +0200"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "multipart/alternative", "parts": [
                        {"mimeType": "text/html", "body": {"data": b64("<p>html</p>")}},
                        {"mimeType": "text/plain", "body": {"data": b64("Bonjour, voici le devis ?")}}
                    ]},
                    {"mimeType": "application/pdf", "filename": "devis.pdf", "body": {"attachmentId": "a1"}}
                ]
            }
        })
    }

    #[test]
    fn walker_prefers_nested_plain_text() {
        let message: Message = serde_json::from_value(multipart_message()).unwrap();
        assert_eq!(message.payload.header("SUBJECT"), Some("Devis tournage"));
        assert_eq!(
            message.payload.text_body().unwrap().as_deref(),
            Some("Bonjour, voici le devis ?")
        );

        let summary = message.summarize(true).unwrap();
        assert!(summary.unread);
        assert_eq!(summary.from, "Lune <hello@lune.fr>");
    }

    #[test]
    fn walker_falls_back_to_html_and_handles_padding() {
        let part: MessagePart = serde_json::from_value(serde_json::json!({
            "mimeType": "text/html",
            "body": {"data": "PGI-aGk8L2I-"}
        }))
        .unwrap();
        assert_eq!(part.text_body().unwrap().as_deref(), Some("<b>hi</b>"));

        let padded: MessagePart = serde_json::from_value(serde_json::json!({
            "mimeType": "text/plain",
            "body": {"data": "aGk="}
        }))
        .unwrap();
        assert_eq!(padded.text_body().unwrap().as_deref(), Some("hi"));
    }

    #[test]
    fn corrupt_body_is_shape_error() {
        let part: MessagePart = serde_json::from_value(serde_json::json!({
            "mimeType": "text/plain",
            "body": {"data": "***"}
        }))
        .unwrap();
        assert!(matches!(part.text_body(), Err(Error::Shape(_))));
    }

    #[tokio::test]
    async fn recent_messages_fetches_each_message() {
        let api = serve(
            axum::Router::new()
                .route(
                    "/gmail/v1/users/me/messages",
                    axum::routing::get(|Query(q): Query<HashMap<String, String>>| async move {
                        assert_eq!(q["q"], "in:inbox");
                        (
                            StatusCode::OK,
                            r#"{"messages":[{"id":"m1","threadId":"t1"}],"resultSizeEstimate":1}"#,
                        )
                    }),
                )
                .route(
                    "/gmail/v1/users/me/messages/{id}",
                    axum::routing::get(
                        |Path(id): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                            assert_eq!(id, "m1");
                            assert_eq!(q["format"], "metadata");
                            let mut message = multipart_message();
                            message["payload"]["parts"] = serde_json::json!([]);
                            (StatusCode::OK, message.to_string())
                        },
                    ),
                ),
        )
        .await;

        let messages = api
            .recent_messages("ya29", "in:inbox", 5, false)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "Devis tournage");
        assert_eq!(messages[0].body, None);
    }

    #[tokio::test]
    async fn empty_mailbox_returns_empty_list() {
        let api = serve(axum::Router::new().route(
            "/gmail/v1/users/me/messages",
            axum::routing::get(|| async { (StatusCode::OK, r#"{"resultSizeEstimate":0}"#) }),
        ))
        .await;

        let messages = api.recent_messages("ya29", "", 5, true).await.unwrap();
        assert!(messages.is_empty());
    }
}
