//! Calendar: upcoming events on the primary calendar

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::google::GoogleApi;
use crate::http::send_json;

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    html_link: Option<String>,
    start: EventTime,
    end: EventTime,
    #[serde(default)]
    attendees: Vec<RawAttendee>,
}

/// Either a timed boundary (`dateTime`) or an all-day one (`date`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAttendee {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    response_status: Option<String>,
}

/// Event as returned by `/api/calendar/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    pub response: String,
}

impl EventTime {
    fn resolve(self) -> Option<(String, bool)> {
        match (self.date_time, self.date) {
            (Some(dt), _) => Some((dt, false)),
            (None, Some(d)) => Some((d, true)),
            (None, None) => None,
        }
    }
}

impl RawEvent {
    fn into_event(self) -> Option<CalendarEvent> {
        let (start, all_day) = self.start.resolve()?;
        let (end, _) = self.end.resolve()?;
        Some(CalendarEvent {
            id: self.id,
            title: self.summary.unwrap_or_else(|| "(No title)".to_string()),
            start,
            end,
            all_day,
            location: self.location,
            link: self.html_link,
            attendees: self
                .attendees
                .into_iter()
                .filter_map(|a| {
                    Some(Attendee {
                        email: a.email?,
                        response: a.response_status.unwrap_or_else(|| "needsAction".into()),
                    })
                })
                .collect(),
        })
    }
}

impl GoogleApi {
    /// Upcoming events on the primary calendar starting at `time_min`
    /// (RFC 3339), expanded and ordered by start time.
    pub async fn upcoming_events(
        &self,
        access_token: &str,
        time_min: &str,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>> {
        let url = format!("{}/calendars/primary/events", self.urls.calendar);
        let max_results = max_results.to_string();
        let request = self.http.get(url).bearer_auth(access_token).query(&[
            ("timeMin", time_min),
            ("maxResults", max_results.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
        ]);
        let list: EventList = send_json("calendar", request).await?;
        Ok(list
            .items
            .into_iter()
            .filter_map(RawEvent::into_event)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::google::test_support::serve;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use std::collections::HashMap;

    const EVENTS: &str = r#"{
        "kind": "calendar#events",
        "items": [
            {"id": "e1", "summary": "Shoot - Maison Lune", "location": "Studio B",
             "htmlLink": "https://calendar.google.com/e1",
             "start": {"dateTime": "2026-10-20T09:00:00+02:00"},
             "end": {"dateTime": "2026-10-20T12:00:00+02:00"},
             "attendees": [{"email": "cam@splash.studio", "responseStatus": "accepted"}, {"displayName": "room"}]},
            {"id": "e2", "start": {"date": "2026-10-22"}, "end": {"date": "2026-10-23"}},
            {"id": "broken", "start": {}, "end": {}}
        ]
    }"#;

    #[tokio::test]
    async fn upcoming_events_reshapes_timed_and_all_day() {
        let api = serve(axum::Router::new().route(
            "/calendar/v3/calendars/primary/events",
            axum::routing::get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(headers["authorization"], "Bearer ya29.cal");
                    assert_eq!(q["singleEvents"], "true");
                    assert_eq!(q["orderBy"], "startTime");
                    assert_eq!(q["maxResults"], "10");
                    (StatusCode::OK, EVENTS)
                },
            ),
        ))
        .await;

        let events = api
            .upcoming_events("ya29.cal", "2026-10-16T00:00:00Z", 10)
            .await
            .unwrap();

        assert_eq!(events.len(), 2, "events without a start/end are dropped");
        assert_eq!(events[0].title, "Shoot - Maison Lune");
        assert!(!events[0].all_day);
        assert_eq!(
            events[0].attendees,
            vec![Attendee {
                email: "cam@splash.studio".into(),
                response: "accepted".into()
            }]
        );
        assert_eq!(events[1].title, "(No title)");
        assert!(events[1].all_day);
        assert_eq!(events[1].start, "2026-10-22");
    }

    #[tokio::test]
    async fn unauthorized_is_detectable() {
        let api = serve(axum::Router::new().route(
            "/calendar/v3/calendars/primary/events",
            axum::routing::get(|| async { (StatusCode::UNAUTHORIZED, "Invalid Credentials") }),
        ))
        .await;

        let err = api
            .upcoming_events("ya29.bad", "2026-10-16T00:00:00Z", 10)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized(), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_event_is_shape_error() {
        let api = serve(axum::Router::new().route(
            "/calendar/v3/calendars/primary/events",
            axum::routing::get(|| async { (StatusCode::OK, r#"{"items":[{"summary":"no id"}]}"#) }),
        ))
        .await;

        let err = api
            .upcoming_events("ya29", "2026-10-16T00:00:00Z", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Shape(_)), "got {err:?}");
    }
}
