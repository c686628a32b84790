//! Shared request execution for upstream adapters

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};

/// Send a request and decode a 2xx JSON body into `T`.
///
/// Non-2xx responses become `Error::Upstream` with the body text; a body
/// that does not deserialize into `T` becomes `Error::Shape`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Http(format!("{service} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        debug!(service, status = status.as_u16(), "upstream rejected request");
        return Err(Error::Upstream {
            service,
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("{service} body read failed: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Shape(format!("{service}: {e}")))
}
