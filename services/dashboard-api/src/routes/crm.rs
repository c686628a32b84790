//! Clients database from Notion

use axum::Json;
use axum::extract::State;
use settings::SettingKey;
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

pub async fn clients(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let api_key = state
        .settings
        .get(SettingKey::NotionApiKey)
        .await
        .ok_or(ApiError::NotConfigured("Notion"))?;
    let database_id = state
        .settings
        .get(SettingKey::NotionClientsDatabaseId)
        .await
        .ok_or(ApiError::NotConfigured("Notion clients database"))?;

    let clients = state.notion.clients(&api_key, &database_id).await?;
    debug!(count = clients.len(), "loaded clients from notion");
    Ok(Json(serde_json::json!({ "clients": clients })))
}
