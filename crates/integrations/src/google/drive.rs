//! Drive: recently modified files

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::google::GoogleApi;
use crate::http::send_json;

const FILE_FIELDS: &str = "files(id,name,mimeType,modifiedTime,webViewLink,iconLink)";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// File as returned by both Drive and `/api/drive/files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == "application/vnd.google-apps.folder"
    }
}

impl GoogleApi {
    /// Most recently modified files, excluding trashed ones.
    pub async fn recent_files(&self, access_token: &str, page_size: u32) -> Result<Vec<DriveFile>> {
        let page_size = page_size.to_string();
        let request = self
            .http
            .get(format!("{}/files", self.urls.drive))
            .bearer_auth(access_token)
            .query(&[
                ("pageSize", page_size.as_str()),
                ("orderBy", "modifiedTime desc"),
                ("q", "trashed = false"),
                ("fields", FILE_FIELDS),
            ]);
        let list: FileList = send_json("drive", request).await?;
        Ok(list.files)
    }
}
