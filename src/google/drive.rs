//! Google Drive API (`drive/v3`).

use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::http::GoogleApi;
use crate::error::Result;

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime,size,parents,webViewLink";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Export format for Google-native documents, `None` for binary files.
pub fn export_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/vnd.google-apps.spreadsheet" => Some("text/csv"),
        m if m.starts_with("application/vnd.google-apps.") && m != FOLDER_MIME => {
            Some("text/plain")
        }
        _ => None,
    }
}

pub struct DriveClient {
    api: GoogleApi,
    upload: GoogleApi,
}

impl DriveClient {
    pub fn new(api: GoogleApi) -> Self {
        let upload = api.with_base_url(DRIVE_UPLOAD_BASE_URL);
        Self { api, upload }
    }

    pub fn with_upload_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upload = self.api.with_base_url(base_url);
        self
    }

    /// Files matching a Drive search expression (e.g. `name contains 'notes'`).
    pub async fn list_files(&self, query: Option<&str>, page_size: u32) -> Result<Vec<DriveFile>> {
        let mut params = vec![
            ("pageSize", page_size.to_string()),
            ("fields", format!("files({FILE_FIELDS})")),
        ];
        match query.filter(|q| !q.is_empty()) {
            Some(q) => params.push(("q", format!("({q}) and trashed = false"))),
            None => params.push(("q", "trashed = false".to_string())),
        }
        let list: FileList = self.api.get_json(&["files"], &params).await?;
        Ok(list.files)
    }

    pub async fn get_file(&self, id: &str) -> Result<DriveFile> {
        self.api
            .get_json(&["files", id], &[("fields", FILE_FIELDS.to_string())])
            .await
    }

    /// File contents as text; Google Docs/Sheets/Slides are exported.
    pub async fn download_text(&self, id: &str) -> Result<String> {
        let file = self.get_file(id).await?;
        match export_mime(&file.mime_type) {
            Some(mime) => {
                self.api
                    .get_text(&["files", id, "export"], &[("mimeType", mime.to_string())])
                    .await
            }
            None => {
                self.api
                    .get_text(&["files", id], &[("alt", "media".to_string())])
                    .await
            }
        }
    }

    /// Media upload followed by a metadata patch (name, parent).
    pub async fn upload_text(
        &self,
        name: &str,
        content: &str,
        mime_type: &str,
        parent: Option<&str>,
    ) -> Result<DriveFile> {
        let url = self.upload.url(&["files"])?;
        let body = content.to_string();
        let resp = self
            .upload
            .send(|c| {
                c.post(url.clone())
                    .query(&[("uploadType", "media")])
                    .header(CONTENT_TYPE, mime_type)
                    .body(body.clone())
            })
            .await?;
        let created: DriveFile = resp.json().await?;

        let mut query = vec![("fields", FILE_FIELDS.to_string())];
        if let Some(parent) = parent {
            query.push(("addParents", parent.to_string()));
        }
        self.api
            .send_json(
                Method::PATCH,
                &["files", created.id.as_str()],
                &query,
                &json!({ "name": name }),
            )
            .await
    }

    pub async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<DriveFile> {
        let mut body = json!({ "name": name, "mimeType": FOLDER_MIME });
        if let Some(parent) = parent {
            body["parents"] = json!([parent]);
        }
        self.api
            .send_json(Method::POST, &["files"], &[("fields", FILE_FIELDS.to_string())], &body)
            .await
    }

    pub async fn delete_file(&self, id: &str) -> Result<()> {
        self.api.delete(&["files", id]).await
    }
}
