//! Gmail API (`gmail/v1/users/me`).

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use bon::Builder;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::http::GoogleApi;
use crate::error::Result;

pub const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
}

/// Decoded view of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageDetail {
    pub id: String,
    pub thread_id: String,
    pub label_ids: Vec<String>,
    pub snippet: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub label_type: Option<String>,
}

/// Message to send.
#[derive(Debug, Clone, Builder)]
pub struct OutgoingMessage {
    #[builder(into)]
    pub to: String,
    #[builder(into)]
    pub subject: String,
    #[builder(into)]
    pub body: String,
    #[builder(into)]
    pub cc: Option<String>,
}

impl OutgoingMessage {
    /// RFC 2822 text of the message.
    pub fn to_rfc2822(&self) -> String {
        let mut headers = vec![format!("To: {}", self.to)];
        if let Some(cc) = self.cc.as_deref().filter(|c| !c.is_empty()) {
            headers.push(format!("Cc: {cc}"));
        }
        headers.push(format!("Subject: {}", self.subject));
        headers.push("MIME-Version: 1.0".to_string());
        headers.push("Content-Type: text/plain; charset=\"UTF-8\"".to_string());
        format!("{}\r\n\r\n{}", headers.join("\r\n"), self.body)
    }

    /// Base64url `raw` payload for `messages.send`.
    pub fn encode_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_rfc2822())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Default, Deserialize)]
struct ListLabelsResponse {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    label_ids: Vec<String>,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    payload: Option<MessagePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

impl MessagePart {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    }

    fn data(&self) -> Option<&str> {
        self.body.as_ref()?.data.as_deref().filter(|d| !d.is_empty())
    }

    /// First `text/plain` body found depth-first.
    fn plain_text(&self) -> Option<String> {
        if self.mime_type == "text/plain" {
            if let Some(text) = self.data().and_then(decode_base64url) {
                return Some(text);
            }
        }
        self.parts.iter().find_map(MessagePart::plain_text)
    }
}

/// Decode Gmail's base64url (padding optional).
pub fn decode_base64url(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .or_else(|_| URL_SAFE.decode(data))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

pub struct GmailClient {
    api: GoogleApi,
}

impl GmailClient {
    pub fn new(api: GoogleApi) -> Self {
        Self { api }
    }

    pub async fn list_messages(&self, query: Option<&str>, max: u32) -> Result<Vec<MessageRef>> {
        let mut params = vec![("maxResults", max.to_string())];
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        let resp: ListMessagesResponse = self.api.get_json(&["messages"], &params).await?;
        Ok(resp.messages)
    }

    pub async fn get_message(&self, id: &str) -> Result<MessageDetail> {
        let raw: RawMessage = self
            .api
            .get_json(&["messages", id], &[("format", "full".to_string())])
            .await?;
        let payload = raw.payload.unwrap_or_default();
        let body = payload
            .plain_text()
            .or_else(|| payload.data().and_then(decode_base64url))
            .unwrap_or_default();
        Ok(MessageDetail {
            from: payload.header("From"),
            to: payload.header("To"),
            subject: payload.header("Subject"),
            date: payload.header("Date"),
            id: raw.id,
            thread_id: raw.thread_id,
            label_ids: raw.label_ids,
            snippet: raw.snippet,
            body,
        })
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageRef> {
        self.api
            .send_json(
                Method::POST,
                &["messages", "send"],
                &[],
                &json!({ "raw": message.encode_raw() }),
            )
            .await
    }

    pub async fn modify_labels(
        &self,
        id: &str,
        add: &[String],
        remove: &[String],
    ) -> Result<MessageRef> {
        self.api
            .send_json(
                Method::POST,
                &["messages", id, "modify"],
                &[],
                &json!({ "addLabelIds": add, "removeLabelIds": remove }),
            )
            .await
    }

    pub async fn trash_message(&self, id: &str) -> Result<MessageRef> {
        self.api
            .send_json(Method::POST, &["messages", id, "trash"], &[], &json!({}))
            .await
    }

    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        let resp: ListLabelsResponse = self.api.get_json(&["labels"], &[]).await?;
        Ok(resp.labels)
    }
}
