//! Session-linking API surface

use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use crate::models::{Session, SessionFile};
use crate::utils::errors::Result;

use super::ApiClient;

/// Response of the QR / pairing session-creation endpoints. The first QR
/// image or pairing code may arrive here or later over the push channel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default)]
    pub pairing_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<SessionFile>,
}

/// Client for the session endpoint family
#[derive(Debug, Clone)]
pub struct SessionApi {
    client: ApiClient,
}

impl SessionApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Start a QR linking session
    pub async fn create_qr_session(&self) -> Result<LinkSessionResponse> {
        let response: LinkSessionResponse = self
            .client
            .request_json(Method::POST, "/api/session/qr", None, None)
            .await?;
        info!(session_id = %response.session_id, "QR linking session created");
        Ok(response)
    }

    /// Start a pairing-code linking session for a phone number.
    /// The number must already be validated by the caller.
    pub async fn create_pairing_session(&self, phone_number: &str) -> Result<LinkSessionResponse> {
        let body = serde_json::json!({ "phoneNumber": phone_number });
        let response: LinkSessionResponse = self
            .client
            .request_json(Method::POST, "/api/session/pairing", Some(&body), None)
            .await?;
        info!(session_id = %response.session_id, "Pairing linking session created");
        Ok(response)
    }

    /// Fetch a session by id
    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        let path = format!("/api/session/{}", urlencoding::encode(session_id));
        self.client.request_json(Method::GET, &path, None, None).await
    }

    /// Delete a session by id
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = format!("/api/session/{}", urlencoding::encode(session_id));
        let _: serde_json::Value = self
            .client
            .request_json(Method::DELETE, &path, None, None)
            .await?;
        Ok(())
    }

    /// List the files stored under a session
    pub async fn file_list(&self, session_id: &str) -> Result<Vec<SessionFile>> {
        let path = format!("/api/session/{}/filelist", urlencoding::encode(session_id));
        let response: FileListResponse =
            self.client.request_json(Method::GET, &path, None, None).await?;
        Ok(response.files)
    }

    /// Download a single session file
    pub async fn download_file(&self, session_id: &str, file_name: &str) -> Result<Vec<u8>> {
        let path = format!(
            "/api/session/{}/file/{}",
            urlencoding::encode(session_id),
            urlencoding::encode(file_name)
        );
        self.client.request_bytes(Method::GET, &path, None).await
    }
}
