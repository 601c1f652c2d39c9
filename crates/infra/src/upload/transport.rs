//! HTTP implementation of the upload protocol
//!
//! Every call is a multipart `POST` through [`ApiClient`], so part uploads
//! get the same bearer token, refresh-once and login-redirect handling as
//! any other backend call.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mgsdb_core::{PartUpload, SentBytes, UploadTransport};
use mgsdb_domain::{
    FileReferenceResponse, InitMultipartResponse, PartUploadResponse, UploadEndpoints,
    UploadError,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiRequest, FormField};

pub struct HttpUploadTransport {
    client: Arc<ApiClient>,
    endpoints: UploadEndpoints,
}

impl HttpUploadTransport {
    pub fn new(client: Arc<ApiClient>, endpoints: UploadEndpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &UploadEndpoints {
        &self.endpoints
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<FormField>,
    ) -> Result<T, UploadError> {
        let request = ApiRequest::post(path).multipart(fields);
        Ok(self.client.send_json(request).await?)
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    #[instrument(skip(self, content, sent), fields(len = content.len()))]
    async fn upload_direct(
        &self,
        file_name: &str,
        content: Bytes,
        sent: SentBytes,
    ) -> Result<FileReferenceResponse, UploadError> {
        let fields = vec![FormField::file("file", file_name, content).counted(sent)];
        self.post_form(&self.endpoints.direct, fields).await
    }

    #[instrument(skip(self))]
    async fn init_session(
        &self,
        file_name: &str,
        total_parts: u32,
    ) -> Result<InitMultipartResponse, UploadError> {
        let fields = vec![
            FormField::text("filename", file_name),
            FormField::text("total_parts", total_parts),
        ];
        self.post_form(&self.endpoints.init, fields).await
    }

    #[instrument(skip(self, part), fields(part = part.part_number, of = part.total_parts))]
    async fn upload_part(&self, part: PartUpload) -> Result<PartUploadResponse, UploadError> {
        debug!(len = part.content.len(), "Sending part");
        let fields = vec![
            FormField::text("part_number", part.part_number),
            FormField::text("total_parts", part.total_parts),
            FormField::file("file", part.file_name, part.content),
            FormField::text("upload_session", part.session_id),
        ];
        self.post_form(&self.endpoints.part, fields).await
    }

    #[instrument(skip(self))]
    async fn complete_session(
        &self,
        session_id: &str,
    ) -> Result<FileReferenceResponse, UploadError> {
        let fields = vec![FormField::text("upload_session", session_id)];
        self.post_form(&self.endpoints.complete, fields).await
    }
}

#[cfg(test)]
mod tests {
    use mgsdb_common::auth::CredentialStore;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{ApiClientConfig, AuthService};
    use crate::http::HttpClient;

    fn transport(server: &MockServer) -> HttpUploadTransport {
        let credentials = Arc::new(CredentialStore::in_memory());
        credentials.set_access("upload-token");
        let auth = AuthService::new(HttpClient::new().unwrap(), server.uri(), credentials);
        let client = ApiClient::builder()
            .config(ApiClientConfig { base_url: server.uri(), ..Default::default() })
            .auth(Arc::new(auth))
            .build()
            .unwrap();
        HttpUploadTransport::new(Arc::new(client), UploadEndpoints::default())
    }

    #[tokio::test]
    async fn test_init_session_sends_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/development_data/init_multipart"))
            .and(header("Authorization", "Bearer upload-token"))
            .and(body_string_contains("name=\"filename\""))
            .and(body_string_contains("scan.tif"))
            .and(body_string_contains("name=\"total_parts\""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "upload_session": "s-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server).init_session("scan.tif", 3).await.unwrap();
        assert_eq!(response.upload_session.as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn test_upload_part_carries_session_and_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/development_data/upload_part_direct"))
            .and(body_string_contains("name=\"upload_session\""))
            .and(body_string_contains("s-1"))
            .and(body_string_contains("part-bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 0 })))
            .expect(1)
            .mount(&server)
            .await;

        let part = PartUpload {
            session_id: "s-1".into(),
            part_number: 2,
            total_parts: 3,
            file_name: "scan.tif".into(),
            content: Bytes::from_static(b"part-bytes"),
        };
        let response = transport(&server).upload_part(part).await.unwrap();
        assert_eq!(response.upload_session, None);
    }

    #[tokio::test]
    async fn test_server_errors_are_retryable_part_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/development_data/complete_multipart"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "detail": "unknown" })),
            )
            .with_priority(1)
            .mount(&server)
            .await;

        let transport = transport(&server);
        let part = PartUpload {
            session_id: "s".into(),
            part_number: 1,
            total_parts: 1,
            file_name: "a".into(),
            content: Bytes::from_static(b"x"),
        };

        assert!(transport.upload_part(part).await.unwrap_err().is_retryable());
        assert!(!transport.complete_session("s").await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_direct_upload_returns_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(body_string_contains("name=\"file\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "file_url": "https://files/a", "key": "a" })),
            )
            .mount(&server)
            .await;

        let (sent, seen) = tokio::sync::watch::channel(0);
        let content = Bytes::from_static(b"hello world");
        let response = transport(&server).upload_direct("a.txt", content, sent).await.unwrap();
        assert_eq!(response.file_url.as_deref(), Some("https://files/a"));
        assert_eq!(response.key.as_deref(), Some("a"));
        assert_eq!(*seen.borrow(), 11);
    }
}
