//! Request descriptions for the authenticated executor
//!
//! An [`ApiRequest`] is plain data so it can be turned into a fresh
//! `reqwest::RequestBuilder` for every attempt, including the retry after a
//! token refresh. File parts share their `Bytes` instead of copying.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, RequestBuilder};
use serde_json::Value;
use tokio::sync::watch;

/// Granularity of sent-byte reports for counted file fields
const SENT_CHUNK: usize = 64 * 1024;

/// What to do with a non-2xx response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Turn it into an [`ApiError`](super::ApiError)
    #[default]
    Throw,
    /// Hand it back for manual inspection
    Return,
}

/// One field of a multipart form
#[derive(Debug, Clone)]
pub enum FormField {
    Text { name: String, value: String },
    File {
        name: String,
        file_name: String,
        content: Bytes,
        /// Receives the running count of bytes streamed for this field
        sent: Option<Arc<watch::Sender<u64>>>,
    },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        Self::Text { name: name.into(), value: value.to_string() }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, content: Bytes) -> Self {
        Self::File { name: name.into(), file_name: file_name.into(), content, sent: None }
    }

    /// Report bytes streamed for a file field into `sent`; other fields
    /// are returned unchanged.
    #[must_use]
    pub fn counted(self, sent: watch::Sender<u64>) -> Self {
        match self {
            Self::File { name, file_name, content, .. } => {
                Self::File { name, file_name, content, sent: Some(Arc::new(sent)) }
            }
            text => text,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(Vec<FormField>),
}

/// A call to the backend, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub error_mode: ErrorMode,
    /// Overrides the client-wide timeout for this call
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            error_mode: ErrorMode::Throw,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn form<K: Into<String>, V: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.body =
            RequestBody::Form(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    #[must_use]
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a fresh request against `url`.
    pub(crate) fn to_builder(&self, client: &Client, url: &str) -> RequestBuilder {
        let builder = client.request(self.method.clone(), url).headers(self.headers.clone());
        match &self.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)),
        }
    }
}

fn build_form(fields: &[FormField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| match field {
        FormField::Text { name, value } => form.text(name.clone(), value.clone()),
        FormField::File { name, file_name, content, sent } => {
            let body = match sent {
                Some(sent) => counted_body(content.clone(), Arc::clone(sent)),
                None => Body::from(content.clone()),
            };
            let part =
                Part::stream_with_length(body, content.len() as u64).file_name(file_name.clone());
            form.part(name.clone(), part)
        }
    })
}

/// Stream `content` in chunks, publishing the running total as each chunk
/// is handed to the connection. Every rebuild starts again from zero.
fn counted_body(content: Bytes, sent: Arc<watch::Sender<u64>>) -> Body {
    Body::wrap_stream(counted_chunks(content, sent))
}

fn counted_chunks(
    content: Bytes,
    sent: Arc<watch::Sender<u64>>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    sent.send_replace(0);
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(SENT_CHUNK)
        .map(|start| content.slice(start..(start + SENT_CHUNK).min(content.len())))
        .collect();

    let mut total = 0u64;
    stream::iter(chunks).map(move |chunk| {
        total += chunk.len() as u64;
        sent.send_replace(total);
        Ok(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let request = ApiRequest::post("/api/token")
            .form([("grant_type", "password"), ("username", "ada")])
            .error_mode(ErrorMode::Return)
            .timeout(Duration::from_secs(5));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.error_mode, ErrorMode::Return);
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
        match request.body {
            RequestBody::Form(fields) => assert_eq!(fields[1], ("username".into(), "ada".into())),
            other => panic!("expected form body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_counted_file_field_reports_streamed_bytes() {
        let content = Bytes::from(vec![7u8; SENT_CHUNK * 2 + 10]);
        let (sent, mut seen) = watch::channel(0);
        let mut reports = Vec::new();
        let mut stream = Box::pin(counted_chunks(content.clone(), Arc::new(sent)));
        while let Some(chunk) = stream.next().await {
            assert!(!chunk.unwrap().is_empty());
            reports.push(*seen.borrow_and_update());
        }

        let chunk = SENT_CHUNK as u64;
        assert_eq!(reports, vec![chunk, chunk * 2, content.len() as u64]);
    }

    #[test]
    fn test_request_is_rebuilt_per_attempt() {
        let client = Client::new();
        let request = ApiRequest::post("/x").multipart(vec![
            FormField::text("part_number", 2),
            FormField::file("file", "scan.tif", Bytes::from_static(b"abc")),
        ]);

        let first = request.to_builder(&client, "http://localhost/x").build().unwrap();
        let second = request.to_builder(&client, "http://localhost/x").build().unwrap();
        assert_eq!(first.method(), second.method());
        assert!(first
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .is_some_and(|v| v.to_str().unwrap().starts_with("multipart/form-data")));
    }
}
