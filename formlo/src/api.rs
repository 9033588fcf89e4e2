//! HTTP client for the conversion backend.
//!
//! Wraps the backend REST API (session lookup, document upload, job
//! status, the form collection) using [`reqwest`]. Every request
//! carries the stored session cookie so the backend can associate it
//! with the signed-in account.

use serde::Deserialize;

use crate::models::{ConversionJob, FormRecord, User};

/// Backend base URL used when neither `--server` nor `FORMLO_SERVER`
/// is set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Maximum upload size accepted client-side (10 MB). The backend
/// enforces its own limit; this guard only avoids pointless transfers.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions the backend can extract text from.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

/// HTTP client for a single backend instance.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    cookie: Option<String>,
}

/// Errors from the backend API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend rejected the request with a 401.
    #[error("not signed in")]
    Unauthorized,

    /// The backend returned some other non-2xx status.
    #[error("backend error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The `detail` field of the error body, or the raw body.
        detail: String,
    },
}

/// Error body shape used by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`, attaching
    /// `cookie` to every request when present.
    pub fn new(base_url: &str, cookie: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie: cookie.map(String::from),
        }
    }

    /// Base HTTP URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser navigation target for signing in. Not an XHR endpoint:
    /// the backend redirects to the external identity provider.
    pub fn login_url(&self) -> String {
        format!("{}/api/auth/login", self.base_url)
    }

    /// Look up the account the stored session belongs to.
    pub async fn me(&self) -> Result<User, ApiError> {
        let response = self.request(reqwest::Method::GET, "/api/auth/me").send().await?;
        Self::parse_response(response).await
    }

    /// Terminate the backend session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, "/api/auth/logout")
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Upload a document for conversion.
    ///
    /// Sends a multipart `POST /api/upload` and returns the freshly
    /// created job, which starts in the processing state.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<ConversionJob, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_for(filename))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .request(reqwest::Method::POST, "/api/upload")
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Read the current status of a conversion job.
    pub async fn job(&self, job_id: &str) -> Result<ConversionJob, ApiError> {
        let path = format!("/api/jobs/{}", urlencoding::encode(job_id));
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        Self::parse_response(response).await
    }

    /// Fetch the full collection of generated forms.
    pub async fn forms(&self) -> Result<Vec<FormRecord>, ApiError> {
        let response = self.request(reqwest::Method::GET, "/api/forms").send().await?;
        Self::parse_response(response).await
    }

    /// Delete a generated form. This also removes the artifact from the
    /// external form service behind the backend.
    pub async fn delete_form(&self, form_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/forms/{}", urlencoding::encode(form_id));
        let response = self.request(reqwest::Method::DELETE, &path).send().await?;
        Self::check_status(response).await
    }

    // ---- private helpers ----

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(ref cookie) = self.cookie {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        builder
    }

    /// Ensure the response has a success status code. A 401 maps to
    /// [`ApiError::Unauthorized`]; any other failure carries the
    /// backend's detail message when the body provides one.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.detail)
                .unwrap_or(body);
            return Err(ApiError::Api {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// MIME type to declare for an upload, from the file extension.
fn mime_for(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else {
        "text/plain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = ApiClient::new("http://localhost:8000/", None);
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.login_url(), "http://localhost:8000/api/auth/login");
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for("quiz.PDF"), "application/pdf");
        assert_eq!(
            mime_for("notes.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_for("plain.txt"), "text/plain");
    }
}
