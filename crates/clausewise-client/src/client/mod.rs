//! ClauseWise API client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{debug, info};

use crate::auth::{LoginRedirect, SessionToken};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStorage;
use crate::types::{
    AccessToken, AnalysisJobAck, AnalysisRequest, AnalysisStatistics, Credentials,
    DocumentAnalysis, DocumentStatusUpdate, DocumentSummary, HealthStatus, JobStatus, NewPlaybook,
    Page, Playbook, PlaybookUpdate, ResourceId, UploadAck, UserAccount, UserProfile,
};
use crate::upload::{
    progress_body, shared_reporter, FileRejection, ProgressCallback, RejectionReason,
    UploadCandidate,
};

mod http;

use http::{bearer_header, HttpBackend};

const USER_AGENT_VALUE: &str = concat!("clausewise-client/", env!("CARGO_PKG_VERSION"));

/// Client for the ClauseWise HTTP API.
///
/// Cheap to clone; clones share the HTTP connection pool and the session
/// token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpBackend,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        token: SessionToken,
        storage: Arc<dyn SessionStorage>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> ClientResult<Self> {
        let base_url = config.base_url()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url,
                token,
                storage,
                redirect,
                max_retries: config.max_retries,
            },
        })
    }

    // ==================== Auth ====================

    pub async fn register(&self, credentials: &Credentials) -> ClientResult<UserAccount> {
        debug!(email = %credentials.email, "registering account");
        let response = self
            .http
            .request(Method::POST, "/api/auth/register", |rb| rb.json(credentials))
            .await?;
        HttpBackend::parse(response, "register").await
    }

    pub async fn login(&self, credentials: &Credentials) -> ClientResult<AccessToken> {
        debug!(email = %credentials.email, "logging in");
        let response = self
            .http
            .request(Method::POST, "/api/auth/login", |rb| rb.json(credentials))
            .await?;
        HttpBackend::parse(response, "login").await
    }

    pub async fn profile(&self) -> ClientResult<UserProfile> {
        let response = self
            .http
            .request(Method::GET, "/api/user/profile", |rb| rb)
            .await?;
        HttpBackend::parse(response, "profile").await
    }

    /// Invalidate the current session on the server.
    pub async fn logout(&self) -> ClientResult<()> {
        let response = self
            .http
            .request(Method::POST, "/api/auth/logout", |rb| rb)
            .await?;
        HttpBackend::discard(response).await
    }

    /// Invalidate a specific token on the server.
    ///
    /// Used after local teardown, when the session no longer holds the
    /// token. A 401 here never touches the current session.
    pub async fn logout_token(&self, token: &str) -> ClientResult<()> {
        let header = bearer_header(token)?;
        let response = self
            .http
            .request(Method::POST, "/api/auth/logout", |rb| {
                rb.header(AUTHORIZATION, header.clone())
            })
            .await?;
        HttpBackend::discard(response).await
    }

    // ==================== Documents ====================

    pub async fn list_documents(&self, page: Page) -> ClientResult<Vec<DocumentSummary>> {
        let query = page.query();
        let response = self
            .http
            .request(Method::GET, "/api/documents", |rb| rb.query(&query))
            .await?;
        HttpBackend::parse(response, "document list").await
    }

    pub async fn get_document(&self, id: &ResourceId) -> ClientResult<DocumentSummary> {
        let response = self
            .http
            .request(Method::GET, &document_path(id, ""), |rb| rb)
            .await?;
        HttpBackend::parse(response, "document").await
    }

    /// Upload one file as multipart field `file`.
    ///
    /// `on_progress` receives non-decreasing percentages while the body is
    /// sent, capped at 99, and exactly one 100 once the server has accepted
    /// the upload. Uploads are never retried.
    pub async fn upload_document(
        &self,
        file: &UploadCandidate,
        on_progress: ProgressCallback,
    ) -> ClientResult<UploadAck> {
        let bytes = file.read().await?;
        let total = bytes.len() as u64;
        let reporter = shared_reporter(total, on_progress);

        let part = Part::stream_with_length(progress_body(bytes, Arc::clone(&reporter)), total)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|_| ClientError::UploadRejected {
                rejections: vec![FileRejection {
                    file_name: file.file_name.clone(),
                    reasons: vec![RejectionReason::FileInvalidType {
                        mime_type: file.mime_type.clone(),
                    }],
                }],
            })?;
        let form = Form::new().part("file", part);

        info!(file = %file.file_name, size = total, "uploading document");
        let response = self
            .http
            .request_once(Method::POST, "/api/documents/upload", |rb| rb.multipart(form))
            .await?;
        let ack: UploadAck = HttpBackend::parse(response, "upload").await?;

        reporter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .complete();
        debug!(document_id = %ack.document_id, "upload accepted");
        Ok(ack)
    }

    pub async fn document_status(&self, id: &ResourceId) -> ClientResult<DocumentStatusUpdate> {
        let response = self
            .http
            .request(Method::GET, &document_path(id, "/status"), |rb| rb)
            .await?;
        HttpBackend::parse(response, "document status").await
    }

    pub async fn document_analysis(&self, id: &ResourceId) -> ClientResult<DocumentAnalysis> {
        let response = self
            .http
            .request(Method::GET, &document_path(id, "/analysis"), |rb| rb)
            .await?;
        HttpBackend::parse(response, "document analysis").await
    }

    pub async fn delete_document(&self, id: &ResourceId) -> ClientResult<()> {
        let response = self
            .http
            .request(Method::DELETE, &document_path(id, ""), |rb| rb)
            .await?;
        HttpBackend::discard(response).await
    }

    // ==================== Playbooks ====================

    pub async fn list_playbooks(&self, page: Page) -> ClientResult<Vec<Playbook>> {
        let query = page.query();
        let response = self
            .http
            .request(Method::GET, "/api/analysis/playbooks", |rb| rb.query(&query))
            .await?;
        HttpBackend::parse(response, "playbook list").await
    }

    pub async fn get_playbook(&self, id: &ResourceId) -> ClientResult<Playbook> {
        let response = self
            .http
            .request(Method::GET, &playbook_path(id), |rb| rb)
            .await?;
        HttpBackend::parse(response, "playbook").await
    }

    pub async fn create_playbook(&self, playbook: &NewPlaybook) -> ClientResult<Playbook> {
        let response = self
            .http
            .request(Method::POST, "/api/analysis/playbooks", |rb| {
                rb.json(playbook)
            })
            .await?;
        HttpBackend::parse(response, "playbook").await
    }

    pub async fn update_playbook(
        &self,
        id: &ResourceId,
        update: &PlaybookUpdate,
    ) -> ClientResult<Playbook> {
        let response = self
            .http
            .request(Method::PUT, &playbook_path(id), |rb| rb.json(update))
            .await?;
        HttpBackend::parse(response, "playbook").await
    }

    pub async fn delete_playbook(&self, id: &ResourceId) -> ClientResult<()> {
        let response = self
            .http
            .request(Method::DELETE, &playbook_path(id), |rb| rb)
            .await?;
        HttpBackend::discard(response).await
    }

    // ==================== Analysis jobs ====================

    pub async fn submit_analysis(&self, request: &AnalysisRequest) -> ClientResult<AnalysisJobAck> {
        let response = self
            .http
            .request(Method::POST, "/api/analysis/analyze", |rb| rb.json(request))
            .await?;
        HttpBackend::parse(response, "analysis job").await
    }

    pub async fn job_status(&self, job_id: &str) -> ClientResult<JobStatus> {
        let path = format!("/api/analysis/job/{}/status", job_id);
        let response = self.http.request(Method::GET, &path, |rb| rb).await?;
        HttpBackend::parse(response, "job status").await
    }

    pub async fn statistics(&self) -> ClientResult<AnalysisStatistics> {
        let response = self
            .http
            .request(Method::GET, "/api/analysis/statistics", |rb| rb)
            .await?;
        HttpBackend::parse(response, "statistics").await
    }

    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let response = self
            .http
            .request(Method::GET, "/api/health", |rb| rb)
            .await?;
        HttpBackend::parse(response, "health").await
    }

    // ==================== Accessors ====================

    /// Shared session token read by every request.
    pub fn token(&self) -> &SessionToken {
        &self.http.token
    }

    /// Durable storage for the persisted session.
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.http.storage
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.token.is_present()
    }
}

fn document_path(id: &ResourceId, suffix: &str) -> String {
    format!("/api/documents/{}{}", id, suffix)
}

fn playbook_path(id: &ResourceId) -> String {
    format!("/api/analysis/playbooks/{}", id)
}
