//! Client and session layer for the ClauseWise contract analysis service.
//!
//! This crate provides:
//!
//! - HTTP client for the ClauseWise API with bearer-token auth
//! - Normalization of server error payloads into one readable message
//! - Persisted session storage
//! - Auth store (anonymous / authenticating / authenticated)
//! - Document store (list, upload with progress, status polling, analysis)
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clausewise_client::{
//!     ApiClient, AuthStore, ClientConfig, DocumentStore, FileSessionStorage, LogRedirect,
//!     SessionToken, TracingNotifier,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::from_env();
//! let api = ApiClient::new(
//!     &config,
//!     SessionToken::new(),
//!     Arc::new(FileSessionStorage::new()?),
//!     Arc::new(LogRedirect::default()),
//! )?;
//!
//! let auth = AuthStore::new(api.clone(), Arc::new(TracingNotifier));
//! auth.login("a@b.com", "x").await?;
//!
//! let documents = DocumentStore::new(api, Arc::new(TracingNotifier));
//! for doc in documents.fetch_documents().await? {
//!     println!("{} {}", doc.display_name(), doc.status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `CLAUSEWISE_API_URL` | API base URL (default: `http://localhost:8000`) |
//! | `CLAUSEWISE_API_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `CLAUSEWISE_API_MAX_RETRIES` | Max retries for GET requests (default: 2) |
//! | `CLAUSEWISE_SESSION_FILE` | Persisted session file (default: `<config dir>/clausewise/auth-storage.json`) |

pub mod auth;
pub mod client;
pub mod config;
pub mod detail;
pub mod error;
pub mod notify;
pub mod session;
pub mod store;
pub mod types;
pub mod upload;

// Re-export main types
pub use auth::{LogRedirect, LoginRedirect, SessionToken};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use detail::{extract_detail_message, UNEXPECTED_ERROR};
pub use error::{ClientError, ClientResult};
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{
    default_session_path, FileSessionStorage, MemorySessionStorage, PersistedSession,
    SessionStorage, SESSION_ENTRY_NAME,
};
pub use store::{AuthPhase, AuthState, AuthStore, DocumentState, DocumentStore};
pub use types::{
    AccessToken, AnalysisJobAck, AnalysisRequest, AnalysisStatistics, AnalysisSummary,
    AnalysisType, Clause, Credentials, DocumentAnalysis, DocumentStatus, DocumentStatusUpdate,
    DocumentSummary, HealthStatus, JobState, JobStatus, NewPlaybook, Page, Playbook,
    PlaybookUpdate, ResourceId, RiskLevel, StatisticsSummary, UploadAck, UserAccount,
    UserProfile,
};
pub use upload::{
    validate_selection, FileRejection, ProgressCallback, RejectionReason, UploadCandidate,
    ACCEPTED_MIME_TYPES, MAX_UPLOAD_BYTES,
};
