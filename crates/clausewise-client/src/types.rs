//! API request and response types for the ClauseWise protocol.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ==================== Identifiers & lenient scalars ====================

/// Opaque server-assigned identifier.
///
/// The backend emits ids either as JSON strings (object ids) or integers;
/// both deserialize into the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self(n.to_string()),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse a server timestamp. Naive timestamps (no offset) are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|s| {
        parse_timestamp(&s).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {s}")))
    })
    .transpose()
}

// The backend is inconsistent about flags: `true`, `"true"`, `"1"` all occur.
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(i64),
        Text(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Bool(b) => b,
        Raw::Number(n) => n != 0,
        Raw::Text(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
    }))
}

// ==================== Enumerations ====================

/// Document processing status.
///
/// Canonical vocabulary is `pending/processing/complete/error`. The legacy
/// spellings `completed` and `failed` are accepted on input only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    #[serde(alias = "completed")]
    Complete,
    #[serde(alias = "failed")]
    Error,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// Processing will not change this status any more.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Ordinal risk severity of a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a risk score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            Self::Critical
        } else if score >= 0.5 {
            Self::High
        } else if score >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Kind of analysis requested for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Comprehensive,
    Quick,
    Focused,
}

impl AnalysisType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Quick => "quick",
            Self::Focused => "focused",
        }
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comprehensive" => Ok(Self::Comprehensive),
            "quick" => Ok(Self::Quick),
            "focused" => Ok(Self::Focused),
            other => Err(format!(
                "unknown analysis type: {other} (expected comprehensive, quick or focused)"
            )),
        }
    }
}

/// Server-side job state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Pending,
    Progress,
    Success,
    Failure,
    Other(String),
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Pending | Self::Progress)
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "PROGRESS" | "STARTED" => Self::Progress,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            _ => Self::Other(s),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending => "PENDING".to_string(),
            JobState::Progress => "PROGRESS".to_string(),
            JobState::Success => "SUCCESS".to_string(),
            JobState::Failure => "FAILURE".to_string(),
            JobState::Other(s) => s,
        }
    }
}

// ==================== Auth ====================

/// Login / registration payload.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response from POST /api/auth/login.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Response from POST /api/auth/register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: ResourceId,
    pub email: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Current user, as returned by GET /api/user/profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ResourceId,
    pub email: String,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

// ==================== Documents ====================

/// Pagination window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
        }
    }
}

impl Page {
    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// One entry of the user's document list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: ResourceId,
    pub filename: String,
    #[serde(default)]
    pub original_filename: Option<String>,
    pub status: DocumentStatus,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub processing_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_clauses_found: u32,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Processing progress, only known after a status poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl DocumentSummary {
    /// Name the user uploaded the file under.
    pub fn display_name(&self) -> &str {
        self.original_filename.as_deref().unwrap_or(&self.filename)
    }

    /// Merge a status poll into this entry. Touches exactly status, clause
    /// count, error message and progress.
    pub fn apply_status(&mut self, update: &DocumentStatusUpdate) {
        self.status = update.status;
        self.total_clauses_found = update.total_clauses_found;
        self.error_message = update.error_message.clone();
        self.progress = update.progress;
    }
}

/// Response from GET /api/documents/{id}/status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatusUpdate {
    pub id: ResourceId,
    pub status: DocumentStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub total_clauses_found: u32,
}

/// Response from POST /api/documents/upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
    pub document_id: ResourceId,
    pub status: DocumentStatus,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// A classified contract excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub id: ResourceId,
    pub text: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence_score: f64,
    #[serde(default)]
    pub start_position: Option<u64>,
    #[serde(default)]
    pub end_position: Option<u64>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub recommendations: Option<String>,
}

/// Aggregate statistics over a document's clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub document_id: ResourceId,
    pub total_clauses: u32,
    #[serde(default)]
    pub risk_distribution: BTreeMap<String, u32>,
    #[serde(default)]
    pub category_breakdown: BTreeMap<String, u32>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub overall_risk_score: f64,
    #[serde(default)]
    pub analysis_metadata: Value,
}

impl AnalysisSummary {
    /// Recompute the summary from a clause list, the same way the server does.
    pub fn from_clauses(document_id: ResourceId, clauses: &[Clause]) -> Self {
        let mut risk_distribution = BTreeMap::new();
        let mut category_breakdown = BTreeMap::new();
        let mut total_risk = 0.0;

        for clause in clauses {
            *risk_distribution
                .entry(clause.risk_level.as_str().to_string())
                .or_insert(0) += 1;
            *category_breakdown
                .entry(clause.category.clone())
                .or_insert(0) += 1;
            total_risk += clause.risk_score;
        }

        let overall_risk_score = if clauses.is_empty() {
            0.0
        } else {
            total_risk / clauses.len() as f64
        };

        Self {
            document_id,
            total_clauses: clauses.len() as u32,
            risk_distribution,
            category_breakdown,
            recommendations: clauses
                .iter()
                .filter_map(|c| c.recommendations.clone())
                .filter(|r| !r.is_empty())
                .collect(),
            overall_risk_score,
            analysis_metadata: Value::Object(Default::default()),
        }
    }

    /// Number of clauses rated high or critical.
    pub fn high_risk_clauses(&self) -> u32 {
        [RiskLevel::High, RiskLevel::Critical]
            .iter()
            .filter_map(|level| self.risk_distribution.get(level.as_str()))
            .sum()
    }

    /// Level of the overall score.
    pub fn overall_risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.overall_risk_score)
    }
}

/// Response from GET /api/documents/{id}/analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub document: DocumentSummary,
    pub clauses: Vec<Clause>,
    pub analysis_summary: AnalysisSummary,
}

impl DocumentAnalysis {
    pub fn document_id(&self) -> &ResourceId {
        &self.document.id
    }

    /// Clauses at or above `level`, in document order.
    pub fn clauses_at_least(&self, level: RiskLevel) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(move |c| c.risk_level >= level)
    }
}

// ==================== Playbooks & jobs ====================

/// A named, versioned rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for POST /api/analysis/playbooks.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlaybook {
    pub name: String,
    pub description: Option<String>,
    pub rules: serde_json::Map<String, Value>,
}

/// Payload for PUT /api/analysis/playbooks/{id}. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl PlaybookUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.rules.is_none()
            && self.is_active.is_none()
    }
}

/// Payload for POST /api/analysis/analyze.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub document_id: ResourceId,
    pub playbook_id: Option<ResourceId>,
    pub analysis_type: AnalysisType,
}

/// Response from POST /api/analysis/analyze.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisJobAck {
    #[serde(default)]
    pub message: String,
    pub job_id: String,
    pub document_id: ResourceId,
    #[serde(default)]
    pub playbook_id: Option<ResourceId>,
    #[serde(default)]
    pub analysis_type: Option<AnalysisType>,
}

/// Response from GET /api/analysis/job/{id}/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub state: JobState,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

// ==================== Statistics & health ====================

/// Response from GET /api/analysis/statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStatistics {
    pub summary: StatisticsSummary,
    #[serde(default)]
    pub document_status: BTreeMap<String, u64>,
    #[serde(default)]
    pub risk_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub category_breakdown: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub total_documents: u64,
    pub total_clauses: u64,
    pub average_risk_score: f64,
}

/// Response from GET /api/health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clause(id: &str, category: &str, score: f64, rec: Option<&str>) -> Clause {
        Clause {
            id: ResourceId::from(id),
            text: format!("clause {id}"),
            category: category.to_string(),
            subcategory: None,
            risk_score: score,
            risk_level: RiskLevel::from_score(score),
            confidence_score: 0.8,
            start_position: None,
            end_position: None,
            page_number: None,
            recommendations: rec.map(String::from),
        }
    }

    #[test]
    fn test_resource_id_accepts_string_and_integer() {
        let a: ResourceId = serde_json::from_value(json!("65f0c0ffee")).unwrap();
        let b: ResourceId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(a.as_str(), "65f0c0ffee");
        assert_eq!(b.as_str(), "42");
        assert_eq!(serde_json::to_value(&b).unwrap(), json!("42"));
    }

    #[test]
    fn test_status_aliases_resolve_to_canonical() {
        let complete: DocumentStatus = serde_json::from_value(json!("completed")).unwrap();
        let error: DocumentStatus = serde_json::from_value(json!("failed")).unwrap();
        assert_eq!(complete, DocumentStatus::Complete);
        assert_eq!(error, DocumentStatus::Error);
        assert_eq!(
            serde_json::to_value(DocumentStatus::Complete).unwrap(),
            json!("complete")
        );
        assert!(DocumentStatus::Error.is_terminal());
        assert!(!DocumentStatus::Processing.is_terminal());
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.29), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
        assert!(RiskLevel::Critical > RiskLevel::High);
    }

    #[test]
    fn test_naive_timestamps_are_utc() {
        let ts = parse_timestamp("2024-03-01T12:30:00.123456").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:00.123456+00:00");

        let ts = parse_timestamp("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(ts.timestamp(), 1_709_296_200);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_document_summary_from_backend_shape() {
        let doc: DocumentSummary = serde_json::from_value(json!({
            "id": "66aa",
            "filename": "3f2a_msa.pdf",
            "original_filename": "msa.pdf",
            "status": "processing",
            "file_size": 2048,
            "created_at": "2024-03-01T12:30:00",
            "total_clauses_found": 0,
            "processing_completed_at": null,
            "error_message": null
        }))
        .unwrap();
        assert_eq!(doc.display_name(), "msa.pdf");
        assert_eq!(doc.status, DocumentStatus::Processing);
        assert!(doc.created_at.is_some());
        assert!(doc.progress.is_none());
    }

    #[test]
    fn test_apply_status_merges_four_fields() {
        let mut doc: DocumentSummary = serde_json::from_value(json!({
            "id": "1",
            "filename": "a.pdf",
            "original_filename": "a.pdf",
            "status": "processing",
            "file_size": 10,
            "created_at": "2024-03-01T12:30:00Z",
            "total_clauses_found": 0
        }))
        .unwrap();
        let before = doc.clone();

        doc.apply_status(&DocumentStatusUpdate {
            id: ResourceId::from("1"),
            status: DocumentStatus::Complete,
            progress: Some(100),
            error_message: None,
            total_clauses_found: 12,
        });

        assert_eq!(doc.status, DocumentStatus::Complete);
        assert_eq!(doc.total_clauses_found, 12);
        assert_eq!(doc.progress, Some(100));
        assert_eq!(doc.filename, before.filename);
        assert_eq!(doc.created_at, before.created_at);
        assert_eq!(doc.file_size, before.file_size);
    }

    #[test]
    fn test_summary_from_clauses() {
        let clauses = vec![
            clause("1", "termination", 0.8, Some("Negotiate a cure period")),
            clause("2", "termination", 0.2, None),
            clause("3", "liability", 0.5, Some("")),
        ];
        let summary = AnalysisSummary::from_clauses(ResourceId::from("doc"), &clauses);

        assert_eq!(summary.total_clauses, 3);
        assert_eq!(summary.risk_distribution.get("critical"), Some(&1));
        assert_eq!(summary.risk_distribution.get("high"), Some(&1));
        assert_eq!(summary.risk_distribution.get("low"), Some(&1));
        assert_eq!(summary.category_breakdown.get("termination"), Some(&2));
        assert_eq!(summary.recommendations, vec!["Negotiate a cure period"]);
        assert!((summary.overall_risk_score - 0.5).abs() < 1e-9);
        assert_eq!(summary.high_risk_clauses(), 2);
        assert_eq!(summary.overall_risk_level(), RiskLevel::High);
    }

    #[test]
    fn test_summary_of_no_clauses() {
        let summary = AnalysisSummary::from_clauses(ResourceId::from("doc"), &[]);
        assert_eq!(summary.total_clauses, 0);
        assert_eq!(summary.overall_risk_score, 0.0);
        assert_eq!(summary.high_risk_clauses(), 0);
    }

    #[test]
    fn test_playbook_flag_shapes() {
        let p: Playbook = serde_json::from_value(json!({
            "id": "p1", "name": "NDA", "description": null,
            "version": "1.0", "is_active": "true", "created_at": null
        }))
        .unwrap();
        assert_eq!(p.is_active, Some(true));

        let p: Playbook = serde_json::from_value(json!({
            "id": 3, "name": "MSA", "is_active": false
        }))
        .unwrap();
        assert_eq!(p.is_active, Some(false));
        assert_eq!(p.id.as_str(), "3");
    }

    #[test]
    fn test_playbook_update_skips_unset_fields() {
        let update = PlaybookUpdate {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"name": "Renamed"})
        );
        assert!(PlaybookUpdate::default().is_empty());
    }

    #[test]
    fn test_job_state_roundtrip_and_unknown() {
        let status: JobStatus = serde_json::from_value(json!({
            "job_id": "j1", "state": "PROGRESS", "progress": 40, "status": "Running legal analysis"
        }))
        .unwrap();
        assert_eq!(status.state, JobState::Progress);
        assert!(!status.state.is_finished());

        let state = JobState::from("REVOKED".to_string());
        assert_eq!(state, JobState::Other("REVOKED".to_string()));
        assert!(state.is_finished());
        assert_eq!(String::from(state), "REVOKED");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("a@b.com", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_analysis_type_parse() {
        assert_eq!("Quick".parse::<AnalysisType>().unwrap(), AnalysisType::Quick);
        assert!("deep".parse::<AnalysisType>().is_err());
        assert_eq!(AnalysisType::default(), AnalysisType::Comprehensive);
    }
}
