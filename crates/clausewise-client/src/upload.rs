//! Pre-upload validation and upload progress reporting.
//!
//! A selection is checked locally before anything touches the network:
//! exactly one file, PDF/DOC/DOCX only, at most [`MAX_UPLOAD_BYTES`].
//! Violations are reported per file, each with one or more reason codes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::error::{ClientError, ClientResult};

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types the service can process.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Number of files a single upload may carry.
pub const MAX_FILES: usize = 1;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Progress callback receiving a percentage in `0..=100`.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// A file selected for upload.
///
/// Files taken from disk are only sized up front; their content is read
/// when the upload is sent, so a selection that fails validation is never
/// loaded into memory.
#[derive(Clone)]
pub struct UploadCandidate {
    pub file_name: String,
    pub mime_type: String,
    size: u64,
    content: Content,
}

#[derive(Clone)]
enum Content {
    Memory(Bytes),
    Disk(PathBuf),
}

impl UploadCandidate {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            content: Content::Memory(bytes),
        }
    }

    /// Select a file on disk; the MIME type is inferred from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| file_error(path, &e))?;
        if !metadata.is_file() {
            return Err(ClientError::File {
                path: path.to_path_buf(),
                message: "not a regular file".to_string(),
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            mime_type: mime_for_path(path).to_string(),
            file_name,
            size: metadata.len(),
            content: Content::Disk(path.to_path_buf()),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The file's content, read from disk if it was selected from a path.
    pub async fn read(&self) -> ClientResult<Bytes> {
        match &self.content {
            Content::Memory(bytes) => Ok(bytes.clone()),
            Content::Disk(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| file_error(path, &e)),
        }
    }
}

fn file_error(path: &Path, err: &std::io::Error) -> ClientError {
    ClientError::File {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

impl fmt::Debug for UploadCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadCandidate")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish()
    }
}

/// MIME type for a path, by extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Why a file was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    FileInvalidType { mime_type: String },
    FileTooLarge { size: u64, max: u64 },
    TooManyFiles { count: usize },
}

impl RejectionReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileInvalidType { .. } => "file-invalid-type",
            Self::FileTooLarge { .. } => "file-too-large",
            Self::TooManyFiles { .. } => "too-many-files",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileInvalidType { mime_type } => write!(
                f,
                "{}: {} is not a PDF, DOC or DOCX file",
                self.code(),
                mime_type
            ),
            Self::FileTooLarge { size, max } => write!(
                f,
                "{}: {} bytes exceeds the {} byte limit",
                self.code(),
                size,
                max
            ),
            Self::TooManyFiles { count } => write!(
                f,
                "{}: {} files selected, only {} allowed",
                self.code(),
                count,
                MAX_FILES
            ),
        }
    }
}

/// A refused file with every reason it was refused for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub file_name: String,
    pub reasons: Vec<RejectionReason>,
}

impl FileRejection {
    pub fn has_code(&self, code: &str) -> bool {
        self.reasons.iter().any(|r| r.code() == code)
    }
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons = self
            .reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} ({})", self.file_name, reasons)
    }
}

/// Reasons a single file fails the type and size checks.
pub fn check_file(file: &UploadCandidate) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();

    if !ACCEPTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        reasons.push(RejectionReason::FileInvalidType {
            mime_type: file.mime_type.clone(),
        });
    }
    if file.size() > MAX_UPLOAD_BYTES {
        reasons.push(RejectionReason::FileTooLarge {
            size: file.size(),
            max: MAX_UPLOAD_BYTES,
        });
    }

    reasons
}

/// Validate a selection and return the single accepted file.
///
/// An empty selection is rejected with no per-file entries. With more than
/// one file every file is rejected, each carrying `too-many-files` next to
/// its own reasons.
pub fn validate_selection(files: &[UploadCandidate]) -> ClientResult<&UploadCandidate> {
    let too_many = files.len() > MAX_FILES;

    let rejections: Vec<FileRejection> = files
        .iter()
        .filter_map(|file| {
            let mut reasons = check_file(file);
            if too_many {
                reasons.push(RejectionReason::TooManyFiles { count: files.len() });
            }
            (!reasons.is_empty()).then(|| FileRejection {
                file_name: file.file_name.clone(),
                reasons,
            })
        })
        .collect();

    match files.first() {
        Some(file) if rejections.is_empty() => Ok(file),
        _ => Err(ClientError::UploadRejected { rejections }),
    }
}

/// Turns bytes-sent into a non-decreasing percentage.
///
/// Never reports 100 by itself: completion is only known once the server
/// has answered, see [`ProgressReporter::complete`].
pub(crate) struct ProgressReporter {
    total: u64,
    sent: u64,
    last: Option<u8>,
    callback: ProgressCallback,
}

impl ProgressReporter {
    pub(crate) fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            total,
            sent: 0,
            last: None,
            callback,
        }
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        self.sent = self.sent.saturating_add(bytes as u64);
        if self.total == 0 {
            return;
        }
        let percent = (self.sent.saturating_mul(100) / self.total).min(99) as u8;
        self.emit(percent);
    }

    pub(crate) fn complete(&mut self) {
        self.emit(100);
    }

    fn emit(&mut self, percent: u8) {
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        (self.callback)(percent);
    }
}

/// Shared handle so the client can report completion after the response.
pub(crate) type SharedReporter = Arc<Mutex<ProgressReporter>>;

pub(crate) fn shared_reporter(total: u64, callback: ProgressCallback) -> SharedReporter {
    Arc::new(Mutex::new(ProgressReporter::new(total, callback)))
}

/// Request body that reports progress as chunks are pulled by the transport.
///
/// Chunks are slices of `bytes`; nothing is copied.
pub(crate) fn progress_body(bytes: Bytes, reporter: SharedReporter) -> reqwest::Body {
    let total = bytes.len();

    let body = stream::iter((0..total).step_by(UPLOAD_CHUNK_SIZE)).map(move |start| {
        let chunk = bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(total));
        reporter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .advance(chunk.len());
        Ok::<_, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF: &str = "application/pdf";

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));
        (callback, seen)
    }

    #[test]
    fn test_accepts_single_pdf_at_limit() {
        let files = vec![UploadCandidate::new(
            "msa.pdf",
            PDF,
            vec![0u8; MAX_UPLOAD_BYTES as usize],
        )];
        let accepted = validate_selection(&files).unwrap();
        assert_eq!(accepted.file_name, "msa.pdf");
    }

    #[test]
    fn test_rejects_oversized_file() {
        let files = vec![UploadCandidate::new(
            "big.pdf",
            PDF,
            vec![0u8; 15 * 1024 * 1024],
        )];
        let err = validate_selection(&files).unwrap_err();
        let ClientError::UploadRejected { rejections } = err else {
            panic!("expected UploadRejected, got {err:?}");
        };
        assert_eq!(rejections.len(), 1);
        assert_eq!(rejections[0].file_name, "big.pdf");
        assert!(rejections[0].has_code("file-too-large"));
        assert!(!rejections[0].has_code("file-invalid-type"));
    }

    #[test]
    fn test_reports_every_reason_for_a_file() {
        let files = vec![UploadCandidate::new(
            "scan.png",
            "image/png",
            vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize],
        )];
        let ClientError::UploadRejected { rejections } = validate_selection(&files).unwrap_err()
        else {
            panic!("expected UploadRejected");
        };
        let codes: Vec<_> = rejections[0].reasons.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["file-invalid-type", "file-too-large"]);
    }

    #[test]
    fn test_rejects_multiple_files() {
        let files = vec![
            UploadCandidate::new("a.pdf", PDF, b"a".to_vec()),
            UploadCandidate::new("b.txt", "text/plain", b"b".to_vec()),
        ];
        let ClientError::UploadRejected { rejections } = validate_selection(&files).unwrap_err()
        else {
            panic!("expected UploadRejected");
        };
        assert_eq!(rejections.len(), 2);
        assert!(rejections.iter().all(|r| r.has_code("too-many-files")));
        assert!(rejections[1].has_code("file-invalid-type"));
    }

    #[test]
    fn test_empty_selection() {
        let err = validate_selection(&[]).unwrap_err();
        assert!(matches!(err, ClientError::UploadRejected { ref rejections } if rejections.is_empty()));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("x/Contract.PDF")), PDF);
        assert_eq!(mime_for_path(Path::new("a.doc")), "application/msword");
        assert_eq!(
            mime_for_path(Path::new("a.docx")),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nda.docx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let file = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "nda.docx");
        assert_eq!(file.size(), 4);
        assert!(check_file(&file).is_empty());
        assert_eq!(&file.read().await.unwrap()[..], b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_oversized_path_rejected_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.pdf");
        let sparse = std::fs::File::create(&path).unwrap();
        sparse.set_len(2 * 1024 * 1024 * 1024).unwrap();
        drop(sparse);

        let file = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(file.size(), 2 * 1024 * 1024 * 1024);

        // Validation works from the size alone: the content is gone and
        // the selection is still refused for the right reason.
        std::fs::remove_file(&path).unwrap();
        let files = vec![file];
        let err = validate_selection(&files).unwrap_err();
        match err {
            ClientError::UploadRejected { rejections } => {
                assert!(rejections[0].has_code("file-too-large"));
            }
            other => panic!("expected UploadRejected, got {other:?}"),
        }
        assert!(matches!(
            files[0].read().await,
            Err(ClientError::File { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_path_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");

        let err = UploadCandidate::from_path(&path).await.unwrap_err();
        assert!(matches!(err, ClientError::File { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("cannot read "));
    }

    #[tokio::test]
    async fn test_directory_is_not_uploadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadCandidate::from_path(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn test_progress_is_monotonic_and_capped() {
        let (callback, seen) = recorder();
        let mut reporter = ProgressReporter::new(1000, callback);

        reporter.advance(1);
        reporter.advance(4);
        reporter.advance(245);
        reporter.advance(500);
        reporter.advance(250);
        reporter.complete();
        reporter.complete();

        assert_eq!(*seen.lock().unwrap(), vec![0, 25, 75, 99, 100]);
    }

    #[test]
    fn test_progress_zero_length_body() {
        let (callback, seen) = recorder();
        let mut reporter = ProgressReporter::new(0, callback);
        reporter.advance(0);
        reporter.complete();
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn test_rejection_display() {
        let rejection = FileRejection {
            file_name: "notes.txt".to_string(),
            reasons: vec![RejectionReason::FileInvalidType {
                mime_type: "text/plain".to_string(),
            }],
        };
        assert_eq!(
            rejection.to_string(),
            "notes.txt (file-invalid-type: text/plain is not a PDF, DOC or DOCX file)"
        );
    }
}
