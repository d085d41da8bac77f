//! Document list, current analysis, upload progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::notify::Notifier;
use crate::types::{
    DocumentAnalysis, DocumentStatusUpdate, DocumentSummary, Page, ResourceId, UploadAck,
};
use crate::upload::{validate_selection, ProgressCallback, UploadCandidate};

/// Snapshot of the document store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentState {
    pub documents: Vec<DocumentSummary>,
    pub current_analysis: Option<DocumentAnalysis>,
    pub is_loading: bool,
    pub upload_progress: u8,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<DocumentSummary>,
    current_analysis: Option<DocumentAnalysis>,
    // List and analysis fetches may overlap; the flag is up while any runs.
    loads_in_flight: u32,
}

/// Owns the user's document list and the current analysis.
#[derive(Debug)]
pub struct DocumentStore {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    inner: RwLock<Inner>,
    progress: Arc<watch::Sender<u8>>,
    list_generation: AtomicU64,
    analysis_generation: AtomicU64,
}

impl DocumentStore {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            api,
            notifier,
            inner: RwLock::new(Inner::default()),
            progress: Arc::new(progress),
            list_generation: AtomicU64::new(0),
            analysis_generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> DocumentState {
        let inner = self.read();
        DocumentState {
            documents: inner.documents.clone(),
            current_analysis: inner.current_analysis.clone(),
            is_loading: inner.loads_in_flight > 0,
            upload_progress: *self.progress.borrow(),
        }
    }

    pub fn documents(&self) -> Vec<DocumentSummary> {
        self.read().documents.clone()
    }

    pub fn document(&self, id: &ResourceId) -> Option<DocumentSummary> {
        self.read().documents.iter().find(|d| &d.id == id).cloned()
    }

    pub fn current_analysis(&self) -> Option<DocumentAnalysis> {
        self.read().current_analysis.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loads_in_flight > 0
    }

    /// Latest upload progress, `0..=100`.
    pub fn upload_progress(&self) -> u8 {
        *self.progress.borrow()
    }

    /// Watch upload progress.
    pub fn subscribe_upload_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    /// Replace the list with the server's current listing.
    ///
    /// A response that arrives after a newer fetch has started is dropped.
    pub async fn fetch_documents(&self) -> ClientResult<Vec<DocumentSummary>> {
        let generation = self.list_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.write().loads_in_flight += 1;

        let result = self.api.list_documents(Page::default()).await;

        {
            let mut inner = self.write();
            inner.loads_in_flight = inner.loads_in_flight.saturating_sub(1);
            if let Ok(documents) = &result {
                if generation == self.list_generation.load(Ordering::SeqCst) {
                    inner.documents = documents.clone();
                } else {
                    debug!(generation, "discarding stale document list");
                }
            }
        }

        result.map_err(|e| {
            self.notifier.error(&e.user_message());
            e
        })
    }

    /// Validate, upload, then refresh the whole list.
    ///
    /// Progress is reset to 0 before the upload and again once the store is
    /// done, whether the upload succeeded or not. `on_progress`, when given,
    /// sees every value the store publishes during the transfer.
    pub async fn upload_document(
        &self,
        files: &[UploadCandidate],
        on_progress: Option<ProgressCallback>,
    ) -> ClientResult<UploadAck> {
        let file = match validate_selection(files) {
            Ok(file) => file,
            Err(e) => {
                self.notifier.error(&e.user_message());
                return Err(e);
            }
        };

        self.progress.send_replace(0);
        let publisher = Arc::clone(&self.progress);
        let callback: ProgressCallback = Arc::new(move |percent| {
            publisher.send_replace(percent);
            if let Some(listener) = &on_progress {
                listener(percent);
            }
        });

        let result = self.api.upload_document(file, callback).await;

        let ack = match result {
            Ok(ack) => ack,
            Err(e) => {
                self.progress.send_replace(0);
                self.notifier.error(&e.user_message());
                return Err(e);
            }
        };

        info!(document_id = %ack.document_id, file = %file.file_name, "document uploaded");
        self.notifier.success("Document uploaded successfully");

        if let Err(e) = self.fetch_documents().await {
            warn!(error = %e, "list refresh after upload failed");
        }
        self.progress.send_replace(0);

        Ok(ack)
    }

    /// Load the analysis for `id` into the current-analysis slot.
    ///
    /// On failure the previous analysis stays in place.
    pub async fn fetch_document_analysis(&self, id: &ResourceId) -> ClientResult<DocumentAnalysis> {
        let generation = self.analysis_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.write().loads_in_flight += 1;

        let result = self.api.document_analysis(id).await;

        {
            let mut inner = self.write();
            inner.loads_in_flight = inner.loads_in_flight.saturating_sub(1);
            if let Ok(analysis) = &result {
                if generation == self.analysis_generation.load(Ordering::SeqCst) {
                    inner.current_analysis = Some(analysis.clone());
                } else {
                    debug!(document_id = %id, generation, "discarding stale analysis");
                }
            }
        }

        result.map_err(|e| {
            self.notifier.error(&e.user_message());
            e
        })
    }

    /// Fetch the processing status of `id` and merge it into the matching
    /// list entry. Unknown ids leave the list untouched.
    ///
    /// Errors are logged and returned, not surfaced to the user: polling
    /// runs in the background.
    pub async fn poll_document_status(&self, id: &ResourceId) -> ClientResult<DocumentStatusUpdate> {
        let update = match self.api.document_status(id).await {
            Ok(update) => update,
            Err(e) => {
                warn!(document_id = %id, error = %e, "status poll failed");
                return Err(e);
            }
        };

        let mut inner = self.write();
        match inner.documents.iter_mut().find(|d| &d.id == id) {
            Some(entry) => {
                entry.apply_status(&update);
                debug!(document_id = %id, status = %update.status, "status merged");
            }
            None => debug!(document_id = %id, "status for unlisted document ignored"),
        }

        Ok(update)
    }

    /// Poll until the document reaches a terminal status or `max_polls`
    /// polls have been made. Returns the last status seen.
    pub async fn wait_until_settled(
        &self,
        id: &ResourceId,
        interval: Duration,
        max_polls: u32,
    ) -> ClientResult<DocumentStatusUpdate> {
        let max_polls = max_polls.max(1);
        let mut polls = 0;

        loop {
            let update = self.poll_document_status(id).await?;
            polls += 1;
            if update.status.is_terminal() || polls >= max_polls {
                return Ok(update);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Delete `id` on the server, drop it from the list, and clear the
    /// current analysis if it belongs to that document.
    pub async fn delete_document(&self, id: &ResourceId) -> ClientResult<()> {
        if let Err(e) = self.api.delete_document(id).await {
            self.notifier.error(&e.user_message());
            return Err(e);
        }

        {
            let mut inner = self.write();
            inner.documents.retain(|d| &d.id != id);
            if inner
                .current_analysis
                .as_ref()
                .is_some_and(|a| a.document_id() == id)
            {
                inner.current_analysis = None;
            }
        }

        info!(document_id = %id, "document deleted");
        self.notifier.success("Document deleted successfully");
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
