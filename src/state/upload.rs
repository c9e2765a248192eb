//! In-flight upload tracking for the upload toast.

use std::sync::Arc;

use crate::constants::{FILE_REPORT_TYPE, GENERIC_UPLOAD_REPORT_TYPE, UPLOAD_COMPLETE_PROGRESS};
use crate::ids::{IdGenerator, SequentialIds, UploadId};
use crate::store::{Reducer, Store, SubscriptionId};

/// Callback aborting the transfer behind an upload.
pub type CancelCallback = Arc<dyn Fn() + Send + Sync>;

/// Upload lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    /// Get the display name for this status.
    pub fn name(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }
}

/// Transfer speed as reported by the uploader.
#[derive(Debug, Clone, PartialEq)]
pub enum Speed {
    /// Numeric speed, shown with two decimals
    Rate(f64),
    /// Pre-formatted speed, shown as is
    Text(String),
}

impl Speed {
    fn display(&self) -> String {
        match self {
            Speed::Rate(rate) => format!("{:.2}", rate),
            Speed::Text(text) => text.clone(),
        }
    }
}

impl From<f64> for Speed {
    fn from(rate: f64) -> Self {
        Speed::Rate(rate)
    }
}

impl From<&str> for Speed {
    fn from(text: &str) -> Self {
        Speed::Text(text.to_string())
    }
}

impl From<String> for Speed {
    fn from(text: String) -> Self {
        Speed::Text(text)
    }
}

/// A tracked upload.
#[derive(Clone)]
pub struct UploadRecord {
    pub id: UploadId,
    pub file_name: String,
    pub report_type: String,
    /// Percent complete (0-100)
    pub progress: f64,
    /// Formatted transfer speed
    pub speed: String,
    pub status: UploadStatus,
    pub on_cancel: Option<CancelCallback>,
}

impl std::fmt::Debug for UploadRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRecord")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("report_type", &self.report_type)
            .field("progress", &self.progress)
            .field("speed", &self.speed)
            .field("status", &self.status)
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// Parameters of a new upload.
#[derive(Clone, Default)]
pub struct UploadRequest {
    pub file_name: String,
    pub report_type: String,
    pub on_cancel: Option<CancelCallback>,
}

impl UploadRequest {
    /// Create a request without a cancel callback.
    pub fn new(file_name: impl Into<String>, report_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            report_type: report_type.into(),
            on_cancel: None,
        }
    }

    /// Attach a cancel callback.
    pub fn on_cancel(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cancel = Some(Arc::new(callback));
        self
    }
}

/// Ordered upload records plus toast visibility.
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub uploads: Vec<UploadRecord>,
    pub toast_visible: bool,
}

impl UploadState {
    /// Find a record by id.
    pub fn get(&self, id: UploadId) -> Option<&UploadRecord> {
        self.uploads.iter().find(|u| u.id == id)
    }

    fn get_mut(&mut self, id: UploadId) -> Option<&mut UploadRecord> {
        self.uploads.iter_mut().find(|u| u.id == id)
    }
}

/// Actions accepted by [`UploadState`].
#[derive(Debug)]
pub enum UploadAction {
    Add {
        id: UploadId,
        request: UploadRequestData,
    },
    Progress {
        id: UploadId,
        progress: f64,
        speed: Speed,
    },
    Failed(UploadId),
    Remove(UploadId),
    CloseToast,
}

/// [`UploadRequest`] as carried by an action.
pub struct UploadRequestData(pub UploadRequest);

impl std::fmt::Debug for UploadRequestData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.0.file_name)
            .field("report_type", &self.0.report_type)
            .finish()
    }
}

impl Reducer for UploadState {
    type Action = UploadAction;

    fn reduce(&mut self, action: UploadAction) {
        match action {
            UploadAction::Add { id, request } => {
                let request = request.0;
                let report_type = if request.report_type == GENERIC_UPLOAD_REPORT_TYPE {
                    FILE_REPORT_TYPE.to_string()
                } else {
                    request.report_type
                };
                self.uploads.push(UploadRecord {
                    id,
                    file_name: request.file_name,
                    report_type,
                    progress: 0.0,
                    speed: "0.00".to_string(),
                    status: UploadStatus::Uploading,
                    on_cancel: request.on_cancel,
                });
                self.toast_visible = true;
            }
            UploadAction::Progress {
                id,
                progress,
                speed,
            } => {
                if let Some(upload) = self.get_mut(id) {
                    upload.progress = progress;
                    upload.speed = speed.display();
                    upload.status = if progress >= UPLOAD_COMPLETE_PROGRESS {
                        UploadStatus::Success
                    } else {
                        UploadStatus::Uploading
                    };
                }
            }
            UploadAction::Failed(id) => {
                if let Some(upload) = self.get_mut(id) {
                    upload.status = UploadStatus::Error;
                }
            }
            UploadAction::Remove(id) => {
                self.uploads.retain(|u| u.id != id);
                self.toast_visible = !self.uploads.is_empty();
            }
            UploadAction::CloseToast => {
                self.uploads.clear();
                self.toast_visible = false;
            }
        }
    }
}

/// Upload tracker: the upload store plus its id source.
pub struct UploadTracker<G: IdGenerator = SequentialIds> {
    store: Store<UploadState>,
    ids: G,
}

impl Default for UploadTracker<SequentialIds> {
    fn default() -> Self {
        Self::new(SequentialIds::new())
    }
}

impl<G: IdGenerator> UploadTracker<G> {
    /// Create a tracker drawing ids from `ids`.
    pub fn new(ids: G) -> Self {
        Self {
            store: Store::default(),
            ids,
        }
    }

    /// Current state.
    pub fn state(&self) -> &UploadState {
        self.store.state()
    }

    /// Tracked uploads in insertion order.
    pub fn uploads(&self) -> &[UploadRecord] {
        &self.store.state().uploads
    }

    /// Whether the upload toast is shown.
    pub fn is_toast_visible(&self) -> bool {
        self.store.state().toast_visible
    }

    /// Register a listener called after every transition.
    pub fn subscribe(&mut self, listener: impl FnMut(&UploadState) + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    /// Start tracking an upload and show the toast.
    pub fn add_upload(&mut self, request: UploadRequest) -> UploadId {
        let id = self.ids.next_id();
        log::debug!("Upload {}: started '{}'", id, request.file_name);
        self.store.dispatch(UploadAction::Add {
            id,
            request: UploadRequestData(request),
        });
        id
    }

    /// Record progress; reaching 100% marks the upload successful.
    pub fn update_progress(&mut self, id: UploadId, progress: f64, speed: impl Into<Speed>) {
        self.store.dispatch(UploadAction::Progress {
            id,
            progress,
            speed: speed.into(),
        });
    }

    /// Mark an upload as failed.
    pub fn set_upload_error(&mut self, id: UploadId) {
        log::debug!("Upload {}: failed", id);
        self.store.dispatch(UploadAction::Failed(id));
    }

    /// Invoke the upload's cancel callback, then stop tracking it.
    pub fn cancel_upload(&mut self, id: UploadId) {
        let callback = self.store.state().get(id).and_then(|u| u.on_cancel.clone());
        if let Some(callback) = callback {
            log::debug!("Upload {}: cancelling", id);
            callback();
        }
        self.remove_upload(id);
    }

    /// Stop tracking an upload; hides the toast when none remain.
    pub fn remove_upload(&mut self, id: UploadId) {
        self.store.dispatch(UploadAction::Remove(id));
    }

    /// Clear all uploads and hide the toast.
    pub fn close_toast(&mut self) {
        self.store.dispatch(UploadAction::CloseToast);
    }
}
