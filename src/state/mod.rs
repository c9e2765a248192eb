//! Application state stores.

mod dental;
mod image;
mod layout;
mod notification;
mod upload;

pub use dental::{DataStatus, DentalAction, DentalState, DentalStore, ValidationReport};
pub use image::{ImageAction, ImageState, ImageStore, ToothData, ToothDataPatch};
pub use layout::{LayoutAction, LayoutKey, LayoutState, LayoutStore, LayoutTemplate};
pub use notification::{Notification, NotificationAction, NotificationState, parse_feed};
pub use upload::{
    CancelCallback, Speed, UploadAction, UploadRecord, UploadRequest, UploadRequestData,
    UploadState, UploadStatus, UploadTracker,
};
