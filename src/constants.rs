//! Global constants for the XDental client core

/// Storage key for the image/analysis store snapshot
pub const IMAGE_STORAGE_KEY: &str = "image-storage";

/// Storage key for the dental data store snapshot
pub const DENTAL_STORAGE_KEY: &str = "dental-patient-data";

/// Storage key for the selected layout
pub const LAYOUT_STORAGE_KEY: &str = "xdental-layout";

/// Cookie carrying the clinic user's access token
pub const USER_TOKEN_COOKIE: &str = "access_token";

/// Cookie carrying the admin access token
pub const ADMIN_TOKEN_COOKIE: &str = "access_token_admin";

/// Report type label that uploads display as plain "File"
pub const GENERIC_UPLOAD_REPORT_TYPE: &str = "Generic Upload";

/// Replacement label for generic uploads
pub const FILE_REPORT_TYPE: &str = "File";

/// Maximum number of dental data snapshots kept for undo/redo
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Upload progress (percent) at which an upload counts as finished
pub const UPLOAD_COMPLETE_PROGRESS: f64 = 100.0;
