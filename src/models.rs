use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::storage::StorageDir;

#[derive(Clone)]
pub struct AppState {
    pub storage: StorageDir,
    pub config: Config,
}

impl AppState {
    pub fn new(storage: StorageDir, config: Config) -> Self {
        Self { storage, config }
    }
}

pub const WELCOME_MESSAGE: &str = "Welcome to the file transfer server!";
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";
pub const NO_FILES_MESSAGE: &str = "No files are on the server.";

// Response bodies

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub message: String,
}

/// Listing of the storage root.
///
/// `files` is always present. `message` is only set when there is nothing
/// to list, for clients that still look for the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileListResponse {
    pub fn new(files: Vec<String>) -> Self {
        let message = files.is_empty().then(|| NO_FILES_MESSAGE.to_string());
        Self { files, message }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
