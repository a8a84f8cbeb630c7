//! Recording descriptors.
//!
//! Recordings are created by the server, never by the client; the
//! client only lists them and forwards descriptors back for
//! pin/unpin/annotate/delete/rerun operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Model;

/// Lifecycle status of a recording, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordingStatus {
    /// Actively recording.
    Recording,
    /// Finished and fully processed.
    Finished,
    /// Finished capture, currently in the post-processing stage.
    PostProcessing,
    /// Any status this client does not interpret (e.g. `WAITING`).
    Other(String),
}

impl RecordingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RecordingStatus::Recording => "RECORDING",
            RecordingStatus::Finished => "FINISHED",
            RecordingStatus::PostProcessing => "POST_PROCESSING",
            RecordingStatus::Other(s) => s,
        }
    }
}

impl From<String> for RecordingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "RECORDING" => RecordingStatus::Recording,
            "FINISHED" => RecordingStatus::Finished,
            "POST_PROCESSING" => RecordingStatus::PostProcessing,
            _ => RecordingStatus::Other(s),
        }
    }
}

impl From<RecordingStatus> for String {
    fn from(status: RecordingStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A recording descriptor as returned by the server.
///
/// Unknown fields round-trip through `extra` so descriptors can be
/// echoed back verbatim in mutation requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub status: RecordingStatus,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// The model this recording belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    /// Path of the recording file on the server's disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_file: Option<String>,
    /// Path of the recording's metadata file on the server's disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data_file: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
