//! Server activity summary and disk-space statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Model;
use crate::recording::{Recording, RecordingStatus};

/// Disk-space statistics from the `space` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceStats {
    /// Total bytes on the recording volume.
    pub space_total: i64,
    /// Free bytes on the recording volume.
    pub space_free: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregate counts and space figures for one server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_models: usize,
    pub models_recording: usize,
    pub models_online: usize,
    pub models_paused: usize,
    pub models_marked_later: usize,
    pub total_recordings: usize,
    pub post_processing: usize,
    /// Used space, formatted in gigabytes with 3 decimal places.
    pub space_used: String,
    /// Free space, formatted in gigabytes with 3 decimal places.
    pub space_free: String,
}

/// Assemble a [`Summary`] from the raw listings.
pub fn build_summary(
    models: &BTreeMap<String, Model>,
    online_count: usize,
    recordings: &[Recording],
    space: &SpaceStats,
) -> Summary {
    Summary {
        total_models: models.len(),
        models_recording: recordings
            .iter()
            .filter(|r| r.status == RecordingStatus::Recording)
            .count(),
        models_online: online_count,
        models_paused: models.values().filter(|m| m.suspended()).count(),
        models_marked_later: models.values().filter(|m| m.marked_for_later()).count(),
        total_recordings: recordings.len(),
        post_processing: recordings
            .iter()
            .filter(|r| r.status == RecordingStatus::PostProcessing)
            .count(),
        space_used: format_gb(space.space_total - space.space_free),
        space_free: format_gb(space.space_free),
    }
}

/// Format a byte count as gigabytes with 3 decimal places.
fn format_gb(bytes: i64) -> String {
    format!("{:.3} GB", bytes as f64 / 1e9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(name: &str, later: bool, suspended: bool) -> (String, Model) {
        let m: Model = serde_json::from_value(json!({
            "type": "ctbrec.sites.camsite.CamSiteModel",
            "name": name,
            "url": format!("https://cam.example.com/{name}"),
            "markedForLater": later,
            "suspended": suspended,
        }))
        .unwrap();
        (format!("CamSite:{name}"), m)
    }

    fn recording(status: &str) -> Recording {
        serde_json::from_value(json!({"status": status, "pinned": false})).unwrap()
    }

    #[test]
    fn gigabyte_formatting() {
        assert_eq!(format_gb(1_500_000_000), "1.500 GB");
        assert_eq!(format_gb(0), "0.000 GB");
        assert_eq!(format_gb(123_456_789), "0.123 GB");
    }

    #[test]
    fn counts_and_space() {
        let models: BTreeMap<_, _> = [
            model("alice", false, true),
            model("bob", true, false),
            model("carol", false, false),
        ]
        .into_iter()
        .collect();
        let recordings = vec![
            recording("RECORDING"),
            recording("POST_PROCESSING"),
            recording("FINISHED"),
        ];
        let space: SpaceStats = serde_json::from_value(json!({
            "spaceTotal": 4_000_000_000_i64,
            "spaceFree": 1_000_000_000_i64,
        }))
        .unwrap();

        let summary = build_summary(&models, 2, &recordings, &space);
        assert_eq!(summary.total_models, 3);
        assert_eq!(summary.models_online, 2);
        assert_eq!(summary.models_recording, 1);
        assert_eq!(summary.models_paused, 1);
        assert_eq!(summary.models_marked_later, 1);
        assert_eq!(summary.total_recordings, 3);
        assert_eq!(summary.post_processing, 1);
        assert_eq!(summary.space_used, "3.000 GB");
        assert_eq!(summary.space_free, "1.000 GB");
    }
}
