//! Per-model status derivation.

use std::collections::BTreeMap;

use crate::model::{self, Model};
use crate::recording::{Recording, RecordingStatus};

/// Resolved status for one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Offline,
    Online,
    Recording,
    /// Marked for later recording.
    Later,
    /// Recording suspended for this model.
    Paused,
}

impl ModelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelStatus::Offline => "offline",
            ModelStatus::Online => "online",
            ModelStatus::Recording => "recording",
            ModelStatus::Later => "later",
            ModelStatus::Paused => "paused",
        }
    }
}

/// Derive one status per model from the full listing, the online-only
/// listing, and the recording list.
///
/// The rules are applied in a fixed order, each overwriting the
/// previous classification for the keys it touches: offline (default),
/// online, recording, later, paused. A model that satisfies several
/// rules therefore resolves to the last one that applies.
pub fn derive_statuses(
    models: &BTreeMap<String, Model>,
    online: &BTreeMap<String, Model>,
    recordings: &[Recording],
) -> BTreeMap<String, ModelStatus> {
    let mut result: BTreeMap<String, ModelStatus> = models
        .keys()
        .map(|k| (k.clone(), ModelStatus::Offline))
        .collect();
    for key in online.keys() {
        result.insert(key.clone(), ModelStatus::Online);
    }
    for recording in recordings {
        if recording.status != RecordingStatus::Recording {
            continue;
        }
        if let Some(id) = recording.model.as_ref().and_then(model::model_id) {
            result.insert(id, ModelStatus::Recording);
        }
    }
    for (key, m) in models {
        if m.marked_for_later() {
            result.insert(key.clone(), ModelStatus::Later);
        }
    }
    for (key, m) in models {
        if m.suspended() {
            result.insert(key.clone(), ModelStatus::Paused);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(name: &str, later: bool, suspended: bool) -> Model {
        serde_json::from_value(json!({
            "type": "ctbrec.sites.camsite.CamSiteModel",
            "name": name,
            "url": format!("https://cam.example.com/{name}"),
            "markedForLater": later,
            "suspended": suspended,
        }))
        .unwrap()
    }

    fn listing(models: &[Model]) -> BTreeMap<String, Model> {
        models
            .iter()
            .map(|m| (model::model_id(m).unwrap(), m.clone()))
            .collect()
    }

    fn recording_for(m: &Model, status: &str) -> Recording {
        serde_json::from_value(json!({
            "status": status,
            "pinned": false,
            "model": serde_json::to_value(m).unwrap(),
        }))
        .unwrap()
    }

    #[test]
    fn defaults_to_offline() {
        let models = listing(&[model("alice", false, false)]);
        let statuses = derive_statuses(&models, &BTreeMap::new(), &[]);
        assert_eq!(statuses["CamSite:alice"], ModelStatus::Offline);
    }

    #[test]
    fn online_overrides_offline() {
        let alice = model("alice", false, false);
        let models = listing(&[alice.clone(), model("bob", false, false)]);
        let online = listing(&[alice]);
        let statuses = derive_statuses(&models, &online, &[]);
        assert_eq!(statuses["CamSite:alice"], ModelStatus::Online);
        assert_eq!(statuses["CamSite:bob"], ModelStatus::Offline);
    }

    #[test]
    fn active_recording_overrides_online() {
        let alice = model("alice", false, false);
        let models = listing(&[alice.clone()]);
        let online = models.clone();
        let recordings = vec![recording_for(&alice, "RECORDING")];
        let statuses = derive_statuses(&models, &online, &recordings);
        assert_eq!(statuses["CamSite:alice"], ModelStatus::Recording);
    }

    #[test]
    fn finished_recordings_do_not_count() {
        let alice = model("alice", false, false);
        let models = listing(&[alice.clone()]);
        let recordings = vec![recording_for(&alice, "FINISHED")];
        let statuses = derive_statuses(&models, &BTreeMap::new(), &recordings);
        assert_eq!(statuses["CamSite:alice"], ModelStatus::Offline);
    }

    #[test]
    fn last_applicable_rule_wins() {
        // Online, recording, marked for later, and suspended all at
        // once: the paused rule is applied last and wins.
        let alice = model("alice", true, true);
        let models = listing(&[alice.clone()]);
        let online = models.clone();
        let recordings = vec![recording_for(&alice, "RECORDING")];
        let statuses = derive_statuses(&models, &online, &recordings);
        assert_eq!(statuses["CamSite:alice"], ModelStatus::Paused);
    }

    #[test]
    fn later_overrides_recording_but_not_paused() {
        let alice = model("alice", true, false);
        let models = listing(&[alice.clone()]);
        let recordings = vec![recording_for(&alice, "RECORDING")];
        let statuses = derive_statuses(&models, &BTreeMap::new(), &recordings);
        assert_eq!(statuses["CamSite:alice"], ModelStatus::Later);
    }
}
