//! Server settings and the partial-merge update.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::notice::Notice;

/// One server configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Merge a partial `key -> value` mapping onto a full settings list.
///
/// Unknown keys are dropped with a [`Notice::UnknownSettingKey`]; the
/// input list is not modified.
pub fn merge_settings(
    current: &[Setting],
    updates: &Map<String, Value>,
) -> (Vec<Setting>, Vec<Notice>) {
    let mut merged: Vec<Setting> = current.to_vec();
    let mut notices = Vec::new();
    for (key, value) in updates {
        match merged.iter_mut().find(|s| &s.key == key) {
            Some(setting) => setting.value = value.clone(),
            None => notices.push(Notice::UnknownSettingKey { key: key.clone() }.emit()),
        }
    }
    (merged, notices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setting(key: &str, value: Value) -> Setting {
        Setting {
            key: key.to_string(),
            value,
            extra: Map::new(),
        }
    }

    #[test]
    fn merges_known_keys() {
        let current = vec![setting("httpPort", json!(8080)), setting("recordFlag", json!(true))];
        let mut updates = Map::new();
        updates.insert("httpPort".to_string(), json!(9090));
        let (merged, notices) = merge_settings(&current, &updates);
        assert_eq!(merged[0].value, json!(9090));
        assert_eq!(merged[1].value, json!(true));
        assert!(notices.is_empty());
    }

    #[test]
    fn unknown_keys_become_notices() {
        let current = vec![setting("httpPort", json!(8080))];
        let mut updates = Map::new();
        updates.insert("noSuchKey".to_string(), json!("x"));
        let (merged, notices) = merge_settings(&current, &updates);
        assert_eq!(merged, current);
        assert_eq!(
            notices,
            vec![Notice::UnknownSettingKey {
                key: "noSuchKey".to_string()
            }]
        );
    }

    #[test]
    fn wire_extras_round_trip() {
        let raw = json!({"key": "httpPort", "value": 8080, "type": "java.lang.Integer"});
        let parsed: Setting = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.extra.get("type"), Some(&json!("java.lang.Integer")));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }
}
