//! Model groups: named, server-persisted collections of model URLs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A model group. Identity is the (unique) name; `id` is an opaque
/// identifier assigned at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model_urls: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelGroup {
    /// Build a new group with a fresh id, de-duplicating the member
    /// URLs.
    pub fn new(name: impl Into<String>, model_urls: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            model_urls: dedup(model_urls),
            extra: Map::new(),
        }
    }

    /// Return a copy with the given members added, keeping set
    /// semantics and existing order.
    pub fn with_members_added(&self, urls: &[String]) -> Self {
        let mut group = self.clone();
        for url in urls {
            if !group.model_urls.contains(url) {
                group.model_urls.push(url.clone());
            }
        }
        group
    }

    /// Return a copy with the given members removed.
    pub fn with_members_removed(&self, urls: &[String]) -> Self {
        let mut group = self.clone();
        group.model_urls.retain(|u| !urls.contains(u));
        group
    }

    /// Return a copy with duplicate member URLs removed. Applied
    /// before every save.
    pub fn deduplicated(&self) -> Self {
        let mut group = self.clone();
        group.model_urls = dedup(std::mem::take(&mut group.model_urls));
        group
    }
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_group_deduplicates() {
        let group = ModelGroup::new("favs", urls(&["a", "b", "a"]));
        assert_eq!(group.model_urls, urls(&["a", "b"]));
        assert!(!group.id.is_empty());
    }

    #[test]
    fn adding_members_is_a_set_union() {
        let group = ModelGroup::new("favs", urls(&["a", "b"]));
        let updated = group.with_members_added(&urls(&["b", "c"]));
        assert_eq!(updated.model_urls, urls(&["a", "b", "c"]));
        // The original is untouched.
        assert_eq!(group.model_urls, urls(&["a", "b"]));
    }

    #[test]
    fn removing_members() {
        let group = ModelGroup::new("favs", urls(&["a", "b", "c"]));
        let updated = group.with_members_removed(&urls(&["b", "missing"]));
        assert_eq!(updated.model_urls, urls(&["a", "c"]));
    }

    #[test]
    fn wire_form_uses_camel_case() {
        let group = ModelGroup::new("favs", urls(&["a"]));
        let value = serde_json::to_value(&group).unwrap();
        assert!(value.get("modelUrls").is_some());
    }
}
