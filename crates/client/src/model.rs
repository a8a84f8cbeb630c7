//! Model descriptors, references, and matching rules.
//!
//! A model can be addressed three ways: by its full server descriptor,
//! by URL, or by a `Site:Name` shorthand string. [`ModelRef`] is the
//! single validating parse point for all three shapes; every
//! model-targeted operation classifies its input through it before
//! touching the network.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ClientError;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("valid regex"));

static SITE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\w+:[\w-]+").expect("valid regex"));

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://([\w-]+\.)*([\w-]+\.[\w-]+)/([\w-]+/)*(.*?)/?$").expect("valid regex")
});

static MODEL_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ctbrec\.sites\.\w+\.(\w+)Model").expect("valid regex"));

/// A model descriptor as stored on the server.
///
/// Only the attributes the client reasons about are typed; everything
/// else round-trips through `extra` so descriptors can be echoed back
/// to the server unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Fully-qualified server-side type string, e.g.
    /// `ctbrec.sites.example.ExampleModel`. `null` in synthetic
    /// descriptors sent with `startByUrl`/`startByName`.
    #[serde(rename = "type")]
    pub model_type: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_for_later: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
    /// Epoch-millisecond timestamp after which recording stops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_until: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_until_subsequent_action: Option<String>,
    /// Server fields the client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model {
    pub fn marked_for_later(&self) -> bool {
        self.marked_for_later.unwrap_or(false)
    }

    pub fn suspended(&self) -> bool {
        self.suspended.unwrap_or(false)
    }
}

/// A validated reference to a model, in one of the three recognized
/// shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelRef {
    /// Full descriptor containing at least `type`, `name`, `url`.
    Descriptor(Model),
    /// Bare model page URL.
    Url(String),
    /// `Site:Name` shorthand.
    Shorthand(String),
}

impl ModelRef {
    /// Classify a raw JSON value as one of the three reference shapes.
    ///
    /// This is the only place the classification rules live.
    /// Classification is total and exclusive; anything else is an
    /// [`ClientError::InvalidModelDefinition`].
    pub fn parse(value: &Value) -> Result<Self, ClientError> {
        match value {
            Value::Object(map)
                if ["type", "name", "url"].iter().all(|k| map.contains_key(*k)) =>
            {
                Ok(Self::Descriptor(serde_json::from_value(value.clone())?))
            }
            Value::String(s) => Self::parse_str(s),
            other => Err(ClientError::InvalidModelDefinition(format!(
                "model must be one of [url, Site:Name, descriptor], got: {other}"
            ))),
        }
    }

    /// Classify a string reference as either a URL or a `Site:Name`
    /// shorthand.
    pub fn parse_str(s: &str) -> Result<Self, ClientError> {
        if URL_RE.is_match(s) {
            Ok(Self::Url(s.to_string()))
        } else if SITE_NAME_RE.is_match(s) {
            Ok(Self::Shorthand(s.to_string()))
        } else {
            Err(ClientError::InvalidModelDefinition(format!(
                "model must be one of [url, Site:Name, descriptor], got: {s}"
            )))
        }
    }
}

impl From<Model> for ModelRef {
    fn from(model: Model) -> Self {
        Self::Descriptor(model)
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRef::Descriptor(m) => match model_id(m) {
                Some(id) => write!(f, "{id}"),
                None => write!(f, "{}", m.name),
            },
            ModelRef::Url(u) => write!(f, "{u}"),
            ModelRef::Shorthand(s) => write!(f, "{s}"),
        }
    }
}

/// Derive a model's canonical `Site:Name` id from its type string.
///
/// Returns `None` when the type string does not follow the
/// `ctbrec.sites.<pkg>.<Site>Model` pattern.
pub fn model_id(model: &Model) -> Option<String> {
    let model_type = model.model_type.as_deref()?;
    let site = MODEL_TYPE_RE.captures(model_type)?.get(1)?.as_str();
    Some(format!("{site}:{}", model.name))
}

/// Check whether two model URLs address the same model.
///
/// Exact match after trimming whitespace and trailing slashes, or
/// agreement on both the registrable domain and the final path segment
/// (which is assumed to be the model's display name).
pub fn url_match(url1: &str, url2: &str) -> bool {
    let u1 = url1.trim().trim_end_matches('/');
    let u2 = url2.trim().trim_end_matches('/');
    if u1 == u2 {
        return true;
    }
    match (domain_and_name(u1), domain_and_name(u2)) {
        (Some((d1, n1)), Some((d2, n2))) => d1 == d2 && n1 == n2,
        _ => false,
    }
}

/// Extract `(registrable domain, last path segment)` from a model URL.
fn domain_and_name(url: &str) -> Option<(&str, &str)> {
    let caps = DOMAIN_RE.captures(url)?;
    Some((caps.get(2)?.as_str(), caps.get(4)?.as_str()))
}

/// Find a model in a listing keyed by `Site:Name` id.
///
/// Descriptors match on exact `(type, name)`, URLs via [`url_match`],
/// shorthands by direct key lookup.
pub fn find_in_listing<'a>(
    models: &'a BTreeMap<String, Model>,
    reference: &ModelRef,
) -> Option<&'a Model> {
    match reference {
        ModelRef::Descriptor(d) => models
            .values()
            .find(|m| m.model_type == d.model_type && m.name == d.name),
        ModelRef::Url(url) => models.values().find(|m| url_match(&m.url, url)),
        ModelRef::Shorthand(s) => models.get(s.as_str()),
    }
}

/// A `recordUntil` value before normalization to epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordUntil {
    /// An absolute instant.
    At(DateTime<Utc>),
    /// A small hour count, interpreted relative to "now".
    Hours(i64),
    /// An absolute epoch-millisecond timestamp.
    Millis(i64),
}

/// Raw integers below this are read as hours-from-now rather than as
/// epoch milliseconds.
const HOURS_CUTOFF: i64 = 10_000;

impl RecordUntil {
    /// Interpret a raw integer the way the server's clients always
    /// have: small values are hours from now, anything else is an
    /// absolute epoch-millisecond timestamp.
    pub fn from_raw(value: i64) -> Self {
        if value < HOURS_CUTOFF {
            Self::Hours(value)
        } else {
            Self::Millis(value)
        }
    }

    /// Normalize to an absolute epoch-millisecond timestamp.
    pub fn to_millis(self, now: DateTime<Utc>) -> i64 {
        match self {
            Self::At(instant) => instant.timestamp_millis(),
            Self::Hours(hours) => now.timestamp_millis() + hours * 3_600_000,
            Self::Millis(millis) => millis,
        }
    }
}

/// A partial set of model property overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelProps {
    pub priority: Option<i64>,
    pub marked_for_later: Option<bool>,
    pub suspended: Option<bool>,
    pub record_until: Option<RecordUntil>,
    pub record_until_subsequent_action: Option<String>,
}

impl ModelProps {
    /// Resolve the set properties to their wire keys and values,
    /// normalizing `recordUntil` against `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut map = Map::new();
        if let Some(priority) = self.priority {
            map.insert("priority".into(), priority.into());
        }
        if let Some(later) = self.marked_for_later {
            map.insert("markedForLater".into(), later.into());
        }
        if let Some(suspended) = self.suspended {
            map.insert("suspended".into(), suspended.into());
        }
        if let Some(record_until) = self.record_until {
            map.insert("recordUntil".into(), record_until.to_millis(now).into());
        }
        if let Some(action) = &self.record_until_subsequent_action {
            map.insert("recordUntilSubsequentAction".into(), action.clone().into());
        }
        map
    }
}

/// Overlay resolved properties onto a descriptor unconditionally,
/// returning a new descriptor. Used when adding by full descriptor, so
/// partial property sets never reach the server.
pub fn apply_props(model: &Model, props: &Map<String, Value>) -> Result<Model, ClientError> {
    let mut map = to_wire_map(model)?;
    for (key, value) in props {
        map.insert(key.clone(), value.clone());
    }
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Merge resolved properties onto a descriptor, keeping only keys the
/// descriptor already carries. Returns the new descriptor and the list
/// of ignored keys.
pub fn merge_existing_props(
    model: &Model,
    props: &Map<String, Value>,
) -> Result<(Model, Vec<String>), ClientError> {
    let mut map = to_wire_map(model)?;
    let mut ignored = Vec::new();
    for (key, value) in props {
        if map.contains_key(key) {
            map.insert(key.clone(), value.clone());
        } else {
            ignored.push(key.clone());
        }
    }
    Ok((serde_json::from_value(Value::Object(map))?, ignored))
}

fn to_wire_map(model: &Model) -> Result<Map<String, Value>, ClientError> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map),
        _ => unreachable!("a model always serializes to a JSON object"),
    }
}
