//! The authenticated remote-control client.
//!
//! [`RecClient`] holds one session to one server instance: base URL,
//! optional basic-auth credentials, and the HMAC signing key fetched at
//! connect time. Every operation signs its payload, issues one or more
//! sequential requests, and translates the server's envelope into a
//! typed result or a [`ClientError`].

use std::collections::BTreeMap;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::envelope;
use crate::error::ClientError;
use crate::group::ModelGroup;
use crate::model::{self, Model, ModelProps, ModelRef};
use crate::notice::{Noted, Notice};
use crate::recording::Recording;
use crate::settings::{self, Setting};
use crate::signing;
use crate::status::{self, ModelStatus};
use crate::summary::{self, SpaceStats, Summary};

/// Wire-level action names for the `/rec` endpoint.
mod actions {
    pub const LIST: &str = "list";
    pub const LIST_ONLINE: &str = "listOnline";
    pub const START: &str = "start";
    pub const START_BY_NAME: &str = "startByName";
    pub const START_BY_URL: &str = "startByUrl";
    pub const STOP: &str = "stop";
    pub const LIST_MODEL_GROUPS: &str = "listModelGroups";
    pub const SAVE_MODEL_GROUP: &str = "saveModelGroup";
    pub const DELETE_MODEL_GROUP: &str = "deleteModelGroup";
    pub const RECORDINGS: &str = "recordings";
    pub const DELETE: &str = "delete";
    pub const PIN: &str = "pin";
    pub const UNPIN: &str = "unpin";
    pub const SET_NOTE: &str = "setNote";
    pub const RERUN_POST_PROCESSING: &str = "rerunPostProcessing";
    pub const SPACE: &str = "space";
    pub const PAUSE_RECORDER: &str = "pauseRecorder";
    pub const RESUME_RECORDER: &str = "resumeRecorder";
}

const REC_PATH: &str = "/rec";
const CONFIG_PATH: &str = "/config";
const HMAC_PATH: &str = "/secured/hmac";
const HMAC_HEADER: &str = "CTBREC-HMAC";

/// Connection parameters for [`RecClient::connect`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server, e.g. `https://localhost:8443`.
    pub server_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Verify the server's TLS certificate. Off by default; these
    /// servers typically run with self-signed certificates.
    pub verify_tls: bool,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            username: None,
            password: None,
            verify_tls: false,
        }
    }
}

/// Input to [`RecClient::update_settings`].
#[derive(Debug, Clone)]
pub enum SettingsUpdate {
    /// Partial `key -> value` mapping, merged onto the current settings
    /// list (unknown keys are dropped with a notice).
    Partial(Map<String, Value>),
    /// A complete settings list, sent verbatim.
    Replace(Vec<Setting>),
}

/// Client for one recording-server instance.
///
/// Not designed for concurrent use by multiple callers; every
/// operation issues its remote calls sequentially.
pub struct RecClient {
    http: reqwest::Client,
    server_url: String,
    auth: Option<(String, Option<String>)>,
    hmac_key: Vec<u8>,
    initial_settings: Vec<Setting>,
    initial_models: BTreeMap<String, Model>,
    initial_model_groups: BTreeMap<String, ModelGroup>,
}

impl RecClient {
    /// Establish a session: fetch the HMAC signing key (falling back to
    /// an empty key when the server exposes none) and capture baseline
    /// snapshots of settings, models, and model-groups.
    ///
    /// The snapshots are kept for caller-side backup and diagnostics
    /// only; they are never re-applied. Any transport failure here is
    /// fatal to construction.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        let auth = if config.username.is_some() || config.password.is_some() {
            Some((config.username.unwrap_or_default(), config.password))
        } else {
            None
        };

        let mut client = Self {
            http,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            auth,
            hmac_key: Vec::new(),
            initial_settings: Vec::new(),
            initial_models: BTreeMap::new(),
            initial_model_groups: BTreeMap::new(),
        };
        client.hmac_key = client.fetch_hmac_key().await?;
        client.initial_settings = client.get_settings().await?;
        client.initial_models = client.get_models(false).await?;
        client.initial_model_groups = client.get_model_groups().await?;
        Ok(client)
    }

    // ---- model operations ----

    /// List all models on the server (or only the currently online ones),
    /// keyed by their `Site:Name` id.
    pub async fn get_models(&self, online: bool) -> Result<BTreeMap<String, Model>, ClientError> {
        let action = if online {
            actions::LIST_ONLINE
        } else {
            actions::LIST
        };
        let body = self
            .send_request(REC_PATH, Some(&json!({"action": action})))
            .await?;
        let models: Vec<Model> = take_field(body, "models")?;
        Ok(index_models(models))
    }

    /// Derive one status per model (`offline`, `online`, `recording`,
    /// `later`, `paused`) from the current server state.
    pub async fn get_model_status(&self) -> Result<BTreeMap<String, ModelStatus>, ClientError> {
        let models = self.get_models(false).await?;
        let online = self.get_models(true).await?;
        let recordings = self.get_recordings().await?;
        Ok(status::derive_statuses(&models, &online, &recordings))
    }

    /// Resolve a model reference against the current server listing.
    pub async fn find_model(&self, reference: &ModelRef) -> Result<Model, ClientError> {
        let models = self.get_models(false).await?;
        model::find_in_listing(&models, reference)
            .cloned()
            .ok_or_else(|| {
                ClientError::NotFound("requested model could not be found on server".to_string())
            })
    }

    /// Add a model to the server, optionally applying property
    /// overrides, and return the model as re-read from the server.
    ///
    /// Full descriptors carry the overrides in the initial `start`
    /// request. `startByUrl`/`startByName` cannot carry auxiliary
    /// properties, so for URL and shorthand references the overrides go
    /// out as a follow-up update once the server has registered the
    /// model.
    pub async fn add_model(
        &self,
        reference: &ModelRef,
        props: Option<&ModelProps>,
    ) -> Result<Noted<Model>, ClientError> {
        let resolved = props.map(|p| p.resolve(Utc::now()));
        let data = match reference {
            ModelRef::Descriptor(model) => {
                let model = match &resolved {
                    Some(overrides) => model::apply_props(model, overrides)?,
                    None => model.clone(),
                };
                json!({"action": actions::START, "model": model})
            }
            ModelRef::Url(url) => json!({
                "action": actions::START_BY_URL,
                "model": {"type": null, "name": "", "url": url},
            }),
            ModelRef::Shorthand(name) => json!({
                "action": actions::START_BY_NAME,
                "model": {"type": null, "name": "", "url": name},
            }),
        };
        self.send_request(REC_PATH, Some(&data)).await?;
        // The server is the source of truth, not the request payload.
        let model = self.find_model(reference).await?;
        if let Some(props) = props {
            if !matches!(reference, ModelRef::Descriptor(_)) {
                let updated = self
                    .update_model(&ModelRef::Descriptor(model.clone()), props)
                    .await?;
                return Ok(Noted {
                    value: updated.value.unwrap_or(model),
                    notices: updated.notices,
                });
            }
        }
        Ok(Noted::clean(model))
    }

    /// Add a batch of raw model references, absorbing per-item failures
    /// into notices. Returns the successfully added subset.
    pub async fn add_models(
        &self,
        models: &[Value],
        props: Option<&ModelProps>,
    ) -> Noted<Vec<Model>> {
        let mut added = Vec::new();
        let mut notices = Vec::new();
        for raw in models {
            let reference = match ModelRef::parse(raw) {
                Ok(reference) => reference,
                Err(error) => {
                    notices.push(
                        Notice::AddFailed {
                            reference: raw.to_string(),
                            reason: error.to_string(),
                        }
                        .emit(),
                    );
                    continue;
                }
            };
            match self.add_model(&reference, props).await {
                Ok(mut noted) => {
                    notices.append(&mut noted.notices);
                    added.push(noted.value);
                }
                Err(ClientError::NotFound(_)) => {
                    notices.push(
                        Notice::AddedButUnmatched {
                            reference: reference.to_string(),
                        }
                        .emit(),
                    );
                }
                Err(error) => {
                    notices.push(
                        Notice::AddFailed {
                            reference: reference.to_string(),
                            reason: error.to_string(),
                        }
                        .emit(),
                    );
                }
            }
        }
        Noted {
            value: added,
            notices,
        }
    }

    /// Update properties of an existing model and return it as re-read
    /// from the server.
    ///
    /// Property keys absent from the target descriptor are dropped with
    /// a notice; when no valid keys remain the update is skipped and
    /// `None` is returned instead of an error.
    pub async fn update_model(
        &self,
        reference: &ModelRef,
        props: &ModelProps,
    ) -> Result<Noted<Option<Model>>, ClientError> {
        let resolved = props.resolve(Utc::now());
        let current = match reference {
            ModelRef::Descriptor(model) => model.clone(),
            _ => self.find_model(reference).await?,
        };
        let (merged, ignored) = model::merge_existing_props(&current, &resolved)?;
        let applied = resolved.len() - ignored.len();
        let mut notices = Vec::new();
        if !ignored.is_empty() {
            notices.push(Notice::IgnoredProperties { keys: ignored }.emit());
        }
        if applied == 0 {
            notices.push(
                Notice::NothingToUpdate {
                    reference: reference.to_string(),
                }
                .emit(),
            );
            return Ok(Noted {
                value: None,
                notices,
            });
        }
        self.send_request(
            REC_PATH,
            Some(&json!({"action": actions::START, "model": &merged})),
        )
        .await?;
        let refreshed = self.find_model(&ModelRef::Descriptor(merged)).await?;
        Ok(Noted {
            value: Some(refreshed),
            notices,
        })
    }

    /// Remove a model from the server's recording list.
    pub async fn remove_model(&self, reference: &ModelRef) -> Result<(), ClientError> {
        let model = self.find_model(reference).await?;
        self.send_request(
            REC_PATH,
            Some(&json!({"action": actions::STOP, "model": model})),
        )
        .await?;
        Ok(())
    }

    /// Remove a batch of raw model references, absorbing per-item
    /// failures into notices. Returns the references that failed.
    pub async fn remove_models(&self, models: &[Value]) -> Noted<Vec<Value>> {
        let mut failed = Vec::new();
        let mut notices = Vec::new();
        for raw in models {
            let result = match ModelRef::parse(raw) {
                Ok(reference) => self.remove_model(&reference).await,
                Err(error) => Err(error),
            };
            if let Err(error) = result {
                notices.push(
                    Notice::RemoveFailed {
                        reference: raw.to_string(),
                        reason: error.to_string(),
                    }
                    .emit(),
                );
                failed.push(raw.clone());
            }
        }
        Noted {
            value: failed,
            notices,
        }
    }

    // ---- model-group operations ----

    /// List all model groups, keyed by name.
    pub async fn get_model_groups(&self) -> Result<BTreeMap<String, ModelGroup>, ClientError> {
        let body = self
            .send_request(REC_PATH, Some(&json!({"action": actions::LIST_MODEL_GROUPS})))
            .await?;
        let groups: Vec<ModelGroup> = take_field(body, "groups")?;
        Ok(groups.into_iter().map(|g| (g.name.clone(), g)).collect())
    }

    /// Fetch one model group by name.
    pub async fn find_model_group(&self, name: &str) -> Result<ModelGroup, ClientError> {
        self.get_model_groups().await?.remove(name).ok_or_else(|| {
            ClientError::NotFound(format!("model group {name} could not be found on the server"))
        })
    }

    /// Create a new model group. The name must not already be in use;
    /// a duplicate is rejected before any mutating call is made.
    pub async fn create_model_group(
        &self,
        name: &str,
        members: &[ModelRef],
    ) -> Result<ModelGroup, ClientError> {
        let groups = self.get_model_groups().await?;
        if groups.contains_key(name) {
            return Err(ClientError::AlreadyExists(format!(
                "model group {name} already exists"
            )));
        }
        let group = ModelGroup::new(name, member_urls(members));
        self.save_model_group(&group).await?;
        self.find_model_group(name).await
    }

    /// Save a model group, overwriting any existing server copy with
    /// the full group document.
    pub async fn save_model_group(&self, group: &ModelGroup) -> Result<(), ClientError> {
        let group = group.deduplicated();
        self.send_request(
            REC_PATH,
            Some(&json!({"action": actions::SAVE_MODEL_GROUP, "modelGroup": &group})),
        )
        .await?;
        Ok(())
    }

    /// Delete a model group by name.
    pub async fn delete_model_group(&self, name: &str) -> Result<(), ClientError> {
        let group = self.find_model_group(name).await?;
        self.send_request(
            REC_PATH,
            Some(&json!({"action": actions::DELETE_MODEL_GROUP, "modelGroup": &group})),
        )
        .await?;
        Ok(())
    }

    /// Add members to an existing group and return the authoritative
    /// group as re-fetched from the server.
    pub async fn add_models_to_group(
        &self,
        name: &str,
        members: &[ModelRef],
    ) -> Result<ModelGroup, ClientError> {
        let group = self.find_model_group(name).await?;
        let updated = group.with_members_added(&member_urls(members));
        self.save_model_group(&updated).await?;
        self.find_model_group(&updated.name).await
    }

    /// Remove members from an existing group and return the
    /// authoritative group as re-fetched from the server.
    pub async fn remove_models_from_group(
        &self,
        name: &str,
        members: &[ModelRef],
    ) -> Result<ModelGroup, ClientError> {
        let group = self.find_model_group(name).await?;
        let updated = group.with_members_removed(&member_urls(members));
        self.save_model_group(&updated).await?;
        self.find_model_group(&updated.name).await
    }

    // ---- recording operations ----

    /// List all recordings on the server.
    pub async fn get_recordings(&self) -> Result<Vec<Recording>, ClientError> {
        let body = self
            .send_request(REC_PATH, Some(&json!({"action": actions::RECORDINGS})))
            .await?;
        take_field(body, "recordings")
    }

    /// Permanently delete a recording on the server.
    pub async fn delete_recording(&self, recording: &Recording) -> Result<(), ClientError> {
        self.recording_action(actions::DELETE, recording).await
    }

    /// Pin a recording so it survives space reclamation.
    pub async fn pin_recording(&self, recording: &Recording) -> Result<(), ClientError> {
        self.recording_action(actions::PIN, recording).await
    }

    /// Unpin a recording.
    pub async fn unpin_recording(&self, recording: &Recording) -> Result<(), ClientError> {
        self.recording_action(actions::UNPIN, recording).await
    }

    /// Attach a note to a recording.
    pub async fn annotate_recording(
        &self,
        recording: &Recording,
        note: &str,
    ) -> Result<(), ClientError> {
        let mut recording = recording.clone();
        recording.note = Some(note.to_string());
        self.recording_action(actions::SET_NOTE, &recording).await
    }

    /// Rerun post-processing for a recording.
    pub async fn rerun_post_process(&self, recording: &Recording) -> Result<(), ClientError> {
        self.recording_action(actions::RERUN_POST_PROCESSING, recording)
            .await
    }

    // ---- settings and server control ----

    /// Fetch the current server settings list.
    pub async fn get_settings(&self) -> Result<Vec<Setting>, ClientError> {
        let body = self.send_request(CONFIG_PATH, None).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Update server settings and return the post-update authoritative
    /// list.
    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<Noted<Vec<Setting>>, ClientError> {
        let (payload, notices) = match update {
            SettingsUpdate::Partial(updates) => {
                let current = self.get_settings().await?;
                let (merged, notices) = settings::merge_settings(&current, &updates);
                (serde_json::to_value(merged)?, notices)
            }
            SettingsUpdate::Replace(list) => (serde_json::to_value(list)?, Vec::new()),
        };
        self.send_request(CONFIG_PATH, Some(&payload)).await?;
        let value = self.get_settings().await?;
        Ok(Noted { value, notices })
    }

    /// Fetch drive-space statistics.
    pub async fn get_space(&self) -> Result<SpaceStats, ClientError> {
        let body = self
            .send_request(REC_PATH, Some(&json!({"action": actions::SPACE})))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Aggregate server activity counts and space figures.
    pub async fn get_summary(&self) -> Result<Summary, ClientError> {
        let models = self.get_models(false).await?;
        let online = self.get_models(true).await?;
        let recordings = self.get_recordings().await?;
        let space = self.get_space().await?;
        Ok(summary::build_summary(
            &models,
            online.len(),
            &recordings,
            &space,
        ))
    }

    /// Suspend all recording on the server.
    pub async fn pause_recording(&self) -> Result<(), ClientError> {
        self.send_request(REC_PATH, Some(&json!({"action": actions::PAUSE_RECORDER})))
            .await?;
        Ok(())
    }

    /// Resume all recording on the server.
    pub async fn resume_recording(&self) -> Result<(), ClientError> {
        self.send_request(REC_PATH, Some(&json!({"action": actions::RESUME_RECORDER})))
            .await?;
        Ok(())
    }

    // ---- baseline snapshots (captured at connect, diagnostic only) ----

    pub fn initial_settings(&self) -> &[Setting] {
        &self.initial_settings
    }

    pub fn initial_models(&self) -> &BTreeMap<String, Model> {
        &self.initial_models
    }

    pub fn initial_model_groups(&self) -> &BTreeMap<String, ModelGroup> {
        &self.initial_model_groups
    }

    // ---- transport ----

    async fn recording_action(
        &self,
        action: &str,
        recording: &Recording,
    ) -> Result<(), ClientError> {
        self.send_request(
            REC_PATH,
            Some(&json!({"action": action, "recording": recording})),
        )
        .await?;
        Ok(())
    }

    /// Serialize the payload, sign the exact bytes going on the wire,
    /// and issue a GET (no payload) or POST. The parsed envelope is
    /// unwrapped into the payload value.
    async fn send_request(
        &self,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let body = match payload {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };
        let digest = signing::sign(&self.hmac_key, body.as_bytes());
        let builder = match payload {
            Some(_) => self
                .http
                .post(self.url(path))
                .header(CONTENT_TYPE, "application/json")
                .body(body),
            None => self.http.get(self.url(path)),
        };
        let response = self
            .apply_auth(builder.header(HMAC_HEADER, digest))
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        envelope::parse_body(
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            &text,
        )
    }

    /// Fetch the signing key from `/secured/hmac`. Servers without a
    /// secret answer non-200 or with an empty body; in that case
    /// requests are signed with an empty key.
    async fn fetch_hmac_key(&self) -> Result<Vec<u8>, ClientError> {
        #[derive(Deserialize)]
        struct HmacKey {
            hmac: String,
        }

        let response = self
            .apply_auth(self.http.get(self.url(HMAC_PATH)))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::OK {
            let text = response.text().await?;
            if !text.is_empty() {
                let key: HmacKey = serde_json::from_str(&text)?;
                return Ok(key.hmac.into_bytes());
            }
        }
        tracing::warn!("server exposes no HMAC secret, signing requests with an empty key");
        Ok(Vec::new())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some((user, password)) => builder.basic_auth(user, password.as_deref()),
            None => builder,
        }
    }
}

/// Pull one payload field out of a response body.
fn take_field<T: serde::de::DeserializeOwned>(
    mut body: Value,
    field: &str,
) -> Result<T, ClientError> {
    let Some(value) = body.get_mut(field).map(Value::take) else {
        return Err(ClientError::RequestFailed {
            message: format!("response is missing the `{field}` field"),
        });
    };
    Ok(serde_json::from_value(value)?)
}

/// Index a model listing by `Site:Name` id, skipping models whose type
/// string does not follow the recognized pattern.
fn index_models(models: Vec<Model>) -> BTreeMap<String, Model> {
    let mut map = BTreeMap::new();
    for m in models {
        match model::model_id(&m) {
            Some(id) => {
                map.insert(id, m);
            }
            None => {
                tracing::warn!(name = %m.name, "model has an unrecognized type string, skipping");
            }
        }
    }
    map
}

/// Normalize group members to URL strings. Non-descriptor references
/// contribute their string form as-is.
fn member_urls(members: &[ModelRef]) -> Vec<String> {
    members
        .iter()
        .map(|m| match m {
            ModelRef::Descriptor(model) => model.url.clone(),
            ModelRef::Url(url) => url.clone(),
            ModelRef::Shorthand(s) => s.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn take_field_extracts_payload() {
        let body = json!({"status": "success", "models": [], "msg": ""});
        let models: Vec<Model> = take_field(body, "models").unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn take_field_reports_missing_payload() {
        let body = json!({"status": "success"});
        let result: Result<Vec<Model>, _> = take_field(body, "models");
        assert_matches!(result, Err(ClientError::RequestFailed { message }) => {
            assert!(message.contains("models"));
        });
    }

    #[test]
    fn listing_is_keyed_by_site_and_name() {
        let models: Vec<Model> = serde_json::from_value(json!([
            {
                "type": "ctbrec.sites.camsite.CamSiteModel",
                "name": "alice",
                "url": "https://cam.example.com/alice",
            },
            {
                "type": "not.a.recognized.Type",
                "name": "ghost",
                "url": "https://cam.example.com/ghost",
            },
        ]))
        .unwrap();
        let indexed = index_models(models);
        assert_eq!(indexed.len(), 1);
        assert!(indexed.contains_key("CamSite:alice"));
    }

    #[test]
    fn member_urls_accept_any_reference_form() {
        let descriptor: Model = serde_json::from_value(json!({
            "type": "ctbrec.sites.camsite.CamSiteModel",
            "name": "alice",
            "url": "https://cam.example.com/alice",
        }))
        .unwrap();
        let members = vec![
            ModelRef::Descriptor(descriptor),
            ModelRef::Url("https://cam.example.com/bob".to_string()),
        ];
        assert_eq!(
            member_urls(&members),
            vec![
                "https://cam.example.com/alice".to_string(),
                "https://cam.example.com/bob".to_string(),
            ]
        );
    }
}
