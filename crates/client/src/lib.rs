//! Client library for the ctbrec recording-server HTTP+JSON control API.
//!
//! Provides an authenticated, request-signing session to one server
//! instance with typed operations for models, model-groups, recordings,
//! settings, and server control. Convenience inputs (URLs, `Site:Name`
//! strings, or full descriptors) are normalized into the server's
//! expected request shapes, and the server's success/fail envelope is
//! unwrapped into results or errors.

pub mod client;
pub mod envelope;
pub mod error;
pub mod group;
pub mod model;
pub mod notice;
pub mod recording;
pub mod settings;
pub mod signing;
pub mod status;
pub mod summary;

pub use client::{ClientConfig, RecClient, SettingsUpdate};
pub use error::ClientError;
pub use group::ModelGroup;
pub use model::{Model, ModelProps, ModelRef, RecordUntil};
pub use notice::{Noted, Notice};
pub use recording::{Recording, RecordingStatus};
pub use settings::Setting;
pub use status::ModelStatus;
pub use summary::{SpaceStats, Summary};
