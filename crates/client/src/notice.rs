//! Structured non-fatal diagnostics.
//!
//! Conditions that degrade gracefully (ignored property keys, unknown
//! setting keys, per-item batch failures) are reported as [`Notice`]
//! values attached to the primary result via [`Noted`], so callers can
//! log, ignore, or escalate them. Each notice is also logged through
//! `tracing::warn!` when it is recorded.

use std::fmt;

/// A non-fatal diagnostic produced while executing a client operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A settings update named a key the server does not know.
    UnknownSettingKey { key: String },
    /// Property keys absent from the target descriptor were dropped
    /// from a model update.
    IgnoredProperties { keys: Vec<String> },
    /// A model update had no valid overlapping keys and was skipped.
    NothingToUpdate { reference: String },
    /// A model in a batch add could not be added.
    AddFailed { reference: String, reason: String },
    /// A model was added but could not be matched back on the server.
    AddedButUnmatched { reference: String },
    /// A model in a batch removal could not be removed.
    RemoveFailed { reference: String, reason: String },
}

impl Notice {
    /// Log the notice and hand it back for accumulation.
    pub(crate) fn emit(self) -> Self {
        tracing::warn!("{self}");
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UnknownSettingKey { key } => {
                write!(f, "{key} is not a valid settings key and will be ignored")
            }
            Notice::IgnoredProperties { keys } => {
                write!(f, "invalid properties {} will be ignored", keys.join(","))
            }
            Notice::NothingToUpdate { reference } => {
                write!(f, "no valid properties to update for {reference}")
            }
            Notice::AddFailed { reference, reason } => {
                write!(f, "unable to add {reference} to server: {reason}")
            }
            Notice::AddedButUnmatched { reference } => {
                write!(f, "{reference} added but could not be matched on server")
            }
            Notice::RemoveFailed { reference, reason } => {
                write!(f, "unable to remove {reference} from server: {reason}")
            }
        }
    }
}

/// A primary result together with the non-fatal notices recorded while
/// producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Noted<T> {
    /// The operation's result value.
    pub value: T,
    /// Non-fatal diagnostics, in the order they were recorded.
    pub notices: Vec<Notice>,
}

impl<T> Noted<T> {
    /// Wrap a value that produced no notices.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            notices: Vec::new(),
        }
    }
}
