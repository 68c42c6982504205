use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fetch behind a collection load rejected.
///
/// There is deliberately one kind only; `message` is for logs, not for
/// branching on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("collection load failed: {message}")]
pub struct LoadFailure {
    pub message: String,
}

impl LoadFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadTransition {
    Start,
    Resolve,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {transition:?} a load that is {from}")]
pub struct TransitionError {
    pub transition: LoadTransition,
    pub from: crate::protocol::LoadPhase,
}
