//! Errors raised while listing and enriching spaces

use crate::synapse::TransportError;
use std::fmt;
use thiserror::Error;

/// A payload that did not match the expected shape
#[derive(Debug, Error)]
#[error("malformed {payload} payload")]
pub struct DecodeError {
    payload: &'static str,
    #[source]
    source: serde_json::Error,
}

impl DecodeError {
    pub(crate) fn listing(source: serde_json::Error) -> Self {
        Self {
            payload: "room directory",
            source,
        }
    }

    pub(crate) fn state(source: serde_json::Error) -> Self {
        Self {
            payload: "room state",
            source,
        }
    }
}

/// Why an enrichment was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    DeadlineExceeded,
    SiblingFailed,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
            Self::SiblingFailed => write!(f, "another space failed"),
        }
    }
}

/// Coarse classification used for logging and exit handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Decode,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Decode => write!(f, "decode"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Failure of a listing + enrichment run. `space_id` is `None` for the listing phase.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("failed to fetch {}", target(.space_id.as_deref()))]
    Transport {
        space_id: Option<String>,
        #[source]
        source: TransportError,
    },

    #[error("failed to decode {}", target(.space_id.as_deref()))]
    Decode {
        space_id: Option<String>,
        #[source]
        source: DecodeError,
    },

    #[error("fetching {} was cancelled: {reason}", target(.space_id.as_deref()))]
    Cancelled {
        space_id: Option<String>,
        reason: CancelReason,
    },
}

fn target(space_id: Option<&str>) -> String {
    match space_id {
        Some(id) => format!("state of space {}", id),
        None => "space listing".to_string(),
    }
}

impl EnrichError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { source, .. } if source.is_deadline_exceeded() => {
                ErrorKind::Cancelled
            }
            Self::Transport { .. } => ErrorKind::Network,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub fn space_id(&self) -> Option<&str> {
        match self {
            Self::Transport { space_id, .. }
            | Self::Decode { space_id, .. }
            | Self::Cancelled { space_id, .. } => space_id.as_deref(),
        }
    }

    /// True when this task only stopped because another space failed
    pub fn is_sibling_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Cancelled {
                reason: CancelReason::SiblingFailed,
                ..
            }
        )
    }

    /// The underlying transport failure, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}
