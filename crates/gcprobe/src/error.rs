use std::error::Error;
use std::fmt;

use gcprobe_types::HandleId;

/// Caller-facing failures. Traversal and liveness problems never show up
/// here; they are recovered where they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    SnapshotOutOfRange {
        index: usize,
        len: usize,
    },
    HandleNotFound {
        id: HandleId,
    },
    FeatureUnavailable {
        feature: &'static str,
        reason: String,
    },
    UnknownGeneration {
        generation: usize,
        generations: usize,
    },
    ThresholdArity {
        expected: usize,
        got: usize,
    },
    /// Monitoring needs a non-zero interval between samples.
    ZeroInterval,
}

impl ProbeError {
    pub(crate) fn unavailable(feature: &'static str, reason: impl Into<String>) -> Self {
        Self::FeatureUnavailable {
            feature,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SnapshotOutOfRange { index, len } => {
                write!(f, "snapshot index {index} out of range (have {len} snapshots)")
            }
            Self::HandleNotFound { id } => write!(f, "no tracked handle with id {id}"),
            Self::FeatureUnavailable { feature, reason } => {
                write!(f, "{feature} is unavailable: {reason}")
            }
            Self::UnknownGeneration {
                generation,
                generations,
            } => write!(
                f,
                "generation {generation} does not exist (collector has {generations} generations)"
            ),
            Self::ThresholdArity { expected, got } => {
                write!(f, "expected {expected} thresholds, got {got}")
            }
            Self::ZeroInterval => write!(f, "monitoring interval must be greater than zero"),
        }
    }
}

impl Error for ProbeError {}

/// A node refused to enumerate its outgoing references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionDenied {
    pub reason: String,
}

impl IntrospectionDenied {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for IntrospectionDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "introspection denied: {}", self.reason)
    }
}

impl Error for IntrospectionDenied {}
