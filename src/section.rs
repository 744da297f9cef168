//! Per-section probe outcomes.
//!
//! Every part of a [`Snapshot`](crate::snapshot::Snapshot) is wrapped in a
//! [`Section`], so one failing probe never prevents the others from being
//! recorded. Renderers and insight rules only look inside `Present` sections.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// The outcome of probing one input source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    /// The probe produced data.
    Present(T),
    /// The expected artifact does not exist, or the probe was switched off.
    Absent,
    /// The probe failed; the message describes why.
    Errored(String),
}

impl<T> Section<T> {
    /// Maps a probe result onto a section.
    ///
    /// `Ok(None)` means the artifact was not found.
    pub fn from_result(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(data)) => Self::Present(data),
            Ok(None) => Self::Absent,
            Err(err) => Self::Errored(err.to_string()),
        }
    }

    /// Returns the data if the section is present.
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the error message of an errored section.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Errored(message) => Some(message),
            _ => None,
        }
    }

    /// Short lowercase label used in logs and reports.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Present(_) => "present",
            Self::Absent => "absent",
            Self::Errored(_) => "errored",
        }
    }
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self::Absent
    }
}
