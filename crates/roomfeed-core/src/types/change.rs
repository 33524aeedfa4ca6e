use crate::error::{FeedError, Result};
use crate::types::document::{Document, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of mutation a change event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "added" => Ok(ChangeKind::Added),
            "modified" => Ok(ChangeKind::Modified),
            "removed" => Ok(ChangeKind::Removed),
            other => Err(FeedError::ProtocolViolation(format!(
                "unrecognized change kind '{}'",
                other
            ))),
        }
    }
}

/// A change notification as delivered by a change source.
///
/// The kind stays a plain string until it is normalized, so that a source
/// sending something other than added/modified/removed can be reported
/// instead of failing somewhere inside deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChange {
    pub kind: String,
    pub document: Document,
}

impl RawChange {
    pub fn new(kind: ChangeKind, document: Document) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            document,
        }
    }

    pub fn added(document: Document) -> Self {
        Self::new(ChangeKind::Added, document)
    }

    pub fn modified(document: Document) -> Self {
        Self::new(ChangeKind::Modified, document)
    }

    pub fn removed(document: Document) -> Self {
        Self::new(ChangeKind::Removed, document)
    }
}

/// One delivery from a change source, in source order
pub type ChangeBatch = Vec<RawChange>;

/// Canonical change record: id promoted out of the payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub kind: ChangeKind,
    pub payload: Fields,
}

impl Record {
    /// Rebuild the document this record describes.
    pub fn into_document(self) -> Document {
        Document {
            id: self.id,
            fields: self.payload,
        }
    }
}

/// A typed change ready to be applied to a projection
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    Added(T),
    Modified(T),
    Removed(String),
}

impl<T> ChangeEvent<T> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Added(_) => ChangeKind::Added,
            ChangeEvent::Modified(_) => ChangeKind::Modified,
            ChangeEvent::Removed(_) => ChangeKind::Removed,
        }
    }
}
