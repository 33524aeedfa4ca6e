use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slash-separated path to a collection, e.g. `rooms` or `rooms/r1/chats`.
///
/// Segments alternate collection / document / collection, so a valid path
/// always has an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Top-level collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(FeedError::Config(format!(
                "collection path '{}' has an empty segment",
                path
            )));
        }
        if segments.len() % 2 == 0 {
            return Err(FeedError::Config(format!(
                "'{}' names a document, not a collection",
                path
            )));
        }

        Ok(Self { segments })
    }

    /// Sub-collection under one of this collection's documents
    pub fn child(&self, doc_id: impl Into<String>, collection: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(doc_id.into());
        segments.push(collection.into());
        Self { segments }
    }

    /// Name of the innermost collection
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Parent collection and document id for a sub-collection
    pub fn parent(&self) -> Option<(CollectionPath, &str)> {
        if self.segments.len() < 3 {
            return None;
        }
        let n = self.segments.len();
        let parent = CollectionPath {
            segments: self.segments[..n - 2].to_vec(),
        };
        Some((parent, self.segments[n - 2].as_str()))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => f.write_str("asc"),
            Direction::Descending => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A watched query: collection plus optional ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub collection: CollectionPath,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(collection: CollectionPath) -> Self {
        Self {
            collection,
            order_by: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Logical scope key; at most one live subscription per scope
    pub fn scope(&self) -> String {
        match &self.order_by {
            Some(order) => format!("{} by {} {}", self.collection, order.field, order.direction),
            None => self.collection.to_string(),
        }
    }
}
