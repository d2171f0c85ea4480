//! Topic identifiers and the clip/transcript table

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identifier of a topic, e.g. `"phishing"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a playable clip (path or URL, opaque to the core)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipRef(String);

impl ClipRef {
    pub fn new(clip: impl Into<String>) -> Self {
        Self(clip.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClipRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A clip and the line spoken in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub clip: ClipRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// Read-only mapping from topic identifiers to clips
#[derive(Debug, Clone, Default)]
pub struct TopicTable {
    topics: HashMap<TopicId, Topic>,
}

impl TopicTable {
    pub fn new(topics: HashMap<TopicId, Topic>) -> Self {
        Self { topics }
    }

    pub fn get(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.get(id)
    }

    pub fn contains(&self, id: &TopicId) -> bool {
        self.topics.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl FromIterator<(TopicId, Topic)> for TopicTable {
    fn from_iter<I: IntoIterator<Item = (TopicId, Topic)>>(iter: I) -> Self {
        Self {
            topics: iter.into_iter().collect(),
        }
    }
}
