//! Chunk entity: the unit that gets indexed and returned.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VecbaseError};

fn default_language() -> String {
    "en".to_string()
}

/// Metadata for a chunk.
///
/// Known fields are typed members; free-form extension tags live in `extra`
/// and participate in equality filtering by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Origin of the chunk. Required, non-empty.
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Always equal to the chunk text length in characters; maintained by
    /// the store.
    #[serde(default)]
    pub char_count: usize,
    /// Extension tags: free-form key/value pairs filterable by equality.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl ChunkMetadata {
    /// New metadata record with both timestamps set to now.
    pub fn new(source: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            source: source.into(),
            created_at: now,
            updated_at: now,
            author: None,
            tags: Vec::new(),
            language: default_language(),
            char_count: 0,
            extra: HashMap::new(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(VecbaseError::validation("chunk source must not be empty"));
        }
        Ok(())
    }

    /// Equality-filter semantics: known fields match by value, `tags` by
    /// membership, any other key by equality on the `extra` side map.
    pub fn matches(&self, key: &str, value: &str) -> bool {
        match key {
            "source" => self.source == value,
            "author" => self.author.as_deref() == Some(value),
            "language" => self.language == value,
            "tags" => self.tags.iter().any(|t| t == value),
            other => self.extra.get(other).map_or(false, |v| v == value),
        }
    }
}

/// Complete chunk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(
        document_id: Uuid,
        text: String,
        embedding: Vec<f32>,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            text,
            embedding,
            metadata,
        }
    }
}

/// Payload for creating a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkCreate {
    pub document_id: Uuid,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Payload for updating a chunk. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChunkMetadata>,
}

impl ChunkUpdate {
    /// True when the update carries no changes at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.embedding.is_none() && self.metadata.is_none()
    }
}
