//! Document entity: a logical grouping of chunks inside a library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VecbaseError};

fn default_file_type() -> String {
    "text".to_string()
}

/// Metadata for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "default_file_type")]
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentMetadata {
    /// New metadata record with both timestamps set to now.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            description: None,
            author: None,
            tags: Vec::new(),
            category: None,
            file_type: default_file_type(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(VecbaseError::validation("document title must not be empty"));
        }
        Ok(())
    }
}

/// Complete document model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub library_id: Uuid,
    pub metadata: DocumentMetadata,
    /// Chunks in creation order.
    #[serde(default)]
    pub chunk_ids: Vec<Uuid>,
}

impl Document {
    pub fn new(library_id: Uuid, metadata: DocumentMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            library_id,
            metadata,
            chunk_ids: Vec::new(),
        }
    }
}

/// Payload for creating a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCreate {
    pub library_id: Uuid,
    pub metadata: DocumentMetadata,
}

/// Payload for updating a document. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DocumentMetadata>,
}
