//! Library entity: the scope of a single ANN index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VecbaseError};
use crate::index::IndexType;

/// Metadata for a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LibraryMetadata {
    /// New metadata record with both timestamps set to now.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            owner: None,
            tags: Vec::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VecbaseError::validation("library name must not be empty"));
        }
        Ok(())
    }
}

/// Complete library model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: Uuid,
    pub metadata: LibraryMetadata,
    /// Documents in creation order.
    #[serde(default)]
    pub document_ids: Vec<Uuid>,
    /// True iff an index instance exists and no chunk mutation happened since
    /// its construction.
    #[serde(default)]
    pub is_indexed: bool,
    /// Fixed on the first chunk ever added, never unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dimension: Option<usize>,
    /// Algorithm of the most recent build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<DateTime<Utc>>,
}

impl Library {
    pub fn new(metadata: LibraryMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata,
            document_ids: Vec::new(),
            is_indexed: false,
            embedding_dimension: None,
            index_type: None,
            last_indexed: None,
        }
    }
}

/// Payload for creating a library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryCreate {
    pub metadata: LibraryMetadata,
}

/// Payload for updating a library. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LibraryMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_library_starts_unindexed() {
        let lib = Library::new(LibraryMetadata::new("docs"));
        assert!(!lib.is_indexed);
        assert!(lib.document_ids.is_empty());
        assert!(lib.embedding_dimension.is_none());
        assert!(lib.index_type.is_none());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(LibraryMetadata::new("  ").validate().is_err());
        assert!(LibraryMetadata::new("docs").validate().is_ok());
    }

    #[test]
    fn serialization_round_trip() {
        let mut lib = Library::new(LibraryMetadata::new("docs"));
        lib.metadata.tags = vec!["prod".to_string()];
        lib.embedding_dimension = Some(384);
        lib.index_type = Some(IndexType::Flat);

        let json = serde_json::to_string(&lib).unwrap();
        let restored: Library = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, lib);
    }
}
