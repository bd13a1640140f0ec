//! Search query, result, and library statistics types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{defaults, LimitsConfig};
use crate::error::{Result, VecbaseError};
use crate::index::IndexType;
use crate::vecmath;

use super::{Chunk, Document};

fn default_k() -> usize {
    defaults::DEFAULT_K
}

/// A vector search request against one library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query embedding; must match the library's fixed dimension.
    pub embedding: Vec<f32>,
    /// Neighbor count, 1..=max_k. Defaults to 10.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Equality filters over chunk metadata, all of which must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_filters: Option<HashMap<String, String>>,
    /// Drop results scoring below this floor, in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

impl SearchQuery {
    pub fn new(embedding: Vec<f32>, k: usize) -> Self {
        Self {
            embedding,
            k,
            metadata_filters: None,
            similarity_threshold: None,
        }
    }

    /// Structural validation, performed before any lock is taken.
    pub(crate) fn validate(&self, limits: &LimitsConfig) -> Result<()> {
        if self.embedding.is_empty() {
            return Err(VecbaseError::validation("query embedding must not be empty"));
        }
        if self.embedding.len() > limits.max_dimension {
            return Err(VecbaseError::validation(format!(
                "query dimension {} exceeds maximum {}",
                self.embedding.len(),
                limits.max_dimension
            )));
        }
        vecmath::ensure_finite(&self.embedding)?;
        if self.k < 1 || self.k > limits.max_k {
            return Err(VecbaseError::validation(format!(
                "k must be in 1..={}, got {}",
                limits.max_k, self.k
            )));
        }
        if let Some(threshold) = self.similarity_threshold {
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(VecbaseError::validation(format!(
                    "similarity_threshold must be in [0, 1], got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }
}

/// One ranked search hit, hydrated with its chunk and owning document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub document: Document,
    pub similarity_score: f32,
}

/// Statistics for a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_type: Option<IndexType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<DateTime<Utc>>,
    pub is_indexed: bool,
}
