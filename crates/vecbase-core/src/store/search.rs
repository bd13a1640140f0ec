//! Search orchestration.
//!
//! Validates the query, takes the library read lock, queries the index with
//! the metadata predicate and oversampling, applies the similarity floor,
//! and hydrates survivors with their chunk and owning document. Because
//! chunks and index sit under the same lock, the hydrated entities always
//! match the index that ranked them.

use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, VecbaseError};
use crate::index::CandidateFilter;
use crate::types::{SearchQuery, SearchResult};
use crate::vecmath;

use super::{ensure_live, VectorStore};

impl VectorStore {
    /// Ranked top-k search over one library's index.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the library does not exist.
    /// - `NotIndexed` if no current index exists (never built, or
    ///   invalidated by a concurrent mutation).
    /// - `DimensionMismatch` if the query dimension differs from the
    ///   library's fixed dimension.
    /// - `Validation` for out-of-range `k`, a bad threshold, or a
    ///   non-finite embedding.
    pub fn search(&self, library_id: Uuid, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        query.validate(&self.config.limits)?;

        let cell = self.route_library(library_id)?;
        let state = cell.state.read();
        ensure_live(&state, library_id)?;

        // Checked under the lock: a mutation may have invalidated the index
        // between routing and acquisition.
        let built = match &state.index {
            Some(built) if state.record.is_indexed => built,
            _ => return Err(VecbaseError::NotIndexed { library_id }),
        };

        // A library that was indexed while empty has no fixed dimension and
        // nothing to rank.
        let Some(dimension) = state.record.embedding_dimension else {
            return Ok(Vec::new());
        };
        vecmath::ensure_dimension(dimension, query.embedding.len())?;

        let fetch = query.k.saturating_mul(built.index.oversample());
        let chunks = &state.chunks;
        let predicate;
        let filter: Option<&CandidateFilter<'_>> = match &query.metadata_filters {
            Some(filters) if !filters.is_empty() => {
                predicate = move |id: Uuid| {
                    chunks.get(&id).map_or(false, |chunk| {
                        filters
                            .iter()
                            .all(|(key, value)| chunk.metadata.matches(key, value))
                    })
                };
                Some(&predicate)
            }
            _ => None,
        };

        let hits = built.index.search(&query.embedding, fetch, filter);
        debug!(
            library = %library_id,
            k = query.k,
            fetch,
            hits = hits.len(),
            index_type = %built.index.index_type(),
            seed = built.options.seed,
            "index query complete"
        );

        let mut results = Vec::with_capacity(query.k.min(hits.len()));
        for (chunk_id, score) in hits {
            if let Some(threshold) = query.similarity_threshold {
                if score < threshold {
                    continue;
                }
            }
            let chunk = state
                .chunks
                .get(&chunk_id)
                .ok_or_else(|| VecbaseError::internal("index returned unknown chunk id"))?;
            let document = state
                .documents
                .get(&chunk.document_id)
                .ok_or_else(|| VecbaseError::internal("chunk without owning document"))?;
            results.push(SearchResult {
                chunk: chunk.clone(),
                document: document.clone(),
                similarity_score: score,
            });
            if results.len() == query.k {
                break;
            }
        }
        Ok(results)
    }
}
