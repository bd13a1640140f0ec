//! Index build and rebuild.
//!
//! A build snapshots the library's `(chunk_id, vector)` pairs in
//! deterministic order (documents in creation order, chunks in creation
//! order within each), constructs the chosen index under the library write
//! lock, and installs it atomically with the `is_indexed` flip. Builds over
//! identical snapshots with identical options produce identical indexes.

use std::time::Instant;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, VecbaseError};
use crate::index::{BuildOptions, IndexParams, IndexType, LibraryIndex};

use super::{ensure_live, BuiltIndex, VectorStore};

impl VectorStore {
    /// Build (or rebuild) the library's index with configured defaults and
    /// the configured seed.
    pub fn index_library(&self, library_id: Uuid, index_type: IndexType) -> Result<()> {
        let options = BuildOptions {
            seed: self.config.index.seed,
            params: IndexParams {
                lsh: self.config.index.lsh,
                hnsw: self.config.index.hnsw,
            },
        };
        self.index_library_with(library_id, index_type, options)
    }

    /// Build (or rebuild) the library's index with explicit per-build
    /// options. The seed is recorded with the installed index.
    ///
    /// The build holds the library write lock for its duration; concurrent
    /// searches queue behind it and observe the new index afterwards. An
    /// empty library builds an empty index and counts as indexed.
    pub fn index_library_with(
        &self,
        library_id: Uuid,
        index_type: IndexType,
        options: BuildOptions,
    ) -> Result<()> {
        let cell = self.route_library(library_id)?;
        let mut state = cell.state.write();
        ensure_live(&state, library_id)?;

        let started = Instant::now();
        let mut snapshot: Vec<(Uuid, Vec<f32>)> = Vec::with_capacity(state.chunks.len());
        for document_id in &state.record.document_ids {
            let document = state
                .documents
                .get(document_id)
                .ok_or_else(|| VecbaseError::internal("document listed but not stored"))?;
            for chunk_id in &document.chunk_ids {
                let chunk = state
                    .chunks
                    .get(chunk_id)
                    .ok_or_else(|| VecbaseError::internal("chunk listed but not stored"))?;
                snapshot.push((*chunk_id, chunk.embedding.clone()));
            }
        }

        let dimension = state.record.embedding_dimension.unwrap_or(0);
        let count = snapshot.len();
        let index = LibraryIndex::build(index_type, dimension, snapshot, &options);

        let now = Utc::now();
        state.index = Some(BuiltIndex { index, options });
        state.record.is_indexed = true;
        state.record.index_type = Some(index_type);
        state.record.last_indexed = Some(now);

        info!(
            library = %library_id,
            index_type = %index_type,
            chunks = count,
            dimension,
            seed = options.seed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "indexed library"
        );
        Ok(())
    }
}
