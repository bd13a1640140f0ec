//! Entity store: authoritative CRUD over libraries, documents, and chunks,
//! with referential integrity and the locking discipline that keeps indexes
//! consistent under mutation.
//!
//! # Locking
//!
//! Two levels, always acquired in the same order:
//!
//! 1. A store-level mutex over the [`Registry`]: the library table plus the
//!    routing maps (`document_id -> library_id`, `chunk_id -> library_id`).
//!    Held briefly, only by operations that create/delete entities or need a
//!    route lookup.
//! 2. One fair `parking_lot::RwLock` per library, guarding the library
//!    record, its documents, its chunks, and its index instance. Readers
//!    share; writers exclude; FIFO fairness prevents writer starvation.
//!
//! The registry mutex is never acquired while a library lock is held. A cell
//! removed from the registry is marked `deleted` under its write lock, so
//! operations that routed before a concurrent delete observe the tombstone
//! instead of stale state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{EntityKind, Result, VecbaseError};
use crate::index::{BuildOptions, LibraryIndex};
use crate::types::{
    Chunk, ChunkCreate, ChunkUpdate, Document, DocumentCreate, DocumentUpdate, Library,
    LibraryCreate, LibraryStats, LibraryUpdate,
};
use crate::vecmath;

mod indexing;
mod search;

/// An installed index instance plus the options that built it (the recorded
/// seed makes rebuilds reproducible).
struct BuiltIndex {
    index: LibraryIndex,
    options: BuildOptions,
}

/// Everything owned by one library, guarded by the cell's lock.
struct LibraryState {
    record: Library,
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Chunk>,
    index: Option<BuiltIndex>,
    /// Tombstone set by `delete_library` for operations that routed before
    /// the delete and lock after it.
    deleted: bool,
}

struct LibraryCell {
    state: RwLock<LibraryState>,
}

impl LibraryCell {
    fn new(record: Library) -> Self {
        Self {
            state: RwLock::new(LibraryState {
                record,
                documents: HashMap::new(),
                chunks: HashMap::new(),
                index: None,
                deleted: false,
            }),
        }
    }
}

/// The set of libraries plus cross-library routing maps, guarded by the
/// store mutex. `BTreeMap` keeps a fixed ascending-id order for operations
/// that visit several libraries.
#[derive(Default)]
struct Registry {
    libraries: BTreeMap<Uuid, Arc<LibraryCell>>,
    document_routes: HashMap<Uuid, Uuid>,
    chunk_routes: HashMap<Uuid, Uuid>,
}

/// The in-memory vector database.
///
/// All state lives in process memory; all operations are synchronous and
/// block only on lock acquisition.
pub struct VectorStore {
    config: Config,
    registry: Mutex<Registry>,
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore {
    /// New store with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// New store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration fails validation.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Mutex::new(Registry::default()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ------------------------------------------------------------------
    // Libraries
    // ------------------------------------------------------------------

    /// Create a new library. Always succeeds for valid metadata.
    pub fn create_library(&self, payload: LibraryCreate) -> Result<Library> {
        payload.metadata.validate()?;

        let mut metadata = payload.metadata;
        let now = Utc::now();
        metadata.created_at = now;
        metadata.updated_at = now;
        let record = Library::new(metadata);
        let library = record.clone();

        let mut registry = self.registry.lock();
        registry
            .libraries
            .insert(record.id, Arc::new(LibraryCell::new(record)));
        drop(registry);

        info!(library = %library.id, name = %library.metadata.name, "created library");
        Ok(library)
    }

    /// Fetch a library by id.
    pub fn get_library(&self, library_id: Uuid) -> Result<Library> {
        let cell = self.route_library(library_id)?;
        let state = cell.state.read();
        ensure_live(&state, library_id)?;
        Ok(state.record.clone())
    }

    /// Replace a library's metadata. `created_at` is preserved and
    /// `updated_at` refreshed. Does not invalidate the index.
    pub fn update_library(&self, library_id: Uuid, update: LibraryUpdate) -> Result<Library> {
        if let Some(metadata) = &update.metadata {
            metadata.validate()?;
        }

        let cell = self.route_library(library_id)?;
        let mut state = cell.state.write();
        ensure_live(&state, library_id)?;

        if let Some(mut metadata) = update.metadata {
            metadata.created_at = state.record.metadata.created_at;
            metadata.updated_at = Utc::now();
            state.record.metadata = metadata;
        }
        Ok(state.record.clone())
    }

    /// Delete a library and, by cascade, all of its documents and chunks.
    /// The cascade is atomic: it happens under the registry mutex and the
    /// library write lock together.
    pub fn delete_library(&self, library_id: Uuid) -> Result<()> {
        let mut registry = self.registry.lock();
        let cell = registry
            .libraries
            .remove(&library_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Library, library_id))?;

        let mut state = cell.state.write();
        for document_id in state.documents.keys() {
            registry.document_routes.remove(document_id);
        }
        for chunk_id in state.chunks.keys() {
            registry.chunk_routes.remove(chunk_id);
        }
        let documents = state.documents.len();
        let chunks = state.chunks.len();
        state.documents.clear();
        state.chunks.clear();
        state.record.document_ids.clear();
        state.index = None;
        state.record.is_indexed = false;
        state.deleted = true;
        drop(state);
        drop(registry);

        info!(library = %library_id, documents, chunks, "deleted library");
        Ok(())
    }

    /// All libraries, sorted by `created_at` ascending with id as tiebreak.
    pub fn list_libraries(&self) -> Vec<Library> {
        let cells: Vec<Arc<LibraryCell>> =
            self.registry.lock().libraries.values().cloned().collect();

        let mut libraries: Vec<Library> = cells
            .iter()
            .filter_map(|cell| {
                let state = cell.state.read();
                (!state.deleted).then(|| state.record.clone())
            })
            .collect();
        libraries.sort_by(|a, b| {
            a.metadata
                .created_at
                .cmp(&b.metadata.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        libraries
    }

    /// Statistics for one library.
    pub fn library_stats(&self, library_id: Uuid) -> Result<LibraryStats> {
        let cell = self.route_library(library_id)?;
        let state = cell.state.read();
        ensure_live(&state, library_id)?;

        Ok(LibraryStats {
            total_documents: state.record.document_ids.len(),
            total_chunks: state.chunks.len(),
            embedding_dimension: state.record.embedding_dimension,
            index_type: state.record.index_type,
            last_indexed: state.record.last_indexed,
            is_indexed: state.record.is_indexed,
        })
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Create a document inside a library.
    pub fn create_document(&self, payload: DocumentCreate) -> Result<Document> {
        payload.metadata.validate()?;

        let mut registry = self.registry.lock();
        let cell = registry
            .libraries
            .get(&payload.library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Library, payload.library_id))?;

        let mut state = cell.state.write();
        ensure_live(&state, payload.library_id)?;

        let mut metadata = payload.metadata;
        let now = Utc::now();
        metadata.created_at = now;
        metadata.updated_at = now;
        let document = Document::new(payload.library_id, metadata);

        registry.document_routes.insert(document.id, payload.library_id);
        state.record.document_ids.push(document.id);
        state.documents.insert(document.id, document.clone());
        drop(state);
        drop(registry);

        debug!(document = %document.id, library = %document.library_id, "created document");
        Ok(document)
    }

    /// Fetch a document by id.
    pub fn get_document(&self, document_id: Uuid) -> Result<Document> {
        let cell = self.route_document(document_id)?;
        let state = cell.state.read();
        state
            .documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, document_id))
    }

    /// Replace a document's metadata. Does not invalidate the index: the
    /// chunk set is unchanged.
    pub fn update_document(&self, document_id: Uuid, update: DocumentUpdate) -> Result<Document> {
        if let Some(metadata) = &update.metadata {
            metadata.validate()?;
        }

        let cell = self.route_document(document_id)?;
        let mut state = cell.state.write();
        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, document_id))?;

        if let Some(mut metadata) = update.metadata {
            metadata.created_at = document.metadata.created_at;
            metadata.updated_at = Utc::now();
            document.metadata = metadata;
        }
        Ok(document.clone())
    }

    /// Delete a document and all of its chunks.
    pub fn delete_document(&self, document_id: Uuid) -> Result<()> {
        let mut registry = self.registry.lock();
        let library_id = *registry
            .document_routes
            .get(&document_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, document_id))?;
        let cell = registry
            .libraries
            .get(&library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::internal("document route points at missing library"))?;

        let mut state = cell.state.write();
        let document = state
            .documents
            .remove(&document_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, document_id))?;

        for chunk_id in &document.chunk_ids {
            state.chunks.remove(chunk_id);
            registry.chunk_routes.remove(chunk_id);
        }
        registry.document_routes.remove(&document_id);
        state.record.document_ids.retain(|id| id != &document_id);
        if !document.chunk_ids.is_empty() {
            invalidate_index(&mut state);
        }
        drop(state);
        drop(registry);

        debug!(document = %document_id, library = %library_id, "deleted document");
        Ok(())
    }

    /// Documents of one library in creation order, or of every library in
    /// library listing order.
    pub fn list_documents(&self, library_id: Option<Uuid>) -> Result<Vec<Document>> {
        match library_id {
            Some(library_id) => {
                let cell = self.route_library(library_id)?;
                let state = cell.state.read();
                ensure_live(&state, library_id)?;
                collect_documents(&state)
            }
            None => {
                let mut all = Vec::new();
                for library in self.list_libraries() {
                    let cell = self.route_library(library.id)?;
                    let state = cell.state.read();
                    all.extend(collect_documents(&state)?);
                }
                Ok(all)
            }
        }
    }

    // ------------------------------------------------------------------
    // Chunks
    // ------------------------------------------------------------------

    /// Create a chunk inside a document.
    ///
    /// The first chunk ever added to a library fixes the library's embedding
    /// dimension; later chunks must match it. Any successful create
    /// invalidates the library's index before returning.
    pub fn create_chunk(&self, payload: ChunkCreate) -> Result<Chunk> {
        self.validate_chunk_payload(&payload.text, &payload.embedding)?;
        payload.metadata.validate()?;

        let mut registry = self.registry.lock();
        let library_id = *registry
            .document_routes
            .get(&payload.document_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, payload.document_id))?;
        let cell = registry
            .libraries
            .get(&library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::internal("document route points at missing library"))?;

        let mut state = cell.state.write();
        ensure_live(&state, library_id)?;
        if !state.documents.contains_key(&payload.document_id) {
            return Err(VecbaseError::not_found(EntityKind::Document, payload.document_id));
        }
        if state.chunks.len() >= self.config.limits.max_chunks_per_library {
            return Err(VecbaseError::validation(format!(
                "library {} is at its chunk capacity ({})",
                library_id, self.config.limits.max_chunks_per_library
            )));
        }

        match state.record.embedding_dimension {
            Some(dimension) => vecmath::ensure_dimension(dimension, payload.embedding.len())?,
            None => state.record.embedding_dimension = Some(payload.embedding.len()),
        }

        let now = Utc::now();
        let mut metadata = payload.metadata;
        metadata.created_at = now;
        metadata.updated_at = now;
        metadata.char_count = payload.text.chars().count();
        let chunk = Chunk::new(payload.document_id, payload.text, payload.embedding, metadata);

        registry.chunk_routes.insert(chunk.id, library_id);
        let document = state
            .documents
            .get_mut(&payload.document_id)
            .ok_or_else(|| VecbaseError::internal("document vanished under write lock"))?;
        document.chunk_ids.push(chunk.id);
        document.metadata.updated_at = now;
        state.chunks.insert(chunk.id, chunk.clone());
        invalidate_index(&mut state);
        drop(state);
        drop(registry);

        debug!(chunk = %chunk.id, document = %chunk.document_id, "created chunk");
        Ok(chunk)
    }

    /// Fetch a chunk by id.
    pub fn get_chunk(&self, chunk_id: Uuid) -> Result<Chunk> {
        let cell = self.route_chunk(chunk_id)?;
        let state = cell.state.read();
        state
            .chunks
            .get(&chunk_id)
            .cloned()
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Chunk, chunk_id))
    }

    /// Update a chunk's text, embedding, and/or metadata. Any effective
    /// change invalidates the library's index.
    pub fn update_chunk(&self, chunk_id: Uuid, update: ChunkUpdate) -> Result<Chunk> {
        if let Some(text) = &update.text {
            self.validate_chunk_text(text)?;
        }
        if let Some(embedding) = &update.embedding {
            self.validate_chunk_embedding(embedding)?;
        }
        if let Some(metadata) = &update.metadata {
            metadata.validate()?;
        }

        let cell = self.route_chunk(chunk_id)?;
        let mut state = cell.state.write();
        if let Some(embedding) = &update.embedding {
            if let Some(dimension) = state.record.embedding_dimension {
                vecmath::ensure_dimension(dimension, embedding.len())?;
            }
        }
        let changed = !update.is_empty();
        let chunk = state
            .chunks
            .get_mut(&chunk_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Chunk, chunk_id))?;

        if let Some(text) = update.text {
            chunk.text = text;
        }
        if let Some(embedding) = update.embedding {
            chunk.embedding = embedding;
        }
        if let Some(mut metadata) = update.metadata {
            metadata.created_at = chunk.metadata.created_at;
            chunk.metadata = metadata;
        }
        if changed {
            chunk.metadata.char_count = chunk.text.chars().count();
            chunk.metadata.updated_at = Utc::now();
        }
        let chunk = chunk.clone();
        if changed {
            invalidate_index(&mut state);
        }
        Ok(chunk)
    }

    /// Delete a chunk, removing the back-reference from its document.
    pub fn delete_chunk(&self, chunk_id: Uuid) -> Result<()> {
        let mut registry = self.registry.lock();
        let library_id = *registry
            .chunk_routes
            .get(&chunk_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Chunk, chunk_id))?;
        let cell = registry
            .libraries
            .get(&library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::internal("chunk route points at missing library"))?;

        let mut state = cell.state.write();
        let chunk = state
            .chunks
            .remove(&chunk_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Chunk, chunk_id))?;
        if let Some(document) = state.documents.get_mut(&chunk.document_id) {
            document.chunk_ids.retain(|id| id != &chunk_id);
        }
        registry.chunk_routes.remove(&chunk_id);
        invalidate_index(&mut state);
        drop(state);
        drop(registry);

        debug!(chunk = %chunk_id, library = %library_id, "deleted chunk");
        Ok(())
    }

    /// Chunks of one document, in `chunk_ids` creation order.
    pub fn list_chunks(&self, document_id: Uuid) -> Result<Vec<Chunk>> {
        let cell = self.route_document(document_id)?;
        let state = cell.state.read();
        let document = state
            .documents
            .get(&document_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, document_id))?;
        document
            .chunk_ids
            .iter()
            .map(|id| {
                state
                    .chunks
                    .get(id)
                    .cloned()
                    .ok_or_else(|| VecbaseError::internal("chunk listed but not stored"))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Routing & validation helpers
    // ------------------------------------------------------------------

    fn route_library(&self, library_id: Uuid) -> Result<Arc<LibraryCell>> {
        self.registry
            .lock()
            .libraries
            .get(&library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Library, library_id))
    }

    fn route_document(&self, document_id: Uuid) -> Result<Arc<LibraryCell>> {
        let registry = self.registry.lock();
        let library_id = registry
            .document_routes
            .get(&document_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Document, document_id))?;
        registry
            .libraries
            .get(library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::internal("document route points at missing library"))
    }

    fn route_chunk(&self, chunk_id: Uuid) -> Result<Arc<LibraryCell>> {
        let registry = self.registry.lock();
        let library_id = registry
            .chunk_routes
            .get(&chunk_id)
            .ok_or_else(|| VecbaseError::not_found(EntityKind::Chunk, chunk_id))?;
        registry
            .libraries
            .get(library_id)
            .cloned()
            .ok_or_else(|| VecbaseError::internal("chunk route points at missing library"))
    }

    fn validate_chunk_payload(&self, text: &str, embedding: &[f32]) -> Result<()> {
        self.validate_chunk_text(text)?;
        self.validate_chunk_embedding(embedding)
    }

    fn validate_chunk_text(&self, text: &str) -> Result<()> {
        let chars = text.chars().count();
        if chars == 0 {
            return Err(VecbaseError::validation("chunk text must not be empty"));
        }
        if chars > self.config.limits.max_text_length {
            return Err(VecbaseError::validation(format!(
                "chunk text length {} exceeds maximum {}",
                chars, self.config.limits.max_text_length
            )));
        }
        Ok(())
    }

    fn validate_chunk_embedding(&self, embedding: &[f32]) -> Result<()> {
        if embedding.is_empty() {
            return Err(VecbaseError::validation("embedding must not be empty"));
        }
        if embedding.len() > self.config.limits.max_dimension {
            return Err(VecbaseError::validation(format!(
                "embedding dimension {} exceeds maximum {}",
                embedding.len(),
                self.config.limits.max_dimension
            )));
        }
        vecmath::ensure_finite(embedding)
    }
}

/// Reject operations on a tombstoned library cell.
fn ensure_live(state: &LibraryState, library_id: Uuid) -> Result<()> {
    if state.deleted {
        return Err(VecbaseError::not_found(EntityKind::Library, library_id));
    }
    Ok(())
}

/// Drop the library's index and clear `is_indexed`, atomically with the
/// mutation that triggered it (the caller holds the write lock).
fn invalidate_index(state: &mut LibraryState) {
    if state.index.is_some() || state.record.is_indexed {
        debug!(library = %state.record.id, "index invalidated by mutation");
    }
    state.index = None;
    state.record.is_indexed = false;
}

fn collect_documents(state: &LibraryState) -> Result<Vec<Document>> {
    state
        .record
        .document_ids
        .iter()
        .map(|id| {
            state
                .documents
                .get(id)
                .cloned()
                .ok_or_else(|| VecbaseError::internal("document listed but not stored"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkMetadata, DocumentMetadata, LibraryMetadata};

    fn store_with_document() -> (VectorStore, Uuid, Uuid) {
        let store = VectorStore::new();
        let library = store
            .create_library(LibraryCreate {
                metadata: LibraryMetadata::new("lib"),
            })
            .unwrap();
        let document = store
            .create_document(DocumentCreate {
                library_id: library.id,
                metadata: DocumentMetadata::new("doc"),
            })
            .unwrap();
        (store, library.id, document.id)
    }

    fn chunk_payload(document_id: Uuid, embedding: Vec<f32>) -> ChunkCreate {
        ChunkCreate {
            document_id,
            text: "some text".to_string(),
            embedding,
            metadata: ChunkMetadata::new("test"),
        }
    }

    #[test]
    fn create_document_requires_library() {
        let store = VectorStore::new();
        let err = store
            .create_document(DocumentCreate {
                library_id: Uuid::new_v4(),
                metadata: DocumentMetadata::new("doc"),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            VecbaseError::NotFound {
                entity: EntityKind::Library,
                ..
            }
        ));
    }

    #[test]
    fn first_chunk_fixes_dimension() {
        let (store, library_id, document_id) = store_with_document();
        store
            .create_chunk(chunk_payload(document_id, vec![1.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(
            store.get_library(library_id).unwrap().embedding_dimension,
            Some(3)
        );

        let err = store
            .create_chunk(chunk_payload(document_id, vec![1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            VecbaseError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn dimension_survives_chunk_deletion() {
        let (store, library_id, document_id) = store_with_document();
        let chunk = store
            .create_chunk(chunk_payload(document_id, vec![1.0, 0.0]))
            .unwrap();
        store.delete_chunk(chunk.id).unwrap();
        assert_eq!(
            store.get_library(library_id).unwrap().embedding_dimension,
            Some(2)
        );
    }

    #[test]
    fn char_count_is_maintained() {
        let (store, _, document_id) = store_with_document();
        let chunk = store
            .create_chunk(chunk_payload(document_id, vec![1.0]))
            .unwrap();
        assert_eq!(chunk.metadata.char_count, "some text".chars().count());

        let updated = store
            .update_chunk(
                chunk.id,
                ChunkUpdate {
                    text: Some("hi".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.metadata.char_count, 2);
    }

    #[test]
    fn cascading_delete_removes_everything() {
        let (store, library_id, document_id) = store_with_document();
        let chunk = store
            .create_chunk(chunk_payload(document_id, vec![1.0, 0.0]))
            .unwrap();

        store.delete_library(library_id).unwrap();
        assert!(store.get_library(library_id).is_err());
        assert!(store.get_document(document_id).is_err());
        assert!(store.get_chunk(chunk.id).is_err());
        assert!(store.list_libraries().is_empty());
    }

    #[test]
    fn document_delete_cascades_chunks() {
        let (store, library_id, document_id) = store_with_document();
        let chunk = store
            .create_chunk(chunk_payload(document_id, vec![1.0]))
            .unwrap();

        store.delete_document(document_id).unwrap();
        assert!(store.get_chunk(chunk.id).is_err());
        assert!(store.get_document(document_id).is_err());
        let library = store.get_library(library_id).unwrap();
        assert!(library.document_ids.is_empty());
    }

    #[test]
    fn listings_preserve_creation_order() {
        let store = VectorStore::new();
        let library = store
            .create_library(LibraryCreate {
                metadata: LibraryMetadata::new("lib"),
            })
            .unwrap();

        let mut document_ids = Vec::new();
        for i in 0..4 {
            let doc = store
                .create_document(DocumentCreate {
                    library_id: library.id,
                    metadata: DocumentMetadata::new(format!("doc-{}", i)),
                })
                .unwrap();
            document_ids.push(doc.id);
        }
        let listed: Vec<Uuid> = store
            .list_documents(Some(library.id))
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(listed, document_ids);

        let mut chunk_ids = Vec::new();
        for _ in 0..3 {
            let chunk = store
                .create_chunk(chunk_payload(document_ids[0], vec![1.0]))
                .unwrap();
            chunk_ids.push(chunk.id);
        }
        let listed: Vec<Uuid> = store
            .list_chunks(document_ids[0])
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, chunk_ids);
    }

    #[test]
    fn update_preserves_created_at() {
        let (store, library_id, _) = store_with_document();
        let before = store.get_library(library_id).unwrap();

        let after = store
            .update_library(
                library_id,
                LibraryUpdate {
                    metadata: Some(LibraryMetadata::new("renamed")),
                },
            )
            .unwrap();
        assert_eq!(after.metadata.name, "renamed");
        assert_eq!(after.metadata.created_at, before.metadata.created_at);
        assert!(after.metadata.updated_at >= before.metadata.updated_at);
    }

    #[test]
    fn rejects_oversized_text() {
        let (store, _, document_id) = store_with_document();
        let payload = ChunkCreate {
            document_id,
            text: "x".repeat(10_001),
            embedding: vec![1.0],
            metadata: ChunkMetadata::new("test"),
        };
        assert!(matches!(
            store.create_chunk(payload),
            Err(VecbaseError::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_finite_embedding() {
        let (store, _, document_id) = store_with_document();
        let payload = chunk_payload(document_id, vec![1.0, f32::NAN]);
        assert!(matches!(
            store.create_chunk(payload),
            Err(VecbaseError::Validation(_))
        ));
    }

    #[test]
    fn empty_update_does_not_touch_timestamps() {
        let (store, _, document_id) = store_with_document();
        let chunk = store
            .create_chunk(chunk_payload(document_id, vec![1.0]))
            .unwrap();
        let updated = store.update_chunk(chunk.id, ChunkUpdate::default()).unwrap();
        assert_eq!(updated.metadata.updated_at, chunk.metadata.updated_at);
    }
}
