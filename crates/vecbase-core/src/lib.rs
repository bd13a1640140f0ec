//! # vecbase-core
//!
//! In-memory vector database core: text-derived embedding vectors organized
//! into a library -> document -> chunk hierarchy, with approximate
//! nearest-neighbor search over a chosen library.
//!
//! The crate provides:
//!
//! - An entity store ([`VectorStore`]) with referential integrity, cascading
//!   deletes, and deterministic listing order.
//! - Three interchangeable index structures behind one contract
//!   ([`index::LibraryIndex`]): exact linear scan, sign-random-projection
//!   LSH, and a hierarchical small-world graph. Builds are one-shot and
//!   seeded; identical snapshots and seeds reproduce identical indexes.
//! - A many-readers-or-one-writer concurrency discipline: a store-level
//!   mutex for the library table and routing maps, plus one fair
//!   reader-writer lock per library covering its entities and its index.
//! - A search orchestrator applying metadata filters, an optional similarity
//!   floor, and hydration of results with their chunk and owning document.
//!
//! The HTTP facade, the text-to-embedding provider, and persistence are
//! external collaborators; the core accepts vectors as given and keeps all
//! state in process memory.
//!
//! # Example
//!
//! ```
//! use vecbase_core::{IndexType, SearchQuery, VectorStore};
//! use vecbase_core::types::{ChunkCreate, ChunkMetadata, DocumentCreate,
//!     DocumentMetadata, LibraryCreate, LibraryMetadata};
//!
//! let store = VectorStore::new();
//! let library = store.create_library(LibraryCreate {
//!     metadata: LibraryMetadata::new("notes"),
//! })?;
//! let document = store.create_document(DocumentCreate {
//!     library_id: library.id,
//!     metadata: DocumentMetadata::new("intro"),
//! })?;
//! store.create_chunk(ChunkCreate {
//!     document_id: document.id,
//!     text: "hello world".to_string(),
//!     embedding: vec![1.0, 0.0, 0.0],
//!     metadata: ChunkMetadata::new("example"),
//! })?;
//!
//! store.index_library(library.id, IndexType::Flat)?;
//! let results = store.search(library.id, &SearchQuery::new(vec![1.0, 0.0, 0.0], 1))?;
//! assert_eq!(results.len(), 1);
//! # Ok::<(), vecbase_core::VecbaseError>(())
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod store;
pub mod types;
pub mod vecmath;

pub use config::Config;
pub use error::{EntityKind, Result, VecbaseError};
pub use index::{BuildOptions, HnswParams, IndexParams, IndexType, LshParams};
pub use store::VectorStore;
pub use types::{
    Chunk, ChunkCreate, ChunkMetadata, ChunkUpdate, Document, DocumentCreate, DocumentMetadata,
    DocumentUpdate, Library, LibraryCreate, LibraryMetadata, LibraryStats, LibraryUpdate,
    SearchQuery, SearchResult,
};
