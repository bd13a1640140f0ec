//! Domain types: libraries, documents, chunks, and the search surface.
//!
//! Entities carry an opaque UUID identifier and a typed metadata record.
//! Known metadata fields are struct members; free-form extension tags live in
//! a side `extra` map so equality filters stay well defined. All timestamps
//! are UTC and serialize as ISO-8601.

mod chunk;
mod document;
mod library;
mod search;

pub use chunk::{Chunk, ChunkCreate, ChunkMetadata, ChunkUpdate};
pub use document::{Document, DocumentCreate, DocumentMetadata, DocumentUpdate};
pub use library::{Library, LibraryCreate, LibraryMetadata, LibraryUpdate};
pub use search::{LibraryStats, SearchQuery, SearchResult};

/// Unique identifier for libraries.
pub type LibraryId = uuid::Uuid;
/// Unique identifier for documents.
pub type DocumentId = uuid::Uuid;
/// Unique identifier for chunks.
pub type ChunkId = uuid::Uuid;
