//! Shared helpers for the integration suites.
//!
//! Each test binary compiles its own copy and uses a subset of the helpers.
#![allow(dead_code)]

use std::sync::Once;

use vecbase_core::types::{ChunkCreate, ChunkMetadata, DocumentCreate, DocumentMetadata, LibraryCreate, LibraryMetadata};
use vecbase_core::VectorStore;

static INIT: Once = Once::new();

/// Install a tracing subscriber once per test binary; `RUST_LOG` filters.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A store with one library and one document, ready for chunks.
pub fn store_with_document() -> (VectorStore, uuid::Uuid, uuid::Uuid) {
    init_logging();
    let store = VectorStore::new();
    let library = store
        .create_library(LibraryCreate {
            metadata: LibraryMetadata::new("library"),
        })
        .expect("create library");
    let document = store
        .create_document(DocumentCreate {
            library_id: library.id,
            metadata: DocumentMetadata::new("document"),
        })
        .expect("create document");
    (store, library.id, document.id)
}

/// Insert a chunk with the given embedding and optional `color` extra tag.
pub fn add_chunk(
    store: &VectorStore,
    document_id: uuid::Uuid,
    embedding: Vec<f32>,
    color: Option<&str>,
) -> uuid::Uuid {
    let mut metadata = ChunkMetadata::new("fixture");
    if let Some(color) = color {
        metadata
            .extra
            .insert("color".to_string(), color.to_string());
    }
    store
        .create_chunk(ChunkCreate {
            document_id,
            text: "fixture text".to_string(),
            embedding,
            metadata,
        })
        .expect("create chunk")
        .id
}
