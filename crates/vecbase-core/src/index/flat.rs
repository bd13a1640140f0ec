//! Exact linear-scan index.
//!
//! Stores the full N x D matrix and scans it per query, keeping a bounded
//! heap of size k. O(N*D) time, O(k) extra space. Intended for small
//! libraries and as the correctness oracle for the approximate indexes.

use uuid::Uuid;

use crate::vecmath;

use super::{CandidateFilter, TopK, VectorSet};

#[derive(Debug)]
pub struct FlatIndex {
    vectors: VectorSet,
}

impl FlatIndex {
    /// Build from a snapshot of `(chunk_id, vector)` pairs.
    pub fn build(dim: usize, items: Vec<(Uuid, Vec<f32>)>) -> Self {
        Self {
            vectors: VectorSet::from_items(dim, items),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Exact top-k by cosine similarity, ties by ascending chunk id.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&CandidateFilter>,
    ) -> Vec<(Uuid, f32)> {
        debug_assert_eq!(query.len(), self.vectors.dim());
        if self.vectors.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_norm = vecmath::norm(query);
        let mut topk = TopK::new(k);
        for handle in 0..self.vectors.len() as u32 {
            let id = self.vectors.id(handle);
            if let Some(pred) = filter {
                if !pred(id) {
                    continue;
                }
            }
            topk.push(id, self.vectors.cosine_to(handle, query, query_norm));
        }
        topk.into_ranked()
    }
}
