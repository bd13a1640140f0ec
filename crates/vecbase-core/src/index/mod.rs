//! Nearest-neighbor index family.
//!
//! Three interchangeable index structures share one contract: built once from
//! a snapshot of `(chunk_id, vector)` pairs, immutable afterwards, answering
//! ranked top-k cosine queries. Ranking is by descending similarity with ties
//! broken by ascending chunk id, identically across implementations.
//!
//! Dispatch is a sealed enum ([`LibraryIndex`]) with exactly three variants;
//! a library owns at most one instance, replaced atomically on rebuild.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::defaults;
use crate::error::{Result, VecbaseError};
use crate::vecmath;

mod flat;
mod hierarchical;
mod rplsh;

pub use flat::FlatIndex;
pub use hierarchical::HierarchicalIndex;
pub use rplsh::RpLshIndex;

/// Opaque candidate predicate applied by an index before a chunk can enter
/// the result set.
pub type CandidateFilter<'a> = dyn Fn(Uuid) -> bool + 'a;

/// The supported index algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// Exact linear scan. Correctness baseline for the other two.
    Flat,
    /// Sign-random-projection locality-sensitive hashing.
    RpLsh,
    /// Hierarchical small-world proximity graph.
    Hierarchical,
}

impl IndexType {
    /// Stable wire name, matching the REST `index_type` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Flat => "flat",
            IndexType::RpLsh => "rp_lsh",
            IndexType::Hierarchical => "hierarchical",
        }
    }
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IndexType {
    type Err = VecbaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flat" => Ok(IndexType::Flat),
            "rp_lsh" => Ok(IndexType::RpLsh),
            "hierarchical" => Ok(IndexType::Hierarchical),
            other => Err(VecbaseError::UnsupportedIndexType(other.to_string())),
        }
    }
}

/// RP-LSH build parameters.
///
/// Defaults are tuned so that recall@10 against the flat oracle stays above
/// 0.8 on weakly correlated data; see DESIGN.md for the argument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LshParams {
    /// Number of independent hash tables (L).
    pub num_tables: usize,
    /// Signature width in bits per table (H), at most 32.
    pub num_bits: u32,
    /// Candidate pool multiplier over k (P).
    pub probe_factor: usize,
    /// Lower bound on the candidate pool as a fraction of the collection.
    pub pool_fraction: f64,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            num_tables: defaults::lsh::NUM_TABLES,
            num_bits: defaults::lsh::NUM_BITS,
            probe_factor: defaults::lsh::PROBE_FACTOR,
            pool_fraction: defaults::lsh::POOL_FRACTION,
        }
    }
}

/// Hierarchical graph build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Max neighbors per node on upper layers; the base layer allows `2m`.
    pub m: usize,
    /// Beam width during construction.
    pub ef_construction: usize,
    /// Minimum beam width during search (the effective width is
    /// `max(k, ef_search)`).
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: defaults::hnsw::M,
            ef_construction: defaults::hnsw::EF_CONSTRUCTION,
            ef_search: defaults::hnsw::EF_SEARCH,
        }
    }
}

/// Per-build parameter set for every index family member.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexParams {
    pub lsh: LshParams,
    pub hnsw: HnswParams,
}

/// Arguments for one index build: algorithm parameters plus the seed that
/// makes the build reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Seed for level sampling (hierarchical) and hyperplane draws (LSH).
    pub seed: u64,
    pub params: IndexParams,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            seed: defaults::BUILD_SEED,
            params: IndexParams::default(),
        }
    }
}

/// Dense vector arena shared by all index implementations.
///
/// Vectors live in one row-major `f32` matrix addressed by `u32` handles,
/// with a parallel chunk-id list and precomputed `f64` norms. Indexes hold
/// handles internally and translate back to chunk ids only at the result
/// boundary.
#[derive(Debug, Clone)]
pub(crate) struct VectorSet {
    dim: usize,
    ids: Vec<Uuid>,
    data: Vec<f32>,
    norms: Vec<f64>,
}

impl VectorSet {
    pub(crate) fn from_items(dim: usize, items: Vec<(Uuid, Vec<f32>)>) -> Self {
        let n = items.len();
        let mut ids = Vec::with_capacity(n);
        let mut data = Vec::with_capacity(n * dim);
        let mut norms = Vec::with_capacity(n);
        for (id, vector) in items {
            debug_assert_eq!(vector.len(), dim);
            ids.push(id);
            norms.push(vecmath::norm(&vector));
            data.extend_from_slice(&vector);
        }
        Self {
            dim,
            ids,
            data,
            norms,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub(crate) fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub(crate) fn id(&self, handle: u32) -> Uuid {
        self.ids[handle as usize]
    }

    #[inline]
    pub(crate) fn vector(&self, handle: u32) -> &[f32] {
        let start = handle as usize * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Cosine similarity between the stored vector and a query whose norm
    /// was computed once up front. Zero-norm operands score 0.0.
    #[inline]
    pub(crate) fn cosine_to(&self, handle: u32, query: &[f32], query_norm: f64) -> f64 {
        let vnorm = self.norms[handle as usize];
        if vnorm == 0.0 || query_norm == 0.0 {
            return 0.0;
        }
        vecmath::dot(self.vector(handle), query) / (vnorm * query_norm)
    }

    /// Cosine similarity between two stored vectors.
    #[inline]
    pub(crate) fn cosine_between(&self, a: u32, b: u32) -> f64 {
        let na = self.norms[a as usize];
        let nb = self.norms[b as usize];
        if na == 0.0 || nb == 0.0 {
            return 0.0;
        }
        vecmath::dot(self.vector(a), self.vector(b)) / (na * nb)
    }
}

/// A `(score, chunk_id)` pair ordered by score, ties by ascending id.
///
/// Greater means better: higher score wins, equal scores prefer the smaller
/// id. All index output ranking flows through this ordering. Scores are
/// always finite here, and `total_cmp` keeps the order total regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoredId {
    pub score: f64,
    pub id: Uuid,
}

impl Eq for ScoredId {}

impl Ord for ScoredId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for ScoredId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Bounded top-k collector: a min-heap of size k keyed by [`ScoredId`].
pub(crate) struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<ScoredId>>,
}

impl TopK {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    pub(crate) fn push(&mut self, id: Uuid, score: f64) {
        if self.k == 0 {
            return;
        }
        let entry = ScoredId { score, id };
        if self.heap.len() < self.k {
            self.heap.push(Reverse(entry));
        } else if let Some(worst) = self.heap.peek() {
            if entry > worst.0 {
                self.heap.pop();
                self.heap.push(Reverse(entry));
            }
        }
    }

    /// Drain into `(chunk_id, score)` pairs, best first.
    pub(crate) fn into_ranked(self) -> Vec<(Uuid, f32)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| (entry.id, entry.score as f32))
            .collect()
    }
}

/// An owned, immutable index instance. Exactly one per indexed library.
#[derive(Debug)]
pub enum LibraryIndex {
    Flat(FlatIndex),
    RpLsh(RpLshIndex),
    Hierarchical(HierarchicalIndex),
}

impl LibraryIndex {
    /// One-shot construction from a snapshot of `(chunk_id, vector)` pairs.
    ///
    /// `dim` is the library's fixed embedding dimension; every item must
    /// already match it. The same snapshot, seed, and parameters produce an
    /// identical index.
    pub fn build(
        index_type: IndexType,
        dim: usize,
        items: Vec<(Uuid, Vec<f32>)>,
        options: &BuildOptions,
    ) -> Self {
        match index_type {
            IndexType::Flat => LibraryIndex::Flat(FlatIndex::build(dim, items)),
            IndexType::RpLsh => LibraryIndex::RpLsh(RpLshIndex::build(
                dim,
                items,
                options.params.lsh,
                options.seed,
            )),
            IndexType::Hierarchical => LibraryIndex::Hierarchical(HierarchicalIndex::build(
                dim,
                items,
                options.params.hnsw,
                options.seed,
            )),
        }
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            LibraryIndex::Flat(_) => IndexType::Flat,
            LibraryIndex::RpLsh(_) => IndexType::RpLsh,
            LibraryIndex::Hierarchical(_) => IndexType::Hierarchical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LibraryIndex::Flat(idx) => idx.len(),
            LibraryIndex::RpLsh(idx) => idx.len(),
            LibraryIndex::Hierarchical(idx) => idx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oversampling multiplier the orchestrator applies to k before querying,
    /// to absorb candidate dropout under metadata filtering.
    pub fn oversample(&self) -> usize {
        match self {
            LibraryIndex::RpLsh(_) => defaults::lsh::OVERSAMPLE,
            _ => 1,
        }
    }

    /// Ranked top-k query: at most `k` `(chunk_id, score)` pairs by
    /// descending cosine similarity, ties by ascending chunk id. Candidates
    /// failing `filter` never enter the result set. Scores are reported
    /// untruncated; floors and final truncation belong to the orchestrator.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&CandidateFilter>,
    ) -> Vec<(Uuid, f32)> {
        match self {
            LibraryIndex::Flat(idx) => idx.search(query, k, filter),
            LibraryIndex::RpLsh(idx) => idx.search(query, k, filter),
            LibraryIndex::Hierarchical(idx) => idx.search(query, k, filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn index_type_round_trip() {
        for ty in [IndexType::Flat, IndexType::RpLsh, IndexType::Hierarchical] {
            assert_eq!(IndexType::from_str(ty.as_str()).unwrap(), ty);
        }
        assert!(matches!(
            IndexType::from_str("kd_tree"),
            Err(VecbaseError::UnsupportedIndexType(_))
        ));
    }

    #[test]
    fn index_type_serde_names() {
        assert_eq!(serde_json::to_string(&IndexType::RpLsh).unwrap(), "\"rp_lsh\"");
        let ty: IndexType = serde_json::from_str("\"hierarchical\"").unwrap();
        assert_eq!(ty, IndexType::Hierarchical);
    }

    #[test]
    fn top_k_ranks_descending() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut topk = TopK::new(3);
        topk.push(ids[0], 0.1);
        topk.push(ids[1], 0.9);
        topk.push(ids[2], 0.5);
        topk.push(ids[3], 0.7);
        topk.push(ids[4], 0.3);

        let ranked = topk.into_ranked();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, ids[1]);
        assert_eq!(ranked[1].0, ids[3]);
        assert_eq!(ranked[2].0, ids[2]);
    }

    #[test]
    fn top_k_breaks_ties_by_ascending_id() {
        let mut ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        ids.sort();
        let mut topk = TopK::new(2);
        // Insert in shuffled order, all with the same score.
        topk.push(ids[2], 0.5);
        topk.push(ids[0], 0.5);
        topk.push(ids[3], 0.5);
        topk.push(ids[1], 0.5);

        let ranked = topk.into_ranked();
        assert_eq!(ranked[0].0, ids[0]);
        assert_eq!(ranked[1].0, ids[1]);
    }

    #[test]
    fn top_k_zero_is_empty() {
        let mut topk = TopK::new(0);
        topk.push(Uuid::new_v4(), 1.0);
        assert!(topk.into_ranked().is_empty());
    }

    #[test]
    fn vector_set_layout() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let set = VectorSet::from_items(2, vec![(a, vec![1.0, 0.0]), (b, vec![0.0, 2.0])]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.dim(), 2);
        assert_eq!(set.id(0), a);
        assert_eq!(set.vector(1), &[0.0, 2.0]);
        assert!((set.cosine_between(0, 1) - 0.0).abs() < 1e-12);
        let q = [1.0f32, 0.0];
        let qn = crate::vecmath::norm(&q);
        assert!((set.cosine_to(0, &q, qn) - 1.0).abs() < 1e-12);
    }
}
