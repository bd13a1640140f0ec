//! Sign-random-projection (SimHash) LSH index for cosine similarity.
//!
//! Build draws `L` hyperplane matrices of shape `H x D` from N(0,1) using a
//! seeded rng, hashes every vector to an `H`-bit signature per table, and
//! buckets handles by signature. Search unions the query's exact buckets,
//! widens one Hamming radius at a time until the candidate pool reaches its
//! target, then ranks the pool by exact cosine.
//!
//! The recorded seed makes rebuilds byte-identical over identical snapshots.

use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use uuid::Uuid;

use crate::vecmath;

use super::{CandidateFilter, LshParams, TopK, VectorSet};

/// Cap on probe keys per table per radius round. Radii whose combination
/// count exceeds this are not probed; the pool is served as-is.
const MAX_PROBE_KEYS_PER_TABLE: usize = 4096;

#[derive(Debug)]
pub struct RpLshIndex {
    vectors: VectorSet,
    params: LshParams,
    seed: u64,
    /// Per table: `H x D` hyperplane matrix, row-major.
    planes: Vec<Vec<f32>>,
    /// Per table: signature -> handles, in insertion order.
    tables: Vec<HashMap<u32, Vec<u32>>>,
}

impl RpLshIndex {
    /// Build from a snapshot of `(chunk_id, vector)` pairs.
    pub fn build(dim: usize, items: Vec<(Uuid, Vec<f32>)>, params: LshParams, seed: u64) -> Self {
        debug_assert!(params.num_bits >= 1 && params.num_bits <= 32);
        let vectors = VectorSet::from_items(dim, items);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut planes = Vec::with_capacity(params.num_tables);
        for _ in 0..params.num_tables {
            let mut matrix = Vec::with_capacity(params.num_bits as usize * dim);
            for _ in 0..params.num_bits as usize * dim {
                matrix.push(rng.sample::<f32, _>(StandardNormal));
            }
            planes.push(matrix);
        }

        let mut tables: Vec<HashMap<u32, Vec<u32>>> = vec![HashMap::new(); params.num_tables];
        for handle in 0..vectors.len() as u32 {
            let v = vectors.vector(handle);
            for (t, matrix) in planes.iter().enumerate() {
                let sig = signature(matrix, dim, params.num_bits, v);
                tables[t].entry(sig).or_default().push(handle);
            }
        }

        tracing::debug!(
            n = vectors.len(),
            dim,
            tables = params.num_tables,
            bits = params.num_bits,
            seed,
            "built rp_lsh index"
        );

        Self {
            vectors,
            params,
            seed,
            planes,
            tables,
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

    /// Seed recorded at build time.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Approximate top-k: gather candidates from signature buckets, then
    /// rank them by exact cosine. Ties break by ascending chunk id.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&CandidateFilter>,
    ) -> Vec<(Uuid, f32)> {
        debug_assert_eq!(query.len(), self.vectors.dim());
        let n = self.vectors.len();
        if n == 0 || k == 0 {
            return Vec::new();
        }

        let sigs: Vec<u32> = self
            .planes
            .iter()
            .map(|matrix| signature(matrix, self.vectors.dim(), self.params.num_bits, query))
            .collect();

        let pool = self.gather_candidates(&sigs, k);
        tracing::debug!(pool = pool.len(), n, k, "rp_lsh candidate pool");

        let query_norm = vecmath::norm(query);
        let mut topk = TopK::new(k);
        for handle in pool {
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

    /// Union bucket members for the query signatures, widening by Hamming
    /// radius until the pool reaches `min(max(k*P, pool_fraction*N), N)`.
    ///
    /// Each radius round completes across every table before the target is
    /// re-checked, so the pool composition does not depend on where inside a
    /// round the target was crossed.
    fn gather_candidates(&self, sigs: &[u32], k: usize) -> Vec<u32> {
        let n = self.vectors.len();
        let floor = (self.params.pool_fraction * n as f64).ceil() as usize;
        let target = k
            .saturating_mul(self.params.probe_factor)
            .max(floor)
            .min(n);

        let mut seen = vec![false; n];
        let mut pool = Vec::with_capacity(target);

        let collect = |bucket: &[u32], pool: &mut Vec<u32>, seen: &mut Vec<bool>| {
            for &handle in bucket {
                if !seen[handle as usize] {
                    seen[handle as usize] = true;
                    pool.push(handle);
                }
            }
        };

        // Exact buckets first.
        for (table, &sig) in self.tables.iter().zip(sigs.iter()) {
            if let Some(bucket) = table.get(&sig) {
                collect(bucket, &mut pool, &mut seen);
            }
        }

        // Widen radius by radius while the pool is short of its target.
        let bits = self.params.num_bits as usize;
        let mut radius = 1usize;
        while pool.len() < target && radius <= bits {
            if binomial(bits, radius) > MAX_PROBE_KEYS_PER_TABLE {
                break;
            }
            for (table, &sig) in self.tables.iter().zip(sigs.iter()) {
                for_each_flip_mask(bits, radius, |mask| {
                    if let Some(bucket) = table.get(&(sig ^ mask)) {
                        collect(bucket, &mut pool, &mut seen);
                    }
                });
            }
            radius += 1;
        }

        pool
    }
}

/// `H`-bit SimHash signature of `v` against a row-major `H x D` matrix.
/// Bit h is set iff the projection onto hyperplane h is non-negative.
fn signature(matrix: &[f32], dim: usize, num_bits: u32, v: &[f32]) -> u32 {
    let mut sig = 0u32;
    for h in 0..num_bits as usize {
        let row = &matrix[h * dim..(h + 1) * dim];
        if vecmath::dot(row, v) >= 0.0 {
            sig |= 1 << h;
        }
    }
    sig
}

/// Visit every `bits`-wide mask with exactly `radius` bits set, in
/// lexicographic order of bit positions. Deterministic probe order.
fn for_each_flip_mask(bits: usize, radius: usize, mut f: impl FnMut(u32)) {
    if radius == 0 || radius > bits {
        return;
    }
    let mut idx: Vec<usize> = (0..radius).collect();
    loop {
        let mut mask = 0u32;
        for &i in &idx {
            mask |= 1 << i;
        }
        f(mask);

        // Advance to the next combination of bit positions.
        let mut j = radius;
        loop {
            if j == 0 {
                return;
            }
            j -= 1;
            if idx[j] != bits - radius + j {
                break;
            }
        }
        idx[j] += 1;
        for l in j + 1..radius {
            idx[l] = idx[l - 1] + 1;
        }
    }
}

/// C(n, k), saturating; only used to bound probe rounds.
fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc.saturating_mul((n - i) as u128) / (i + 1) as u128;
        if acc > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    acc as usize
}
