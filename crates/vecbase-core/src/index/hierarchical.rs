//! Hierarchical small-world proximity graph, a simplified HNSW.
//!
//! Nodes live in a dense arena ([`VectorSet`]) and are addressed by `u32`
//! handles; neighbor lists are plain per-layer vectors, no pointer graph.
//! Construction inserts nodes one at a time (geometric level sampling,
//! greedy descent, bounded beam search, diversity neighbor selection) and
//! the result is frozen; reindexing replaces the instance.
//!
//! The level sampler draws from a rng seeded at build time, and every
//! similarity comparison breaks ties on the handle, so identical snapshots,
//! seeds, and parameters produce identical graphs.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::config::defaults;
use crate::vecmath;

use super::{CandidateFilter, HnswParams, TopK, VectorSet};

/// Scored graph handle. Greater is better: higher similarity first, ties
/// prefer the lower handle (earlier snapshot position).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scored {
    sim: f64,
    handle: u32,
}

impl Eq for Scored {}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sim
            .total_cmp(&other.sim)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// What a traversal measures similarity against: a node being inserted, or
/// an external query vector.
enum Target<'a> {
    Node(u32),
    Query { vector: &'a [f32], norm: f64 },
}

/// Epoch-stamped visited set, cleared in O(1) between traversals.
struct VisitedSet {
    stamp: Vec<u32>,
    epoch: u32,
}

impl VisitedSet {
    fn new(n: usize) -> Self {
        Self {
            stamp: vec![0; n],
            epoch: 0,
        }
    }

    fn begin(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamp.fill(0);
            self.epoch = 1;
        }
    }

    /// Returns true if `handle` was not yet visited in this epoch.
    #[inline]
    fn insert(&mut self, handle: u32) -> bool {
        let slot = &mut self.stamp[handle as usize];
        if *slot == self.epoch {
            false
        } else {
            *slot = self.epoch;
            true
        }
    }
}

#[derive(Debug)]
pub struct HierarchicalIndex {
    vectors: VectorSet,
    params: HnswParams,
    seed: u64,
    /// `neighbors[handle][layer]`; a node's list length is its level + 1.
    neighbors: Vec<Vec<Vec<u32>>>,
    entry_point: Option<u32>,
    top_level: usize,
}

impl HierarchicalIndex {
    /// Build from a snapshot of `(chunk_id, vector)` pairs, inserting in
    /// snapshot order.
    pub fn build(dim: usize, items: Vec<(Uuid, Vec<f32>)>, params: HnswParams, seed: u64) -> Self {
        let vectors = VectorSet::from_items(dim, items);
        let n = vectors.len();
        let level_mult = 1.0 / (params.m.max(2) as f64).ln();

        let mut index = Self {
            vectors,
            params,
            seed,
            neighbors: Vec::with_capacity(n),
            entry_point: None,
            top_level: 0,
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut visited = VisitedSet::new(n);
        for handle in 0..n as u32 {
            let level = sample_level(&mut rng, level_mult);
            index.insert(handle, level, &mut visited);
        }

        tracing::debug!(
            n,
            dim,
            m = params.m,
            ef_construction = params.ef_construction,
            top_level = index.top_level,
            seed,
            "built hierarchical index"
        );

        index
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

    /// Approximate top-k: greedy descent through the upper layers, then a
    /// beam of width `max(k, ef_search)` on the base layer. The filter gates
    /// entry to the result beam but never navigation.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&CandidateFilter>,
    ) -> Vec<(Uuid, f32)> {
        debug_assert_eq!(query.len(), self.vectors.dim());
        let Some(mut ep) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let target = Target::Query {
            vector: query,
            norm: vecmath::norm(query),
        };
        for layer in (1..=self.top_level).rev() {
            ep = self.greedy(&target, ep, layer);
        }

        let ef = k.max(self.params.ef_search);
        let mut visited = VisitedSet::new(self.vectors.len());
        let beam = self.search_layer(&target, ep, 0, ef, &mut visited, filter);

        let mut topk = TopK::new(k);
        for entry in beam {
            topk.push(self.vectors.id(entry.handle), entry.sim);
        }
        topk.into_ranked()
    }

    /// Similarity of `handle` to the traversal target.
    #[inline]
    fn sim_to(&self, target: &Target<'_>, handle: u32) -> f64 {
        match target {
            Target::Node(node) => self.vectors.cosine_between(*node, handle),
            Target::Query { vector, norm } => self.vectors.cosine_to(handle, vector, *norm),
        }
    }

    /// Insert one node at `level` into the frozen-in-progress graph.
    fn insert(&mut self, handle: u32, level: usize, visited: &mut VisitedSet) {
        self.neighbors.push(vec![Vec::new(); level + 1]);

        let Some(entry) = self.entry_point else {
            self.entry_point = Some(handle);
            self.top_level = level;
            return;
        };

        let target = Target::Node(handle);
        let mut ep = entry;
        for layer in (level + 1..=self.top_level).rev() {
            ep = self.greedy(&target, ep, layer);
        }

        let base_budget = self.params.m * 2;
        let mut layer = level.min(self.top_level);
        loop {
            let candidates =
                self.search_layer(&target, ep, layer, self.params.ef_construction, visited, None);
            let budget = if layer == 0 { base_budget } else { self.params.m };
            let selected = self.select_neighbors(handle, &candidates, budget);

            for &nb in &selected {
                self.neighbors[handle as usize][layer].push(nb);
                self.neighbors[nb as usize][layer].push(handle);
                if self.neighbors[nb as usize][layer].len() > budget {
                    self.prune(nb, layer, budget);
                }
            }

            if let Some(best) = candidates.first() {
                ep = best.handle;
            }
            if layer == 0 {
                break;
            }
            layer -= 1;
        }

        if level > self.top_level {
            self.entry_point = Some(handle);
            self.top_level = level;
        }
    }

    /// Greedy descent within one layer: repeatedly move to the neighbor with
    /// the highest similarity to the target until no improvement.
    fn greedy(&self, target: &Target<'_>, mut ep: u32, layer: usize) -> u32 {
        let mut best = self.sim_to(target, ep);
        loop {
            let mut improved = false;
            for &nb in &self.neighbors[ep as usize][layer] {
                let sim = self.sim_to(target, nb);
                if sim > best {
                    best = sim;
                    ep = nb;
                    improved = true;
                }
            }
            if !improved {
                return ep;
            }
        }
    }

    /// Bounded beam search within one layer. Returns up to `ef` scored
    /// handles, best first. Navigation visits every reachable candidate;
    /// only filter-passing handles enter the result beam.
    fn search_layer(
        &self,
        target: &Target<'_>,
        ep: u32,
        layer: usize,
        ef: usize,
        visited: &mut VisitedSet,
        filter: Option<&CandidateFilter>,
    ) -> Vec<Scored> {
        visited.begin();
        visited.insert(ep);

        let admit =
            |handle: u32| filter.map_or(true, |pred| pred(self.vectors.id(handle)));

        let entry = Scored {
            sim: self.sim_to(target, ep),
            handle: ep,
        };
        let mut frontier: BinaryHeap<Scored> = BinaryHeap::new();
        frontier.push(entry);
        let mut results: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(ef + 1);
        if admit(ep) {
            results.push(Reverse(entry));
        }

        while let Some(current) = frontier.pop() {
            if results.len() >= ef {
                let worst = results.peek().map(|r| r.0.sim).unwrap_or(f64::NEG_INFINITY);
                if current.sim < worst {
                    break;
                }
            }
            for &nb in &self.neighbors[current.handle as usize][layer] {
                if !visited.insert(nb) {
                    continue;
                }
                let sim = self.sim_to(target, nb);
                let worst = if results.len() >= ef {
                    results.peek().map(|r| r.0.sim).unwrap_or(f64::NEG_INFINITY)
                } else {
                    f64::NEG_INFINITY
                };
                if sim > worst || results.len() < ef {
                    frontier.push(Scored { sim, handle: nb });
                    if admit(nb) {
                        results.push(Reverse(Scored { sim, handle: nb }));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        results
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(entry)| entry)
            .collect()
    }

    /// Diversity heuristic: walk candidates best-first, keeping one only if
    /// it is closer to the target than to any already-selected neighbor.
    /// Remaining slots are backfilled from the rejected candidates so nodes
    /// reach their budget even in dense clusters.
    fn select_neighbors(&self, target: u32, candidates: &[Scored], budget: usize) -> Vec<u32> {
        let mut selected: Vec<Scored> = Vec::with_capacity(budget);
        let mut rejected: Vec<Scored> = Vec::new();

        for &candidate in candidates {
            if selected.len() >= budget {
                break;
            }
            if candidate.handle == target {
                continue;
            }
            let diverse = selected.iter().all(|kept| {
                self.vectors.cosine_between(candidate.handle, kept.handle) < candidate.sim
            });
            if diverse {
                selected.push(candidate);
            } else {
                rejected.push(candidate);
            }
        }
        for &candidate in &rejected {
            if selected.len() >= budget {
                break;
            }
            selected.push(candidate);
        }

        selected.into_iter().map(|s| s.handle).collect()
    }

    /// Shrink an over-budget neighbor list with the same heuristic used at
    /// selection time.
    fn prune(&mut self, node: u32, layer: usize, budget: usize) {
        let mut candidates: Vec<Scored> = self.neighbors[node as usize][layer]
            .iter()
            .map(|&nb| Scored {
                sim: self.vectors.cosine_between(node, nb),
                handle: nb,
            })
            .collect();
        candidates.sort_by(|a, b| b.cmp(a));

        let keep = self.select_neighbors(node, &candidates, budget);
        self.neighbors[node as usize][layer] = keep;
    }
}

/// Sample a node level from the geometric distribution with multiplier
/// `1/ln(m)`, capped at [`defaults::hnsw::MAX_LEVEL`].
fn sample_level(rng: &mut ChaCha8Rng, level_mult: f64) -> usize {
    let u: f64 = rng.gen();
    let level = (-(1.0 - u).ln() * level_mult).floor();
    (level as usize).min(defaults::hnsw::MAX_LEVEL)
}
