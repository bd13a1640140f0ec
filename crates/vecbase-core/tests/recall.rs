//! Recall floors for the approximate indexes against the flat oracle, and
//! byte-identical determinism of seeded builds.

mod common;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use uuid::Uuid;
use vecbase_core::index::LibraryIndex;
use vecbase_core::{vecmath, BuildOptions, IndexType};

const DIM: usize = 64;
const N: usize = 1000;
const QUERIES: usize = 50;
const K: usize = 10;

fn random_unit_vector(rng: &mut ChaCha8Rng) -> Vec<f32> {
    let v: Vec<f32> = (0..DIM).map(|_| rng.sample::<f32, _>(StandardNormal)).collect();
    vecmath::normalize(&v)
}

fn synthetic_items(seed: u64) -> Vec<(Uuid, Vec<f32>)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..N).map(|_| (Uuid::new_v4(), random_unit_vector(&mut rng))).collect()
}

fn queries(seed: u64) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..QUERIES).map(|_| random_unit_vector(&mut rng)).collect()
}

fn mean_recall(oracle: &LibraryIndex, candidate: &LibraryIndex, queries: &[Vec<f32>]) -> f64 {
    let mut total = 0.0;
    for query in queries {
        let exact: Vec<Uuid> = oracle
            .search(query, K, None)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let approx: Vec<Uuid> = candidate
            .search(query, K, None)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        let hits = exact.iter().filter(|id| approx.contains(id)).count();
        total += hits as f64 / K as f64;
    }
    total / queries.len() as f64
}

/// S4: RP-LSH recall@10 against the flat oracle stays at or above 0.8.
#[test]
fn s4_lsh_recall_floor() {
    common::init_logging();
    let items = synthetic_items(101);
    let options = BuildOptions::default();

    let oracle = LibraryIndex::build(IndexType::Flat, DIM, items.clone(), &options);
    let lsh = LibraryIndex::build(IndexType::RpLsh, DIM, items, &options);

    let recall = mean_recall(&oracle, &lsh, &queries(202));
    assert!(recall >= 0.8, "rp_lsh recall@10 = {:.3}, floor is 0.8", recall);
}

/// S5: hierarchical recall@10 with defaults stays at or above 0.95.
#[test]
fn s5_hierarchical_recall_floor() {
    common::init_logging();
    let items = synthetic_items(101);
    let options = BuildOptions::default();

    let oracle = LibraryIndex::build(IndexType::Flat, DIM, items.clone(), &options);
    let graph = LibraryIndex::build(IndexType::Hierarchical, DIM, items, &options);

    let recall = mean_recall(&oracle, &graph, &queries(202));
    assert!(
        recall >= 0.95,
        "hierarchical recall@10 = {:.3}, floor is 0.95",
        recall
    );
}

/// Property 8: identical snapshot + seed + params give identical output,
/// for every index type.
#[test]
fn seeded_builds_are_deterministic() {
    common::init_logging();
    let items = synthetic_items(77);
    let queries = queries(88);
    let options = BuildOptions::default();

    for index_type in [IndexType::Flat, IndexType::RpLsh, IndexType::Hierarchical] {
        let a = LibraryIndex::build(index_type, DIM, items.clone(), &options);
        let b = LibraryIndex::build(index_type, DIM, items.clone(), &options);
        for query in &queries {
            assert_eq!(
                a.search(query, K, None),
                b.search(query, K, None),
                "{} diverged across identical builds",
                index_type
            );
        }
    }
}

/// Approximate results are always a subset of the collection, ranked
/// descending with the documented tie-break.
#[test]
fn rankings_are_sorted_descending() {
    common::init_logging();
    let items = synthetic_items(55);
    let options = BuildOptions::default();

    for index_type in [IndexType::Flat, IndexType::RpLsh, IndexType::Hierarchical] {
        let index = LibraryIndex::build(index_type, DIM, items.clone(), &options);
        for query in queries(66).iter().take(5) {
            let results = index.search(query, K, None);
            assert_eq!(results.len(), K);
            for pair in results.windows(2) {
                assert!(
                    pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0),
                    "{} violated ranking order",
                    index_type
                );
            }
        }
    }
}
