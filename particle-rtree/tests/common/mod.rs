#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use particle_rtree::{
    BoundingBox, Particle, Point, SpatialIndex, SpatialIndexBuilder, SpatialResult,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A particle whose geometry can be changed from another thread.
#[derive(Debug)]
pub struct TestParticle {
    pub id: usize,
    state: Mutex<(Point, f64)>,
}

impl TestParticle {
    pub fn new(id: usize, x: f64, y: f64, radius: f64) -> Arc<TestParticle> {
        Arc::new(TestParticle {
            id,
            state: Mutex::new((Point::new(x, y), radius)),
        })
    }

    pub fn move_to(&self, x: f64, y: f64) {
        self.state.lock().0 = Point::new(x, y);
    }

    pub fn set_radius(&self, radius: f64) {
        self.state.lock().1 = radius;
    }
}

impl Particle for TestParticle {
    fn position(&self) -> Point {
        self.state.lock().0
    }

    fn radius(&self) -> f64 {
        self.state.lock().1
    }
}

/// Builds an index, runs `test` against it and then checks the index is
/// still structurally sound.
pub fn run_test<T>(max_entries: usize, test: T)
where
    T: FnOnce(&SpatialIndex<TestParticle>) -> SpatialResult<()>,
{
    let index = SpatialIndexBuilder::new()
        .max_entries(max_entries)
        .build()
        .expect("failed to build index");

    if let Err(e) = test(&index) {
        panic!("test failed: {}", e);
    }

    let report = index.check_integrity();
    assert!(report.is_valid, "index left in a bad state: {}", report);
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Particles scattered over `[0, extent)²` with radii in `[0, max_radius)`.
pub fn random_particles(rng: &mut StdRng, count: usize, extent: f64, max_radius: f64) -> Vec<Arc<TestParticle>> {
    (0..count)
        .map(|id| {
            TestParticle::new(
                id,
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..extent),
                rng.gen_range(0.0..max_radius),
            )
        })
        .collect()
}

/// Ids of every match of a radius query, sorted.
pub fn query_ids(index: &SpatialIndex<TestParticle>, center: Point, radius: f64) -> SpatialResult<Vec<usize>> {
    let mut ids: Vec<usize> = index
        .collect_within_radius(center, radius)?
        .iter()
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    Ok(ids)
}

/// Ids of the particles whose current bounds meet the query square, sorted.
pub fn brute_force_ids(particles: &[Arc<TestParticle>], center: Point, radius: f64) -> Vec<usize> {
    let region = BoundingBox::from_center_radius(center, radius);
    let mut ids: Vec<usize> = particles
        .iter()
        .filter(|p| p.bounds().map(|b| b.intersects(&region)).unwrap_or(false))
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    ids
}
