// Spatial layout: deterministic text-to-position synthesis, startup seeding,
// and layout-based topic inference.
//
// The "semantic" placement is a stand-in for a real embedding pipeline: three
// independent 32-bit hashes of the question act as a dimensionality-reduced
// coordinate, so identical questions always land on the same base point and
// nearby hashes stay nearby across sessions.

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;

use super::star::{Star, StarField};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Half-extent of the inhabited universe on X and Z.
pub const UNIVERSE_RADIUS: f32 = 60.0;
/// Vertical compression applied to the Y axis to flatten the field.
pub const Y_FLATTEN: f32 = 0.6;
/// Two stars closer than this are considered overlapping.
pub const MIN_SEPARATION: f32 = 4.0;
/// Radial push applied per overlap-resolution pass.
pub const EXPANSION_FACTOR: f32 = 1.15;
/// Overlap resolution gives up after this many passes and accepts the point.
pub const MAX_EXPANSIONS: usize = 5;
/// A finalized topic is only borrowed from a star within this distance.
const TOPIC_INFER_RADIUS: f32 = 40.0;
/// Label for stars that land too far from any labeled cluster.
const TOPIC_UNCHARTED: &str = "Uncharted";

/// Seed-cluster topics. One random center per topic per process.
pub const TOPICS: [&str; 10] = [
    "Science",
    "Philosophy",
    "Art",
    "History",
    "Technology",
    "Cosmos",
    "Ethics",
    "Quantum",
    "Nature",
    "Mind",
];

/// How far seed stars scatter around their topic center, per axis.
const CLUSTER_SPREAD: f32 = 15.0;

// ============================================================================
// POSITION SYNTHESIS
// ============================================================================

/// Map question text to a universe position.
///
/// The base point depends only on the text: three hash lanes with distinct
/// odd multipliers walk the characters left to right, so permutations of the
/// same characters land in different places. Overlap against `existing` is
/// then resolved by pushing the candidate radially outward from the origin —
/// up to [`MAX_EXPANSIONS`] times, best effort, never an error.
///
/// An empty question flagged as a new entry short-circuits to the origin.
pub fn synthesize_position(text: &str, is_new: bool, existing: &[Star]) -> Vec3 {
    if is_new && text.is_empty() {
        return Vec3::ZERO;
    }

    let (h1, h2, h3) = hash_lanes(text);

    let mut pos = Vec3::new(
        normalize_hash(h1) * UNIVERSE_RADIUS,
        normalize_hash(h2) * UNIVERSE_RADIUS * Y_FLATTEN,
        normalize_hash(h3) * UNIVERSE_RADIUS,
    );

    let min_sep_sq = MIN_SEPARATION * MIN_SEPARATION;
    for _ in 0..MAX_EXPANSIONS {
        let too_close = existing
            .iter()
            .any(|star| star.position.distance_squared(pos) < min_sep_sq);
        if !too_close {
            break;
        }
        pos *= EXPANSION_FACTOR;
    }

    pos
}

/// Three FNV-flavoured 32-bit hashes over the same character stream.
fn hash_lanes(text: &str) -> (u32, u32, u32) {
    let mut h1: u32 = 0x811c_9dc5;
    let mut h2: u32 = 0xc9dc_5811;
    let mut h3: u32 = 0x5811_c9dc;

    for c in text.chars() {
        let c = c as u32;
        h1 = (h1 ^ c).wrapping_mul(0x0100_0193);
        h2 = (h2 ^ c).wrapping_mul(0x1000_1931);
        h3 = (h3 ^ c).wrapping_mul(0x0019_3101);
    }

    (h1, h2, h3)
}

/// Spread a 32-bit hash over [-1, 1].
fn normalize_hash(h: u32) -> f32 {
    (h as f64 / 4_294_967_296.0 * 2.0 - 1.0) as f32
}

// ============================================================================
// SEEDING
// ============================================================================

/// Populate the field with `count` stars scattered into topic clusters.
///
/// Each topic gets one random cluster center for the whole process; every
/// seed star lands within [`CLUSTER_SPREAD`]/2 of its topic's center per
/// axis. The RNG is injected so tests (and reproducible sessions) can pin
/// the layout.
pub fn seed_universe(field: &mut StarField, count: usize, rng: &mut StdRng) {
    let centers: Vec<Vec3> = TOPICS
        .iter()
        .map(|_| {
            Vec3::new(
                (rng.r#gen::<f32>() - 0.5) * 100.0,
                (rng.r#gen::<f32>() - 0.5) * 60.0,
                (rng.r#gen::<f32>() - 0.5) * 100.0,
            )
        })
        .collect();

    for _ in 0..count {
        let topic_idx = rng.r#gen_range(0..TOPICS.len());
        let topic = TOPICS[topic_idx];
        let center = centers[topic_idx];

        let position = center
            + Vec3::new(
                (rng.r#gen::<f32>() - 0.5) * CLUSTER_SPREAD,
                (rng.r#gen::<f32>() - 0.5) * CLUSTER_SPREAD,
                (rng.r#gen::<f32>() - 0.5) * CLUSTER_SPREAD,
            );

        let id = field.next_id();
        let lower = topic.to_lowercase();
        field.add(
            Star::new(id, format!("What is the essence of {lower}?"), position)
                .with_topic(topic)
                .with_answer(format!(
                    "The essence of {lower} lies in how it reflects the human \
                     condition through the lens of time and space. It is one \
                     star in the constellation of what we know."
                )),
        );
    }

    log::info!("seeded {count} stars across {} topics", TOPICS.len());
}

// ============================================================================
// TOPIC INFERENCE
// ============================================================================

/// Borrow a topic from the nearest already-labeled star, or fall back to the
/// catch-all label when the position sits in unlabeled space.
///
/// Runs once per star, at stream completion — the placement already encodes
/// cluster membership, so proximity is the classification.
pub fn infer_topic(position: Vec3, field: &StarField) -> String {
    let nearest = field
        .all()
        .iter()
        .filter(|s| s.topic.is_some())
        .map(|s| (s.position.distance_squared(position), s))
        .min_by(|a, b| a.0.total_cmp(&b.0));

    match nearest {
        Some((dist_sq, star)) if dist_sq <= TOPIC_INFER_RADIUS * TOPIC_INFER_RADIUS => {
            star.topic.clone().unwrap_or_else(|| TOPIC_UNCHARTED.to_string())
        }
        _ => TOPIC_UNCHARTED.to_string(),
    }
}
