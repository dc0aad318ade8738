//! Deterministic result ordering.
//!
//! Rows whose normalized combined name starts with one of the query's bare
//! words sort first (tier 0); within a tier, rows are ordered by a 32-bit
//! mix of the per-process session salt, a per-query seed, and the row
//! index. The same salt and query always produce the same permutation.

use super::index::{normalize_name, CardIndex, PrintingIndex};

/// FNV-1a over the raw query string, the per-query seed.
pub fn fnv1a(input: &str) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for byte in input.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x01000193);
    }
    hash
}

/// Combine salt, seed and row into a uniformly distributed rank. The
/// finalizer is the published lowbias32 mixer.
pub fn mix(salt: u32, seed: u32, row: u32) -> u32 {
    let mut h = salt
        ^ seed.wrapping_mul(0x9e3779b9)
        ^ row.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

/// Normalized bare words of a query, the prefix-tier needles.
pub fn prefix_needles(bare_values: &[&str]) -> Vec<String> {
    bare_values
        .iter()
        .map(|value| normalize_name(value))
        .filter(|needle| !needle.is_empty())
        .collect()
}

fn tier(index: &CardIndex, needles: &[String], canonical_face: u32) -> u8 {
    let name = &index.norm_combined[canonical_face as usize];
    if needles.iter().any(|needle| name.starts_with(needle)) {
        0
    } else {
        1
    }
}

/// Order canonical face indices in place.
pub fn order_faces(
    index: &CardIndex,
    canonical_faces: &mut [u32],
    needles: &[String],
    salt: u32,
    seed: u32,
) {
    canonical_faces.sort_by_key(|face| (tier(index, needles, *face), mix(salt, seed, *face)));
}

/// Order printing indices by their canonical face's rank, so printings of
/// one card stay contiguous and keep their stored order.
pub fn order_printings(
    cards: &CardIndex,
    printings: &PrintingIndex,
    rows: &mut [u32],
    needles: &[String],
    salt: u32,
    seed: u32,
) {
    rows.sort_by_key(|printing| {
        let canonical = printings.canonical_face_ref(*printing);
        (tier(cards, needles, canonical), mix(salt, seed, canonical))
    });
}
