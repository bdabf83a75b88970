//! MinHash signature computation over weighted coverage sets.

use xxhash_rust::xxh64::xxh64;

use crate::core::{Fingerprint, FINGERPRINT_SIZE};

/// Seeds for the two 32-bit base hashes derived from each line key.
const BASE_SEED_LO: u64 = 0x9747_b28c;
const BASE_SEED_HI: u64 = 0x2545_f491_4f6c_dd1d;

/// Scale factor: the maximum representable non-negative integer. Positions
/// divide by this, so unweighted signatures sit close to zero. That is the
/// observed behavior and fingerprints are diagnostic-only; keep it.
const HASH_SCALE: f64 = i64::MAX as f64;

/// One per-position hash family `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedTriple {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

/// The 256 per-position seed triples, derived deterministically from the
/// position index. The same triples are reused for every test in a run.
pub fn seed_triples() -> [SeedTriple; FINGERPRINT_SIZE] {
    let mut seeds = [SeedTriple { a: 0, b: 0, c: 0 }; FINGERPRINT_SIZE];
    for (i, seed) in seeds.iter_mut().enumerate() {
        let mut state = splitmix64(i as u64 + 1);
        // Multipliers must be odd so no hash family collapses to a constant
        seed.a = (state as u32) | 1;
        state = splitmix64(state);
        seed.b = (state as u32) | 1;
        state = splitmix64(state);
        seed.c = state as u32;
    }
    seeds
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Positional hash array for a single line key: 256 non-negative values,
/// one per seed triple.
pub fn line_hashes(key: &str, seeds: &[SeedTriple; FINGERPRINT_SIZE]) -> Vec<u64> {
    let h1 = xxh64(key.as_bytes(), BASE_SEED_LO) as u32;
    let h2 = xxh64(key.as_bytes(), BASE_SEED_HI) as u32;

    seeds
        .iter()
        .map(|seed| {
            let mixed = (h1 as i64)
                .wrapping_mul(seed.a as i64)
                .wrapping_add((h2 as i64).wrapping_mul(seed.b as i64))
                ^ seed.c as i64;
            mixed.unsigned_abs()
        })
        .collect()
}

/// Fold one line's positional hashes into a running signature, dividing each
/// position by the line's IDF weight first. A larger weight shrinks the
/// value, so rare lines are more likely to win the per-position minimum.
pub fn fold_line(signature: &mut [f64; FINGERPRINT_SIZE], hashes: &[u64], weight: f64) {
    assert_eq!(
        hashes.len(),
        FINGERPRINT_SIZE,
        "fingerprint dimension mismatch: have {}, want {}",
        hashes.len(),
        FINGERPRINT_SIZE
    );
    for (slot, &hash) in signature.iter_mut().zip(hashes) {
        let weighted = hash as f64 / weight;
        if weighted < *slot {
            *slot = weighted;
        }
    }
}

/// Normalize a finished signature into [0, 1].
pub fn normalize(signature: [f64; FINGERPRINT_SIZE]) -> Fingerprint {
    signature.iter().map(|&v| v / HASH_SCALE).collect()
}

/// A signature's starting state before any line is folded in.
pub fn empty_signature() -> [f64; FINGERPRINT_SIZE] {
    [f64::INFINITY; FINGERPRINT_SIZE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_are_deterministic() {
        let first = seed_triples();
        let second = seed_triples();
        assert_eq!(first[0], second[0]);
        assert_eq!(first[255], second[255]);
    }

    #[test]
    fn test_seeds_are_distinct_across_positions() {
        let seeds = seed_triples();
        assert_ne!(seeds[0], seeds[1]);
        assert_ne!(seeds[1], seeds[255]);
    }

    #[test]
    fn test_multipliers_are_odd() {
        for seed in seed_triples() {
            assert_eq!(seed.a % 2, 1);
            assert_eq!(seed.b % 2, 1);
        }
    }

    #[test]
    fn test_line_hashes_deterministic_and_distinct() {
        let seeds = seed_triples();
        let a = line_hashes("a.php:1", &seeds);
        let b = line_hashes("a.php:1", &seeds);
        let c = line_hashes("a.php:2", &seeds);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), FINGERPRINT_SIZE);
    }

    #[test]
    fn test_fold_takes_weighted_minimum() {
        let mut signature = empty_signature();
        let hashes = vec![100u64; FINGERPRINT_SIZE];
        fold_line(&mut signature, &hashes, 1.0);
        assert_eq!(signature[0], 100.0);

        // A rarer line (idf 2.0) halves its hash and wins the minimum
        let rare = vec![150u64; FINGERPRINT_SIZE];
        fold_line(&mut signature, &rare, 2.0);
        assert_eq!(signature[0], 75.0);
    }

    #[test]
    #[should_panic(expected = "fingerprint dimension mismatch")]
    fn test_dimension_mismatch_panics() {
        let mut signature = empty_signature();
        fold_line(&mut signature, &[1, 2, 3], 1.0);
    }

    #[test]
    fn test_normalized_values_in_unit_interval() {
        let seeds = seed_triples();
        let mut signature = empty_signature();
        fold_line(&mut signature, &line_hashes("a.php:1", &seeds), 1.0);
        let fingerprint = normalize(signature);
        assert!(fingerprint.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
