use tracing::debug;

use crate::consts::{ASTERISM_SIZE, FINGERPRINT_LEN};
use crate::error::{Result, StarstackError};
use crate::frame::StarList;

/// Fingerprint of one 5-star combination.
#[derive(Clone, Debug, PartialEq)]
pub struct Fingerprint {
    /// Squared pairwise distances divided by the largest one, ascending.
    pub ratios: [f64; FINGERPRINT_LEN],
    /// Star-list indices of the combination, in enumeration order (a < b < c < d < e).
    ///
    /// This order is unrelated to the order of `ratios`.
    pub sequence: [usize; ASTERISM_SIZE],
}

/// All fingerprints of a star list, in canonical combination order.
#[derive(Clone, Debug, Default)]
pub struct FingerprintTable {
    fingerprints: Vec<Fingerprint>,
}

impl FingerprintTable {
    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Fingerprint> {
        self.fingerprints.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fingerprint> {
        self.fingerprints.iter()
    }

    pub fn as_slice(&self) -> &[Fingerprint] {
        &self.fingerprints
    }
}

/// Number of `k`-element combinations of `n` items.
pub fn combination_count(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}

/// Build the fingerprint table of a star list.
///
/// Combinations are enumerated lexicographically over star indices, so the
/// ones made of the brightest stars come first.
pub fn hash_stars(stars: &StarList) -> Result<FingerprintTable> {
    let n = stars.len();
    if n < ASTERISM_SIZE {
        return Err(StarstackError::InsufficientStars {
            found: n,
            required: ASTERISM_SIZE,
        });
    }

    let mut fingerprints = Vec::with_capacity(combination_count(n, ASTERISM_SIZE));
    for sequence in Combinations::new(n) {
        let points = sequence.map(|i| stars[i].position());
        fingerprints.push(Fingerprint {
            ratios: fingerprint_points(&points),
            sequence,
        });
    }

    debug!(stars = n, fingerprints = fingerprints.len(), "Star fingerprints built");
    Ok(FingerprintTable { fingerprints })
}

/// Fingerprint of five `(row, col)` points.
///
/// Coincident points (all distances zero) produce an all-zero vector.
pub fn fingerprint_points(points: &[(f64, f64); ASTERISM_SIZE]) -> [f64; FINGERPRINT_LEN] {
    let mut distances = [0.0f64; FINGERPRINT_LEN];
    let mut k = 0;
    for i in 0..ASTERISM_SIZE {
        for j in (i + 1)..ASTERISM_SIZE {
            let dr = points[i].0 - points[j].0;
            let dc = points[i].1 - points[j].1;
            distances[k] = dr * dr + dc * dc;
            k += 1;
        }
    }

    let max = distances.iter().copied().fold(0.0f64, f64::max);
    if max > 0.0 {
        for d in distances.iter_mut() {
            *d /= max;
        }
    }
    distances.sort_unstable_by(|a, b| a.total_cmp(b));
    distances
}

/// Lexicographic iterator over strictly increasing 5-index combinations of `0..n`.
struct Combinations {
    n: usize,
    current: Option<[usize; ASTERISM_SIZE]>,
}

impl Combinations {
    fn new(n: usize) -> Self {
        let current = if n >= ASTERISM_SIZE {
            Some(std::array::from_fn(|i| i))
        } else {
            None
        };
        Self { n, current }
    }
}

impl Iterator for Combinations {
    type Item = [usize; ASTERISM_SIZE];

    fn next(&mut self) -> Option<Self::Item> {
        let combo = self.current?;

        // Advance the rightmost position that still has room, then reset
        // everything to its right to consecutive values.
        let mut next = combo;
        let mut pos = ASTERISM_SIZE;
        while pos > 0 {
            pos -= 1;
            if next[pos] < self.n - ASTERISM_SIZE + pos {
                next[pos] += 1;
                for j in (pos + 1)..ASTERISM_SIZE {
                    next[j] = next[j - 1] + 1;
                }
                self.current = Some(next);
                return Some(combo);
            }
        }

        self.current = None;
        Some(combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_lexicographic() {
        let combos: Vec<_> = Combinations::new(6).collect();
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], [0, 1, 2, 3, 4]);
        assert_eq!(combos[1], [0, 1, 2, 3, 5]);
        assert_eq!(combos[5], [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_combinations_exact_size() {
        let combos: Vec<_> = Combinations::new(5).collect();
        assert_eq!(combos, vec![[0, 1, 2, 3, 4]]);
    }

    #[test]
    fn test_combinations_too_few() {
        assert_eq!(Combinations::new(4).count(), 0);
    }

    #[test]
    fn test_combination_count() {
        assert_eq!(combination_count(5, 5), 1);
        assert_eq!(combination_count(6, 5), 6);
        assert_eq!(combination_count(20, 5), 15_504);
        assert_eq!(combination_count(3, 5), 0);
    }
}
