use tracing::{debug, info};

use crate::consts::{ASTERISM_SIZE, FINGERPRINT_LEN};
use crate::error::{Result, StarstackError};

use super::fingerprint::FingerprintTable;
use super::kdtree::KdTree;

/// An accepted fingerprint correspondence between a reference and a target table.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternMatch {
    /// Index of the matched fingerprint in the reference table.
    pub reference_index: usize,
    /// Index of the matched fingerprint in the target table.
    pub target_index: usize,
    pub reference_sequence: [usize; ASTERISM_SIZE],
    pub target_sequence: [usize; ASTERISM_SIZE],
    /// Euclidean distance between the two fingerprints (always below epsilon).
    pub distance: f64,
}

/// Nearest-neighbour index over a reference fingerprint table.
pub struct PatternMatcher<'a> {
    reference: &'a FingerprintTable,
    tree: KdTree<FINGERPRINT_LEN>,
    epsilon: f64,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(reference: &'a FingerprintTable, epsilon: f64) -> Self {
        let points: Vec<[f64; FINGERPRINT_LEN]> = reference.iter().map(|f| f.ratios).collect();
        Self {
            reference,
            tree: KdTree::build(&points),
            epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Find the first target fingerprint whose nearest reference fingerprint
    /// lies closer than epsilon.
    ///
    /// Target fingerprints are tried in table order, so combinations of the
    /// brightest stars win over better matches found later.
    pub fn find_match(&self, target: &FingerprintTable) -> Result<PatternMatch> {
        let mut best_distance = f64::INFINITY;

        for (target_index, fp) in target.iter().enumerate() {
            let Some((reference_index, distance)) = self.tree.nearest(&fp.ratios) else {
                break;
            };

            if distance < self.epsilon {
                let reference_sequence = self.reference.as_slice()[reference_index].sequence;
                info!(
                    reference = reference_index,
                    target = target_index,
                    distance,
                    "Fingerprint match accepted"
                );
                return Ok(PatternMatch {
                    reference_index,
                    target_index,
                    reference_sequence,
                    target_sequence: fp.sequence,
                    distance,
                });
            }
            best_distance = best_distance.min(distance);
        }

        debug!(
            candidates = target.len(),
            best_distance, "No fingerprint below epsilon"
        );
        Err(StarstackError::NoMatchFound {
            epsilon: self.epsilon,
            best_distance,
        })
    }
}

/// Build a matcher over `reference` and run it against `target`.
pub fn match_fingerprints(
    reference: &FingerprintTable,
    target: &FingerprintTable,
    epsilon: f64,
) -> Result<PatternMatch> {
    PatternMatcher::new(reference, epsilon).find_match(target)
}
