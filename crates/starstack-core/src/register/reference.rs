use tracing::info;

use crate::asterism::{hash_stars, FingerprintTable, PatternMatch, PatternMatcher};
use crate::consts::ASTERISM_SIZE;
use crate::error::{Result, StarstackError};
use crate::frame::{Frame, StarList};

/// Two groups of matched star positions: one in the reference frame, one in
/// the target frame.
///
/// Registration only uses each group's centroid and its outermost star, so
/// the pairing order inside the groups is irrelevant.
#[derive(Clone, Debug, PartialEq)]
pub struct Correspondence {
    pub reference: Vec<(f64, f64)>,
    pub target: Vec<(f64, f64)>,
}

impl Correspondence {
    pub fn new(reference: Vec<(f64, f64)>, target: Vec<(f64, f64)>) -> Self {
        Self { reference, target }
    }

    /// Resolve the star indices of a fingerprint match into positions.
    pub fn from_match(
        matched: &PatternMatch,
        reference: &StarList,
        target: &StarList,
    ) -> Result<Self> {
        let lookup = |stars: &StarList, sequence: &[usize; ASTERISM_SIZE], side: &str| {
            sequence
                .iter()
                .map(|&i| {
                    if i < stars.len() {
                        Ok(stars[i].position())
                    } else {
                        Err(StarstackError::InvalidRegistrationInput(format!(
                            "{side} star index {i} out of range ({} stars)",
                            stars.len()
                        )))
                    }
                })
                .collect::<Result<Vec<_>>>()
        };

        Ok(Self {
            reference: lookup(reference, &matched.reference_sequence, "reference")?,
            target: lookup(target, &matched.target_sequence, "target")?,
        })
    }

    /// Check the correspondence is usable for registration.
    pub fn validate(&self) -> Result<()> {
        if self.reference.len() < ASTERISM_SIZE || self.target.len() < ASTERISM_SIZE {
            return Err(StarstackError::InvalidRegistrationInput(format!(
                "need {ASTERISM_SIZE} matched stars per side, got {} reference / {} target",
                self.reference.len(),
                self.target.len()
            )));
        }
        if self.reference.len() != self.target.len() {
            return Err(StarstackError::InvalidRegistrationInput(format!(
                "unbalanced correspondence: {} reference vs {} target stars",
                self.reference.len(),
                self.target.len()
            )));
        }
        let finite = |pts: &[(f64, f64)]| pts.iter().all(|(r, c)| r.is_finite() && c.is_finite());
        if !finite(&self.reference) || !finite(&self.target) {
            return Err(StarstackError::InvalidRegistrationInput(
                "non-finite star position".into(),
            ));
        }
        Ok(())
    }
}

/// The frame every other frame is aligned to: its stars and fingerprints.
///
/// A session holds at most one; adopting a new reference replaces the old
/// context entirely.
#[derive(Clone, Debug)]
pub struct ReferenceContext {
    table: FingerprintTable,
    stars: StarList,
}

impl ReferenceContext {
    pub fn new(stars: StarList) -> Result<Self> {
        let table = hash_stars(&stars)?;
        info!(
            stars = stars.len(),
            fingerprints = table.len(),
            "Reference context built"
        );
        Ok(Self { table, stars })
    }

    /// Build a context from a solved frame.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        if !frame.status.solved {
            return Err(StarstackError::InsufficientStars {
                found: 0,
                required: ASTERISM_SIZE,
            });
        }
        Self::new(frame.stars.clone())
    }

    pub fn table(&self) -> &FingerprintTable {
        &self.table
    }

    pub fn stars(&self) -> &StarList {
        &self.stars
    }

    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.stars.positions()
    }

    /// Match a target star list against this reference.
    pub fn correspond(
        &self,
        target_stars: &StarList,
        epsilon: f64,
    ) -> Result<(PatternMatch, Correspondence)> {
        let target_table = hash_stars(target_stars)?;
        let matched = PatternMatcher::new(&self.table, epsilon).find_match(&target_table)?;
        let correspondence = Correspondence::from_match(&matched, &self.stars, target_stars)?;
        Ok((matched, correspondence))
    }
}
