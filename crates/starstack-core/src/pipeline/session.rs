use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, StarstackError};
use crate::flat::normalize_frame;
use crate::frame::{Frame, StarList};
use crate::register::{register_frame, ReferenceContext, RegistrationOutcome};
use crate::solver::PlateSolver;

use super::config::{BatchConfig, FlatConfig, MatchConfig, RegistrationConfig};
use super::types::Alignment;

/// Owner of the alignment reference and of the per-frame processing chain.
///
/// All reference mutation goes through `&mut self`, so whoever holds the
/// session is its only writer.
#[derive(Clone, Debug, Default)]
pub struct Session {
    reference: Option<ReferenceContext>,
    flat: FlatConfig,
    matching: MatchConfig,
    registration: RegistrationConfig,
}

impl Session {
    pub fn new(config: &BatchConfig) -> Self {
        Self {
            reference: None,
            flat: config.flat.clone(),
            matching: config.matching.clone(),
            registration: config.registration.clone(),
        }
    }

    pub fn reference(&self) -> Option<&ReferenceContext> {
        self.reference.as_ref()
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Replace the current reference wholesale.
    pub fn set_reference(&mut self, reference: ReferenceContext) {
        if self.reference.is_some() {
            info!("Replacing alignment reference");
        }
        self.reference = Some(reference);
    }

    pub fn clear_reference(&mut self) -> Option<ReferenceContext> {
        self.reference.take()
    }

    /// Normalize, solve, fingerprint and register `frame` in place.
    ///
    /// Without a reference the frame's own stars become the reference and the
    /// frame is registered onto itself. Any failure leaves both `frame` and
    /// the session unchanged.
    pub fn process_frame(
        &mut self,
        frame: &mut Frame,
        source: &Path,
        solver: &dyn PlateSolver,
    ) -> Result<Alignment> {
        let mut work = frame.clone();

        normalize_frame(&mut work, &self.flat)?;

        if !work.status.solved {
            let stars = solver.solve(&work, source)?;
            let capped = StarList::new(stars.as_slice().to_vec(), self.matching.max_stars);
            debug!(stars = capped.len(), "Frame solved");
            work.set_stars(capped);
        }

        let adopted = match self.reference {
            Some(_) => None,
            None => Some(ReferenceContext::new(work.stars.clone())?),
        };
        let reference = adopted
            .as_ref()
            .or(self.reference.as_ref())
            .ok_or_else(|| StarstackError::InvalidRegistrationInput("no reference".into()))?;

        let (matched, correspondence) =
            reference.correspond(&work.stars, self.matching.epsilon)?;
        let outcome = register_frame(
            &mut work,
            &correspondence,
            reference.stars(),
            &self.registration,
        )?;

        let (angle, translation) = match &outcome {
            RegistrationOutcome::Applied(t) => (t.angle, t.net_translation()),
            RegistrationOutcome::AlreadyRegistered => (0.0, (0.0, 0.0)),
        };
        let alignment = Alignment {
            reference: adopted.is_some(),
            distance: matched.distance,
            angle,
            translation,
        };

        *frame = work;
        if let Some(context) = adopted {
            info!(stars = context.stars().len(), "Adopted alignment reference");
            self.reference = Some(context);
        }
        Ok(alignment)
    }
}
