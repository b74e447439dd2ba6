//! Rotate + translate registration of a frame onto the reference grid.

pub mod reference;
pub mod registrar;
pub mod transform;
pub mod warp;

pub use reference::{Correspondence, ReferenceContext};
pub use registrar::{measure_brightness, register_frame, RegistrationOutcome};
pub use transform::RegistrationTransform;
pub use warp::warp_frame;
