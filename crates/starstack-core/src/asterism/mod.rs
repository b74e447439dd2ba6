//! Star-pattern fingerprints and fingerprint matching.
//!
//! Every 5-star combination of a brightness-sorted star list is reduced to a
//! vector of 10 normalised squared distances. The vector does not change
//! under translation, rotation, uniform scaling or reflection of the stars,
//! so the same asterism seen in two exposures yields (nearly) the same
//! fingerprint and can be found with a nearest-neighbour query.

pub mod fingerprint;
pub mod kdtree;
pub mod matcher;

pub use fingerprint::{combination_count, fingerprint_points, hash_stars, Fingerprint, FingerprintTable};
pub use matcher::{match_fingerprints, PatternMatch, PatternMatcher};
