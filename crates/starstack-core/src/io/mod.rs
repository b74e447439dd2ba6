pub mod image_io;
pub mod snapshot;
pub mod stars;

pub use image_io::{load_image, save_image, FrameDecoder, ImageDecoder, ImageSink, OutputSink};
pub use snapshot::{read_snapshot, write_snapshot, FrameStore, SnapshotStore};
pub use stars::{load_star_sidecar, save_star_sidecar, sidecar_path, StarSidecar};
