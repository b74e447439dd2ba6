//! Versioned binary snapshots of a frame's complete in-memory state.
//!
//! Layout (little-endian):
//!
//! | field        | size              |
//! |--------------|-------------------|
//! | magic        | 8 bytes           |
//! | version      | u16               |
//! | height       | u32               |
//! | width        | u32               |
//! | channels     | u8 (always 3)     |
//! | status flags | u8                |
//! | star count   | u32               |
//! | stars        | 3 x f64 per star  |
//! | pixels       | u16, row-major, channel-interleaved |

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use memmap2::Mmap;
use ndarray::Array3;
use tracing::debug;

use crate::consts::{COLOR_CHANNEL_COUNT, SNAPSHOT_EXTENSION};
use crate::error::{Result, StarstackError};
use crate::frame::{Frame, FrameStatus, Star, StarList};

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"STSNAP\0\0";
pub const SNAPSHOT_VERSION: u16 = 1;
pub const SNAPSHOT_HEADER_SIZE: usize = 8 + 2 + 4 + 4 + 1 + 1 + 4;
const STAR_RECORD_SIZE: usize = 3 * 8;

/// Serialize `frame` into `w`.
pub fn encode_snapshot(w: &mut impl Write, frame: &Frame) -> Result<()> {
    let (h, width, channels) = frame.shape();
    w.write_all(SNAPSHOT_MAGIC)?;
    w.write_u16::<LittleEndian>(SNAPSHOT_VERSION)?;
    w.write_u32::<LittleEndian>(h as u32)?;
    w.write_u32::<LittleEndian>(width as u32)?;
    w.write_u8(channels as u8)?;
    w.write_u8(frame.status.to_bits())?;
    w.write_u32::<LittleEndian>(frame.stars.len() as u32)?;
    for star in &frame.stars {
        w.write_f64::<LittleEndian>(star.row)?;
        w.write_f64::<LittleEndian>(star.col)?;
        w.write_f64::<LittleEndian>(star.brightness)?;
    }
    for &v in frame.data.iter() {
        w.write_u16::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Parse a snapshot from raw bytes.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < SNAPSHOT_HEADER_SIZE {
        return Err(StarstackError::InvalidSnapshot(
            "file too small for snapshot header".into(),
        ));
    }

    let mut cursor = Cursor::new(bytes);
    let mut magic = [0u8; 8];
    cursor.read_exact(&mut magic)?;
    if &magic != SNAPSHOT_MAGIC {
        return Err(StarstackError::InvalidSnapshot("missing STSNAP magic".into()));
    }

    let version = cursor.read_u16::<LittleEndian>()?;
    if version != SNAPSHOT_VERSION {
        return Err(StarstackError::InvalidSnapshot(format!(
            "unsupported snapshot version {version}"
        )));
    }

    let h = cursor.read_u32::<LittleEndian>()? as usize;
    let w = cursor.read_u32::<LittleEndian>()? as usize;
    let channels = cursor.read_u8()? as usize;
    if channels != COLOR_CHANNEL_COUNT {
        return Err(StarstackError::InvalidSnapshot(format!(
            "expected {COLOR_CHANNEL_COUNT} channels, found {channels}"
        )));
    }
    let status = FrameStatus::from_bits(cursor.read_u8()?);
    let star_count = cursor.read_u32::<LittleEndian>()? as usize;

    let pixel_count = h
        .checked_mul(w)
        .and_then(|p| p.checked_mul(channels))
        .ok_or_else(|| StarstackError::InvalidSnapshot("image dimensions too large".into()))?;
    let expected = star_count
        .checked_mul(STAR_RECORD_SIZE)
        .zip(pixel_count.checked_mul(2))
        .and_then(|(stars, pixels)| stars.checked_add(pixels))
        .and_then(|payload| payload.checked_add(SNAPSHOT_HEADER_SIZE))
        .ok_or_else(|| StarstackError::InvalidSnapshot("declared payload too large".into()))?;
    if bytes.len() < expected {
        return Err(StarstackError::InvalidSnapshot(format!(
            "truncated: expected {expected} bytes, got {}",
            bytes.len()
        )));
    }

    let mut stars = Vec::with_capacity(star_count);
    for _ in 0..star_count {
        let row = cursor.read_f64::<LittleEndian>()?;
        let col = cursor.read_f64::<LittleEndian>()?;
        let brightness = cursor.read_f64::<LittleEndian>()?;
        stars.push(Star::new(row, col, brightness));
    }

    let start = cursor.position() as usize;
    let mut pixels = vec![0u16; pixel_count];
    LittleEndian::read_u16_into(&bytes[start..start + pixel_count * 2], &mut pixels);
    let data = Array3::from_shape_vec((h, w, channels), pixels)
        .map_err(|e| StarstackError::InvalidSnapshot(e.to_string()))?;

    // Snapshots are written from sorted lists; keep every stored star.
    let star_cap = stars.len();
    Ok(Frame {
        data,
        status,
        stars: StarList::new(stars, star_cap),
    })
}

pub fn write_snapshot(path: &Path, frame: &Frame) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_snapshot(&mut writer, frame)?;
    writer.flush()?;
    debug!(path = %path.display(), "Snapshot written");
    Ok(())
}

/// Memory-map and decode a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Frame> {
    let file = File::open(path).map_err(|e| StarstackError::FileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mmap = unsafe { Mmap::map(&file)? };
    decode_snapshot(&mmap)
}

/// Durable storage for frames between batch steps and stacking passes.
pub trait FrameStore: Send + Sync {
    /// Persist frame number `index`, returning where it went.
    fn save(&self, index: usize, frame: &Frame) -> Result<PathBuf>;

    fn load(&self, path: &Path) -> Result<Frame>;
}

/// [`FrameStore`] writing one snapshot file per frame into a directory.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("frame_{index:04}.{SNAPSHOT_EXTENSION}"))
    }
}

impl FrameStore for SnapshotStore {
    fn save(&self, index: usize, frame: &Frame) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(index);
        write_snapshot(&path, frame)?;
        Ok(path)
    }

    fn load(&self, path: &Path) -> Result<Frame> {
        read_snapshot(path)
    }
}
