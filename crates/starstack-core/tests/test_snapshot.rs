use starstack_core::error::StarstackError;
use starstack_core::frame::{Frame, FrameStatus, Star, StarList};
use starstack_core::io::snapshot::{
    decode_snapshot, encode_snapshot, SNAPSHOT_HEADER_SIZE, SNAPSHOT_MAGIC,
};
use starstack_core::io::{read_snapshot, write_snapshot, FrameStore, SnapshotStore};

fn sample_frame() -> Frame {
    let mut frame = Frame::filled(5, 7, 0);
    for (i, v) in frame.data.iter_mut().enumerate() {
        *v = (i * 613 % 65536) as u16;
    }
    frame.status = FrameStatus {
        loaded: true,
        normalized: true,
        registered: false,
        solved: true,
    };
    frame.stars = StarList::brightest(vec![
        Star::new(1.25, 2.5, 900.0),
        Star::new(3.0, 6.75, 1200.5),
        Star::new(0.0, 0.0, 10.0),
    ]);
    frame
}

fn encoded(frame: &Frame) -> Vec<u8> {
    let mut bytes = Vec::new();
    encode_snapshot(&mut bytes, frame).unwrap();
    bytes
}

#[test]
fn test_round_trip_file() {
    let frame = sample_frame();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.stsnap");

    write_snapshot(&path, &frame).unwrap();
    let restored = read_snapshot(&path).unwrap();

    assert_eq!(restored.data, frame.data);
    assert_eq!(restored.status, frame.status);
    assert_eq!(restored.stars, frame.stars);
}

#[test]
fn test_layout() {
    let frame = sample_frame();
    let bytes = encoded(&frame);
    assert_eq!(&bytes[..8], SNAPSHOT_MAGIC);
    assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 1);
    assert_eq!(u32::from_le_bytes(bytes[10..14].try_into().unwrap()), 5);
    assert_eq!(u32::from_le_bytes(bytes[14..18].try_into().unwrap()), 7);
    assert_eq!(bytes[18], 3);
    assert_eq!(bytes[19], frame.status.to_bits());
    assert_eq!(u32::from_le_bytes(bytes[20..24].try_into().unwrap()), 3);
    assert_eq!(bytes.len(), SNAPSHOT_HEADER_SIZE + 3 * 24 + 5 * 7 * 3 * 2);
}

#[test]
fn test_flag_bits() {
    let status = FrameStatus {
        loaded: true,
        normalized: false,
        registered: true,
        solved: true,
    };
    assert_eq!(status.to_bits(), 0b1101);
    assert_eq!(FrameStatus::from_bits(0b1101), status);
}

#[test]
fn test_bad_magic_rejected() {
    let mut bytes = encoded(&sample_frame());
    bytes[0] = b'X';
    assert!(matches!(
        decode_snapshot(&bytes),
        Err(StarstackError::InvalidSnapshot(_))
    ));
}

#[test]
fn test_unknown_version_rejected() {
    let mut bytes = encoded(&sample_frame());
    bytes[8] = 2;
    assert!(matches!(
        decode_snapshot(&bytes),
        Err(StarstackError::InvalidSnapshot(_))
    ));
}

#[test]
fn test_truncated_rejected() {
    let bytes = encoded(&sample_frame());
    for cut in [4, SNAPSHOT_HEADER_SIZE, bytes.len() - 1] {
        assert!(
            matches!(
                decode_snapshot(&bytes[..cut]),
                Err(StarstackError::InvalidSnapshot(_))
            ),
            "cut at {cut}"
        );
    }
}

#[test]
fn test_oversized_header_rejected() {
    let bytes = encoded(&sample_frame());

    // Huge star count: the declared payload cannot be present.
    let mut many_stars = bytes.clone();
    many_stars[20..24].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(matches!(
        decode_snapshot(&many_stars),
        Err(StarstackError::InvalidSnapshot(_))
    ));

    // 2^31 x 2^31 x 3 pixels fit in a usize, their byte length does not.
    let mut huge = bytes;
    huge[10..14].copy_from_slice(&(1u32 << 31).to_le_bytes());
    huge[14..18].copy_from_slice(&(1u32 << 31).to_le_bytes());
    assert!(matches!(
        decode_snapshot(&huge),
        Err(StarstackError::InvalidSnapshot(_))
    ));
}

#[test]
fn test_missing_file_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        read_snapshot(&dir.path().join("nope.stsnap")),
        Err(StarstackError::FileUnreadable { .. })
    ));
}

#[test]
fn test_store_names_files_by_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("work"));
    let path = store.save(12, &sample_frame()).unwrap();

    assert_eq!(path.file_name().unwrap(), "frame_0012.stsnap");
    assert!(path.exists());
    let restored = store.load(&path).unwrap();
    assert_eq!(restored.data, sample_frame().data);
}
