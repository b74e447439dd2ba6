use ndarray::Array3;
use starstack_core::error::StarstackError;
use starstack_core::frame::Frame;
use starstack_core::io::image_io::{save_png, save_tiff};
use starstack_core::io::{load_image, FrameDecoder, ImageDecoder, ImageSink, OutputSink};

fn gradient_frame() -> Frame {
    let mut data = Array3::<u16>::zeros((6, 5, 3));
    for ((r, c, ch), v) in data.indexed_iter_mut() {
        *v = (r * 10_000 + c * 1_000 + ch * 7) as u16;
    }
    Frame::new(data)
}

#[test]
fn test_tiff_round_trip_is_exact() {
    let frame = gradient_frame();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.tiff");

    save_tiff(&frame, &path).unwrap();
    let loaded = load_image(&path).unwrap();

    assert_eq!(loaded.shape(), (6, 5, 3));
    assert_eq!(loaded.data, frame.data);
    assert!(loaded.status.loaded);
    assert!(!loaded.status.normalized);
    assert!(loaded.stars.is_empty());
}

#[test]
fn test_png_keeps_high_byte() {
    let frame = gradient_frame();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");

    save_png(&frame, &path).unwrap();
    let loaded = load_image(&path).unwrap();

    // 8-bit samples come back scaled to 16 bits (v * 257).
    for (orig, back) in frame.data.iter().zip(loaded.data.iter()) {
        assert_eq!(*back, (orig >> 8) * 257);
    }
}

#[test]
fn test_sink_picks_format_from_extension() {
    let frame = gradient_frame();
    let dir = tempfile::tempdir().unwrap();

    let png = dir.path().join("out.PNG");
    ImageSink.write(&frame, &png).unwrap();
    let bytes = std::fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let other = dir.path().join("out.tif");
    ImageSink.write(&frame, &other).unwrap();
    assert_eq!(ImageDecoder.decode(&other).unwrap().data, frame.data);
}

#[test]
fn test_missing_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let result = ImageDecoder.decode(&dir.path().join("missing.tiff"));
    assert!(matches!(result, Err(StarstackError::FileUnreadable { .. })));
}

#[test]
fn test_garbage_is_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();
    let result = load_image(&path);
    assert!(matches!(result, Err(StarstackError::DecodeFailure { .. })));
}

#[test]
fn test_grey_image_promoted_to_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grey.png");
    let img = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::from_fn(4, 3, |x, y| {
        image::Luma([(x * 100 + y * 1000) as u16])
    });
    img.save(&path).unwrap();

    let frame = load_image(&path).unwrap();
    assert_eq!(frame.shape(), (3, 4, 3));
    assert_eq!(frame.data[[2, 3, 0]], 2300);
    assert_eq!(frame.data[[2, 3, 1]], 2300);
    assert_eq!(frame.data[[2, 3, 2]], 2300);
}
