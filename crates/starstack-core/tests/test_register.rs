mod common;

use approx::assert_abs_diff_eq;
use starstack_core::consts::DEFAULT_MATCH_EPSILON;
use starstack_core::error::StarstackError;
use starstack_core::frame::StarList;
use starstack_core::pipeline::config::RegistrationConfig;
use starstack_core::register::{
    measure_brightness, register_frame, Correspondence, ReferenceContext, RegistrationOutcome,
    RegistrationTransform,
};

use common::{quarter_turn, render_stars, solved_frame, star_field};

const SIZE: usize = 96;

// ---------------------------------------------------------------------------
// Transform geometry
// ---------------------------------------------------------------------------

#[test]
fn test_identity_correspondence_has_no_motion() {
    let points: Vec<(f64, f64)> = star_field()[..5].iter().map(|s| s.position()).collect();
    let corr = Correspondence::new(points.clone(), points);
    let t = RegistrationTransform::plan(&corr, SIZE, SIZE).unwrap();

    assert_eq!(t.angle, 0.0);
    let (dr, dc) = t.net_translation();
    assert_abs_diff_eq!(dr, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(dc, 0.0, epsilon = 1e-12);
}

#[test]
fn test_forward_inverse_round_trip() {
    let reference: Vec<(f64, f64)> = star_field()[..5].iter().map(|s| s.position()).collect();
    let target: Vec<(f64, f64)> = quarter_turn(&star_field()[..5], (48.0, 48.0), (3.0, -2.0))
        .iter()
        .map(|s| s.position())
        .collect();
    let t = RegistrationTransform::plan(&Correspondence::new(reference.clone(), target.clone()), SIZE, SIZE)
        .unwrap();

    for (r, tg) in reference.iter().zip(target.iter()) {
        let mapped = t.forward(*tg);
        assert_abs_diff_eq!(mapped.0, r.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mapped.1, r.1, epsilon = 1e-9);
        let back = t.inverse(mapped);
        assert_abs_diff_eq!(back.0, tg.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back.1, tg.1, epsilon = 1e-9);
    }
}

#[test]
fn test_paddings_cover_offsets() {
    let reference = vec![(10.3, 12.0), (20.0, 14.0), (15.0, 30.0), (8.0, 22.0), (18.0, 25.0)];
    let target = vec![(60.0, 70.0), (70.0, 72.0), (65.0, 88.0), (58.0, 80.0), (68.0, 83.0)];
    let t = RegistrationTransform::plan(&Correspondence::new(reference, target), SIZE, SIZE)
        .unwrap();

    assert!(t.pre_pad.0 as f64 >= t.pre_shift.0.abs());
    assert!(t.pre_pad.1 as f64 >= t.pre_shift.1.abs());
    assert!(t.post_pad.0 as f64 >= t.post_shift.0.abs());
    assert!(t.post_pad.1 as f64 >= t.post_shift.1.abs());

    let (ch, cw) = t.canvas_shape();
    assert!(ch >= SIZE && cw >= SIZE);
    let (or, oc) = t.crop_offset();
    assert_eq!(ch, SIZE + 2 * or);
    assert_eq!(cw, SIZE + 2 * oc);
}

#[test]
fn test_short_correspondence_rejected() {
    let points = vec![(1.0, 1.0), (2.0, 5.0), (7.0, 3.0), (4.0, 4.0)];
    let corr = Correspondence::new(points.clone(), points);
    assert!(matches!(
        RegistrationTransform::plan(&corr, SIZE, SIZE),
        Err(StarstackError::InvalidRegistrationInput(_))
    ));
}

// ---------------------------------------------------------------------------
// register_frame
// ---------------------------------------------------------------------------

#[test]
fn test_self_registration_is_pixel_identical() {
    let stars = star_field();
    let mut frame = solved_frame(SIZE, SIZE, &stars);
    let original = frame.data.clone();

    let context = ReferenceContext::from_frame(&frame).unwrap();
    let (_, corr) = context.correspond(&frame.stars, DEFAULT_MATCH_EPSILON).unwrap();
    let outcome =
        register_frame(&mut frame, &corr, context.stars(), &RegistrationConfig::default()).unwrap();

    match outcome {
        RegistrationOutcome::Applied(t) => {
            assert_eq!(t.angle, 0.0);
            let (dr, dc) = t.net_translation();
            assert_abs_diff_eq!(dr, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(dc, 0.0, epsilon = 1e-12);
        }
        RegistrationOutcome::AlreadyRegistered => panic!("frame was not registered yet"),
    }
    assert_eq!(frame.data, original);
    assert!(frame.status.registered);
    assert!(!frame.status.solved);
}

#[test]
fn test_quarter_turn_registers_onto_reference() {
    let center = (48.0, 48.0);
    let shift = (3.0, -2.0);
    let reference_stars = star_field();
    let reference = render_stars(SIZE, SIZE, &reference_stars);

    let target_stars = quarter_turn(&reference_stars, center, shift);
    let mut target = solved_frame(SIZE, SIZE, &target_stars);

    let context = ReferenceContext::new(StarList::brightest(reference_stars)).unwrap();
    let (m, corr) = context.correspond(&target.stars, DEFAULT_MATCH_EPSILON).unwrap();
    assert!(m.distance < 1e-12);

    let outcome =
        register_frame(&mut target, &corr, context.stars(), &RegistrationConfig::default())
            .unwrap();
    let RegistrationOutcome::Applied(t) = outcome else {
        panic!("expected a fresh registration");
    };
    assert_abs_diff_eq!(t.angle.sin().abs(), 1.0, epsilon = 1e-9);

    // Away from the borders every pixel has a source; the quarter turn about
    // an integer center with an integer shift resamples on exact grid points.
    for row in 10..SIZE - 10 {
        for col in 10..SIZE - 10 {
            for ch in 0..3 {
                let a = reference.data[[row, col, ch]] as i32;
                let b = target.data[[row, col, ch]] as i32;
                assert!((a - b).abs() <= 1, "pixel ({row}, {col}) differs: {a} vs {b}");
            }
        }
    }
}

#[test]
fn test_brightness_refreshed_from_reference_positions() {
    let stars = star_field();
    let mut frame = solved_frame(SIZE, SIZE, &stars);
    let context = ReferenceContext::from_frame(&frame).unwrap();
    let (_, corr) = context.correspond(&frame.stars, DEFAULT_MATCH_EPSILON).unwrap();
    let config = RegistrationConfig {
        brightness_radius: 3,
    };
    register_frame(&mut frame, &corr, context.stars(), &config).unwrap();

    assert_eq!(frame.stars.len(), context.stars().len());
    for star in frame.stars.iter() {
        let expected = measure_brightness(&frame.data, star.row, star.col, 3);
        assert_eq!(star.brightness, expected);
    }
    assert!(frame
        .stars
        .iter()
        .zip(frame.stars.iter().skip(1))
        .all(|(a, b)| a.brightness >= b.brightness));
}

#[test]
fn test_unnormalized_frame_rejected() {
    let stars = star_field();
    let mut frame = solved_frame(SIZE, SIZE, &stars);
    frame.status.normalized = false;
    let before = frame.clone();

    let context = ReferenceContext::from_frame(&frame).unwrap();
    let (_, corr) = context.correspond(&frame.stars, DEFAULT_MATCH_EPSILON).unwrap();
    let result = register_frame(&mut frame, &corr, context.stars(), &RegistrationConfig::default());

    assert!(matches!(result, Err(StarstackError::InvalidRegistrationInput(_))));
    assert_eq!(frame.data, before.data);
    assert_eq!(frame.status, before.status);
}

#[test]
fn test_too_few_correspondences_leave_frame_untouched() {
    let stars = star_field();
    let mut frame = solved_frame(SIZE, SIZE, &stars);
    let before = frame.status;
    let points: Vec<(f64, f64)> = stars[..3].iter().map(|s| s.position()).collect();
    let corr = Correspondence::new(points.clone(), points);

    let result = register_frame(
        &mut frame,
        &corr,
        &StarList::brightest(stars),
        &RegistrationConfig::default(),
    );
    assert!(matches!(result, Err(StarstackError::InvalidRegistrationInput(_))));
    assert_eq!(frame.status, before);
}

#[test]
fn test_registration_is_idempotent() {
    let stars = star_field();
    let mut frame = solved_frame(SIZE, SIZE, &stars);
    let context = ReferenceContext::from_frame(&frame).unwrap();
    let (_, corr) = context.correspond(&frame.stars, DEFAULT_MATCH_EPSILON).unwrap();
    let config = RegistrationConfig::default();

    register_frame(&mut frame, &corr, context.stars(), &config).unwrap();
    let after_first = frame.data.clone();
    let outcome = register_frame(&mut frame, &corr, context.stars(), &config).unwrap();

    assert_eq!(outcome, RegistrationOutcome::AlreadyRegistered);
    assert_eq!(frame.data, after_first);
}

#[test]
fn test_measure_brightness_window() {
    let frame = render_stars(16, 16, &[]);
    // 61x61 window clipped to 16x16, three channels at the background level.
    let total = measure_brightness(&frame.data, 8.0, 8.0, 30);
    assert_eq!(total, 16.0 * 16.0 * 3.0 * common::BACKGROUND);
    // 3x3 window.
    assert_eq!(measure_brightness(&frame.data, 8.2, 7.6, 1), 27.0 * common::BACKGROUND);
}
