mod common;

use std::path::Path;

use starstack_core::error::StarstackError;
use starstack_core::frame::Star;
use starstack_core::io::{load_star_sidecar, sidecar_path, StarSidecar};
use starstack_core::pipeline::config::DetectConfig;
use starstack_core::solver::{
    detect_stars, field_of_view_arcmin, pixel_scale, DetectingSolver, PlateSolver, ScaleRange,
    SidecarSolver,
};

use common::{render_stars, star_field, write_sidecar};

// ---------------------------------------------------------------------------
// Sidecar solver
// ---------------------------------------------------------------------------

#[test]
fn test_sidecar_path() {
    assert_eq!(
        sidecar_path(Path::new("/data/m31/light_001.tiff")),
        Path::new("/data/m31/light_001.stars.toml")
    );
}

#[test]
fn test_sidecar_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("a.tiff");
    write_sidecar(&image, &star_field(), Some(1.25));

    let sidecar = load_star_sidecar(&sidecar_path(&image)).unwrap();
    assert_eq!(
        sidecar,
        StarSidecar {
            scale_arcsec: Some(1.25),
            stars: star_field(),
        }
    );
}

#[test]
fn test_sidecar_parses_hand_written_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("b.stars.toml");
    std::fs::write(
        &path,
        r#"
scale_arcsec = 0.9

[[stars]]
row = 10.5
col = 20.0
brightness = 300.0

[[stars]]
row = 1.0
col = 2.0
brightness = 900.0
"#,
    )
    .unwrap();
    let sidecar = load_star_sidecar(&path).unwrap();
    assert_eq!(sidecar.scale_arcsec, Some(0.9));
    assert_eq!(sidecar.stars[1], Star::new(1.0, 2.0, 900.0));
}

#[test]
fn test_sidecar_solver_sorts_and_caps() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("c.tiff");
    let mut stars = star_field();
    stars.reverse();
    write_sidecar(&image, &stars, None);

    let frame = render_stars(8, 8, &[]);
    let list = SidecarSolver::new(None, 6).solve(&frame, &image).unwrap();
    assert_eq!(list.len(), 6);
    assert_eq!(list[0].brightness, 20000.0);
    assert_eq!(list[5].brightness, 10000.0);
}

#[test]
fn test_sidecar_solver_scale_range() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("d.tiff");
    write_sidecar(&image, &star_field(), Some(1.1));
    let frame = render_stars(8, 8, &[]);

    assert!(SidecarSolver::new(Some(1.0), 20).solve(&frame, &image).is_ok());
    assert!(matches!(
        SidecarSolver::new(Some(2.0), 20).solve(&frame, &image),
        Err(StarstackError::SolveFailure(_))
    ));
    // No expected scale: anything goes.
    assert!(SidecarSolver::default().solve(&frame, &image).is_ok());
}

#[test]
fn test_sidecar_solver_failures() {
    let dir = tempfile::tempdir().unwrap();
    let frame = render_stars(8, 8, &[]);

    let missing = dir.path().join("missing.tiff");
    assert!(matches!(
        SidecarSolver::default().solve(&frame, &missing),
        Err(StarstackError::SolveFailure(_))
    ));

    let sparse = dir.path().join("sparse.tiff");
    write_sidecar(&sparse, &star_field()[..4], None);
    assert!(matches!(
        SidecarSolver::default().solve(&frame, &sparse),
        Err(StarstackError::SolveFailure(_))
    ));
}

// ---------------------------------------------------------------------------
// Detecting solver
// ---------------------------------------------------------------------------

#[test]
fn test_detects_rendered_stars() {
    let truth = star_field();
    let frame = render_stars(96, 96, &truth);

    let list = DetectingSolver::default()
        .solve(&frame, Path::new("unused.tiff"))
        .unwrap();
    assert_eq!(list.len(), truth.len());

    // Flux follows the rendered peak, so the order matches the truth.
    for (found, expected) in list.iter().zip(truth.iter()) {
        assert!((found.row - expected.row).abs() < 0.1, "{found:?} vs {expected:?}");
        assert!((found.col - expected.col).abs() < 0.1, "{found:?} vs {expected:?}");
    }
}

#[test]
fn test_detect_area_filter() {
    let frame = render_stars(96, 96, &star_field());
    let config = DetectConfig {
        max_area: 2,
        ..Default::default()
    };
    assert!(detect_stars(&frame, &config).is_empty());
}

#[test]
fn test_detect_too_few_stars() {
    let frame = render_stars(64, 64, &star_field()[..3]);
    assert!(matches!(
        DetectingSolver::default().solve(&frame, Path::new("x.tiff")),
        Err(StarstackError::SolveFailure(_))
    ));
}

// ---------------------------------------------------------------------------
// Plate scale
// ---------------------------------------------------------------------------

#[test]
fn test_scale_helpers() {
    let scale = pixel_scale(4.63, 800.0);
    assert!((scale - 1.19374).abs() < 1e-4);
    let range = ScaleRange::around(scale);
    assert!(range.contains(scale * 0.85));
    assert!(!range.contains(scale * 1.25));

    // 4.63 µm pixels across 12.5 mm
    let fov = field_of_view_arcmin(12.5, 4.63, scale);
    assert!((fov - 12.5 * 1000.0 / 4.63 * scale / 60.0).abs() < 1e-9);
}
