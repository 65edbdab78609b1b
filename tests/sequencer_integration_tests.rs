//! End-to-end sequencer tests over mock motion and camera collaborators.

use microscan::camera::MockCamera;
use microscan::config::{CaptureControls, TimingSettings};
use microscan::error::ScanError;
use microscan::geometry::{Margins, Objective, Point};
use microscan::motion::MockController;
use microscan::output::{ImageFormat, OutputLayout};
use microscan::planner::{Plan, ScanGrid};
use microscan::sequencer::CaptureSequencer;

fn controls() -> CaptureControls {
    CaptureControls {
        exposure_us: 9994,
        analogue_gain: 1.74,
    }
}

/// 2x2 grid with 1 mm steps: tiles (0,0), (0,1), (1,0), (1,1).
fn two_by_two() -> ScanGrid {
    let objective = Objective::new(1.0, 1.0, Margins::none());
    let plan = Plan::new(objective, 0.0, Point::new(4056.0, 3040.0)).unwrap();
    plan.grid(Point::new(1.2, 1.2)).unwrap()
}

fn sequencer(
    motion: &MockController,
    camera: &MockCamera,
    dry_run: bool,
) -> CaptureSequencer<MockController, MockCamera> {
    CaptureSequencer::new(
        motion.clone(),
        camera.clone(),
        controls(),
        TimingSettings::immediate(),
        dry_run,
    )
}

const STARTUP: [&str; 3] = ["G90", "G0 X1 Y1", "G0 X0 Y0"];

#[test]
fn test_full_scan_command_and_capture_order() {
    let motion = MockController::new();
    let camera = MockCamera::new();
    let root = tempfile::tempdir().unwrap();
    let output = OutputLayout::create(root.path(), "acme", "chip1", None).unwrap();

    sequencer(&motion, &camera, false)
        .run(&two_by_two(), &output, ImageFormat::Jpg)
        .unwrap();

    let mut expected: Vec<String> = STARTUP.iter().map(ToString::to_string).collect();
    expected.extend(
        ["G0 X0 Y0", "G0 X0 Y1", "G0 X1 Y0", "G0 X1 Y1"]
            .iter()
            .map(ToString::to_string),
    );
    assert_eq!(motion.sent(), expected);
    assert_eq!(motion.close_count(), 1);

    // Column-major traversal with inverted rows drives the filenames.
    let names: Vec<String> = camera
        .captures()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["r001_c000.jpg", "r000_c000.jpg", "r001_c001.jpg", "r000_c001.jpg"]
    );
    for path in camera.captures() {
        assert!(path.is_file());
    }
}

#[test]
fn test_calibration_locks_camera_controls() {
    let motion = MockController::new();
    let camera = MockCamera::new();
    let root = tempfile::tempdir().unwrap();
    let output = OutputLayout::create(root.path(), "acme", "chip1", None).unwrap();

    sequencer(&motion, &camera, false)
        .run(&two_by_two(), &output, ImageFormat::Png)
        .unwrap();

    assert_eq!(camera.locked_controls(), Some(controls()));
}

#[test]
fn test_dry_run_moves_but_never_captures() {
    let motion = MockController::new();
    let camera = MockCamera::new();
    let root = tempfile::tempdir().unwrap();
    // Dry runs never create the directory.
    let output = OutputLayout::locate(root.path(), "acme", "chip1", None);

    sequencer(&motion, &camera, true)
        .run(&two_by_two(), &output, ImageFormat::Jpg)
        .unwrap();

    // Every motion command is still issued (startup + one per tile).
    assert_eq!(motion.sent().len(), STARTUP.len() + 4);
    assert!(camera.captures().is_empty());
    assert!(!output.dir().exists());
}

#[test]
fn test_capture_failure_aborts_without_gap() {
    let motion = MockController::new();
    let camera = MockCamera::new();
    camera.fail_on(1);
    let root = tempfile::tempdir().unwrap();
    let output = OutputLayout::create(root.path(), "acme", "chip1", None).unwrap();

    let err = sequencer(&motion, &camera, false)
        .run(&two_by_two(), &output, ImageFormat::Jpg)
        .unwrap_err();
    assert!(matches!(err, ScanError::Capture { .. }));

    // One tile captured before the fault; nothing after it.
    assert_eq!(camera.captures().len(), 1);
    assert_eq!(motion.sent().len(), STARTUP.len() + 2);
    // Completed tiles stay on disk.
    assert!(output.dir().join("r001_c000.jpg").is_file());
}

#[test]
fn test_motion_failure_aborts_before_any_capture() {
    let motion = MockController::new();
    motion.fail_on(0);
    let camera = MockCamera::new();
    let root = tempfile::tempdir().unwrap();
    let output = OutputLayout::create(root.path(), "acme", "chip1", None).unwrap();

    let err = sequencer(&motion, &camera, false)
        .run(&two_by_two(), &output, ImageFormat::Jpg)
        .unwrap_err();
    assert!(matches!(err, ScanError::Protocol(_)));
    assert!(camera.captures().is_empty());
}

#[test]
fn test_test_mode_drives_grid_extremes() {
    let motion = MockController::new();
    let camera = MockCamera::new();

    sequencer(&motion, &camera, false)
        .run_test(&two_by_two())
        .unwrap();

    let mut expected: Vec<String> = STARTUP.iter().map(ToString::to_string).collect();
    expected.extend(["G0 X0 Y0", "G0 X1", "G0 Y1"].iter().map(ToString::to_string));
    assert_eq!(motion.sent(), expected);
    assert!(camera.captures().is_empty());
}

#[test]
fn test_level_mode_cycles_corners_until_operator_stops() {
    let motion = MockController::new();
    let camera = MockCamera::new();

    let mut rounds = 0;
    sequencer(&motion, &camera, false)
        .run_level(&two_by_two(), &mut || {
            rounds += 1;
            rounds < 4
        })
        .unwrap();

    let mut expected: Vec<String> = STARTUP.iter().map(ToString::to_string).collect();
    // Three corners confirmed, the fourth call stops the loop.
    expected.extend(
        ["G0 X1 Y0", "G0 X0 Y0", "G0 X1 Y1", "G0 X1 Y0"]
            .iter()
            .map(ToString::to_string),
    );
    assert_eq!(motion.sent(), expected);
    assert_eq!(motion.close_count(), 1);
    assert!(camera.captures().is_empty());
}
