//! End-to-end detection runs against scripted desktops and OCR engines
//!
//! Everything here runs without a display server or an OCR install: the
//! desktop comes from `MockDesktop`, frames from `MockStrategy`, and layouts
//! from `MockOcrEngine` or a missing executable.

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use roster_locate_core::{
    DetectionOutcome, Detector, ErrorKind, Rectangle,
    capture::{
        CaptureStrategy, Desktop, MockDesktop, MockStrategy, WindowEnumerator, desktop_from_mock,
    },
    config::{DetectorConfig, LoopConfig, OcrConfig},
    error::{DetectError, DetectResult},
    model::{WindowHandle, WindowInfo, WindowRect},
    ocr::{MockOcrEngine, TesseractCli},
};
use roster_locate_test_utils::{
    timing::{assert_duration_above, measure_async},
    tsv::TsvBuilder,
};

fn roster_layout() -> String {
    TsvBuilder::new()
        .page(800, 600)
        .word(40, 30, 60, 14, "Rank")
        .next_line()
        .word(40, 60, 90, 14, "2時間15分")
        .next_block()
        .word(300, 400, 120, 20, "Voyage log")
        .build()
}

/// Roster rectangle inside `roster_layout()` with the default padding of 8
const ROSTER_RELATIVE: Rectangle = Rectangle {
    x: 32,
    y: 22,
    width: 106,
    height: 60,
};

fn config(dir: &Path) -> DetectorConfig {
    DetectorConfig {
        temp_dir: dir.to_path_buf(),
        ..DetectorConfig::default()
    }
}

fn dir_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_picks_visible_game_window_and_translates() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Arc::new(
        MockDesktop::new()
            .with_window("FINAL FANTASY XIV", false, WindowRect::new(0, 0, 640, 480))
            .with_window("Notepad", true, WindowRect::new(10, 10, 400, 300))
            .with_window("FINAL FANTASY XIV", true, WindowRect::new(200, 100, 1000, 700)),
    );
    let strategy = Arc::new(MockStrategy::fitted("print"));
    let ocr = Arc::new(MockOcrEngine::with_output(roster_layout()));
    let detector = Detector::new(
        &config(dir.path()),
        desktop_from_mock(desktop.clone(), vec![strategy.clone()]),
        ocr.clone(),
    );

    let outcome = detector.run().await;

    let window = WindowRect::new(200, 100, 1000, 700);
    assert_eq!(
        outcome,
        DetectionOutcome::Found(ROSTER_RELATIVE.translate(&window))
    );
    assert_eq!(outcome.rectangle(), Some(Rectangle::new(232, 122, 106, 60)));
    assert_eq!(strategy.calls(), 1);
    assert_eq!(ocr.calls(), 1);
    assert_eq!(desktop.rect_calls(), 1);
    assert_eq!(dir_entries(dir.path()), 0);
}

#[tokio::test]
async fn test_no_matching_window_skips_capture_and_ocr() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Arc::new(MockDesktop::new().with_window(
        "Notepad",
        true,
        WindowRect::new(0, 0, 800, 600),
    ));
    let strategy = Arc::new(MockStrategy::fitted("print"));
    let ocr = Arc::new(MockOcrEngine::with_output(roster_layout()));
    let detector = Detector::new(
        &config(dir.path()),
        desktop_from_mock(desktop.clone(), vec![strategy.clone()]),
        ocr.clone(),
    );

    let outcome = detector.run().await;

    assert_eq!(
        outcome,
        DetectionOutcome::NotDetected {
            attempts: 1,
            last_error: Some(ErrorKind::WindowNotFound),
        }
    );
    assert_eq!(desktop.rect_calls(), 0);
    assert_eq!(strategy.calls(), 0);
    assert_eq!(ocr.calls(), 0);
    assert_eq!(dir_entries(dir.path()), 0);
}

#[tokio::test]
async fn test_missing_ocr_program_cleans_up_frame() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Arc::new(MockDesktop::new().with_window(
        "FFXIV",
        true,
        WindowRect::new(0, 0, 320, 240),
    ));
    let ocr = TesseractCli::new(OcrConfig {
        program: dir.path().join("no-such-tesseract"),
        ..OcrConfig::default()
    });
    let detector = Detector::new(
        &config(dir.path()),
        desktop_from_mock(desktop, vec![Arc::new(MockStrategy::fitted("print"))]),
        Arc::new(ocr),
    );

    let err = detector.detect_once(1).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OcrUnavailable);
    assert!(err.remediation_hint().contains("--tesseract"));
    assert_eq!(dir_entries(dir.path()), 0);
}

#[tokio::test]
async fn test_falls_back_to_second_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Arc::new(MockDesktop::new().with_window(
        "FINAL FANTASY XIV",
        true,
        WindowRect::new(0, 0, 800, 600),
    ));
    let broken = Arc::new(MockStrategy::sized("print", 1, 1));
    let fallback = Arc::new(MockStrategy::fitted("screen"));
    let ocr = Arc::new(MockOcrEngine::with_output(roster_layout()));
    let detector = Detector::new(
        &config(dir.path()),
        desktop_from_mock(desktop, vec![broken.clone(), fallback.clone()]),
        ocr.clone(),
    );

    assert_eq!(detector.detect_once(1).await.unwrap(), ROSTER_RELATIVE);
    assert_eq!(broken.calls(), 1);
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn test_group_lines_widens_region() {
    let dir = tempfile::tempdir().unwrap();
    let layout = TsvBuilder::new()
        .word(40, 30, 60, 14, "Rank")
        .word(110, 30, 200, 14, "Destination")
        .build();
    let desktop = Arc::new(MockDesktop::new().with_window(
        "FFXIV",
        true,
        WindowRect::new(0, 0, 800, 600),
    ));

    let mut grouped = config(dir.path());
    grouped.region.padding = 0;
    grouped.region.group_lines = true;
    let detector = Detector::new(
        &grouped,
        desktop_from_mock(desktop, vec![Arc::new(MockStrategy::fitted("print"))]),
        Arc::new(MockOcrEngine::with_output(layout)),
    );

    assert_eq!(
        detector.detect_once(1).await.unwrap(),
        Rectangle::new(40, 30, 270, 14)
    );
}

/// Enumerator whose game window only shows up after a few listings
struct LateWindow {
    hidden_for: usize,
    listings: AtomicUsize,
}

#[async_trait]
impl WindowEnumerator for LateWindow {
    async fn list_windows(&self) -> DetectResult<Vec<WindowInfo>> {
        let n = self.listings.fetch_add(1, Ordering::SeqCst);
        if n < self.hidden_for {
            return Ok(Vec::new());
        }
        Ok(vec![WindowInfo {
            handle: WindowHandle::new(7),
            title: "FINAL FANTASY XIV".to_string(),
            visible: true,
        }])
    }

    async fn window_rect(&self, handle: WindowHandle) -> DetectResult<WindowRect> {
        if handle.as_raw() != 7 {
            return Err(DetectError::enumeration("unknown handle"));
        }
        Ok(WindowRect::new(50, 50, 850, 650))
    }
}

#[tokio::test]
async fn test_watch_mode_succeeds_on_later_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let enumerator = Arc::new(LateWindow {
        hidden_for: 2,
        listings: AtomicUsize::new(0),
    });
    let desktop = Desktop::new(
        enumerator.clone(),
        vec![Arc::new(MockStrategy::fitted("print")) as Arc<dyn CaptureStrategy>],
        "late",
    );
    let mut config = config(dir.path());
    config.retry = LoopConfig {
        watch: true,
        interval: Duration::from_millis(20),
        timeout: Duration::from_secs(10),
    };
    let detector = Detector::new(
        &config,
        desktop,
        Arc::new(MockOcrEngine::with_output(roster_layout())),
    );

    let (outcome, elapsed) = measure_async("watch", detector.run()).await;

    assert_eq!(
        outcome,
        DetectionOutcome::Found(Rectangle::new(82, 72, 106, 60))
    );
    assert_eq!(enumerator.listings.load(Ordering::SeqCst), 3);
    assert_duration_above(elapsed, Duration::from_millis(40), "two retry intervals");
}

#[tokio::test]
async fn test_watch_mode_keeps_retrying_ocr_failures() {
    let dir = tempfile::tempdir().unwrap();
    let desktop = Arc::new(MockDesktop::new().with_window(
        "FFXIV",
        true,
        WindowRect::new(0, 0, 320, 240),
    ));
    let ocr = Arc::new(
        MockOcrEngine::with_output(roster_layout())
            .with_error(DetectError::OcrTimeout { duration_ms: 5 }),
    );
    let mut config = config(dir.path());
    config.retry = LoopConfig {
        watch: true,
        interval: Duration::from_millis(10),
        timeout: Duration::from_millis(30),
    };
    let detector = Detector::new(
        &config,
        desktop_from_mock(desktop, vec![Arc::new(MockStrategy::fitted("print"))]),
        ocr.clone(),
    );

    let outcome = detector.run().await;

    match outcome {
        DetectionOutcome::NotDetected {
            attempts,
            last_error,
        } => {
            assert!(attempts >= 2, "expected retries, got {attempts} attempt(s)");
            assert_eq!(attempts as usize, ocr.calls());
            assert_eq!(last_error, Some(ErrorKind::OcrTimeout));
        }
        found => panic!("unexpected outcome {found:?}"),
    }
    assert_eq!(dir_entries(dir.path()), 0);
}
