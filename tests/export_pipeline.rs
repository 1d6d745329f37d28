use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use qrsuite::download::{export_filename, is_export_filename, next_stamp};
use qrsuite::output::Verification;
use qrsuite::{
    CaptureBackend, CaptureOptions, CompositeSurface, DownloadOutcome, Error, ExportFormat,
    ExportState, FormInput, Notification, QrSuiteConfig, QrWidget, Result,
};

fn scratch_config() -> (QrSuiteConfig, PathBuf) {
    let dir = std::env::temp_dir().join(format!("qrsuite-it-{}", next_stamp()));
    let mut config = QrSuiteConfig::default();
    config.export.output_dir = dir.clone();
    (config, dir)
}

fn file_name(outcome: &DownloadOutcome) -> String {
    match outcome {
        DownloadOutcome::Saved { path, .. } => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .expect("saved file has a name"),
        other => panic!("expected a saved export, got {other:?}"),
    }
}

/// Holds the capture open long enough for a second click to land
struct SlowCapture;

#[async_trait]
impl CaptureBackend for SlowCapture {
    async fn capture(
        &self,
        _surface: Arc<CompositeSurface>,
        _options: CaptureOptions,
    ) -> Result<Vec<u8>> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(b"slow".to_vec())
    }
}

struct RejectingCapture;

#[async_trait]
impl CaptureBackend for RejectingCapture {
    async fn capture(
        &self,
        _surface: Arc<CompositeSurface>,
        _options: CaptureOptions,
    ) -> Result<Vec<u8>> {
        Err(Error::Capture("canvas is tainted".to_string()))
    }
}

#[tokio::test]
async fn default_widget_exports_labeled_svg() {
    let (config, dir) = scratch_config();
    let widget = QrWidget::mount(&config).expect("mount widget");

    let surface = widget.preview().handle().current().expect("surface mounted");
    assert_eq!(surface.qr.size, 256);
    let label = surface.label.as_ref().expect("label node");
    assert_eq!(label.text, "Scan Me!");
    assert_eq!(label.style.translate, (0, 5));

    let outcome = widget.download(ExportFormat::Svg).await;
    assert_eq!(
        outcome.notification(),
        Some(&Notification::downloaded(ExportFormat::Svg))
    );
    let name = file_name(&outcome);
    assert!(is_export_filename(&name), "unexpected filename {name}");
    assert!(name.ends_with(".svg"));

    let DownloadOutcome::Saved { path, .. } = &outcome else {
        unreachable!()
    };
    let doc = std::fs::read_to_string(path).expect("read svg");
    let first_rect = doc.find("<rect").expect("outer rect");
    assert!(doc[first_rect..].starts_with(r##"<rect width="288" height="320" fill="#FFFFFF"/>"##));
    assert!(doc.contains("Scan Me!"));

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[tokio::test]
async fn empty_label_exports_symbol_only() {
    let (config, dir) = scratch_config();
    let widget = QrWidget::mount(&config).expect("mount widget");
    widget
        .apply(FormInput::LabelText(String::new()))
        .expect("apply label");

    let surface = widget.preview().handle().current().expect("surface mounted");
    assert!(surface.label.is_none());
    assert_eq!(surface.height, 288);

    let outcome = widget.download(ExportFormat::Svg).await;
    let DownloadOutcome::Saved { artifact, .. } = &outcome else {
        panic!("expected a saved export, got {outcome:?}");
    };
    let doc = String::from_utf8(artifact.bytes.clone()).expect("utf-8 svg");
    assert!(!doc.contains("foreignObject"));

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[tokio::test]
async fn png_export_decodes_back_to_content() {
    let (config, dir) = scratch_config();
    let widget = QrWidget::mount(&config).expect("mount widget");
    widget
        .apply(FormInput::LabelText(String::new()))
        .expect("apply label");
    widget
        .apply(FormInput::Content("https://www.rust-lang.org".to_string()))
        .expect("apply content");

    let outcome = widget.download(ExportFormat::Png).await;
    assert!(file_name(&outcome).ends_with(".png"));
    let DownloadOutcome::Saved { artifact, .. } = &outcome else {
        unreachable!()
    };

    match widget.verify(artifact) {
        Verification::Matched(payload) => {
            assert_eq!(payload.as_str(), Some("https://www.rust-lang.org"))
        }
        other => panic!("expected the export to decode, got {other:?}"),
    }

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[tokio::test]
async fn double_click_runs_one_export() {
    let (config, dir) = scratch_config();
    let widget = QrWidget::with_backend(&config, Arc::new(SlowCapture)).expect("mount widget");

    let (first, second) = tokio::join!(
        widget.download(ExportFormat::Png),
        widget.download(ExportFormat::Png)
    );

    assert!(first.is_saved(), "first click should export: {first:?}");
    assert!(matches!(
        second,
        DownloadOutcome::Ignored {
            format: ExportFormat::Png
        }
    ));
    assert!(second.notification().is_none());
    assert_eq!(widget.pipeline().state(), ExportState::Idle);

    let saved = std::fs::read_dir(&dir).expect("output dir").count();
    assert_eq!(saved, 1);

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[tokio::test]
async fn rejected_capture_reports_failure_and_returns_to_idle() {
    let (config, dir) = scratch_config();
    let widget =
        QrWidget::with_backend(&config, Arc::new(RejectingCapture)).expect("mount widget");

    let outcome = widget.download(ExportFormat::Jpeg).await;
    assert!(outcome.is_failed());
    assert_eq!(
        outcome.notification(),
        Some(&Notification::download_failed())
    );
    assert_eq!(widget.pipeline().state(), ExportState::Idle);
    assert!(!dir.exists());

    // The triggers are usable again
    let retry = widget.download(ExportFormat::Jpeg).await;
    assert!(retry.is_failed());
}

#[tokio::test]
async fn unmounted_preview_reports_missing_target() {
    let (config, dir) = scratch_config();
    let widget = QrWidget::mount(&config).expect("mount widget");
    widget.preview().unmount();

    let outcome = widget.download(ExportFormat::Png).await;
    let notification = outcome.notification().expect("notification");
    assert_eq!(notification.title, "Error");
    assert_eq!(notification.description, "QR code element not found.");
    assert!(notification.is_failure());
    assert_eq!(widget.pipeline().state(), ExportState::Idle);
    assert!(!dir.exists());
}

#[tokio::test]
async fn sequential_exports_get_distinct_names() {
    let (config, dir) = scratch_config();
    let widget = QrWidget::mount(&config).expect("mount widget");

    let first = file_name(&widget.download(ExportFormat::Svg).await);
    let second = file_name(&widget.download(ExportFormat::Svg).await);

    assert_ne!(first, second);
    assert!(is_export_filename(&first));
    assert!(is_export_filename(&second));

    std::fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn names_a_second_apart_differ() {
    let earlier = export_filename(ExportFormat::Png, 1_700_000_000_000);
    let later = export_filename(ExportFormat::Png, 1_700_000_001_000);
    assert_ne!(earlier, later);
    assert!(is_export_filename(&earlier));
    assert!(is_export_filename(&later));
}
