//! Generate a labeled QR code in every export format
//!
//! Usage: cargo run --example generate_labeled

use qrsuite::{DownloadOutcome, ExportFormat, FontFamily, FormInput, QrSuiteConfig, QrWidget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut config = QrSuiteConfig::default();
    config.export.output_dir = "qr_output".into();

    let widget = QrWidget::mount(&config)?;
    widget.apply(FormInput::Content("https://www.rust-lang.org".to_string()))?;
    widget.apply(FormInput::LabelText("Rust Programming Language".to_string()))?;
    widget.apply(FormInput::LabelFontFamily(FontFamily::Verdana))?;
    widget.apply(FormInput::LabelFontSize(18))?;
    widget.apply(FormInput::QrForeground("#B7410E".to_string()))?;

    for format in ExportFormat::ALL {
        match widget.download(format).await {
            DownloadOutcome::Saved { path, .. } => {
                println!("✓ {} saved to {}", format.label(), path.display())
            }
            DownloadOutcome::Failed { error, .. } => {
                println!("✗ {} export failed: {error}", format.label())
            }
            DownloadOutcome::Ignored { .. } => {}
        }
    }

    Ok(())
}
