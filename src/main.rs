//! qrsuite command-line entrypoint

use clap::Parser;
use qrsuite::output::{RenderedOutcome, render_outcome};
use qrsuite::{
    DownloadOutcome, Error, ExportFormat, FontFamily, FormInput, QrSuiteConfig, QrWidget, Result,
    logging, metrics,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrsuite",
    version,
    about = "Generate a QR code with a text label and export it as PNG, JPEG or SVG"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to qrsuite.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Text or URL encoded in the symbol
    #[arg(long, value_name = "TEXT")]
    content: Option<String>,

    /// Label shown under the symbol; pass an empty string to omit it
    #[arg(long, value_name = "TEXT")]
    label: Option<String>,

    /// Label text color
    #[arg(long, value_name = "COLOR")]
    label_color: Option<String>,

    /// Label font size in pixels (clamped to 8..=72)
    #[arg(long, value_name = "PX", allow_negative_numbers = true)]
    font_size: Option<i64>,

    /// Label font family (see --list-fonts)
    #[arg(long, value_name = "FAMILY")]
    font: Option<FontFamily>,

    /// Horizontal label offset in pixels
    #[arg(long, value_name = "PX", allow_hyphen_values = true)]
    x_offset: Option<String>,

    /// Vertical label offset in pixels
    #[arg(long, value_name = "PX", allow_hyphen_values = true)]
    y_offset: Option<String>,

    /// Symbol size in pixels (64..=1024, step 16)
    #[arg(long, value_name = "PX", allow_negative_numbers = true)]
    size: Option<i64>,

    /// Module color
    #[arg(long, value_name = "COLOR")]
    fg: Option<String>,

    /// Surface background color
    #[arg(long, value_name = "COLOR")]
    bg: Option<String>,

    /// Export format; repeat for several files (png, jpeg, jpg, svg)
    #[arg(long = "format", value_name = "FORMAT")]
    formats: Vec<ExportFormat>,

    /// Directory exported files are written to
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Output results as formatted JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Decode raster exports and check that the content round-trips
    #[arg(long)]
    verify: bool,

    /// Include a base64 data URI of each export in the output
    #[arg(long)]
    data_uri: bool,

    /// Enable export metrics regardless of configuration file settings
    #[arg(long)]
    metrics: bool,

    /// List label font families and exit
    #[arg(long)]
    list_fonts: bool,
}

impl Cli {
    /// Form inputs for every field given on the command line, in form order.
    fn inputs(&self) -> Vec<FormInput> {
        let mut inputs = Vec::new();
        if let Some(v) = &self.content {
            inputs.push(FormInput::Content(v.clone()));
        }
        if let Some(v) = &self.label {
            inputs.push(FormInput::LabelText(v.clone()));
        }
        if let Some(v) = &self.label_color {
            inputs.push(FormInput::LabelColor(v.clone()));
        }
        if let Some(v) = self.font_size {
            inputs.push(FormInput::LabelFontSize(v));
        }
        if let Some(v) = self.font {
            inputs.push(FormInput::LabelFontFamily(v));
        }
        if let Some(v) = &self.x_offset {
            inputs.push(FormInput::LabelXOffset(v.clone()));
        }
        if let Some(v) = &self.y_offset {
            inputs.push(FormInput::LabelYOffset(v.clone()));
        }
        if let Some(v) = self.size {
            inputs.push(FormInput::QrSize(v));
        }
        if let Some(v) = &self.fg {
            inputs.push(FormInput::QrForeground(v.clone()));
        }
        if let Some(v) = &self.bg {
            inputs.push(FormInput::QrBackground(v.clone()));
        }
        inputs
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_fonts {
        list_fonts();
        return Ok(());
    }

    let mut config = QrSuiteConfig::load(cli.config.as_deref())?;

    if let Some(ref dir) = cli.out_dir {
        config.export.output_dir = dir.clone();
    }

    if cli.metrics {
        config.logging.metrics = true;
    }

    logging::init(&config.logging)?;

    if config.logging.metrics {
        metrics::enable();
    }

    let widget = QrWidget::mount(&config)?;
    for input in cli.inputs() {
        widget.apply(input)?;
    }

    let formats = if cli.formats.is_empty() {
        vec![ExportFormat::Png]
    } else {
        cli.formats.clone()
    };
    info!(?formats, output_dir = %config.export.output_dir.display(), "Starting export");

    let mut results = Vec::with_capacity(formats.len());
    let mut failed = 0usize;
    for format in formats {
        let outcome = widget.download(format).await;
        let verification = match (&outcome, cli.verify) {
            (DownloadOutcome::Saved { artifact, .. }, true) => Some(widget.verify(artifact)),
            _ => None,
        };
        if outcome.is_failed() {
            failed += 1;
        }

        let rendered = render_outcome(&outcome, cli.data_uri, verification.as_ref());
        if cli.json {
            results.push(rendered.json);
        } else {
            print_human(&rendered);
        }
    }

    if cli.json {
        let mut root = serde_json::json!({ "exports": results });
        if let (Some(snapshot), Some(obj)) = (metrics::snapshot(), root.as_object_mut()) {
            obj.insert("metrics".to_string(), serde_json::to_value(snapshot)?);
        }
        println!("{}", serde_json::to_string_pretty(&root)?);
    }

    metrics::log_snapshot();

    if failed > 0 {
        return Err(Error::Other(format!("{failed} export(s) failed")));
    }
    Ok(())
}

fn list_fonts() {
    println!("Label font families:");
    for family in FontFamily::ALL {
        println!("  {:<16} {}", family.key(), family.css_value());
    }
}

fn print_human(rendered: &RenderedOutcome) {
    for line in &rendered.human {
        println!("{line}");
    }
}
