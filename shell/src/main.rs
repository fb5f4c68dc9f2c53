//! ebook-editor - headless host for the editor core
//!
//! Loads editor settings, builds a document, replays a JSON-lines script of
//! input events through an [`Editor`] and prints the resulting pages.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use doc_model::EditorSettings;
use edit_engine::{Document, Editor, InputEvent};
use render_model::ViewportConfig;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use text_engine::{FontId, MonospaceMeasurer, ShapingMeasurer, TextMeasurer, TextShaper};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ebook-editor", about = "Replay input events against a paginated document")]
struct Args {
    /// JSON-lines file of input events; reads stdin when omitted or `-`
    script: Option<PathBuf>,

    /// Editor settings JSON
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Initial paragraph, repeatable
    #[arg(long = "paragraph")]
    paragraphs: Vec<String>,

    /// Font file to measure text with instead of fixed advances
    #[arg(long)]
    font: Option<PathBuf>,

    /// Advance of every character in em when no font is given
    #[arg(long, default_value_t = 0.6)]
    advance_em: f32,

    #[arg(long, default_value_t = 800.0)]
    viewport_width: f64,

    #[arg(long, default_value_t = 600.0)]
    viewport_height: f64,

    /// Print the render model of the visible pages as JSON
    #[arg(long)]
    render: bool,

    /// Print pipeline timings after the run
    #[arg(long)]
    perf: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut settings = match &args.settings {
        Some(path) => EditorSettings::load(path),
        None => EditorSettings::default(),
    };
    let measurer = build_measurer(&args, &mut settings)?;

    let paragraphs: Vec<&str> = args.paragraphs.iter().map(String::as_str).collect();
    let document = Document::from_paragraphs(settings, measurer, &paragraphs)
        .context("failed to build the initial document")?;
    let mut editor = Editor::new(
        document,
        ViewportConfig::default(),
        args.viewport_width,
        args.viewport_height,
    );
    tracing::info!(pages = editor.document().pagination().page_count(), "document ready");

    let replayed = replay(&mut editor, &args)?;
    tracing::info!(events = replayed, "script finished");

    report::print_document(editor.document());
    if args.render {
        let model = editor.render().context("failed to render")?;
        println!("{}", serde_json::to_string_pretty(&model)?);
    }
    if args.perf {
        if let Some(summary) = perf::summary_json() {
            println!("{}", summary);
        }
    }
    Ok(())
}

fn build_measurer(args: &Args, settings: &mut EditorSettings) -> Result<Arc<dyn TextMeasurer>> {
    let Some(path) = &args.font else {
        return Ok(Arc::new(MonospaceMeasurer::new(args.advance_em)));
    };
    let data = std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    let family = settings
        .document
        .font_family
        .get_or_insert_with(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "default".to_string())
        })
        .clone();

    let mut shaper = TextShaper::new();
    shaper
        .load_font(FontId::new(family.clone()), data)
        .with_context(|| format!("failed to load font {}", path.display()))?;
    tracing::info!(%family, "measuring with shaped font");
    Ok(Arc::new(ShapingMeasurer::new(shaper)))
}

/// Feed every script line to the editor. Returns the number of events.
fn replay(editor: &mut Editor, args: &Args) -> Result<usize> {
    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) if path.as_os_str() != "-" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        _ => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut count = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: InputEvent = serde_json::from_str(line)
            .with_context(|| format!("script line {} is not an input event", number + 1))?;
        let outcome = editor.handle(event);
        if let Some(error) = &outcome.error {
            tracing::warn!(line = number + 1, %error, "event rolled back");
        }
        for event in &outcome.events {
            tracing::debug!(line = number + 1, ?event, "layout event");
        }
        count += 1;
    }
    Ok(count)
}
