use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

pub mod entry;
pub mod languages;
pub mod logging;
pub mod parser;
pub mod progress;
mod providers;
pub mod repair;
pub mod settings;
pub mod source;
pub mod translate;

pub use entry::Entry;
pub use parser::{EntryHandler, HandlerFuture, PassThrough, PoProcessor};
pub use progress::{ProgressFn, ProgressReporter};
pub use providers::{GoogleTranslate, ProviderFuture, TranslationProvider, TranslationRequest};
pub use translate::TranslateStep;

use source::LineSource;

#[derive(Debug, Clone)]
pub struct Config {
    /// Input PO catalog path, or "-" for stdin.
    pub input: String,
    /// Output path, or "-" for stdout.
    pub output: String,
    /// Target language code.
    pub lang: String,
    /// Source language code.
    pub source_lang: String,
    /// Seconds between provider calls; overrides settings when set.
    pub delay: Option<f64>,
    /// Entry limit; overrides settings when set. Zero means no limit.
    pub max_entries: Option<usize>,
    /// Referer header for provider requests; overrides settings when set.
    pub referrer: Option<String>,
    /// Extra TOML settings file.
    pub settings_path: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub entries: usize,
    pub translated: usize,
    pub failed: usize,
}

/// Runs the whole pipeline: open input and output, parse the catalog, fill
/// untranslated entries through the provider, stream the result to the sink.
///
/// The optional progress callback only fires when the input size is known
/// (reading from a file); on stdin progress is silently disabled.
pub async fn run(config: Config, progress: Option<ProgressFn>) -> Result<RunSummary> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(delay) = config.delay {
        settings.delay_secs = delay;
    }
    if let Some(max_entries) = config.max_entries {
        settings.max_entries = max_entries;
    }
    if let Some(referrer) = config.referrer.clone() {
        settings.referrer = Some(referrer);
    }

    languages::validate_pair(&config.source_lang, &config.lang)?;

    // Both ends are acquired before any line is parsed; failure to open
    // either one aborts the run with no partial output.
    let source = open_source(&config.input)?;
    let sink = open_sink(&config.output)?;

    let mut provider = GoogleTranslate::new();
    if let Some(referrer) = settings.referrer.clone() {
        provider = provider.with_referrer(referrer);
    }
    if let Some(endpoint) = settings.endpoint.clone() {
        provider = provider.with_endpoint(endpoint);
    }

    let handler = TranslateStep::new(provider, config.source_lang.clone(), config.lang.clone())
        .with_delay(Duration::from_secs_f64(settings.delay_secs.max(0.0)));

    let mut processor =
        PoProcessor::new(handler, sink).with_max_entries(settings.max_entries);
    if let Some(callback) = progress
        && let Some(total) = source.total_size()
    {
        processor = processor.with_progress(ProgressReporter::new(total, callback));
    }

    let entries = processor.process(source).await?;
    let handler = processor.handler();
    let summary = RunSummary {
        entries,
        translated: handler.translated(),
        failed: handler.failed(),
    };
    info!(
        "processed {} entries: {} translated, {} failed",
        summary.entries, summary.translated, summary.failed
    );
    Ok(summary)
}

fn open_source(input: &str) -> Result<LineSource<Box<dyn BufRead>>> {
    if input == "-" {
        return Ok(LineSource::new(Box::new(io::stdin().lock())));
    }
    let path = Path::new(input);
    let file =
        File::open(path).with_context(|| format!("failed to open input: {}", path.display()))?;
    let total = file.metadata().ok().map(|meta| meta.len());
    let reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
    Ok(match total {
        Some(total) => LineSource::with_total_size(reader, total),
        None => LineSource::new(reader),
    })
}

fn open_sink(output: &str) -> Result<Box<dyn Write>> {
    if output == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let path = Path::new(output);
    let file = File::create(path)
        .with_context(|| format!("failed to open output: {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}
