use std::io::{self, IsTerminal, Write};

use anyhow::{anyhow, Result};
use clap::Parser;

use po_translator_rust::{languages, progress::ProgressFn, Config};

#[derive(Parser, Debug)]
#[command(
    name = "po-translator-rust",
    version,
    about = "Fill in untranslated gettext PO entries via Google Translate"
)]
struct Cli {
    /// Input PO file ("-" for stdin)
    #[arg(default_value = "-")]
    input: String,

    /// Output PO file ("-" for stdout)
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,

    /// Target language code (see --show-languages)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Source language code
    #[arg(short = 'L', long = "source-lang", default_value = "en")]
    source_lang: String,

    /// Seconds to wait between provider calls (fractional allowed)
    #[arg(short = 'd', long = "delay")]
    delay: Option<f64>,

    /// Stop after this many entries (0 = no limit)
    #[arg(short = 'n', long = "max-entries")]
    max_entries: Option<usize>,

    /// Referer header to send with provider requests
    #[arg(long = "referrer")]
    referrer: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Show supported language codes and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Disable the progress meter
    #[arg(long = "no-progress")]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    po_translator_rust::logging::init(cli.verbose)?;

    if cli.show_languages {
        for language in languages::SUPPORTED {
            println!("{}\t{}", language.code, language.name);
        }
        return Ok(());
    }

    let lang = cli
        .lang
        .ok_or_else(|| anyhow!("target language is required (use --lang, see --show-languages)"))?;

    // The meter writes to stderr; skip it when stderr is not a terminal so
    // redirected runs stay clean.
    let progress_enabled = !cli.no_progress && io::stderr().is_terminal();
    let callback: Option<ProgressFn> = progress_enabled.then(progress_meter);

    let summary = po_translator_rust::run(
        Config {
            input: cli.input,
            output: cli.output,
            lang,
            source_lang: cli.source_lang,
            delay: cli.delay,
            max_entries: cli.max_entries,
            referrer: cli.referrer,
            settings_path: cli.read_settings,
        },
        callback,
    )
    .await?;

    if progress_enabled {
        eprintln!();
    }
    eprintln!(
        "completed: {} entries, {} translated, {} failed",
        summary.entries, summary.translated, summary.failed
    );
    Ok(())
}

fn progress_meter() -> ProgressFn {
    Box::new(|percent, remaining| {
        let suffix = remaining.map(format_remaining).unwrap_or_default();
        eprint!("\r{percent}% complete{suffix}");
        let _ = io::stderr().flush();
    })
}

fn format_remaining(seconds: u64) -> String {
    if seconds < 120 {
        format!(" ({seconds} seconds remaining)")
    } else if seconds < 60 * 120 {
        let minutes = (seconds as f64 / 60.0).round() as u64;
        format!(" ({minutes} minutes remaining)")
    } else {
        let hours = (seconds as f64 / 3600.0).round() as u64;
        format!(" ({hours} hours remaining)")
    }
}

#[cfg(test)]
mod tests {
    use super::format_remaining;

    #[test]
    fn remaining_time_buckets() {
        assert_eq!(format_remaining(45), " (45 seconds remaining)");
        assert_eq!(format_remaining(119), " (119 seconds remaining)");
        assert_eq!(format_remaining(150), " (3 minutes remaining)");
        assert_eq!(format_remaining(3600), " (60 minutes remaining)");
        assert_eq!(format_remaining(2 * 3600 + 1), " (2 hours remaining)");
    }
}
