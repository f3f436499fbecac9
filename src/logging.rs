use anyhow::Result;
use tracing_subscriber::fmt;

/// Diagnostics go to stderr so stdout stays free for the emitted catalog.
pub fn init(verbose: bool) -> Result<()> {
    if !verbose {
        return Ok(());
    }
    let _ = fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
