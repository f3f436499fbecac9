use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::parser::{EntryHandler, HandlerFuture};
use crate::providers::{TranslationProvider, TranslationRequest};
use crate::repair;

/// Spacing between provider calls. Keeps load on the shared API polite; a
/// deployment wanting faster runs can lower it.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Entry handler that fills in untranslated entries through a translation
/// provider.
///
/// Only entries with a non-empty source and an empty translation trigger a
/// remote call; everything else passes through untouched. Provider failures
/// are fail-open: the entry is emitted with its original empty translation
/// and the run continues. After every attempted call (usable response or not)
/// the handler pauses for the configured delay, bounding the request rate.
pub struct TranslateStep<P> {
    provider: P,
    source_lang: String,
    target_lang: String,
    delay: Duration,
    translated: usize,
    failed: usize,
}

impl<P: TranslationProvider> TranslateStep<P> {
    pub fn new(
        provider: P,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            delay: DEFAULT_DELAY,
            translated: 0,
            failed: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn translated(&self) -> usize {
        self.translated
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl<P: TranslationProvider> EntryHandler for TranslateStep<P> {
    fn handle(&mut self, entry: Entry) -> HandlerFuture<'_> {
        Box::pin(async move {
            let mut entry = entry;
            if !entry.needs_translation() {
                return Ok(entry);
            }

            let input = entry.msgid_text();
            let request = TranslationRequest {
                text: input.clone(),
                source_lang: self.source_lang.clone(),
                target_lang: self.target_lang.clone(),
            };
            match self.provider.translate(request).await {
                Ok(raw) => {
                    let repaired = repair::repair_response(&input, &raw);
                    debug!("translated {:?} -> {:?}", input, repaired);
                    entry.msgstr = vec![repaired];
                    self.translated += 1;
                }
                Err(err) => {
                    // Fail-open: the entry keeps its empty translation.
                    warn!("translation failed for {:?}: {:#}", input, err);
                    self.failed += 1;
                }
            }

            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            Ok(entry)
        })
    }
}
