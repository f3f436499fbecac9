use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use anyhow::{Context, Result};

use crate::entry::{unescape, Entry};
use crate::progress::ProgressReporter;
use crate::source::LineSource;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Entry>> + Send + 'a>>;

/// Transformation applied to every completed entry before it is emitted.
/// Injected into the processor so parsing and translating stay decoupled.
pub trait EntryHandler {
    fn handle(&mut self, entry: Entry) -> HandlerFuture<'_>;
}

/// Handler that emits every entry untouched.
pub struct PassThrough;

impl EntryHandler for PassThrough {
    fn handle(&mut self, entry: Entry) -> HandlerFuture<'_> {
        Box::pin(async move { Ok(entry) })
    }
}

/// The three parser states. A state past `AwaitingMsgid` always carries
/// exactly one entry in progress.
enum ParserState {
    AwaitingMsgid,
    /// Accumulating msgid continuation lines, waiting for `msgstr`.
    ReadingMsgid(Entry),
    /// Accumulating msgstr continuation lines, waiting for a blank line.
    ReadingMsgstr(Entry),
}

/// Streaming PO processor: reads one line at a time, feeds completed entries
/// through the handler and the emitter, and forwards comment and blank lines
/// to the sink verbatim in their original position.
///
/// Only the plain msgid/msgstr grammar is recognized. Lines that do not match
/// it while an entry is in progress (msgctxt, plural forms, stray text) are
/// dropped from the entry and parsing continues; this mirrors the lenient
/// behavior the tool has always had and is pinned by tests rather than fixed.
pub struct PoProcessor<H, W> {
    handler: H,
    sink: W,
    max_entries: usize,
    progress: Option<ProgressReporter>,
}

impl<H: EntryHandler, W: Write> PoProcessor<H, W> {
    pub fn new(handler: H, sink: W) -> Self {
        Self {
            handler,
            sink,
            max_entries: 0,
            progress: None,
        }
    }

    /// Stop after this many completed entries. Zero means no limit.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Runs the full pipeline over the source. Returns the number of entries
    /// that were completed and emitted.
    pub async fn process<R: std::io::BufRead>(
        &mut self,
        mut source: LineSource<R>,
    ) -> Result<usize> {
        let mut state = ParserState::AwaitingMsgid;
        let mut count = 0usize;

        while let Some(line) = source.next_line()? {
            if let Some(progress) = self.progress.as_mut() {
                progress.tick(source.offset());
            }

            state = match state {
                ParserState::AwaitingMsgid => {
                    if let Some(content) = keyword_line(&line, "msgid") {
                        ParserState::ReadingMsgid(Entry::new(unescape(content)))
                    } else {
                        ParserState::AwaitingMsgid
                    }
                }
                ParserState::ReadingMsgid(mut entry) => {
                    if let Some(content) = keyword_line(&line, "msgstr") {
                        entry.msgstr.push(unescape(content));
                        ParserState::ReadingMsgstr(entry)
                    } else if let Some(content) = continuation_line(&line) {
                        entry.msgid.push(unescape(content));
                        ParserState::ReadingMsgid(entry)
                    } else {
                        // Unrecognized line: dropped from the entry.
                        ParserState::ReadingMsgid(entry)
                    }
                }
                ParserState::ReadingMsgstr(mut entry) => {
                    if let Some(content) = continuation_line(&line) {
                        entry.msgstr.push(unescape(content));
                        ParserState::ReadingMsgstr(entry)
                    } else if line.is_empty() {
                        count += 1;
                        self.complete(entry).await?;
                        if self.max_entries != 0 && count >= self.max_entries {
                            self.sink.flush().context("failed to flush output")?;
                            return Ok(count);
                        }
                        ParserState::AwaitingMsgid
                    } else {
                        // Unrecognized line: dropped from the entry.
                        ParserState::ReadingMsgstr(entry)
                    }
                }
            };

            // Comments and blank lines pass through in original order, even
            // when they interleave with an entry's continuation lines.
            if line.is_empty() || line.starts_with('#') {
                self.sink
                    .write_all(line.as_bytes())
                    .and_then(|()| self.sink.write_all(b"\n"))
                    .context("failed to write output")?;
            }
        }

        // A msgstr block terminated by end of input instead of a blank line
        // still completes its entry.
        if let ParserState::ReadingMsgstr(entry) = state {
            count += 1;
            self.complete(entry).await?;
        }

        self.sink.flush().context("failed to flush output")?;
        Ok(count)
    }

    async fn complete(&mut self, entry: Entry) -> Result<()> {
        let entry = self.handler.handle(entry).await?;
        entry.emit(&mut self.sink).context("failed to write entry")
    }
}

/// Matches `<keyword> "<content>"` with content taken literally between the
/// first and the last double quote on the line.
fn keyword_line<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    quoted(rest.strip_prefix(' ')?)
}

/// Matches a bare quoted continuation line `"<content>"`.
fn continuation_line(line: &str) -> Option<&str> {
    quoted(line)
}

fn quoted(text: &str) -> Option<&str> {
    text.strip_prefix('"')?.strip_suffix('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pass_through(input: &str) -> (String, usize) {
        pass_through_limited(input, 0).await
    }

    async fn pass_through_limited(input: &str, max_entries: usize) -> (String, usize) {
        let mut processor =
            PoProcessor::new(PassThrough, Vec::new()).with_max_entries(max_entries);
        let count = processor
            .process(LineSource::new(input.as_bytes()))
            .await
            .unwrap();
        let output = String::from_utf8(processor.sink.clone()).unwrap();
        (output, count)
    }

    #[tokio::test]
    async fn simple_entry_round_trips() {
        let input = "msgid \"Hello\"\nmsgstr \"Bonjour\"\n\n";
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 1);
        assert_eq!(output, "msgid \"Hello\"\nmsgstr \"Bonjour\"\n\n");
    }

    #[tokio::test]
    async fn multiline_fragments_are_preserved() {
        let input = concat!(
            "msgid \"\"\n",
            "\"first line\\n\"\n",
            "\"second line\"\n",
            "msgstr \"\"\n",
            "\"premi\u{e8}re ligne\\n\"\n",
            "\"seconde ligne\"\n",
            "\n",
        );
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 1);
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn comments_and_blanks_keep_their_relative_order() {
        let input = concat!(
            "# translator comment\n",
            "#: src/main.rs:1\n",
            "msgid \"Hello\"\n",
            "msgstr \"Bonjour\"\n",
            "\n",
            "# trailing comment\n",
        );
        let (output, _) = pass_through(input).await;
        assert_eq!(
            output,
            concat!(
                "# translator comment\n",
                "#: src/main.rs:1\n",
                "msgid \"Hello\"\n",
                "msgstr \"Bonjour\"\n",
                "\n",
                "# trailing comment\n",
            )
        );
    }

    #[tokio::test]
    async fn comment_inside_entry_is_passed_through_in_place() {
        let input = concat!(
            "msgid \"\"\n",
            "\"part one\"\n",
            "# interleaved comment\n",
            "\"part two\"\n",
            "msgstr \"done\"\n",
            "\n",
        );
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 1);
        // The comment surfaces before the entry because the entry is only
        // written once complete; its position among pass-through lines holds.
        assert_eq!(
            output,
            concat!(
                "# interleaved comment\n",
                "msgid \"\"\n",
                "\"part one\"\n",
                "\"part two\"\n",
                "msgstr \"done\"\n",
                "\n",
            )
        );
    }

    #[tokio::test]
    async fn unsupported_lines_are_dropped_from_entries() {
        // msgctxt is outside the supported grammar: the line vanishes and the
        // rest of the entry still parses. Pinned on purpose, not a bug fix.
        let input = concat!(
            "msgctxt \"menu\"\n",
            "msgid \"File\"\n",
            "fuzzy nonsense\n",
            "msgstr \"Fichier\"\n",
            "\n",
        );
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 1);
        assert_eq!(output, "msgid \"File\"\nmsgstr \"Fichier\"\n\n");
    }

    #[tokio::test]
    async fn escaped_content_survives_a_round_trip() {
        let input = "msgid \"line\\none \\\"quoted\\\"\"\nmsgstr \"\"\n\n";
        let (output, _) = pass_through(input).await;
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn entry_at_eof_without_blank_line_is_completed() {
        let input = "msgid \"Hello\"\nmsgstr \"Bonjour\"\n";
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 1);
        assert_eq!(output, "msgid \"Hello\"\nmsgstr \"Bonjour\"\n");
    }

    #[tokio::test]
    async fn entry_stuck_before_msgstr_is_discarded_at_eof() {
        let input = "msgid \"Hello\"\n";
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 0);
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn max_entries_stops_cleanly() {
        let mut input = String::new();
        for i in 0..5 {
            input.push_str(&format!("msgid \"source {i}\"\nmsgstr \"target {i}\"\n\n"));
        }
        let (output, count) = pass_through_limited(&input, 2).await;
        assert_eq!(count, 2);
        assert_eq!(
            output,
            concat!(
                "msgid \"source 0\"\n",
                "msgstr \"target 0\"\n",
                "\n",
                "msgid \"source 1\"\n",
                "msgstr \"target 1\"\n",
            )
        );
    }

    #[tokio::test]
    async fn stray_lines_outside_entries_are_ignored() {
        let input = "random prose\nmsgid \"Hi\"\nmsgstr \"Salut\"\n\n";
        let (output, count) = pass_through(input).await;
        assert_eq!(count, 1);
        assert_eq!(output, "msgid \"Hi\"\nmsgstr \"Salut\"\n\n");
    }

    #[test]
    fn keyword_line_matching() {
        assert_eq!(keyword_line("msgid \"x\"", "msgid"), Some("x"));
        assert_eq!(keyword_line("msgid \"\"", "msgid"), Some(""));
        // Content runs to the last quote on the line.
        assert_eq!(keyword_line("msgid \"a\"b\"", "msgid"), Some("a\"b"));
        assert_eq!(keyword_line("msgid  \"x\"", "msgid"), None);
        assert_eq!(keyword_line("msgidx \"x\"", "msgid"), None);
        assert_eq!(keyword_line("msgid \"x", "msgid"), None);
        assert_eq!(continuation_line("\"frag\""), Some("frag"));
        assert_eq!(continuation_line("\"\""), Some(""));
        assert_eq!(continuation_line("\""), None);
        assert_eq!(continuation_line("plain"), None);
    }
}
