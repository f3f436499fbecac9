use std::io::{self, Write};

/// One msgid/msgstr record from a PO catalog.
///
/// Fragments mirror the file's line-continuation layout: each element is the
/// unescaped content of one quoted line, and the logical string is the plain
/// concatenation of the fragments. Keeping the fragments separate lets the
/// emitter reproduce the original line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub msgid: Vec<String>,
    pub msgstr: Vec<String>,
}

impl Entry {
    pub fn new(msgid_fragment: String) -> Self {
        Self {
            msgid: vec![msgid_fragment],
            msgstr: Vec::new(),
        }
    }

    pub fn msgid_text(&self) -> String {
        self.msgid.concat()
    }

    pub fn msgstr_text(&self) -> String {
        self.msgstr.concat()
    }

    /// An entry needs translation when the source text is non-empty and the
    /// translation is empty. Anything already translated is left alone.
    pub fn needs_translation(&self) -> bool {
        !self.msgid_text().is_empty() && self.msgstr_text().is_empty()
    }

    /// Writes the entry back as escaped, quoted PO lines. Each fragment keeps
    /// its own line; no re-wrapping of long strings is performed.
    pub fn emit<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(b"msgid ")?;
        for fragment in &self.msgid {
            writeln!(out, "\"{}\"", escape(fragment))?;
        }
        out.write_all(b"msgstr ")?;
        for fragment in &self.msgstr {
            writeln!(out, "\"{}\"", escape(fragment))?;
        }
        Ok(())
    }
}

/// Decodes PO backslash escapes in a single pass. Unknown escapes keep the
/// backslash and the following character so no bytes are lost.
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => result.push('\r'),
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    result
}

/// Escapes the characters the emitter quotes: carriage return, newline and
/// double quote.
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => result.push_str("\\r"),
            '\n' => result.push_str("\\n"),
            '"' => result.push_str("\\\""),
            _ => result.push(c),
        }
    }
    result
}
