use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// The language pairs the translation API accepts. Codes follow the API's own
/// convention (ISO 639-1 plus its regional variants and legacy `iw`).
pub const SUPPORTED: &[Language] = &[
    Language { code: "af", name: "Afrikaans" },
    Language { code: "sq", name: "Albanian" },
    Language { code: "ar", name: "Arabic" },
    Language { code: "be", name: "Belarusian" },
    Language { code: "bg", name: "Bulgarian" },
    Language { code: "ca", name: "Catalan" },
    Language { code: "zh-CN", name: "Chinese (Simplified)" },
    Language { code: "zh-TW", name: "Chinese (Traditional)" },
    Language { code: "hr", name: "Croatian" },
    Language { code: "cs", name: "Czech" },
    Language { code: "da", name: "Danish" },
    Language { code: "nl", name: "Dutch" },
    Language { code: "en", name: "English" },
    Language { code: "et", name: "Estonian" },
    Language { code: "tl", name: "Filipino" },
    Language { code: "fi", name: "Finnish" },
    Language { code: "fr", name: "French" },
    Language { code: "gl", name: "Galician" },
    Language { code: "de", name: "German" },
    Language { code: "el", name: "Greek" },
    Language { code: "iw", name: "Hebrew" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "hu", name: "Hungarian" },
    Language { code: "is", name: "Icelandic" },
    Language { code: "id", name: "Indonesian" },
    Language { code: "ga", name: "Irish" },
    Language { code: "it", name: "Italian" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "lv", name: "Latvian" },
    Language { code: "lt", name: "Lithuanian" },
    Language { code: "mk", name: "Macedonian" },
    Language { code: "ms", name: "Malay" },
    Language { code: "mt", name: "Maltese" },
    Language { code: "no", name: "Norwegian" },
    Language { code: "fa", name: "Persian" },
    Language { code: "pl", name: "Polish" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "ro", name: "Romanian" },
    Language { code: "ru", name: "Russian" },
    Language { code: "sr", name: "Serbian" },
    Language { code: "sk", name: "Slovak" },
    Language { code: "sl", name: "Slovenian" },
    Language { code: "es", name: "Spanish" },
    Language { code: "sw", name: "Swahili" },
    Language { code: "sv", name: "Swedish" },
    Language { code: "th", name: "Thai" },
    Language { code: "tr", name: "Turkish" },
    Language { code: "uk", name: "Ukrainian" },
    Language { code: "vi", name: "Vietnamese" },
    Language { code: "cy", name: "Welsh" },
    Language { code: "yi", name: "Yiddish" },
];

pub fn find(code: &str) -> Option<&'static Language> {
    let code = code.trim();
    SUPPORTED
        .iter()
        .find(|language| language.code.eq_ignore_ascii_case(code))
}

pub fn is_supported(code: &str) -> bool {
    find(code).is_some()
}

pub fn validate_pair(source_lang: &str, target_lang: &str) -> Result<()> {
    if !is_supported(source_lang) {
        return Err(anyhow!(
            "unsupported source language code '{}' (use --show-languages for the full list)",
            source_lang
        ));
    }
    if !is_supported(target_lang) {
        return Err(anyhow!(
            "unsupported target language code '{}' (use --show-languages for the full list)",
            target_lang
        ));
    }
    Ok(())
}
