use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Settings {
    /// Seconds to wait between provider calls (fractional allowed).
    pub delay_secs: f64,
    /// Stop after this many entries; zero means no limit.
    pub max_entries: usize,
    pub referrer: Option<String>,
    pub endpoint: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            delay_secs: 1.0,
            max_entries: 0,
            referrer: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    translate: Option<TranslateSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateSettings {
    delay: Option<f64>,
    max_entries: Option<usize>,
    referrer: Option<String>,
    endpoint: Option<String>,
}

/// Loads layered settings: `settings.toml`, then `settings.local.toml`, then
/// an explicit extra file. Later files win; a missing layered file is fine,
/// a missing explicit file is an error.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        let Some(translate) = incoming.translate else {
            return;
        };
        if let Some(delay) = translate.delay
            && delay >= 0.0
        {
            self.delay_secs = delay;
        }
        if let Some(max_entries) = translate.max_entries {
            self.max_entries = max_entries;
        }
        if let Some(referrer) = translate.referrer {
            self.referrer = Some(referrer);
        }
        if let Some(endpoint) = translate.endpoint {
            self.endpoint = Some(endpoint);
        }
    }
}
