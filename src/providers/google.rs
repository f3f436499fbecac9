use anyhow::anyhow;
use reqwest::header::REFERER;
use serde::Deserialize;

use super::retry::{
    is_rate_limited, retry_after, wait_with_backoff, RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES,
};
use super::{ProviderFuture, TranslationProvider, TranslationRequest};

const BASE_URL: &str = "http://ajax.googleapis.com/ajax/services/language/translate";

/// Client for the Google AJAX language API. The API requires a referrer on
/// every request; callers hosting the tool should pass their own.
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    client: reqwest::Client,
    endpoint: String,
    referrer: Option<String>,
}

impl GoogleTranslate {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: BASE_URL.to_string(),
            referrer: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        if !endpoint.trim().is_empty() {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        let referrer = referrer.into();
        if !referrer.trim().is_empty() {
            self.referrer = Some(referrer);
        }
        self
    }
}

impl Default for GoogleTranslate {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationProvider for GoogleTranslate {
    fn translate(&self, request: TranslationRequest) -> ProviderFuture {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let referrer = self.referrer.clone();
        Box::pin(async move {
            let langpair = format!("{}|{}", request.source_lang, request.target_lang);

            let mut attempt = 0usize;
            let mut delay = RATE_LIMIT_BASE_DELAY;
            loop {
                attempt += 1;
                let mut http_request = client.get(&endpoint).query(&[
                    ("v", "1.0"),
                    ("q", request.text.as_str()),
                    ("langpair", langpair.as_str()),
                ]);
                if let Some(referrer) = &referrer {
                    http_request = http_request.header(REFERER, referrer);
                }
                let response = http_request.send().await?;

                let status = response.status();
                let retry_after = retry_after(response.headers());
                let text = response.text().await.unwrap_or_default();
                if status.is_success() {
                    return extract_translated_text(&text);
                }
                if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
                    delay = wait_with_backoff("Google Translate", attempt, delay, retry_after)
                        .await;
                    continue;
                }
                return Err(anyhow!(
                    "Google Translate API error ({}): {}",
                    status,
                    extract_api_error(&text).unwrap_or(text)
                ));
            }
        })
    }
}

/// The success condition for a response body: a JSON object carrying
/// `responseData.translatedText`. Anything else is a failure, which the
/// pipeline treats as "leave the entry untranslated".
fn extract_translated_text(text: &str) -> Result<String, anyhow::Error> {
    let payload: TranslateResponse = serde_json::from_str(text)
        .map_err(|err| anyhow!("failed to parse translation response JSON: {}", err))?;
    payload
        .response_data
        .and_then(|data| data.translated_text)
        .ok_or_else(|| anyhow!("no translated text in response"))
}

fn extract_api_error(body: &str) -> Option<String> {
    let parsed: TranslateResponse = serde_json::from_str(body).ok()?;
    let details = parsed.response_details?;
    if details.trim().is_empty() {
        return None;
    }
    match parsed.response_status {
        Some(status) => Some(format!("{} (status: {})", details, status)),
        None => Some(details),
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "responseData")]
    response_data: Option<ResponseData>,
    #[serde(rename = "responseDetails")]
    response_details: Option<String>,
    #[serde(rename = "responseStatus")]
    response_status: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}
