use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

mod google;
mod retry;

pub use google::GoogleTranslate;

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<String>> + Send>>;

/// A fallible remote translation service. Transport and authentication live
/// behind this seam; the pipeline only sees translated text or an error.
pub trait TranslationProvider: Send + Sync {
    fn translate(&self, request: TranslationRequest) -> ProviderFuture;
}
