//! Emotion classification through the provider registry.

use std::sync::Arc;

use async_trait::async_trait;
use moderation::{EmotionAnalysis, EmotionClassifier};
use provider_core::{Method, ProviderError, ProviderRequest};
use provider_registry::ProviderRegistry;
use serde_json::{json, Map, Value};
use tracing::warn;

/// [`EmotionClassifier`] that sends `analyze.emotion` requests to registry
/// providers.
///
/// Providers are tried in order; the first parseable [`EmotionAnalysis`]
/// wins. Only when every provider fails does the classifier itself fail,
/// which the crisis detector then degrades into its deterministic fallback.
pub struct RegistryEmotionClassifier {
    registry: Arc<ProviderRegistry>,
    providers: Vec<String>,
}

impl RegistryEmotionClassifier {
    /// Classifier over the default analysis providers.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            providers: vec!["googleai".to_string(), "openai".to_string()],
        }
    }

    /// Replace the provider order.
    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = providers.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl EmotionClassifier for RegistryEmotionClassifier {
    async fn analyze(&self, text: &str) -> Result<EmotionAnalysis, ProviderError> {
        let mut params = Map::new();
        params.insert("text".to_string(), json!(text));

        let mut last_error: Option<ProviderError> = None;
        for name in &self.providers {
            let provider = match self.registry.get(name).await {
                Ok(provider) => provider,
                Err(err) => {
                    warn!("classifier provider '{}' unavailable: {}", name, err);
                    last_error = Some(ProviderError::Unavailable(err.to_string()));
                    continue;
                }
            };

            let request = ProviderRequest::new(Method::AnalyzeEmotion, params.clone());
            match provider.handle_request(request).await {
                Ok(response) if response.success => {
                    let data = response.data.unwrap_or(Value::Null);
                    match serde_json::from_value::<EmotionAnalysis>(data) {
                        Ok(analysis) => return Ok(analysis),
                        Err(err) => {
                            warn!("classifier payload from '{}' unparseable: {}", name, err);
                            last_error = Some(ProviderError::ProcessingFailed(err.to_string()));
                        }
                    }
                }
                Ok(response) => {
                    let detail = response
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| "resposta sem detalhe".to_string());
                    warn!("classifier provider '{}' refused: {}", name, detail);
                    last_error = Some(ProviderError::ProcessingFailed(detail));
                }
                Err(err) => {
                    warn!("classifier provider '{}' failed: {}", name, err);
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::Unavailable("nenhum provedor de análise configurado".to_string())
        }))
    }
}
