//! Emotion classification seam.

use async_trait::async_trait;
use provider_core::ProviderError;
use serde::{Deserialize, Serialize};

/// Intensity of the detected emotional state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    #[default]
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

/// Structured result of classifying one message.
///
/// Fields default individually so a partial payload from a provider still
/// deserializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub crisis_indicators: Vec<String>,
}

/// Classifies the emotional content of user text.
///
/// The crisis detector only consults a classifier after its deterministic
/// stages found nothing conclusive, and treats a classifier failure as a
/// degraded signal, never as an error surfaced to the conversation.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<EmotionAnalysis, ProviderError>;
}
