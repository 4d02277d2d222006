//! Canned provider implementation - answers with fixed payloads.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use provider_core::{Method, Provider, ProviderError, ProviderRequest, ProviderResponse};

/// A provider that answers every chat with a fixed reply and every emotion
/// analysis with a fixed payload, counting calls as it goes.
///
/// The workhorse mock: registered under arbitrary names it stands in for any
/// real provider in router and registry tests.
pub struct CannedProvider {
    name: String,
    reply: String,
    emotion: Option<Value>,
    init_calls: AtomicU32,
    chat_calls: AtomicU32,
}

impl CannedProvider {
    pub fn new(name: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reply: reply.into(),
            emotion: None,
            init_calls: AtomicU32::new(0),
            chat_calls: AtomicU32::new(0),
        }
    }

    /// Fix the payload returned for `analyze.emotion` requests.
    pub fn with_emotion(mut self, emotion: Value) -> Self {
        self.emotion = Some(emotion);
        self
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> u32 {
        self.chat_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for CannedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn handle_request(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        match request.method {
            Method::ChatSend => {
                self.chat_calls.fetch_add(1, Ordering::SeqCst);
                Ok(ProviderResponse::ok(
                    request.id,
                    json!({ "message": self.reply }),
                ))
            }
            Method::AnalyzeEmotion => {
                let payload = self.emotion.clone().unwrap_or_else(|| {
                    json!({ "emotions": [], "intensity": "low", "crisis_indicators": [] })
                });
                Ok(ProviderResponse::ok(request.id, payload))
            }
            Method::EventTrack => {
                Ok(ProviderResponse::ok(request.id, json!({ "tracked": true })))
            }
        }
    }
}
