//! Main orchestrator that coordinates conversational turns.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use moderation::{
    CrisisDetectionResult, CrisisDetector, CrisisIntervention, CrisisLevel, InterventionOutcome,
    ModerationEngine, ModerationResult,
};
use provider_core::{
    tasks, ChatParams, ChatReply, HistoryMessage, Method, Provider, ProviderError,
    ProviderRequest, ProviderResponse, TurnContext,
};
use provider_registry::{ProviderRegistry, RegistryError};
use tool_executor::{
    BatchOutcome, CallOutcome, CallRunner, ExecutionOptions, ToolCall, ToolExecutor,
};

use crate::error::OrchestratorError;
use crate::profiles::LlmProfile;
use crate::router::select_profile;
use crate::turn::TurnReply;

/// Scripted reply used when every provider in the chain failed.
pub const FALLBACK_APOLOGY: &str = "Desculpe, estou tendo dificuldades técnicas no momento. \
     Você pode tentar novamente em alguns instantes?";

/// Tuning for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Gate for the AI classifier stage of crisis detection.
    pub use_ai_classifier: bool,
    /// How many trailing history messages are forwarded to providers.
    pub history_limit: usize,
    /// Registry name of the analytics sink. `None` disables event tracking.
    pub analytics_provider: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            use_ai_classifier: true,
            history_limit: 20,
            analytics_provider: Some("analytics".to_string()),
        }
    }
}

/// Bridges the executor to the registry.
///
/// `server` in a [`ToolCall`] is a registry provider name; resolution
/// happens per attempt, so a provider that recovers mid-retry is picked up.
struct RegistryRunner {
    registry: Arc<ProviderRegistry>,
}

#[async_trait]
impl CallRunner for RegistryRunner {
    async fn run(
        &self,
        server: &str,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        let provider = self
            .registry
            .get(server)
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))?;
        provider.handle_request(request).await
    }
}

/// Main orchestrator that coordinates conversational turns.
///
/// The orchestrator:
/// - Routes each turn to an [`LlmProfile`] and walks its provider chain
/// - Runs crisis detection before and moderation after every reply
/// - Resolves providers lazily through the [`ProviderRegistry`]
/// - Delegates batch work to the [`ToolExecutor`]
/// - Tracks analytics events without ever blocking a turn
///
/// [`send_turn`](Self::send_turn) is deliberately infallible: whatever
/// breaks, the caller gets moderated Portuguese text to show.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    executor: ToolExecutor,
    runner: Arc<dyn CallRunner>,
    crisis: CrisisDetector,
    moderation: ModerationEngine,
    config: OrchestratorConfig,
    options: ExecutionOptions,
    direct_fallback: Option<Arc<dyn Provider>>,
}

impl Orchestrator {
    /// Create an orchestrator over `registry` with default configuration
    /// and a detector without classifier or store.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        let runner: Arc<dyn CallRunner> = Arc::new(RegistryRunner {
            registry: Arc::clone(&registry),
        });
        Self {
            registry,
            executor: ToolExecutor::new(),
            runner,
            crisis: CrisisDetector::new(),
            moderation: ModerationEngine::new(),
            config: OrchestratorConfig::default(),
            options: ExecutionOptions::default(),
            direct_fallback: None,
        }
    }

    /// Replace the crisis detector, typically to attach a classifier and an
    /// intervention store.
    pub fn with_crisis_detector(mut self, detector: CrisisDetector) -> Self {
        self.crisis = detector;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Timeout and retry policy for the batch call paths.
    pub fn with_execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Last-resort provider consulted when an entire chain failed.
    pub fn with_direct_fallback(mut self, provider: Arc<dyn Provider>) -> Self {
        self.direct_fallback = Some(provider);
        self
    }

    /// Resolve `server` and forward one request.
    ///
    /// No implicit retry; the batch paths carry the retry policy.
    pub async fn call(
        &self,
        server: &str,
        method: Method,
        params: Map<String, Value>,
    ) -> Result<ProviderResponse, OrchestratorError> {
        let provider = self.registry.get(server).await?;
        let response = provider.handle_request(ProviderRequest::new(method, params)).await?;
        Ok(response)
    }

    /// Execute a batch concurrently through the executor.
    pub async fn call_parallel(&self, calls: &[ToolCall]) -> BatchOutcome {
        self.executor
            .execute_parallel(calls, &self.runner, &self.options)
            .await
    }

    /// Execute a batch one call at a time.
    pub async fn call_sequential(&self, calls: &[ToolCall]) -> BatchOutcome {
        self.executor
            .execute_sequential(calls, &self.runner, &self.options)
            .await
    }

    /// Run a batch in parallel and fold the successful payloads.
    pub async fn call_with_aggregation<F>(&self, calls: &[ToolCall], aggregator: F) -> CallOutcome
    where
        F: FnOnce(&[Value]) -> Result<Value, String>,
    {
        self.executor
            .execute_with_aggregation(calls, &self.runner, aggregator, &self.options)
            .await
    }

    /// Handle one conversational turn end-to-end.
    ///
    /// Never fails: when every provider is down the reply degrades to a
    /// scripted apology, and moderation runs on whatever text goes out.
    pub async fn send_turn(
        &self,
        message: &str,
        context: &TurnContext,
        history: &[HistoryMessage],
    ) -> TurnReply {
        let started = Instant::now();
        info!(
            "Processing turn from {} ({} history message(s))",
            context.user_id.as_deref().unwrap_or("anonymous"),
            history.len()
        );

        // 1. Full crisis detection; the classifier stage is gated by config.
        let crisis = self
            .crisis
            .detect(message, self.config.use_ai_classifier, context.user_id.as_deref())
            .await;

        // 2. Route the turn, then let the detector override the profile.
        let mut profile = select_profile(&self.crisis, message, context, history.len());
        if crisis.should_use_crisis_safe_model && profile != LlmProfile::CrisisSafe {
            info!("Crisis detection overrides profile {} -> crisis-safe", profile);
            profile = LlmProfile::CrisisSafe;
        }
        debug!("Turn routed to profile {}", profile);

        // 3. Build chat params with trimmed history.
        let mut chat = ChatParams::new(message);
        chat.context = Some(context.clone());
        chat.history = trim_history(history, self.config.history_limit);
        let params = chat.into_params();

        // 4. Walk the fallback chain until a provider answers.
        let mut answer: Option<(String, String)> = None;
        for name in profile.fallback_chain() {
            match self.chat_once(name, params.clone()).await {
                Ok(text) => {
                    answer = Some((text, (*name).to_string()));
                    break;
                }
                Err(err) => warn!("Provider '{}' failed this turn: {}", name, err),
            }
        }

        // 5. Chain exhausted: try the direct fallback provider.
        if answer.is_none() {
            if let Some(direct) = &self.direct_fallback {
                let label = format!("{}-direct", direct.name());
                match self.chat_direct(direct.as_ref(), params.clone()).await {
                    Ok(text) => {
                        info!("Direct fallback '{}' answered the turn", label);
                        answer = Some((text, label));
                    }
                    Err(err) => warn!("Direct fallback '{}' failed: {}", label, err),
                }
            }
        }

        // 6. Still nothing: scripted apology.
        let (text, provider_used) = match answer {
            Some((text, provider)) => (text, Some(provider)),
            None => {
                warn!("Every provider failed; falling back to the scripted apology");
                (FALLBACK_APOLOGY.to_string(), None)
            }
        };

        // 7. Moderate whatever goes out, apology included.
        let moderated = self.moderation.apply_moderation(&text, message);

        // 8. Fire-and-forget analytics.
        self.track_turn(&moderated.result, &crisis, profile, provider_used.as_deref(), started);

        TurnReply {
            text: moderated.text,
            profile,
            provider_used,
            moderation: moderated.result,
            crisis: (crisis.level > CrisisLevel::None).then_some(crisis),
        }
    }

    /// One hop of the fallback chain. Success requires a success envelope
    /// carrying a non-empty reply message.
    async fn chat_once(
        &self,
        server: &str,
        params: Map<String, Value>,
    ) -> Result<String, OrchestratorError> {
        let response = self.call(server, Method::ChatSend, params).await?;
        ChatReply::from_response(&response).ok_or_else(|| {
            let detail = response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "resposta sem mensagem".to_string());
            OrchestratorError::Provider(ProviderError::ProcessingFailed(detail))
        })
    }

    /// Ask the direct fallback provider, bypassing the registry.
    async fn chat_direct(
        &self,
        provider: &dyn Provider,
        params: Map<String, Value>,
    ) -> Result<String, OrchestratorError> {
        let request = ProviderRequest::new(Method::ChatSend, params);
        let response = provider.handle_request(request).await?;
        ChatReply::from_response(&response).ok_or_else(|| {
            OrchestratorError::Provider(ProviderError::ProcessingFailed(
                "resposta sem mensagem".to_string(),
            ))
        })
    }

    /// Queue a `turn_completed` / `turn_failed` event on the analytics
    /// provider. Detached; an unconfigured or broken sink never slows a
    /// turn, and an unregistered one drops the event quietly.
    fn track_turn(
        &self,
        moderation: &ModerationResult,
        crisis: &CrisisDetectionResult,
        profile: LlmProfile,
        provider_used: Option<&str>,
        started: Instant,
    ) {
        let Some(sink) = self.config.analytics_provider.clone() else {
            return;
        };

        let event = if provider_used.is_some() {
            "turn_completed"
        } else {
            "turn_failed"
        };
        let mut params = Map::new();
        params.insert("event".to_string(), json!(event));
        params.insert("profile".to_string(), json!(profile.as_str()));
        params.insert("crisis_level".to_string(), json!(crisis.level.as_str()));
        params.insert(
            "moderation_severity".to_string(),
            json!(moderation.severity.as_str()),
        );
        params.insert(
            "elapsed_ms".to_string(),
            json!(started.elapsed().as_millis() as u64),
        );
        if let Some(provider) = provider_used {
            params.insert("provider".to_string(), json!(provider));
        }

        let registry = Arc::clone(&self.registry);
        tasks::spawn_logged("analytics-event", async move {
            let provider = match registry.get(&sink).await {
                Ok(provider) => provider,
                Err(RegistryError::NotRegistered(_)) => {
                    debug!("Analytics provider '{}' not registered; event dropped", sink);
                    return Ok(());
                }
                Err(err) => return Err(err.to_string()),
            };
            let request = ProviderRequest::new(Method::EventTrack, params);
            provider
                .handle_request(request)
                .await
                .map_err(|err| err.to_string())?;
            Ok::<(), String>(())
        });
    }

    /// Interventions due for follow-up right now.
    pub async fn due_follow_ups(&self) -> Vec<CrisisIntervention> {
        self.crisis.pending_follow_ups(Utc::now()).await
    }

    /// Record how a crisis intervention resolved.
    pub async fn record_outcome(
        &self,
        intervention_id: &str,
        outcome: InterventionOutcome,
        notes: Option<String>,
    ) {
        self.crisis
            .update_intervention_outcome(intervention_id, outcome, notes)
            .await
    }

    /// The registry, for registration and lifecycle management.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// The crisis detector, for callers that only need detection.
    pub fn crisis_detector(&self) -> &CrisisDetector {
        &self.crisis
    }

    /// Shut down every loaded provider.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

/// Last `limit` messages of `history`, oldest first.
fn trim_history(history: &[HistoryMessage], limit: usize) -> Vec<HistoryMessage> {
    let start = history.len().saturating_sub(limit);
    history[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use amparo_database::{Database, SqliteInterventionStore};
    use futures::future::join_all;
    use mock_provider::{CannedProvider, EchoProvider, FailingProvider};
    use moderation::{InterventionStore, ModerationSeverity};
    use provider_registry::ProviderRegistration;
    use tokio::time::sleep;

    use crate::classifier::RegistryEmotionClassifier;

    /// Captures every analytics event it receives.
    struct RecordingSink {
        events: Mutex<Vec<Map<String, Value>>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<Map<String, Value>> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for RecordingSink {
        fn name(&self) -> &str {
            "analytics"
        }

        async fn handle_request(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.events.lock().unwrap().push(request.params.clone());
            Ok(ProviderResponse::ok(request.id, json!({ "tracked": true })))
        }
    }

    /// Records the chat params of the last request it served.
    struct RecordingProvider {
        seen: Mutex<Option<ChatParams>>,
    }

    impl RecordingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn handle_request(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let chat = ChatParams::from_params(&request.params)?;
            *self.seen.lock().unwrap() = Some(chat);
            Ok(ProviderResponse::ok(request.id, json!({ "message": "anotado" })))
        }
    }

    async fn orchestrator_with(entries: Vec<(&str, Arc<dyn Provider>)>) -> Orchestrator {
        let registry = Arc::new(ProviderRegistry::new());
        for (name, provider) in entries {
            registry
                .register(ProviderRegistration::instance(name, provider))
                .await;
        }
        Orchestrator::new(registry)
    }

    fn user_context(user_id: &str) -> TurnContext {
        TurnContext {
            user_id: Some(user_id.to_string()),
            ..TurnContext::default()
        }
    }

    async fn wait_for<F: Fn() -> bool>(check: F) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn turn_uses_the_primary_provider() {
        let orchestrator = orchestrator_with(vec![(
            "googleai",
            Arc::new(CannedProvider::new("googleai", "Oi! Como você está?")) as Arc<dyn Provider>,
        )])
        .await;

        let reply = orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        assert!(reply.answered());
        assert_eq!(reply.provider_used.as_deref(), Some("googleai"));
        assert_eq!(reply.profile, LlmProfile::ChatCheap);
        assert_eq!(reply.text, "Oi! Como você está?");
        assert!(reply.crisis.is_none());
        assert_eq!(reply.moderation.severity, ModerationSeverity::Safe);
    }

    #[tokio::test]
    async fn chain_falls_back_when_the_primary_fails() {
        let orchestrator = orchestrator_with(vec![
            (
                "googleai",
                Arc::new(FailingProvider::transport("googleai")) as Arc<dyn Provider>,
            ),
            (
                "openai",
                Arc::new(CannedProvider::new("openai", "estou aqui")) as Arc<dyn Provider>,
            ),
        ])
        .await;

        let reply = orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        assert_eq!(reply.provider_used.as_deref(), Some("openai"));
        assert_eq!(reply.text, "estou aqui");
    }

    #[tokio::test]
    async fn an_empty_reply_counts_as_a_failed_hop() {
        let orchestrator = orchestrator_with(vec![
            (
                "googleai",
                Arc::new(CannedProvider::new("googleai", "")) as Arc<dyn Provider>,
            ),
            (
                "openai",
                Arc::new(CannedProvider::new("openai", "tudo certo")) as Arc<dyn Provider>,
            ),
        ])
        .await;

        let reply = orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        assert_eq!(reply.provider_used.as_deref(), Some("openai"));
        assert_eq!(reply.text, "tudo certo");
    }

    #[tokio::test]
    async fn direct_fallback_answers_when_the_chain_is_down() {
        let orchestrator = orchestrator_with(vec![])
            .await
            .with_direct_fallback(Arc::new(CannedProvider::new("reserva", "ainda estou aqui")));

        let reply = orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        assert_eq!(reply.provider_used.as_deref(), Some("reserva-direct"));
        assert_eq!(reply.text, "ainda estou aqui");
    }

    #[tokio::test]
    async fn apology_when_every_provider_fails() {
        let orchestrator = orchestrator_with(vec![]).await;

        let reply = orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        assert!(!reply.answered());
        assert_eq!(reply.provider_used, None);
        assert_eq!(reply.text, FALLBACK_APOLOGY);
        assert_eq!(reply.moderation.severity, ModerationSeverity::Safe);
    }

    #[tokio::test]
    async fn crisis_turns_reroute_and_carry_resources() {
        // Crisis traffic leads with openai; googleai is deliberately absent.
        let orchestrator = orchestrator_with(vec![(
            "openai",
            Arc::new(CannedProvider::new("openai", "Estou com você. Vamos conversar."))
                as Arc<dyn Provider>,
        )])
        .await;

        let reply = orchestrator
            .send_turn("eu quero morrer", &TurnContext::default(), &[])
            .await;

        assert_eq!(reply.profile, LlmProfile::CrisisSafe);
        assert_eq!(reply.provider_used.as_deref(), Some("openai"));

        let crisis = reply.crisis.expect("crisis verdict");
        assert_eq!(crisis.level, CrisisLevel::Critical);
        assert!(crisis.urgent_resources.iter().any(|r| r.contains("CVV")));

        // The reply goes out with the crisis disclaimer on top.
        assert!(reply.text.starts_with("🆘"));
        assert!(reply.text.contains("CVV 188"));
        assert!(reply.text.ends_with("Vamos conversar."));
        assert_eq!(reply.moderation.severity, ModerationSeverity::Critical);
    }

    #[tokio::test]
    async fn classifier_verdict_overrides_the_routed_profile() {
        // Wording with no literal or contextual signal; only the classifier
        // sees a crisis. The router would pick the cheap tier.
        let registry = Arc::new(ProviderRegistry::new());
        let emotion = json!({
            "emotions": ["despair", "sadness"],
            "intensity": "high",
            "crisis_indicators": ["ideação suicida"]
        });
        registry
            .register(ProviderRegistration::instance(
                "googleai",
                Arc::new(CannedProvider::new("googleai", "conte comigo").with_emotion(emotion)),
            ))
            .await;
        registry
            .register(ProviderRegistration::instance(
                "openai",
                Arc::new(CannedProvider::new("openai", "estou ouvindo você")),
            ))
            .await;

        let classifier = RegistryEmotionClassifier::new(Arc::clone(&registry));
        let detector = CrisisDetector::new().with_classifier(Arc::new(classifier));
        let orchestrator = Orchestrator::new(registry).with_crisis_detector(detector);

        let reply = orchestrator
            .send_turn("hoje foi um dia comum", &TurnContext::default(), &[])
            .await;

        let crisis = reply.crisis.expect("crisis verdict");
        assert_eq!(crisis.level, CrisisLevel::Critical);
        assert_eq!(reply.profile, LlmProfile::CrisisSafe);
        // Crisis-safe chain leads with openai, not the router's googleai.
        assert_eq!(reply.provider_used.as_deref(), Some("openai"));
    }

    #[tokio::test]
    async fn interventions_persist_through_sqlite() {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        let store = Arc::new(SqliteInterventionStore::new(&db));

        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register(ProviderRegistration::instance(
                "openai",
                Arc::new(CannedProvider::new("openai", "você não está sozinha")),
            ))
            .await;
        let detector = CrisisDetector::new().with_store(store.clone());
        let orchestrator = Orchestrator::new(registry).with_crisis_detector(detector);

        let reply = orchestrator
            .send_turn("Eu quero sumir", &user_context("user-7"), &[])
            .await;

        let crisis = reply.crisis.expect("crisis verdict");
        assert_eq!(crisis.level, CrisisLevel::Severe);
        let id = crisis.intervention_id.expect("intervention id");

        // The insert is detached; poll until it lands.
        let cutoff = Utc::now() - chrono::Duration::hours(1);
        let mut recorded = false;
        for _ in 0..100 {
            if store.recent_severe_count("user-7", cutoff).await.unwrap() == 1 {
                recorded = true;
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert!(recorded, "intervention never reached the database");

        let record = amparo_database::intervention::get_intervention(db.pool(), &id)
            .await
            .unwrap();
        assert_eq!(record.user_id, "user-7");
        assert!(record.follow_up_needed);
    }

    #[tokio::test]
    async fn history_is_trimmed_to_the_limit() {
        let recorder = RecordingProvider::new();
        let orchestrator = orchestrator_with(vec![(
            "googleai",
            Arc::clone(&recorder) as Arc<dyn Provider>,
        )])
        .await;

        let history: Vec<HistoryMessage> = (0..30)
            .map(|i| HistoryMessage::user(format!("mensagem {}", i)))
            .collect();
        let reply = orchestrator
            .send_turn("oi", &user_context("user-1"), &history)
            .await;
        assert!(reply.answered());

        let seen = recorder.seen.lock().unwrap().clone().expect("params recorded");
        assert_eq!(seen.history.len(), 20);
        assert_eq!(seen.history[0].content, "mensagem 10");
        assert_eq!(seen.history[19].content, "mensagem 29");
        assert_eq!(
            seen.context.and_then(|c| c.user_id).as_deref(),
            Some("user-1")
        );
    }

    #[tokio::test]
    async fn analytics_events_are_tracked() {
        let sink = RecordingSink::new();
        let orchestrator = orchestrator_with(vec![
            (
                "googleai",
                Arc::new(CannedProvider::new("googleai", "oi!")) as Arc<dyn Provider>,
            ),
            ("analytics", Arc::clone(&sink) as Arc<dyn Provider>),
        ])
        .await;

        orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        let sink_ref = Arc::clone(&sink);
        assert!(wait_for(move || !sink_ref.events().is_empty()).await);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["event"], json!("turn_completed"));
        assert_eq!(events[0]["profile"], json!("chat-cheap"));
        assert_eq!(events[0]["provider"], json!("googleai"));
        assert_eq!(events[0]["crisis_level"], json!("none"));
    }

    #[tokio::test]
    async fn failed_turns_track_turn_failed() {
        let sink = RecordingSink::new();
        let orchestrator =
            orchestrator_with(vec![("analytics", Arc::clone(&sink) as Arc<dyn Provider>)]).await;

        orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        let sink_ref = Arc::clone(&sink);
        assert!(wait_for(move || !sink_ref.events().is_empty()).await);

        let events = sink.events();
        assert_eq!(events[0]["event"], json!("turn_failed"));
        assert!(events[0].get("provider").is_none());
    }

    #[tokio::test]
    async fn disabling_analytics_skips_tracking() {
        let sink = RecordingSink::new();
        let orchestrator = orchestrator_with(vec![
            (
                "googleai",
                Arc::new(CannedProvider::new("googleai", "oi!")) as Arc<dyn Provider>,
            ),
            ("analytics", Arc::clone(&sink) as Arc<dyn Provider>),
        ])
        .await
        .with_config(OrchestratorConfig {
            analytics_provider: None,
            ..OrchestratorConfig::default()
        });

        orchestrator
            .send_turn("oi, tudo bem?", &TurnContext::default(), &[])
            .await;

        sleep(Duration::from_millis(50)).await;
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn concurrent_turns_share_one_provider_construction() {
        let canned = Arc::new(CannedProvider::new("googleai", "oi!"));
        let orchestrator = orchestrator_with(vec![(
            "googleai",
            Arc::clone(&canned) as Arc<dyn Provider>,
        )])
        .await;

        let context = TurnContext::default();
        let turns = (0..3).map(|_| orchestrator.send_turn("oi, tudo bem?", &context, &[]));
        let replies = join_all(turns).await;

        assert!(replies.iter().all(|r| r.answered()));
        assert_eq!(canned.init_calls(), 1);
        assert_eq!(canned.chat_calls(), 3);
    }

    #[tokio::test]
    async fn direct_calls_surface_registry_errors() {
        let orchestrator = orchestrator_with(vec![(
            "echo",
            Arc::new(EchoProvider::new()) as Arc<dyn Provider>,
        )])
        .await;

        let err = orchestrator
            .call("ghost", Method::ChatSend, Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ProviderUnavailable(_)));

        let params = ChatParams::new("oi").into_params();
        let response = orchestrator.call("echo", Method::ChatSend, params).await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn batches_run_through_the_registry_runner() {
        let orchestrator = orchestrator_with(vec![
            (
                "googleai",
                Arc::new(CannedProvider::new("googleai", "a")) as Arc<dyn Provider>,
            ),
            (
                "openai",
                Arc::new(CannedProvider::new("openai", "b")) as Arc<dyn Provider>,
            ),
        ])
        .await;

        let params = ChatParams::new("oi").into_params();
        let calls = vec![
            ToolCall::new("googleai", Method::ChatSend).with_params(params.clone()),
            ToolCall::new("openai", Method::ChatSend).with_params(params),
        ];

        let batch = orchestrator.call_parallel(&calls).await;
        assert!(batch.all_succeeded);
        assert_eq!(batch.data.len(), 2);

        let outcome = orchestrator
            .call_with_aggregation(&calls, |data| Ok(json!({ "replies": data.len() })))
            .await;
        assert_eq!(outcome.data().unwrap()["replies"], 2);
    }

    #[tokio::test]
    async fn trim_history_keeps_the_tail() {
        let history: Vec<HistoryMessage> =
            (0..5).map(|i| HistoryMessage::user(format!("m{}", i))).collect();

        let trimmed = trim_history(&history, 3);
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed[0].content, "m2");

        let untouched = trim_history(&history, 10);
        assert_eq!(untouched.len(), 5);
    }
}
