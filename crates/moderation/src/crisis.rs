//! Staged crisis detection.
//!
//! Three stages, most precise first:
//! 1. literal keyword scan through the moderation families,
//! 2. contextual phrase patterns,
//! 3. optional AI emotion classification.
//!
//! An earlier stage's verdict is never lowered by a later stage, and every
//! path out of [`CrisisDetector::detect`] returns a usable result: the
//! detector degrades, it does not fail.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use provider_core::tasks;

use crate::emotion::{EmotionAnalysis, EmotionClassifier, Intensity};
use crate::engine::ModerationEngine;
use crate::intervention::{CrisisIntervention, InterventionOutcome, InterventionStore};
use crate::patterns::{ModerationCategory, RESOURCE_CAPS, RESOURCE_CVV, RESOURCE_SAMU};
use crate::phrases::{scan_contextual, ContextualScan};

/// Severity of a detected crisis, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisLevel {
    None,
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl CrisisLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisLevel::None => "none",
            CrisisLevel::Mild => "mild",
            CrisisLevel::Moderate => "moderate",
            CrisisLevel::Severe => "severe",
            CrisisLevel::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(CrisisLevel::None),
            "mild" => Some(CrisisLevel::Mild),
            "moderate" => Some(CrisisLevel::Moderate),
            "severe" => Some(CrisisLevel::Severe),
            "critical" => Some(CrisisLevel::Critical),
            _ => None,
        }
    }
}

/// What kind of crisis the signals point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisType {
    SuicidalIdeation,
    SelfHarm,
    SevereDepression,
    Anxiety,
    Panic,
    Overwhelm,
    PostpartumCrisis,
}

/// Full verdict of a detection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisDetectionResult {
    pub level: CrisisLevel,
    pub crisis_types: Vec<CrisisType>,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub should_use_crisis_safe_model: bool,
    pub urgent_resources: Vec<String>,
    pub reasoning: String,
    /// Set when this detection scheduled a persisted intervention.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_id: Option<String>,
}

/// Cheap verdict for hot paths that cannot await a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCrisisCheck {
    pub is_crisis: bool,
    pub should_use_crisis_safe_model: bool,
}

/// Staged crisis detector.
///
/// Without a classifier the detector is fully deterministic; without a store
/// it still detects but records nothing.
#[derive(Default)]
pub struct CrisisDetector {
    moderation: ModerationEngine,
    classifier: Option<Arc<dyn EmotionClassifier>>,
    store: Option<Arc<dyn InterventionStore>>,
}

impl CrisisDetector {
    pub fn new() -> Self {
        CrisisDetector::default()
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn EmotionClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn InterventionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run the full detection pipeline over one user message.
    ///
    /// `use_ai` gates the classifier stage; callers on a budget pass false
    /// and still get the deterministic stages. `user_id` enables intervention
    /// persistence for severe and critical verdicts.
    pub async fn detect(
        &self,
        message: &str,
        use_ai: bool,
        user_id: Option<&str>,
    ) -> CrisisDetectionResult {
        let keyword_scan = self.moderation.detect_crisis_keywords(message);
        if keyword_scan.is_crisis {
            info!(
                "crisis keywords matched: {}",
                join_categories(&keyword_scan.categories)
            );
            let result = CrisisDetectionResult {
                level: CrisisLevel::Critical,
                crisis_types: types_from_categories(&keyword_scan.categories),
                confidence: 0.95,
                should_use_crisis_safe_model: true,
                urgent_resources: vec![
                    RESOURCE_CVV.to_string(),
                    RESOURCE_SAMU.to_string(),
                    RESOURCE_CAPS.to_string(),
                ],
                reasoning: format!(
                    "palavras-chave críticas detectadas: {}",
                    join_categories(&keyword_scan.categories)
                ),
                intervention_id: None,
            };
            return self.record_if_needed(result, message, user_id).await;
        }

        let contextual = scan_contextual(message);
        if contextual.detected && contextual.level >= CrisisLevel::Severe {
            info!(
                "contextual crisis phrases matched at level {}: {}",
                contextual.level.as_str(),
                contextual.matched.join(", ")
            );
            let urgent_resources = if contextual.level >= CrisisLevel::Critical {
                vec![RESOURCE_CVV.to_string(), RESOURCE_SAMU.to_string()]
            } else {
                vec![RESOURCE_CVV.to_string()]
            };
            let result = CrisisDetectionResult {
                level: contextual.level,
                crisis_types: contextual.crisis_types.clone(),
                confidence: 0.85,
                should_use_crisis_safe_model: true,
                urgent_resources,
                reasoning: format!(
                    "expressões de sofrimento detectadas: {}",
                    contextual.matched.join(", ")
                ),
                intervention_id: None,
            };
            return self.record_if_needed(result, message, user_id).await;
        }

        if use_ai {
            if let Some(classifier) = &self.classifier {
                match classifier.analyze(message).await {
                    Ok(analysis) => {
                        let result = interpret_emotion(&analysis, message, &contextual);
                        return self.record_if_needed(result, message, user_id).await;
                    }
                    Err(err) => {
                        warn!("emotion classification failed, falling back: {}", err);
                        return self.fallback(contextual.detected);
                    }
                }
            }
        }

        self.fallback(contextual.detected)
    }

    /// Pattern-only check for hot paths: no classifier, no persistence.
    pub fn detect_sync(&self, message: &str) -> SyncCrisisCheck {
        let keyword_scan = self.moderation.detect_crisis_keywords(message);
        if keyword_scan.is_crisis {
            return SyncCrisisCheck {
                is_crisis: true,
                should_use_crisis_safe_model: true,
            };
        }
        let contextual = scan_contextual(message);
        SyncCrisisCheck {
            is_crisis: contextual.level >= CrisisLevel::Moderate,
            should_use_crisis_safe_model: contextual.level >= CrisisLevel::Severe,
        }
    }

    /// The contextual stage on its own, for callers that want the raw scan.
    pub fn detect_contextual(&self, message: &str) -> ContextualScan {
        scan_contextual(message)
    }

    /// Records how an intervention resolved. Failures are logged, never
    /// surfaced; outcome tracking must not break a live conversation.
    pub async fn update_intervention_outcome(
        &self,
        intervention_id: &str,
        outcome: InterventionOutcome,
        notes: Option<String>,
    ) {
        let Some(store) = &self.store else {
            debug!(
                "no intervention store configured; outcome for '{}' dropped",
                intervention_id
            );
            return;
        };
        match store.update_outcome(intervention_id, outcome, notes).await {
            Ok(()) => info!(
                "intervention '{}' resolved as {}",
                intervention_id,
                outcome.as_str()
            ),
            Err(err) => warn!(
                "failed to record outcome for intervention '{}': {}",
                intervention_id, err
            ),
        }
    }

    /// Interventions due for a follow-up at `now`, most recent first.
    pub async fn pending_follow_ups(&self, now: DateTime<Utc>) -> Vec<CrisisIntervention> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.pending_follow_ups(now, 50).await {
            Ok(interventions) => interventions,
            Err(err) => {
                warn!("failed to list pending follow-ups: {}", err);
                Vec::new()
            }
        }
    }

    /// Whether `user_id` had a severe or critical episode within `window`.
    pub async fn has_recent_crisis(&self, user_id: &str, window: Duration) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.recent_severe_count(user_id, Utc::now() - window).await {
            Ok(count) => count > 0,
            Err(err) => {
                warn!("failed to check recent crises for '{}': {}", user_id, err);
                false
            }
        }
    }

    /// Severe and critical verdicts persist an intervention when both a user
    /// and a store are known. The insert runs detached so detection latency
    /// never depends on storage; the id is stamped on the result either way.
    async fn record_if_needed(
        &self,
        mut result: CrisisDetectionResult,
        message: &str,
        user_id: Option<&str>,
    ) -> CrisisDetectionResult {
        if result.level < CrisisLevel::Severe {
            return result;
        }
        let (Some(user_id), Some(store)) = (user_id, self.store.as_ref()) else {
            return result;
        };

        let intervention = CrisisIntervention::new(
            user_id,
            result.level,
            result.crisis_types.clone(),
            message,
            result.urgent_resources.clone(),
        );
        result.intervention_id = Some(intervention.id.clone());
        info!(
            "registering crisis intervention '{}' at level {} for user '{}'",
            intervention.id,
            result.level.as_str(),
            user_id
        );

        let store = Arc::clone(store);
        tasks::spawn_logged("crisis-intervention-insert", async move {
            store.insert(&intervention).await
        });

        result
    }

    /// Deterministic verdict when the classifier is unavailable. Any earlier
    /// signal is kept as a moderate crisis rather than discarded.
    fn fallback(&self, earlier_signal: bool) -> CrisisDetectionResult {
        if earlier_signal {
            CrisisDetectionResult {
                level: CrisisLevel::Moderate,
                crisis_types: vec![CrisisType::Anxiety, CrisisType::Overwhelm],
                confidence: 0.6,
                should_use_crisis_safe_model: true,
                urgent_resources: vec![RESOURCE_CVV.to_string()],
                reasoning: "classificação indisponível; sinal determinístico mantido por precaução"
                    .to_string(),
                intervention_id: None,
            }
        } else {
            CrisisDetectionResult {
                level: CrisisLevel::None,
                crisis_types: Vec::new(),
                confidence: 0.8,
                should_use_crisis_safe_model: false,
                urgent_resources: Vec::new(),
                reasoning: "nenhum sinal de crise identificado".to_string(),
                intervention_id: None,
            }
        }
    }
}

/// Maps an emotion analysis onto a crisis verdict.
///
/// Explicit risk indicators dominate; otherwise level grows with intensity
/// and the number of distinct crisis types. A deterministic contextual
/// signal from an earlier stage is merged back in so the classifier can
/// refine a verdict upward but never water it down.
fn interpret_emotion(
    analysis: &EmotionAnalysis,
    message: &str,
    contextual: &ContextualScan,
) -> CrisisDetectionResult {
    let emotions: Vec<String> = analysis.emotions.iter().map(|e| e.to_lowercase()).collect();
    let high = analysis.intensity == Intensity::High;
    let message_lower = message.to_lowercase();

    let mut crisis_types: Vec<CrisisType> = Vec::new();
    let push = |types: &mut Vec<CrisisType>, ty: CrisisType| {
        if !types.contains(&ty) {
            types.push(ty);
        }
    };

    let anxious = ["ansiedade", "anxiety", "pânico", "panico", "panic", "medo"];
    if emotions.iter().any(|e| anxious.contains(&e.as_str())) {
        push(&mut crisis_types, CrisisType::Anxiety);
        if high {
            push(&mut crisis_types, CrisisType::Panic);
        }
    }

    let depressed = [
        "tristeza",
        "sadness",
        "depressão",
        "depressao",
        "depression",
        "desesperança",
        "desesperanca",
        "hopelessness",
    ];
    if emotions.iter().any(|e| depressed.contains(&e.as_str())) {
        push(&mut crisis_types, CrisisType::SevereDepression);
    }

    let exhausted = [
        "exaustão",
        "exaustao",
        "exhaustion",
        "cansaço",
        "cansaco",
        "sobrecarga",
        "overwhelm",
    ];
    if emotions.iter().any(|e| exhausted.contains(&e.as_str()))
        || message_lower.contains("não aguento")
        || message_lower.contains("nao aguento")
    {
        push(&mut crisis_types, CrisisType::Overwhelm);
    }

    let explicit_risk = analysis.crisis_indicators.iter().any(|indicator| {
        let indicator = indicator.to_lowercase();
        indicator.contains("suicid")
            || indicator.contains("auto-lesão")
            || indicator.contains("auto-lesao")
            || indicator.contains("machucar")
    });
    let mut urgent_resources = Vec::new();
    if explicit_risk {
        push(&mut crisis_types, CrisisType::SuicidalIdeation);
        urgent_resources = vec![RESOURCE_CVV.to_string(), RESOURCE_SAMU.to_string()];
    }

    let mut level = if explicit_risk {
        CrisisLevel::Critical
    } else if high && crisis_types.len() >= 2 {
        CrisisLevel::Severe
    } else if high || crisis_types.len() >= 2 {
        CrisisLevel::Moderate
    } else if !crisis_types.is_empty() {
        CrisisLevel::Mild
    } else {
        CrisisLevel::None
    };

    if contextual.detected && contextual.level > level {
        debug!(
            "contextual signal at {} outranks classifier verdict at {}",
            contextual.level.as_str(),
            level.as_str()
        );
        level = contextual.level;
        for ty in &contextual.crisis_types {
            push(&mut crisis_types, *ty);
        }
    }

    if level >= CrisisLevel::Severe && urgent_resources.is_empty() {
        urgent_resources.push(RESOURCE_CVV.to_string());
    }

    let mut confidence: f64 = 0.5;
    if !analysis.emotions.is_empty() {
        confidence += 0.2;
    }
    if high {
        confidence += 0.2;
    }
    if crisis_types.len() >= 2 {
        confidence += 0.1;
    }

    let described = if analysis.emotions.is_empty() {
        "nenhuma".to_string()
    } else {
        analysis.emotions.join(", ")
    };

    CrisisDetectionResult {
        level,
        should_use_crisis_safe_model: level >= CrisisLevel::Severe,
        crisis_types,
        confidence: confidence.min(1.0),
        urgent_resources,
        reasoning: format!(
            "análise emocional: intensidade {}, emoções: {}",
            analysis.intensity.as_str(),
            described
        ),
        intervention_id: None,
    }
}

fn types_from_categories(categories: &[ModerationCategory]) -> Vec<CrisisType> {
    let mut types = Vec::new();
    for category in categories {
        let ty = match category {
            ModerationCategory::CrisisMentalHealth => CrisisType::SuicidalIdeation,
            ModerationCategory::SelfHarmRisk => CrisisType::SelfHarm,
            ModerationCategory::ViolenceRisk => CrisisType::PostpartumCrisis,
            ModerationCategory::MedicalEmergency => CrisisType::Panic,
            _ => continue,
        };
        if !types.contains(&ty) {
            types.push(ty);
        }
    }
    if types.is_empty() {
        types.push(CrisisType::SuicidalIdeation);
    }
    types
}

fn join_categories(categories: &[ModerationCategory]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
