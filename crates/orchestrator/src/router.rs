//! Profile selection for incoming turns.
//!
//! Selection is deterministic and cheap: the synchronous crisis check plus a
//! handful of wording heuristics, so routing never waits on a classifier.
//! The full detection pass runs separately inside the turn pipeline and may
//! still override the routed profile afterwards.

use moderation::CrisisDetector;
use provider_core::TurnContext;
use tracing::debug;

use crate::profiles::LlmProfile;

/// Anxious wording that, corroborated by the context emotion, routes a turn
/// to the crisis-safe profile.
const ANXIETY_KEYWORDS: &[&str] = &[
    "ansiosa",
    "ansiedade",
    "pânico",
    "desespero",
    "desesperada",
    "não aguento",
    "exausta",
    "deprimida",
    "depressão",
    "triste demais",
];

/// Wording that marks a tangled, many-threaded situation.
const COMPLEXITY_MARKERS: &[&str] = &[
    "não sei o que fazer",
    "muito confusa",
    "tantas coisas",
    "é complicado",
    "difícil explicar",
    "vários problemas",
];

/// Context emotions that corroborate anxious wording.
const DISTRESSED_EMOTIONS: &[&str] = &["anxious", "depressed"];

/// Conversations deeper than this many messages get the analysis profile.
const DEEP_CONVERSATION_TURNS: usize = 15;
/// Messages longer than this get the analysis profile.
const LONG_MESSAGE_CHARS: usize = 500;
/// Messages shorter than this may take the cheap profile.
const SHORT_MESSAGE_CHARS: usize = 100;

/// Choose the routing profile for one turn. First match wins.
pub fn select_profile(
    detector: &CrisisDetector,
    message: &str,
    context: &TurnContext,
    conversation_depth: usize,
) -> LlmProfile {
    let check = detector.detect_sync(message);
    if check.is_crisis {
        debug!("sync crisis check routes this turn to crisis-safe");
        return LlmProfile::CrisisSafe;
    }

    let lowered = message.to_lowercase();
    let anxious_wording = ANXIETY_KEYWORDS.iter().any(|k| lowered.contains(k));
    let distressed_context = context
        .emotion
        .as_deref()
        .map(|emotion| DISTRESSED_EMOTIONS.contains(&emotion))
        .unwrap_or(false);
    if anxious_wording && distressed_context {
        debug!("anxious wording plus context emotion routes to crisis-safe");
        return LlmProfile::CrisisSafe;
    }

    // Length in characters; accented text makes byte counts lie.
    let length = message.chars().count();
    let complex = COMPLEXITY_MARKERS.iter().any(|k| lowered.contains(k));
    if complex || conversation_depth > DEEP_CONVERSATION_TURNS || length > LONG_MESSAGE_CHARS {
        return LlmProfile::AnalysisDeep;
    }

    if length < SHORT_MESSAGE_CHARS && !anxious_wording {
        return LlmProfile::ChatCheap;
    }

    LlmProfile::ChatDefault
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CrisisDetector {
        CrisisDetector::new()
    }

    fn anxious_context() -> TurnContext {
        TurnContext {
            emotion: Some("anxious".to_string()),
            ..TurnContext::default()
        }
    }

    #[test]
    fn explicit_crisis_routes_to_crisis_safe() {
        let profile = select_profile(&detector(), "eu quero morrer", &TurnContext::default(), 0);
        assert_eq!(profile, LlmProfile::CrisisSafe);
    }

    #[test]
    fn contextual_distress_routes_to_crisis_safe() {
        let profile = select_profile(
            &detector(),
            "não aguento mais, quero sumir",
            &TurnContext::default(),
            0,
        );
        assert_eq!(profile, LlmProfile::CrisisSafe);
    }

    #[test]
    fn anxious_wording_needs_context_corroboration() {
        let message = "estou com muita ansiedade hoje";

        let with_context = select_profile(&detector(), message, &anxious_context(), 0);
        assert_eq!(with_context, LlmProfile::CrisisSafe);

        // Same wording without a distressed context stays conversational,
        // but never drops to the cheap tier.
        let without = select_profile(&detector(), message, &TurnContext::default(), 0);
        assert_eq!(without, LlmProfile::ChatDefault);
    }

    #[test]
    fn neutral_context_emotions_do_not_corroborate() {
        let context = TurnContext {
            emotion: Some("hopeful".to_string()),
            ..TurnContext::default()
        };
        let profile = select_profile(&detector(), "estou um pouco ansiosa", &context, 0);
        assert_eq!(profile, LlmProfile::ChatDefault);
    }

    #[test]
    fn tangled_messages_get_the_analysis_profile() {
        let profile = select_profile(
            &detector(),
            "é complicado, são tantas coisas acontecendo ao mesmo tempo",
            &TurnContext::default(),
            0,
        );
        assert_eq!(profile, LlmProfile::AnalysisDeep);
    }

    #[test]
    fn long_messages_get_the_analysis_profile() {
        let message = "hoje foi um dia cheio ".repeat(30);
        assert!(message.chars().count() > 500);
        let profile = select_profile(&detector(), &message, &TurnContext::default(), 0);
        assert_eq!(profile, LlmProfile::AnalysisDeep);
    }

    #[test]
    fn length_rules_count_chars_not_bytes() {
        // 300 chars but 600 bytes; byte counting would wrongly read this as
        // a long message.
        let message = "ã".repeat(300);
        let profile = select_profile(&detector(), &message, &TurnContext::default(), 0);
        assert_eq!(profile, LlmProfile::ChatDefault);
    }

    #[test]
    fn deep_conversations_get_the_analysis_profile() {
        let shallow = select_profile(&detector(), "tudo bem por aí?", &TurnContext::default(), 15);
        assert_eq!(shallow, LlmProfile::ChatCheap);

        let deep = select_profile(&detector(), "tudo bem por aí?", &TurnContext::default(), 16);
        assert_eq!(deep, LlmProfile::AnalysisDeep);
    }

    #[test]
    fn quick_checkins_take_the_cheap_profile() {
        let profile = select_profile(&detector(), "oi, tudo bem?", &TurnContext::default(), 3);
        assert_eq!(profile, LlmProfile::ChatCheap);
    }

    #[test]
    fn midsize_messages_take_the_default_profile() {
        let message = "hoje o bebê dormiu um pouco melhor e consegui descansar, \
                       mas ainda estou me acostumando com a nova rotina da casa toda";
        assert!(message.chars().count() >= 100);
        let profile = select_profile(&detector(), message, &TurnContext::default(), 3);
        assert_eq!(profile, LlmProfile::ChatDefault);
    }

    #[test]
    fn agent_max_is_never_auto_selected() {
        let samples = [
            "oi",
            "eu quero morrer",
            "não aguento mais",
            "é complicado, não sei o que fazer",
            "um relato bem longo sobre o dia ",
        ];
        for message in samples {
            let profile = select_profile(&detector(), message, &anxious_context(), 20);
            assert_ne!(profile, LlmProfile::AgentMax, "{:?}", message);
        }
    }
}
