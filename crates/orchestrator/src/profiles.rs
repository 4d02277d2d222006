//! Routing profiles and their provider fallback chains.

use serde::{Deserialize, Serialize};

/// Every provider chat traffic may be routed to.
pub const KNOWN_PROVIDERS: &[&str] = &["googleai", "openai", "anthropic"];

/// How a conversational turn should be answered.
///
/// A profile names the provider chain for the turn and the register the
/// adapter should configure: safety-tuned, deep, cheap or balanced.
/// `AgentMax` is opt-in only; the router never selects it on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProfile {
    /// Calm, safety-tuned replies for crisis traffic.
    CrisisSafe,
    /// Slower, deeper reflection for tangled situations.
    AnalysisDeep,
    /// Short cheap replies for quick check-ins.
    ChatCheap,
    /// The balanced default.
    ChatDefault,
    /// Highest-capability tier for agentic flows.
    AgentMax,
}

impl LlmProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProfile::CrisisSafe => "crisis-safe",
            LlmProfile::AnalysisDeep => "analysis-deep",
            LlmProfile::ChatCheap => "chat-cheap",
            LlmProfile::ChatDefault => "chat-default",
            LlmProfile::AgentMax => "agent-max",
        }
    }

    /// Provider that answers first for this profile.
    pub fn primary_provider(&self) -> &'static str {
        match self {
            LlmProfile::CrisisSafe => "openai",
            LlmProfile::AgentMax => "anthropic",
            LlmProfile::AnalysisDeep | LlmProfile::ChatCheap | LlmProfile::ChatDefault => {
                "googleai"
            }
        }
    }

    /// Ordered fallback chain for this profile: the primary first, then
    /// every other known provider exactly once.
    pub fn fallback_chain(&self) -> &'static [&'static str] {
        match self.primary_provider() {
            "openai" => &["openai", "googleai", "anthropic"],
            "anthropic" => &["anthropic", "googleai", "openai"],
            _ => &["googleai", "openai", "anthropic"],
        }
    }
}

impl std::fmt::Display for LlmProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PROFILES: [LlmProfile; 5] = [
        LlmProfile::CrisisSafe,
        LlmProfile::AnalysisDeep,
        LlmProfile::ChatCheap,
        LlmProfile::ChatDefault,
        LlmProfile::AgentMax,
    ];

    #[test]
    fn crisis_traffic_leads_with_openai() {
        assert_eq!(LlmProfile::CrisisSafe.primary_provider(), "openai");
        assert_eq!(
            LlmProfile::CrisisSafe.fallback_chain(),
            &["openai", "googleai", "anthropic"]
        );
    }

    #[test]
    fn agent_tier_leads_with_anthropic() {
        assert_eq!(LlmProfile::AgentMax.primary_provider(), "anthropic");
        assert_eq!(
            LlmProfile::AgentMax.fallback_chain(),
            &["anthropic", "googleai", "openai"]
        );
    }

    #[test]
    fn everyday_profiles_lead_with_googleai() {
        for profile in [
            LlmProfile::AnalysisDeep,
            LlmProfile::ChatCheap,
            LlmProfile::ChatDefault,
        ] {
            assert_eq!(profile.primary_provider(), "googleai", "{}", profile);
            assert_eq!(
                profile.fallback_chain(),
                &["googleai", "openai", "anthropic"]
            );
        }
    }

    #[test]
    fn every_chain_is_a_permutation_of_the_known_providers() {
        let mut known: Vec<&str> = KNOWN_PROVIDERS.to_vec();
        known.sort_unstable();

        for profile in ALL_PROFILES {
            let chain = profile.fallback_chain();
            assert_eq!(chain[0], profile.primary_provider(), "{}", profile);

            let mut sorted: Vec<&str> = chain.to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, known, "{} chain must cover every provider once", profile);
        }
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for profile in ALL_PROFILES {
            let json = serde_json::to_string(&profile).unwrap();
            assert_eq!(json, format!("\"{}\"", profile.as_str()));
            let back: LlmProfile = serde_json::from_str(&json).unwrap();
            assert_eq!(back, profile);
        }
    }
}
