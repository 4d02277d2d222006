//! Response moderation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::patterns::{
    category_severity, disclaimer_for, ModerationCategory, ModerationSeverity, BLOCKED_MESSAGE,
    PATTERN_FAMILIES,
};

/// Moderation verdict for one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResult {
    pub severity: ModerationSeverity,
    pub categories: Vec<ModerationCategory>,
    pub should_block: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    pub reasoning: String,
}

impl ModerationResult {
    /// Verdict for text with no sensitive matches.
    pub fn safe() -> Self {
        ModerationResult {
            severity: ModerationSeverity::Safe,
            categories: Vec::new(),
            should_block: false,
            disclaimer: None,
            reasoning: "nenhum padrão sensível encontrado".to_string(),
        }
    }
}

/// A reply after moderation was applied to it.
#[derive(Debug, Clone)]
pub struct ModeratedReply {
    pub text: String,
    pub result: ModerationResult,
}

/// Result of the literal crisis keyword scan.
#[derive(Debug, Clone)]
pub struct KeywordScan {
    pub is_crisis: bool,
    pub categories: Vec<ModerationCategory>,
}

/// Scans replies and user messages against the keyword families.
///
/// The engine never blocks the conversation on its own judgement short of a
/// `Blocked` verdict; everything below that attaches a disclaimer and lets
/// the reply through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModerationEngine;

impl ModerationEngine {
    pub fn new() -> Self {
        ModerationEngine
    }

    /// Moderate an exchange. Both the candidate reply and the user message
    /// are scanned; the combined severity is the maximum found anywhere.
    pub fn moderate_response(&self, ai_response: &str, user_message: &str) -> ModerationResult {
        let mut severity = ModerationSeverity::Safe;
        let mut categories: Vec<ModerationCategory> = Vec::new();

        for text in [ai_response, user_message] {
            let lowered = text.to_lowercase();
            for family in PATTERN_FAMILIES {
                if family.keywords.iter().any(|k| lowered.contains(k)) {
                    severity = severity.max(family.severity);
                    if !categories.contains(&family.category) {
                        categories.push(family.category);
                    }
                }
            }
        }

        if categories.is_empty() {
            return ModerationResult::safe();
        }

        let reasoning = format!(
            "categorias detectadas: {}",
            categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if severity >= ModerationSeverity::Critical {
            warn!("moderation flagged exchange as {}: {}", severity.as_str(), reasoning);
        }

        ModerationResult {
            severity,
            should_block: severity == ModerationSeverity::Blocked,
            disclaimer: self.disclaimer(&categories),
            categories,
            reasoning,
        }
    }

    /// Run moderation and produce the final outgoing text.
    pub fn apply_moderation(&self, ai_response: &str, user_message: &str) -> ModeratedReply {
        let result = self.moderate_response(ai_response, user_message);
        let text = self.render(ai_response, &result);
        ModeratedReply { text, result }
    }

    /// Render a reply under a verdict. A blocked verdict substitutes the
    /// safe message; otherwise any disclaimer is prepended above the reply.
    pub fn render(&self, ai_response: &str, result: &ModerationResult) -> String {
        if result.should_block {
            warn!("reply blocked by moderation: {}", result.reasoning);
            return BLOCKED_MESSAGE.to_string();
        }
        match &result.disclaimer {
            Some(disclaimer) => format!("{}\n\n{}", disclaimer, ai_response),
            None => ai_response.to_string(),
        }
    }

    /// Stage-one crisis scan over a user message: critical families only,
    /// so medication or diagnosis chatter never reads as a crisis.
    pub fn detect_crisis_keywords(&self, user_message: &str) -> KeywordScan {
        let lowered = user_message.to_lowercase();
        let mut categories = Vec::new();
        for family in PATTERN_FAMILIES {
            if family.severity >= ModerationSeverity::Critical
                && family.keywords.iter().any(|k| lowered.contains(k))
            {
                categories.push(family.category);
            }
        }
        KeywordScan {
            is_crisis: !categories.is_empty(),
            categories,
        }
    }

    /// A single critical disclaimer outranks stacked warnings; warning
    /// categories stack in detection order.
    fn disclaimer(&self, categories: &[ModerationCategory]) -> Option<String> {
        if categories.is_empty() {
            return None;
        }
        if let Some(critical) = categories
            .iter()
            .find(|c| category_severity(**c) >= ModerationSeverity::Critical)
        {
            return Some(disclaimer_for(*critical).to_string());
        }
        let stacked: Vec<&str> = categories.iter().map(|c| disclaimer_for(*c)).collect();
        Some(stacked.join("\n\n"))
    }
}
