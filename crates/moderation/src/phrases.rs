//! Contextual crisis phrases.
//!
//! Distress idioms that evade literal keyword matching ("não aguento mais"
//! carries no death word) get regex patterns here. Patterns are
//! case-insensitive and accent-robust, and map to a level below the literal
//! keyword tier so ambiguity is never treated as certainty.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::crisis::{CrisisLevel, CrisisType};

/// A compiled phrase with its verdict.
pub struct ContextualPhrase {
    pub regex: Regex,
    pub level: CrisisLevel,
    pub crisis_type: CrisisType,
}

// Patterns are curated literals; a malformed one is a programmer error
// caught by the compile test below.
fn phrase(pattern: &str, level: CrisisLevel, crisis_type: CrisisType) -> ContextualPhrase {
    ContextualPhrase {
        regex: Regex::new(&format!("(?i){}", pattern)).expect("valid contextual pattern"),
        level,
        crisis_type,
    }
}

pub static CONTEXTUAL_PHRASES: Lazy<Vec<ContextualPhrase>> = Lazy::new(|| {
    vec![
        phrase(r"n[aã]o\s+aguento\s+mais", CrisisLevel::Severe, CrisisType::Overwhelm),
        phrase(r"quero\s+sumir", CrisisLevel::Severe, CrisisType::SuicidalIdeation),
        phrase(
            r"quero\s+desaparecer",
            CrisisLevel::Severe,
            CrisisType::SuicidalIdeation,
        ),
        phrase(
            r"seria\s+melhor\s+sem\s+mim",
            CrisisLevel::Critical,
            CrisisType::SuicidalIdeation,
        ),
        phrase(
            r"(sou|seria)\s+um\s+fardo",
            CrisisLevel::Critical,
            CrisisType::SuicidalIdeation,
        ),
        phrase(
            r"me\s+arrependo\s+de\s+ter\s+(o\s+)?beb[eê]",
            CrisisLevel::Severe,
            CrisisType::PostpartumCrisis,
        ),
        phrase(
            r"n[aã]o\s+amo\s+(o\s+)?meu\s+beb[eê]",
            CrisisLevel::Severe,
            CrisisType::PostpartumCrisis,
        ),
        phrase(
            r"odeio\s+(o\s+)?meu\s+beb[eê]",
            CrisisLevel::Critical,
            CrisisType::PostpartumCrisis,
        ),
        phrase(
            r"n[aã]o\s+consigo\s+respirar",
            CrisisLevel::Moderate,
            CrisisType::Panic,
        ),
        phrase(
            r"cora[cç][aã]o\s+disparado",
            CrisisLevel::Moderate,
            CrisisType::Panic,
        ),
        phrase(
            r"ataque\s+de\s+p[aâ]nico",
            CrisisLevel::Moderate,
            CrisisType::Panic,
        ),
        phrase(
            r"n[aã]o\s+consigo\s+mais",
            CrisisLevel::Moderate,
            CrisisType::Overwhelm,
        ),
        phrase(
            r"tudo\s+est[aá]\s+desmoronando",
            CrisisLevel::Moderate,
            CrisisType::Overwhelm,
        ),
    ]
});

/// Outcome of scanning a message against the phrase table.
#[derive(Debug, Clone)]
pub struct ContextualScan {
    pub detected: bool,
    /// Highest level among the matches.
    pub level: CrisisLevel,
    pub crisis_types: Vec<CrisisType>,
    /// The matched text, for reasoning strings.
    pub matched: Vec<String>,
}

pub(crate) fn scan_contextual(message: &str) -> ContextualScan {
    let mut level = CrisisLevel::None;
    let mut crisis_types = Vec::new();
    let mut matched = Vec::new();

    for phrase in CONTEXTUAL_PHRASES.iter() {
        if let Some(found) = phrase.regex.find(message) {
            level = level.max(phrase.level);
            if !crisis_types.contains(&phrase.crisis_type) {
                crisis_types.push(phrase.crisis_type);
            }
            matched.push(found.as_str().to_string());
        }
    }

    ContextualScan {
        detected: level > CrisisLevel::None,
        level,
        crisis_types,
        matched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        assert!(CONTEXTUAL_PHRASES.len() >= 10);
    }

    #[test]
    fn overwhelm_idiom_is_severe_with_or_without_accents() {
        for message in ["não aguento mais nada disso", "nao aguento mais"] {
            let scan = scan_contextual(message);
            assert!(scan.detected, "no match in {:?}", message);
            assert_eq!(scan.level, CrisisLevel::Severe);
            assert_eq!(scan.crisis_types, vec![CrisisType::Overwhelm]);
        }
    }

    #[test]
    fn disappearing_wish_is_severe_suicidal_ideation() {
        let scan = scan_contextual("às vezes eu Quero Sumir de tudo");
        assert!(scan.detected);
        assert_eq!(scan.level, CrisisLevel::Severe);
        assert_eq!(scan.crisis_types, vec![CrisisType::SuicidalIdeation]);
    }

    #[test]
    fn burden_talk_is_critical() {
        let scan = scan_contextual("todo mundo seria melhor sem mim");
        assert_eq!(scan.level, CrisisLevel::Critical);
    }

    #[test]
    fn panic_symptoms_are_moderate() {
        let scan = scan_contextual("meu coração disparado, não consigo respirar");
        assert_eq!(scan.level, CrisisLevel::Moderate);
        assert_eq!(scan.crisis_types, vec![CrisisType::Panic]);
        assert_eq!(scan.matched.len(), 2);
    }

    #[test]
    fn highest_level_wins_across_matches() {
        let scan = scan_contextual("não consigo respirar, acho que seria melhor sem mim");
        assert_eq!(scan.level, CrisisLevel::Critical);
        assert!(scan.crisis_types.contains(&CrisisType::Panic));
        assert!(scan.crisis_types.contains(&CrisisType::SuicidalIdeation));
    }

    #[test]
    fn neutral_text_does_not_match() {
        let scan = scan_contextual("hoje o bebê dormiu a tarde toda");
        assert!(!scan.detected);
        assert_eq!(scan.level, CrisisLevel::None);
    }
}
