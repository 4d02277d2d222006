//! Keyword families, severities and safety texts.
//!
//! Matching is lowercase substring matching. Accented and unaccented
//! spellings are both listed because users type both.

use serde::{Deserialize, Serialize};

/// Severity lattice for moderation verdicts.
///
/// Totally ordered; combining verdicts takes the maximum. `Blocked` is the
/// only tier that suppresses a reply. No built-in family maps to it today,
/// but the tier stays: `should_block` and the blocked rendering path are part
/// of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationSeverity {
    Safe,
    Warning,
    Critical,
    Blocked,
}

impl ModerationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationSeverity::Safe => "safe",
            ModerationSeverity::Warning => "warning",
            ModerationSeverity::Critical => "critical",
            ModerationSeverity::Blocked => "blocked",
        }
    }
}

/// What a keyword family is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationCategory {
    CrisisMentalHealth,
    SelfHarmRisk,
    ViolenceRisk,
    MedicationAdvice,
    DiagnosisRequest,
    MedicalEmergency,
}

impl ModerationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationCategory::CrisisMentalHealth => "crisis_mental_health",
            ModerationCategory::SelfHarmRisk => "self_harm_risk",
            ModerationCategory::ViolenceRisk => "violence_risk",
            ModerationCategory::MedicationAdvice => "medication_advice",
            ModerationCategory::DiagnosisRequest => "diagnosis_request",
            ModerationCategory::MedicalEmergency => "medical_emergency",
        }
    }
}

/// One keyword family with its verdict.
pub(crate) struct PatternFamily {
    pub category: ModerationCategory,
    pub severity: ModerationSeverity,
    pub keywords: &'static [&'static str],
}

/// All built-in families.
///
/// Ambiguous distress idioms ("não aguento mais", "quero sumir") are
/// deliberately absent here; they live in the contextual phrase table where
/// they map to severe instead of critical.
pub(crate) const PATTERN_FAMILIES: &[PatternFamily] = &[
    PatternFamily {
        category: ModerationCategory::CrisisMentalHealth,
        severity: ModerationSeverity::Critical,
        keywords: &[
            "quero morrer",
            "vou me matar",
            "me matar",
            "suicídio",
            "suicidio",
            "acabar com tudo",
            "melhor morta",
            "sem saída",
            "sem saida",
        ],
    },
    PatternFamily {
        category: ModerationCategory::SelfHarmRisk,
        severity: ModerationSeverity::Critical,
        keywords: &[
            "me machucar",
            "me cortar",
            "me ferir",
            "automutilação",
            "automutilacao",
            "me punir",
        ],
    },
    PatternFamily {
        category: ModerationCategory::ViolenceRisk,
        severity: ModerationSeverity::Critical,
        keywords: &[
            "machucar o bebê",
            "machucar o bebe",
            "machucar meu filho",
            "fazer mal ao bebê",
            "fazer mal ao bebe",
            "jogar o bebê",
            "jogar o bebe",
        ],
    },
    PatternFamily {
        category: ModerationCategory::MedicationAdvice,
        severity: ModerationSeverity::Warning,
        keywords: &[
            "medicamento",
            "remédio",
            "remedio",
            "dosagem",
            "antidepressivo",
            "ansiolítico",
            "ansiolitico",
            "sertralina",
            "fluoxetina",
            "clonazepam",
            "rivotril",
        ],
    },
    PatternFamily {
        category: ModerationCategory::DiagnosisRequest,
        severity: ModerationSeverity::Warning,
        keywords: &[
            "tenho depressão",
            "tenho depressao",
            "estou com depressão",
            "estou com depressao",
            "é depressão",
            "diagnóstico",
            "diagnostico",
            "que doença",
            "que doenca",
        ],
    },
    PatternFamily {
        category: ModerationCategory::MedicalEmergency,
        severity: ModerationSeverity::Critical,
        keywords: &[
            "sangramento forte",
            "sangrando muito",
            "dor no peito forte",
            "desmaiei",
            "convulsão",
            "convulsao",
            "febre muito alta",
        ],
    },
];

pub(crate) fn category_severity(category: ModerationCategory) -> ModerationSeverity {
    PATTERN_FAMILIES
        .iter()
        .find(|family| family.category == category)
        .map(|family| family.severity)
        .unwrap_or(ModerationSeverity::Safe)
}

pub(crate) fn disclaimer_for(category: ModerationCategory) -> &'static str {
    match category {
        ModerationCategory::CrisisMentalHealth => {
            "🆘 Se você está pensando em se machucar, procure ajuda agora: \
             CVV 188 (ligação gratuita, 24h) ou chat em cvv.org.br. \
             Em emergência, ligue SAMU 192. Você não está sozinha."
        }
        ModerationCategory::SelfHarmRisk => {
            "🆘 Machucar a si mesma não é o único caminho para essa dor. \
             Ligue CVV 188 (24h) para conversar agora, ou procure o CAPS \
             mais próximo. Você merece cuidado."
        }
        ModerationCategory::ViolenceRisk => {
            "⚠️ Se você teme fazer mal a si ou ao bebê, procure ajuda \
             imediatamente: ligue SAMU 192 ou vá ao pronto-socorro. \
             O Ligue 180 oferece apoio à mulher, 24h."
        }
        ModerationCategory::MedicationAdvice => {
            "⚠️ Não inicie, altere ou interrompa medicamentos sem orientação \
             profissional. Converse com seu médico ou farmacêutico antes de \
             qualquer mudança."
        }
        ModerationCategory::DiagnosisRequest => {
            "⚠️ Apenas um profissional de saúde pode avaliar e diagnosticar. \
             Procure seu médico ou uma unidade de saúde para uma avaliação \
             adequada."
        }
        ModerationCategory::MedicalEmergency => {
            "🆘 Sintomas como esses pedem avaliação urgente: ligue SAMU 192 \
             ou vá ao pronto-socorro mais próximo agora."
        }
    }
}

/// Substitute text used when a reply is blocked outright.
pub(crate) const BLOCKED_MESSAGE: &str =
    "Não posso responder a isso agora, mas quero que você receba apoio de \
     verdade. Ligue CVV 188 (24h, gratuito) ou, em emergência, SAMU 192. \
     Estou aqui para continuar conversando sobre como você se sente.";

/// Hotline strings attached to critical detections.
pub const RESOURCE_CVV: &str = "CVV 188";
pub const RESOURCE_SAMU: &str = "SAMU 192";
pub const RESOURCE_CAPS: &str = "CAPS mais próximo";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_is_a_lattice() {
        assert!(ModerationSeverity::Safe < ModerationSeverity::Warning);
        assert!(ModerationSeverity::Warning < ModerationSeverity::Critical);
        assert!(ModerationSeverity::Critical < ModerationSeverity::Blocked);
        assert_eq!(
            ModerationSeverity::Warning.max(ModerationSeverity::Critical),
            ModerationSeverity::Critical
        );
    }

    #[test]
    fn every_category_has_a_family_and_a_disclaimer() {
        for family in PATTERN_FAMILIES {
            assert!(!family.keywords.is_empty());
            assert!(!disclaimer_for(family.category).is_empty());
            assert_eq!(category_severity(family.category), family.severity);
        }
    }

    #[test]
    fn keywords_are_lowercase() {
        for family in PATTERN_FAMILIES {
            for keyword in family.keywords {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }
}
