//! ResumeAnalysis - AI report for a résumé
//!
//! Field names follow the backend's payload (Portuguese) so the same struct
//! serves the stream's `complete` record and the stored `full_report`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResumeAnalysis {
    #[serde(default, deserialize_with = "crate::domain::lenient::text")]
    pub resumo_executivo: String,
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub pontos_fortes: Vec<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub gaps_tecnicos: Vec<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub sugestoes_melhoria: Vec<String>,
    /// Overall score, 0-100
    #[serde(default, deserialize_with = "score")]
    pub nota_geral: u8,
    /// Skill name -> 0-100
    #[serde(default, deserialize_with = "crate::domain::lenient::or_default")]
    pub habilidades_evidenciadas: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResumeAnalysis {
    pub fn from_value(value: serde_json::Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::Validation(
                "analysis payload must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| DomainError::Validation(e.to_string()))
    }

    /// Skills sorted by evidence, strongest first
    pub fn top_skills(&self, limit: usize) -> Vec<(&str, f64)> {
        let mut skills: Vec<(&str, f64)> = self
            .habilidades_evidenciadas
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();
        skills.sort_by(|a, b| b.1.total_cmp(&a.1));
        skills.truncate(limit);
        skills
    }
}

// The model sometimes answers 72.5 or "72"; clamp everything into 0-100.
fn score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let raw = crate::domain::lenient::number(&value).unwrap_or_default();
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_complete_analysis() {
        let analysis = ResumeAnalysis::from_value(json!({
            "resumo_executivo": "O candidato tem experiência",
            "pontos_fortes": ["Python", "SQL"],
            "gaps_tecnicos": ["Docker"],
            "sugestoes_melhoria": ["Adicionar projetos"],
            "nota_geral": 72,
            "habilidades_evidenciadas": {"Python": 80, "SQL": 65, "React": 90}
        }))
        .unwrap();

        assert_eq!(analysis.nota_geral, 72);
        assert_eq!(analysis.pontos_fortes.len(), 2);
        assert_eq!(analysis.top_skills(2), vec![("React", 90.0), ("Python", 80.0)]);
    }

    #[test]
    fn test_score_is_clamped() {
        let analysis = ResumeAnalysis::from_value(json!({"nota_geral": 140})).unwrap();
        assert_eq!(analysis.nota_geral, 100);

        let analysis = ResumeAnalysis::from_value(json!({"nota_geral": "71.6"})).unwrap();
        assert_eq!(analysis.nota_geral, 72);
    }

    #[test]
    fn test_null_sections_read_as_empty() {
        let analysis = ResumeAnalysis::from_value(json!({
            "resumo_executivo": null,
            "gaps_tecnicos": null,
            "habilidades_evidenciadas": null,
            "nota_geral": 55
        }))
        .unwrap();

        assert!(analysis.resumo_executivo.is_empty());
        assert!(analysis.gaps_tecnicos.is_empty());
        assert!(analysis.top_skills(3).is_empty());
    }
}
