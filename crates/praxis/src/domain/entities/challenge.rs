//! Challenge - A personalized technical challenge
//!
//! Challenges arrive either from the generation stream (no id yet) or from
//! the REST catalog (persisted, with id and timestamps). Unknown fields are
//! preserved in `extra` so newer backends do not lose data on the way
//! through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::DomainError;
use crate::domain::value_objects::DifficultyLevel;

/// Challenge - one generated task for the user
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Challenge {
    /// Backend identifier (absent while streaming)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::text")]
    pub title: String,
    /// code, daily-task, organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::or_default")]
    pub description: ChallengeDescription,
    #[serde(default, deserialize_with = "crate::domain::lenient::or_default")]
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<ChallengeFs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_code: Option<serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "crate::domain::timestamp::deserialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Statement and evaluation hints of a challenge
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChallengeDescription {
    #[serde(default, deserialize_with = "crate::domain::lenient::text")]
    pub text: String,
    /// codigo, texto_livre, planejamento
    #[serde(rename = "type", default, deserialize_with = "crate::domain::lenient::text")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub eval_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_skill: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub affected_skills: Vec<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub hints: Vec<String>,
    /// Structured context (email, requirements, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enunciado: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Difficulty {
    #[serde(default)]
    pub level: DifficultyLevel,
    /// Minutes
    #[serde(default, deserialize_with = "crate::domain::lenient::minutes")]
    pub time_limit: u32,
}

/// Starter file tree for code challenges
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChallengeFs {
    #[serde(default, deserialize_with = "crate::domain::lenient::strings")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, deserialize_with = "crate::domain::lenient::or_default")]
    pub contents: BTreeMap<String, String>,
}

impl Challenge {
    /// Build a challenge from a streamed `data` payload
    pub fn from_value(value: serde_json::Value) -> Result<Self, DomainError> {
        if !value.is_object() {
            return Err(DomainError::Validation(
                "challenge payload must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| DomainError::Validation(e.to_string()))
    }

    /// Like `from_value`, but never loses a payload the backend streamed.
    ///
    /// When typed parsing fails the title is kept if it is a string and every
    /// field lands in `extra`.
    pub fn from_value_lossy(value: serde_json::Value) -> Self {
        match Self::from_value(value.clone()) {
            Ok(challenge) => challenge,
            Err(e) => {
                tracing::warn!(error = %e, "Challenge payload kept untyped");
                let extra = match value {
                    serde_json::Value::Object(fields) => fields,
                    other => {
                        let mut fields = serde_json::Map::new();
                        fields.insert("data".to_string(), other);
                        fields
                    }
                };
                let title = extra
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default()
                    .to_string();
                Self {
                    title,
                    extra,
                    ..Self::default()
                }
            }
        }
    }

    /// Display label: title, or a placeholder while it is still empty
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_streamed_payload() {
        let challenge = Challenge::from_value(json!({
            "title": "Corrigir validação de email",
            "category": "code",
            "description": {
                "text": "O endpoint de login aceita email sem @",
                "type": "codigo",
                "language": "python",
                "hints": ["Use EmailStr"]
            },
            "difficulty": {"level": "Médio", "time_limit": 45},
            "template_code": [{"id": "aba1"}]
        }))
        .unwrap();

        assert_eq!(challenge.id, None);
        assert_eq!(challenge.description.kind, "codigo");
        assert_eq!(challenge.difficulty.level, DifficultyLevel::Medium);
        assert_eq!(challenge.difficulty.time_limit, 45);
        assert!(challenge.template_code.is_some());
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let challenge = Challenge::from_value(json!({"title": "x", "xp_reward": 30})).unwrap();
        assert_eq!(challenge.extra.get("xp_reward"), Some(&json!(30)));
    }

    #[test]
    fn test_catalog_row_with_naive_timestamp() {
        let challenge = Challenge::from_value(json!({
            "id": 7,
            "profile_id": "u-1",
            "title": "Planejar sprint",
            "category": "organization",
            "created_at": "2025-03-01T10:20:30.123456"
        }))
        .unwrap();

        assert_eq!(challenge.id, Some(7));
        assert!(challenge.created_at.is_some());
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(Challenge::from_value(json!("not a challenge")).is_err());
    }

    #[test]
    fn test_loose_generated_payload() {
        let challenge = Challenge::from_value(json!({
            "title": "Planejar sprint",
            "category": "organization",
            "description": {"text": "Organize as tarefas", "type": "planejamento", "hints": null, "eval_criteria": "Clareza"},
            "difficulty": {"level": null, "time_limit": 30.0},
            "fs": null
        }))
        .unwrap();

        assert_eq!(challenge.difficulty.time_limit, 30);
        assert_eq!(challenge.difficulty.level, DifficultyLevel::Medium);
        assert!(challenge.description.hints.is_empty());
        assert_eq!(challenge.description.eval_criteria, vec!["Clareza".to_string()]);
    }

    #[test]
    fn test_lossy_keeps_unparseable_payload() {
        let challenge = Challenge::from_value_lossy(json!({"title": "Bug", "difficulty": "hard"}));
        assert_eq!(challenge.title, "Bug");
        assert_eq!(challenge.extra.get("difficulty"), Some(&json!("hard")));

        let bare = Challenge::from_value_lossy(json!("texto solto"));
        assert_eq!(bare.display_title(), "(untitled)");
        assert_eq!(bare.extra.get("data"), Some(&json!("texto solto")));
    }
}
