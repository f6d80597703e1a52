//! DifficultyLevel - Normalized challenge difficulty

use serde::{Deserialize, Deserializer, Serialize};

/// Challenge difficulty, normalized from Portuguese or English labels
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DifficultyLevel::Easy => write!(f, "easy"),
            DifficultyLevel::Medium => write!(f, "medium"),
            DifficultyLevel::Hard => write!(f, "hard"),
        }
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "fácil" | "facil" => Ok(DifficultyLevel::Easy),
            "medium" | "médio" | "medio" => Ok(DifficultyLevel::Medium),
            "hard" | "difícil" | "dificil" => Ok(DifficultyLevel::Hard),
            _ => Err(format!("Unknown difficulty level: {}", s)),
        }
    }
}

// Lenient: an unrecognized label falls back to the default instead of
// failing the whole challenge.
impl<'de> Deserialize<'de> for DifficultyLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|r| r.parse().ok()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_portuguese_labels() {
        assert_eq!("Fácil".parse::<DifficultyLevel>(), Ok(DifficultyLevel::Easy));
        assert_eq!("médio".parse::<DifficultyLevel>(), Ok(DifficultyLevel::Medium));
        assert_eq!("DIFICIL".parse::<DifficultyLevel>(), Ok(DifficultyLevel::Hard));
    }

    #[test]
    fn test_unknown_label_deserializes_to_default() {
        let level: DifficultyLevel = serde_json::from_str("\"extremo\"").unwrap();
        assert_eq!(level, DifficultyLevel::Medium);
    }
}
