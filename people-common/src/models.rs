//! Person domain models
//!
//! A `Person` is what a caller submits. Enrichment adds an `EnrichmentResult`,
//! and storage assigns the identifier that turns it into a `FullPerson`.
//! Every inferred attribute is an `Option`: absence means no service produced
//! an acceptable value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Minimum length (in characters) of name, surname, patronymic and nationality
pub const TEXT_MIN_CHARS: usize = 2;

/// Maximum length (in characters) of name, surname, patronymic and nationality
pub const TEXT_MAX_CHARS: usize = 100;

/// Inclusive upper bound for an age
pub const AGE_MAX: u8 = 130;

/// Gender inferred for a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Storage and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Person as submitted for creation (already validated)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Person {
    #[schema(example = "Dmitriy")]
    pub name: String,
    #[schema(example = "Ushakov")]
    pub surname: String,
    #[schema(example = "Vasilevich")]
    pub patronymic: Option<String>,
}

/// Attributes inferred by the external services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnrichmentResult {
    #[schema(example = 42)]
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    /// ISO country code
    #[schema(example = "RU")]
    pub nationality: Option<String>,
}

impl EnrichmentResult {
    /// Number of attributes that were accepted
    pub fn accepted_count(&self) -> usize {
        usize::from(self.age.is_some())
            + usize::from(self.gender.is_some())
            + usize::from(self.nationality.is_some())
    }
}

/// Person plus enrichment, ready to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnrichedPerson {
    #[serde(flatten)]
    pub person: Person,
    #[serde(flatten)]
    pub enrichment: EnrichmentResult,
}

impl EnrichedPerson {
    pub fn new(person: Person, enrichment: EnrichmentResult) -> Self {
        Self { person, enrichment }
    }
}

/// Persisted person with its storage-assigned identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FullPerson {
    pub id: i64,
    #[serde(flatten)]
    pub enriched: EnrichedPerson,
}

/// Sparse patch applied to a stored person
///
/// `None` means "leave unchanged". Clearing a value is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub nationality: Option<String>,
}

impl PersonUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.patronymic.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.nationality.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gender_round_trips_through_str() {
        assert_eq!("male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
        assert!("unknown".parse::<Gender>().is_err());
        assert_eq!(Gender::Female.to_string(), "female");
    }

    #[test]
    fn test_full_person_serializes_flat() {
        let person = FullPerson {
            id: 7,
            enriched: EnrichedPerson::new(
                Person {
                    name: "Dmitriy".to_string(),
                    surname: "Ushakov".to_string(),
                    patronymic: None,
                },
                EnrichmentResult {
                    age: Some(42),
                    gender: Some(Gender::Male),
                    nationality: None,
                },
            ),
        };

        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "name": "Dmitriy",
                "surname": "Ushakov",
                "patronymic": null,
                "age": 42,
                "gender": "male",
                "nationality": null
            })
        );
    }

    #[test]
    fn test_update_emptiness() {
        assert!(PersonUpdate::default().is_empty());
        let update = PersonUpdate {
            age: Some(30),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_accepted_count() {
        let mut result = EnrichmentResult::default();
        assert_eq!(result.accepted_count(), 0);
        result.nationality = Some("RU".to_string());
        result.age = Some(0);
        assert_eq!(result.accepted_count(), 2);
    }
}
