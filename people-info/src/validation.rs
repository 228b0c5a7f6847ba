//! Request validation
//!
//! Decodes create/update bodies and list query parameters into domain values.
//! Every field is checked before anything is returned, and all field problems
//! are reported together; a payload is never partially applied.

use people_common::models::{AGE_MAX, TEXT_MAX_CHARS, TEXT_MIN_CHARS};
use people_common::{Gender, Person, PersonUpdate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::fmt;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::query::PersonFilter;

/// Rejected request input
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("empty request")]
    EmptyBody,

    #[error("malformed request body: {0}")]
    MalformedJson(String),

    #[error("no fields to update")]
    EmptyUpdate,

    #[error("invalid query parameters: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    Fields(FieldErrors),
}

/// Collected field → reason pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.0.push((field, reason.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(field, _)| *field)
    }

    fn check(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, reason)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, reason)?;
        }
        Ok(())
    }
}

/// POST /api/v1/persons body
///
/// `name` and `surname` are required; every text field is 2-100 characters.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePersonRequest {
    #[schema(example = "Dmitriy")]
    pub name: Option<String>,
    #[schema(example = "Ushakov")]
    pub surname: Option<String>,
    #[schema(example = "Vasilevich")]
    pub patronymic: Option<String>,
}

impl CreatePersonRequest {
    pub fn validate(self) -> Result<Person, ValidationError> {
        let mut errors = FieldErrors::default();

        let name = required_text(&mut errors, "name", self.name);
        let surname = required_text(&mut errors, "surname", self.surname);
        if let Some(patronymic) = &self.patronymic {
            check_text(&mut errors, "patronymic", patronymic);
        }

        match (name, surname) {
            (Some(name), Some(surname)) if errors.is_empty() => Ok(Person {
                name,
                surname,
                patronymic: self.patronymic,
            }),
            _ => Err(ValidationError::Fields(errors)),
        }
    }
}

/// PATCH /api/v1/persons/{id} body
///
/// Outer `None` = field omitted, `Some(None)` = explicit null.
/// At least one field is required and `null` is rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdatePersonRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Dmitriy")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub surname: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub patronymic: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i64>, minimum = 0, maximum = 130, example = 43)]
    pub age: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Gender>)]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "UA")]
    pub nationality: Option<Option<String>>,
}

impl UpdatePersonRequest {
    pub fn validate(self) -> Result<PersonUpdate, ValidationError> {
        let mut errors = FieldErrors::default();

        let update = PersonUpdate {
            name: optional_text(&mut errors, "name", self.name),
            surname: optional_text(&mut errors, "surname", self.surname),
            patronymic: optional_text(&mut errors, "patronymic", self.patronymic),
            age: not_null(&mut errors, "age", self.age).and_then(|age| check_age(&mut errors, "age", age)),
            gender: not_null(&mut errors, "gender", self.gender)
                .and_then(|gender| check_gender(&mut errors, &gender)),
            nationality: optional_text(&mut errors, "nationality", self.nationality),
        };

        errors.check()?;
        if update.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(update)
    }
}

/// GET /api/v1/persons query string
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct PersonFilterParams {
    /// Exact given name
    pub name: Option<String>,
    /// Exact surname
    pub surname: Option<String>,
    /// Exact patronymic
    pub patronymic: Option<String>,
    /// `male` or `female`
    #[param(value_type = Option<Gender>)]
    pub gender: Option<String>,
    /// Exact country code
    pub nationality: Option<String>,
    /// Inclusive lower age bound
    pub age_min: Option<i64>,
    /// Inclusive upper age bound
    pub age_max: Option<i64>,
    /// Page size (default 5)
    pub limit: Option<u64>,
    /// Records to skip (default 0)
    pub offset: Option<u64>,
}

impl PersonFilterParams {
    pub fn validate(self, max_limit: u64) -> Result<PersonFilter, ValidationError> {
        let mut errors = FieldErrors::default();

        let gender = self
            .gender
            .and_then(|gender| check_gender(&mut errors, &gender));
        let age_min = self
            .age_min
            .and_then(|age| check_age(&mut errors, "age_min", age));
        let age_max = self
            .age_max
            .and_then(|age| check_age(&mut errors, "age_max", age));
        if let (Some(min), Some(max)) = (age_min, age_max) {
            if min > max {
                errors.push("age_min", "must not exceed age_max");
            }
        }
        if let Some(limit) = self.limit {
            if limit == 0 || limit > max_limit {
                errors.push("limit", format!("must be between 1 and {}", max_limit));
            }
        }

        errors.check()?;
        Ok(PersonFilter {
            name: self.name,
            surname: self.surname,
            patronymic: self.patronymic,
            gender,
            nationality: self.nationality,
            age_min,
            age_max,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Decode a JSON body; a blank body is reported separately from bad JSON
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::EmptyBody);
    }
    serde_json::from_slice(body).map_err(|e| ValidationError::MalformedJson(e.to_string()))
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_text(errors: &mut FieldErrors, field: &'static str, value: &str) -> bool {
    let len = value.chars().count();
    let ok = (TEXT_MIN_CHARS..=TEXT_MAX_CHARS).contains(&len);
    if !ok {
        errors.push(
            field,
            format!("must be {}-{} characters", TEXT_MIN_CHARS, TEXT_MAX_CHARS),
        );
    }
    ok
}

fn required_text(errors: &mut FieldErrors, field: &'static str, value: Option<String>) -> Option<String> {
    match value {
        Some(value) => check_text(errors, field, &value).then_some(value),
        None => {
            errors.push(field, "is required");
            None
        }
    }
}

fn not_null<T>(errors: &mut FieldErrors, field: &'static str, value: Option<Option<T>>) -> Option<T> {
    match value {
        Some(None) => {
            errors.push(field, "must not be null");
            None
        }
        Some(Some(value)) => Some(value),
        None => None,
    }
}

fn optional_text(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<Option<String>>,
) -> Option<String> {
    not_null(errors, field, value).filter(|text| check_text(errors, field, text))
}

fn check_age(errors: &mut FieldErrors, field: &'static str, age: i64) -> Option<u8> {
    let accepted = u8::try_from(age).ok().filter(|age| *age <= AGE_MAX);
    if accepted.is_none() {
        errors.push(field, format!("must be between 0 and {}", AGE_MAX));
    }
    accepted
}

fn check_gender(errors: &mut FieldErrors, value: &str) -> Option<Gender> {
    match value.parse() {
        Ok(gender) => Some(gender),
        Err(_) => {
            errors.push("gender", "must be 'male' or 'female'");
            None
        }
    }
}
