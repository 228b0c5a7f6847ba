//! Acceptance policy for inferred attributes
//!
//! Decides which service answers are trustworthy enough to store.
//! A rejected answer leaves the attribute absent; it is never an error.

use people_common::models::{AGE_MAX, TEXT_MAX_CHARS, TEXT_MIN_CHARS};
use people_common::Gender;

use super::client::{AgeResponse, GenderResponse, NationalityResponse};

/// Default minimum probability for a gender candidate
pub const DEFAULT_GENDER_MIN_PROBABILITY: f64 = 0.70;

/// Accept any age within [0, 130]
pub fn accept_age(response: &AgeResponse) -> Option<u8> {
    response
        .age
        .filter(|age| (0..=i64::from(AGE_MAX)).contains(age))
        .and_then(|age| u8::try_from(age).ok())
}

/// Accept the candidate gender when its probability reaches the threshold (inclusive)
pub fn accept_gender(response: &GenderResponse, min_probability: f64) -> Option<Gender> {
    let probability = response.probability?;
    if probability >= min_probability {
        response.gender
    } else {
        None
    }
}

/// Pick the most probable country code
///
/// No cutoff; ties keep the earliest candidate. Candidates with a NaN
/// probability or a code outside 2..=100 characters are skipped.
pub fn select_nationality(response: &NationalityResponse) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;

    for candidate in &response.country {
        let code_len = candidate.country_id.chars().count();
        if candidate.probability.is_nan() || !(TEXT_MIN_CHARS..=TEXT_MAX_CHARS).contains(&code_len) {
            continue;
        }

        match best {
            Some((_, top)) if candidate.probability <= top => {}
            _ => best = Some((&candidate.country_id, candidate.probability)),
        }
    }

    best.map(|(code, _)| code.to_string())
}
