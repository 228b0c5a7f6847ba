//! Person enrichment
//!
//! Fans a person's given name out to the age, gender and nationality services
//! concurrently, applies the acceptance policy to each answer, and merges the
//! accepted values into one `EnrichmentResult`.
//!
//! # Failure isolation
//! Every branch runs on its own task with its own deadline. A branch that
//! errors, times out or panics leaves only its attribute absent; the other
//! branches and the overall call are unaffected. Nothing is retried.
//!
//! # Cancellation
//! Branch tasks live in a `JoinSet` owned by the call. Dropping the
//! `enrich` future (e.g. client disconnect) drops the set and aborts every
//! in-flight lookup.

pub mod client;
pub mod policy;

pub use client::{
    AgeResponse, AttributeClient, AttributeError, CountryCandidate, GenderResponse,
    HttpAttributeClient, NationalityResponse,
};

use people_common::config::EnrichmentConfig;
use people_common::{EnrichmentResult, Gender, Person};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Default per-call deadline
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Value produced by one enrichment branch
#[derive(Debug, Clone, PartialEq)]
enum AttributeValue {
    Age(Option<u8>),
    Gender(Option<Gender>),
    Nationality(Option<String>),
}

/// Concurrent enrichment over three attribute clients
pub struct EnrichmentOrchestrator {
    age: Arc<dyn AttributeClient<Response = AgeResponse>>,
    gender: Arc<dyn AttributeClient<Response = GenderResponse>>,
    nationality: Arc<dyn AttributeClient<Response = NationalityResponse>>,
    gender_min_probability: f64,
    call_timeout: Duration,
}

impl EnrichmentOrchestrator {
    pub fn new(
        age: Arc<dyn AttributeClient<Response = AgeResponse>>,
        gender: Arc<dyn AttributeClient<Response = GenderResponse>>,
        nationality: Arc<dyn AttributeClient<Response = NationalityResponse>>,
    ) -> Self {
        Self {
            age,
            gender,
            nationality,
            gender_min_probability: policy::DEFAULT_GENDER_MIN_PROBABILITY,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Build HTTP clients for the configured endpoints
    pub fn from_config(config: &EnrichmentConfig) -> Result<Self, AttributeError> {
        let timeout = config.call_timeout();
        let age = HttpAttributeClient::<AgeResponse>::new("age", &config.age_url, timeout)?;
        let gender =
            HttpAttributeClient::<GenderResponse>::new("gender", &config.gender_url, timeout)?;
        let nationality = HttpAttributeClient::<NationalityResponse>::new(
            "nationality",
            &config.nationality_url,
            timeout,
        )?;

        Ok(Self::new(Arc::new(age), Arc::new(gender), Arc::new(nationality))
            .with_gender_min_probability(config.gender_min_probability)
            .with_call_timeout(timeout))
    }

    pub fn with_gender_min_probability(mut self, min_probability: f64) -> Self {
        self.gender_min_probability = min_probability;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Infer age, gender and nationality for `person`
    ///
    /// Only the given name is sent out. Returns once every branch has
    /// completed or failed; never returns an error.
    pub async fn enrich(&self, person: &Person) -> EnrichmentResult {
        let given_name: Arc<str> = Arc::from(person.name.as_str());
        let mut branches = JoinSet::new();

        spawn_branch(
            &mut branches,
            Arc::clone(&self.age),
            Arc::clone(&given_name),
            self.call_timeout,
            AttributeValue::Age(None),
            |response| AttributeValue::Age(policy::accept_age(&response)),
        );

        let min_probability = self.gender_min_probability;
        spawn_branch(
            &mut branches,
            Arc::clone(&self.gender),
            Arc::clone(&given_name),
            self.call_timeout,
            AttributeValue::Gender(None),
            move |response| AttributeValue::Gender(policy::accept_gender(&response, min_probability)),
        );

        spawn_branch(
            &mut branches,
            Arc::clone(&self.nationality),
            given_name,
            self.call_timeout,
            AttributeValue::Nationality(None),
            |response| AttributeValue::Nationality(policy::select_nationality(&response)),
        );

        let mut result = EnrichmentResult::default();
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok(AttributeValue::Age(age)) => result.age = age,
                Ok(AttributeValue::Gender(gender)) => result.gender = gender,
                Ok(AttributeValue::Nationality(nationality)) => result.nationality = nationality,
                Err(e) => warn!(error = %e, "Enrichment branch aborted"),
            }
        }

        debug!(
            accepted = result.accepted_count(),
            age = ?result.age,
            gender = ?result.gender,
            nationality = ?result.nationality,
            "Enrichment complete"
        );
        result
    }
}

/// Spawn one lookup; failures and timeouts resolve to `absent`
fn spawn_branch<R, F>(
    branches: &mut JoinSet<AttributeValue>,
    client: Arc<dyn AttributeClient<Response = R>>,
    given_name: Arc<str>,
    deadline: Duration,
    absent: AttributeValue,
    accept: F,
) where
    R: Send + 'static,
    F: FnOnce(R) -> AttributeValue + Send + 'static,
{
    branches.spawn(async move {
        let attribute = client.attribute();
        match tokio::time::timeout(deadline, client.fetch(&given_name)).await {
            Ok(Ok(response)) => {
                let value = accept(response);
                if value == absent {
                    debug!(attribute, "No acceptable value");
                }
                value
            }
            Ok(Err(e)) => {
                warn!(attribute, error = %e, "Attribute lookup failed");
                absent
            }
            Err(_) => {
                warn!(
                    attribute,
                    timeout_ms = deadline.as_millis() as u64,
                    "Attribute lookup timed out"
                );
                absent
            }
        }
    });
}
