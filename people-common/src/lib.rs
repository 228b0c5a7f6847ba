//! # People Info Common Library
//!
//! Shared code for the people-info service including:
//! - Person domain models (Person, EnrichmentResult, FullPerson, PersonUpdate)
//! - Database initialization and schema
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{EnrichedPerson, EnrichmentResult, FullPerson, Gender, Person, PersonUpdate};
