//! HTTP API handlers

pub mod docs;
pub mod health;
pub mod persons;
pub mod response;

pub use docs::docs_routes;
pub use health::health_routes;
pub use persons::{create_person, delete_person, get_person, list_persons, update_person};
