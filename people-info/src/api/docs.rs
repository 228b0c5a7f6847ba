//! OpenAPI document
//!
//! Generated from the handler annotations and served as JSON.

use axum::{routing::get, Json, Router};
use people_common::{EnrichedPerson, EnrichmentResult, FullPerson, Gender, Person};
use utoipa::OpenApi;

use super::persons;
use super::response::{CreatedId, ErrorBody, Status};
use crate::pagination::Pagination;
use crate::validation::{CreatePersonRequest, UpdatePersonRequest};
use crate::AppState;

/// Where the document is served
pub const OPENAPI_PATH: &str = "/api/v1/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "people-info",
        description = "Person profiles enriched with inferred age, gender and nationality"
    ),
    paths(
        persons::create_person,
        persons::list_persons,
        persons::get_person,
        persons::update_person,
        persons::delete_person,
    ),
    components(schemas(
        Person,
        EnrichmentResult,
        EnrichedPerson,
        FullPerson,
        Gender,
        CreatePersonRequest,
        UpdatePersonRequest,
        CreatedId,
        Pagination,
        Status,
        ErrorBody,
    )),
    tags((name = "persons", description = "Person records"))
)]
pub struct ApiDoc;

/// GET /api/v1/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn docs_routes() -> Router<AppState> {
    Router::new().route(OPENAPI_PATH, get(openapi_json))
}
