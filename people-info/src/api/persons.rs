//! Person endpoints
//!
//! POST   /api/v1/persons       create + enrich
//! GET    /api/v1/persons       filter + paginate
//! GET    /api/v1/persons/:id
//! PATCH  /api/v1/persons/:id   partial update
//! DELETE /api/v1/persons/:id

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, OriginalUri, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use people_common::{EnrichedPerson, FullPerson};
use tracing::{debug, info};
use url::Url;

use super::response::{ApiResponse, CreatedId, ErrorBody};
use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::validation::{
    decode_body, CreatePersonRequest, PersonFilterParams, UpdatePersonRequest, ValidationError,
};
use crate::AppState;

/// POST /api/v1/persons
///
/// Validates the body, enriches the person, then persists it. Enrichment
/// failures never fail the request; only storage errors do.
#[utoipa::path(
    post,
    path = "/api/v1/persons",
    tag = "persons",
    request_body = CreatePersonRequest,
    responses(
        (status = 201, description = "Person created", body = ApiResponse<CreatedId>),
        (status = 400, description = "Empty, malformed or invalid body", body = ErrorBody),
        (status = 408, description = "Request exceeded the server timeout", body = ErrorBody),
        (status = 409, description = "Person already exists", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn create_person(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedId>>)> {
    let person = decode_body::<CreatePersonRequest>(&body)?.validate()?;
    debug!(given_name = %person.name, "Enriching person");

    let enrichment = state.enrichment.enrich(&person).await;
    let id = state
        .store
        .create(&EnrichedPerson::new(person, enrichment))
        .await
        .map_err(|e| ApiError::store(e, "failed to add person"))?;

    info!(id, "Person created");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(CreatedId { id }))))
}

/// GET /api/v1/persons
#[utoipa::path(
    get,
    path = "/api/v1/persons",
    tag = "persons",
    params(PersonFilterParams),
    responses(
        (status = 200, description = "Page of matching persons", body = ApiResponse<Vec<FullPerson>>),
        (status = 400, description = "Invalid query parameters", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn list_persons(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    query: Result<Query<PersonFilterParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<FullPerson>>>> {
    let Query(params) = query.map_err(|e| ValidationError::InvalidQuery(e.body_text()))?;
    let filter = params.validate(state.pagination.max_limit)?;

    let page = state
        .store
        .list(&filter)
        .await
        .map_err(|e| ApiError::store(e, "failed to get persons"))?;

    let base = base_url(&state, &headers, uri.path())?;
    let pagination = Pagination::derive(page.limit, page.offset, page.total, &base);

    debug!(
        returned = page.persons.len(),
        total = page.total,
        "Listed persons"
    );
    Ok(Json(ApiResponse::page(page.persons, pagination)))
}

/// GET /api/v1/persons/:id
#[utoipa::path(
    get,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = i64, Path, description = "Person identifier")),
    responses(
        (status = 200, description = "Person found", body = ApiResponse<FullPerson>),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 404, description = "Person not found", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn get_person(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ApiResponse<FullPerson>>> {
    let id = parse_id(&raw_id)?;

    let person = state
        .store
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::store(e, "failed to get person"))?;

    Ok(Json(ApiResponse::ok(person)))
}

/// PATCH /api/v1/persons/:id
#[utoipa::path(
    patch,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = i64, Path, description = "Person identifier")),
    request_body = UpdatePersonRequest,
    responses(
        (status = 200, description = "Updated person", body = ApiResponse<FullPerson>),
        (status = 400, description = "Invalid id or body", body = ErrorBody),
        (status = 404, description = "Person not found", body = ErrorBody),
        (status = 409, description = "Update collides with another person", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn update_person(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ApiResponse<FullPerson>>> {
    let id = parse_id(&raw_id)?;
    let update = decode_body::<UpdatePersonRequest>(&body)?.validate()?;

    let person = state
        .store
        .update(id, &update)
        .await
        .map_err(|e| ApiError::store(e, "failed to update person"))?;

    info!(id, "Person updated");
    Ok(Json(ApiResponse::ok(person)))
}

/// DELETE /api/v1/persons/:id
#[utoipa::path(
    delete,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = i64, Path, description = "Person identifier")),
    responses(
        (status = 200, description = "Person deleted"),
        (status = 400, description = "Invalid id", body = ErrorBody),
        (status = 404, description = "Person not found", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn delete_person(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&raw_id)?;

    state
        .store
        .delete(id)
        .await
        .map_err(|e| ApiError::store(e, "failed to delete person"))?;

    info!(id, "Person deleted");
    Ok(Json(ApiResponse::empty()))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("invalid id parameter".to_string()))
}

/// Base for pagination links: configured public URL, else the request's host
fn base_url(state: &AppState, headers: &HeaderMap, path: &str) -> ApiResult<Url> {
    let mut base = match &state.public_base_url {
        Some(public) => public.clone(),
        None => {
            let host = header_str(headers, header::HOST.as_str()).unwrap_or("localhost");
            let scheme = forwarded_scheme(headers);
            Url::parse(&format!("{}://{}", scheme, host))
                .map_err(|_| ApiError::BadRequest("invalid Host header".to_string()))?
        }
    };
    base.set_path(path);
    Ok(base)
}

/// Scheme announced by a proxy; anything but http/https is ignored
fn forwarded_scheme(headers: &HeaderMap) -> &'static str {
    match header_str(headers, "x-forwarded-proto").map(str::trim) {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        for raw in ["abc", "0", "-3", "1.5", ""] {
            let err = parse_id(raw).unwrap_err();
            assert_eq!(err.to_string(), "invalid id parameter");
        }
    }

    #[test]
    fn test_forwarded_scheme_only_http_or_https() {
        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_scheme(&headers), "http");

        headers.insert("x-forwarded-proto", "HTTPS".parse().unwrap());
        assert_eq!(forwarded_scheme(&headers), "https");

        for proto in ["ftp", "javascript", "https://evil.test", ""] {
            headers.insert("x-forwarded-proto", proto.parse().unwrap());
            assert_eq!(forwarded_scheme(&headers), "http", "proto {:?}", proto);
        }
    }
}
