//! Response envelope
//!
//! Every API response has the shape
//! `{"status": "ok"|"error", "data"?, "error"?, "pagination"?}`.
//! Successes are `ApiResponse`, failures are `ErrorBody`.

use serde::Serialize;
use utoipa::ToSchema;

use crate::pagination::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Ok,
            data: Some(data),
            pagination: None,
        }
    }

    pub fn page(data: T, pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::ok(data)
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn empty() -> Self {
        Self {
            status: Status::Ok,
            data: None,
            pagination: None,
        }
    }
}

/// Failure envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub status: Status,
    #[schema(example = "person not found")]
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error: message.into(),
        }
    }
}

/// Body of a successful create
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedId {
    #[schema(example = 1)]
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::ok(CreatedId { id: 3 })).unwrap();
        assert_eq!(ok, json!({"status": "ok", "data": {"id": 3}}));

        let err = serde_json::to_value(ErrorBody::new("person not found")).unwrap();
        assert_eq!(err, json!({"status": "error", "error": "person not found"}));

        let empty = serde_json::to_value(ApiResponse::empty()).unwrap();
        assert_eq!(empty, json!({"status": "ok"}));
    }
}
