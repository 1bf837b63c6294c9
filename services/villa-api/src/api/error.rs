use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{FieldViolation, VillaError};

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub code: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<FieldViolation> for FieldError {
    fn from(violation: FieldViolation) -> Self {
        Self {
            field: violation.field,
            message: violation.message,
        }
    }
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            r#type: format!("https://villas.dev/problems/{code}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
            code,
            request_id: "unknown".to_string(),
            details: None,
        }
    }

    fn set_request_id(&mut self, request_id: impl Into<String>) {
        let request_id = request_id.into();
        self.request_id = request_id.clone();
        if self.instance.is_none() {
            self.instance = Some(request_id);
        }
    }

    fn set_details(&mut self, details: Vec<FieldError>) {
        self.details = Some(details);
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    fn with_status(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.problem.set_request_id(request_id);
        self
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.problem.set_details(details);
        self
    }
}

impl From<VillaError> for ApiError {
    fn from(err: VillaError) -> Self {
        let code = err.code();
        match err {
            VillaError::BadRequest { message, .. } => Self::bad_request(code, message),
            VillaError::Conflict { .. } => Self::conflict(code, err.to_string()),
            VillaError::NotFound(_) => Self::not_found(code, err.to_string()),
            VillaError::ValidationFailed(violations) => {
                let detail = format!("validation failed for {} field(s)", violations.len());
                Self::bad_request(code, detail)
                    .with_details(violations.into_iter().map(FieldError::from).collect())
            }
            VillaError::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                // Storage details stay in the logs.
                Self::internal(code, "An internal error occurred")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use villa_id::VillaId;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                VillaError::bad_request("id_mismatch", "mismatch"),
                StatusCode::BAD_REQUEST,
            ),
            (
                VillaError::Conflict {
                    name: "Pool View".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (
                VillaError::NotFound(VillaId::FIRST),
                StatusCode::NOT_FOUND,
            ),
            (
                VillaError::ValidationFailed(vec![FieldViolation::new("name", "name is required")]),
                StatusCode::BAD_REQUEST,
            ),
            (
                VillaError::Internal("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_validation_failure_lists_fields() {
        let err = ApiError::from(VillaError::ValidationFailed(vec![
            FieldViolation::new("rate", "must be a number"),
            FieldViolation::new("sqft", "must be a 32-bit integer"),
        ]));
        let details = err.problem.details.expect("details");
        assert_eq!(details.len(), 2);
        assert_eq!(details[1].field, "sqft");
    }

    #[test]
    fn test_internal_detail_is_generic() {
        let err = ApiError::from(VillaError::Internal("password=hunter2".to_string()));
        assert!(!err.problem.detail.contains("hunter2"));
    }

    #[test]
    fn test_request_id_fills_instance() {
        let err = ApiError::not_found("villa_not_found", "gone").with_request_id("req_1");
        assert_eq!(err.problem.request_id, "req_1");
        assert_eq!(err.problem.instance.as_deref(), Some("req_1"));
    }

    #[test]
    fn test_problem_content_type() {
        let response = ApiError::bad_request("invalid_body", "bad").into_response();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }
}
