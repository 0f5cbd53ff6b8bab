use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hierarchy_common::{RowError, ValidationError};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::service::IngestError;

/// Structured error response returned by all endpoints on failure.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = 404)]
    pub status_code: u16,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `UNRESOLVED_PARENT`,
    /// `AMBIGUOUS_PARENT`, `TOKEN_MISSING`, `TOKEN_INVALID`, `PERMISSION_DENIED`,
    /// `NOT_FOUND`, `CONFLICT`, `PAYLOAD_TOO_LARGE`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    pub error: ErrorDetail,
    /// Generic description of the status code.
    #[schema(example = "Not Found: Resource not available")]
    pub message: &'static str,
    /// Correlation id of the request, also sent as the `X-Trace-ID` header.
    #[schema(example = "0b5a7c1e-7d1f-4a53-9d4c-2f1f3a3f6c11")]
    pub trace_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, utoipa::ToSchema)]
pub struct ErrorDetail {
    #[schema(example = "No organization is assigned to this id")]
    pub detail: String,
    /// Offending request field, when the error concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "parent")]
    pub field: Option<&'static str>,
    /// 1-based batch position of the failing bulk row.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 3)]
    pub row: Option<usize>,
    /// Unresolved or ambiguous parent name in a bulk batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Acme")]
    pub parent: Option<String>,
}

impl ErrorDetail {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            ..Default::default()
        }
    }
}

/// Error payload stashed in the response extensions so the tracing middleware
/// can stamp the trace id and log it.
#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub body: ErrorBody,
    /// Detail withheld from the client (storage or unexpected errors).
    pub internal: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request that is not tied to a specific asset rule.
    Validation(String),
    /// A draft broke a field or hierarchy rule.
    Invalid(ValidationError),
    Ingest(IngestError),
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// Request body exceeded the configured upload limit.
    PayloadTooLarge(String),
    Internal(String),
}

pub fn status_message(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request: Invalid data or parameters",
        401 => "Unauthorized: Please log in",
        403 => "Forbidden: Access denied",
        404 => "Not Found: Resource not available",
        405 => "Method Not Allowed: Invalid HTTP method",
        409 => "Conflict: Resource state does not allow this change",
        413 => "Payload Too Large: Request body exceeds the limit",
        500 => "Internal Server Error: Something went wrong",
        _ => "An unexpected error occurred",
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Ingest(IngestError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Ingest(_) => StatusCode::BAD_REQUEST,
            AppError::TokenMissing | AppError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code_and_detail(self) -> (&'static str, ErrorDetail, Option<String>) {
        match self {
            AppError::Validation(msg) => ("VALIDATION_ERROR", ErrorDetail::new(msg), None),
            AppError::Invalid(err) => ("VALIDATION_ERROR", invalid_detail(&err, None), None),
            AppError::Ingest(err) => match err {
                IngestError::Invalid(RowError { row, error }) => {
                    ("VALIDATION_ERROR", invalid_detail(&error, Some(row)), None)
                }
                IngestError::UnresolvedParent { row, ref parent_name } => (
                    "UNRESOLVED_PARENT",
                    ErrorDetail {
                        field: Some("parent"),
                        row: Some(row),
                        parent: Some(parent_name.clone()),
                        ..ErrorDetail::new(err.to_string())
                    },
                    None,
                ),
                IngestError::AmbiguousParent { ref name, ref rows } => (
                    "AMBIGUOUS_PARENT",
                    ErrorDetail {
                        field: Some("parent"),
                        row: rows.first().copied(),
                        parent: Some(name.clone()),
                        ..ErrorDetail::new(err.to_string())
                    },
                    None,
                ),
                IngestError::Database(e) => internal(e.to_string()),
            },
            AppError::TokenMissing => (
                "TOKEN_MISSING",
                ErrorDetail::new("Authentication credentials were not provided"),
                None,
            ),
            AppError::TokenInvalid => (
                "TOKEN_INVALID",
                ErrorDetail::new("Invalid or expired token"),
                None,
            ),
            AppError::PermissionDenied => (
                "PERMISSION_DENIED",
                ErrorDetail::new("Insufficient permissions"),
                None,
            ),
            AppError::NotFound(msg) => ("NOT_FOUND", ErrorDetail::new(msg), None),
            AppError::Conflict(msg) => ("CONFLICT", ErrorDetail::new(msg), None),
            AppError::PayloadTooLarge(msg) => ("PAYLOAD_TOO_LARGE", ErrorDetail::new(msg), None),
            AppError::Internal(detail) => internal(detail),
        }
    }

    pub fn into_report(self) -> (StatusCode, ErrorReport) {
        let status = self.status();
        let (code, error, internal) = self.code_and_detail();
        let body = ErrorBody {
            success: false,
            status_code: status.as_u16(),
            code,
            error,
            message: status_message(status),
            trace_id: None,
        };
        (status, ErrorReport { body, internal })
    }
}

fn invalid_detail(err: &ValidationError, row: Option<usize>) -> ErrorDetail {
    ErrorDetail {
        field: Some(err.field()),
        row,
        ..ErrorDetail::new(err.to_string())
    }
}

fn internal(detail: String) -> (&'static str, ErrorDetail, Option<String>) {
    (
        "INTERNAL_ERROR",
        ErrorDetail::new("An unexpected error occurred"),
        Some(detail),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, report) = self.into_report();
        let mut response = (status, Json(report.body.clone())).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint violation: {detail}");
                AppError::Conflict("An asset with the same identity already exists".into())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Invalid(err)
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Database(e) => AppError::from(e),
            other => AppError::Ingest(other),
        }
    }
}
