use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};
use hierarchy_common::record::{drafts_from_csv, drafts_from_values};
use hierarchy_common::{AssetDraft, RowError};
use serde_json::Value;

use crate::error::AppError;

/// Raw bulk upload body, decoded by content type but not yet normalized.
///
/// * `application/json`: `{"assets": [...]}` or a bare array of row objects.
/// * `multipart/form-data`: a `file` field holding CSV text with a header row.
pub enum BulkPayload {
    Rows(Vec<Value>),
    Csv(Bytes),
}

impl BulkPayload {
    /// Normalize every row into a draft, stopping at the first bad row.
    pub fn into_drafts(self) -> Result<Vec<AssetDraft>, RowError> {
        match self {
            BulkPayload::Rows(rows) => drafts_from_values(rows),
            BulkPayload::Csv(data) => drafts_from_csv(&data),
        }
    }
}

impl<S> FromRequest<S> for BulkPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| body_error(e.status(), e.body_text()))?;
            let value: Value = serde_json::from_slice(&body)
                .map_err(|e| AppError::Validation(format!("Malformed JSON body: {e}")))?;
            return rows_from_json(value).map(BulkPayload::Rows);
        }

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| body_error(e.status(), format!("Multipart error: {e}")))?;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| body_error(e.status(), format!("Multipart error: {e}")))?
            {
                if field.name() == Some("file") {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| body_error(e.status(), format!("Failed to read file: {e}")))?;
                    return Ok(BulkPayload::Csv(data));
                }
            }
            return Err(AppError::Validation("Missing 'file' field".into()));
        }

        Err(AppError::Validation(
            "Unsupported content type: send application/json or multipart/form-data".into(),
        ))
    }
}

/// Body rejections keep 413 for oversized uploads; anything else is a bad request.
fn body_error(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::Validation(message)
    }
}

fn rows_from_json(value: Value) -> Result<Vec<Value>, AppError> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => match map.remove("assets") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(AppError::Validation(
                "Expected an 'assets' array in the request body".into(),
            )),
        },
        _ => Err(AppError::Validation(
            "Expected a JSON array or an object with an 'assets' array".into(),
        )),
    }
}
