use std::time::Instant;

use axum::{
    Json,
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::ErrorReport;
use crate::extractors::context::RequestContext;

pub const TRACE_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Assign a correlation id to every request and report its outcome.
///
/// A valid UUID in an incoming `X-Trace-ID` header is reused; anything else is
/// replaced by a fresh v4 id. Error responses produced by `AppError` get the id
/// stamped into their body and are logged here, once per request.
pub async fn trace_requests(mut req: Request, next: Next) -> Response {
    let trace_id = req
        .headers()
        .get(&TRACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(Uuid::new_v4);

    let ctx = RequestContext::new(trace_id);
    req.extensions_mut().insert(ctx.clone());

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let span = info_span!("request", %trace_id, %method, %path);

    async move {
        let started = Instant::now();
        info!("Request started");

        let response = next.run(req).await;
        let mut response = finalize_error(response, &ctx);

        if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
            response.headers_mut().insert(TRACE_HEADER, value);
        }

        info!(
            status = response.status().as_u16(),
            actor = ctx.actor(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request finished"
        );
        response
    }
    .instrument(span)
    .await
}

fn finalize_error(mut response: Response, ctx: &RequestContext) -> Response {
    let Some(ErrorReport { mut body, internal }) = response.extensions_mut().remove::<ErrorReport>()
    else {
        return response;
    };

    let status = response.status();
    if status.is_server_error() {
        error!(
            code = body.code,
            actor = ctx.actor(),
            detail = internal.as_deref().unwrap_or(body.error.detail.as_str()),
            "Request failed"
        );
    } else {
        warn!(
            code = body.code,
            actor = ctx.actor(),
            detail = %body.error.detail,
            row = body.error.row,
            "Request rejected"
        );
    }

    body.trace_id = Some(ctx.trace_id.to_string());
    (status, Json(body)).into_response()
}
