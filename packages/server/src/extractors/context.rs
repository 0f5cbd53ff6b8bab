use std::convert::Infallible;
use std::sync::{Arc, OnceLock};

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

const ANONYMOUS: &str = "anonymous";

/// Per-request correlation data handed to services and log statements.
///
/// Created by the tracing middleware and stored in the request extensions.
/// The acting identity is filled in once the bearer token has been verified;
/// clones share it, so the middleware sees the actor set by the extractor.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub trace_id: Uuid,
    actor: Arc<OnceLock<String>>,
}

impl RequestContext {
    pub fn new(trace_id: Uuid) -> Self {
        Self {
            trace_id,
            actor: Arc::new(OnceLock::new()),
        }
    }

    /// A context with a fresh trace id, for work that did not arrive over HTTP.
    pub fn detached() -> Self {
        Self::new(Uuid::new_v4())
    }

    /// Record the authenticated subject. Later calls are ignored.
    pub fn set_actor(&self, actor: impl Into<String>) {
        let _ = self.actor.set(actor.into());
    }

    pub fn actor(&self) -> &str {
        self.actor.get().map(String::as_str).unwrap_or(ANONYMOUS)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::detached))
    }
}
