use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `alive`, `ready` or `not ready`.
    #[schema(example = "ready")]
    pub status: &'static str,
}
