use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BulkUploadResponse {
    #[schema(example = "Bulk upload successful")]
    pub message: String,
    /// Number of assets created.
    #[schema(example = 42)]
    pub count: usize,
}
