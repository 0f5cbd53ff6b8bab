pub mod asset;
pub mod descendants;
pub mod ingest;

pub use asset::{AssetService, StoredAsset};
pub use descendants::descendants;
pub use ingest::{IngestError, ingest};

/// Upper bound on ids bound into a single `IN (..)` clause.
pub(crate) const ID_CHUNK: usize = 1000;
