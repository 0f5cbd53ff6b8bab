pub mod asset_type;
pub mod draft;
pub mod error;
pub mod record;
pub mod validate;

pub use asset_type::{AssetType, ParseAssetTypeError};
pub use draft::{AssetDetailDraft, AssetDraft, ParentRef};
pub use error::{RowError, ValidationError};
pub use validate::{HierarchyNode, validate, validate_fields, validate_placement};
