use thiserror::Error;

use crate::asset_type::AssetType;

/// Why a draft asset was rejected.
///
/// Hierarchy rule variants are produced by [`crate::validate_placement`], field
/// variants by [`crate::validate_fields`] and by record normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A {asset_type} must have a parent asset.")]
    MissingParent { asset_type: AssetType },

    #[error("An Organization cannot have a parent asset.")]
    OrganizationHasParent,

    #[error("A {parent_type} cannot have a child asset.")]
    ParentIsLeafType { parent_type: AssetType },

    #[error("An asset cannot be placed under itself or one of its descendants.")]
    CyclicParent,

    #[error("Field '{field}' is required.")]
    MissingField { field: &'static str },

    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{0}")]
    InvalidAssetType(String),
}

impl ValidationError {
    /// Name of the request field the error is attached to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingParent { .. }
            | Self::OrganizationHasParent
            | Self::ParentIsLeafType { .. }
            | Self::CyclicParent => "parent",
            Self::MissingField { field } | Self::InvalidField { field, .. } => field,
            Self::InvalidAssetType(_) => "asset_type",
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// A [`ValidationError`] tied to a 1-based position in a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Row {row}: {error}")]
pub struct RowError {
    pub row: usize,
    pub error: ValidationError,
}

impl RowError {
    pub fn new(row: usize, error: ValidationError) -> Self {
        Self { row, error }
    }
}
