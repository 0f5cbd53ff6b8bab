use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::asset_type::AssetType;

/// How a draft points at its parent.
///
/// Single-record writes address an existing asset by storage id; bulk rows
/// address another row of the same batch by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Id(i32),
    Name(String),
}

/// An unpersisted candidate asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDraft {
    pub asset_name: String,
    pub asset_type: AssetType,
    pub hierarchy_level: i32,
    pub parent: Option<ParentRef>,
    pub description: Option<String>,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub details: Option<AssetDetailDraft>,
}

impl AssetDraft {
    /// A draft with defaults for every optional field.
    pub fn new(asset_name: impl Into<String>, asset_type: AssetType, start_date: NaiveDate) -> Self {
        Self {
            asset_name: asset_name.into(),
            asset_type,
            hierarchy_level: 0,
            parent: None,
            description: None,
            is_active: true,
            start_date,
            end_date: None,
            details: None,
        }
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The referenced parent name, if the draft addresses its parent by name.
    pub fn parent_name(&self) -> Option<&str> {
        match &self.parent {
            Some(ParentRef::Name(name)) => Some(name),
            _ => None,
        }
    }
}

/// Location metadata attached one-to-one to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AssetDetailDraft {
    #[schema(example = "North campus")]
    pub location: String,
    #[schema(example = "B2")]
    pub building: String,
    #[schema(example = "3")]
    pub floor: Option<String>,
    #[schema(example = "301")]
    pub room: Option<String>,
    #[schema(example = "Assembly line 4")]
    pub line: Option<String>,
}

/// Trim a text value and map blank strings to `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
