use chrono::{DateTime, NaiveDate, Utc};
use hierarchy_common::draft::normalize_text;
use hierarchy_common::{AssetDetailDraft, AssetDraft, AssetType, ParentRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{asset, asset_detail};

pub use super::shared::{Pagination, escape_like};
use super::shared::double_option;

fn default_true() -> bool {
    true
}

/// Body of `POST /assets/` and `PUT /assets/{id}/`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateAssetRequest {
    #[schema(example = "Acme Corp")]
    pub asset_name: String,
    pub asset_type: AssetType,
    /// Caller-supplied depth marker. Default: 0.
    #[serde(default)]
    #[schema(example = 0, minimum = 0)]
    pub hierarchy_level: i32,
    /// Id of the parent asset. Must be omitted for organizations.
    #[schema(example = json!(null))]
    pub parent: Option<i32>,
    pub description: Option<String>,
    /// Default: true.
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[schema(example = "2024-01-01")]
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub details: Option<AssetDetailDraft>,
}

impl CreateAssetRequest {
    pub fn into_draft(self) -> AssetDraft {
        AssetDraft {
            asset_name: self.asset_name.trim().to_string(),
            asset_type: self.asset_type,
            hierarchy_level: self.hierarchy_level,
            parent: self.parent.map(ParentRef::Id),
            description: normalize_text(self.description),
            is_active: self.is_active,
            start_date: self.start_date,
            end_date: self.end_date,
            details: self.details.map(normalize_details),
        }
    }
}

/// Body of `PATCH /assets/{id}/`. Absent fields are left unchanged; `null`
/// clears a nullable field.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateAssetRequest {
    pub asset_name: Option<String>,
    pub asset_type: Option<AssetType>,
    pub hierarchy_level: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub parent: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<AssetDetailDraft>)]
    pub details: Option<Option<AssetDetailDraft>>,
}

impl UpdateAssetRequest {
    /// True when the body sends `"details": null`.
    pub fn clears_details(&self) -> bool {
        matches!(self.details, Some(None))
    }

    /// Merge the supplied fields into `draft`.
    pub fn apply_to(self, draft: &mut AssetDraft) {
        if let Some(name) = self.asset_name {
            draft.asset_name = name.trim().to_string();
        }
        if let Some(asset_type) = self.asset_type {
            draft.asset_type = asset_type;
        }
        if let Some(level) = self.hierarchy_level {
            draft.hierarchy_level = level;
        }
        if let Some(parent) = self.parent {
            draft.parent = parent.map(ParentRef::Id);
        }
        if let Some(description) = self.description {
            draft.description = normalize_text(description);
        }
        if let Some(is_active) = self.is_active {
            draft.is_active = is_active;
        }
        if let Some(start_date) = self.start_date {
            draft.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            draft.end_date = end_date;
        }
        if let Some(details) = self.details {
            draft.details = details.map(normalize_details);
        }
    }
}

fn normalize_details(details: AssetDetailDraft) -> AssetDetailDraft {
    AssetDetailDraft {
        location: details.location.trim().to_string(),
        building: details.building.trim().to_string(),
        floor: normalize_text(details.floor),
        room: normalize_text(details.room),
        line: normalize_text(details.line),
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AssetResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub uuid: Uuid,
    #[schema(example = "Acme Corp")]
    pub asset_name: String,
    pub asset_type: AssetType,
    #[schema(example = 0)]
    pub hierarchy_level: i32,
    /// Id of the parent asset; null for organizations.
    pub parent: Option<i32>,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub details: Option<AssetDetailDraft>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(asset::Model, Option<asset_detail::Model>)> for AssetResponse {
    fn from((m, details): (asset::Model, Option<asset_detail::Model>)) -> Self {
        Self {
            id: m.id,
            uuid: m.uuid,
            asset_name: m.asset_name,
            asset_type: m.asset_type,
            hierarchy_level: m.hierarchy_level,
            parent: m.parent_id,
            description: m.description,
            start_date: m.start_date,
            end_date: m.end_date,
            is_active: m.is_active,
            details: details.map(|d| AssetDetailDraft {
                location: d.location,
                building: d.building,
                floor: d.floor,
                room: d.room,
                line: d.line,
            }),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AssetListResponse {
    pub data: Vec<AssetResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssetListQuery {
    /// Type scope. Default: `organization`.
    pub asset_type: Option<AssetType>,
    pub is_active: Option<bool>,
    /// Only direct children of this asset id.
    pub parent: Option<i32>,
    /// Case-insensitive substring match on `asset_name`.
    pub search: Option<String>,
    /// Page number (1-based). Default: 1.
    #[param(minimum = 1)]
    pub page: Option<u64>,
    /// Items per page (1-100). Default: 20.
    #[param(minimum = 1, maximum = 100)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScopeQuery {
    /// Type the asset must have. Default: `organization`.
    pub asset_type: Option<AssetType>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChildrenQuery {
    /// Only return assets of this type. Filtered-out assets are still traversed.
    pub asset_type: Option<AssetType>,
    /// Walk the whole subtree (default) or only direct children.
    pub recursive: Option<bool>,
}
