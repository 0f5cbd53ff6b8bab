#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of node in the asset hierarchy.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")
)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Root of a tree. The only kind allowed to have no parent.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "organization"))]
    Organization,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "group"))]
    Group,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "subgroup"))]
    Subgroup,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "plant"))]
    Plant,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "location"))]
    Location,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "building"))]
    Building,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "floor"))]
    Floor,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "room"))]
    Room,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "line"))]
    Line,
    /// Leaf kind. Nothing may be placed under a machine.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "machine"))]
    Machine,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "other"))]
    Other,
}

impl AssetType {
    /// Returns true for the only kind that may (and must) sit at the top of a tree.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Organization)
    }

    /// Returns true for kinds that cannot have children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Machine)
    }

    /// All asset types.
    pub const ALL: &'static [AssetType] = &[
        Self::Organization,
        Self::Group,
        Self::Subgroup,
        Self::Plant,
        Self::Location,
        Self::Building,
        Self::Floor,
        Self::Room,
        Self::Line,
        Self::Machine,
        Self::Other,
    ];

    /// Returns the wire representation (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Group => "group",
            Self::Subgroup => "subgroup",
            Self::Plant => "plant",
            Self::Location => "location",
            Self::Building => "building",
            Self::Floor => "floor",
            Self::Room => "room",
            Self::Line => "line",
            Self::Machine => "machine",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown asset type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAssetTypeError {
    invalid: String,
}

impl ParseAssetTypeError {
    pub fn invalid(&self) -> &str {
        &self.invalid
    }
}

impl fmt::Display for ParseAssetTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid asset type '{}'. Valid values: {}",
            self.invalid,
            AssetType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseAssetTypeError {}

impl FromStr for AssetType {
    type Err = ParseAssetTypeError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        AssetType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ParseAssetTypeError {
                invalid: s.to_string(),
            })
    }
}
