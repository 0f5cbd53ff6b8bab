use crate::asset_type::AssetType;
use crate::draft::{AssetDetailDraft, AssetDraft};
use crate::error::ValidationError;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;
pub const MAX_DETAIL_LENGTH: usize = 255;
pub const MAX_FLOOR_LENGTH: usize = 50;

/// Anything that can stand in as the parent of a candidate asset.
pub trait HierarchyNode {
    fn asset_type(&self) -> AssetType;
}

impl HierarchyNode for AssetType {
    fn asset_type(&self) -> AssetType {
        *self
    }
}

/// Check the parent/child type rules for a node of `asset_type` placed under `parent`.
///
/// Rules are evaluated in order and the first violation is returned:
/// a non-organization needs a parent, an organization must not have one, and
/// nothing may be placed under a leaf kind.
pub fn validate_placement<P>(asset_type: AssetType, parent: Option<&P>) -> Result<(), ValidationError>
where
    P: HierarchyNode + ?Sized,
{
    match parent {
        None if !asset_type.is_root() => Err(ValidationError::MissingParent { asset_type }),
        Some(_) if asset_type.is_root() => Err(ValidationError::OrganizationHasParent),
        Some(p) if p.asset_type().is_leaf() => Err(ValidationError::ParentIsLeafType {
            parent_type: p.asset_type(),
        }),
        _ => Ok(()),
    }
}

/// Hierarchy rules for a draft against its resolved parent.
pub fn validate<P>(candidate: &AssetDraft, parent: Option<&P>) -> Result<(), ValidationError>
where
    P: HierarchyNode + ?Sized,
{
    validate_placement(candidate.asset_type, parent)
}

/// Field-level constraints: required values, lengths, ranges.
pub fn validate_fields(draft: &AssetDraft) -> Result<(), ValidationError> {
    validate_name(&draft.asset_name)?;
    if draft.hierarchy_level < 0 {
        return Err(ValidationError::invalid(
            "hierarchy_level",
            "must be a non-negative integer",
        ));
    }
    if let Some(ref desc) = draft.description {
        validate_max_chars("description", desc, MAX_DESCRIPTION_LENGTH)?;
    }
    if let Some(ref details) = draft.details {
        validate_details(details)?;
    }
    Ok(())
}

/// A trimmed asset name of 1-255 characters.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField { field: "asset_name" });
    }
    validate_max_chars("asset_name", name, MAX_NAME_LENGTH)
}

pub fn validate_details(details: &AssetDetailDraft) -> Result<(), ValidationError> {
    if details.location.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "location" });
    }
    if details.building.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "building" });
    }
    validate_max_chars("location", &details.location, MAX_DETAIL_LENGTH)?;
    validate_max_chars("building", &details.building, MAX_DETAIL_LENGTH)?;
    if let Some(ref floor) = details.floor {
        validate_max_chars("floor", floor, MAX_FLOOR_LENGTH)?;
    }
    if let Some(ref room) = details.room {
        validate_max_chars("room", room, MAX_DETAIL_LENGTH)?;
    }
    if let Some(ref line) = details.line {
        validate_max_chars("line", line, MAX_DETAIL_LENGTH)?;
    }
    Ok(())
}

fn validate_max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::invalid(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}
