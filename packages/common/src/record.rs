//! Normalization of bulk-ingest input into [`AssetDraft`]s.
//!
//! Bulk rows arrive either as JSON objects or as CSV text with a header row.
//! Both are mapped onto [`AssetRecord`] (one optional [`Cell`] per known
//! column) and then converted with [`AssetRecord::into_draft`], so the two
//! sources share a single set of parsing and defaulting rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::asset_type::AssetType;
use crate::draft::{AssetDetailDraft, AssetDraft, ParentRef, normalize_text};
use crate::error::{RowError, ValidationError};
use crate::validate::validate_fields;

/// Column names accepted in bulk input.
pub const COLUMNS: &[&str] = &[
    "asset_name",
    "asset_type",
    "hierarchy_level",
    "parent",
    "description",
    "start_date",
    "end_date",
    "is_active",
    "location",
    "building",
    "floor",
    "room",
    "line",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single scalar value of a bulk row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// One bulk row before normalization. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct AssetRecord {
    pub asset_name: Option<Cell>,
    pub asset_type: Option<Cell>,
    pub hierarchy_level: Option<Cell>,
    /// Name of the parent asset, which must appear earlier in the same batch.
    pub parent: Option<Cell>,
    pub description: Option<Cell>,
    pub start_date: Option<Cell>,
    pub end_date: Option<Cell>,
    pub is_active: Option<Cell>,
    pub location: Option<Cell>,
    pub building: Option<Cell>,
    pub floor: Option<Cell>,
    pub room: Option<Cell>,
    pub line: Option<Cell>,
}

impl AssetRecord {
    fn slot(&mut self, column: &str) -> Option<&mut Option<Cell>> {
        Some(match column {
            "asset_name" => &mut self.asset_name,
            "asset_type" => &mut self.asset_type,
            "hierarchy_level" => &mut self.hierarchy_level,
            "parent" => &mut self.parent,
            "description" => &mut self.description,
            "start_date" => &mut self.start_date,
            "end_date" => &mut self.end_date,
            "is_active" => &mut self.is_active,
            "location" => &mut self.location,
            "building" => &mut self.building,
            "floor" => &mut self.floor,
            "room" => &mut self.room,
            "line" => &mut self.line,
            _ => return None,
        })
    }

    /// Convert into a draft. `row` is the 1-based batch position used in errors.
    pub fn into_draft(self, row: usize) -> Result<AssetDraft, RowError> {
        self.normalize().map_err(|e| RowError::new(row, e))
    }

    fn normalize(self) -> Result<AssetDraft, ValidationError> {
        let asset_name = text("asset_name", self.asset_name)?
            .ok_or(ValidationError::MissingField { field: "asset_name" })?;
        let asset_type = text("asset_type", self.asset_type)?
            .ok_or(ValidationError::MissingField { field: "asset_type" })?
            .parse::<AssetType>()
            .map_err(|e| ValidationError::InvalidAssetType(e.to_string()))?;
        let hierarchy_level = level(self.hierarchy_level)?;
        let parent = text("parent", self.parent)?.map(ParentRef::Name);
        let description = text("description", self.description)?;
        let start_date = date("start_date", self.start_date)?
            .ok_or(ValidationError::MissingField { field: "start_date" })?;
        let end_date = date("end_date", self.end_date)?;
        let is_active = flag(self.is_active)?.unwrap_or(true);

        let location = text("location", self.location)?;
        let building = text("building", self.building)?;
        let floor = text("floor", self.floor)?;
        let room = text("room", self.room)?;
        let line = text("line", self.line)?;
        let has_details = location.is_some()
            || building.is_some()
            || floor.is_some()
            || room.is_some()
            || line.is_some();
        let details = has_details.then(|| AssetDetailDraft {
            location: location.unwrap_or_default(),
            building: building.unwrap_or_default(),
            floor,
            room,
            line,
        });

        let draft = AssetDraft {
            asset_name,
            asset_type,
            hierarchy_level,
            parent,
            description,
            is_active,
            start_date,
            end_date,
            details,
        };
        validate_fields(&draft)?;
        Ok(draft)
    }
}

fn text(field: &'static str, cell: Option<Cell>) -> Result<Option<String>, ValidationError> {
    match cell {
        None => Ok(None),
        Some(Cell::Text(s)) => Ok(normalize_text(Some(s))),
        Some(_) => Err(ValidationError::invalid(field, "must be a string")),
    }
}

fn level(cell: Option<Cell>) -> Result<i32, ValidationError> {
    let invalid = || ValidationError::invalid("hierarchy_level", "must be a non-negative integer");
    let value = match cell {
        None => return Ok(0),
        Some(Cell::Integer(n)) => n,
        Some(Cell::Text(s)) => match s.trim() {
            "" => return Ok(0),
            t => t.parse::<i64>().map_err(|_| invalid())?,
        },
        Some(_) => return Err(invalid()),
    };
    if value < 0 {
        return Err(invalid());
    }
    i32::try_from(value).map_err(|_| invalid())
}

fn flag(cell: Option<Cell>) -> Result<Option<bool>, ValidationError> {
    let invalid = || ValidationError::invalid("is_active", "must be one of true, false, 1, 0, yes, no");
    match cell {
        None => Ok(None),
        Some(Cell::Bool(b)) => Ok(Some(b)),
        Some(Cell::Integer(1)) => Ok(Some(true)),
        Some(Cell::Integer(0)) => Ok(Some(false)),
        Some(Cell::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(invalid()),
        },
        Some(_) => Err(invalid()),
    }
}

fn date(field: &'static str, cell: Option<Cell>) -> Result<Option<NaiveDate>, ValidationError> {
    match text(field, cell)? {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| ValidationError::invalid(field, "must be a date in YYYY-MM-DD format")),
    }
}

/// Normalize structured (JSON) rows. Stops at the first bad row.
pub fn drafts_from_values(rows: Vec<Value>) -> Result<Vec<AssetDraft>, RowError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, value)| {
            let row = i + 1;
            if !value.is_object() {
                return Err(RowError::new(
                    row,
                    ValidationError::invalid("record", "must be a JSON object"),
                ));
            }
            serde_json::from_value::<AssetRecord>(value)
                .map_err(|e| RowError::new(row, ValidationError::invalid("record", e.to_string())))?
                .into_draft(row)
        })
        .collect()
}

/// Normalize delimited tabular text with a header row. Stops at the first bad row.
///
/// Header problems are reported as row 0.
pub fn drafts_from_csv(data: &[u8]) -> Result<Vec<AssetDraft>, RowError> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RowError::new(0, csv_error(e)))?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    for required in ["asset_name", "asset_type"] {
        if !headers.iter().any(|h| h == required) {
            return Err(RowError::new(
                0,
                ValidationError::MissingField { field: required },
            ));
        }
    }

    let mut drafts = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| RowError::new(row, csv_error(e)))?;
        let mut parsed = AssetRecord::default();
        for (column, value) in headers.iter().zip(record.iter()) {
            if value.is_empty() {
                continue;
            }
            if let Some(slot) = parsed.slot(column) {
                *slot = Some(Cell::Text(value.to_string()));
            }
        }
        drafts.push(parsed.into_draft(row)?);
    }
    Ok(drafts)
}

fn csv_error(err: csv::Error) -> ValidationError {
    ValidationError::invalid("file", format!("unreadable tabular data: {err}"))
}
