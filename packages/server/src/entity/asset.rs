use hierarchy_common::{AssetType, HierarchyNode};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// External identifier, assigned once at creation.
    #[sea_orm(unique)]
    pub uuid: Uuid,

    pub asset_name: String,
    pub asset_type: AssetType,
    /// Caller-supplied depth marker; never derived from the tree.
    pub hierarchy_level: i32,

    /// NULL only for organizations. Deleting the parent deletes this row.
    pub parent_id: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_active: bool,
    pub start_date: Date,
    pub end_date: Option<Date>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_one = "super::asset_detail::Entity")]
    Detail,
}

impl Related<super::asset_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Detail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl HierarchyNode for Model {
    fn asset_type(&self) -> AssetType {
        self.asset_type
    }
}
