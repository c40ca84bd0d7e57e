use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An isolated sandbox; `guid` is assigned once right after creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "demos")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub guid: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::erp_user::Entity")]
    ErpUsers,
    #[sea_orm(has_many = "super::retailer::Entity")]
    Retailers,
}

impl Related<super::erp_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ErpUsers.def()
    }
}

impl Related<super::retailer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Retailers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
