use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A retail store. Seeded retailers start without a demo and are shared by
/// every demo until one of them claims the store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "retailers")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub demo_id: Option<i32>,
    #[serde(default)]
    pub manager_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::demo::Entity",
        from = "Column::DemoId",
        to = "super::demo::Column::Id"
    )]
    Demo,
    #[sea_orm(
        belongs_to = "super::erp_user::Entity",
        from = "Column::ManagerId",
        to = "super::erp_user::Column::Id"
    )]
    Manager,
}

impl Related<super::demo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Demo.def()
    }
}

impl Related<super::erp_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manager.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
