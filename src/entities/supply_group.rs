use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A purchase lot ("lote") grouping forecasts of a planning under one label.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supply_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub planning_id: Uuid,
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::planning::Entity",
        from = "Column::PlanningId",
        to = "super::planning::Column::Id"
    )]
    Planning,
    #[sea_orm(has_many = "super::material_forecast::Entity")]
    MaterialForecasts,
}

impl Related<super::planning::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Planning.def()
    }
}

impl Related<super::material_forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialForecasts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
