use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A project's material planning. At most one per project.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plannings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
    #[sea_orm(has_many = "super::material_forecast::Entity")]
    MaterialForecasts,
    #[sea_orm(has_many = "super::supply_group::Entity")]
    SupplyGroups,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::material_forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialForecasts.def()
    }
}

impl Related<super::supply_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplyGroups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
