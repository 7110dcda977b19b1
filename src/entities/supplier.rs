use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::material_forecast::Entity")]
    MaterialForecasts,
}

impl Related<super::material_forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaterialForecasts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
