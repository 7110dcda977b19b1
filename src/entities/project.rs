use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub instance_id: Uuid,
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::planning::Entity")]
    Planning,
    #[sea_orm(has_many = "super::project_expense::Entity")]
    ProjectExpenses,
}

impl Related<super::planning::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Planning.def()
    }
}

impl Related<super::project_expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectExpenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
