use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A planned material purchase line of a project planning.
///
/// Invariant exploited by the reconciler: when a forecast has a corresponding
/// financial expense, the expense row was created with the forecast's own id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "material_forecasts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub planning_id: Uuid,
    pub status: ForecastStatus,
    pub is_paid: bool,
    pub description: String,
    pub quantity_needed: Decimal,
    pub unit_price: Decimal,
    pub discount_value: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub unit: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub supply_group_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub purchase_date: Option<Date>,
    pub estimated_date: Option<Date>,
    pub delivery_date: Option<Date>,
    pub payment_proof: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[strum(serialize_all = "lowercase")]
pub enum ForecastStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "ordered")]
    Ordered,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::planning::Entity",
        from = "Column::PlanningId",
        to = "super::planning::Column::Id"
    )]
    Planning,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::supply_group::Entity",
        from = "Column::SupplyGroupId",
        to = "super::supply_group::Column::Id"
    )]
    SupplyGroup,
}

impl Related<super::planning::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Planning.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::supply_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupplyGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
