use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A recorded financial line item of a project.
///
/// Material-linked expenses share their id with the source forecast and carry
/// `expense_type = "material"`, `item_type = "item"`. The `parent_id` points
/// at the financial grouping row (budget category or lot header).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub expense_type: String,
    pub item_type: String,
    pub description: String,
    pub entity_name: Option<String>,
    pub unit: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_value: Decimal,
    pub discount_percentage: Decimal,
    pub amount: Decimal,
    pub is_paid: bool,
    pub status: ExpenseStatus,
    pub date: Date,
    pub payment_date: Option<Date>,
    pub payment_proof: Option<String>,
    pub delivery_date: Option<Date>,
    pub order_index: i32,
    pub wbs_path: String,
    pub invoice_document: Option<String>,
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
#[strum(serialize_all = "UPPERCASE")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
