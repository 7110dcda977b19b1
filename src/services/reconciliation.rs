//! Forecast/expense reconciliation.
//!
//! Expenses backing a material forecast are created with the forecast's own
//! id. A legacy code path matched them by description instead, which left
//! some expenses stale, attached to the wrong forecast, or missing entirely.
//! This service walks every project and repairs the drift: for each
//! non-pending forecast it computes the expense the forecast should have
//! produced, then leaves it alone, rewrites it, or creates it.

use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    material_forecast::{self, ForecastStatus},
    planning, project,
    project_expense::{self, ExpenseStatus},
    supplier, supply_group,
};
use crate::errors::ServiceError;

/// Description prefixes stamped on material-linked expenses.
const PREFIX_DELIVERED: &str = "Pedido Entregue";
const PREFIX_PAID: &str = "Pedido Pago";
const PREFIX_PENDING: &str = "Pedido Pendente";

const EXPENSE_TYPE_MATERIAL: &str = "material";
const ITEM_TYPE_ITEM: &str = "item";

/// Whether the run writes corrections or only reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Preview,
    Apply,
}

impl RunMode {
    /// Parses the `DRY_RUN`-style flag: `"1"` and `"true"` mean preview.
    pub fn from_env_flag(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value == "1" || value.eq_ignore_ascii_case("true") => RunMode::Preview,
            _ => RunMode::Apply,
        }
    }

    pub fn is_preview(self) -> bool {
        self == RunMode::Preview
    }
}

/// A forecast row with its denormalized supplier name and lot title.
#[derive(Debug, Clone, FromQueryResult)]
pub struct ForecastRow {
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
    pub purchase_date: Option<NaiveDate>,
    pub estimated_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub payment_proof: Option<String>,
    pub supplier_name: Option<String>,
    pub supply_group_title: Option<String>,
}

/// The expense a forecast should have produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedExpense {
    pub description: String,
    pub status: ExpenseStatus,
    pub is_paid: bool,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_value: Decimal,
    pub discount_percentage: Decimal,
    pub amount: Decimal,
    pub unit: Option<String>,
    pub entity_name: Option<String>,
}

/// Counters for one project (and, summed, for the whole run).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReconcileTally {
    pub already_correct: u64,
    pub corrected: u64,
    pub created: u64,
}

impl ReconcileTally {
    pub fn processed(&self) -> u64 {
        self.already_correct + self.corrected + self.created
    }

    fn absorb(&mut self, other: ReconcileTally) {
        self.already_correct += other.already_correct;
        self.corrected += other.corrected;
        self.created += other.created;
    }
}

/// Rounds a money value to cents, half away from zero.
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Net amount of a forecast line: gross minus discount, floored at zero.
pub fn net_amount(quantity: Decimal, unit_price: Decimal, discount: Decimal) -> Decimal {
    let net = round_to_cents(quantity * unit_price - discount);
    net.max(Decimal::ZERO)
}

/// Description prefix for the expense backing a forecast.
pub fn order_prefix(status: ForecastStatus, is_paid: bool) -> &'static str {
    match (status, is_paid) {
        (ForecastStatus::Delivered, _) => PREFIX_DELIVERED,
        (_, true) => PREFIX_PAID,
        (_, false) => PREFIX_PENDING,
    }
}

/// Expense status mirroring the same three-way rule as the prefix.
pub fn expected_status(status: ForecastStatus, is_paid: bool) -> ExpenseStatus {
    match (status, is_paid) {
        (ForecastStatus::Delivered, _) => ExpenseStatus::Delivered,
        (_, true) => ExpenseStatus::Paid,
        (_, false) => ExpenseStatus::Pending,
    }
}

/// Computes the full expected projection for a forecast.
pub fn expected_expense(forecast: &ForecastRow) -> ExpectedExpense {
    let discount = forecast.discount_value.unwrap_or(Decimal::ZERO);
    ExpectedExpense {
        description: format!(
            "{}: {}",
            order_prefix(forecast.status, forecast.is_paid),
            forecast.description
        ),
        status: expected_status(forecast.status, forecast.is_paid),
        is_paid: forecast.is_paid,
        quantity: forecast.quantity_needed,
        unit_price: forecast.unit_price,
        discount_value: discount,
        discount_percentage: forecast.discount_percentage.unwrap_or(Decimal::ZERO),
        amount: net_amount(forecast.quantity_needed, forecast.unit_price, discount),
        unit: forecast.unit.clone(),
        entity_name: forecast.supplier_name.clone(),
    }
}

/// An expense already in line with its forecast: quantity, unit price,
/// rounded amount and description all match exactly.
fn matches_expected(expense: &project_expense::Model, expected: &ExpectedExpense) -> bool {
    expense.quantity == expected.quantity
        && expense.unit_price == expected.unit_price
        && round_to_cents(expense.amount) == expected.amount
        && expense.description == expected.description
}

/// Looks for the legacy bug signature: an expense that belongs to a sibling
/// forecast of the same planning but carries this forecast's description
/// suffix. Reported only; the sibling's own pass will repair it.
fn find_misattributed<'a>(
    expenses: &'a [project_expense::Model],
    forecast: &ForecastRow,
    forecast_ids: &HashSet<Uuid>,
) -> Option<&'a project_expense::Model> {
    let suffix = format!(": {}", forecast.description);
    expenses.iter().find(|expense| {
        expense.description.ends_with(&suffix)
            && forecast_ids.contains(&expense.id)
            && expense.id != forecast.id
    })
}

/// Parent (financial grouping) for a newly created expense: the forecast's
/// category when set, otherwise the parent of a same-lot sibling's existing
/// expense, otherwise none.
fn resolve_parent_id(
    forecast: &ForecastRow,
    siblings: &[ForecastRow],
    expenses_by_id: &HashMap<Uuid, project_expense::Model>,
) -> Option<Uuid> {
    if forecast.category_id.is_some() {
        return forecast.category_id;
    }
    let group_id = forecast.supply_group_id?;
    siblings
        .iter()
        .filter(|sibling| sibling.id != forecast.id && sibling.supply_group_id == Some(group_id))
        .find_map(|sibling| expenses_by_id.get(&sibling.id))
        .and_then(|expense| expense.parent_id)
}

/// Date stamped on a created expense.
fn effective_date(forecast: &ForecastRow, today: NaiveDate) -> NaiveDate {
    forecast
        .purchase_date
        .or(forecast.estimated_date)
        .unwrap_or(today)
}

#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DbPool>,
}

impl ReconciliationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Runs the repair over every project and returns the global tally.
    #[instrument(skip(self))]
    pub async fn run(&self, mode: RunMode) -> Result<ReconcileTally, ServiceError> {
        let db = &*self.db;
        let projects = project::Entity::find().all(db).await?;
        info!(
            projects = projects.len(),
            preview = mode.is_preview(),
            "starting forecast/expense reconciliation"
        );

        let mut total = ReconcileTally::default();
        for proj in projects {
            let tally = self.reconcile_project(&proj, mode).await?;
            total.absorb(tally);
        }

        info!(
            already_correct = total.already_correct,
            corrected = total.corrected,
            created = total.created,
            processed = total.processed(),
            "reconciliation finished"
        );
        Ok(total)
    }

    /// Reconciles a single project. Projects without a planning or without
    /// non-pending forecasts are skipped.
    async fn reconcile_project(
        &self,
        proj: &project::Model,
        mode: RunMode,
    ) -> Result<ReconcileTally, ServiceError> {
        let db = &*self.db;
        let mut tally = ReconcileTally::default();

        let Some(plan) = planning::Entity::find()
            .filter(planning::Column::ProjectId.eq(proj.id))
            .one(db)
            .await?
        else {
            return Ok(tally);
        };

        let forecasts = self.load_forecasts(plan.id).await?;
        if forecasts.is_empty() {
            return Ok(tally);
        }

        let expenses = project_expense::Entity::find()
            .filter(project_expense::Column::ProjectId.eq(proj.id))
            .filter(project_expense::Column::ExpenseType.eq(EXPENSE_TYPE_MATERIAL))
            .filter(project_expense::Column::ItemType.eq(ITEM_TYPE_ITEM))
            .all(db)
            .await?;

        let expenses_by_id: HashMap<Uuid, project_expense::Model> =
            expenses.iter().map(|e| (e.id, e.clone())).collect();
        let forecast_ids: HashSet<Uuid> = forecasts.iter().map(|f| f.id).collect();

        for forecast in &forecasts {
            let expected = expected_expense(forecast);
            match expenses_by_id.get(&forecast.id) {
                Some(expense) if matches_expected(expense, &expected) => {
                    tally.already_correct += 1;
                }
                Some(expense) => {
                    info!(
                        project = %proj.name,
                        expense_id = %expense.id,
                        old_description = %expense.description,
                        new_description = %expected.description,
                        old_amount = %expense.amount,
                        new_amount = %expected.amount,
                        old_status = %expense.status,
                        new_status = %expected.status,
                        "expense out of sync with forecast"
                    );
                    if !mode.is_preview() {
                        self.apply_correction(expense, &expected).await?;
                    }
                    tally.corrected += 1;
                }
                None => {
                    if let Some(orphan) = find_misattributed(&expenses, forecast, &forecast_ids) {
                        warn!(
                            project = %proj.name,
                            forecast_id = %forecast.id,
                            orphan_expense_id = %orphan.id,
                            orphan_description = %orphan.description,
                            "expense misattributed to a sibling forecast; left for its own pass"
                        );
                    }
                    info!(
                        project = %proj.name,
                        forecast_id = %forecast.id,
                        lot = forecast.supply_group_title.as_deref().unwrap_or("-"),
                        description = %expected.description,
                        amount = %expected.amount,
                        "expense missing for forecast"
                    );
                    if !mode.is_preview() {
                        let parent_id = resolve_parent_id(forecast, &forecasts, &expenses_by_id);
                        self.create_expense(proj.id, forecast, &expected, parent_id)
                            .await?;
                    }
                    tally.created += 1;
                }
            }
        }

        info!(
            project = %proj.name,
            already_correct = tally.already_correct,
            corrected = tally.corrected,
            created = tally.created,
            "project reconciled"
        );
        Ok(tally)
    }

    /// Loads the planning's non-pending forecasts with supplier name and lot
    /// title joined in.
    async fn load_forecasts(&self, planning_id: Uuid) -> Result<Vec<ForecastRow>, ServiceError> {
        let rows = material_forecast::Entity::find()
            .filter(material_forecast::Column::PlanningId.eq(planning_id))
            .filter(material_forecast::Column::Status.ne(ForecastStatus::Pending))
            .left_join(supplier::Entity)
            .left_join(supply_group::Entity)
            .column_as(supplier::Column::Name, "supplier_name")
            .column_as(supply_group::Column::Title, "supply_group_title")
            .into_model::<ForecastRow>()
            .all(&*self.db)
            .await?;
        Ok(rows)
    }

    /// Overwrites the drifted fields of an existing expense. Identifier,
    /// project, parent, dates and payment proof stay untouched.
    async fn apply_correction(
        &self,
        expense: &project_expense::Model,
        expected: &ExpectedExpense,
    ) -> Result<(), ServiceError> {
        let mut active = expense.clone().into_active_model();
        active.description = Set(expected.description.clone());
        active.unit = Set(expected.unit.clone());
        active.quantity = Set(expected.quantity);
        active.unit_price = Set(expected.unit_price);
        active.discount_value = Set(expected.discount_value);
        active.discount_percentage = Set(expected.discount_percentage);
        active.amount = Set(expected.amount);
        active.is_paid = Set(expected.is_paid);
        active.status = Set(expected.status);
        active.entity_name = Set(expected
            .entity_name
            .clone()
            .or_else(|| expense.entity_name.clone()));
        active.update(&*self.db).await?;
        Ok(())
    }

    /// Creates the missing expense under the forecast's own id.
    async fn create_expense(
        &self,
        project_id: Uuid,
        forecast: &ForecastRow,
        expected: &ExpectedExpense,
        parent_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let today = Utc::now().date_naive();
        let date = effective_date(forecast, today);
        let expense = project_expense::ActiveModel {
            id: Set(forecast.id),
            project_id: Set(project_id),
            parent_id: Set(parent_id),
            expense_type: Set(EXPENSE_TYPE_MATERIAL.to_string()),
            item_type: Set(ITEM_TYPE_ITEM.to_string()),
            description: Set(expected.description.clone()),
            entity_name: Set(expected.entity_name.clone()),
            unit: Set(expected.unit.clone()),
            quantity: Set(expected.quantity),
            unit_price: Set(expected.unit_price),
            discount_value: Set(expected.discount_value),
            discount_percentage: Set(expected.discount_percentage),
            amount: Set(expected.amount),
            is_paid: Set(expected.is_paid),
            status: Set(expected.status),
            date: Set(date),
            payment_date: Set(expected.is_paid.then_some(date)),
            payment_proof: Set(None),
            delivery_date: Set(forecast.delivery_date),
            order_index: Set(0),
            wbs_path: Set(String::new()),
            invoice_document: Set(None),
            created_at: Set(Utc::now()),
        };
        expense.insert(&*self.db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn forecast_row(status: ForecastStatus, is_paid: bool) -> ForecastRow {
        ForecastRow {
            id: Uuid::new_v4(),
            planning_id: Uuid::new_v4(),
            status,
            is_paid,
            description: "Cimento CP-II 50kg".to_string(),
            quantity_needed: dec!(10),
            unit_price: dec!(12.345),
            discount_value: Some(dec!(1.23)),
            discount_percentage: None,
            unit: Some("saco".to_string()),
            supplier_id: None,
            supply_group_id: None,
            category_id: None,
            purchase_date: None,
            estimated_date: None,
            delivery_date: None,
            payment_proof: None,
            supplier_name: Some("Votoran".to_string()),
            supply_group_title: None,
        }
    }

    #[test_case(dec!(123.455), dec!(123.46) ; "half rounds away from zero")]
    #[test_case(dec!(123.454), dec!(123.45) ; "below half rounds down")]
    #[test_case(dec!(-2.005), dec!(-2.01) ; "negative half rounds away from zero")]
    #[test_case(dec!(7), dec!(7.00) ; "integers pass through")]
    fn rounding_to_cents(input: Decimal, expected: Decimal) {
        assert_eq!(round_to_cents(input), expected);
    }

    #[test]
    fn net_amount_rounds_after_discount() {
        // 10 * 12.345 = 123.45; minus 1.23 = 122.22
        assert_eq!(net_amount(dec!(10), dec!(12.345), dec!(1.23)), dec!(122.22));
    }

    #[test]
    fn net_amount_is_floored_at_zero() {
        assert_eq!(net_amount(dec!(1), dec!(5), dec!(9.99)), Decimal::ZERO);
    }

    #[test_case(ForecastStatus::Delivered, false, "Pedido Entregue", ExpenseStatus::Delivered)]
    #[test_case(ForecastStatus::Delivered, true, "Pedido Entregue", ExpenseStatus::Delivered)]
    #[test_case(ForecastStatus::Ordered, true, "Pedido Pago", ExpenseStatus::Paid)]
    #[test_case(ForecastStatus::Ordered, false, "Pedido Pendente", ExpenseStatus::Pending)]
    fn prefix_and_status_derivation(
        status: ForecastStatus,
        is_paid: bool,
        prefix: &str,
        expense_status: ExpenseStatus,
    ) {
        assert_eq!(order_prefix(status, is_paid), prefix);
        assert_eq!(expected_status(status, is_paid), expense_status);
    }

    #[test]
    fn expected_projection_combines_prefix_and_net_amount() {
        let forecast = forecast_row(ForecastStatus::Ordered, true);
        let expected = expected_expense(&forecast);
        assert_eq!(expected.description, "Pedido Pago: Cimento CP-II 50kg");
        assert_eq!(expected.amount, dec!(122.22));
        assert_eq!(expected.status, ExpenseStatus::Paid);
        assert_eq!(expected.entity_name.as_deref(), Some("Votoran"));
    }

    #[test]
    fn missing_discount_defaults_to_zero() {
        let mut forecast = forecast_row(ForecastStatus::Ordered, false);
        forecast.discount_value = None;
        let expected = expected_expense(&forecast);
        assert_eq!(expected.amount, dec!(123.45));
        assert_eq!(expected.discount_value, Decimal::ZERO);
    }

    #[test]
    fn run_mode_flag_parsing() {
        assert_eq!(RunMode::from_env_flag(Some("1")), RunMode::Preview);
        assert_eq!(RunMode::from_env_flag(Some("true")), RunMode::Preview);
        assert_eq!(RunMode::from_env_flag(Some("TRUE")), RunMode::Preview);
        assert_eq!(RunMode::from_env_flag(Some("0")), RunMode::Apply);
        assert_eq!(RunMode::from_env_flag(Some("yes")), RunMode::Apply);
        assert_eq!(RunMode::from_env_flag(None), RunMode::Apply);
    }

    #[test]
    fn effective_date_prefers_purchase_then_estimated() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut forecast = forecast_row(ForecastStatus::Ordered, false);
        assert_eq!(effective_date(&forecast, today), today);

        forecast.estimated_date = NaiveDate::from_ymd_opt(2025, 5, 10);
        assert_eq!(
            effective_date(&forecast, today),
            forecast.estimated_date.unwrap()
        );

        forecast.purchase_date = NaiveDate::from_ymd_opt(2025, 5, 2);
        assert_eq!(
            effective_date(&forecast, today),
            forecast.purchase_date.unwrap()
        );
    }

    #[test]
    fn parent_resolution_prefers_category() {
        let mut forecast = forecast_row(ForecastStatus::Ordered, false);
        let category = Uuid::new_v4();
        forecast.category_id = Some(category);
        forecast.supply_group_id = Some(Uuid::new_v4());
        assert_eq!(
            resolve_parent_id(&forecast, &[], &HashMap::new()),
            Some(category)
        );
    }

    #[test]
    fn parent_resolution_falls_back_to_lot_sibling() {
        let group = Uuid::new_v4();
        let parent = Uuid::new_v4();

        let mut forecast = forecast_row(ForecastStatus::Ordered, false);
        forecast.supply_group_id = Some(group);

        let mut sibling = forecast_row(ForecastStatus::Ordered, false);
        sibling.supply_group_id = Some(group);

        let sibling_expense = project_expense::Model {
            id: sibling.id,
            project_id: Uuid::new_v4(),
            parent_id: Some(parent),
            expense_type: "material".to_string(),
            item_type: "item".to_string(),
            description: "Pedido Pendente: Cimento CP-II 50kg".to_string(),
            entity_name: None,
            unit: None,
            quantity: dec!(1),
            unit_price: dec!(1),
            discount_value: Decimal::ZERO,
            discount_percentage: Decimal::ZERO,
            amount: dec!(1),
            is_paid: false,
            status: ExpenseStatus::Pending,
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            payment_date: None,
            payment_proof: None,
            delivery_date: None,
            order_index: 0,
            wbs_path: String::new(),
            invoice_document: None,
            created_at: Utc::now(),
        };
        let expenses_by_id = HashMap::from([(sibling.id, sibling_expense)]);
        let siblings = vec![forecast.clone(), sibling];

        assert_eq!(
            resolve_parent_id(&forecast, &siblings, &expenses_by_id),
            Some(parent)
        );
    }

    #[test]
    fn parent_resolution_defaults_to_none() {
        let forecast = forecast_row(ForecastStatus::Ordered, false);
        assert_eq!(resolve_parent_id(&forecast, &[], &HashMap::new()), None);
    }
}
