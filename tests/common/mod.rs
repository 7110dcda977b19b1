//! Shared harness for integration tests: an in-memory SQLite database with
//! the application schema plus fixture builders.
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend, Set, Statement,
};
use uuid::Uuid;

use obraflow_admin::entities::{
    material_forecast::{self, ForecastStatus},
    planning, project,
    project_expense::{self, ExpenseStatus},
    supplier, supply_group,
};

const SCHEMA: &[&str] = &[
    "CREATE TABLE instances (
        id uuid PRIMARY KEY,
        name text NOT NULL,
        slug text NOT NULL UNIQUE,
        created_at text NOT NULL
    )",
    "CREATE TABLE permissions (
        id uuid PRIMARY KEY,
        slug text NOT NULL UNIQUE,
        label text NOT NULL
    )",
    "CREATE TABLE roles (
        id uuid PRIMARY KEY,
        instance_id uuid NOT NULL,
        name text NOT NULL,
        slug text NOT NULL
    )",
    "CREATE TABLE role_permissions (
        role_id uuid NOT NULL,
        permission_id uuid NOT NULL,
        PRIMARY KEY (role_id, permission_id)
    )",
    "CREATE TABLE users (
        id uuid PRIMARY KEY,
        instance_id uuid NOT NULL,
        role_id uuid NOT NULL,
        name text NOT NULL,
        email text NOT NULL UNIQUE,
        password_hash text NOT NULL,
        is_active boolean NOT NULL,
        created_at text NOT NULL
    )",
    "CREATE TABLE projects (
        id uuid PRIMARY KEY,
        instance_id uuid NOT NULL,
        name text NOT NULL,
        created_at text NOT NULL
    )",
    "CREATE TABLE plannings (
        id uuid PRIMARY KEY,
        project_id uuid NOT NULL,
        created_at text NOT NULL
    )",
    "CREATE TABLE suppliers (
        id uuid PRIMARY KEY,
        name text NOT NULL
    )",
    "CREATE TABLE supply_groups (
        id uuid PRIMARY KEY,
        planning_id uuid NOT NULL,
        title text NOT NULL
    )",
    "CREATE TABLE material_forecasts (
        id uuid PRIMARY KEY,
        planning_id uuid NOT NULL,
        status text NOT NULL,
        is_paid boolean NOT NULL,
        description text NOT NULL,
        quantity_needed real NOT NULL,
        unit_price real NOT NULL,
        discount_value real,
        discount_percentage real,
        unit text,
        supplier_id uuid,
        supply_group_id uuid,
        category_id uuid,
        purchase_date text,
        estimated_date text,
        delivery_date text,
        payment_proof text,
        created_at text NOT NULL
    )",
    "CREATE TABLE project_expenses (
        id uuid PRIMARY KEY,
        project_id uuid NOT NULL,
        parent_id uuid,
        expense_type text NOT NULL,
        item_type text NOT NULL,
        description text NOT NULL,
        entity_name text,
        unit text,
        quantity real NOT NULL,
        unit_price real NOT NULL,
        discount_value real NOT NULL,
        discount_percentage real NOT NULL,
        amount real NOT NULL,
        is_paid boolean NOT NULL,
        status text NOT NULL,
        date text NOT NULL,
        payment_date text,
        payment_proof text,
        delivery_date text,
        order_index integer NOT NULL,
        wbs_path text NOT NULL,
        invoice_document text,
        created_at text NOT NULL
    )",
];

/// Fresh in-memory database with the full schema.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");
    for ddl in SCHEMA {
        db.execute(Statement::from_string(DbBackend::Sqlite, *ddl))
            .await
            .expect("schema statement should apply");
    }
    db
}

pub async fn insert_project(db: &DatabaseConnection, name: &str) -> project::Model {
    project::ActiveModel {
        id: Set(Uuid::new_v4()),
        instance_id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("project insert")
}

pub async fn insert_planning(db: &DatabaseConnection, project_id: Uuid) -> planning::Model {
    planning::ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("planning insert")
}

pub async fn insert_supplier(db: &DatabaseConnection, name: &str) -> supplier::Model {
    supplier::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    }
    .insert(db)
    .await
    .expect("supplier insert")
}

pub async fn insert_supply_group(
    db: &DatabaseConnection,
    planning_id: Uuid,
    title: &str,
) -> supply_group::Model {
    supply_group::ActiveModel {
        id: Set(Uuid::new_v4()),
        planning_id: Set(planning_id),
        title: Set(title.to_string()),
    }
    .insert(db)
    .await
    .expect("supply group insert")
}

/// A non-pending forecast with sensible defaults: ordered, unpaid, qty 2 at
/// 10.00 with no discount. Tests override fields before inserting.
pub fn forecast_fixture(planning_id: Uuid, description: &str) -> material_forecast::ActiveModel {
    material_forecast::ActiveModel {
        id: Set(Uuid::new_v4()),
        planning_id: Set(planning_id),
        status: Set(ForecastStatus::Ordered),
        is_paid: Set(false),
        description: Set(description.to_string()),
        quantity_needed: Set(dec!(2)),
        unit_price: Set(dec!(10)),
        discount_value: Set(None),
        discount_percentage: Set(None),
        unit: Set(Some("un".to_string())),
        supplier_id: Set(None),
        supply_group_id: Set(None),
        category_id: Set(None),
        purchase_date: Set(None),
        estimated_date: Set(None),
        delivery_date: Set(None),
        payment_proof: Set(None),
        created_at: Set(Utc::now()),
    }
}

/// An expense row matching the `forecast_fixture` defaults exactly
/// (description prefix "Pedido Pendente", amount 20.00). Tests override
/// fields to make it drift.
pub fn expense_fixture(
    id: Uuid,
    project_id: Uuid,
    description: &str,
) -> project_expense::ActiveModel {
    project_expense::ActiveModel {
        id: Set(id),
        project_id: Set(project_id),
        parent_id: Set(None),
        expense_type: Set("material".to_string()),
        item_type: Set("item".to_string()),
        description: Set(format!("Pedido Pendente: {description}")),
        entity_name: Set(None),
        unit: Set(Some("un".to_string())),
        quantity: Set(dec!(2)),
        unit_price: Set(dec!(10)),
        discount_value: Set(Decimal::ZERO),
        discount_percentage: Set(Decimal::ZERO),
        amount: Set(dec!(20)),
        is_paid: Set(false),
        status: Set(ExpenseStatus::Pending),
        date: Set(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
        payment_date: Set(None),
        payment_proof: Set(None),
        delivery_date: Set(None),
        order_index: Set(0),
        wbs_path: Set(String::new()),
        invoice_document: Set(None),
        created_at: Set(Utc::now()),
    }
}

pub async fn load_expense(db: &DatabaseConnection, id: Uuid) -> Option<project_expense::Model> {
    use sea_orm::EntityTrait;
    project_expense::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("expense lookup")
}

pub async fn count_expenses(db: &DatabaseConnection) -> u64 {
    use sea_orm::{EntityTrait, PaginatorTrait};
    project_expense::Entity::find()
        .count(db)
        .await
        .expect("expense count")
}
