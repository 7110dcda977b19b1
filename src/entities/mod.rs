pub mod instance;
pub mod material_forecast;
pub mod permission;
pub mod planning;
pub mod project;
pub mod project_expense;
pub mod role;
pub mod role_permission;
pub mod supplier;
pub mod supply_group;
pub mod user;
