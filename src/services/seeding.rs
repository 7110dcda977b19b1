//! First-run bootstrap: tenant instance, permission catalog, roles and the
//! administrator account. Every step is find-by-unique-key then create, so
//! re-running against a seeded database changes nothing.

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{instance, permission, role, role_permission, user};
use crate::errors::ServiceError;

pub const DEFAULT_INSTANCE_SLUG: &str = "matriz";
pub const DEFAULT_INSTANCE_NAME: &str = "Matriz";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@obraflow.com.br";

const ADMIN_ROLE_SLUG: &str = "administrador";
const COLLABORATOR_ROLE_SLUG: &str = "colaborador";

/// Permission catalog seeded for every fresh instance.
const PERMISSIONS: &[(&str, &str)] = &[
    ("projects.read", "Visualizar obras"),
    ("projects.write", "Gerenciar obras"),
    ("plannings.read", "Visualizar planejamentos"),
    ("plannings.write", "Gerenciar planejamentos"),
    ("forecasts.read", "Visualizar previsões de material"),
    ("forecasts.write", "Gerenciar previsões de material"),
    ("expenses.read", "Visualizar despesas"),
    ("expenses.write", "Gerenciar despesas"),
    ("reports.read", "Visualizar relatórios"),
    ("users.admin", "Administrar usuários"),
];

/// Slugs granted to the read-only collaborator role.
const COLLABORATOR_PERMISSIONS: &[&str] = &[
    "projects.read",
    "plannings.read",
    "forecasts.read",
    "expenses.read",
    "reports.read",
];

/// Input for one seeding run.
#[derive(Debug, Clone)]
pub struct SeedParams {
    pub instance_name: String,
    pub instance_slug: String,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            instance_slug: DEFAULT_INSTANCE_SLUG.to_string(),
            admin_name: "Administrador".to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: Uuid::new_v4().simple().to_string(),
        }
    }
}

/// Created-versus-reused counts for one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeedReport {
    pub instances_created: u64,
    pub permissions_created: u64,
    pub roles_created: u64,
    pub role_permissions_created: u64,
    pub users_created: u64,
}

impl SeedReport {
    pub fn created_anything(&self) -> bool {
        self.instances_created
            + self.permissions_created
            + self.roles_created
            + self.role_permissions_created
            + self.users_created
            > 0
    }
}

#[derive(Clone)]
pub struct SeedService {
    db: Arc<DbPool>,
}

impl SeedService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Seeds the instance, permissions, roles and administrator user.
    #[instrument(skip(self, params))]
    pub async fn run(&self, params: &SeedParams) -> Result<SeedReport, ServiceError> {
        let mut report = SeedReport::default();

        let inst = self.ensure_instance(params, &mut report).await?;
        let permissions = self.ensure_permissions(&mut report).await?;

        let admin_role = self
            .ensure_role(inst.id, "Administrador", ADMIN_ROLE_SLUG, &mut report)
            .await?;
        let collaborator_role = self
            .ensure_role(inst.id, "Colaborador", COLLABORATOR_ROLE_SLUG, &mut report)
            .await?;

        let all_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
        let collaborator_ids: Vec<Uuid> = permissions
            .iter()
            .filter(|p| COLLABORATOR_PERMISSIONS.contains(&p.slug.as_str()))
            .map(|p| p.id)
            .collect();

        self.ensure_role_permissions(admin_role.id, &all_ids, &mut report)
            .await?;
        self.ensure_role_permissions(collaborator_role.id, &collaborator_ids, &mut report)
            .await?;

        self.ensure_admin_user(inst.id, admin_role.id, params, &mut report)
            .await?;

        info!(
            instances_created = report.instances_created,
            permissions_created = report.permissions_created,
            roles_created = report.roles_created,
            role_permissions_created = report.role_permissions_created,
            users_created = report.users_created,
            "seeding finished"
        );
        Ok(report)
    }

    async fn ensure_instance(
        &self,
        params: &SeedParams,
        report: &mut SeedReport,
    ) -> Result<instance::Model, ServiceError> {
        let db = &*self.db;
        if let Some(existing) = instance::Entity::find()
            .filter(instance::Column::Slug.eq(params.instance_slug.as_str()))
            .one(db)
            .await?
        {
            info!(slug = %existing.slug, "instance already present");
            return Ok(existing);
        }

        let created = instance::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(params.instance_name.clone()),
            slug: Set(params.instance_slug.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        report.instances_created += 1;
        info!(slug = %created.slug, "instance created");
        Ok(created)
    }

    async fn ensure_permissions(
        &self,
        report: &mut SeedReport,
    ) -> Result<Vec<permission::Model>, ServiceError> {
        let db = &*self.db;
        let mut out = Vec::with_capacity(PERMISSIONS.len());
        for (slug, label) in PERMISSIONS {
            let existing = permission::Entity::find()
                .filter(permission::Column::Slug.eq(*slug))
                .one(db)
                .await?;
            let model = match existing {
                Some(model) => model,
                None => {
                    let created = permission::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        slug: Set(slug.to_string()),
                        label: Set(label.to_string()),
                    }
                    .insert(db)
                    .await?;
                    report.permissions_created += 1;
                    created
                }
            };
            out.push(model);
        }
        Ok(out)
    }

    async fn ensure_role(
        &self,
        instance_id: Uuid,
        name: &str,
        slug: &str,
        report: &mut SeedReport,
    ) -> Result<role::Model, ServiceError> {
        let db = &*self.db;
        if let Some(existing) = role::Entity::find()
            .filter(role::Column::InstanceId.eq(instance_id))
            .filter(role::Column::Slug.eq(slug))
            .one(db)
            .await?
        {
            return Ok(existing);
        }

        let created = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            instance_id: Set(instance_id),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
        }
        .insert(db)
        .await?;
        report.roles_created += 1;
        info!(role = slug, "role created");
        Ok(created)
    }

    async fn ensure_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
        report: &mut SeedReport,
    ) -> Result<(), ServiceError> {
        let db = &*self.db;
        for permission_id in permission_ids {
            let existing = role_permission::Entity::find_by_id((role_id, *permission_id))
                .one(db)
                .await?;
            if existing.is_some() {
                continue;
            }
            role_permission::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
            }
            .insert(db)
            .await?;
            report.role_permissions_created += 1;
        }
        Ok(())
    }

    async fn ensure_admin_user(
        &self,
        instance_id: Uuid,
        role_id: Uuid,
        params: &SeedParams,
        report: &mut SeedReport,
    ) -> Result<user::Model, ServiceError> {
        let db = &*self.db;
        if let Some(existing) = user::Entity::find()
            .filter(user::Column::Email.eq(params.admin_email.as_str()))
            .one(db)
            .await?
        {
            info!(email = %existing.email, "administrator already present");
            return Ok(existing);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(params.admin_password.as_bytes(), &salt)?
            .to_string();

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            instance_id: Set(instance_id),
            role_id: Set(role_id),
            name: Set(params.admin_name.clone()),
            email: Set(params.admin_email.clone()),
            password_hash: Set(password_hash),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        report.users_created += 1;
        info!(email = %created.email, "administrator created");
        Ok(created)
    }
}
