use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use slog::{o, Logger};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{AccessToken, TokenIssuer},
    db::DbPool,
    entities::{demo, erp_user, erp_user_role, retailer},
    errors::ServiceError,
    services::{
        credentials::{self, Credentials, ManagerKind},
        seeding::{self, ResetReport, SeedReport},
    },
};

/// Longest accepted demo name
pub const MAX_DEMO_NAME_LEN: usize = 255;

/// An ERP user together with its role assignments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserWithRoles {
    pub user: erp_user::Model,
    pub roles: Vec<erp_user_role::Model>,
}

impl UserWithRoles {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.role.clone()).collect()
    }
}

/// A demo with every user it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoWithUsers {
    pub demo: demo::Model,
    pub users: Vec<UserWithRoles>,
}

/// Lifecycle of demo sandboxes: seeding, creation, lookup, impersonation
/// and teardown.
#[derive(Clone)]
pub struct DemoService {
    db_pool: Arc<DbPool>,
    tokens: Arc<dyn TokenIssuer>,
    seed_dir: PathBuf,
    logger: Logger,
}

impl DemoService {
    pub fn new(
        db_pool: Arc<DbPool>,
        tokens: Arc<dyn TokenIssuer>,
        seed_dir: impl Into<PathBuf>,
        logger: Logger,
    ) -> Self {
        Self {
            db_pool,
            tokens,
            seed_dir: seed_dir.into(),
            logger: logger.new(o!("component" => "demos")),
        }
    }

    /// Loads reference data into every empty table
    #[instrument(skip(self))]
    pub async fn seed_all(&self) -> Result<SeedReport, ServiceError> {
        let report = seeding::seed_tables(&self.db_pool, &self.seed_dir).await?;

        counter!("scm_demo.seed.rows_inserted", report.total_inserted());
        slog::info!(self.logger, "Reference data seeded";
            "inserted" => report.total_inserted(),
            "seed_dir" => %self.seed_dir.display());
        Ok(report)
    }

    /// Wipes every managed table, demos and users included
    #[instrument(skip(self))]
    pub async fn reset_all(&self) -> Result<ResetReport, ServiceError> {
        let report = seeding::reset_tables(&self.db_pool).await?;

        counter!("scm_demo.reset.rows_deleted", report.total_deleted());
        slog::warn!(self.logger, "All demo data reset"; "deleted" => report.total_deleted());
        Ok(report)
    }

    /// Creates a demo, binds its guid and provisions its supply chain manager
    #[instrument(skip(self))]
    pub async fn create_demo(&self, name: &str) -> Result<DemoWithUsers, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Demo name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_DEMO_NAME_LEN {
            return Err(ServiceError::ValidationError(format!(
                "Demo name must be at most {} characters",
                MAX_DEMO_NAME_LEN
            )));
        }

        let db = &*self.db_pool;
        let demo = demo::ActiveModel {
            name: Set(name.to_string()),
            guid: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let guid = credentials::make_demo_guid(demo.id, &demo.created_at)?;
        let mut active: demo::ActiveModel = demo.into();
        active.guid = Set(Some(guid));
        let demo = active.update(db).await?;

        let manager = self.create_user(demo.id, ManagerKind::SupplyChain).await?;

        counter!("scm_demo.demos.created", 1);
        info!(demo_id = demo.id, "Demo created");
        slog::info!(self.logger, "Demo created";
            "demo_id" => demo.id,
            "name" => &demo.name,
            "manager_id" => manager.user.id);

        Ok(DemoWithUsers {
            demo,
            users: vec![manager],
        })
    }

    /// Demo with its users and roles
    #[instrument(skip(self))]
    pub async fn find_by_guid(&self, guid: &str) -> Result<DemoWithUsers, ServiceError> {
        let demo = self.demo_by_guid(guid).await?;
        let users = self.users_with_roles(demo.id).await?;
        Ok(DemoWithUsers { demo, users })
    }

    /// Retailers the demo can see: its own plus the unclaimed ones
    #[instrument(skip(self))]
    pub async fn list_retailers(&self, guid: &str) -> Result<Vec<retailer::Model>, ServiceError> {
        let demo = self.demo_by_guid(guid).await?;

        let retailers = retailer::Entity::find()
            .filter(
                Condition::any()
                    .add(retailer::Column::DemoId.eq(demo.id))
                    .add(retailer::Column::DemoId.is_null()),
            )
            .order_by_asc(retailer::Column::Id)
            .all(&*self.db_pool)
            .await?;

        Ok(retailers)
    }

    /// Issues an access token for one of the demo's users
    #[instrument(skip(self))]
    pub async fn login_as(&self, guid: &str, user_id: i32) -> Result<AccessToken, ServiceError> {
        let demo = self.demo_by_guid(guid).await?;

        let user = erp_user::Entity::find_by_id(user_id)
            .filter(erp_user::Column::DemoId.eq(demo.id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No user with this id".to_string()))?;

        let roles: Vec<String> = self
            .roles_for(&[user.id])
            .await?
            .remove(&user.id)
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.role)
            .collect();

        let token = self.tokens.issue_access_token(&user, &roles).await?;

        counter!("scm_demo.demos.logins", 1);
        slog::info!(self.logger, "Logged in as demo user";
            "demo_id" => demo.id,
            "user_id" => user.id);
        Ok(token)
    }

    /// Destroys the demo, then every user it owns
    #[instrument(skip(self))]
    pub async fn delete_by_guid(&self, guid: &str) -> Result<(), ServiceError> {
        let demo = self.demo_by_guid(guid).await?;

        demo::Entity::delete_by_id(demo.id)
            .exec(&*self.db_pool)
            .await?;

        counter!("scm_demo.demos.deleted", 1);
        slog::info!(self.logger, "Demo deleted"; "demo_id" => demo.id);

        self.after_demo_deleted(demo.id).await
    }

    /// Creates a retail store manager in the demo and assigns it to the retailer
    #[instrument(skip(self))]
    pub async fn create_retail_manager_by_guid(
        &self,
        guid: &str,
        retailer_id: i32,
    ) -> Result<UserWithRoles, ServiceError> {
        let demo = self.demo_by_guid(guid).await?;
        let db = &*self.db_pool;

        let store = retailer::Entity::find_by_id(retailer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No retailer with this id".to_string()))?;

        if store.demo_id.is_some_and(|owner| owner != demo.id) {
            return Err(ServiceError::InvalidState(
                "Demo id does not match the one from the retail store".to_string(),
            ));
        }

        let manager = self.create_user(demo.id, ManagerKind::RetailStore).await?;

        let mut active: retailer::ActiveModel = store.into();
        active.manager_id = Set(Some(manager.user.id));
        active.update(db).await?;

        counter!("scm_demo.retail_managers.created", 1);
        slog::info!(self.logger, "Retail store manager created";
            "demo_id" => demo.id,
            "retailer_id" => retailer_id,
            "user_id" => manager.user.id);

        Ok(manager)
    }

    /// Post-delete hook: removes every user of a destroyed demo, clearing
    /// the retailers they managed first.
    ///
    /// Keeps going when a user cannot be removed and reports all of them at
    /// the end.
    pub async fn after_demo_deleted(&self, demo_id: i32) -> Result<(), ServiceError> {
        let users = erp_user::Entity::find()
            .filter(erp_user::Column::DemoId.eq(demo_id))
            .order_by_asc(erp_user::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let mut failed_user_ids = Vec::new();
        for user in users {
            if let Err(e) = self.destroy_user(user.id).await {
                error!(demo_id, user_id = user.id, error = %e, "Failed to remove demo user");
                slog::error!(self.logger, "Failed to remove demo user";
                    "demo_id" => demo_id,
                    "user_id" => user.id,
                    "error" => %e);
                counter!("scm_demo.cascade.failures", 1);
                failed_user_ids.push(user.id);
            }
        }

        if failed_user_ids.is_empty() {
            Ok(())
        } else {
            warn!(demo_id, failed = failed_user_ids.len(), "Demo cascade incomplete");
            Err(ServiceError::CascadeIncomplete {
                demo_id,
                failed_user_ids,
            })
        }
    }

    async fn destroy_user(&self, user_id: i32) -> Result<(), DbErr> {
        let db = &*self.db_pool;
        // stores it managed go back to having no manager
        retailer::Entity::update_many()
            .col_expr(retailer::Column::ManagerId, Expr::value(Option::<i32>::None))
            .filter(retailer::Column::ManagerId.eq(user_id))
            .exec(db)
            .await?;
        erp_user_role::Entity::delete_many()
            .filter(erp_user_role::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        erp_user::Entity::delete_by_id(user_id).exec(db).await?;
        Ok(())
    }

    async fn demo_by_guid(&self, guid: &str) -> Result<demo::Model, ServiceError> {
        demo::Entity::find()
            .filter(demo::Column::Guid.eq(guid))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(ServiceError::demo_not_found)
    }

    async fn create_user(
        &self,
        demo_id: i32,
        kind: ManagerKind,
    ) -> Result<UserWithRoles, ServiceError> {
        let db = &*self.db_pool;
        let creds = Credentials::generate(kind);
        let password = credentials::hash_password(&creds.password)?;

        let user = erp_user::ActiveModel {
            email: Set(creds.email),
            username: Set(creds.username),
            password: Set(password),
            demo_id: Set(demo_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let role = erp_user_role::ActiveModel {
            user_id: Set(user.id),
            role: Set(kind.role().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(UserWithRoles {
            user,
            roles: vec![role],
        })
    }

    async fn users_with_roles(&self, demo_id: i32) -> Result<Vec<UserWithRoles>, ServiceError> {
        let users = erp_user::Entity::find()
            .filter(erp_user::Column::DemoId.eq(demo_id))
            .order_by_asc(erp_user::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let mut roles = self.roles_for(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let roles = roles.remove(&user.id).unwrap_or_default();
                UserWithRoles { user, roles }
            })
            .collect())
    }

    async fn roles_for(
        &self,
        user_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<erp_user_role::Model>>, ServiceError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = erp_user_role::Entity::find()
            .filter(erp_user_role::Column::UserId.is_in(user_ids.iter().copied()))
            .order_by_asc(erp_user_role::Column::Id)
            .all(&*self.db_pool)
            .await?;

        let mut grouped: HashMap<i32, Vec<erp_user_role::Model>> = HashMap::new();
        for row in rows {
            grouped.entry(row.user_id).or_default().push(row);
        }
        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, AuthService, RETAIL_STORE_MANAGER_ROLE, SUPPLY_CHAIN_MANAGER_ROLE};
    use crate::logging::discard_logger;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use sea_orm::{ConnectionTrait, Database, PaginatorTrait};
    use std::time::Duration;

    async fn service() -> DemoService {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        let auth = AuthService::new(AuthConfig::new(
            "a_sufficiently_long_signing_secret_for_tests_0123456789".into(),
            "scm-erp".into(),
            "scm-demo".into(),
            Duration::from_secs(60),
        ));
        DemoService::new(Arc::new(db), Arc::new(auth), "seed", discard_logger())
    }

    async fn insert_retailer(svc: &DemoService, id: i32, demo_id: Option<i32>) {
        retailer::ActiveModel {
            id: Set(id),
            street: Set("1 Main St".into()),
            city: Set("Austin".into()),
            state: Set("TX".into()),
            country: Set("USA".into()),
            latitude: Set(30.0),
            longitude: Set(-97.0),
            demo_id: Set(demo_id),
            manager_id: Set(None),
        }
        .insert(&*svc.db_pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn create_demo_provisions_supply_chain_manager() {
        let svc = service().await;
        let created = svc.create_demo("Acme").await.unwrap();

        assert_eq!(created.demo.name, "Acme");
        assert!(created.demo.guid.as_deref().is_some_and(|g| !g.is_empty()));
        assert_eq!(created.users.len(), 1);
        assert_eq!(
            created.users[0].role_names(),
            vec![SUPPLY_CHAIN_MANAGER_ROLE.to_string()]
        );
        assert!(created.users[0]
            .user
            .username
            .starts_with("Supply Chain Manager ("));
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let svc = service().await;
        assert_matches!(
            svc.create_demo("   ").await,
            Err(ServiceError::ValidationError(_))
        );
        let too_long = "x".repeat(MAX_DEMO_NAME_LEN + 1);
        assert_matches!(
            svc.create_demo(&too_long).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn retail_manager_rejected_for_foreign_retailer() {
        let svc = service().await;
        let created = svc.create_demo("Acme").await.unwrap();
        let guid = created.demo.guid.clone().unwrap();
        insert_retailer(&svc, 1, Some(created.demo.id + 100)).await;

        assert_matches!(
            svc.create_retail_manager_by_guid(&guid, 1).await,
            Err(ServiceError::InvalidState(msg))
                if msg == "Demo id does not match the one from the retail store"
        );
        assert_matches!(
            svc.create_retail_manager_by_guid(&guid, 99).await,
            Err(ServiceError::NotFound(msg)) if msg == "No retailer with this id"
        );
    }

    #[tokio::test]
    async fn retail_manager_assigned_to_unclaimed_retailer() {
        let svc = service().await;
        let created = svc.create_demo("Acme").await.unwrap();
        let guid = created.demo.guid.clone().unwrap();
        insert_retailer(&svc, 5, None).await;

        let manager = svc.create_retail_manager_by_guid(&guid, 5).await.unwrap();
        assert_eq!(
            manager.role_names(),
            vec![RETAIL_STORE_MANAGER_ROLE.to_string()]
        );
        assert_eq!(manager.user.demo_id, created.demo.id);

        let store = retailer::Entity::find_by_id(5)
            .one(&*svc.db_pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.manager_id, Some(manager.user.id));
        assert_eq!(store.demo_id, None);
    }

    #[tokio::test]
    async fn cascade_reports_users_it_could_not_remove() {
        let svc = service().await;
        let created = svc.create_demo("Acme").await.unwrap();
        let guid = created.demo.guid.clone().unwrap();
        let user_id = created.users[0].user.id;

        svc.db_pool
            .execute_unprepared("DROP TABLE erp_user_roles")
            .await
            .unwrap();

        let err = svc.delete_by_guid(&guid).await.unwrap_err();
        assert_matches!(
            err,
            ServiceError::CascadeIncomplete { demo_id, failed_user_ids }
                if demo_id == created.demo.id && failed_user_ids == vec![user_id]
        );

        // the demo itself is gone even though its user survived
        assert_matches!(svc.find_by_guid(&guid).await, Err(ServiceError::NotFound(_)));
        assert_eq!(erp_user::Entity::find().count(&*svc.db_pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cascade_releases_managed_retailers() {
        let svc = service().await;
        let created = svc.create_demo("Acme").await.unwrap();
        let other = svc.create_demo("Other").await.unwrap();
        insert_retailer(&svc, 1, None).await;
        insert_retailer(&svc, 2, Some(other.demo.id)).await;

        let guid = created.demo.guid.clone().unwrap();
        svc.create_retail_manager_by_guid(&guid, 1).await.unwrap();
        let kept = svc
            .create_retail_manager_by_guid(other.demo.guid.as_deref().unwrap(), 2)
            .await
            .unwrap();

        svc.delete_by_guid(&guid).await.unwrap();

        let stores = retailer::Entity::find()
            .order_by_asc(retailer::Column::Id)
            .all(&*svc.db_pool)
            .await
            .unwrap();
        assert_eq!(stores[0].manager_id, None);
        assert_eq!(stores[1].manager_id, Some(kept.user.id));
    }

    #[rstest]
    #[case("Acme")]
    #[case("  padded name  ")]
    #[case("Ünïcødé Démo ✓")]
    #[case("x")]
    #[tokio::test]
    async fn any_valid_name_gets_unique_guid_and_one_manager(#[case] name: &str) {
        let svc = service().await;
        let first = svc.create_demo(name).await.unwrap();
        let second = svc.create_demo(name).await.unwrap();

        assert_eq!(first.demo.name, name.trim());
        assert_ne!(first.demo.guid, second.demo.guid);
        for created in [&first, &second] {
            assert!(created.demo.guid.as_deref().is_some_and(|g| !g.is_empty()));
            assert_eq!(created.users.len(), 1);
            assert_eq!(
                created.users[0].role_names(),
                vec![SUPPLY_CHAIN_MANAGER_ROLE.to_string()]
            );
        }
    }
}
