use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, SqlErr,
};

use crate::domain::{DomainError, DomainResult, User, UserRepositoryInterface, UserRole};
use crate::infrastructure::database::entities::user;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Patient => UserRole::Patient,
        user::UserRole::Doctor => UserRole::Doctor,
        user::UserRole::Admin => UserRole::Admin,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Patient => user::UserRole::Patient,
        UserRole::Doctor => user::UserRole::Doctor,
        UserRole::Admin => user::UserRole::Admin,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        is_verified: model.is_verified,
        is_active: model.is_active,
        first_name: model.first_name,
        last_name: model.last_name,
        specialization: model.specialization,
        phone: model.phone,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::ServiceUnavailable(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Oldest first, with the id as a tie-breaker so listings are stable.
fn ordered(query: Select<user::Entity>) -> Select<user::Entity> {
    query
        .order_by_asc(user::Column::CreatedAt)
        .order_by_asc(user::Column::Id)
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn insert(&self, user: User) -> DomainResult<User> {
        let new_user = user::ActiveModel {
            id: Set(user.id),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(domain_role_to_entity(user.role)),
            is_verified: Set(user.is_verified),
            is_active: Set(user.is_active),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            specialization: Set(user.specialization),
            phone: Set(user.phone),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };

        let model = new_user.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::validation("username", "A user with that username already exists.")
            } else {
                db_err(e)
            }
        })?;

        Ok(user_model_to_domain(model))
    }

    async fn list_all(&self) -> DomainResult<Vec<User>> {
        let models = ordered(user::Entity::find())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(user_model_to_domain).collect())
    }

    async fn filter_by_role(&self, role: UserRole, is_verified: bool) -> DomainResult<Vec<User>> {
        let query = user::Entity::find()
            .filter(user::Column::Role.eq(domain_role_to_entity(role)))
            .filter(user::Column::IsVerified.eq(is_verified));

        let models = ordered(query).all(&self.db).await.map_err(db_err)?;

        Ok(models.into_iter().map(user_model_to_domain).collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let query = user::Entity::find().filter(user::Column::Email.eq(email));

        let model = ordered(query).one(&self.db).await.map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use crate::infrastructure::database::{init_database, DatabaseConfig};

    async fn repo() -> UserRepository {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        UserRepository::new(db)
    }

    fn user(username: &str, email: &str, role: UserRole, is_verified: bool) -> User {
        let now = Utc::now();
        User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
            is_verified,
            is_active: true,
            first_name: String::new(),
            last_name: String::new(),
            specialization: None,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let repo = repo().await;
        let mut alice = user("alice", "alice@x.com", UserRole::Doctor, true);
        alice.specialization = Some("Cardiologist".into());
        let id = alice.id.clone();

        repo.insert(alice).await.unwrap();

        let by_id = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.role, UserRole::Doctor);
        assert_eq!(by_id.specialization.as_deref(), Some("Cardiologist"));

        let by_name = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert!(repo.find_by_username("alice@x.com").await.unwrap().is_none());
    }

    #[test]
    fn only_classified_unique_violations_count() {
        assert!(!is_unique_violation(&DbErr::Custom(
            "UNIQUE constraint failed: users.username".into()
        )));
        assert!(!is_unique_violation(&DbErr::RecordNotInserted));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_validation_error() {
        let repo = repo().await;
        repo.insert(user("alice", "alice@x.com", UserRole::Patient, false))
            .await
            .unwrap();

        let err = repo
            .insert(user("alice", "other@x.com", UserRole::Patient, false))
            .await
            .unwrap_err();

        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, "username"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn doctors_filter_requires_role_and_verification() {
        let repo = repo().await;
        repo.insert(user("alice", "alice@x.com", UserRole::Doctor, true)).await.unwrap();
        repo.insert(user("bob", "bob@x.com", UserRole::Doctor, false)).await.unwrap();
        repo.insert(user("carol", "carol@x.com", UserRole::Patient, true)).await.unwrap();

        let doctors = repo.filter_by_role(UserRole::Doctor, true).await.unwrap();
        let names: Vec<_> = doctors.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice"]);
    }

    #[tokio::test]
    async fn email_lookup_is_exact_and_prefers_oldest_account() {
        let repo = repo().await;
        let mut older = user("first", "shared@x.com", UserRole::Patient, false);
        older.created_at = Utc::now() - Duration::hours(1);
        repo.insert(user("second", "shared@x.com", UserRole::Patient, false))
            .await
            .unwrap();
        repo.insert(older).await.unwrap();

        let found = repo.find_by_email("shared@x.com").await.unwrap().unwrap();
        assert_eq!(found.username, "first");
        assert!(repo.find_by_email("SHARED@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_all_is_stable_without_writes() {
        let repo = repo().await;
        repo.insert(user("alice", "alice@x.com", UserRole::Doctor, true)).await.unwrap();
        repo.insert(user("bob", "bob@x.com", UserRole::Patient, false)).await.unwrap();

        let first: Vec<_> = repo.list_all().await.unwrap().into_iter().map(|u| u.id).collect();
        let second: Vec<_> = repo.list_all().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
