//! User repository for database operations.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::UserDbModel;

/// User repository trait for user data access operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user.
    ///
    /// A duplicate email surfaces as a UNIQUE violation
    /// (see [`crate::Error::is_unique_violation`]).
    async fn create(&self, user: &UserDbModel) -> Result<()>;

    /// Find a user by their unique ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserDbModel>>;

    /// Find a user by their email address (exact, case-sensitive match).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDbModel>>;

    /// Update a user's name and email. Returns `false` when no row matched.
    async fn update_profile(&self, id: &str, name: &str, email: &str) -> Result<bool>;

    /// Replace a user's password hash. Returns `false` when no row matched.
    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool>;
}

/// SQLx implementation of UserRepository.
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    /// Create a new SqlxUserRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &UserDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserDbModel>> {
        let user = sqlx::query_as::<_, UserDbModel>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDbModel>> {
        let user = sqlx::query_as::<_, UserDbModel>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: &str, name: &str, email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(email)
            .bind(crate::database::time::now_ms())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(crate::database::time::now_ms())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{init_pool_with_size, run_migrations};

    async fn setup_repo() -> SqlxUserRepository {
        let pool = init_pool_with_size("sqlite::memory:", 1)
            .await
            .expect("pool");
        run_migrations(&pool).await.expect("migrations");
        SqlxUserRepository::new(pool)
    }

    async fn user_count(repo: &SqlxUserRepository) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = setup_repo().await;
        let user = UserDbModel::new("Alice", "a@x.com", "hash");
        repo.create(&user).await.unwrap();

        let by_id = repo.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");

        let by_email = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.password_hash, "hash");
        assert_eq!(user_count(&repo).await, 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let repo = setup_repo().await;
        repo.create(&UserDbModel::new("Alice", "a@x.com", "hash"))
            .await
            .unwrap();

        assert!(repo.find_by_email("A@X.COM").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let repo = setup_repo().await;
        repo.create(&UserDbModel::new("Alice", "a@x.com", "h1"))
            .await
            .unwrap();

        let err = repo
            .create(&UserDbModel::new("Mallory", "a@x.com", "h2"))
            .await
            .expect_err("duplicate email must fail");
        assert!(err.is_unique_violation());
        assert_eq!(user_count(&repo).await, 1);
    }

    #[tokio::test]
    async fn test_update_password_and_profile() {
        let repo = setup_repo().await;
        let user = UserDbModel::new("Alice", "a@x.com", "old");
        repo.create(&user).await.unwrap();

        assert!(repo.update_password(&user.id, "new").await.unwrap());
        assert!(repo.update_profile(&user.id, "Alicia", "alicia@x.com").await.unwrap());

        let stored = repo.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");
        assert_eq!(stored.name, "Alicia");
        assert_eq!(stored.email, "alicia@x.com");
    }

    #[tokio::test]
    async fn test_updates_on_missing_user_report_false() {
        let repo = setup_repo().await;
        assert!(!repo.update_password("missing", "h").await.unwrap());
        assert!(!repo.update_profile("missing", "n", "e@x.com").await.unwrap());
    }
}
