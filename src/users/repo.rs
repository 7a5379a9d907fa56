use async_trait::async_trait;
use sqlx::PgPool;

use crate::users::repo_types::{NewUser, User, UserUpdate};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, new: NewUser) -> anyhow::Result<User>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user(&self, id: i32) -> anyhow::Result<Option<User>>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    /// Writes only the columns set in `changes`. `role` is never written.
    async fn update_user(&self, id: i32, changes: UserUpdate) -> anyhow::Result<Option<User>>;
    async fn set_password(&self, id: i32, password_hash: &str) -> anyhow::Result<bool>;
    /// Owned analyses go with the user.
    async fn delete_user(&self, id: i32) -> anyhow::Result<bool>;
}

#[async_trait]
impl UserRepo for PgPool {
    async fn create_user(&self, new: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO "user" (username, email, password, department, category, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password, department, category, role,
                      created_at, updated_at
            "#,
        )
        .bind(new.username)
        .bind(new.email)
        .bind(new.password)
        .bind(new.department)
        .bind(new.category)
        .bind(new.role)
        .fetch_one(self)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, department, category, role,
                   created_at, updated_at
            FROM "user"
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: i32) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, department, category, role,
                   created_at, updated_at
            FROM "user"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, department, category, role,
                   created_at, updated_at
            FROM "user"
            ORDER BY id
            "#,
        )
        .fetch_all(self)
        .await?;
        Ok(users)
    }

    async fn update_user(&self, id: i32, changes: UserUpdate) -> anyhow::Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE "user"
               SET username   = COALESCE($2, username),
                   email      = COALESCE($3, email),
                   password   = COALESCE($4, password),
                   department = COALESCE($5, department),
                   category   = COALESCE($6, category),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, username, email, password, department, category, role,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password)
        .bind(changes.department)
        .bind(changes.category)
        .fetch_optional(self)
        .await?;
        Ok(updated)
    }

    async fn set_password(&self, id: i32, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"UPDATE "user" SET password = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(self)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_user(&self, id: i32) -> anyhow::Result<bool> {
        // analysis.id_user is ON DELETE CASCADE
        let res = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(id)
            .execute(self)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
