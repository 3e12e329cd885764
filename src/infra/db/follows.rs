use async_trait::async_trait;

use crate::{
    application::repos::{FollowsRepo, RepoError},
    domain::entities::UserId,
};

use super::{SqliteRepositories, map_sqlx_error};

#[async_trait]
impl FollowsRepo for SqliteRepositories {
    async fn insert_if_absent(&self, user: UserId, author: UserId) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES (?, ?)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(user)
        .bind(author)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, user: UserId, author: UserId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user)
            .bind(author)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, user: UserId, author: UserId) -> Result<bool, RepoError> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)",
        )
        .bind(user)
        .bind(author)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(found)
    }

    async fn count_for_user(&self, user: UserId) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}
