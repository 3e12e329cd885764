use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use time::OffsetDateTime;

use crate::{
    application::{
        pagination::PageWindow,
        repos::{
            CreatePostParams, PostListScope, PostsRepo, PostsWriteRepo, RepoError,
            UpdatePostParams,
        },
    },
    domain::entities::{PostId, PostRecord},
};

use super::{POSTS_ORDER_EXPR, SqliteRepositories, map_sqlx_error};

const POST_SELECT: &str = "SELECT p.id, p.text, p.author_id, u.username AS author_username, \
    p.group_id, g.slug AS group_slug, g.title AS group_title, p.image, p.created_at \
    FROM posts p \
    INNER JOIN users u ON u.id = p.author_id \
    LEFT JOIN post_groups g ON g.id = p.group_id \
    WHERE 1 = 1";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_slug: Option<String>,
    group_title: Option<String>,
    image: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author_id: row.author_id,
            author_username: row.author_username,
            group_id: row.group_id,
            group_slug: row.group_slug,
            group_title: row.group_title,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostsRepo for SqliteRepositories {
    async fn count_posts(&self, scope: PostListScope) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p WHERE 1 = 1");
        Self::apply_scope_conditions(&mut qb, scope);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn list_posts(
        &self,
        scope: PostListScope,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let offset = i64::try_from(window.offset)
            .map_err(|_| RepoError::from_persistence("page offset exceeds supported range"))?;

        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        Self::apply_scope_conditions(&mut qb, scope);
        qb.push(POSTS_ORDER_EXPR);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(window.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows: Vec<PostRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row: Option<PostRow> = qb
            .build_query_as()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for SqliteRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (text, author_id, group_id, image, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&params.text)
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(&params.image)
        .bind(params.created_at)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        PostsRepo::find_by_id(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let result = sqlx::query("UPDATE posts SET text = ?, group_id = ? WHERE id = ?")
            .bind(&params.text)
            .bind(params.group_id)
            .bind(params.id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        PostsRepo::find_by_id(self, params.id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: PostId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
