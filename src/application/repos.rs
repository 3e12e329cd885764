//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    CommentRecord, GroupId, GroupRecord, PostId, PostRecord, UserId, UserRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Which posts a listing covers. Every scope is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    All,
    Group(GroupId),
    Author(UserId),
    /// Posts by every author the given user follows.
    FollowedBy(UserId),
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: UserId,
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: PostId,
    pub text: String,
    pub group_id: Option<GroupId>,
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(
        &self,
        username: &str,
        created_at: OffsetDateTime,
    ) -> Result<UserRecord, RepoError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn delete_user(&self, id: UserId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_by_id(&self, id: GroupId) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn delete_group(&self, id: GroupId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn count_posts(&self, scope: PostListScope) -> Result<u64, RepoError>;

    async fn list_posts(
        &self,
        scope: PostListScope,
        window: PageWindow,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: PostId) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: PostId) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<CommentRecord>, RepoError>;
}

/// Storage of directed follow edges. Uniqueness of `(user, author)` is a
/// storage invariant; self-follow is not checked at this layer.
#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Insert the edge unless it already exists. Returns `true` when a new
    /// edge was stored.
    async fn insert_if_absent(&self, user: UserId, author: UserId) -> Result<bool, RepoError>;

    /// Remove the edge if present. Returns `true` when an edge was removed.
    async fn delete(&self, user: UserId, author: UserId) -> Result<bool, RepoError>;

    async fn exists(&self, user: UserId, author: UserId) -> Result<bool, RepoError>;

    async fn count_for_user(&self, user: UserId) -> Result<u64, RepoError>;
}
