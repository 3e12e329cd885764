//! Post detail, authoring, editing and commenting.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::forms::{
    CleanPostForm, CommentForm, FieldErrors, INVALID_CHOICE, PostForm,
};
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostListScope, PostsRepo,
    PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostId, PostRecord, UserId};

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Everything the detail page shows about a post.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub author_posts_count: u64,
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Saved(PostRecord),
    Invalid(FieldErrors),
}

#[derive(Debug, Clone)]
pub enum EditOutcome {
    Updated(PostRecord),
    Invalid(FieldErrors),
    /// The editor is not the author; nothing was changed.
    NotAuthor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Added(CommentRecord),
    Rejected,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            posts,
            writer,
            groups,
            comments,
        }
    }

    pub async fn find(&self, id: PostId) -> Result<PostRecord, PostError> {
        self.posts.find_by_id(id).await?.ok_or(PostError::NotFound)
    }

    pub async fn detail(&self, id: PostId) -> Result<PostDetail, PostError> {
        let post = self.find(id).await?;
        let author_posts_count = self
            .posts
            .count_posts(PostListScope::Author(post.author_id))
            .await?;
        let comments = self.comments.list_for_post(post.id).await?;

        Ok(PostDetail {
            post,
            author_posts_count,
            comments,
        })
    }

    /// Groups offered by the post form.
    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, PostError> {
        Ok(self.groups.list_groups().await?)
    }

    pub async fn create(&self, author: UserId, form: &PostForm) -> Result<SubmitOutcome, PostError> {
        let clean = match self.validate(form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(SubmitOutcome::Invalid(errors)),
        };

        let post = self
            .writer
            .create_post(CreatePostParams {
                author_id: author,
                text: clean.text,
                group_id: clean.group_id,
                image: None,
                created_at: OffsetDateTime::now_utc(),
            })
            .await?;

        info!(
            target: "jotter::posts",
            post_id = post.id,
            author,
            preview = %post.preview(),
            "post created"
        );
        Ok(SubmitOutcome::Saved(post))
    }

    /// Apply an edit. Only the author may change a post; anyone else gets
    /// `EditOutcome::NotAuthor` and the post is left untouched.
    pub async fn update(
        &self,
        editor: UserId,
        id: PostId,
        form: &PostForm,
    ) -> Result<EditOutcome, PostError> {
        let post = self.find(id).await?;
        if !post.is_authored_by(editor) {
            return Ok(EditOutcome::NotAuthor);
        }

        let clean = match self.validate(form).await? {
            Ok(clean) => clean,
            Err(errors) => return Ok(EditOutcome::Invalid(errors)),
        };

        let updated = self
            .writer
            .update_post(UpdatePostParams {
                id,
                text: clean.text,
                group_id: clean.group_id,
            })
            .await?;

        info!(target: "jotter::posts", post_id = id, "post updated");
        Ok(EditOutcome::Updated(updated))
    }

    pub async fn add_comment(
        &self,
        author: UserId,
        post_id: PostId,
        form: &CommentForm,
    ) -> Result<CommentOutcome, PostError> {
        let post = self.find(post_id).await?;
        let Ok(text) = form.clean() else {
            return Ok(CommentOutcome::Rejected);
        };

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author_id: author,
                text,
                created_at: OffsetDateTime::now_utc(),
            })
            .await?;

        Ok(CommentOutcome::Added(comment))
    }

    async fn validate(
        &self,
        form: &PostForm,
    ) -> Result<Result<CleanPostForm, FieldErrors>, PostError> {
        let clean = match form.clean() {
            Ok(clean) => clean,
            Err(errors) => return Ok(Err(errors)),
        };

        if let Some(group_id) = clean.group_id
            && self.groups.find_by_id(group_id).await?.is_none()
        {
            let mut errors = FieldErrors::default();
            errors.add("group", INVALID_CHOICE);
            return Ok(Err(errors));
        }

        Ok(Ok(clean))
    }
}
