//! Post listings: the global index, group and author listings, and the
//! personal feed composed from follow edges.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{Page, PageRequest, Paginator};
use crate::application::repos::{GroupsRepo, PostListScope, PostsRepo, RepoError, UsersRepo};
use crate::domain::entities::{GroupRecord, PostRecord, UserId, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A group together with one page of its posts.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub page: Page<PostRecord>,
}

/// An author's profile listing.
#[derive(Debug, Clone)]
pub struct AuthorFeed {
    pub author: UserRecord,
    pub posts_count: u64,
    pub page: Page<PostRecord>,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
        }
    }

    /// Every post, newest first.
    pub async fn index_page(&self, request: PageRequest) -> Result<Page<PostRecord>, FeedError> {
        self.page_for(PostListScope::All, request).await
    }

    pub async fn group_page(
        &self,
        slug: &str,
        request: PageRequest,
    ) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;
        let page = self.page_for(PostListScope::Group(group.id), request).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn author_page(
        &self,
        username: &str,
        request: PageRequest,
    ) -> Result<AuthorFeed, FeedError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;
        let page = self
            .page_for(PostListScope::Author(author.id), request)
            .await?;
        Ok(AuthorFeed {
            author,
            posts_count: page.total,
            page,
        })
    }

    /// Posts by every author `user` follows, newest first. Each post appears
    /// once; following nobody yields an empty page.
    pub async fn followed_page(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> Result<Page<PostRecord>, FeedError> {
        let page = self.page_for(PostListScope::FollowedBy(user), request).await?;
        debug!(
            target: "jotter::feed",
            user,
            page = page.number,
            total = page.total,
            "composed follow feed"
        );
        Ok(page)
    }

    async fn page_for(
        &self,
        scope: PostListScope,
        request: PageRequest,
    ) -> Result<Page<PostRecord>, FeedError> {
        let total = self.posts.count_posts(scope).await?;
        let paginator = Paginator::for_posts(total);
        let window = paginator.resolve(request);

        let items = if total == 0 {
            Vec::new()
        } else {
            self.posts.list_posts(scope, window).await?
        };

        Ok(Page::new(items, window, &paginator))
    }
}
