//! Follow edges between users.
//!
//! `SubscriptionService::follow` is the only place that refuses self-follow;
//! the storage layer and the feed do not repeat the check.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{FollowsRepo, RepoError};
use crate::domain::entities::UserId;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollowIgnored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    Removed,
    NotFollowing,
}

#[derive(Clone)]
pub struct SubscriptionService {
    follows: Arc<dyn FollowsRepo>,
}

impl SubscriptionService {
    pub fn new(follows: Arc<dyn FollowsRepo>) -> Self {
        Self { follows }
    }

    /// Subscribe `user` to `author`. Repeating the call or following oneself
    /// is a silent no-op.
    pub async fn follow(
        &self,
        user: UserId,
        author: UserId,
    ) -> Result<FollowOutcome, SubscriptionError> {
        if user == author {
            return Ok(FollowOutcome::SelfFollowIgnored);
        }

        let created = self.follows.insert_if_absent(user, author).await?;
        if created {
            info!(target: "jotter::subscriptions", user, author, "follow created");
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Remove the edge if it exists; a missing edge is not an error.
    pub async fn unfollow(
        &self,
        user: UserId,
        author: UserId,
    ) -> Result<UnfollowOutcome, SubscriptionError> {
        if self.follows.delete(user, author).await? {
            info!(target: "jotter::subscriptions", user, author, "follow removed");
            Ok(UnfollowOutcome::Removed)
        } else {
            Ok(UnfollowOutcome::NotFollowing)
        }
    }

    pub async fn is_following(
        &self,
        user: UserId,
        author: UserId,
    ) -> Result<bool, SubscriptionError> {
        Ok(self.follows.exists(user, author).await?)
    }

    pub async fn following_count(&self, user: UserId) -> Result<u64, SubscriptionError> {
        Ok(self.follows.count_for_user(user).await?)
    }
}
