mod auth;
mod middleware;
mod public;

pub use public::build_router;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::{
    accounts::AccountService, error::ErrorReport, feed::FeedService, posts::PostService,
    subscriptions::SubscriptionService,
};
use crate::cache::PageCache;
use crate::infra::db::SqliteRepositories;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub accounts: Arc<AccountService>,
    pub db: Arc<SqliteRepositories>,
    pub cache: Option<Arc<PageCache>>,
}

impl HttpState {
    /// Wire every service to the same SQLite repositories.
    pub fn from_repositories(db: Arc<SqliteRepositories>, cache: Option<Arc<PageCache>>) -> Self {
        let feed = FeedService::new(db.clone(), db.clone(), db.clone());
        let posts = PostService::new(db.clone(), db.clone(), db.clone(), db.clone());
        let subscriptions = SubscriptionService::new(db.clone());
        let accounts = AccountService::new(db.clone());

        Self {
            feed: Arc::new(feed),
            posts: Arc::new(posts),
            subscriptions: Arc::new(subscriptions),
            accounts: Arc::new(accounts),
            db,
            cache,
        }
    }
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
