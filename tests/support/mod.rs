#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
    response::Response,
};
use jotter::{
    application::repos::{CreateGroupParams, CreatePostParams, GroupsRepo, PostsWriteRepo},
    cache::{PageCache, PageCacheConfig},
    config::SessionSettings,
    domain::entities::{GroupRecord, PostRecord, UserId},
    infra::{
        db::SqliteRepositories,
        http::{HttpState, build_router},
    },
};
use time::OffsetDateTime;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: Arc<SqliteRepositories>,
    pub cache: Arc<PageCache>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_cache(PageCacheConfig::default()).await
}

pub async fn spawn_app_with_cache(config: PageCacheConfig) -> TestApp {
    let pool = SqliteRepositories::in_memory()
        .await
        .expect("in-memory sqlite should open");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    let db = Arc::new(SqliteRepositories::new(pool));
    let cache = Arc::new(PageCache::new(config));

    let state = HttpState::from_repositories(db.clone(), Some(cache.clone()));
    let session = SessionSettings {
        expiry: Duration::from_secs(3600),
        secure: false,
    };

    TestApp {
        router: build_router(state, &session),
        db,
        cache,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).expect("request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    /// POST with no body and no content type, as a bare client would send.
    pub async fn post_empty(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).expect("request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    /// Sign up through the HTTP surface and return the session cookie.
    pub async fn sign_up(&self, username: &str) -> String {
        let response = self
            .post_form("/auth/signup/", &format!("username={username}"), None)
            .await;
        assert!(
            response.status().is_redirection(),
            "signup for {username} should redirect, got {}",
            response.status()
        );
        session_cookie(&response)
    }

    pub async fn user_id(&self, username: &str) -> UserId {
        sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.db.pool())
            .await
            .expect("user should exist")
    }

    /// Store a post directly, bypassing the HTTP layer and the cache.
    pub async fn seed_post(
        &self,
        author: UserId,
        text: &str,
        group: Option<i64>,
        created_at: OffsetDateTime,
    ) -> PostRecord {
        self.db
            .create_post(CreatePostParams {
                author_id: author,
                text: text.to_string(),
                group_id: group,
                image: None,
                created_at,
            })
            .await
            .expect("post should be stored")
    }

    pub async fn seed_group(&self, title: &str, slug: &str) -> GroupRecord {
        self.db
            .create_group(CreateGroupParams {
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("About {title}"),
            })
            .await
            .expect("group should be stored")
    }

    pub async fn count_posts(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.db.pool())
            .await
            .expect("count should succeed")
    }

    pub async fn count_follows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM follows")
            .fetch_one(self.db.pool())
            .await
            .expect("count should succeed")
    }
}

pub fn session_cookie(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("response should set a session cookie");
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("redirect should carry a location")
        .to_string()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
}

pub async fn ok_body(response: Response) -> String {
    assert_eq!(response.status(), StatusCode::OK);
    body_text(response).await
}
