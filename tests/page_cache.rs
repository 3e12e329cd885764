mod support;

use std::time::Duration;

use axum::http::header::SET_COOKIE;
use jotter::cache::PageCacheConfig;
use time::OffsetDateTime;

use support::{body_text, ok_body, spawn_app, spawn_app_with_cache};

#[tokio::test]
async fn index_is_served_verbatim_within_ttl() {
    let app = spawn_app().await;
    app.sign_up("anna").await;
    let anna_id = app.user_id("anna").await;
    app.seed_post(anna_id, "first post", None, OffsetDateTime::now_utc())
        .await;

    let first = app.get("/", None).await;
    let first = ok_body(first).await;
    assert!(first.contains("first post"));

    app.seed_post(anna_id, "second post", None, OffsetDateTime::now_utc())
        .await;

    let second = ok_body(app.get("/", None).await).await;
    assert_eq!(first, second);
    assert!(!second.contains("second post"));
}

#[tokio::test]
async fn clearing_the_cache_shows_new_posts() {
    let app = spawn_app().await;
    app.sign_up("anna").await;
    let anna_id = app.user_id("anna").await;

    let empty = ok_body(app.get("/", None).await).await;
    assert!(empty.contains("No posts yet."));
    assert_eq!(app.cache.len(), 1);

    app.seed_post(anna_id, "arrived later", None, OffsetDateTime::now_utc())
        .await;
    app.cache.clear();
    assert!(app.cache.is_empty());

    let fresh = ok_body(app.get("/", None).await).await;
    assert!(fresh.contains("arrived later"));
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let app = spawn_app_with_cache(PageCacheConfig {
        ttl: Duration::from_millis(50),
        ..PageCacheConfig::default()
    })
    .await;
    app.sign_up("anna").await;
    let anna_id = app.user_id("anna").await;

    let before = ok_body(app.get("/", None).await).await;
    app.seed_post(anna_id, "after expiry", None, OffsetDateTime::now_utc())
        .await;

    tokio::time::sleep(Duration::from_millis(120)).await;

    let after = ok_body(app.get("/", None).await).await;
    assert_ne!(before, after);
    assert!(after.contains("after expiry"));
}

#[tokio::test]
async fn signed_in_and_anonymous_visitors_share_the_cached_page() {
    let app = spawn_app().await;
    let anna = app.sign_up("anna").await;

    let anonymous = ok_body(app.get("/", None).await).await;
    let signed_in = ok_body(app.get("/", Some(&anna)).await).await;

    assert_eq!(anonymous, signed_in);
    assert!(!signed_in.contains("Log out"));
}

#[tokio::test]
async fn query_strings_are_cached_separately() {
    let app = spawn_app().await;
    app.sign_up("anna").await;
    let anna_id = app.user_id("anna").await;
    for n in 0..12 {
        app.seed_post(anna_id, &format!("post-{n:02}"), None, OffsetDateTime::now_utc())
            .await;
    }

    let page_one = ok_body(app.get("/", None).await).await;
    let page_two = ok_body(app.get("/?page=2", None).await).await;

    assert_ne!(page_one, page_two);
    assert_eq!(app.cache.len(), 2);
}

#[tokio::test]
async fn anonymous_index_sets_no_cookie() {
    let app = spawn_app().await;

    let response = app.get("/", None).await;
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = body_text(response).await;
    assert!(body.contains("Latest posts"));
}

#[tokio::test]
async fn other_listings_are_not_cached() {
    let app = spawn_app().await;
    app.sign_up("anna").await;
    let anna_id = app.user_id("anna").await;

    ok_body(app.get("/profile/anna/", None).await).await;
    app.seed_post(anna_id, "visible at once", None, OffsetDateTime::now_utc())
        .await;
    let profile = ok_body(app.get("/profile/anna/", None).await).await;

    assert!(profile.contains("visible at once"));
    assert!(app.cache.is_empty());
}
