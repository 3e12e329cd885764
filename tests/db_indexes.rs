use sqlx::{Row, SqlitePool};

use jotter::infra::db::SqliteRepositories;

async fn migrated_pool() -> SqlitePool {
    let pool = SqliteRepositories::in_memory()
        .await
        .expect("in-memory sqlite should open");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    pool
}

#[tokio::test]
async fn post_listing_indexes_exist() {
    let pool = migrated_pool().await;

    let indexes: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'posts'",
    )
    .fetch_all(&pool)
    .await
    .expect("fetch post indexes");

    for expected in [
        "posts_created_at_idx",
        "posts_author_id_idx",
        "posts_group_id_idx",
    ] {
        assert!(
            indexes.iter().any(|name| name == expected),
            "missing {expected}"
        );
    }
}

#[tokio::test]
async fn newest_first_ordering_walks_the_created_at_index() {
    let pool = migrated_pool().await;

    let plan = sqlx::query(
        "EXPLAIN QUERY PLAN SELECT p.id FROM posts p \
         ORDER BY julianday(p.created_at) DESC, p.id DESC LIMIT 10",
    )
    .fetch_all(&pool)
    .await
    .expect("explain listing query");

    let details: Vec<String> = plan
        .iter()
        .map(|row| row.get::<String, _>("detail"))
        .collect();

    assert!(
        details
            .iter()
            .any(|detail| detail.contains("posts_created_at_idx")),
        "plan did not use posts_created_at_idx: {details:?}"
    );
    assert!(
        !details.iter().any(|detail| detail.contains("TEMP B-TREE")),
        "plan still sorts: {details:?}"
    );
}
