//! Ownership rules enforced by the schema.

use std::sync::Arc;

use jotter::application::{
    groups::{GroupError, GroupService, NewGroup},
    repos::{
        CommentsRepo, CreateCommentParams, CreatePostParams, FollowsRepo, GroupsRepo, PostsRepo,
        PostsWriteRepo, RepoError, UsersRepo,
    },
};
use jotter::infra::db::SqliteRepositories;
use time::OffsetDateTime;

async fn repositories() -> Arc<SqliteRepositories> {
    let pool = SqliteRepositories::in_memory()
        .await
        .expect("in-memory sqlite should open");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    Arc::new(SqliteRepositories::new(pool))
}

fn post_params(author_id: i64, group_id: Option<i64>) -> CreatePostParams {
    CreatePostParams {
        author_id,
        text: "owned text".to_string(),
        group_id,
        image: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[tokio::test]
async fn deleting_a_group_clears_post_references() {
    let repos = repositories().await;
    let groups = GroupService::new(repos.clone());
    let author = repos
        .create_user("anna", OffsetDateTime::now_utc())
        .await
        .expect("user");
    let group = groups
        .create_group(NewGroup {
            title: "Cats".to_string(),
            ..NewGroup::default()
        })
        .await
        .expect("group");
    let post = repos
        .create_post(post_params(author.id, Some(group.id)))
        .await
        .expect("post");
    assert_eq!(post.group_slug.as_deref(), Some("cats"));

    repos.delete_group(group.id).await.expect("group deleted");

    let reloaded = PostsRepo::find_by_id(repos.as_ref(), post.id)
        .await
        .expect("lookup")
        .expect("post survives");
    assert_eq!(reloaded.group_id, None);
    assert_eq!(reloaded.group_slug, None);
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments() {
    let repos = repositories().await;
    let author = repos
        .create_user("anna", OffsetDateTime::now_utc())
        .await
        .expect("user");
    let post = repos
        .create_post(post_params(author.id, None))
        .await
        .expect("post");
    repos
        .create_comment(CreateCommentParams {
            post_id: post.id,
            author_id: author.id,
            text: "hello".to_string(),
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .expect("comment");

    repos.delete_post(post.id).await.expect("post deleted");

    let comments = repos.list_for_post(post.id).await.expect("list comments");
    assert!(comments.is_empty());
}

#[tokio::test]
async fn deleting_a_user_removes_posts_comments_and_follows() {
    let repos = repositories().await;
    let anna = repos
        .create_user("anna", OffsetDateTime::now_utc())
        .await
        .expect("user");
    let boris = repos
        .create_user("boris", OffsetDateTime::now_utc())
        .await
        .expect("user");
    let post = repos
        .create_post(post_params(boris.id, None))
        .await
        .expect("post");
    repos.insert_if_absent(anna.id, boris.id).await.expect("follow");

    repos.delete_user(boris.id).await.expect("user deleted");

    assert!(
        PostsRepo::find_by_id(repos.as_ref(), post.id)
            .await
            .expect("lookup")
            .is_none()
    );
    assert!(!repos.exists(anna.id, boris.id).await.expect("exists"));
}

#[tokio::test]
async fn follow_pairs_are_unique_in_storage() {
    let repos = repositories().await;
    let anna = repos
        .create_user("anna", OffsetDateTime::now_utc())
        .await
        .expect("user");
    let boris = repos
        .create_user("boris", OffsetDateTime::now_utc())
        .await
        .expect("user");

    assert!(repos.insert_if_absent(anna.id, boris.id).await.expect("first"));
    assert!(!repos.insert_if_absent(anna.id, boris.id).await.expect("second"));
    assert_eq!(repos.count_for_user(anna.id).await.expect("count"), 1);
}

#[tokio::test]
async fn usernames_and_slugs_are_unique() {
    let repos = repositories().await;
    repos
        .create_user("anna", OffsetDateTime::now_utc())
        .await
        .expect("user");
    let duplicate = repos.create_user("anna", OffsetDateTime::now_utc()).await;
    assert!(matches!(duplicate, Err(RepoError::Duplicate { .. })));

    let groups = GroupService::new(repos.clone());
    groups
        .create_group(NewGroup {
            title: "Cats".to_string(),
            ..NewGroup::default()
        })
        .await
        .expect("group");
    let again = groups
        .create_group(NewGroup {
            title: "Other cats".to_string(),
            slug: Some("cats".to_string()),
            description: None,
        })
        .await;
    assert!(matches!(again, Err(GroupError::DuplicateSlug { .. })));
}

#[tokio::test]
async fn posts_by_unknown_authors_are_rejected() {
    let repos = repositories().await;

    let result = repos.create_post(post_params(999, None)).await;
    assert!(matches!(result, Err(RepoError::InvalidInput { .. })));
}
