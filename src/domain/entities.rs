//! Domain entities mirrored from persistent storage.
//!
//! Relations are expressed as plain identifiers. Ownership rules live in the
//! schema: deleting a user cascades to their posts, comments and follow
//! edges; deleting a post cascades to its comments; deleting a group only
//! clears `PostRecord::group_id`.

use serde::Serialize;
use time::OffsetDateTime;

pub type UserId = i64;
pub type PostId = i64;
pub type GroupId = i64;
pub type CommentId = i64;

const PREVIEW_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with the author's username and, when present, its group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: PostId,
    pub text: String,
    pub author_id: UserId,
    pub author_username: String,
    pub group_id: Option<GroupId>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl PostRecord {
    /// Short label for titles and logs.
    pub fn preview(&self) -> String {
        self.text.chars().take(PREVIEW_CHARS).collect()
    }

    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub author_username: String,
    pub text: String,
    pub created_at: OffsetDateTime,
}

/// Directed subscription edge: `user_id` follows `author_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowRecord {
    pub id: i64,
    pub user_id: UserId,
    pub author_id: UserId,
}
