use crate::application::repos::RepoError;

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Duplicate {
            constraint: unique_constraint_name(db.message()),
        },
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        sqlx::Error::Database(db) if db.is_check_violation() => RepoError::Integrity {
            message: db.message().to_string(),
        },
        other => RepoError::from_persistence(other),
    }
}

/// SQLite reports `UNIQUE constraint failed: follows.user_id, follows.author_id`
/// without a constraint name; keep the column list instead.
fn unique_constraint_name(message: &str) -> String {
    message
        .split_once("UNIQUE constraint failed:")
        .map(|(_, columns)| columns.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
