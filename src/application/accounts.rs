//! User accounts as far as session identity needs them: sign-up and lookup.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::{UserId, UserRecord};

pub const USERNAME_MAX_CHARS: usize = 150;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsernameError {
    #[error("This field is required.")]
    Empty,
    #[error("Ensure this value has at most 150 characters.")]
    TooLong,
    #[error(
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    )]
    InvalidCharacters,
    #[error("A user with that username already exists.")]
    Taken,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    InvalidUsername(#[from] UsernameError),
    #[error("unknown user")]
    UnknownUser,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub fn validate_username(raw: &str) -> Result<&str, UsernameError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(UsernameError::Empty);
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(UsernameError::TooLong);
    }
    let allowed = |ch: char| ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(UsernameError::InvalidCharacters);
    }
    Ok(username)
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UsersRepo>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UsersRepo>) -> Self {
        Self { users }
    }

    pub async fn sign_up(&self, raw_username: &str) -> Result<UserRecord, AccountError> {
        let username = validate_username(raw_username)?;

        match self
            .users
            .create_user(username, OffsetDateTime::now_utc())
            .await
        {
            Ok(user) => {
                info!(target: "jotter::accounts", user = user.id, username, "user signed up");
                Ok(user)
            }
            Err(RepoError::Duplicate { .. }) => Err(UsernameError::Taken.into()),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<UserRecord, AccountError> {
        self.users
            .find_by_username(username.trim())
            .await?
            .ok_or(AccountError::UnknownUser)
    }

    /// Resolve a session-bound id. `None` means the user no longer exists.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, AccountError> {
        Ok(self.users.find_by_id(id).await?)
    }
}
