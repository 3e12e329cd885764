use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        accounts::AccountError, feed::FeedError, groups::GroupError, posts::PostError,
        repos::RepoError, subscriptions::SubscriptionError,
    },
    infra::error::InfraError,
    presentation::views::{LayoutView, NOT_FOUND_MESSAGE, render_error_page},
};

/// Diagnostic attached to error responses for the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let title = match self.status {
            StatusCode::NOT_FOUND => "Page not found",
            status => status.canonical_reason().unwrap_or("Error"),
        };
        let mut response =
            render_error_page(LayoutView::anonymous(title), self.status, self.public_message);
        self.report.attach(&mut response);
        response
    }
}

/// Map a repository error to a consistent HTTP error.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::not_found(source, "resource not found"),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        const SOURCE: &str = "application::error::feed_error_to_http_error";
        match error {
            FeedError::UnknownGroup => {
                HttpError::not_found(SOURCE, "Group slug did not match any group")
            }
            FeedError::UnknownAuthor => {
                HttpError::not_found(SOURCE, "Username did not match any user")
            }
            FeedError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        const SOURCE: &str = "application::error::post_error_to_http_error";
        match error {
            PostError::NotFound => HttpError::not_found(SOURCE, "Post id did not match any post"),
            PostError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<SubscriptionError> for HttpError {
    fn from(error: SubscriptionError) -> Self {
        const SOURCE: &str = "application::error::subscription_error_to_http_error";
        match error {
            SubscriptionError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

impl From<AccountError> for HttpError {
    fn from(error: AccountError) -> Self {
        const SOURCE: &str = "application::error::account_error_to_http_error";
        match error {
            AccountError::UnknownUser => {
                HttpError::not_found(SOURCE, "Username did not match any user")
            }
            AccountError::InvalidUsername(err) => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid username",
                &err,
            ),
            AccountError::Repo(err) => repo_error_to_http(SOURCE, err),
        }
    }
}

/// Failure of a CLI command; reported once by `main` before exiting.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<GroupError> for AppError {
    fn from(error: GroupError) -> Self {
        match error {
            GroupError::Repo(err) => AppError::Infra(InfraError::database(err.to_string())),
            other => AppError::validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entities_map_to_404() {
        assert_eq!(
            HttpError::from(FeedError::UnknownGroup).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(PostError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(AccountError::UnknownUser).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn persistence_failures_map_to_500() {
        let err = PostError::Repo(RepoError::from_persistence("disk full"));
        assert_eq!(
            HttpError::from(err).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_response_carries_report() {
        let response = HttpError::from(FeedError::UnknownAuthor).into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.status, StatusCode::NOT_FOUND);
        assert_eq!(
            report.source,
            "application::error::feed_error_to_http_error"
        );
    }

    #[test]
    fn group_errors_become_cli_failures() {
        let duplicate = AppError::from(GroupError::DuplicateSlug {
            slug: "cats".to_string(),
        });
        assert!(matches!(duplicate, AppError::Validation(_)));
        assert!(duplicate.to_string().contains("`cats`"));

        let storage = AppError::from(GroupError::Repo(RepoError::from_persistence("locked")));
        assert!(matches!(storage, AppError::Infra(InfraError::Database { .. })));
    }

    #[test]
    fn not_found_renders_the_error_page() {
        let response = HttpError::from(PostError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .expect("content type");
        assert!(content_type.starts_with("text/html"));
    }
}
