//! Session-bound identity.
//!
//! Signing in binds a username to the session without checking any
//! credential. Handlers call `current_user` to learn who is asking and
//! `login_redirect` to bounce anonymous visitors away from protected pages.

use axum::{
    Form,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use url::form_urlencoded;

use crate::{
    application::{
        accounts::{AccountError, validate_username},
        error::HttpError,
    },
    domain::entities::{UserId, UserRecord},
    presentation::views::{LayoutView, LoginTemplate, SignupTemplate, render_template_response},
};

use super::HttpState;

const SESSION_USER_KEY: &str = "jotter.user_id";
pub(super) const LOGIN_PATH: &str = "/auth/login/";

fn session_error(err: tower_sessions::session::Error) -> HttpError {
    HttpError::from_error(
        "infra::http::auth::session",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Session storage failed",
        &err,
    )
}

/// Resolve the signed-in user. A session pointing at a deleted user is
/// treated as anonymous and cleared.
pub(super) async fn current_user(
    state: &HttpState,
    session: &Session,
) -> Result<Option<UserRecord>, HttpError> {
    let Some(user_id) = session
        .get::<UserId>(SESSION_USER_KEY)
        .await
        .map_err(session_error)?
    else {
        return Ok(None);
    };

    match state.accounts.find_by_id(user_id).await? {
        Some(user) => Ok(Some(user)),
        None => {
            session
                .remove::<UserId>(SESSION_USER_KEY)
                .await
                .map_err(session_error)?;
            Ok(None)
        }
    }
}

/// Redirect to the login page, carrying the original path and query as
/// the `next` parameter.
pub(super) fn login_redirect(uri: &Uri) -> Response {
    let destination = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let encoded: String = form_urlencoded::byte_serialize(destination.as_bytes()).collect();
    Redirect::to(&format!("{LOGIN_PATH}?next={encoded}")).into_response()
}

/// Only local absolute paths are followed after login; anything else
/// falls back to the front page. Browsers read `/\host` as `//host`, so a
/// backslash in second position is rejected along with control characters.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

fn is_local_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.first() == Some(&b'/')
        && !matches!(bytes.get(1), Some(b'/' | b'\\'))
        && !path.chars().any(char::is_control)
}

async fn bind_session(session: &Session, user: &UserRecord) -> Result<(), HttpError> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(session_error)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct NextQuery {
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    username: String,
    next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SignupForm {
    username: String,
}

pub(super) async fn login_page(Query(query): Query<NextQuery>) -> Response {
    let template = LoginTemplate {
        layout: LayoutView::anonymous("Log in"),
        next: safe_next(query.next.as_deref()).to_string(),
        username: String::new(),
        errors: Vec::new(),
    };
    render_template_response(template, StatusCode::OK)
}

pub(super) async fn login_submit(
    State(state): State<HttpState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, HttpError> {
    let next = safe_next(form.next.as_deref()).to_string();

    let user = match validate_username(&form.username) {
        Ok(username) => match state.accounts.find_by_username(username).await {
            Ok(user) => user,
            Err(AccountError::UnknownUser) => {
                return Ok(login_form_error(form.username, next, "Unknown username."));
            }
            Err(err) => return Err(err.into()),
        },
        Err(err) => return Ok(login_form_error(form.username, next, &err.to_string())),
    };

    bind_session(&session, &user).await?;
    info!(target: "jotter::auth", user = user.id, "session bound");
    Ok(Redirect::to(&next).into_response())
}

fn login_form_error(username: String, next: String, message: &str) -> Response {
    let template = LoginTemplate {
        layout: LayoutView::anonymous("Log in"),
        next,
        username,
        errors: vec![message.to_string()],
    };
    render_template_response(template, StatusCode::OK)
}

pub(super) async fn signup_page() -> Response {
    let template = SignupTemplate {
        layout: LayoutView::anonymous("Sign up"),
        username: String::new(),
        errors: Vec::new(),
    };
    render_template_response(template, StatusCode::OK)
}

pub(super) async fn signup_submit(
    State(state): State<HttpState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, HttpError> {
    match state.accounts.sign_up(&form.username).await {
        Ok(user) => {
            bind_session(&session, &user).await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(AccountError::InvalidUsername(err)) => {
            let template = SignupTemplate {
                layout: LayoutView::anonymous("Sign up"),
                username: form.username,
                errors: vec![err.to_string()],
            };
            Ok(render_template_response(template, StatusCode::OK))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) async fn logout(session: Session) -> Result<Response, HttpError> {
    session.flush().await.map_err(session_error)?;
    Ok(Redirect::to("/").into_response())
}
