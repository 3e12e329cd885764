use axum::{
    Form, Router,
    extract::{OriginalUri, Path, RawQuery, State, rejection::FormRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, cookie::SameSite};

use crate::{
    application::{
        error::HttpError,
        forms::{CommentForm, PostForm},
        pagination::PageRequest,
        posts::{EditOutcome, SubmitOutcome},
    },
    cache::page_cache_layer,
    config::SessionSettings,
    domain::entities::{PostId, UserRecord},
    presentation::views::{
        FollowTemplate, GroupListTemplate, IndexTemplate, LayoutView, PostCardView,
        PostCreateTemplate, PostDetailTemplate, PostFormView, PostListView, ProfileTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::{
    HttpState,
    auth::{self, current_user, login_redirect},
    db_health_response,
    middleware::{log_responses, set_request_context},
};

pub fn build_router(state: HttpState, session: &SessionSettings) -> Router {
    // Only the global listing is cached, and it never renders viewer chrome.
    let cached_routes = Router::new().route("/", get(index));

    let cached_routes = if let Some(cache) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(cache, page_cache_layer))
    } else {
        cached_routes
    };

    let dynamic_routes = Router::new()
        .route("/group/{slug}/", get(group_posts))
        .route("/profile/{username}/", get(profile))
        .route("/profile/{username}/follow/", get(profile_follow))
        .route("/profile/{username}/unfollow/", get(profile_unfollow))
        .route("/posts/{post_id}/", get(post_detail))
        .route("/posts/{post_id}/edit/", get(post_edit_page).post(post_edit_submit))
        .route("/posts/{post_id}/comment/", post(add_comment))
        .route("/create/", get(post_create_page).post(post_create_submit))
        .route("/follow/", get(follow_index))
        .route("/auth/login/", get(auth::login_page).post(auth::login_submit))
        .route("/auth/signup/", get(auth::signup_page).post(auth::signup_submit))
        .route("/auth/logout/", get(auth::logout))
        .route("/_health/db", get(public_health))
        .fallback(fallback_router);

    cached_routes
        .merge(dynamic_routes)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
        .layer(session_layer(session))
}

fn session_layer(settings: &SessionSettings) -> SessionManagerLayer<MemoryStore> {
    let idle = i64::try_from(settings.expiry.as_secs()).unwrap_or(i64::MAX);
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(settings.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(idle)))
}

/// Path segments that do not parse as an id cannot name a post.
fn parse_post_id(raw: &str) -> Result<PostId, HttpError> {
    raw.parse::<PostId>().map_err(|_| {
        HttpError::not_found(
            "infra::http::public::parse_post_id",
            format!("`{raw}` is not a post id"),
        )
    })
}

fn detail_redirect(post_id: PostId) -> Response {
    Redirect::to(&format!("/posts/{post_id}/")).into_response()
}

async fn index(State(state): State<HttpState>, RawQuery(query): RawQuery) -> Response {
    let request = PageRequest::from_query_string(query.as_deref());
    match state.feed.index_page(request).await {
        Ok(page) => {
            let template = IndexTemplate {
                layout: LayoutView::anonymous("Latest posts"),
                list: PostListView::from(page),
            };
            render_template_response(template, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn group_posts(
    State(state): State<HttpState>,
    session: Session,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let viewer = current_user(&state, &session).await?;
    let request = PageRequest::from_query_string(query.as_deref());
    let feed = state.feed.group_page(&slug, request).await?;

    let template = GroupListTemplate {
        layout: LayoutView::for_viewer(format!("Group {}", feed.group.title), viewer.as_ref()),
        group: feed.group,
        list: PostListView::from(feed.page),
    };
    Ok(render_template_response(template, StatusCode::OK))
}

async fn profile(
    State(state): State<HttpState>,
    session: Session,
    Path(username): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let viewer = current_user(&state, &session).await?;
    let request = PageRequest::from_query_string(query.as_deref());
    let feed = state.feed.author_page(&username, request).await?;

    let (can_follow, following) = match viewer.as_ref() {
        Some(user) if user.id != feed.author.id => (
            true,
            state
                .subscriptions
                .is_following(user.id, feed.author.id)
                .await?,
        ),
        _ => (false, false),
    };

    let template = ProfileTemplate {
        layout: LayoutView::for_viewer(
            format!("Profile of {}", feed.author.username),
            viewer.as_ref(),
        ),
        author: feed.author.username,
        posts_count: feed.posts_count,
        can_follow,
        following,
        list: PostListView::from(feed.page),
    };
    Ok(render_template_response(template, StatusCode::OK))
}

async fn post_detail(
    State(state): State<HttpState>,
    session: Session,
    Path(post_id): Path<String>,
) -> Result<Response, HttpError> {
    let post_id = parse_post_id(&post_id)?;
    let viewer = current_user(&state, &session).await?;
    let detail = state.posts.detail(post_id).await?;

    let can_edit = viewer
        .as_ref()
        .is_some_and(|user| detail.post.is_authored_by(user.id));

    let template = PostDetailTemplate {
        layout: LayoutView::for_viewer(format!("Post {}", detail.post.preview()), viewer.as_ref()),
        post: PostCardView::from(detail.post),
        author_posts_count: detail.author_posts_count,
        comments: detail.comments.into_iter().map(Into::into).collect(),
        can_comment: viewer.is_some(),
        can_edit,
    };
    Ok(render_template_response(template, StatusCode::OK))
}

/// Signed-in user or a ready-made redirect to the login page.
///
/// Form handlers take their body as `Result<Form<_>, FormRejection>` so an
/// anonymous caller is redirected before any body rejection surfaces.
async fn require_user(
    state: &HttpState,
    session: &Session,
    uri: &OriginalUri,
) -> Result<Result<UserRecord, Response>, HttpError> {
    Ok(current_user(state, session)
        .await?
        .ok_or_else(|| login_redirect(&uri.0)))
}

fn render_post_form(viewer: &UserRecord, view: PostFormView) -> Response {
    let title = if view.is_edit { "Edit post" } else { "New post" };
    let template = PostCreateTemplate {
        layout: LayoutView::for_viewer(title, Some(viewer)),
        form: view,
    };
    render_template_response(template, StatusCode::OK)
}

async fn post_create_page(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let groups = state.posts.group_choices().await?;
    let view = PostFormView::new("/create/", false, "", "", groups);
    Ok(render_post_form(&viewer, view))
}

async fn post_create_submit(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    match state.posts.create(viewer.id, &form).await? {
        SubmitOutcome::Saved(_) => {
            Ok(Redirect::to(&format!("/profile/{}/", viewer.username)).into_response())
        }
        SubmitOutcome::Invalid(errors) => {
            let groups = state.posts.group_choices().await?;
            let view = PostFormView::new("/create/", false, &form.text, &form.group, groups)
                .with_errors(&errors);
            Ok(render_post_form(&viewer, view))
        }
    }
}

async fn post_edit_page(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    Path(post_id): Path<String>,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let post_id = parse_post_id(&post_id)?;
    let post = state.posts.find(post_id).await?;
    if !post.is_authored_by(viewer.id) {
        return Ok(detail_redirect(post_id));
    }

    let groups = state.posts.group_choices().await?;
    let selected = post.group_id.map(|id| id.to_string()).unwrap_or_default();
    let view = PostFormView::new(
        format!("/posts/{post_id}/edit/"),
        true,
        &post.text,
        &selected,
        groups,
    );
    Ok(render_post_form(&viewer, view))
}

async fn post_edit_submit(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    Path(post_id): Path<String>,
    form: Result<Form<PostForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let post_id = parse_post_id(&post_id)?;

    match state.posts.update(viewer.id, post_id, &form).await? {
        EditOutcome::Updated(_) | EditOutcome::NotAuthor => Ok(detail_redirect(post_id)),
        EditOutcome::Invalid(errors) => {
            let groups = state.posts.group_choices().await?;
            let view = PostFormView::new(
                format!("/posts/{post_id}/edit/"),
                true,
                &form.text,
                &form.group,
                groups,
            )
            .with_errors(&errors);
            Ok(render_post_form(&viewer, view))
        }
    }
}

async fn add_comment(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    Path(post_id): Path<String>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let post_id = parse_post_id(&post_id)?;

    // Rejected comments persist nothing and land on the same page.
    state.posts.add_comment(viewer.id, post_id, &form).await?;
    Ok(detail_redirect(post_id))
}

async fn follow_index(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    RawQuery(query): RawQuery,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let request = PageRequest::from_query_string(query.as_deref());
    let page = state.feed.followed_page(viewer.id, request).await?;
    let template = FollowTemplate {
        layout: LayoutView::for_viewer("Following", Some(&viewer)),
        list: PostListView::from(page),
    };
    Ok(render_template_response(template, StatusCode::OK))
}

async fn profile_follow(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let author = state.accounts.find_by_username(&username).await?;

    state.subscriptions.follow(viewer.id, author.id).await?;
    Ok(Redirect::to("/follow/").into_response())
}

async fn profile_unfollow(
    State(state): State<HttpState>,
    session: Session,
    uri: OriginalUri,
    Path(username): Path<String>,
) -> Result<Response, HttpError> {
    let viewer = match require_user(&state, &session, &uri).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };
    let author = state.accounts.find_by_username(&username).await?;

    state.subscriptions.unfollow(viewer.id, author.id).await?;
    Ok(Redirect::to("/follow/").into_response())
}

async fn public_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.db.health_check().await)
}

async fn fallback_router(State(state): State<HttpState>, session: Session) -> Response {
    let viewer = current_user(&state, &session).await.ok().flatten();
    render_not_found_response(LayoutView::for_viewer("Page not found", viewer.as_ref()))
}
