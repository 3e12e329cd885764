use crate::application::error::{ErrorReport, HttpError};
use crate::application::forms::FieldErrors;
use crate::application::pagination::Page;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::{OffsetDateTime, macros::format_description};
use tracing::error;

/// Public message shown on every 404 page.
pub const NOT_FOUND_MESSAGE: &str = "The page you requested does not exist.";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Render `error.html`. A failing error template degrades to plain text
/// instead of going back through `HttpError`.
pub fn render_error_page(layout: LayoutView, status: StatusCode, message: &str) -> Response {
    let template = ErrorTemplate {
        layout,
        status: status.as_u16(),
        message: message.to_string(),
    };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!(
                target: "jotter::presentation",
                error = %err,
                status = status.as_u16(),
                "error page failed to render"
            );
            (status, message.to_string()).into_response()
        }
    }
}

pub fn render_not_found_response(layout: LayoutView) -> Response {
    let mut response = render_error_page(
        layout.with_title("Page not found"),
        StatusCode::NOT_FOUND,
        NOT_FOUND_MESSAGE,
    );
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "no route matched",
    )
    .attach(&mut response);
    response
}

fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(format_description!(
            "[day padding:none] [month repr:short] [year] [hour]:[minute]"
        ))
        .unwrap_or_default()
}

/// Page title and the signed-in username shared by every layout.
///
/// Pages that are served from the shared cache must be built with
/// `LayoutView::anonymous` so nothing viewer-specific ends up stored.
#[derive(Clone)]
pub struct LayoutView {
    pub title: String,
    pub viewer: Option<String>,
}

impl LayoutView {
    pub fn anonymous(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            viewer: None,
        }
    }

    pub fn for_viewer(title: impl Into<String>, viewer: Option<&UserRecord>) -> Self {
        Self {
            title: title.into(),
            viewer: viewer.map(|user| user.username.clone()),
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }
}

#[derive(Clone)]
pub struct PostCardView {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
    pub published: String,
}

impl From<PostRecord> for PostCardView {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            published: format_timestamp(post.created_at),
            text: post.text,
            author: post.author_username,
            group_slug: post.group_slug,
            group_title: post.group_title,
            image: post.image,
        }
    }
}

#[derive(Clone)]
pub struct PageLinkView {
    pub number: u32,
    pub current: bool,
}

/// Posts on the current page plus navigation links.
pub struct PostListView {
    pub posts: Vec<PostCardView>,
    pub pages: Vec<PageLinkView>,
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub show_paginator: bool,
}

impl From<Page<PostRecord>> for PostListView {
    fn from(page: Page<PostRecord>) -> Self {
        let current = page.number;
        let pages = page
            .page_range()
            .map(|number| PageLinkView {
                number,
                current: number == current,
            })
            .collect();

        Self {
            pages,
            previous: page.previous_page_number(),
            next: page.next_page_number(),
            show_paginator: page.has_other_pages(),
            posts: page.items.into_iter().map(PostCardView::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub layout: LayoutView,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupListTemplate {
    pub layout: LayoutView,
    pub group: GroupRecord,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub layout: LayoutView,
    pub author: String,
    pub posts_count: u64,
    /// Show the follow/unfollow control (signed in and not the author).
    pub can_follow: bool,
    pub following: bool,
    pub list: PostListView,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub layout: LayoutView,
    pub list: PostListView,
}

pub struct CommentView {
    pub author: String,
    pub text: String,
    pub published: String,
}

impl From<CommentRecord> for CommentView {
    fn from(comment: CommentRecord) -> Self {
        Self {
            published: format_timestamp(comment.created_at),
            author: comment.author_username,
            text: comment.text,
        }
    }
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub layout: LayoutView,
    pub post: PostCardView,
    pub author_posts_count: u64,
    pub comments: Vec<CommentView>,
    pub can_comment: bool,
    pub can_edit: bool,
}

pub struct GroupChoiceView {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

/// State of the post create/edit form.
pub struct PostFormView {
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupChoiceView>,
    pub text_errors: Vec<&'static str>,
    pub group_errors: Vec<&'static str>,
}

impl PostFormView {
    pub fn new(
        action: impl Into<String>,
        is_edit: bool,
        text: &str,
        selected_group: &str,
        groups: Vec<GroupRecord>,
    ) -> Self {
        let selected_group = selected_group.trim();
        let groups = groups
            .into_iter()
            .map(|group| GroupChoiceView {
                selected: group.id.to_string() == selected_group,
                id: group.id,
                title: group.title,
            })
            .collect();

        Self {
            is_edit,
            action: action.into(),
            text: text.to_string(),
            groups,
            text_errors: Vec::new(),
            group_errors: Vec::new(),
        }
    }

    pub fn with_errors(self, errors: &FieldErrors) -> Self {
        Self {
            text_errors: errors.field("text").to_vec(),
            group_errors: errors.field("group").to_vec(),
            ..self
        }
    }
}

#[derive(Template)]
#[template(path = "post_create.html")]
pub struct PostCreateTemplate {
    pub layout: LayoutView,
    pub form: PostFormView,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub layout: LayoutView,
    pub next: String,
    pub username: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub layout: LayoutView,
    pub username: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: LayoutView,
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pagination::{PageRequest, paginate};

    fn post(id: i64) -> PostRecord {
        PostRecord {
            id,
            text: format!("post {id}"),
            author_id: 1,
            author_username: "leo".to_string(),
            group_id: None,
            group_slug: None,
            group_title: None,
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn post_list_marks_current_page() {
        let posts: Vec<_> = (1..=25).map(post).collect();
        let view = PostListView::from(paginate(posts, 10, PageRequest::number(2)));

        assert_eq!(view.posts.len(), 10);
        assert_eq!(view.pages.len(), 3);
        assert!(view.pages[1].current);
        assert!(!view.pages[0].current);
        assert_eq!(view.previous, Some(1));
        assert_eq!(view.next, Some(3));
        assert!(view.show_paginator);
    }

    #[test]
    fn index_renders_posts_without_viewer() {
        let template = IndexTemplate {
            layout: LayoutView::anonymous("Latest posts"),
            list: PostListView::from(paginate(vec![post(1)], 10, PageRequest::first())),
        };
        let html = template.render().expect("index renders");

        assert!(html.contains("post 1"));
        assert!(html.contains("/profile/leo/"));
        assert!(!html.contains("Log out"));
    }

    #[test]
    fn post_form_preselects_group_and_carries_errors() {
        let groups = vec![
            GroupRecord {
                id: 1,
                title: "Cats".to_string(),
                slug: "cats".to_string(),
                description: String::new(),
            },
            GroupRecord {
                id: 2,
                title: "Dogs".to_string(),
                slug: "dogs".to_string(),
                description: String::new(),
            },
        ];
        let mut errors = FieldErrors::default();
        errors.add("text", crate::application::forms::REQUIRED_FIELD);

        let form = PostFormView::new("/create/", false, "", "2", groups).with_errors(&errors);

        assert!(!form.groups[0].selected);
        assert!(form.groups[1].selected);
        assert_eq!(form.text_errors.len(), 1);
        assert!(form.group_errors.is_empty());
    }

    #[test]
    fn text_is_escaped() {
        let mut record = post(3);
        record.text = "<script>alert(1)</script>".to_string();
        let template = IndexTemplate {
            layout: LayoutView::anonymous("Latest posts"),
            list: PostListView::from(paginate(vec![record], 10, PageRequest::first())),
        };
        let html = template.render().expect("index renders");

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
