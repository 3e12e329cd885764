use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;
use crate::domain::slug::{SlugError, derive_slug, validate_slug};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group title must not be empty")]
    EmptyTitle,
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("a group with slug `{slug}` already exists")]
    DuplicateSlug { slug: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupsRepo>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupsRepo>) -> Self {
        Self { groups }
    }

    /// Create a group. Without an explicit slug one is derived from the title.
    pub async fn create_group(&self, input: NewGroup) -> Result<GroupRecord, GroupError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(GroupError::EmptyTitle);
        }

        let slug = match input.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => validate_slug(explicit)?.to_string(),
            _ => derive_slug(title)?,
        };

        let params = CreateGroupParams {
            title: title.to_string(),
            slug: slug.clone(),
            description: input.description.unwrap_or_default().trim().to_string(),
        };

        match self.groups.create_group(params).await {
            Ok(group) => {
                info!(
                    target: "jotter::groups",
                    group = group.id,
                    slug = %group.slug,
                    "group created"
                );
                Ok(group)
            }
            Err(RepoError::Duplicate { .. }) => Err(GroupError::DuplicateSlug { slug }),
            Err(other) => Err(other.into()),
        }
    }
}
