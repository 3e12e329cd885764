//! Submitted form payloads and their field-level validation.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::entities::GroupId;

pub const REQUIRED_FIELD: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<&'static str, Vec<&'static str>>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.fields.entry(field).or_default().push(message);
    }

    pub fn field(&self, field: &str) -> &[&'static str] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Post create/edit form. `group` carries the selected group id, or an
/// empty string for "no group".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub text: String,
    pub group: String,
}

/// Post form after field-level checks; the group id still has to be
/// confirmed against storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPostForm {
    pub text: String,
    pub group_id: Option<GroupId>,
}

impl PostForm {
    pub fn clean(&self) -> Result<CleanPostForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED_FIELD);
        }

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<GroupId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            }
        };

        if errors.is_empty() {
            Ok(CleanPostForm {
                text: text.to_string(),
                group_id,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FieldErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FieldErrors::default();
            errors.add("text", REQUIRED_FIELD);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}
