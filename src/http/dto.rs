//! Request and response bodies.
//!
//! Request fields are optional at the serde level so that a missing field
//! is reported as a validation error with the field name rather than a
//! generic deserialization failure.

use crate::domain::{NewPost, NewUser, Post, PostUpdate, User};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of both user registration and user update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user: Option<UserDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            full_name: user.full_name(),
            email: user.email,
        }
    }
}

impl PostResponse {
    pub fn new(post: Post, author: Option<User>) -> Self {
        PostResponse {
            id: post.id,
            title: post.title,
            content: post.content,
            user: author.map(UserDto::from),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Width of the `post.title` column.
const MAX_TITLE_CHARS: usize = 100;

/// Collects field violations so one response reports all of them.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.0.push(format!("{}: {}", field, message));
        }
    }

    /// Check a required text field and return it when present.
    fn not_blank<'a>(&mut self, field: &str, value: &'a Option<String>) -> Option<&'a str> {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                self.check(false, field, "must not be blank");
                None
            }
        }
    }

    fn required<T: Copy>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        self.check(value.is_some(), field, "is required");
        value
    }

    fn min_chars(&mut self, field: &str, value: Option<&str>, min: usize) {
        if let Some(v) = value {
            self.check(
                v.chars().count() >= min,
                field,
                &format!("must be at least {} characters", min),
            );
        }
    }

    fn max_chars(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            self.check(
                v.chars().count() <= max,
                field,
                &format!("must be at most {} characters", max),
            );
        }
    }

    fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationError(self.0.join("; ")))
        }
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl CreatePostRequest {
    /// # Errors
    /// `Error::ValidationError` listing every violated field.
    pub fn validate(self) -> Result<NewPost> {
        let mut violations = Violations::default();
        let title = violations.not_blank("title", &self.title);
        violations.max_chars("title", title, MAX_TITLE_CHARS);
        let content = violations.not_blank("content", &self.content);
        violations.min_chars("content", content, 10);
        let user_id = violations.required("userId", self.user_id);
        violations.into_result()?;

        match (title, content, user_id) {
            (Some(title), Some(content), Some(user_id)) => Ok(NewPost {
                title: title.to_string(),
                content: content.to_string(),
                user_id,
            }),
            _ => Err(Error::ValidationError("incomplete post".to_string())),
        }
    }
}

impl UpdatePostRequest {
    /// # Errors
    /// `Error::ValidationError` listing every violated field.
    pub fn validate(self, id: i64) -> Result<PostUpdate> {
        let mut violations = Violations::default();
        let user_id = violations.required("userId", self.user_id);
        let title = violations.not_blank("title", &self.title);
        if let Some(t) = title {
            let len = t.chars().count();
            violations.check(
                (3..=MAX_TITLE_CHARS).contains(&len),
                "title",
                "must be between 3 and 100 characters",
            );
        }
        let content = violations.not_blank("content", &self.content);
        violations.min_chars("content", content, 10);
        violations.into_result()?;

        match (title, content, user_id) {
            (Some(title), Some(content), Some(user_id)) => Ok(PostUpdate {
                id,
                title: title.to_string(),
                content: content.to_string(),
                user_id,
            }),
            _ => Err(Error::ValidationError("incomplete post".to_string())),
        }
    }
}

impl UserRequest {
    /// # Errors
    /// `Error::ValidationError` listing every violated field.
    pub fn validate(self) -> Result<NewUser> {
        let mut violations = Violations::default();
        let first_name = violations.not_blank("firstName", &self.first_name);
        let last_name = violations.not_blank("lastName", &self.last_name);
        let email = violations.not_blank("email", &self.email);
        if let Some(e) = email {
            violations.check(is_valid_email(e), "email", "must be a well-formed email address");
        }
        violations.into_result()?;

        match (first_name, last_name, email) {
            (Some(first_name), Some(last_name), Some(email)) => Ok(NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email: email.to_string(),
            }),
            _ => Err(Error::ValidationError("incomplete user".to_string())),
        }
    }
}
