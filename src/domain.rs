//! Posts and users as the service layer sees them.

use crate::entity::CacheEntity;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A blog post. `id` and both timestamps are assigned by the store.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CacheEntity for Post {
    type Key = i64;

    fn cache_key(&self) -> Self::Key {
        self.id
    }

    fn cache_prefix() -> &'static str {
        "post"
    }

    fn validate(&self) -> Result<()> {
        if self.id <= 0 || self.user_id <= 0 {
            return Err(Error::ValidationError(format!(
                "Cached post has invalid ids (id={}, user_id={})",
                self.id, self.user_id
            )));
        }
        Ok(())
    }
}

/// Fields of a post to be created.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

/// Full-field replacement of an existing post.
#[derive(Clone, Debug, PartialEq)]
pub struct PostUpdate {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

/// A registered user. Email is unique across users.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// `"{first_name} {last_name}"`
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Name and email fields of a user, used for both registration and update.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let user = User {
            id: 1,
            first_name: "Juan".to_string(),
            last_name: "Gonzales".to_string(),
            email: "a@b.com".to_string(),
        };
        assert_eq!(user.full_name(), "Juan Gonzales");
    }
}
