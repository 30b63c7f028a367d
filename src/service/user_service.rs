//! User registration and lookup. Users are never cached.

use crate::domain::{NewUser, User};
use crate::error::{Error, Result};
use crate::repository::UserStore;
use std::sync::Arc;

pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        UserService { store }
    }

    /// Register a new user.
    ///
    /// # Errors
    /// `Error::EmailInUse` if the email is already registered. The store
    /// reports the same error if a concurrent registration wins the race.
    pub async fn create(&self, user: NewUser) -> Result<User> {
        if self.store.fetch_by_email(&user.email).await?.is_some() {
            return Err(Error::EmailInUse("Email already in use".to_string()));
        }

        let created = self.store.insert(user).await?;
        info!("User {} registered", created.id);
        Ok(created)
    }

    /// Overwrite name and email of user `id`.
    ///
    /// # Errors
    /// `Error::NotFound` if `id` is unknown, `Error::EmailInUse` if the email
    /// belongs to another user.
    pub async fn update(&self, id: i64, fields: NewUser) -> Result<User> {
        if self.store.fetch_by_id(id).await?.is_none() {
            return Err(Error::NotFound("User not found.".to_string()));
        }

        let updated = self
            .store
            .update(User {
                id,
                first_name: fields.first_name,
                last_name: fields.last_name,
                email: fields.email,
            })
            .await?;
        info!("User {} updated", id);
        Ok(updated)
    }

    /// One user.
    ///
    /// # Errors
    /// `Error::NotFound` if `id` is unknown.
    pub async fn find_by_id(&self, id: i64) -> Result<User> {
        self.store
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Every user, ordered by id.
    pub async fn find_all(&self) -> Result<Vec<User>> {
        self.store.fetch_all().await
    }
}
