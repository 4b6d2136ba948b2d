//! In-memory identity store
//! Backs the test suite and database-free deployments

use crate::{
    error::AppError,
    models::{NewUser, User},
    store::UserStore,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryUserStore {
    // Keyed by normalized username; the write lock makes the
    // check-then-insert in `insert` atomic
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().unwrap();
        Ok(users.get(username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().unwrap();
        Ok(users.values().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().unwrap();

        if users.contains_key(&user.username) {
            return Err(AppError::HandleTaken(user.username));
        }

        let stored = User {
            id: user.id,
            username: user.username.clone(),
            password_hash: user.password_hash,
            created_at: user.created_at,
            updated_at: Utc::now(),
        };
        users.insert(user.username, stored.clone());

        Ok(stored)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
