//! Identity persistence seam
//! The auth core only sees the `UserStore` trait; Postgres backs it in
//! production and an in-memory store backs it in tests

pub mod memory;
pub mod postgres;

use crate::{
    error::AppError,
    models::{NewUser, User},
};
use async_trait::async_trait;
use uuid::Uuid;

/// Identity store contract: lookup by normalized handle or id, and
/// uniqueness-enforcing insert
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Insert a new identity. Must serialize on handle uniqueness so
    /// that of two concurrent registrations for the same handle exactly
    /// one succeeds; the loser gets `HandleTaken`.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    /// Cheap health probe for the readiness endpoint
    async fn ping(&self) -> Result<(), AppError>;
}

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;
