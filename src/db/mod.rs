//! Storage behind the appointments API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, NewAppointment, Role, SessionRow, UserRow};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PgStore, connect_pg};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("username already taken: {0}")]
    DuplicateUser(String),
}

#[async_trait]
pub trait AppointmentRepo: Send + Sync {
    /// Every appointment, ascending by start time.
    async fn list_all(&self) -> Result<Vec<Appointment>, RepoError>;
    async fn insert(&self, new: NewAppointment, created_at: DateTime<Utc>) -> Result<Appointment, RepoError>;
    /// `None` when the id does not exist.
    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, RepoError>;
    /// `false` when the id does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, RepoError>;
    async fn create_user(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
        role: Role,
        is_active: bool,
    ) -> Result<UserRow, RepoError>;
    async fn insert_session(&self, session: &SessionRow) -> Result<(), RepoError>;
    /// Session by token hash joined with its user, revoked or not.
    async fn find_session(&self, token_hash: &str) -> Result<Option<(SessionRow, UserRow)>, RepoError>;
    async fn revoke_session(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), RepoError>;
}
