use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{AppointmentRepo, RepoError, UserStore};
use crate::models::{Appointment, AppointmentStatus, NewAppointment, Role, SessionRow, UserRow};

pub async fn connect_pg(database_url: &str) -> Result<sqlx::PgPool, RepoError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

const APPOINTMENT_COLUMNS: &str = r#"
    id, client_name, client_email, client_phone, service, stylist,
    start_time, end_time, status, notes, created_at
"#;

#[async_trait]
impl AppointmentRepo for PgStore {
    async fn list_all(&self) -> Result<Vec<Appointment>, RepoError> {
        let rows = sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointment ORDER BY start_time ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, new: NewAppointment, created_at: DateTime<Utc>) -> Result<Appointment, RepoError> {
        let row = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            INSERT INTO appointment (
              id, client_name, client_email, client_phone, service, stylist,
              start_time, end_time, status, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.client_name)
        .bind(new.client_email)
        .bind(new.client_phone)
        .bind(new.service)
        .bind(new.stylist)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(AppointmentStatus::Pending)
        .bind(new.notes)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, RepoError> {
        let row = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            UPDATE appointment
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query(r#"DELETE FROM appointment WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionLookupRow {
    session_id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    username: String,
    display_name: String,
    password_hash: String,
    role: Role,
    is_active: bool,
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, display_name, password_hash, role, is_active
            FROM salon_user
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_user(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
        role: Role,
        is_active: bool,
    ) -> Result<UserRow, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO salon_user (user_id, username, display_name, password_hash, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (username) DO NOTHING
            RETURNING user_id, username, display_name, password_hash, role, is_active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(display_name)
        .bind(password_hash)
        .bind(role)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| RepoError::DuplicateUser(username.to_string()))
    }

    async fn insert_session(&self, session: &SessionRow) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO session_token (session_id, user_id, token_hash, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<(SessionRow, UserRow)>, RepoError> {
        let row = sqlx::query_as::<_, SessionLookupRow>(
            r#"
            SELECT st.session_id, st.user_id, st.token_hash, st.expires_at, st.revoked_at,
                   u.username, u.display_name, u.password_hash, u.role, u.is_active
            FROM session_token st
            JOIN salon_user u ON u.user_id = st.user_id
            WHERE st.token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                SessionRow {
                    session_id: r.session_id,
                    user_id: r.user_id,
                    token_hash: r.token_hash,
                    expires_at: r.expires_at,
                    revoked_at: r.revoked_at,
                },
                UserRow {
                    user_id: r.user_id,
                    username: r.username,
                    display_name: r.display_name,
                    password_hash: r.password_hash,
                    role: r.role,
                    is_active: r.is_active,
                },
            )
        }))
    }

    async fn revoke_session(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE session_token
            SET revoked_at = COALESCE(revoked_at, $2)
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
