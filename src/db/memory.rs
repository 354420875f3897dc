use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AppointmentRepo, RepoError, UserStore};
use crate::models::{Appointment, AppointmentStatus, NewAppointment, Role, SessionRow, UserRow};

/// Process-local store used when no `DATABASE_URL` is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    appointments: RwLock<Vec<Appointment>>,
    users: RwLock<HashMap<Uuid, UserRow>>,
    sessions: RwLock<HashMap<String, SessionRow>>,
}

impl MemoryStore {
    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: RwLock::new(appointments),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AppointmentRepo for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Appointment>, RepoError> {
        let mut rows = self.appointments.read().await.clone();
        rows.sort_by_key(|a| (a.start_time, a.created_at));
        Ok(rows)
    }

    async fn insert(&self, new: NewAppointment, created_at: DateTime<Utc>) -> Result<Appointment, RepoError> {
        let appt = Appointment {
            id: Uuid::new_v4(),
            client_name: new.client_name,
            client_email: new.client_email,
            client_phone: new.client_phone,
            service: new.service,
            stylist: new.stylist,
            start_time: new.start_time,
            end_time: new.end_time,
            status: AppointmentStatus::Pending,
            notes: new.notes,
            created_at,
        };
        self.appointments.write().await.push(appt.clone());
        Ok(appt)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Option<Appointment>, RepoError> {
        let mut rows = self.appointments.write().await;
        Ok(rows.iter_mut().find(|a| a.id == id).map(|a| {
            a.status = status;
            a.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut rows = self.appointments.write().await;
        let before = rows.len();
        rows.retain(|a| a.id != id);
        Ok(rows.len() != before)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
        role: Role,
        is_active: bool,
    ) -> Result<UserRow, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Err(RepoError::DuplicateUser(username.to_string()));
        }
        let row = UserRow {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            password_hash: password_hash.to_string(),
            role,
            is_active,
        };
        users.insert(row.user_id, row.clone());
        Ok(row)
    }

    async fn insert_session(&self, session: &SessionRow) -> Result<(), RepoError> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<(SessionRow, UserRow)>, RepoError> {
        let Some(session) = self.sessions.read().await.get(token_hash).cloned() else {
            return Ok(None);
        };
        let user = self.users.read().await.get(&session.user_id).cloned();
        Ok(user.map(|u| (session, u)))
    }

    async fn revoke_session(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), RepoError> {
        if let Some(session) = self.sessions.write().await.get_mut(token_hash) {
            session.revoked_at.get_or_insert(at);
        }
        Ok(())
    }
}
