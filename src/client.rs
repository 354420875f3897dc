//! Client side of the appointments API.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentList, AppointmentStatus, LoginRequest, LoginResponse, NewAppointment,
    StatusUpdate,
};

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("request failed: {0}")]
    Transport(String),
    /// Any non-2xx answer. The body is not inspected further.
    #[error("server answered {0}")]
    Status(u16),
}

impl From<reqwest::Error> for ApiClientError {
    fn from(e: reqwest::Error) -> Self {
        ApiClientError::Transport(e.to_string())
    }
}

/// The collaborator that owns appointment storage.
#[async_trait]
pub trait AppointmentsApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Appointment>, ApiClientError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiClientError>;
    async fn delete(&self, id: Uuid) -> Result<(), ApiClientError>;
}

pub struct HttpAppointmentsApi {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpAppointmentsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Logs in against `/api/auth/login` and keeps the returned bearer token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse, ApiClientError> {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let login: LoginResponse = check(resp)?.json().await?;
        self.access_token = Some(login.data.access_token.clone());
        Ok(login)
    }

    /// Public booking endpoint.
    pub async fn book(&self, booking: &NewAppointment) -> Result<Appointment, ApiClientError> {
        let resp = self
            .client
            .post(self.url("/api/appointments"))
            .json(booking)
            .send()
            .await?;
        Ok(check(resp)?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        tracing::debug!(%status, url = %resp.url(), "appointments api rejected request");
        Err(ApiClientError::Status(status.as_u16()))
    }
}

#[async_trait]
impl AppointmentsApi for HttpAppointmentsApi {
    async fn list(&self) -> Result<Vec<Appointment>, ApiClientError> {
        let resp = self
            .authed(self.client.get(self.url("/api/appointments")))
            .send()
            .await?;
        let body: AppointmentList = check(resp)?.json().await?;
        Ok(body.appointments)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiClientError> {
        let resp = self
            .authed(self.client.patch(self.url("/api/appointments")))
            .json(&StatusUpdate { id, status })
            .send()
            .await?;
        Ok(check(resp)?.json().await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiClientError> {
        let resp = self
            .authed(self.client.delete(self.url("/api/appointments")))
            .query(&[("id", id.to_string())])
            .send()
            .await?;
        check(resp)?;
        Ok(())
    }
}
