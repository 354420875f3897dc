//! Read-through cache of the appointment list held by the admin dashboard.
//!
//! The list is only ever replaced wholesale by a refetch. Mutations go to the
//! collaborator first and are followed by a full refresh. Every refresh takes
//! a request token; a response is applied only while its token is the latest
//! issued, so a slow stale response cannot overwrite a newer one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::{ApiClientError, AppointmentsApi};
use crate::filter::{AppointmentQuery, Stats};
use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Initial load or refresh failed. Shown in place of the list.
    #[error("could not load appointments: {0}")]
    FetchFailure(String),
    /// Update or delete failed. Shown as a transient notice.
    #[error("could not save changes: {0}")]
    MutationFailure(String),
}

impl StoreError {
    fn fetch(e: ApiClientError) -> Self {
        StoreError::FetchFailure(e.to_string())
    }

    fn mutation(e: ApiClientError) -> Self {
        StoreError::MutationFailure(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh was issued while this one was in flight.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Declined,
}

/// Asked before anything is deleted.
pub trait ConfirmRemoval {
    fn confirm(&self, appointment: &Appointment) -> bool;
}

impl<F> ConfirmRemoval for F
where
    F: Fn(&Appointment) -> bool,
{
    fn confirm(&self, appointment: &Appointment) -> bool {
        self(appointment)
    }
}

/// Point-in-time copy of the store for rendering.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub appointments: Vec<Appointment>,
    pub load_error: Option<String>,
    pub loading: bool,
    /// Token of the response currently held, 0 before the first load.
    pub revision: u64,
}

impl Snapshot {
    pub fn filtered(&self, query: &AppointmentQuery, now: &DateTime<FixedOffset>) -> Vec<&Appointment> {
        query.apply(&self.appointments, now)
    }

    pub fn stats(&self, now: &DateTime<FixedOffset>) -> Stats {
        Stats::compute(&self.appointments, now)
    }

    pub fn get(&self, id: Uuid) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }
}

#[derive(Default)]
struct Inner {
    appointments: Vec<Appointment>,
    load_error: Option<String>,
    applied: u64,
    notices: Vec<Notice>,
}

pub struct AppointmentStore<A: ?Sized> {
    api: Arc<A>,
    inner: RwLock<Inner>,
    issued: AtomicU64,
    in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InFlight(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<A> AppointmentStore<A>
where
    A: AppointmentsApi + ?Sized,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            inner: RwLock::new(Inner::default()),
            issued: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().await;
        Snapshot {
            appointments: inner.appointments.clone(),
            load_error: inner.load_error.clone(),
            loading: self.is_loading(),
            revision: inner.applied,
        }
    }

    /// Drains pending notices, oldest first.
    pub async fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.write().await.notices)
    }

    /// Refetches the whole list.
    pub async fn refresh(&self) -> Result<RefreshOutcome, StoreError> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight::start(&self.in_flight);

        let result = self.api.list().await;

        let mut inner = self.inner.write().await;
        if token != self.issued.load(Ordering::SeqCst) {
            tracing::debug!(token, "discarding stale appointments response");
            return Ok(RefreshOutcome::Stale);
        }

        match result {
            Ok(appointments) => {
                tracing::debug!(token, count = appointments.len(), "appointments refreshed");
                inner.appointments = appointments;
                inner.load_error = None;
                inner.applied = token;
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                let err = StoreError::fetch(e);
                tracing::warn!(error = %err, "appointments refresh failed");
                inner.load_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<(), StoreError> {
        let result = {
            let _guard = InFlight::start(&self.in_flight);
            self.api.update_status(id, status).await
        };

        match result {
            Ok(_) => {
                self.notify(NoticeKind::Success, format!("Appointment marked {status}")).await;
                self.refresh_after_mutation().await
            }
            Err(e) => {
                let err = StoreError::mutation(e);
                tracing::warn!(%id, %status, error = %err, "status update failed");
                self.notify(NoticeKind::Error, err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Deletes an appointment after `confirm` agrees. Ids not in the current
    /// list are rejected without calling the collaborator.
    pub async fn remove<C>(&self, id: Uuid, confirm: &C) -> Result<RemoveOutcome, StoreError>
    where
        C: ConfirmRemoval + ?Sized,
    {
        let target = {
            let inner = self.inner.read().await;
            inner.appointments.iter().find(|a| a.id == id).cloned()
        };
        let Some(target) = target else {
            let err = StoreError::MutationFailure(format!("appointment {id} is not loaded"));
            self.notify(NoticeKind::Error, err.to_string()).await;
            return Err(err);
        };

        if !confirm.confirm(&target) {
            return Ok(RemoveOutcome::Declined);
        }

        let result = {
            let _guard = InFlight::start(&self.in_flight);
            self.api.delete(id).await
        };

        match result {
            Ok(()) => {
                self.notify(NoticeKind::Success, "Appointment removed".to_string()).await;
                self.refresh_after_mutation().await?;
                Ok(RemoveOutcome::Removed)
            }
            Err(e) => {
                let err = StoreError::mutation(e);
                tracing::warn!(%id, error = %err, "appointment delete failed");
                self.notify(NoticeKind::Error, err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn refresh_after_mutation(&self) -> Result<(), StoreError> {
        self.refresh().await.map(|_| ())
    }

    async fn notify(&self, kind: NoticeKind, message: String) {
        self.inner.write().await.notices.push(Notice { kind, message });
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use super::*;

    /// In-process collaborator. Lists can be gated on oneshot channels to
    /// control response order.
    #[derive(Default)]
    pub struct FakeApi {
        pub rows: Mutex<Vec<Appointment>>,
        pub gates: Mutex<VecDeque<oneshot::Receiver<Vec<Appointment>>>>,
        pub fail_next: Mutex<Option<u16>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn with(rows: Vec<Appointment>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Default::default()
            }
        }

        pub fn fail_next(&self, status: u16) {
            *self.fail_next.lock().unwrap() = Some(status);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn failure(&self) -> Option<ApiClientError> {
            self.fail_next.lock().unwrap().take().map(ApiClientError::Status)
        }
    }

    #[async_trait]
    impl AppointmentsApi for FakeApi {
        async fn list(&self) -> Result<Vec<Appointment>, ApiClientError> {
            self.calls.lock().unwrap().push("list".into());
            if let Some(e) = self.failure() {
                return Err(e);
            }
            let gate = self.gates.lock().unwrap().pop_front();
            if let Some(rx) = gate {
                return rx.await.map_err(|e| ApiClientError::Transport(e.to_string()));
            }
            let rows = self.rows.lock().unwrap().clone();
            Ok(rows)
        }

        async fn update_status(
            &self,
            id: Uuid,
            status: AppointmentStatus,
        ) -> Result<Appointment, ApiClientError> {
            self.calls.lock().unwrap().push(format!("update {id} {status}"));
            if let Some(e) = self.failure() {
                return Err(e);
            }
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(ApiClientError::Status(404))?;
            row.status = status;
            Ok(row.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<(), ApiClientError> {
            self.calls.lock().unwrap().push(format!("delete {id}"));
            if let Some(e) = self.failure() {
                return Err(e);
            }
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|a| a.id != id);
            if rows.len() == before {
                return Err(ApiClientError::Status(404));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::fake::FakeApi;
    use super::*;
    use crate::filter::fixtures::{appt, now_utc};
    use crate::models::AppointmentStatus::*;

    fn now() -> DateTime<FixedOffset> {
        now_utc("2026-10-16T12:00:00Z")
    }

    fn three_pending_one_confirmed() -> Vec<Appointment> {
        vec![
            appt("2026-10-16T09:00:00Z", Pending),
            appt("2026-10-16T10:00:00Z", Pending),
            appt("2026-10-17T10:00:00Z", Pending),
            appt("2026-10-18T10:00:00Z", Confirmed),
        ]
    }

    #[tokio::test]
    async fn confirming_moves_one_count() {
        let rows = three_pending_one_confirmed();
        let target = rows[0].id;
        let store = AppointmentStore::new(Arc::new(FakeApi::with(rows)));
        store.refresh().await.unwrap();

        let before = store.snapshot().await.stats(&now());
        assert_eq!((before.pending, before.confirmed, before.total), (3, 1, 4));

        store.update_status(target, Confirmed).await.unwrap();

        let after = store.snapshot().await.stats(&now());
        assert_eq!((after.pending, after.confirmed, after.total), (2, 2, 4));
        let notices = store.take_notices().await;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::Success);
    }

    #[tokio::test]
    async fn confirmed_removal_drops_the_id() {
        let rows = three_pending_one_confirmed();
        let target = rows[2].id;
        let api = Arc::new(FakeApi::with(rows));
        let store = AppointmentStore::new(api.clone());
        store.refresh().await.unwrap();

        let outcome = store.remove(target, &|_: &Appointment| true).await.unwrap();
        assert_eq!(outcome, RemoveOutcome::Removed);

        let snap = store.snapshot().await;
        assert_eq!(snap.stats(&now()).total, 3);
        assert!(snap.get(target).is_none());
        assert!(snap.filtered(&AppointmentQuery::default(), &now()).iter().all(|a| a.id != target));
        assert_eq!(api.calls(), vec!["list".to_string(), format!("delete {target}"), "list".to_string()]);
    }

    #[tokio::test]
    async fn declined_removal_never_reaches_the_api() {
        let rows = three_pending_one_confirmed();
        let target = rows[1].id;
        let api = Arc::new(FakeApi::with(rows));
        let store = AppointmentStore::new(api.clone());
        store.refresh().await.unwrap();

        let asked = std::cell::Cell::new(None);
        let confirm = |a: &Appointment| {
            asked.set(Some(a.id));
            false
        };
        let outcome = store.remove(target, &confirm).await.unwrap();

        assert_eq!(outcome, RemoveOutcome::Declined);
        assert_eq!(asked.get(), Some(target));
        assert_eq!(api.calls(), vec!["list".to_string()]);
        assert_eq!(store.snapshot().await.appointments.len(), 4);
    }

    #[tokio::test]
    async fn unknown_id_is_rejected_locally() {
        let api = Arc::new(FakeApi::with(three_pending_one_confirmed()));
        let store = AppointmentStore::new(api.clone());
        store.refresh().await.unwrap();

        let err = store.remove(Uuid::new_v4(), &|_: &Appointment| true).await.unwrap_err();
        assert!(matches!(err, StoreError::MutationFailure(_)));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_keeps_the_list_and_raises_a_notice() {
        let rows = three_pending_one_confirmed();
        let target = rows[0].id;
        let api = Arc::new(FakeApi::with(rows.clone()));
        let store = AppointmentStore::new(api.clone());
        store.refresh().await.unwrap();

        api.fail_next(500);
        let err = store.update_status(target, Completed).await.unwrap_err();
        assert_eq!(err, StoreError::MutationFailure("server answered 500".into()));

        let snap = store.snapshot().await;
        assert_eq!(snap.appointments, rows);
        assert_eq!(snap.load_error, None);

        let notices = store.take_notices().await;
        assert_eq!(notices[0].kind, NoticeKind::Error);
        assert!(store.take_notices().await.is_empty());
    }

    #[tokio::test]
    async fn failed_delete_is_a_mutation_failure() {
        let rows = three_pending_one_confirmed();
        let target = rows[0].id;
        let api = Arc::new(FakeApi::with(rows));
        let store = AppointmentStore::new(api.clone());
        store.refresh().await.unwrap();

        api.fail_next(404);
        let err = store.remove(target, &|_: &Appointment| true).await.unwrap_err();
        assert!(matches!(err, StoreError::MutationFailure(_)));
        assert_eq!(store.snapshot().await.appointments.len(), 4);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_old_list_until_next_success() {
        let rows = three_pending_one_confirmed();
        let api = Arc::new(FakeApi::with(rows.clone()));
        let store = AppointmentStore::new(api.clone());
        store.refresh().await.unwrap();

        api.fail_next(503);
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, StoreError::FetchFailure(_)));

        let snap = store.snapshot().await;
        assert_eq!(snap.appointments, rows);
        assert!(snap.load_error.is_some());

        store.refresh().await.unwrap();
        assert_eq!(store.snapshot().await.load_error, None);
    }

    #[tokio::test]
    async fn stale_refresh_is_discarded() {
        let api = Arc::new(FakeApi::default());
        let (old_tx, old_rx) = oneshot::channel();
        let (new_tx, new_rx) = oneshot::channel();
        api.gates.lock().unwrap().extend([old_rx, new_rx]);
        let store = AppointmentStore::new(api.clone());

        let stale_rows = vec![appt("2026-10-01T10:00:00Z", Pending)];
        let fresh_rows = vec![
            appt("2026-10-02T10:00:00Z", Confirmed),
            appt("2026-10-03T10:00:00Z", Confirmed),
        ];
        let expected = fresh_rows.clone();

        let driver = async move {
            new_tx.send(fresh_rows).unwrap();
            tokio::task::yield_now().await;
            old_tx.send(stale_rows).unwrap();
        };

        let (first, second, ()) = tokio::join!(store.refresh(), store.refresh(), driver);

        assert_eq!(first, Ok(RefreshOutcome::Stale));
        assert_eq!(second, Ok(RefreshOutcome::Applied));
        let snap = store.snapshot().await;
        assert_eq!(snap.appointments, expected);
        assert_eq!(snap.revision, 2);
        assert!(!snap.loading);
    }
}
