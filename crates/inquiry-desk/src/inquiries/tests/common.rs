use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::inquiries::domain::{
    Inquiry, InquiryId, InquiryStatus, InquirySubmission, NewInquiry, PageRequest, StatusFilter,
    StoredPage,
};
use crate::inquiries::notifier::{InquiryNotifier, NotificationError};
use crate::inquiries::service::InquiryService;
use crate::inquiries::store::{InquiryStore, StoreError};

pub(super) fn submission() -> InquirySubmission {
    InquirySubmission {
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        email: Some("jane@x.com".to_string()),
        phone: Some("+27 82 123 4567".to_string()),
        service: Some("Renovation".to_string()),
        message: Some("Hi".to_string()),
        ip_address: "198.51.100.4".to_string(),
    }
}

pub(super) fn empty_message_submission() -> InquirySubmission {
    let mut submission = submission();
    submission.message = Some("   ".to_string());
    submission
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<Vec<Inquiry>>,
}

impl MemoryStore {
    pub(super) fn count(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }

    pub(super) fn get(&self, id: InquiryId) -> Option<Inquiry> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }
}

impl InquiryStore for MemoryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create(&self, inquiry: NewInquiry) -> Result<Inquiry, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let id = InquiryId(guard.len() as i64 + 1);
        let created_at = guard
            .last()
            .map(|last| last.created_at.max(Utc::now()))
            .unwrap_or_else(Utc::now);
        let record = Inquiry {
            id,
            first_name: inquiry.first_name,
            last_name: inquiry.last_name,
            email: inquiry.email,
            phone: inquiry.phone,
            service: inquiry.service,
            message: inquiry.message,
            status: InquiryStatus::New,
            created_at,
            ip_address: inquiry.ip_address,
        };
        guard.push(record.clone());
        Ok(record)
    }

    async fn list(&self, filter: StatusFilter, page: PageRequest) -> Result<StoredPage, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut matching: Vec<Inquiry> = guard
            .iter()
            .filter(|record| filter.matches(record.status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(StoredPage { items, total })
    }

    async fn update_status(&self, id: InquiryId, status: InquiryStatus) -> Result<bool, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        match guard.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn close(&self) {}
}

/// Behaves like a store whose pool has already been closed.
pub(super) struct UnavailableStore;

impl InquiryStore for UnavailableStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn create(&self, _inquiry: NewInquiry) -> Result<Inquiry, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn list(&self, _filter: StatusFilter, _page: PageRequest) -> Result<StoredPage, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn update_status(&self, _id: InquiryId, _status: InquiryStatus) -> Result<bool, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn close(&self) {}
}

/// Forwards every notified inquiry to a channel the test can await.
pub(super) struct RecordingNotifier {
    sender: mpsc::UnboundedSender<Inquiry>,
}

impl RecordingNotifier {
    pub(super) fn new() -> (Self, mpsc::UnboundedReceiver<Inquiry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl InquiryNotifier for RecordingNotifier {
    async fn notify_created(&self, inquiry: &Inquiry) -> Result<(), NotificationError> {
        let _ = self.sender.send(inquiry.clone());
        Ok(())
    }
}

pub(super) struct FailingNotifier {
    pub(super) attempts: Arc<Mutex<u32>>,
}

impl InquiryNotifier for FailingNotifier {
    async fn notify_created(&self, _inquiry: &Inquiry) -> Result<(), NotificationError> {
        *self.attempts.lock().expect("attempts mutex poisoned") += 1;
        Err(NotificationError::Rejected {
            status: 503,
            body: "mail provider down".to_string(),
        })
    }
}

pub(super) struct DelayedNotifier {
    pub(super) delay: Duration,
    pub(super) sender: mpsc::UnboundedSender<Inquiry>,
}

impl InquiryNotifier for DelayedNotifier {
    async fn notify_created(&self, inquiry: &Inquiry) -> Result<(), NotificationError> {
        tokio::time::sleep(self.delay).await;
        let _ = self.sender.send(inquiry.clone());
        Ok(())
    }
}

pub(super) struct StalledNotifier;

impl InquiryNotifier for StalledNotifier {
    async fn notify_created(&self, _inquiry: &Inquiry) -> Result<(), NotificationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

pub(super) fn build_service() -> (
    InquiryService<MemoryStore, RecordingNotifier>,
    Arc<MemoryStore>,
    mpsc::UnboundedReceiver<Inquiry>,
) {
    let store = Arc::new(MemoryStore::default());
    let (notifier, notifications) = RecordingNotifier::new();
    let service = InquiryService::new(store.clone(), Arc::new(notifier));
    (service, store, notifications)
}

pub(super) async fn next_notification(
    receiver: &mut mpsc::UnboundedReceiver<Inquiry>,
) -> Option<Inquiry> {
    tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .ok()
        .flatten()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
