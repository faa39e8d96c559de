use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::domain::{
    Inquiry, InquiryId, InquiryPage, InquiryStatus, InquirySubmission, NewInquiry, PageRequest,
    Pagination, StatusFilter, ValidationError,
};
use super::notifier::InquiryNotifier;
use super::store::{InquiryStore, StoreError};

pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Service composing validation, the inquiry store, and the notifier.
pub struct InquiryService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    notify_timeout: Duration,
    notifications: Mutex<JoinSet<()>>,
}

impl<S, N> InquiryService<S, N>
where
    S: InquiryStore,
    N: InquiryNotifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self::with_notify_timeout(store, notifier, DEFAULT_NOTIFY_TIMEOUT)
    }

    pub fn with_notify_timeout(store: Arc<S>, notifier: Arc<N>, notify_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            notify_timeout,
            notifications: Mutex::new(JoinSet::new()),
        }
    }

    /// Validate and persist a submission, then notify in the background.
    ///
    /// The returned record is final once stored; notification outcome never changes it.
    pub async fn submit(
        &self,
        submission: InquirySubmission,
    ) -> Result<Inquiry, InquiryServiceError> {
        let new_inquiry = NewInquiry::validate(submission)?;
        let inquiry = self.store.create(new_inquiry).await?;
        info!(inquiry_id = %inquiry.id, "inquiry stored");

        self.dispatch_notification(inquiry.clone());
        Ok(inquiry)
    }

    fn dispatch_notification(&self, inquiry: Inquiry) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notify_timeout;

        let mut pending = self
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}

        pending.spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify_created(&inquiry)).await {
                Ok(Ok(())) => debug!(inquiry_id = %inquiry.id, "inquiry notifications sent"),
                Ok(Err(err)) => {
                    warn!(inquiry_id = %inquiry.id, error = %err, "inquiry notification failed")
                }
                Err(_) => warn!(
                    inquiry_id = %inquiry.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "inquiry notification timed out"
                ),
            }
        });
    }

    /// Wait up to `grace` for in-flight notifications, then abort the rest.
    pub async fn drain_notifications(&self, grace: Duration) {
        let mut pending = std::mem::take(
            &mut *self
                .notifications
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if pending.is_empty() {
            return;
        }

        let in_flight = pending.len();
        let drained = tokio::time::timeout(grace, async {
            while pending.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => debug!(in_flight, "inquiry notifications drained"),
            Err(_) => {
                warn!(
                    remaining = pending.len(),
                    grace_ms = grace.as_millis() as u64,
                    "abandoning inquiry notifications after shutdown grace period"
                );
                pending.shutdown().await;
            }
        }
    }

    /// Newest-first page of inquiries. Bad paging input falls back to defaults.
    pub async fn list_page(
        &self,
        status: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<InquiryPage, InquiryServiceError> {
        let filter = StatusFilter::parse(status)?;
        let request = PageRequest::normalize(page, limit);

        let stored = self.store.list(filter, request).await?;

        Ok(InquiryPage {
            items: stored.items,
            pagination: Pagination::new(request, stored.total),
        })
    }

    /// Overwrite the status of an existing inquiry.
    pub async fn update_status(
        &self,
        raw_id: &str,
        raw_status: Option<&str>,
    ) -> Result<InquiryId, InquiryServiceError> {
        let id = raw_id
            .trim()
            .parse::<i64>()
            .map(InquiryId)
            .map_err(|_| ValidationError::MissingId)?;
        let status = raw_status
            .ok_or_else(|| ValidationError::InvalidStatus(String::new()))?
            .parse::<InquiryStatus>()?;

        if !self.store.update_status(id, status).await? {
            return Err(InquiryServiceError::NotFound(id));
        }

        info!(inquiry_id = %id, %status, "inquiry status updated");
        Ok(id)
    }
}

/// Error raised by the inquiry service.
#[derive(Debug, thiserror::Error)]
pub enum InquiryServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("inquiry {0} not found")]
    NotFound(InquiryId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
