use std::future::Future;

use super::domain::{
    Inquiry, InquiryId, InquiryStatus, NewInquiry, PageRequest, StatusFilter, StoredPage,
};

/// Storage abstraction so the service can be exercised against fakes.
///
/// Methods return `Send` futures so handlers holding a store stay spawnable on the
/// multi-threaded runtime.
pub trait InquiryStore: Send + Sync + 'static {
    /// Create the backing schema if it is missing. Safe to call repeatedly.
    fn initialize(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persist a new record with a fresh id, `createdAt`, and status `new`.
    fn create(
        &self,
        inquiry: NewInquiry,
    ) -> impl Future<Output = Result<Inquiry, StoreError>> + Send;

    /// Newest-first page of records matching `filter`, plus the unpaginated match count.
    fn list(
        &self,
        filter: StatusFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<StoredPage, StoreError>> + Send;

    /// Overwrite the status of `id`. Resolves to `false` when no such record exists.
    fn update_status(
        &self,
        id: InquiryId,
        status: InquiryStatus,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Release pooled connections during shutdown.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored record is malformed: {0}")]
    Corrupt(String),
}
