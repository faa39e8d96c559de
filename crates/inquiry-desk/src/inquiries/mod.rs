//! Contact-form inquiry lifecycle: validate, persist, notify, list, and re-status.

pub mod domain;
pub mod notifier;
pub mod router;
pub mod service;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Inquiry, InquiryId, InquiryPage, InquiryStatus, InquirySubmission, NewInquiry, PageRequest,
    Pagination, StatusFilter, StoredPage, ValidationError,
};
pub use notifier::{HttpMailNotifier, InquiryNotifier, MailNotifier, NotificationError};
pub use router::{inquiry_router, ContactForm};
pub use service::{InquiryService, InquiryServiceError};
pub use sqlite::SqliteInquiryStore;
pub use store::{InquiryStore, StoreError};
