//! Outbound e-mail side effects for newly created inquiries.

mod mail;
pub mod templates;

use std::future::Future;

use super::domain::Inquiry;

pub use mail::{HttpMailNotifier, MailNotifier, OutboundEmail};

/// Hook invoked after an inquiry is stored. Failures never reach the submitter.
pub trait InquiryNotifier: Send + Sync + 'static {
    fn notify_created(
        &self,
        inquiry: &Inquiry,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("mail transport unavailable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
