use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::templates::{admin_email, confirmation_email};
use super::{InquiryNotifier, NotificationError};
use crate::config::MailConfig;
use crate::inquiries::domain::Inquiry;

/// JSON body accepted by Resend-compatible `POST /emails` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Notifier selected from configuration. Without credentials it does nothing.
#[derive(Debug, Clone)]
pub enum MailNotifier {
    Disabled,
    Http(HttpMailNotifier),
}

impl MailNotifier {
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        match &config.api_key {
            Some(api_key) => {
                let client = Client::builder().timeout(config.timeout).build()?;
                info!(
                    admin_alerts = config.admin_address.is_some(),
                    "inquiry e-mail notifications enabled"
                );
                Ok(Self::Http(HttpMailNotifier {
                    client,
                    base_url: config.api_base_url.trim_end_matches('/').to_string(),
                    api_key: api_key.clone(),
                    from_address: config.from_address.clone(),
                    admin_address: config.admin_address.clone(),
                }))
            }
            None => {
                info!("RESEND_API_KEY not set; inquiry e-mail notifications disabled");
                Ok(Self::Disabled)
            }
        }
    }
}

impl InquiryNotifier for MailNotifier {
    async fn notify_created(&self, inquiry: &Inquiry) -> Result<(), NotificationError> {
        match self {
            MailNotifier::Disabled => Ok(()),
            MailNotifier::Http(notifier) => notifier.notify_created(inquiry).await,
        }
    }
}

/// Delivers messages through an HTTP mail API using bearer authentication.
#[derive(Debug, Clone)]
pub struct HttpMailNotifier {
    client: Client,
    base_url: String,
    api_key: String,
    from_address: String,
    admin_address: Option<String>,
}

impl HttpMailNotifier {
    pub async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotificationError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    fn message(&self, to: &str, (subject, html): (String, String)) -> OutboundEmail {
        OutboundEmail {
            from: self.from_address.clone(),
            to: vec![to.to_string()],
            subject,
            html,
        }
    }
}

impl InquiryNotifier for HttpMailNotifier {
    /// Attempts both deliveries and reports the first failure.
    async fn notify_created(&self, inquiry: &Inquiry) -> Result<(), NotificationError> {
        let mut first_failure = None;

        let confirmation = self.message(&inquiry.email, confirmation_email(inquiry));
        if let Err(err) = self.send(&confirmation).await {
            warn!(inquiry_id = %inquiry.id, recipient = "submitter", error = %err, "confirmation e-mail failed");
            first_failure = Some(err);
        }

        if let Some(admin_address) = &self.admin_address {
            let summary = self.message(admin_address, admin_email(inquiry));
            if let Err(err) = self.send(&summary).await {
                warn!(inquiry_id = %inquiry.id, recipient = "admin", error = %err, "admin alert e-mail failed");
                first_failure.get_or_insert(err);
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
