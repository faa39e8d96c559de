use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identity of an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InquiryId(pub i64);

impl fmt::Display for InquiryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handling state of an inquiry. Any state may be overwritten by any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InquiryStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Closed,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 4] = [
        InquiryStatus::New,
        InquiryStatus::InProgress,
        InquiryStatus::Resolved,
        InquiryStatus::Closed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::InProgress => "in-progress",
            InquiryStatus::Resolved => "resolved",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InquiryStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        InquiryStatus::ALL
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| ValidationError::InvalidStatus(value.to_string()))
    }
}

/// A persisted contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: InquiryId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub ip_address: String,
}

impl Inquiry {
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Typed submission produced by the HTTP boundary; fields are not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InquirySubmission {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    pub ip_address: String,
}

/// Validated fields handed to the store for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: String,
    pub ip_address: String,
}

impl NewInquiry {
    pub fn validate(submission: InquirySubmission) -> Result<Self, ValidationError> {
        let InquirySubmission {
            first_name,
            last_name,
            email,
            phone,
            service,
            message,
            ip_address,
        } = submission;

        let (Some(first_name), Some(email), Some(message)) =
            (non_blank(first_name), non_blank(email), non_blank(message))
        else {
            return Err(ValidationError::MissingRequiredFields);
        };

        if !is_plausible_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        let ip_address = non_blank(Some(ip_address)).unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            first_name,
            last_name: non_blank(last_name).unwrap_or_default(),
            email,
            phone: non_blank(phone),
            service: non_blank(service),
            message,
            ip_address,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Loose shape check: `local@domain.tld` without whitespace.
pub fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Which statuses a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(InquiryStatus),
}

impl StatusFilter {
    /// Missing, blank and `all` select every record.
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::All),
            Some(value) if value.eq_ignore_ascii_case("all") => Ok(Self::All),
            Some(value) => value.parse().map(Self::Only),
        }
    }

    pub fn matches(&self, status: InquiryStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => *expected == status,
        }
    }
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One-based page window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Unparsable or non-positive inputs fall back to the defaults.
    pub fn normalize(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value >= 1)
}

/// Rows returned by the store for one page, with the pre-pagination match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub items: Vec<Inquiry>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "pages")]
    pub pages_total: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit.max(1));
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages_total: total.div_ceil(limit).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InquiryPage {
    pub items: Vec<Inquiry>,
    pub pagination: Pagination,
}

/// Caller input rejected before any store mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields")]
    MissingRequiredFields,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("missing id")]
    MissingId,
    #[error("invalid status")]
    InvalidStatus(String),
}
