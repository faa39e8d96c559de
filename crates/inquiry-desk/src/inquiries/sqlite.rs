//! SQLite implementation of [`InquiryStore`].
//!
//! Queries use the runtime-checked `sqlx::query` form, so no database is needed at
//! compile time. Timestamps are stored as fixed-width RFC 3339 strings, which keeps
//! lexical and chronological order identical for `ORDER BY created_at`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::domain::{
    Inquiry, InquiryId, InquiryStatus, NewInquiry, PageRequest, StatusFilter, StoredPage,
};
use super::store::{InquiryStore, StoreError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

const LIST_ALL: &str = "SELECT id, first_name, last_name, email, phone, service, message, \
                        status, created_at, ip_address FROM inquiries \
                        ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2";

const LIST_BY_STATUS: &str = "SELECT id, first_name, last_name, email, phone, service, message, \
                              status, created_at, ip_address FROM inquiries WHERE status = ?1 \
                              ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3";

/// Pooled SQLite inquiry store.
#[derive(Clone, Debug)]
pub struct SqliteInquiryStore {
    pool: SqlitePool,
}

impl SqliteInquiryStore {
    /// Open (or create) the database at `url`, e.g. `sqlite://inquiries.db`.
    ///
    /// In-memory URLs are pinned to a single long-lived connection because every
    /// SQLite connection would otherwise see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        info!(in_memory, "connected to inquiry database");
        Ok(Self { pool })
    }

    /// Fresh private database, schema included. Used by tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let store = Self::connect("sqlite::memory:", 1).await?;
        store.initialize().await?;
        Ok(store)
    }
}

impl InquiryStore for SqliteInquiryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS inquiries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL,
                phone TEXT,
                service TEXT,
                message TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new'
                    CHECK (status IN ('new', 'in-progress', 'resolved', 'closed')),
                created_at TEXT NOT NULL,
                ip_address TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_inquiries_created_at ON inquiries(created_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_inquiries_status ON inquiries(status)")
            .execute(&self.pool)
            .await?;

        debug!("inquiry schema ready");
        Ok(())
    }

    async fn create(&self, inquiry: NewInquiry) -> Result<Inquiry, StoreError> {
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        // A clock stepping backwards must not place a newer id before an older one.
        let row = sqlx::query(
            "INSERT INTO inquiries \
             (first_name, last_name, email, phone, service, message, status, created_at, ip_address) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, \
                     MAX(?8, COALESCE((SELECT MAX(created_at) FROM inquiries), ?8)), ?9) \
             RETURNING id, created_at",
        )
        .bind(&inquiry.first_name)
        .bind(&inquiry.last_name)
        .bind(&inquiry.email)
        .bind(&inquiry.phone)
        .bind(&inquiry.service)
        .bind(&inquiry.message)
        .bind(InquiryStatus::New.label())
        .bind(&now)
        .bind(&inquiry.ip_address)
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Inquiry {
            id: InquiryId(id),
            first_name: inquiry.first_name,
            last_name: inquiry.last_name,
            email: inquiry.email,
            phone: inquiry.phone,
            service: inquiry.service,
            message: inquiry.message,
            status: InquiryStatus::New,
            created_at: parse_timestamp(&created_at)?,
            ip_address: inquiry.ip_address,
        })
    }

    async fn list(&self, filter: StatusFilter, page: PageRequest) -> Result<StoredPage, StoreError> {
        let limit = i64::from(page.limit);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let (total, rows) = match filter {
            StatusFilter::All => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inquiries")
                    .fetch_one(&self.pool)
                    .await?;
                let rows = sqlx::query(LIST_ALL)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;
                (total, rows)
            }
            StatusFilter::Only(status) => {
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM inquiries WHERE status = ?1")
                        .bind(status.label())
                        .fetch_one(&self.pool)
                        .await?;
                let rows = sqlx::query(LIST_BY_STATUS)
                    .bind(status.label())
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;
                (total, rows)
            }
        };

        let items = rows
            .iter()
            .map(inquiry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StoredPage {
            items,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn update_status(&self, id: InquiryId, status: InquiryStatus) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE inquiries SET status = ?1 WHERE id = ?2")
            .bind(status.label())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("inquiry database connections closed");
    }
}

fn inquiry_from_row(row: &SqliteRow) -> Result<Inquiry, StoreError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<InquiryStatus>()
        .map_err(|_| StoreError::Corrupt(format!("unknown status '{status}'")))?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Inquiry {
        id: InquiryId(row.try_get("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        service: row.try_get("service")?,
        message: row.try_get("message")?,
        status,
        created_at: parse_timestamp(&created_at)?,
        ip_address: row.try_get("ip_address")?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| StoreError::Corrupt(format!("invalid created_at '{raw}': {err}")))
}
