use super::common::submission;
use crate::inquiries::domain::{InquiryId, InquiryStatus, NewInquiry, PageRequest, StatusFilter};
use crate::inquiries::sqlite::SqliteInquiryStore;
use crate::inquiries::store::{InquiryStore, StoreError};

fn new_inquiry(first_name: &str) -> NewInquiry {
    let mut candidate = submission();
    candidate.first_name = Some(first_name.to_string());
    NewInquiry::validate(candidate).expect("fixture is valid")
}

fn first_page(limit: u32) -> PageRequest {
    PageRequest { page: 1, limit }
}

#[tokio::test]
async fn initialize_is_idempotent() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");
    store.initialize().await.expect("second initialize");

    let page = store
        .list(StatusFilter::All, first_page(10))
        .await
        .expect("list");
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn create_assigns_increasing_ids_with_new_status() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");

    let first = store.create(new_inquiry("Ada")).await.expect("first insert");
    let second = store.create(new_inquiry("Grace")).await.expect("second insert");

    assert_eq!(first.id, InquiryId(1));
    assert!(second.id > first.id);
    assert_eq!(first.status, InquiryStatus::New);
    assert!(second.created_at >= first.created_at);
    assert_eq!(first.ip_address, "198.51.100.4");
    assert_eq!(first.phone.as_deref(), Some("+27 82 123 4567"));
}

#[tokio::test]
async fn list_orders_newest_first_and_pages() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");
    for name in ["Ada", "Grace", "Hedy"] {
        store.create(new_inquiry(name)).await.expect("insert");
    }

    let page = store
        .list(StatusFilter::All, first_page(2))
        .await
        .expect("list");
    assert_eq!(page.total, 3);
    let names: Vec<_> = page.items.iter().map(|i| i.first_name.as_str()).collect();
    assert_eq!(names, vec!["Hedy", "Grace"]);

    let tail = store
        .list(StatusFilter::All, PageRequest { page: 2, limit: 2 })
        .await
        .expect("list");
    assert_eq!(tail.total, 3);
    assert_eq!(tail.items.len(), 1);
    assert_eq!(tail.items[0].first_name, "Ada");

    let beyond = store
        .list(StatusFilter::All, PageRequest { page: 9, limit: 2 })
        .await
        .expect("list");
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 3);
}

#[tokio::test]
async fn list_filters_by_status() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");
    let first = store.create(new_inquiry("Ada")).await.expect("insert");
    store.create(new_inquiry("Grace")).await.expect("insert");

    assert!(store
        .update_status(first.id, InquiryStatus::Resolved)
        .await
        .expect("update"));

    let resolved = store
        .list(StatusFilter::Only(InquiryStatus::Resolved), first_page(10))
        .await
        .expect("list");
    assert_eq!(resolved.total, 1);
    assert_eq!(resolved.items[0].id, first.id);
    assert_eq!(resolved.items[0].status, InquiryStatus::Resolved);

    let fresh = store
        .list(StatusFilter::Only(InquiryStatus::New), first_page(10))
        .await
        .expect("list");
    assert_eq!(fresh.total, 1);
    assert_eq!(fresh.items[0].first_name, "Grace");
}

#[tokio::test]
async fn update_status_reports_whether_a_row_matched() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");
    let inquiry = store.create(new_inquiry("Ada")).await.expect("insert");

    assert!(store
        .update_status(inquiry.id, InquiryStatus::Closed)
        .await
        .expect("update"));
    assert!(store
        .update_status(inquiry.id, InquiryStatus::Closed)
        .await
        .expect("repeat update still matches"));
    assert!(!store
        .update_status(InquiryId(404), InquiryStatus::Closed)
        .await
        .expect("update"));

    let page = store
        .list(StatusFilter::All, first_page(10))
        .await
        .expect("list");
    assert_eq!(page.items[0].status, InquiryStatus::Closed);
    assert_eq!(page.items[0].created_at, inquiry.created_at);
}

#[tokio::test]
async fn stored_fields_round_trip_through_listing() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");
    let mut candidate = submission();
    candidate.phone = None;
    candidate.service = None;
    candidate.last_name = None;
    let created = store
        .create(NewInquiry::validate(candidate).expect("valid"))
        .await
        .expect("insert");

    let page = store
        .list(StatusFilter::All, first_page(1))
        .await
        .expect("list");
    assert_eq!(page.items, vec![created]);
}

#[tokio::test]
async fn file_backed_store_survives_reconnect() {
    let path = std::env::temp_dir().join(format!(
        "inquiry-desk-{}-{}.db",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let url = format!("sqlite://{}", path.display());

    let store = SqliteInquiryStore::connect(&url, 2).await.expect("open file");
    store.initialize().await.expect("schema");
    let created = store.create(new_inquiry("Ada")).await.expect("insert");
    store.close().await;

    let reopened = SqliteInquiryStore::connect(&url, 2).await.expect("reopen");
    reopened.initialize().await.expect("schema again");
    let page = reopened
        .list(StatusFilter::All, first_page(10))
        .await
        .expect("list");
    assert_eq!(page.items, vec![created]);

    let next = reopened.create(new_inquiry("Grace")).await.expect("insert");
    assert_eq!(next.id, InquiryId(2));
    reopened.close().await;

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn closed_store_reports_database_errors() {
    let store = SqliteInquiryStore::in_memory().await.expect("store opens");
    store.close().await;

    match store.create(new_inquiry("Ada")).await {
        Err(StoreError::Database(sqlx::Error::PoolClosed)) => {}
        other => panic!("expected closed pool error, got {other:?}"),
    }
}
