use std::sync::Arc;

use clap::Args;
use inquiry_desk::config::AppConfig;
use inquiry_desk::error::AppError;
use inquiry_desk::inquiries::{
    Inquiry, InquiryPage, InquiryService, InquiryStore, MailNotifier, SqliteInquiryStore,
};

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Only show inquiries with this status (new, in-progress, resolved, closed, all)
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// One-based page number
    #[arg(long)]
    pub(crate) page: Option<String>,
    /// Page size (capped at 100)
    #[arg(long)]
    pub(crate) limit: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct SetStatusArgs {
    /// Inquiry id
    pub(crate) id: String,
    /// New status
    pub(crate) status: String,
}

type CliService = InquiryService<SqliteInquiryStore, MailNotifier>;

async fn open_store() -> Result<Arc<SqliteInquiryStore>, AppError> {
    let config = AppConfig::load()?;
    let store = SqliteInquiryStore::connect(
        config.database.require_url()?,
        config.database.max_connections,
    )
    .await?;
    store.initialize().await?;
    Ok(Arc::new(store))
}

fn offline_service(store: Arc<SqliteInquiryStore>) -> CliService {
    InquiryService::new(store, Arc::new(MailNotifier::Disabled))
}

pub(crate) async fn init_db() -> Result<(), AppError> {
    let store = open_store().await?;
    store.close().await;
    println!("Inquiry schema is ready.");
    Ok(())
}

pub(crate) async fn list_inquiries(args: ListArgs) -> Result<(), AppError> {
    let store = open_store().await?;
    let service = offline_service(store.clone());

    let result = service
        .list_page(
            args.status.as_deref(),
            args.page.as_deref(),
            args.limit.as_deref(),
        )
        .await;
    store.close().await;

    print!("{}", render_page(&result?));
    Ok(())
}

pub(crate) async fn set_inquiry_status(args: SetStatusArgs) -> Result<(), AppError> {
    let store = open_store().await?;
    let service = offline_service(store.clone());

    let result = service.update_status(&args.id, Some(&args.status)).await;
    store.close().await;

    let id = result?;
    println!("Inquiry #{id} is now {}.", args.status.trim().to_ascii_lowercase());
    Ok(())
}

fn render_page(page: &InquiryPage) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Page {} of {} ({} inquiries, {} per page)\n",
        page.pagination.page, page.pagination.pages_total, page.pagination.total, page.pagination.limit
    ));

    if page.items.is_empty() {
        output.push_str("No inquiries found.\n");
        return output;
    }

    for inquiry in &page.items {
        output.push_str(&render_row(inquiry));
        output.push('\n');
    }
    output
}

fn render_row(inquiry: &Inquiry) -> String {
    format!(
        "{:<6} {:<12} {:<17} {:<28} {:<18} {}",
        format!("#{}", inquiry.id),
        inquiry.status.label(),
        inquiry.created_at.format("%Y-%m-%d %H:%M").to_string(),
        inquiry.email,
        inquiry.service.as_deref().unwrap_or("-"),
        inquiry.full_name()
    )
}
