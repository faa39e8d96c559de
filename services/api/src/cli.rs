use crate::commands::{init_db, list_inquiries, set_inquiry_status, ListArgs, SetStatusArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use inquiry_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Inquiry Desk",
    about = "Run the contact-form inquiry service and manage stored inquiries",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect or update stored inquiries
    Inquiries {
        #[command(subcommand)]
        command: InquiriesCommand,
    },
    /// Create the inquiry schema if it does not exist yet
    InitDb,
}

#[derive(Subcommand, Debug)]
enum InquiriesCommand {
    /// Print one page of inquiries, newest first
    List(ListArgs),
    /// Change the status of a single inquiry
    SetStatus(SetStatusArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Inquiries {
            command: InquiriesCommand::List(args),
        } => list_inquiries(args).await,
        Command::Inquiries {
            command: InquiriesCommand::SetStatus(args),
        } => set_inquiry_status(args).await,
        Command::InitDb => init_db().await,
    }
}
