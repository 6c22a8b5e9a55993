//! robinstock CLI binary entry point.

use clap::Parser;
use robinstock::cli::{AuthCommands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("robinstock=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => {
                robinstock::cli::auth::handle_login(&args.username, args.mfa_code.as_deref()).await
            }
            AuthCommands::Status(args) => robinstock::cli::auth::handle_status(&args.username).await,
            AuthCommands::Logout(args) => robinstock::cli::auth::handle_logout(&args.username).await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
