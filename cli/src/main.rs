use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use clinic_core::{
    ClientConfig, ClinicClient, Credentials, CredentialStore, FetchController, FetchPhase,
    HttpClientDirectory, MemoryCredentialStore, TokioScheduler, Transport, UreqTransport,
};

#[derive(Parser)]
#[command(name = "clinic-clients", about = "List registered clinic clients", version)]
struct Cli {
    /// API base URL (overrides CLINIC_API_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Log in with these credentials before listing
    #[arg(long, env = "CLINIC_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Use an existing bearer token instead of logging in
    #[arg(long, env = "CLINIC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Only show clients whose name contains this text
    #[arg(long, short)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let client = ClinicClient::new(&config.base_url);
    let transport = Arc::new(UreqTransport::new(config.request_timeout));
    let credentials = Arc::new(MemoryCredentialStore::new());

    if let Some(token) = cli.token {
        credentials.store(token);
    } else if let (Some(email), Some(password)) = (cli.email, cli.password) {
        let req = client.build_login(&Credentials { email, password })?;
        let response = transport.execute(req).await?;
        let grant = client.parse_login(response).context("login failed")?;
        credentials.store(grant.access_token);
    }

    let directory = HttpClientDirectory::new(client, Arc::clone(&transport), Arc::clone(&credentials));
    let controller = FetchController::new(directory, TokioScheduler, config.retry_policy());
    let mut updates = controller.subscribe();

    controller.load().await;

    loop {
        let state = updates.borrow_and_update().clone();
        match state.phase {
            FetchPhase::Success => break,
            FetchPhase::Failed => {
                let message = state.error.unwrap_or_default();
                bail!("{message}");
            }
            _ => {
                if let Some(line) = state.status_line(controller.policy().max_retries) {
                    eprintln!("{line}");
                }
            }
        }
        updates.changed().await?;
    }

    let clients = controller.search(cli.search.as_deref().unwrap_or(""));
    if clients.is_empty() {
        println!("No clients found.");
    }
    for c in &clients {
        let programs = if c.programs.is_empty() {
            "None".to_string()
        } else {
            c.programs.join(", ")
        };
        println!(
            "{:<8} {:<28} {}  {:<6} {}",
            c.id,
            c.full_name(),
            c.dob,
            format!("{:?}", c.gender),
            programs
        );
    }

    controller.dispose();
    Ok(())
}
